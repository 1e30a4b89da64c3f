use libreauth::pass::{Algorithm, HashBuilder, Hasher};

use crate::error::*;

pub const PWD_ALGORITHM: Algorithm = Algorithm::Argon2;
pub const PWD_SCHEME_VERSION: usize = 1;

// If the Hasher changes, make sure to increment PWD_SCHEME_VERSION
lazy_static! {
  pub static ref HASHER: Hasher = {
    HashBuilder::new()
      .algorithm(PWD_ALGORITHM)
      .version(PWD_SCHEME_VERSION)
      .finalize()
      .expect("valid password hasher settings")
  };
}

/// Outcome of checking a password against its stored hash.
#[derive(Debug, PartialEq)]
pub enum PasswordCheck {
  Invalid,
  Valid,
  /// Valid, but stored with an older scheme.  Rehash it.
  NeedsRehash,
}

pub fn check_password(stored: &str, password: &str) -> Result<PasswordCheck> {
  let checker = HashBuilder::from_phc(stored)?;
  if !checker.is_valid(password) {
    return Ok(PasswordCheck::Invalid);
  }
  if checker.needs_update(Some(PWD_SCHEME_VERSION)) {
    Ok(PasswordCheck::NeedsRehash)
  } else {
    Ok(PasswordCheck::Valid)
  }
}

pub fn hash_password(password: &str) -> Result<String> {
  Ok(HASHER.hash(password)?)
}
