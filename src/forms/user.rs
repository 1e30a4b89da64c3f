use serde::{Deserialize, Serialize};

use crate::error::*;
use crate::forms::Checks;

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoginUser {
  pub email: Option<String>,
  pub password: Option<String>,
}

impl LoginUser {
  pub fn validate(&self) -> Result<()> {
    let mut checks = Checks::new();
    checks
      .email("email", &self.email, "Please include a valid email")
      .required("password", &self.password, "Password is required");
    checks.finish()
  }
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterUser {
  pub name: Option<String>,
  pub email: Option<String>,
  pub password: Option<String>,
  pub password_confirm: Option<String>,
}

impl RegisterUser {
  pub fn validate(&self) -> Result<()> {
    let mut checks = Checks::new();
    checks
      .required("name", &self.name, "Name is required")
      .email("email", &self.email, "Please include a valid email")
      .min_len("password", &self.password, PASSWORD_MIN_LEN,
        "Please enter a password with 8 or more characters")
      .max_len("password", &self.password, PASSWORD_MAX_LEN,
        "Please enter a password with 128 or fewer characters");
    if let Some(ref confirm) = self.password_confirm {
      if Some(confirm) != self.password.as_ref() {
        checks.fail("passwordConfirm", "Passwords don't match");
      }
    }
    checks.finish()
  }
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenResponse {
  pub token: String,
}
