use chrono::{DateTime, NaiveDate};

use regex::Regex;

use crate::error::*;

pub mod user;
pub mod profile;
pub mod post;

pub use self::{
  user::*,
  profile::*,
  post::*,
};

lazy_static! {
  static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// Treat blank strings like missing values.
pub fn present(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn present_owned(value: Option<String>) -> Option<String> {
  present(&value).map(str::to_string)
}

/// Collects field errors so that all problems are reported at once.
#[derive(Debug, Default)]
pub struct Checks {
  errors: Vec<FieldError>,
}

impl Checks {
  pub fn new() -> Self {
    Default::default()
  }

  pub fn fail(&mut self, param: &str, msg: &str) {
    self.errors.push(FieldError::body(param, msg));
  }

  pub fn required(&mut self, param: &str, value: &Option<String>, msg: &str) -> &mut Self {
    self.required_value(param, value, msg);
    self
  }

  /// Like `required`, returning the trimmed value when present.
  pub fn required_value<'a>(&mut self, param: &str, value: &'a Option<String>, msg: &str) -> Option<&'a str> {
    let value = present(value);
    if value.is_none() {
      self.fail(param, msg);
    }
    value
  }

  pub fn email(&mut self, param: &str, value: &Option<String>, msg: &str) -> &mut Self {
    match present(value) {
      Some(email) if EMAIL_RE.is_match(email) => (),
      _ => self.fail(param, msg),
    }
    self
  }

  pub fn min_len(&mut self, param: &str, value: &Option<String>, min: usize, msg: &str) -> &mut Self {
    match value {
      Some(value) if value.chars().count() >= min => (),
      _ => self.fail(param, msg),
    }
    self
  }

  pub fn max_len(&mut self, param: &str, value: &Option<String>, max: usize, msg: &str) -> &mut Self {
    if let Some(value) = value {
      if value.chars().count() > max {
        self.fail(param, msg);
      }
    }
    self
  }

  /// Required date.  Returns the parsed date when valid.
  pub fn date(&mut self, param: &str, value: &Option<String>, msg: &str) -> Option<NaiveDate> {
    match present(value) {
      None => {
        self.fail(param, msg);
        None
      },
      Some(value) => self.parse_date(param, value),
    }
  }

  pub fn opt_date(&mut self, param: &str, value: &Option<String>) -> Option<NaiveDate> {
    present(value).and_then(|value| self.parse_date(param, value))
  }

  fn parse_date(&mut self, param: &str, value: &str) -> Option<NaiveDate> {
    let parsed = NaiveDate::parse_from_str(value, "%Y-%m-%d")
      .ok()
      .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|d| d.date_naive()));
    if parsed.is_none() {
      self.fail(param, "Invalid date");
    }
    parsed
  }

  /// The checked values, when every check passed.  Each `None` in `values`
  /// comes from a check that has already recorded its failure.
  pub fn finish_with<T>(self, values: Option<T>) -> Result<T> {
    match values {
      Some(values) if self.errors.is_empty() => Ok(values),
      _ => Err(Error::Validation(self.errors)),
    }
  }

  pub fn finish(self) -> Result<()> {
    if self.errors.is_empty() {
      Ok(())
    } else {
      Err(Error::Validation(self.errors))
    }
  }
}
