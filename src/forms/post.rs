use serde::{Deserialize, Serialize};

use crate::error::*;
use crate::forms::{present, Checks};

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CreatePost {
  pub text: Option<String>,
  /// Overrides the author's name on the post.
  pub name: Option<String>,
}

impl CreatePost {
  pub fn validate(&self) -> Result<&str> {
    let mut checks = Checks::new();
    let text = checks.required_value("text", &self.text, "Text is required");
    checks.finish_with(text)
  }

  pub fn name(&self) -> Option<&str> {
    present(&self.name)
  }
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CreateComment {
  pub text: Option<String>,
}

impl CreateComment {
  pub fn validate(&self) -> Result<&str> {
    let mut checks = Checks::new();
    let text = checks.required_value("text", &self.text, "Text is required");
    checks.finish_with(text)
  }
}
