use serde::{Deserialize, Serialize};

use uuid::Uuid;

use crate::error::*;
use crate::forms::{present, present_owned, Checks};
use crate::models::*;

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateProfile {
  pub company: Option<String>,
  pub website: Option<String>,
  pub location: Option<String>,
  pub bio: Option<String>,
  pub status: Option<String>,
  pub github_username: Option<String>,
  /// Comma separated list.
  pub skills: Option<String>,
  pub youtube: Option<String>,
  pub twitter: Option<String>,
  pub facebook: Option<String>,
  pub linkedin: Option<String>,
  pub instagram: Option<String>,
}

impl CreateProfile {
  pub fn validate(&self) -> Result<()> {
    let mut checks = Checks::new();
    checks
      .required("status", &self.status, "Status is required")
      .required("skills", &self.skills, "Skills is required");
    checks.finish()
  }

  /// Set the fields present in the request.  Missing fields keep their
  /// current value, except `social` which is replaced as a whole.
  pub fn apply(self, profile: &mut Profile) {
    fn set(field: &mut Option<String>, value: Option<String>) {
      if let Some(value) = present_owned(value) {
        *field = Some(value);
      }
    }
    set(&mut profile.company, self.company);
    set(&mut profile.website, self.website);
    set(&mut profile.location, self.location);
    set(&mut profile.bio, self.bio);
    set(&mut profile.github_username, self.github_username);
    if let Some(status) = present_owned(self.status) {
      profile.status = status;
    }
    if let Some(skills) = present(&self.skills) {
      profile.skills = split_skills(skills);
    }
    profile.social = Social {
      youtube: present_owned(self.youtube),
      twitter: present_owned(self.twitter),
      facebook: present_owned(self.facebook),
      linkedin: present_owned(self.linkedin),
      instagram: present_owned(self.instagram),
    };
  }
}

pub fn split_skills(skills: &str) -> Vec<String> {
  skills.split(',')
    .map(|skill| skill.trim())
    .filter(|skill| !skill.is_empty())
    .map(|skill| skill.to_string())
    .collect()
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AddExperience {
  pub title: Option<String>,
  pub company: Option<String>,
  pub location: Option<String>,
  pub from: Option<String>,
  pub to: Option<String>,
  pub current: bool,
  pub description: Option<String>,
}

impl AddExperience {
  pub fn into_experience(self) -> Result<Experience> {
    let mut checks = Checks::new();
    let title = checks.required_value("title", &self.title, "Title is required");
    let company = checks.required_value("company", &self.company, "Company is required");
    let from = checks.date("from", &self.from, "From date is required");
    let to = checks.opt_date("to", &self.to);
    let ((title, company), from) = checks.finish_with(title.zip(company).zip(from))?;

    Ok(Experience {
      id: Uuid::new_v4(),
      title: title.to_string(),
      company: company.to_string(),
      location: present_owned(self.location),
      from,
      to,
      current: self.current,
      description: present_owned(self.description),
    })
  }
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AddEducation {
  pub school: Option<String>,
  pub degree: Option<String>,
  pub field_of_study: Option<String>,
  pub from: Option<String>,
  pub to: Option<String>,
  pub current: bool,
  pub description: Option<String>,
}

impl AddEducation {
  pub fn into_education(self) -> Result<Education> {
    let mut checks = Checks::new();
    let school = checks.required_value("school", &self.school, "School is required");
    let degree = checks.required_value("degree", &self.degree, "Degree is required");
    let field_of_study = checks.required_value("fieldOfStudy", &self.field_of_study,
      "The field of study is required");
    let from = checks.date("from", &self.from, "The 'From' date of study is required");
    let to = checks.opt_date("to", &self.to);
    let (((school, degree), field_of_study), from) =
      checks.finish_with(school.zip(degree).zip(field_of_study).zip(from))?;

    Ok(Education {
      id: Uuid::new_v4(),
      school: school.to_string(),
      degree: degree.to_string(),
      field_of_study: field_of_study.to_string(),
      from,
      to,
      current: self.current,
      description: present_owned(self.description),
    })
  }
}
