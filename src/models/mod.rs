pub mod user;
pub mod profile;
pub mod post;

pub use self::{
  user::*,
  profile::*,
  post::*,
};
