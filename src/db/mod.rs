pub mod util;

mod user;
mod profile;
mod post;
pub use self::{
  user::*,
  profile::*,
  post::*,
};

mod memory;
pub use memory::*;

mod service;
pub use service::*;
