pub mod jwt;
pub mod pass;

pub use jwt::*;
