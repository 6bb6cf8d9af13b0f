//! Domain models shared by the session core and its front ends.

pub mod role;
pub mod user;

pub use role::{Role, UnknownRole};
pub use user::{Credentials, User};
