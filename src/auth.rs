//! Auth-domain identifiers, token secrets, and per-user credential records.

pub mod id;
pub mod token;

pub use id::*;
pub use token::{credential::*, secret::*};
