//! Delegated upstream credentials and the secrets they carry.

pub mod credential;
pub mod secret;
