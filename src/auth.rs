//! Credential pairs, cached bearer tokens, and redacted secret wrappers.

pub mod credentials;
pub mod token;

pub use credentials::*;
pub use token::{record::*, secret::*};
