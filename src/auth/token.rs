//! Cached bearer token model and the redacted secret wrapper it stores.

pub mod record;
pub mod secret;
