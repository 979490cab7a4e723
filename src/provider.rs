//! Service-facing descriptors (data) and request strategies (behavior).
//!
//! `descriptor` exposes validated metadata (`ServiceDescriptor`) covering the API base, the
//! token exchange transport, the tenant identity endpoint, and service quirks such as the
//! documented 404 fallback routes. `strategy` defines [`UrlRewrite`], a pure URL transform used
//! to route outbound calls through an optional CORS relay without touching error semantics.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
