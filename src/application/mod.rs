//! Application services: content stores, webhook authentication, and the
//! request-scoped fetch memoizer.

pub mod auth;
pub mod content;
pub mod error;
pub mod memo;
