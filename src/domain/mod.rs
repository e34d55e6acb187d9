//! Domain types and invariants: articles and the slug rules that guard every
//! path construction and outbound request.

pub mod article;
pub mod slug;
