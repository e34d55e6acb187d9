//! Rendered-page cache: store, middleware, and the revalidation trigger the
//! webhook endpoints call into.

mod config;
mod middleware;
mod store;
mod trigger;

pub use config::CacheConfig;
pub use middleware::{CacheState, page_cache_layer};
pub use store::{CachedPage, PageKey, PageStore};
pub use trigger::RevalidateTrigger;
