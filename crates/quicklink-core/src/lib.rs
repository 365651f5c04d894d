//! quicklink-core
//!
//! Business logic and services for QuickLink.
//! Depends on quicklink-domain. No CLI, no terminal I/O, no network access.

pub mod category_service;
pub mod error;
pub mod grouping_service;
pub mod manager;
pub mod payment_service;
pub mod sample_data;
pub mod shortcut_service;
pub mod storage;
pub mod sync_planner;
pub mod time;

#[cfg(test)]
mod tests;

pub use category_service::*;
pub use error::CoreError;
pub use grouping_service::*;
pub use manager::ShortcutManager;
pub use payment_service::*;
pub use sample_data::sample_collection;
pub use shortcut_service::*;
pub use storage::{DocumentBackend, DocumentStore, MemoryBackend, MemoryStore, ShortcutStore};
pub use sync_planner::*;
pub use time::{Clock, FixedClock, SystemClock};
