//! quicklink-domain
//!
//! Pure domain models (Shortcut, Category, Collection) and shared date helpers.
//! No I/O, no CLI, no storage. Only data types and core enums.

pub mod category;
pub mod collection;
pub mod common;
pub mod shortcut;

pub use category::*;
pub use collection::*;
pub use common::*;
pub use shortcut::*;
