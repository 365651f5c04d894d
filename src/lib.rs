#![doc(test(attr(deny(warnings))))]

//! QuickLink keeps website shortcuts and their subscription payments in a
//! local JSON document or one of several cloud backends, driven from a
//! command shell.

pub mod cli;
pub mod errors;
pub mod utils;

pub use quicklink_config as config;
pub use quicklink_core as core;
pub use quicklink_domain as domain;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup debug log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::debug!("QuickLink tracing initialized.");
    });
}
