//! quicklink-remote
//!
//! Cloud backends reached over their REST interfaces, plus the hybrid layer
//! that falls back to the local store when the cloud is unreachable.

pub mod error;
pub mod firebase;
mod http;
pub mod hybrid;
pub mod sheets;
pub mod status;
pub mod supabase;

pub use error::RemoteError;
pub use firebase::{FirebaseSettings, FirebaseStore};
pub use http::DEFAULT_TIMEOUT;
pub use hybrid::{HybridOptions, HybridStore, MonitorHandle, StorageInfo};
pub use sheets::{SheetsBackend, SheetsSettings, SheetsStore};
pub use status::{CloudStore, ConnectionMode, ConnectionProbe, ConnectionStatus};
pub use supabase::{SupabaseSettings, SupabaseStore};
