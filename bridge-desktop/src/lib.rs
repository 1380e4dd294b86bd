//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux):
//! - `HttpClient` using `reqwest`
//! - `SettingsStore` using a SQLite-backed key-value table
//! - `BlobStorage` using one file per song under the data directory
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FileBlobStorage, ReqwestHttpClient, SqliteSettingsStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let blobs = FileBlobStorage::new();
//!     let settings = SqliteSettingsStore::in_memory().await?;
//!     // Hand them to CoreConfig::builder()
//!     Ok(())
//! }
//! ```

mod blob_store;
mod http;
mod settings;

pub use blob_store::FileBlobStorage;
pub use http::ReqwestHttpClient;
pub use settings::SqliteSettingsStore;
