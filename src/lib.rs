//! # fwfetch
//!
//! Keeps a local folder in sync with a remote directory listing of ESP32
//! firmware binaries (`esp32-*.bin`): lists what the server offers, lists
//! what is already on disk, and downloads the difference.
//!
//! ## Configuration
//!
//! The config file is TOML. It uses the same `[server]`, `[local]` and
//! `[options]` sections and keys as the older `micropython.ini`, but string
//! values must be quoted, so an unquoted INI file has to be edited before it
//! loads:
//!
//! ```toml
//! [server]
//! webpage = "https://micropython.org/download/esp32/"
//! downloadpage = "https://micropython.org/resources/firmware"
//!
//! [local]
//! targetfolder = "./firmware"
//!
//! [options]
//! include_unstable = false
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fwfetch::{Api, Config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_toml(r#"
//!         [server]
//!         webpage = "https://micropython.org/download/esp32/"
//!         downloadpage = "https://micropython.org/resources/firmware"
//!         [local]
//!         targetfolder = "./firmware"
//!     "#).unwrap();
//!
//!     Api::from_config(&config).sync().await.unwrap();
//! }
//! ```

pub mod api;
pub mod config;
pub mod downloader;
pub mod error;
pub mod listing;
pub mod logging;
pub mod progress;
pub mod reconcile;

pub use api::{Api, SyncReport};
pub use config::{Config, ListingKind};
pub use downloader::Downloader;
pub use error::FetchError;
pub use listing::ListingProvider;
pub use reconcile::compute_missing;
