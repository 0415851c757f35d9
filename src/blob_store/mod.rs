pub mod actions;
pub mod client;
pub mod config;
pub mod error;
pub mod multistatus;
pub mod types;

pub use actions::{
    delete_app_bits_action, download_app_bits_action, download_droplet_action,
    upload_droplet_action,
};
pub use client::{BlobReader, DavBlobStore};
pub use config::{BLOBS_COLLECTION, BlobStoreConfig};
pub use error::{BlobStoreError, ErrorKind, Result};
pub use multistatus::{last_segment, parse_http_date, parse_multistatus};
pub use types::{Action, Blob, DownloadAction, RunAction};
