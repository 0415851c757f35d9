//! Action descriptors that let a worker fetch or push blobs on its own.
//!
//! Nothing here touches the network; the URLs carry the store credentials
//! inline because the worker has no other way to authenticate.

use crate::blob_store::config::BlobStoreConfig;
use crate::blob_store::types::{Action, DownloadAction, RunAction};

pub const APP_BITS_SUFFIX: &str = "-bits.zip";
pub const DROPLET_SUFFIX: &str = "-droplet.tgz";

/// WebDAV CLI installed on workers.
pub const DAVTOOL_PATH: &str = "/tmp/davtool";
pub const DAVTOOL_DIR: &str = "/";
pub const ACTION_USER: &str = "vcap";
pub const ACTION_LOG_SOURCE: &str = "DROPLET";

pub const APP_BITS_DESTINATION: &str = "/tmp/app";
pub const DROPLET_DESTINATION: &str = "/home/vcap";
/// Where staging leaves the droplet before it is uploaded.
pub const LOCAL_DROPLET_PATH: &str = "/tmp/droplet";

impl BlobStoreConfig {
    pub fn app_bits_url(&self, name: &str) -> String {
        self.blob_url(&format!("{name}{APP_BITS_SUFFIX}"))
    }

    pub fn droplet_url(&self, name: &str) -> String {
        self.blob_url(&format!("{name}{DROPLET_SUFFIX}"))
    }
}

fn davtool(args: Vec<String>) -> Action {
    RunAction {
        path: DAVTOOL_PATH.to_string(),
        dir: DAVTOOL_DIR.to_string(),
        args,
        user: ACTION_USER.to_string(),
        log_source: ACTION_LOG_SOURCE.to_string(),
    }
    .into()
}

fn download(from: String, to: &str) -> Action {
    DownloadAction {
        from,
        to: to.to_string(),
        user: ACTION_USER.to_string(),
        log_source: ACTION_LOG_SOURCE.to_string(),
    }
    .into()
}

pub fn download_app_bits_action(config: &BlobStoreConfig, name: &str) -> Action {
    download(config.app_bits_url(name), APP_BITS_DESTINATION)
}

pub fn delete_app_bits_action(config: &BlobStoreConfig, name: &str) -> Action {
    davtool(vec!["delete".to_string(), config.app_bits_url(name)])
}

pub fn upload_droplet_action(config: &BlobStoreConfig, name: &str) -> Action {
    davtool(vec![
        "put".to_string(),
        config.droplet_url(name),
        LOCAL_DROPLET_PATH.to_string(),
    ])
}

pub fn download_droplet_action(config: &BlobStoreConfig, name: &str) -> Action {
    download(config.droplet_url(name), DROPLET_DESTINATION)
}

impl crate::blob_store::DavBlobStore {
    pub fn download_app_bits_action(&self, name: &str) -> Action {
        download_app_bits_action(self.config(), name)
    }

    pub fn delete_app_bits_action(&self, name: &str) -> Action {
        delete_app_bits_action(self.config(), name)
    }

    pub fn upload_droplet_action(&self, name: &str) -> Action {
        upload_droplet_action(self.config(), name)
    }

    pub fn download_droplet_action(&self, name: &str) -> Action {
        download_droplet_action(self.config(), name)
    }
}
