use chrono::{DateTime, Utc};
use serde::Serialize;

/// One entry of a blob store listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Blob {
    /// Object name relative to the blobs collection (last `href` segment).
    pub path: String,
    pub size: u64,
    pub created: DateTime<Utc>,
}

/// Fetch one object to a destination path on the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadAction {
    pub from: String,
    pub to: String,
    pub user: String,
    pub log_source: String,
}

/// Invoke an executable on the worker with explicit arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunAction {
    pub path: String,
    pub dir: String,
    pub args: Vec<String>,
    pub user: String,
    pub log_source: String,
}

/// Wrapped action as consumed by the execution engine, e.g. `{"download": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Download(DownloadAction),
    Run(RunAction),
}

impl From<DownloadAction> for Action {
    fn from(action: DownloadAction) -> Self {
        Action::Download(action)
    }
}

impl From<RunAction> for Action {
    fn from(action: RunAction) -> Self {
        Action::Run(action)
    }
}
