use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use crate::{
    client::GuestyClient,
    config::AppConfig,
    images::HttpFileFactory,
    report::CollectingReporter,
    source::SourceSummary,
    store::MemoryNodeStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub client: Arc<GuestyClient>,
    pub files: Arc<HttpFileFactory>,
    pub store: Arc<MemoryNodeStore>,
    pub reporter: Arc<CollectingReporter>,
    pub status: Arc<Mutex<Status>>,
    pub shutdown_sender: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Status {
    pub is_busy: bool,
    pub message: String,
    pub last_summary: Option<SourceSummary>,
}
