use crate::api::ApiClient;
use crate::config::ConsoleConfig;
use crate::session::SessionStore;
use crate::views::ConsoleViews;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConsoleConfig>,
    pub session: SessionStore,
    pub api: ApiClient,
    pub views: Arc<Mutex<ConsoleViews>>,
}

impl AppState {
    pub fn new(config: ConsoleConfig, session: SessionStore) -> Self {
        let api = ApiClient::new(config.api_url.clone());
        Self {
            config: Arc::new(config),
            session,
            api,
            views: Arc::new(Mutex::new(ConsoleViews::default())),
        }
    }
}
