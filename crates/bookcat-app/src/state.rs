use std::sync::Arc;

use bookcat_dal::Pool;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(app_config: AppConfig, pool: Pool) -> Self {
        AppState {
            state: Arc::new(AppStateInner { app_config, pool }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn pool(&self) -> &Pool {
        &self.state.pool
    }
}

struct AppStateInner {
    pool: Pool,
    app_config: AppConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub default_page_size: u32,
    /// Books published within this many days count as recent
    pub recent_window_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_page_size: 100,
            recent_window_days: 5 * 365,
        }
    }
}
