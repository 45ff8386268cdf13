use std::path::PathBuf;

use crate::error::Result;
use bookcat_app::state::AppConfig;
pub use clap::Parser;
use url::Url;

#[derive(Debug, Clone, clap::Parser)]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 3000,
        env = "BOOKCAT_LISTEN_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,
    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "BOOKCAT_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[arg(
        long,
        env = "BOOKCAT_BASE_URL",
        default_value = "http://localhost:3000",
        help = "Base URL of server, as visible to API clients"
    )]
    pub base_url: Url,

    #[arg(
        long,
        env = "BOOKCAT_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db, default is sqlite://[data-dir]/bookcat.db, where data-dir is set by --data-dir"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "BOOKCAT_DATA_DIR",
        help = "Data directory for the catalog database, default is system default like ~/.local/share/bookcat",
        default_value_t = default_data_dir()
    )]
    data_dir: String,

    #[arg(
        long,
        env = "BOOKCAT_DEFAULT_PAGE_SIZE",
        default_value = "100",
        value_parser = clap::value_parser!(u32).range(1..=1000),
        help = "Default page size"
    )]
    pub default_page_size: u32,

    #[arg(
        long,
        env = "BOOKCAT_RECENT_WINDOW_DAYS",
        default_value = "1825",
        help = "Books published within this number of days are listed as recent"
    )]
    pub recent_window_days: u32,

    #[arg(long, env = "BOOKCAT_CORS", help = "Enable permissive CORS")]
    pub cors: bool,
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("bookcat"))
        .unwrap_or_else(|| PathBuf::from("bookcat"))
        .to_string_lossy()
        .to_string()
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/bookcat.db", self.data_dir))
    }
}

impl From<&ServerConfig> for AppConfig {
    fn from(config: &ServerConfig) -> Self {
        AppConfig {
            default_page_size: config.default_page_size,
            recent_window_days: config.recent_window_days,
        }
    }
}
