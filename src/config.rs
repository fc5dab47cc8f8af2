use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use std::net::{Ipv4Addr, SocketAddr};

/// Process configuration, read from flags or the environment (a `.env` file
/// is honoured when present).
#[derive(Parser, Debug, Clone)]
#[command(name = "ddg-gateway", about = "HTTP facade over DuckDuckGo search")]
pub struct Config {
    /// Port to listen on. The server binds all interfaces.
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// DEBUG, INFO, WARNING, ERROR or CRITICAL.
    #[arg(long, env = "LOG_LEVEL", default_value = "INFO")]
    pub log_level: String,

    #[arg(long, env = "DDG_REGION", default_value = "wt-wt")]
    pub ddg_region: String,

    /// Timeout of each request sent to DuckDuckGo.
    #[arg(long, env = "DDG_TIMEOUT_SECS", default_value_t = 10)]
    pub ddg_timeout_secs: u64,

    #[arg(long, env = "DDG_PROXY")]
    pub ddg_proxy: Option<String>,

    /// Most result pages one query is allowed to fetch.
    #[arg(long, env = "DDG_MAX_PAGES", default_value_t = 10)]
    pub ddg_max_pages: usize,
}

impl Config {
    pub fn load() -> Result<Config> {
        dotenv().ok(); // Load .env file if present
        Config::try_parse().context("Invalid configuration")
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    pub fn log_level(&self) -> tracing::Level {
        parse_log_level(&self.log_level)
    }
}

/// Unknown names fall back to INFO rather than failing startup.
pub fn parse_log_level(name: &str) -> tracing::Level {
    match name.trim().to_ascii_uppercase().as_str() {
        "TRACE" => tracing::Level::TRACE,
        "DEBUG" => tracing::Level::DEBUG,
        "WARN" | "WARNING" => tracing::Level::WARN,
        "ERROR" | "CRITICAL" | "FATAL" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
