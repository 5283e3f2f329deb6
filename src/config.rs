use crate::error::{QuicktransError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_GOOGLE_BASE_URL: &str = "https://translation.googleapis.com";
pub const DEFAULT_ALIYUN_PROXY_URL: &str = "http://localhost:3000/api/aliyun-proxy";
pub const DEFAULT_DASHSCOPE_URL: &str =
    "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

/// Endpoint and filesystem settings. User preferences live in the store,
/// not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub openai_base_url: String,
    pub deepseek_base_url: String,
    pub google_base_url: String,
    pub aliyun_proxy_url: String,
    /// Upstream chat-completions URL the proxy forwards Aliyun calls to.
    pub dashscope_url: String,
    pub listen_addr: String,
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            deepseek_base_url: DEFAULT_DEEPSEEK_BASE_URL.to_string(),
            google_base_url: DEFAULT_GOOGLE_BASE_URL.to_string(),
            aliyun_proxy_url: DEFAULT_ALIYUN_PROXY_URL.to_string(),
            dashscope_url: DEFAULT_DASHSCOPE_URL.to_string(),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            data_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                match toml::from_str::<Config>(&contents) {
                    Ok(file_config) => config = file_config,
                    Err(e) => tracing::warn!(
                        "Ignoring malformed config file {}: {}",
                        config_path.display(),
                        e
                    ),
                }
            }
        }

        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Override fields from `QUICKTRANS_*` variables. The lookup is injected
    /// so tests don't have to touch the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("QUICKTRANS_OPENAI_BASE_URL") {
            self.openai_base_url = url;
        }
        if let Some(url) = lookup("QUICKTRANS_DEEPSEEK_BASE_URL") {
            self.deepseek_base_url = url;
        }
        if let Some(url) = lookup("QUICKTRANS_GOOGLE_BASE_URL") {
            self.google_base_url = url;
        }
        if let Some(url) = lookup("QUICKTRANS_ALIYUN_PROXY_URL") {
            self.aliyun_proxy_url = url;
        }
        if let Some(url) = lookup("QUICKTRANS_DASHSCOPE_URL") {
            self.dashscope_url = url;
        }
        if let Some(addr) = lookup("QUICKTRANS_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(dir) = lookup("QUICKTRANS_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        let urls = [
            ("openai_base_url", &self.openai_base_url),
            ("deepseek_base_url", &self.deepseek_base_url),
            ("google_base_url", &self.google_base_url),
            ("aliyun_proxy_url", &self.aliyun_proxy_url),
            ("dashscope_url", &self.dashscope_url),
        ];
        for (name, url) in urls {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(QuicktransError::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, url
                )));
            }
        }

        self.listen_addr.parse::<SocketAddr>().map_err(|_| {
            QuicktransError::Config(format!(
                "listen_addr must be host:port, got '{}'",
                self.listen_addr
            ))
        })?;

        Ok(())
    }

    /// Path of the preference/history store file.
    pub fn store_path(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|p| p.join("quicktrans")))
            .map(|dir| dir.join("store.json"))
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("quicktrans").join("config.toml"))
    }
}
