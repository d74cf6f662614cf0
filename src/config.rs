use serde::Deserialize;
use std::num::NonZeroU32;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the content API, e.g. `http://localhost:9000`
    pub api_base_url: String,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Items shown per section on the home page
    #[serde(default = "default_feed_limit")]
    pub feed_limit: NonZeroU32,
    /// Items shown on a "view all" listing page
    #[serde(default = "default_listing_limit")]
    pub listing_limit: NonZeroU32,
    /// Transport timeout for backend requests, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Longest a page waits for its components before rendering what it has
    #[serde(default = "default_render_deadline_ms")]
    pub render_deadline_ms: u64,
    /// Full-screen pages that render without the footer
    #[serde(default = "default_immersive_routes")]
    pub immersive_routes: Vec<String>,
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_feed_limit() -> NonZeroU32 {
    NonZeroU32::new(4).unwrap_or(NonZeroU32::MIN)
}

fn default_listing_limit() -> NonZeroU32 {
    NonZeroU32::new(20).unwrap_or(NonZeroU32::MIN)
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_render_deadline_ms() -> u64 {
    2000
}

fn default_immersive_routes() -> Vec<String> {
    vec!["/chat".to_string()]
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Replace the API base URL, e.g. from the `API_BASE_URL` environment variable
    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }
}
