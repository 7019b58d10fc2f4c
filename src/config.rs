use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Generative Language API key. When unset, recommendations use the fallback path
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    /// Generative Language API base URL
    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    /// Model used for recommendation prompts
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Open Library search API base URL
    #[serde(default = "default_cover_api_url")]
    pub cover_api_url: String,

    /// Open Library cover image base URL
    #[serde(default = "default_cover_image_url")]
    pub cover_image_url: String,

    /// Password accepted for the admin role. No password means no admin logins
    #[serde(default)]
    pub admin_password: Option<String>,

    /// Interval between seat occupancy updates, in milliseconds
    #[serde(default = "default_seat_tick_ms")]
    pub seat_tick_ms: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_cover_api_url() -> String {
    "https://openlibrary.org".to_string()
}

fn default_cover_image_url() -> String {
    "https://covers.openlibrary.org".to_string()
}

fn default_seat_tick_ms() -> u64 {
    2500
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_api_url: default_gemini_api_url(),
            gemini_model: default_gemini_model(),
            cover_api_url: default_cover_api_url(),
            cover_image_url: default_cover_image_url(),
            admin_password: None,
            seat_tick_ms: default_seat_tick_ms(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// The model credential, if one is configured. Blank values count as absent.
    pub fn credential(&self) -> Option<&str> {
        self.gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
