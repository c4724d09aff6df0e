use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path to the movies JSON file
    #[serde(default = "default_movies_path")]
    pub movies_path: String,

    /// Path to the tab-separated poster table
    #[serde(default = "default_posters_path")]
    pub posters_path: String,

    /// TMDB API key. Poster lookups are disabled when unset.
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Prefix for TMDB poster paths
    #[serde(default = "default_tmdb_image_url")]
    pub tmdb_image_url: String,

    /// Image shown when an item has no poster
    #[serde(default = "default_placeholder_poster")]
    pub placeholder_poster: String,

    /// Number of items offered per pick pool
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Vocabulary cap for the tag vectorizer
    #[serde(default = "default_max_features")]
    pub max_features: usize,

    /// Seconds a session may sit idle before it is evicted
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_movies_path() -> String {
    "data/movies.json".to_string()
}

fn default_posters_path() -> String {
    "data/posters.tsv".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_placeholder_poster() -> String {
    "/static/placeholder.png".to_string()
}

fn default_pool_size() -> usize {
    20
}

fn default_max_features() -> usize {
    crate::services::vectorizer::DEFAULT_MAX_FEATURES
}

fn default_session_ttl_secs() -> u64 {
    crate::services::sessions::DEFAULT_SESSION_TTL_SECS
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if config.pool_size == 0 {
            anyhow::bail!("POOL_SIZE must be at least 1");
        }
        if config.max_features == 0 {
            anyhow::bail!("MAX_FEATURES must be at least 1");
        }
        if config.session_ttl_secs == 0 {
            anyhow::bail!("SESSION_TTL_SECS must be at least 1");
        }

        Ok(config)
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
