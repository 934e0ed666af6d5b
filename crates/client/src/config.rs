use std::path::PathBuf;

/// Client configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API (default: `http://localhost:3000/api`).
    pub api_url: String,
    /// Base URL of the push channel (default: `ws://localhost:3000/ws`).
    pub ws_url: String,
    /// Where the token pair is persisted between runs. `None` keeps
    /// tokens in memory only.
    pub token_file: Option<PathBuf>,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// Reads a `.env` file first when one is present.
    ///
    /// | Env Var               | Default                     |
    /// |-----------------------|-----------------------------|
    /// | `GLOWDESK_API_URL`    | `http://localhost:3000/api` |
    /// | `GLOWDESK_WS_URL`     | `ws://localhost:3000/ws`    |
    /// | `GLOWDESK_TOKEN_FILE` | unset (in-memory tokens)    |
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_url = std::env::var("GLOWDESK_API_URL")
            .unwrap_or_else(|_| "http://localhost:3000/api".into());

        let ws_url =
            std::env::var("GLOWDESK_WS_URL").unwrap_or_else(|_| "ws://localhost:3000/ws".into());

        let token_file = std::env::var("GLOWDESK_TOKEN_FILE").ok().map(PathBuf::from);

        Self {
            api_url,
            ws_url,
            token_file,
        }
    }
}
