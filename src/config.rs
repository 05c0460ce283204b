//! Configuration for odindex
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;
use uuid::Uuid;

use crate::preview::Theme;

/// odindex - OneDrive file index gateway
#[derive(Parser, Debug, Clone)]
#[command(name = "odindex")]
#[command(about = "Serve a OneDrive folder tree as a browsable file index")]
pub struct Args {
    /// Unique identifier for this instance (shown in /health)
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Microsoft Graph drive endpoint
    #[arg(
        long,
        env = "GRAPH_DRIVE_API",
        default_value = "https://graph.microsoft.com/v1.0/me/drive"
    )]
    pub drive_api: String,

    /// OAuth token endpoint used for refresh and code exchange
    #[arg(
        long,
        env = "OAUTH_TOKEN_API",
        default_value = "https://login.microsoftonline.com/common/oauth2/v2.0/token"
    )]
    pub auth_api: String,

    /// OAuth authorize endpoint (used by odindex-authorize)
    #[arg(
        long,
        env = "OAUTH_AUTHORIZE_API",
        default_value = "https://login.microsoftonline.com/common/oauth2/v2.0/authorize"
    )]
    pub authorize_api: String,

    /// Azure application (client) id
    #[arg(long, env = "CLIENT_ID", default_value = "")]
    pub client_id: String,

    /// Azure application client secret
    #[arg(long, env = "CLIENT_SECRET")]
    pub client_secret: Option<String>,

    /// OAuth redirect URI registered for the application
    #[arg(long, env = "REDIRECT_URI", default_value = "http://localhost")]
    pub redirect_uri: String,

    /// OAuth scopes requested during authorization
    #[arg(long, env = "OAUTH_SCOPE", default_value = "user.read files.read.all offline_access")]
    pub scope: String,

    /// OneDrive directory served as the index root
    #[arg(long, env = "BASE_DIRECTORY", default_value = "/")]
    pub base_directory: String,

    /// Page size for folder listings and search results
    #[arg(long, env = "MAX_ITEMS", default_value = "100")]
    pub max_items: u32,

    /// Comma-separated list of password-protected folders
    /// (each must contain a `.password` file)
    #[arg(long, env = "PROTECTED_ROUTES", default_value = "")]
    pub protected_routes: String,

    /// Cache-Control header for public responses
    #[arg(
        long,
        env = "CACHE_CONTROL_HEADER",
        default_value = "max-age=0, s-maxage=60, stale-while-revalidate"
    )]
    pub cache_control_header: String,

    /// Public base URL used in absolute links (derived from Host when unset)
    #[arg(long, env = "PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Theme reported when the client sends no color-scheme hint
    #[arg(long, env = "DEFAULT_THEME", value_enum, default_value_t = Theme::Light)]
    pub default_theme: Theme,

    /// Upstream request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Token store configuration
    #[command(flatten)]
    pub store: StoreArgs,
}

/// Output format for tracing
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Key-value backend holding the OAuth token pair
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStoreBackend {
    /// In-process map shared by every request
    Memory,
    /// Environment variables with an in-process write overlay
    Env,
    /// Cloudflare Workers KV over the REST API
    Cloudflare,
}

/// Token store configuration
#[derive(Parser, Debug, Clone)]
pub struct StoreArgs {
    /// Token store backend
    #[arg(long, env = "TOKEN_STORE", value_enum, default_value_t = TokenStoreBackend::Memory)]
    pub token_store: TokenStoreBackend,

    /// Variable prefix for the env backend (reads `{PREFIX}ACCESS_TOKEN`)
    #[arg(long, env = "TOKEN_ENV_PREFIX", default_value = "OD_")]
    pub token_env_prefix: String,

    /// Cloudflare account id
    #[arg(long, env = "CF_ACCOUNT_ID")]
    pub cf_account_id: Option<String>,

    /// Cloudflare KV namespace id
    #[arg(long, env = "CF_KV_NAMESPACE_ID")]
    pub cf_namespace_id: Option<String>,

    /// Cloudflare API token with KV read/write permission
    #[arg(long, env = "CF_API_TOKEN")]
    pub cf_api_token: Option<String>,

    /// Cloudflare REST API base
    #[arg(long, env = "CF_API_BASE", default_value = "https://api.cloudflare.com/client/v4")]
    pub cf_api_base: String,
}

impl Args {
    /// Protected folders, trimmed, empty entries removed
    pub fn protected_route_list(&self) -> Vec<String> {
        self.protected_routes
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Upstream request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Drive endpoint without a trailing slash
    pub fn drive_api(&self) -> &str {
        self.drive_api.trim_end_matches('/')
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.base_directory.starts_with('/') {
            return Err("BASE_DIRECTORY must be an absolute path".to_string());
        }

        if self.max_items == 0 || self.max_items > 1000 {
            return Err("MAX_ITEMS must be between 1 and 1000".to_string());
        }

        if self.store.token_store == TokenStoreBackend::Cloudflare {
            let missing: Vec<&str> = [
                ("CF_ACCOUNT_ID", &self.store.cf_account_id),
                ("CF_KV_NAMESPACE_ID", &self.store.cf_namespace_id),
                ("CF_API_TOKEN", &self.store.cf_api_token),
            ]
            .iter()
            .filter(|(_, v)| v.as_deref().map_or(true, str::is_empty))
            .map(|(name, _)| *name)
            .collect();

            if !missing.is_empty() {
                return Err(format!(
                    "Cloudflare token store requires {}",
                    missing.join(", ")
                ));
            }
        }

        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        Ok(())
    }
}
