//! odindex-authorize - seed the token store
//!
//! Without `--code`, prints the URL to open in a browser. After consenting,
//! Microsoft redirects to the registered redirect URI with `?code=…`; run
//! again with that code to exchange it and store the token pair.

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use odindex::auth::{OAuthConfig, TokenManager};
use odindex::config::{Args, TokenStoreBackend};
use odindex::logging;
use odindex::store::TokenStore;

#[derive(Parser, Debug)]
#[command(name = "odindex-authorize")]
#[command(about = "Obtain OneDrive OAuth tokens for odindex")]
struct Cli {
    /// Authorization code returned to the redirect URI
    #[arg(long)]
    code: Option<String>,

    #[command(flatten)]
    args: Args,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let args = cli.args;
    logging::init(&args.log_level, args.log_format);

    if args.client_id.is_empty() {
        bail!("CLIENT_ID is required");
    }

    let oauth = OAuthConfig::from_args(&args);

    let Some(code) = cli.code else {
        println!("Open this URL, sign in, and copy the `code` parameter from the redirect:");
        println!();
        println!("{}", oauth.authorize_url());
        return Ok(());
    };

    let store = TokenStore::from_args(&args.store, args.request_timeout())
        .context("Failed to open token store")?;
    let manager = TokenManager::new(store, oauth, args.request_timeout())?;

    // The code may be pasted with the rest of the redirect query attached
    let code = code.split('&').next().unwrap_or_default().trim();

    if manager.exchange_code(code).await?.is_none() {
        bail!("Token endpoint did not return both an access and a refresh token");
    }

    let backend = manager.store().backend();
    info!(backend, "Tokens stored");

    match args.store.token_store {
        TokenStoreBackend::Cloudflare => {
            println!("Tokens stored in Cloudflare KV.");
        }
        // These backends do not outlive this process; hand the refresh token
        // to the operator instead
        TokenStoreBackend::Env | TokenStoreBackend::Memory => {
            let tokens = manager.store().get_tokens().await?;
            let refresh_token = tokens
                .refresh_token
                .context("Refresh token missing after exchange")?;
            println!("Set this in the server environment and use TOKEN_STORE=env:");
            println!();
            println!("{}REFRESH_TOKEN={}", args.store.token_env_prefix, refresh_token);
        }
    }

    Ok(())
}
