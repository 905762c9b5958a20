//! Keyward Gateway - token issuance and verification service
//!
//! This is the main entry point for the gateway service.
//!
//! # Key material
//!
//! Set `KEYS_DIR` (and `ACTIVE_KEY_ID`) to load every `<kid>_private.pem` in a
//! directory and enable rotation. Otherwise `PRIVATE_KEY_PATH` (and optionally
//! `PUBLIC_KEY_PATH`) load a single key pair.
//!
//! # Service tokens
//!
//! Service tokens are verified against this gateway's own key ring unless
//! `SERVICE_JWKS_URL` points at a peer issuer.
//!
//! # Listeners
//!
//! The public API binds `LISTEN_ADDR`. Key rotation binds
//! `INTERNAL_LISTEN_ADDR`, which defaults to loopback.

use std::future::IntoFuture;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keyward_auth::{AuthConfig, JwksCache, JwksValidator, JwtValidator, RemoteJwks};
use keyward_gateway::{create_internal_router, create_router, GatewayConfig, GatewayState};
use keyward_issuer::{ClientAuthenticator, IssuerConfig, KeySource, TokenIssuer};
use keyward_store::RocksStore;

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_u64(name: &str, default: u64) -> Result<u64, Box<dyn std::error::Error>> {
    match std::env::var(name) {
        Ok(v) => Ok(v.parse().map_err(|e| format!("{name}: {e}"))?),
        Err(_) => Ok(default),
    }
}

fn key_source() -> KeySource {
    if let Ok(keys_dir) = std::env::var("KEYS_DIR") {
        KeySource::Directory {
            keys_dir: keys_dir.into(),
            active_kid: env_or("ACTIVE_KEY_ID", keyward_issuer::config::DEFAULT_KEY_ID),
        }
    } else {
        KeySource::Single {
            private_key_path: env_or("PRIVATE_KEY_PATH", "/keys/private.pem").into(),
            public_key_path: std::env::var("PUBLIC_KEY_PATH").ok().map(Into::into),
            kid: env_or("KEY_ID", keyward_issuer::config::DEFAULT_KEY_ID),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,keyward=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Keyward Gateway");

    // Load configuration from environment
    let data_dir = env_or("DATA_DIR", "/data/keyward");

    let gateway_config = GatewayConfig::from_env()?;

    let issuer_config = IssuerConfig {
        issuer: env_or("TOKEN_ISSUER", "superapp-idp"),
        audience: env_or("TOKEN_AUDIENCE", "superapp-api"),
        token_expiry_seconds: env_u64("TOKEN_EXPIRY_SECONDS", 3600)?,
        key_source: key_source(),
    };

    let user_auth = AuthConfig {
        jwks_url: env_or("USER_JWKS_URL", &AuthConfig::default().jwks_url),
        issuer: env_or("USER_JWT_ISSUER", "superapp-idp"),
        audience: env_or("USER_JWT_AUDIENCE", "superapp-api"),
        jwks_cache_ttl_seconds: env_u64("JWKS_CACHE_TTL_SECONDS", 3600)?,
        ..AuthConfig::default()
    };
    let service_jwks_url = std::env::var("SERVICE_JWKS_URL").ok();

    tracing::info!(
        listen_addr = %gateway_config.listen_addr,
        internal_listen_addr = %gateway_config.internal_listen_addr,
        data_dir = %data_dir,
        issuer = %issuer_config.issuer,
        audience = %issuer_config.audience,
        token_expiry_seconds = issuer_config.token_expiry_seconds,
        user_jwks_url = %user_auth.jwks_url,
        service_jwks_url = ?service_jwks_url,
        "Gateway configuration loaded"
    );

    // Initialize RocksDB store
    tracing::info!(path = %data_dir, "Opening RocksDB store");
    let store = RocksStore::open(&data_dir)?;

    // Load signing keys
    let issuer = Arc::new(TokenIssuer::from_config(&issuer_config)?);
    tracing::info!(
        active_key_id = %issuer.active_key_id(),
        key_count = issuer.key_ids().len(),
        "Token issuer initialized"
    );

    // One cache shared by every remote key set
    let cache = Arc::new(JwksCache::from_config(&user_auth)?);
    let user_validator: Arc<dyn JwtValidator> =
        Arc::new(JwksValidator::remote(&user_auth, Arc::clone(&cache)));

    let service_validator: Arc<dyn JwtValidator> = match service_jwks_url {
        Some(url) => {
            tracing::info!(jwks_url = %url, "Verifying service tokens against peer issuer");
            let claims = keyward_auth::ClaimsValidator::new(
                issuer_config.issuer.clone(),
                issuer_config.audience.clone(),
            );
            Arc::new(JwksValidator::new(RemoteJwks::new(cache, url), claims))
        }
        None => Arc::new(issuer.validator()),
    };
    tracing::info!("JWT validators initialized");

    let authenticator = Arc::new(ClientAuthenticator::new(store, issuer));
    let listen_addr = gateway_config.listen_addr.clone();
    let internal_listen_addr = gateway_config.internal_listen_addr.clone();
    let state = GatewayState::new(
        authenticator,
        user_validator,
        service_validator,
        gateway_config,
    );

    let internal_app = create_internal_router(state.clone());
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP servers
    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(listen_addr = %internal_listen_addr, "Starting internal HTTP server");
    let internal_listener = tokio::net::TcpListener::bind(&internal_listen_addr).await?;

    tokio::try_join!(
        axum::serve(listener, app).into_future(),
        axum::serve(internal_listener, internal_app).into_future(),
    )?;

    Ok(())
}
