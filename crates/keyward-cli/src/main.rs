//! Keyward CLI - operator tool for clients and signing keys.
//!
//! This is the entry point for the `keyward` binary.
//!
//! `client`, `hash-secret`, and `key` work locally on the data and key
//! directories. `token` talks to a running gateway's public listener and
//! `keys` to its internal one.

mod admin;
mod client;
mod types;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use keyward_store::{ClientStore, RocksStore};

use client::GatewayClient;

/// Keyward CLI - manage OAuth clients and signing keys.
#[derive(Parser, Debug)]
#[command(name = "keyward")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging.
    #[arg(long, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the stored hash of a client secret.
    HashSecret {
        /// The plaintext secret.
        secret: String,
    },

    /// Manage client records in the gateway's data directory.
    Client {
        /// Gateway data directory (the gateway must be stopped).
        #[arg(long, env = "DATA_DIR", default_value = "/data/keyward")]
        data_dir: PathBuf,

        #[command(subcommand)]
        action: ClientAction,
    },

    /// Manage key pairs in a key directory.
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Request a service token from a running gateway.
    Token {
        /// Gateway URL.
        #[arg(long, env = "KEYWARD_GATEWAY", default_value = "http://localhost:8081")]
        gateway: String,

        /// Client ID.
        #[arg(long, env = "KEYWARD_CLIENT_ID")]
        client_id: String,

        /// Client secret.
        #[arg(long, env = "KEYWARD_CLIENT_SECRET", hide_env_values = true)]
        client_secret: String,
    },

    /// Rotate keys on a running gateway.
    Keys {
        /// Gateway internal listener URL.
        #[arg(long, env = "KEYWARD_INTERNAL_URL", default_value = "http://127.0.0.1:9081")]
        internal_url: String,

        #[command(subcommand)]
        action: KeysAction,
    },
}

#[derive(Subcommand, Debug)]
enum ClientAction {
    /// Register a client. Prints the secret if one is generated.
    Add {
        /// Client ID (token subject).
        client_id: String,
        /// Display name.
        #[arg(long, default_value = "")]
        name: String,
        /// Space-separated scopes.
        #[arg(long, default_value = "")]
        scopes: String,
        /// Client secret; generated if omitted.
        #[arg(long, env = "KEYWARD_CLIENT_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },
    /// Re-enable a client.
    Activate {
        /// Client ID.
        client_id: String,
    },
    /// Disable a client without deleting it.
    Deactivate {
        /// Client ID.
        client_id: String,
    },
    /// Delete a client.
    Remove {
        /// Client ID.
        client_id: String,
    },
    /// List all clients.
    List,
}

#[derive(Subcommand, Debug)]
enum KeyAction {
    /// Generate `<kid>_private.pem` and `<kid>_public.pem`.
    Generate {
        /// Key directory.
        #[arg(long, env = "KEYS_DIR")]
        dir: PathBuf,
        /// Key ID.
        kid: String,
    },
    /// Print the JWKS for a key directory.
    Jwks {
        /// Key directory.
        #[arg(long, env = "KEYS_DIR")]
        dir: PathBuf,
        /// Active key ID.
        #[arg(long, env = "ACTIVE_KEY_ID")]
        active: String,
    },
}

#[derive(Subcommand, Debug)]
enum KeysAction {
    /// Show the active kid and all published kids.
    List,
    /// Load new key pairs from the gateway's key directory.
    Reload,
    /// Start signing with a loaded key.
    Activate {
        /// Key ID.
        kid: String,
    },
    /// Stop publishing a key.
    Retire {
        /// Key ID.
        kid: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_filter = if args.debug {
        "info,keyward=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::HashSecret { secret } => {
            println!("{}", keyward_issuer::hash_secret(&secret));
        }
        Command::Client { data_dir, action } => {
            let store = RocksStore::open(&data_dir)?;
            run_client(&store, action)?;
        }
        Command::Key { action } => match action {
            KeyAction::Generate { dir, kid } => {
                let path = admin::generate_key(&dir, &kid)?;
                println!("{}", path.display());
            }
            KeyAction::Jwks { dir, active } => {
                println!("{}", admin::render_jwks(&dir, &active)?);
            }
        },
        Command::Token {
            gateway,
            client_id,
            client_secret,
        } => {
            let client = GatewayClient::new(gateway);
            let token = client.request_token(&client_id, &client_secret).await?;
            println!("{}", token.access_token);
        }
        Command::Keys {
            internal_url,
            action,
        } => {
            run_keys(&GatewayClient::new(internal_url), action).await?;
        }
    }

    Ok(())
}

fn run_client<S: ClientStore>(store: &S, action: ClientAction) -> anyhow::Result<()> {
    match action {
        ClientAction::Add {
            client_id,
            name,
            scopes,
            secret,
        } => {
            let generated = secret.is_none();
            let secret = secret.unwrap_or_else(admin::generate_secret);
            let client = admin::add_client(store, &client_id, &secret, &name, &scopes)?;
            println!("{}", client.client_id);
            if generated {
                println!("secret: {secret}");
            }
        }
        ClientAction::Activate { client_id } => admin::set_active(store, &client_id, true)?,
        ClientAction::Deactivate { client_id } => admin::set_active(store, &client_id, false)?,
        ClientAction::Remove { client_id } => admin::remove_client(store, &client_id)?,
        ClientAction::List => {
            let listing = admin::format_clients(&store.list_clients()?);
            if !listing.is_empty() {
                println!("{listing}");
            }
        }
    }
    Ok(())
}

async fn run_keys(client: &GatewayClient, action: KeysAction) -> anyhow::Result<()> {
    let keys = match action {
        KeysAction::List => client.list_keys().await?,
        KeysAction::Reload => {
            let reload = client.reload_keys().await?;
            for kid in &reload.added {
                println!("added {kid}");
            }
            reload.keys
        }
        KeysAction::Activate { kid } => client.set_active_key(&kid).await?,
        KeysAction::Retire { kid } => client.retire_key(&kid).await?,
    };

    for kid in &keys.key_ids {
        let marker = if *kid == keys.active_key_id { "*" } else { " " };
        println!("{marker} {kid}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_client_add() {
        let args = Args::try_parse_from([
            "keyward",
            "client",
            "--data-dir",
            "/tmp/kw",
            "add",
            "wallet-app",
            "--scopes",
            "wallet:read wallet:write",
            "--secret",
            "s3cret",
        ])
        .unwrap();

        match args.command {
            Command::Client {
                data_dir,
                action: ClientAction::Add { client_id, scopes, secret, .. },
            } => {
                assert_eq!(data_dir, PathBuf::from("/tmp/kw"));
                assert_eq!(client_id, "wallet-app");
                assert_eq!(scopes, "wallet:read wallet:write");
                assert_eq!(secret.as_deref(), Some("s3cret"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn keys_target_internal_listener() {
        let args = Args::try_parse_from(["keyward", "keys", "retire", "old-key"]).unwrap();
        match args.command {
            Command::Keys {
                internal_url,
                action: KeysAction::Retire { kid },
            } => {
                if std::env::var_os("KEYWARD_INTERNAL_URL").is_none() {
                    assert_eq!(internal_url, "http://127.0.0.1:9081");
                }
                assert_eq!(kid, "old-key");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn client_actions_run_against_store() {
        let store = keyward_store::MemoryStore::new();
        run_client(
            &store,
            ClientAction::Add {
                client_id: "wallet-app".into(),
                name: "Wallet".into(),
                scopes: String::new(),
                secret: Some("s3cret".into()),
            },
        )
        .unwrap();
        run_client(&store, ClientAction::Deactivate { client_id: "wallet-app".into() }).unwrap();

        let clients = store.list_clients().unwrap();
        assert_eq!(clients.len(), 1);
        assert!(!clients[0].is_active);
    }
}
