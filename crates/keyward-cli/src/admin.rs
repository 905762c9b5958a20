//! Local administration against the client store and key directory.
//!
//! These run on the gateway host. `RocksDB` holds an exclusive lock, so the
//! gateway must be stopped before editing its data directory.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use rand::RngCore;

use keyward_core::{ClientId, KeyId};
use keyward_issuer::keyring::{generate_key_pair, write_key_pair};
use keyward_issuer::{hash_secret, KeyRing};
use keyward_store::{ClientStore, OAuthClient};

/// Length of generated client secrets, in bytes.
const SECRET_BYTES: usize = 32;

/// Generate a random hex client secret.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Register a new client. Existing clients are never overwritten.
pub fn add_client<S: ClientStore>(
    store: &S,
    client_id: &str,
    secret: &str,
    name: &str,
    scopes: &str,
) -> anyhow::Result<OAuthClient> {
    let id = ClientId::new(client_id).with_context(|| format!("invalid client id '{client_id}'"))?;
    if secret.is_empty() {
        bail!("client secret must not be empty");
    }
    if store.get_client(&id)?.is_some() {
        bail!("client '{id}' already exists");
    }

    let client = OAuthClient::new(id, hash_secret(secret), name, scopes);
    store.put_client(&client)?;
    tracing::info!(client_id = %client.client_id, "Client registered");
    Ok(client)
}

/// Enable or disable a client.
pub fn set_active<S: ClientStore>(store: &S, client_id: &str, active: bool) -> anyhow::Result<()> {
    let id = ClientId::new(client_id).with_context(|| format!("invalid client id '{client_id}'"))?;
    store
        .set_client_active(&id, active)
        .with_context(|| format!("client '{id}'"))?;
    tracing::info!(client_id = %id, active, "Client updated");
    Ok(())
}

/// Delete a client record.
pub fn remove_client<S: ClientStore>(store: &S, client_id: &str) -> anyhow::Result<()> {
    let id = ClientId::new(client_id).with_context(|| format!("invalid client id '{client_id}'"))?;
    store
        .delete_client(&id)
        .with_context(|| format!("client '{id}'"))?;
    tracing::info!(client_id = %id, "Client removed");
    Ok(())
}

/// One line per client: id, state, scopes, name.
pub fn format_clients(clients: &[OAuthClient]) -> String {
    clients
        .iter()
        .map(|c| {
            format!(
                "{}\t{}\t{}\t{}\t{}",
                c.client_id,
                if c.is_active { "active" } else { "inactive" },
                c.scopes,
                c.name,
                c.created_at.format("%Y-%m-%dT%H:%M:%SZ"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generate a key pair into `dir` under `kid`. Refuses to overwrite.
pub fn generate_key(dir: &Path, kid: &str) -> anyhow::Result<PathBuf> {
    let kid = KeyId::new(kid).with_context(|| format!("invalid key id '{kid}'"))?;
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let private_key = generate_key_pair()?;
    let path = write_key_pair(dir, &kid, &private_key)?;
    tracing::info!(kid = %kid, path = %path.display(), "Generated key pair");
    Ok(path)
}

/// Render the JWKS a gateway would publish for `dir`.
pub fn render_jwks(dir: &Path, active_kid: &str) -> anyhow::Result<String> {
    let ring = KeyRing::from_directory(dir, active_kid)?;
    Ok(serde_json::to_string_pretty(&*ring.jwks())?)
}
