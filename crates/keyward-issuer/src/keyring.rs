//! RSA key ring with explicit rotation.
//!
//! The ring maps kid to a private key (for signing) and a public key (for the
//! published JWKS). Exactly one loaded private key is active. Rotation flips
//! the active kid in place; older public keys stay published until they are
//! retired explicitly, so tokens signed before a rotation keep verifying.
//!
//! All state lives behind a single lock. A signer reads the active kid and
//! its key under one guard and can never observe a kid paired with another
//! kid's key.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use keyward_auth::{Jwk, JwkSet, KeySetSource};
use keyward_core::KeyId;
use parking_lot::RwLock;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::config::KeySource;
use crate::error::{IssuerError, Result};

const PRIVATE_SUFFIX: &str = "_private.pem";
const PUBLIC_SUFFIX: &str = "_public.pem";

/// Modulus size for generated keys.
pub const GENERATED_KEY_BITS: usize = 2048;

struct Inner {
    private_keys: BTreeMap<KeyId, Arc<RsaPrivateKey>>,
    public_keys: BTreeMap<KeyId, RsaPublicKey>,
    active: KeyId,
    active_key: Arc<RsaPrivateKey>,
    jwks: Arc<JwkSet>,
}

impl Inner {
    fn rebuild_jwks(&mut self) {
        let keys = self
            .public_keys
            .iter()
            .map(|(kid, key)| Jwk::from_rsa(kid.as_str(), key))
            .collect();
        self.jwks = Arc::new(JwkSet { keys });
    }
}

/// The set of signing keys known to the issuer.
pub struct KeyRing {
    inner: RwLock<Inner>,
    keys_dir: Option<PathBuf>,
}

impl KeyRing {
    /// Create a ring holding one key pair, active.
    #[must_use]
    pub fn new(kid: KeyId, private_key: RsaPrivateKey) -> Self {
        let public_key = private_key.to_public_key();
        Self::with_pair(kid, private_key, public_key)
    }

    fn with_pair(kid: KeyId, private_key: RsaPrivateKey, public_key: RsaPublicKey) -> Self {
        let private_key = Arc::new(private_key);
        let mut inner = Inner {
            private_keys: BTreeMap::from([(kid.clone(), Arc::clone(&private_key))]),
            public_keys: BTreeMap::from([(kid.clone(), public_key)]),
            active: kid,
            active_key: private_key,
            jwks: Arc::default(),
        };
        inner.rebuild_jwks();
        Self {
            inner: RwLock::new(inner),
            keys_dir: None,
        }
    }

    /// Load a ring from the configured key source.
    ///
    /// # Errors
    ///
    /// Returns `IssuerError::KeyStoreInit` if no usable key pair loads or the
    /// active kid is not among them.
    pub fn from_config(source: &KeySource) -> Result<Self> {
        match source {
            KeySource::Single {
                private_key_path,
                public_key_path,
                kid,
            } => Self::from_single(private_key_path, public_key_path.as_deref(), kid),
            KeySource::Directory {
                keys_dir,
                active_kid,
            } => Self::from_directory(keys_dir, active_kid),
        }
    }

    /// Load one explicit key pair under `kid`.
    ///
    /// An unreadable or unparsable public key file is skipped with a warning;
    /// the public half is then derived from the private key.
    ///
    /// # Errors
    ///
    /// Returns `IssuerError::KeyStoreInit` if the kid is invalid or the
    /// private key cannot be read or parsed.
    pub fn from_single(
        private_key_path: &Path,
        public_key_path: Option<&Path>,
        kid: &str,
    ) -> Result<Self> {
        let kid = KeyId::new(kid)
            .map_err(|e| IssuerError::KeyStoreInit(format!("invalid key id '{kid}': {e}")))?;

        let (private_key, public_key) = load_pair(&kid, private_key_path, public_key_path)
            .map_err(|e| IssuerError::KeyStoreInit(e.to_string()))?;

        tracing::info!(kid = %kid, path = %private_key_path.display(), "Loaded signing key");
        Ok(Self::with_pair(kid, private_key, public_key))
    }

    /// Load every `<kid>_private.pem` in `dir`, paired with `<kid>_public.pem`
    /// when present.
    ///
    /// Files that fail to load are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `IssuerError::KeyStoreInit` if the directory cannot be read,
    /// no key pair loads, or `active_kid` is not among the loaded keys.
    pub fn from_directory(dir: &Path, active_kid: &str) -> Result<Self> {
        let pairs = scan_directory(dir)?;
        if pairs.is_empty() {
            return Err(IssuerError::KeyStoreInit(format!(
                "no valid key pairs found in directory: {}",
                dir.display()
            )));
        }

        let mut private_keys = BTreeMap::new();
        let mut public_keys = BTreeMap::new();
        for (kid, private_key, public_key) in pairs {
            private_keys.insert(kid.clone(), Arc::new(private_key));
            public_keys.insert(kid, public_key);
        }

        let (active, active_key) = private_keys
            .iter()
            .find(|(kid, _)| kid.as_str() == active_kid)
            .map(|(kid, key)| (kid.clone(), Arc::clone(key)))
            .ok_or_else(|| {
                IssuerError::KeyStoreInit(format!(
                    "active key {active_kid} not found in loaded keys"
                ))
            })?;

        let mut inner = Inner {
            private_keys,
            public_keys,
            active,
            active_key,
            jwks: Arc::default(),
        };
        inner.rebuild_jwks();

        tracing::info!(
            keys_loaded = inner.private_keys.len(),
            active_key = %inner.active,
            dir = %dir.display(),
            "Key ring initialized from directory"
        );

        Ok(Self {
            inner: RwLock::new(inner),
            keys_dir: Some(dir.to_path_buf()),
        })
    }

    /// The directory this ring was loaded from, if any.
    #[must_use]
    pub fn keys_dir(&self) -> Option<&Path> {
        self.keys_dir.as_deref()
    }

    /// The kid used for new signatures.
    #[must_use]
    pub fn active_key_id(&self) -> KeyId {
        self.inner.read().active.clone()
    }

    /// All kids with a published public key, in order.
    #[must_use]
    pub fn key_ids(&self) -> Vec<KeyId> {
        self.inner.read().public_keys.keys().cloned().collect()
    }

    /// The published key set.
    #[must_use]
    pub fn jwks(&self) -> Arc<JwkSet> {
        Arc::clone(&self.inner.read().jwks)
    }

    /// The active kid together with its private key.
    #[must_use]
    pub fn signing_key(&self) -> (KeyId, Arc<RsaPrivateKey>) {
        let inner = self.inner.read();
        (inner.active.clone(), Arc::clone(&inner.active_key))
    }

    /// Make `kid` the active signing key.
    ///
    /// # Errors
    ///
    /// Returns `IssuerError::KeyNotFound` if no private key is loaded for `kid`.
    pub fn set_active_key(&self, kid: &KeyId) -> Result<()> {
        let mut inner = self.inner.write();
        let key = inner
            .private_keys
            .get(kid)
            .map(Arc::clone)
            .ok_or_else(|| IssuerError::KeyNotFound(kid.clone()))?;
        inner.active_key = key;
        let previous = std::mem::replace(&mut inner.active, kid.clone());
        tracing::info!(previous = %previous, active = %kid, "Rotated active signing key");
        Ok(())
    }

    /// Add a key pair without changing the active key.
    ///
    /// Replaces any existing pair under the same kid, except that the active
    /// kid cannot be replaced. The public half is derived from the private
    /// key when not given.
    ///
    /// # Errors
    ///
    /// Returns `IssuerError::InvalidKey` if `kid` is the active key.
    pub fn insert_key_pair(
        &self,
        kid: KeyId,
        private_key: RsaPrivateKey,
        public_key: Option<RsaPublicKey>,
    ) -> Result<()> {
        let public_key = public_key.unwrap_or_else(|| private_key.to_public_key());
        let mut inner = self.inner.write();
        if inner.active == kid {
            return Err(IssuerError::InvalidKey {
                kid: kid.to_string(),
                reason: "cannot replace the active signing key".to_string(),
            });
        }
        inner.private_keys.insert(kid.clone(), Arc::new(private_key));
        inner.public_keys.insert(kid.clone(), public_key);
        inner.rebuild_jwks();
        tracing::info!(kid = %kid, "Added key pair");
        Ok(())
    }

    /// Rescan the key directory and add kids that are not loaded yet.
    ///
    /// Keys already in the ring are left untouched. Returns the added kids.
    ///
    /// # Errors
    ///
    /// Returns `IssuerError::KeyStoreInit` if the ring was not loaded from a
    /// directory or the directory cannot be read.
    pub fn reload_directory(&self) -> Result<Vec<KeyId>> {
        let dir = self.keys_dir.as_deref().ok_or_else(|| {
            IssuerError::KeyStoreInit("key ring was not loaded from a directory".to_string())
        })?;
        let pairs = scan_directory(dir)?;

        let mut inner = self.inner.write();
        let mut added = Vec::new();
        for (kid, private_key, public_key) in pairs {
            if inner.private_keys.contains_key(&kid) {
                continue;
            }
            inner.private_keys.insert(kid.clone(), Arc::new(private_key));
            inner.public_keys.insert(kid.clone(), public_key);
            added.push(kid);
        }
        if !added.is_empty() {
            inner.rebuild_jwks();
        }

        tracing::info!(added = added.len(), dir = %dir.display(), "Reloaded key directory");
        Ok(added)
    }

    /// Remove a key pair so tokens signed with it no longer verify.
    ///
    /// # Errors
    ///
    /// - `ActiveKeyRetirement` if `kid` is the active key
    /// - `KeyNotFound` if `kid` is not loaded
    pub fn retire_key(&self, kid: &KeyId) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.active == *kid {
            return Err(IssuerError::ActiveKeyRetirement(kid.clone()));
        }

        let had_private = inner.private_keys.remove(kid).is_some();
        let had_public = inner.public_keys.remove(kid).is_some();
        if !had_private && !had_public {
            return Err(IssuerError::KeyNotFound(kid.clone()));
        }
        inner.rebuild_jwks();

        tracing::info!(kid = %kid, "Retired key");
        Ok(())
    }
}

#[async_trait]
impl KeySetSource for KeyRing {
    async fn key_set(&self) -> keyward_auth::Result<Arc<JwkSet>> {
        Ok(self.jwks())
    }
}

/// Generate a new RSA key pair.
///
/// # Errors
///
/// Returns `IssuerError::Signing` if key generation fails.
pub fn generate_key_pair() -> Result<RsaPrivateKey> {
    RsaPrivateKey::new(&mut rand::thread_rng(), GENERATED_KEY_BITS)
        .map_err(|e| IssuerError::Signing(format!("key generation failed: {e}")))
}

/// Write `<kid>_private.pem` (PKCS#1) and `<kid>_public.pem` (SPKI) into `dir`.
///
/// Existing files are never replaced. On Unix the private key is created
/// with mode `0600`. Returns the private key path.
///
/// # Errors
///
/// Returns `IssuerError::InvalidKey` if encoding fails, if either file
/// already exists, or if writing fails.
pub fn write_key_pair(dir: &Path, kid: &KeyId, private_key: &RsaPrivateKey) -> Result<PathBuf> {
    let invalid = |reason: String| IssuerError::InvalidKey {
        kid: kid.to_string(),
        reason,
    };

    let private_pem = private_key
        .to_pkcs1_pem(LineEnding::LF)
        .map_err(|e| invalid(e.to_string()))?;
    let public_pem = private_key
        .to_public_key()
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| invalid(e.to_string()))?;

    let private_path = dir.join(format!("{kid}{PRIVATE_SUFFIX}"));
    let public_path = dir.join(format!("{kid}{PUBLIC_SUFFIX}"));
    let describe = |path: &Path, e: io::Error| {
        if e.kind() == io::ErrorKind::AlreadyExists {
            invalid(format!("{} already exists", path.display()))
        } else {
            invalid(format!("failed to write {}: {e}", path.display()))
        }
    };

    create_new(&private_path, private_pem.as_bytes(), 0o600)
        .map_err(|e| describe(&private_path, e))?;
    if let Err(e) = create_new(&public_path, public_pem.as_bytes(), 0o644) {
        // Leave no private key behind without its public half.
        let _ = fs::remove_file(&private_path);
        return Err(describe(&public_path, e));
    }

    Ok(private_path)
}

/// Create `path` exclusively and write `contents` to it.
fn create_new(path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

/// Parse a PKCS#1 or PKCS#8 private key.
///
/// # Errors
///
/// Returns `IssuerError::InvalidKey` if neither encoding parses.
pub fn parse_private_key(kid: &str, pem: &str) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs1_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
        .map_err(|e| IssuerError::InvalidKey {
            kid: kid.to_string(),
            reason: format!("failed to parse private key: {e}"),
        })
}

/// Parse an SPKI or PKCS#1 public key.
///
/// # Errors
///
/// Returns `IssuerError::InvalidKey` if neither encoding parses.
pub fn parse_public_key(kid: &str, pem: &str) -> Result<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| IssuerError::InvalidKey {
            kid: kid.to_string(),
            reason: format!("failed to parse public key: {e}"),
        })
}

fn load_pair(
    kid: &KeyId,
    private_path: &Path,
    public_path: Option<&Path>,
) -> Result<(RsaPrivateKey, RsaPublicKey)> {
    let pem = fs::read_to_string(private_path).map_err(|e| IssuerError::InvalidKey {
        kid: kid.to_string(),
        reason: format!("failed to read {}: {e}", private_path.display()),
    })?;
    let private_key = parse_private_key(kid.as_str(), &pem)?;
    let derived = private_key.to_public_key();

    let public_key = match public_path.map(|path| load_public(kid, path)) {
        Some(Ok(key)) if key == derived => key,
        Some(Ok(_)) => {
            tracing::warn!(kid = %kid, "Public key does not match private key, deriving it instead");
            derived
        }
        Some(Err(e)) => {
            tracing::warn!(kid = %kid, error = %e, "Skipping public key file, deriving it instead");
            derived
        }
        None => derived,
    };

    Ok((private_key, public_key))
}

fn load_public(kid: &KeyId, path: &Path) -> Result<RsaPublicKey> {
    let pem = fs::read_to_string(path).map_err(|e| IssuerError::InvalidKey {
        kid: kid.to_string(),
        reason: format!("failed to read {}: {e}", path.display()),
    })?;
    parse_public_key(kid.as_str(), &pem)
}

fn scan_directory(dir: &Path) -> Result<Vec<(KeyId, RsaPrivateKey, RsaPublicKey)>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        IssuerError::KeyStoreInit(format!(
            "failed to read keys directory {}: {e}",
            dir.display()
        ))
    })?;

    let mut pairs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(kid) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_suffix(PRIVATE_SUFFIX))
        else {
            continue;
        };

        let kid = match KeyId::new(kid) {
            Ok(kid) => kid,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Skipping key with invalid id");
                continue;
            }
        };

        let public_path = dir.join(format!("{kid}{PUBLIC_SUFFIX}"));
        let public_path = public_path.is_file().then_some(public_path);
        match load_pair(&kid, &path, public_path.as_deref()) {
            Ok((private_key, public_key)) => {
                tracing::info!(kid = %kid, "Loaded key pair");
                pairs.push((kid, private_key, public_key));
            }
            Err(e) => tracing::warn!(kid = %kid, error = %e, "Failed to load key pair"),
        }
    }

    Ok(pairs)
}
