//! In-memory storage implementation.

use std::collections::BTreeMap;

use keyward_core::ClientId;
use parking_lot::RwLock;

use crate::error::{Result, StoreError};
use crate::{ClientStore, OAuthClient};

/// Volatile client store; contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    clients: RwLock<BTreeMap<ClientId, OAuthClient>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStore for MemoryStore {
    fn put_client(&self, client: &OAuthClient) -> Result<()> {
        self.clients
            .write()
            .insert(client.client_id.clone(), client.clone());
        Ok(())
    }

    fn get_client(&self, client_id: &ClientId) -> Result<Option<OAuthClient>> {
        Ok(self.clients.read().get(client_id).cloned())
    }

    fn delete_client(&self, client_id: &ClientId) -> Result<()> {
        self.clients
            .write()
            .remove(client_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    fn list_clients(&self) -> Result<Vec<OAuthClient>> {
        Ok(self.clients.read().values().cloned().collect())
    }
}
