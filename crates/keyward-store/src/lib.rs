//! OAuth2 client registry storage for keyward.
//!
//! This crate persists registered clients using `RocksDB`, with an in-memory
//! implementation for tests and ephemeral deployments.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `clients`: Client records, keyed by `client_id`
//!
//! # Example
//!
//! ```no_run
//! use keyward_core::ClientId;
//! use keyward_store::{ClientStore, RocksStore};
//!
//! let store = RocksStore::open("/tmp/keyward-db").unwrap();
//!
//! let client_id = ClientId::new("payslip-viewer").unwrap();
//! let client = store.find_active_client(&client_id).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod error;
pub mod keys;
pub mod memory;
pub mod rocks;
pub mod schema;

pub use client::OAuthClient;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use rocks::RocksStore;

use keyward_core::ClientId;

/// The storage trait for OAuth2 client records.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB`, in-memory for testing).
pub trait ClientStore: Send + Sync {
    /// Insert or replace a client record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_client(&self, client: &OAuthClient) -> Result<()>;

    /// Get a client by ID, regardless of its active flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_client(&self, client_id: &ClientId) -> Result<Option<OAuthClient>>;

    /// Get a client by ID only if it is active.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_active_client(&self, client_id: &ClientId) -> Result<Option<OAuthClient>> {
        Ok(self.get_client(client_id)?.filter(|c| c.is_active))
    }

    /// Set a client's active flag.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the client doesn't exist.
    fn set_client_active(&self, client_id: &ClientId, active: bool) -> Result<()> {
        let mut client = self.get_client(client_id)?.ok_or(StoreError::NotFound)?;
        client.is_active = active;
        self.put_client(&client)
    }

    /// Delete a client by ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the client doesn't exist.
    fn delete_client(&self, client_id: &ClientId) -> Result<()>;

    /// List all clients, ordered by client ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_clients(&self) -> Result<Vec<OAuthClient>>;
}

impl<T: ClientStore + ?Sized> ClientStore for std::sync::Arc<T> {
    fn put_client(&self, client: &OAuthClient) -> Result<()> {
        (**self).put_client(client)
    }

    fn get_client(&self, client_id: &ClientId) -> Result<Option<OAuthClient>> {
        (**self).get_client(client_id)
    }

    fn find_active_client(&self, client_id: &ClientId) -> Result<Option<OAuthClient>> {
        (**self).find_active_client(client_id)
    }

    fn set_client_active(&self, client_id: &ClientId, active: bool) -> Result<()> {
        (**self).set_client_active(client_id, active)
    }

    fn delete_client(&self, client_id: &ClientId) -> Result<()> {
        (**self).delete_client(client_id)
    }

    fn list_clients(&self) -> Result<Vec<OAuthClient>> {
        (**self).list_clients()
    }
}
