//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `ClientStore` trait.

use std::path::Path;
use std::sync::Arc;

use keyward_core::ClientId;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{ClientStore, OAuthClient};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &'static str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or(StoreError::MissingColumnFamily(name))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

impl ClientStore for RocksStore {
    fn put_client(&self, client: &OAuthClient) -> Result<()> {
        let cf = self.cf(cf::CLIENTS)?;
        let value = Self::serialize(client)?;

        self.db
            .put_cf(&cf, keys::client_key(&client.client_id), value)?;

        tracing::debug!(client_id = %client.client_id, active = client.is_active, "Stored client");
        Ok(())
    }

    fn get_client(&self, client_id: &ClientId) -> Result<Option<OAuthClient>> {
        let cf = self.cf(cf::CLIENTS)?;

        self.db
            .get_cf(&cf, keys::client_key(client_id))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn delete_client(&self, client_id: &ClientId) -> Result<()> {
        let cf = self.cf(cf::CLIENTS)?;
        let key = keys::client_key(client_id);

        if self.db.get_cf(&cf, &key)?.is_none() {
            return Err(StoreError::NotFound);
        }

        self.db.delete_cf(&cf, &key)?;
        tracing::debug!(client_id = %client_id, "Deleted client");
        Ok(())
    }

    fn list_clients(&self) -> Result<Vec<OAuthClient>> {
        let cf = self.cf(cf::CLIENTS)?;

        let mut clients = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item?;
            clients.push(Self::deserialize(&value)?);
        }

        Ok(clients)
    }
}
