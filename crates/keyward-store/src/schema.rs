//! Database schema definitions and column families.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// OAuth2 client records, keyed by `client_id`.
    pub const CLIENTS: &str = "clients";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::CLIENTS]
}
