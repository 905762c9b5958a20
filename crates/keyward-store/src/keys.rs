//! Key encoding utilities for `RocksDB`.

use keyward_core::ClientId;

/// Encode a client key (the UTF-8 bytes of the client ID).
#[must_use]
pub fn client_key(client_id: &ClientId) -> Vec<u8> {
    client_id.as_bytes().to_vec()
}
