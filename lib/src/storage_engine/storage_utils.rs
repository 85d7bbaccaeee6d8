// lib/src/storage_engine/storage_utils.rs

use serde::de::DeserializeOwned;
use serde::Serialize;

use models::RecordId;

use crate::errors::Result;

/// Big-endian so sled's byte order matches id order.
pub fn id_key(id: RecordId) -> [u8; 8] {
    id.to_be_bytes()
}

pub fn key_id(key: &[u8]) -> Option<RecordId> {
    <[u8; 8]>::try_from(key).ok().map(RecordId::from_be_bytes)
}

/// Encodes a record as named MessagePack, so added fields stay readable.
pub fn serialize_record<R: Serialize>(record: &R) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(record)?)
}

pub fn deserialize_record<R: DeserializeOwned>(bytes: &[u8]) -> Result<R> {
    Ok(rmp_serde::from_slice(bytes)?)
}
