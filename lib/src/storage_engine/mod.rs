// lib/src/storage_engine/mod.rs

pub mod records;
pub mod sled_storage;
pub mod storage_utils;

pub use records::Record;
pub use sled_storage::TriageStore;
pub use storage_utils::{deserialize_record, id_key, key_id, serialize_record};
