//! Structured record codec
//!
//! A store holds exactly one record. Loading merges the bytes on disk into a
//! copy of the value already in memory instead of replacing it, so fields
//! written by an older build keep the values a newer build seeded them with.

use crate::errors::RecordError;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A value type a `PersistentStore` can keep in memory and on disk
pub trait CacheRecord: Clone + PartialEq + Send + Sync + 'static {
    /// Decode `bytes` into a copy of `seed`, keeping seed values for any
    /// field the bytes do not carry
    fn merge_from(bytes: &[u8], seed: &Self) -> Result<Self, RecordError>;

    /// Encode the full record
    fn to_bytes(&self) -> Result<Vec<u8>, RecordError>;
}

/// Merge JSON `bytes` into `seed` field by field
///
/// Objects merge recursively. Scalars and arrays present in `bytes` replace
/// the seed's value outright.
pub fn merge_json<T>(bytes: &[u8], seed: &T) -> Result<T, RecordError>
where
    T: Serialize + DeserializeOwned,
{
    let incoming: Value = serde_json::from_slice(bytes)?;
    let mut merged = serde_json::to_value(seed)?;
    merge_value(&mut merged, incoming);
    Ok(serde_json::from_value(merged)?)
}

/// Encode a record as JSON
pub fn encode_json<T: Serialize>(value: &T) -> Result<Vec<u8>, RecordError> {
    Ok(serde_json::to_vec(value)?)
}

fn merge_value(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(target), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match target.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, incoming) => *target = incoming,
    }
}

/// Implement [`CacheRecord`] for serde types using the JSON codec
///
/// ```ignore
/// #[derive(Clone, PartialEq, Serialize, Deserialize)]
/// struct Settings { volume: u32 }
///
/// stashbox_cache::json_record!(Settings);
/// ```
#[macro_export]
macro_rules! json_record {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::record::CacheRecord for $ty {
                fn merge_from(
                    bytes: &[u8],
                    seed: &Self,
                ) -> ::std::result::Result<Self, $crate::errors::RecordError> {
                    $crate::record::merge_json(bytes, seed)
                }

                fn to_bytes(&self) -> ::std::result::Result<Vec<u8>, $crate::errors::RecordError> {
                    $crate::record::encode_json(self)
                }
            }
        )+
    };
}

json_record!(bool, i32, i64, u32, u64, String);

impl<T> CacheRecord for Vec<T>
where
    T: Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync + 'static,
{
    fn merge_from(bytes: &[u8], seed: &Self) -> Result<Self, RecordError> {
        merge_json(bytes, seed)
    }

    fn to_bytes(&self) -> Result<Vec<u8>, RecordError> {
        encode_json(self)
    }
}

impl<T> CacheRecord for BTreeMap<String, T>
where
    T: Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync + 'static,
{
    fn merge_from(bytes: &[u8], seed: &Self) -> Result<Self, RecordError> {
        merge_json(bytes, seed)
    }

    fn to_bytes(&self) -> Result<Vec<u8>, RecordError> {
        encode_json(self)
    }
}
