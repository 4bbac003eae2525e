//! Typed surface of the `kb_read_library_to_file` service
//!
//! Takes KBaseFile/KBaseAssembly PairedEndLibrary and SingleEndLibrary workspace objects and
//! produces FASTQ files plus metadata. The conversion itself (file type detection, gzip handling,
//! interleaving) runs server-side; this module only shapes requests and results. Every struct
//! keeps unknown properties, so a newer server schema passes through untouched.

/// Conversion request parameters
pub mod params;
/// Conversion results
pub mod output;
/// Client bound to the service's module and method names
pub mod client;
/// Plain-text summary of a conversion
pub mod report;

/// Serde adapter for optional booleans that the service encodes as the strings "true"/"false"
pub(crate) mod tern {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(true) => serializer.serialize_str("true"),
            Some(false) => serializer.serialize_str("false"),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(flag)) => Ok(Some(flag)),
            Some(Value::String(s)) if s == "true" => Ok(Some(true)),
            Some(Value::String(s)) if s == "false" => Ok(Some(false)),
            Some(Value::Number(n)) if n.as_i64().is_some() => Ok(Some(n.as_i64() != Some(0))),
            Some(other) => Err(serde::de::Error::custom(format!("invalid tern value {other}"))),
        }
    }
}
