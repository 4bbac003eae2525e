use std::fs;
use std::path::{Path, PathBuf};

use jsonschema::JSONSchema;
use log::{info, warn};
use serde_json::Value;

use crate::convert::params::ConvertReadLibraryParams;

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("parameters fail validation: {}", .0.join("; "))]
    JSONValidationError(Vec<String>),
    #[error("parameters are not valid JSON: {0}")]
    JSONDecodeError(String),
    #[error("parameters don't match the request type: {0}")]
    DeserialisationError(String),
    #[error("can't read parameters: {0}")]
    MessageReadError(String),
}

/// A conversion request stored as a JSON file
pub struct Message<'a> {
    pub path: PathBuf,
    /// `None` skips validation
    pub compiled_schema: Option<&'a JSONSchema>,
}

impl<'a> Message<'a> {
    pub fn read(&self) -> Result<ConvertReadLibraryParams, MessageError> {
        let json: Value = self.parse_untyped_json()?;

        match self.validate(&json) {
            Ok(_) => {
                info!("Message is valid");
                let params = self.parse_json(json)?;
                self.check_prefixes(&params)?;
                Ok(params)
            }
            Err(err) => {
                warn!("Message fails validation");
                Err(err)
            }
        }
    }

    pub fn validate(&self, json: &Value) -> Result<(), MessageError> {
        let Some(schema) = self.compiled_schema else {
            info!("Skipping JSON schema validation");
            return Ok(());
        };
        info!("Validating raw message against JSON schema");
        validate_value(schema, json)
    }

    /// Output prefixes must be unique; a schema can't express that for map values
    fn check_prefixes(&self, params: &ConvertReadLibraryParams) -> Result<(), MessageError> {
        if self.compiled_schema.is_none() {
            return Ok(());
        }
        let duplicates = params.read_libraries.duplicate_prefixes();
        if duplicates.is_empty() {
            return Ok(());
        }
        warn!("Message reuses output file prefixes");
        Err(MessageError::JSONValidationError(
            duplicates.into_iter().map(|prefix| format!("output prefix '{prefix}' is given to more than one library")).collect(),
        ))
    }

    fn read_file(&self) -> Result<String, MessageError> {
        let path: &Path = self.path.as_path();
        info!("Reading message at {}", path.display());
        fs::read_to_string(path).map_err(|err| {
            warn!("Can't read conversion request at path {}: {}", path.display(), err);
            MessageError::MessageReadError(format!("{}: {}", path.display(), err))
        })
    }

    fn parse_json(&self, value: Value) -> Result<ConvertReadLibraryParams, MessageError> {
        info!("Deserialising valid JSON into typed Rust object");
        serde_json::from_value::<ConvertReadLibraryParams>(value)
            .map_err(|err| MessageError::DeserialisationError(err.to_string()))
    }

    fn parse_untyped_json(&self) -> Result<Value, MessageError> {
        info!("Parsing JSON into untyped structure");
        let json_string = self.read_file()?;
        serde_json::from_str::<Value>(&json_string)
            .map_err(|err| MessageError::JSONDecodeError(err.to_string()))
    }
}

/// Check a value against a compiled schema, collecting every violation
pub fn validate_value(schema: &JSONSchema, json: &Value) -> Result<(), MessageError> {
    schema.validate(json).map_err(|errors| {
        let messages: Vec<String> = errors
            .map(|err| format!("{} at '{}'", err, err.instance_path))
            .collect();
        MessageError::JSONValidationError(messages)
    })
}
