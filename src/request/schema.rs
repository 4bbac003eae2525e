use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use jsonschema::{Draft, JSONSchema};
use log::info;
use serde_json::Value;

/// included JSON schema of the conversion parameters
static PARAMS_SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/schema/convert_read_library_params.json"));

/// Compile the bundled parameter schema
pub fn load_schema() -> Result<JSONSchema> {
    let schema_json: Value = serde_json::from_str(PARAMS_SCHEMA).context("Bundled schema is valid JSON")?;
    compile_schema(&schema_json)
}

/// Compile a schema from disk, for servers whose parameters moved ahead of the bundled schema
pub fn load_schema_from(path: &Path) -> Result<JSONSchema> {
    info!("Loading parameter schema from {}", path.display());
    let schema_json = read_json_from_path(path)?;
    compile_schema(&schema_json)
}

fn read_json_from_path(path: &Path) -> Result<Value> {
    let json_string = fs::read_to_string(path)
        .with_context(|| format!("Can't read schema at {}", path.display()))?;
    serde_json::from_str(&json_string)
        .with_context(|| format!("Schema at {} is not valid JSON", path.display()))
}

fn compile_schema(schema: &Value) -> Result<JSONSchema> {
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|err| anyhow!("Invalid schema: {err}"))
}
