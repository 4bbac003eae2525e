//! Conversion requests read from disk and checked against a JSON schema
//!
//! The job client never validates; these checks run in the CLI before a request is submitted.

/// Read and validate request files
pub mod message;
/// Find request files in a directory
pub mod read;
/// Load and compile the parameter schema
pub mod schema;
