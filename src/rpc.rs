//! JSON-RPC plumbing underneath the job client

/// Request and response envelopes
pub mod envelope;
/// The transport seam and its HTTP implementation
pub mod transport;
