//! Data models: claim documents, outcomes, field contract and configuration.

pub mod claim;
pub mod config;
pub mod fields;
