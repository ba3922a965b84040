//! Packsmith - Gallery pack preprocessing tool
//!
//! This library crate exposes the core functionality for integration testing.

pub mod assembler;
pub mod config;
pub mod manifest;
pub mod pipeline;
pub mod reprocess;
pub mod rules;
pub mod scanner;
