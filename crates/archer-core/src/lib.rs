//! Core infrastructure for archer.
//!
//! This crate provides:
//! - The project metadata model (projects, dependencies, files, repositories,
//!   commits, people) and its JSON dataset loader
//! - The filter rule engine: parsing, three-valued classification, edge rules
//! - Query mapping for the listing commands
//! - Layered configuration
//! - Error types, error codes and JSON output types for CLI responses

pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod output;
pub mod query;
