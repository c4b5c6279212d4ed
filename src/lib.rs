//! Hybridrank - Hybrid document retrieval
//!
//! Ranks a document corpus for one query by a lexical (full-text) signal and a
//! semantic (embedding) signal, restricted by a metadata filter, and fuses the
//! two rankings with weighted Reciprocal Rank Fusion.

pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod retrieval;

pub use error::{HybridError, Result};
