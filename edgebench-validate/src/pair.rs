//! Validation Pairs
//!
//! One `ValidationPair` names a (query group, engine) combination whose
//! output is fetched once and compared against every other pair in the same
//! validation run.

use edgebench_core::EngineKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One (query group, engine) combination under validation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationPair {
    /// Query group whose output is fetched
    pub query_group: String,
    /// Engine executing it
    pub engine: EngineKind,
}

impl fmt::Display for ValidationPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.query_group, self.engine)
    }
}
