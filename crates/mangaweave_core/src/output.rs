//! Output types from generation responses.

use serde::{Deserialize, Serialize};

/// Supported outputs from a driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Output {
    /// Plain text output.
    Text(String),
}
