use serde::{Deserialize, Serialize};

pub mod product;

// Re-exports for convenience
pub use product::*;

/// How a selector string should be interpreted by the browser session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SelectorStrategy {
    Css,
    XPath,
}
