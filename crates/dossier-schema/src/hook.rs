//! Named hooks resolved by the rendering layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The name of an external function: an aggregation function, a card's show
/// condition, or a page's placeholder function.
///
/// The core never invokes hooks. It only carries their names through to the
/// rendering layer, which looks them up and runs them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HookName(pub String);

impl HookName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
