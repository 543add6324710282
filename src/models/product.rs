use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Product — One catalog item, kept exactly as the API returned it
// ---------------------------------------------------------------------------

/// A catalog product.
///
/// The object is passed through untouched (field order included) so the
/// local mirror holds what the API served. Only [`slug`](Product::slug) is
/// ever read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Product(Map<String, Value>);

impl Product {
    /// The URL slug, if present and a string.
    pub fn slug(&self) -> Option<&str> {
        self.0.get("slug").and_then(Value::as_str)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}
