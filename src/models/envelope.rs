use serde_json::Value;

use super::product::Product;
use crate::error::{MirrorError, Result};

// ---------------------------------------------------------------------------
// Envelope — One page of the catalog API
// ---------------------------------------------------------------------------

/// A parsed catalog page: `{ products: [...], pagination: { next_page_url } }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub products: Vec<Product>,
    /// Link to the following page. `None` on the last page.
    pub next_page_url: Option<String>,
}

impl Envelope {
    /// Validate a decoded response body.
    ///
    /// A body without a `products` array of objects is malformed. A missing
    /// `pagination` object, a null `next_page_url`, or an empty string all
    /// mean there is no next page.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut body = match value {
            Value::Object(map) => map,
            other => {
                return Err(MirrorError::MalformedResponse(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let products = body
            .remove("products")
            .ok_or_else(|| MirrorError::MalformedResponse("missing `products` key".into()))?;
        let products: Vec<Product> = serde_json::from_value(products).map_err(|e| {
            MirrorError::MalformedResponse(format!("`products` is not an array of objects: {e}"))
        })?;

        let next_page_url = body
            .get("pagination")
            .and_then(|p| p.get("next_page_url"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self {
            products,
            next_page_url,
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
