//! # Label Request Documents
//!
//! The canonical request consumed by the pipeline:
//!
//! ```text
//! {
//!   "qty": 2,
//!   "labelItems": [
//!     {"labelType": "text", "labelKey": "", "labelValue": "Widget"},
//!     {"labelType": "QR", "labelKey": "", "labelValue": "ABC123"}
//!   ]
//! }
//! ```
//!
//! Item order is the stacking order on the label and is preserved.
//!
//! ## Example
//!
//! ```
//! use labelprint::request::{LabelKind, LabelRequest};
//!
//! let request = LabelRequest::from_json(
//!     r#"{"qty": "3", "labelItems": [{"labelType": "barcode", "labelValue": 42}]}"#,
//! ).unwrap();
//!
//! assert_eq!(request.quantity.get(), 3);
//! assert_eq!(request.items[0].kind, LabelKind::Barcode);
//! assert_eq!(request.items[0].value, "42");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LabelError;

/// Which encoder renders an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelKind {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "barcode")]
    Barcode,
    #[serde(rename = "QR")]
    Qr,
    #[serde(rename = "QRAAS")]
    QrChunked,
}

impl LabelKind {
    /// Parse the wire name used in `labelType`.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "barcode" => Some(Self::Barcode),
            "QR" => Some(Self::Qr),
            "QRAAS" => Some(Self::QrChunked),
            _ => None,
        }
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Barcode => "barcode",
            Self::Qr => "QR",
            Self::QrChunked => "QRAAS",
        }
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// One entry of `labelItems`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelItem {
    #[serde(rename = "labelType")]
    pub kind: LabelKind,
    #[serde(rename = "labelKey")]
    pub key: String,
    #[serde(rename = "labelValue")]
    pub value: String,
}

impl LabelItem {
    pub fn new(kind: LabelKind, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn text(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(LabelKind::Text, key, value)
    }
}

/// Number of copies to print. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Self = Self(1);

    /// Clamp any integer into a valid quantity.
    pub fn clamped(n: i64) -> Self {
        Self(n.clamp(1, u32::MAX as i64) as u32)
    }

    /// Lenient conversion from a JSON value; anything unusable becomes 1.
    pub fn from_json(value: Option<&Value>) -> Self {
        let n = match value {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        n.map(Self::clamped).unwrap_or(Self::ONE)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

/// A parsed label request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelRequest {
    #[serde(rename = "qty")]
    pub quantity: Quantity,
    #[serde(rename = "labelItems")]
    pub items: Vec<LabelItem>,
}

/// Raw item shape before validation.
#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(rename = "labelType", default)]
    label_type: Option<Value>,
    #[serde(rename = "labelKey", default)]
    label_key: Option<Value>,
    #[serde(rename = "labelValue", default)]
    label_value: Option<Value>,
}

fn scalar_to_string(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

impl LabelRequest {
    pub fn new(quantity: Quantity, items: Vec<LabelItem>) -> Self {
        Self { quantity, items }
    }

    /// Parse a request document.
    ///
    /// Fails with [`LabelError::InvalidPayload`] when the text is not JSON,
    /// is not an object, has no `labelItems` array, or an item is not an
    /// object. Items with an unknown `labelType` are dropped with a warning.
    pub fn from_json(raw: &str) -> Result<Self, LabelError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| LabelError::InvalidPayload(format!("not valid JSON: {}", e)))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, LabelError> {
        let Value::Object(mut map) = value else {
            return Err(LabelError::InvalidPayload(
                "request must be a JSON object".to_string(),
            ));
        };

        let quantity = Quantity::from_json(map.get("qty"));

        let raw_items = match map.remove("labelItems") {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(LabelError::InvalidPayload(
                    "'labelItems' must be an array".to_string(),
                ));
            }
            None => {
                return Err(LabelError::InvalidPayload(
                    "missing 'labelItems'".to_string(),
                ));
            }
        };

        let mut items = Vec::with_capacity(raw_items.len());
        for (index, raw) in raw_items.into_iter().enumerate() {
            if !raw.is_object() {
                return Err(LabelError::InvalidPayload(format!(
                    "labelItems[{}] must be an object",
                    index
                )));
            }
            let raw: RawItem = serde_json::from_value(raw).map_err(|e| {
                LabelError::InvalidPayload(format!("labelItems[{}]: {}", index, e))
            })?;

            let type_name = scalar_to_string(raw.label_type);
            let Some(kind) = LabelKind::from_wire(&type_name) else {
                tracing::warn!(index, label_type = %type_name, "skipping item with unknown labelType");
                continue;
            };

            items.push(LabelItem {
                kind,
                key: scalar_to_string(raw.label_key),
                value: scalar_to_string(raw.label_value),
            });
        }

        Ok(Self { quantity, items })
    }

    pub fn to_json(&self) -> Result<String, LabelError> {
        serde_json::to_string(self).map_err(|e| LabelError::InvalidPayload(e.to_string()))
    }
}
