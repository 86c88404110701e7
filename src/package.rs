//! # Package Labels
//!
//! Builds a [`LabelRequest`] from a package description, the shape produced
//! by intake forms and inventory tools:
//!
//! ```json
//! {"name": "Saline 0.9%", "productCode": "7612345000011",
//!  "lot": "L5 2024", "expiry": "2025-03-01", "note": "Ward 4", "qty": 2}
//! ```
//!
//! becomes
//!
//! | labelType | labelKey | labelValue |
//! |-----------|----------|------------|
//! | text | | Saline 0.9% |
//! | text | Code | 7612345000011 |
//! | text | | Ward 4 |
//! | text | | 2025-01-10T09:30:00Z (timestamp, default now) |
//! | QR | | `01076123450000111725030110L52024` |
//!
//! Documents that already carry `labelItems` pass through unchanged.
//!
//! ## Field Names
//!
//! Each field is read from the first key in its list holding a non-blank
//! string or a number. Keys with other values are ignored.
//!
//! | Field | Keys, in order |
//! |-------|----------------|
//! | name | `product_name` `productName` `product` `name` `title` `label` `message` `text` |
//! | code | `product_code` `productCode` `barcode` `barcode_value` `barcodeValue` `code` |
//! | QR override | `qrcode_value` `qrCodeValue` `qrcodeValue` `qrValue` |
//! | lot | `lot_number` `lotNumber` `lot` `lotNo` `batch` `batchNumber` `batch_number` |
//! | expiry | `expiry` `expiration` `expiryDate` `expirationDate` `expireDate` `expDate` |
//! | timestamp | `timestamp` `time` `datetime` `date` `createdAt` `created_at` |
//! | note | `note` `notes` `description` `details` `comment` |
//!
//! A nested `product` object fills in name (`name` `product_name`
//! `productName` `title`), code, QR override, lot and expiry when the top
//! level has none. `combinedText` replaces the name, else a `texts` array
//! is joined with newlines.
//!
//! ## Expiry Formats
//!
//! RFC 3339, `YYYY-MM-DDTHH:MM:SS`, `%Y-%m-%d`, `%Y/%m/%d`, `%d-%m-%Y`,
//! `%m/%d/%Y`, `%Y%m%d`, `%y%m%d`, or unix seconds. Missing or unparseable
//! expiry defaults to three years (3 × 365 days) from now.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::encode::Gs1CodeBuilder;
use crate::encode::gs1::DEFAULT_LOT;
use crate::error::LabelError;
use crate::request::{LabelItem, LabelKind, LabelRequest, Quantity};

/// Name used when a package has no name or text lines.
pub const DEFAULT_NAME: &str = "Package";

const NAME_KEYS: &[&str] = &[
    "product_name",
    "productName",
    "product",
    "name",
    "title",
    "label",
    "message",
    "text",
];
const PRODUCT_NAME_KEYS: &[&str] = &["name", "product_name", "productName", "title"];
const CODE_KEYS: &[&str] = &[
    "product_code",
    "productCode",
    "barcode",
    "barcode_value",
    "barcodeValue",
    "code",
];
const QR_KEYS: &[&str] = &["qrcode_value", "qrCodeValue", "qrcodeValue", "qrValue"];
const LOT_KEYS: &[&str] = &[
    "lot_number",
    "lotNumber",
    "lot",
    "lotNo",
    "batch",
    "batchNumber",
    "batch_number",
];
const EXPIRY_KEYS: &[&str] = &[
    "expiry",
    "expiration",
    "expiryDate",
    "expirationDate",
    "expireDate",
    "expDate",
];
const TIMESTAMP_KEYS: &[&str] = &["timestamp", "time", "datetime", "date", "createdAt", "created_at"];
const NOTE_KEYS: &[&str] = &["note", "notes", "description", "details", "comment"];

const EXPIRY_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%m/%d/%Y", "%Y%m%d", "%y%m%d"];

/// A package to label, with every field already resolved from its keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageLabel {
    pub name: Option<String>,
    pub product_code: Option<String>,
    /// Overrides the product code as the printed code and GS1 source
    pub qr_value: Option<String>,
    pub lot: Option<String>,
    pub expiry: Option<NaiveDate>,
    pub note: Option<String>,
    pub timestamp: Option<String>,
    /// Replaces the name and text lines
    pub combined_text: Option<String>,
    /// Non-blank text lines, joined with newlines in place of `name`
    pub texts: Vec<String>,
    pub quantity: Quantity,
}

/// Non-blank string or number as trimmed text.
fn value_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Text of the first key in `keys` holding a usable value.
fn first_non_empty(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| value_text(map.get(*key)))
}

/// Like [`first_non_empty`], keeping the value for [`parse_expiry`].
fn first_expiry(map: &Map<String, Value>) -> Option<NaiveDate> {
    let value = EXPIRY_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|v| value_text(Some(v)).is_some())?;
    parse_expiry(value)
}

impl PackageLabel {
    pub fn from_json(raw: &str) -> Result<Self, LabelError> {
        match serde_json::from_str(raw) {
            Ok(Value::Object(map)) => Ok(Self::from_map(&map)),
            Ok(_) => Err(LabelError::InvalidPayload(
                "package must be a JSON object".to_string(),
            )),
            Err(e) => Err(LabelError::InvalidPayload(format!("package: {}", e))),
        }
    }

    /// Resolve every field from a package document.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let empty = Map::new();
        let product = match map.get("product") {
            Some(Value::Object(obj)) => obj,
            _ => &empty,
        };

        let texts = match map.get("texts") {
            Some(Value::Array(items)) => items.iter().filter_map(|v| value_text(Some(v))).collect(),
            _ => Vec::new(),
        };

        Self {
            name: first_non_empty(map, NAME_KEYS).or_else(|| first_non_empty(product, PRODUCT_NAME_KEYS)),
            product_code: first_non_empty(map, CODE_KEYS).or_else(|| first_non_empty(product, CODE_KEYS)),
            qr_value: first_non_empty(map, QR_KEYS).or_else(|| first_non_empty(product, QR_KEYS)),
            lot: first_non_empty(map, LOT_KEYS).or_else(|| first_non_empty(product, LOT_KEYS)),
            expiry: first_expiry(map).or_else(|| first_expiry(product)),
            note: first_non_empty(map, NOTE_KEYS),
            timestamp: first_non_empty(map, TIMESTAMP_KEYS),
            combined_text: value_text(map.get("combinedText")),
            texts,
            quantity: Quantity::from_json(map.get("qty")),
        }
    }

    /// The display name: `combinedText`, joined text lines, `name`, then "Package".
    pub fn display_name(&self) -> String {
        if let Some(combined) = &self.combined_text {
            return combined.clone();
        }
        if !self.texts.is_empty() {
            return self.texts.join("\n");
        }
        self.name.clone().unwrap_or_else(|| DEFAULT_NAME.to_string())
    }

    /// Code printed on the label and fed to the GS1 builder.
    pub fn code(&self) -> Option<&str> {
        self.qr_value.as_deref().or(self.product_code.as_deref())
    }

    pub fn expiry_date(&self, now: DateTime<Utc>) -> NaiveDate {
        self.expiry
            .unwrap_or_else(|| (now + Duration::days(3 * 365)).date_naive())
    }

    /// Build the label request as of `now`.
    pub fn to_request(&self, now: DateTime<Utc>) -> LabelRequest {
        let code = self.code().unwrap_or_default();
        let lot = self.lot.as_deref().unwrap_or(DEFAULT_LOT);
        let gs1 = Gs1CodeBuilder::new().build(code, lot, self.expiry_date(now));

        let mut items = vec![LabelItem::text("", self.display_name())];
        if !code.is_empty() {
            items.push(LabelItem::text("Code", code));
        }
        if let Some(note) = &self.note {
            items.push(LabelItem::text("", note.as_str()));
        }
        let timestamp = self
            .timestamp
            .clone()
            .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Secs, true));
        items.push(LabelItem::text("", timestamp));
        items.push(LabelItem::new(LabelKind::Qr, "", gs1));

        LabelRequest::new(self.quantity, items)
    }
}

/// Parse an expiry value into a calendar date.
pub fn parse_expiry(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Number(n) => {
            let secs = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            if secs <= 0 {
                return None;
            }
            DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
        }
        Value::String(s) => parse_expiry_str(s),
        _ => None,
    }
}

fn parse_expiry_str(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    EXPIRY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Parse either a label request (has `labelItems`) or a package document.
pub fn request_from_json(raw: &str, now: DateTime<Utc>) -> Result<LabelRequest, LabelError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| LabelError::InvalidPayload(format!("not valid JSON: {}", e)))?;
    let Value::Object(map) = value else {
        return Err(LabelError::InvalidPayload(
            "payload must be a JSON object".to_string(),
        ));
    };
    if map.contains_key("labelItems") {
        return LabelRequest::from_value(Value::Object(map));
    }
    Ok(PackageLabel::from_map(&map).to_request(now))
}
