//! Translation of the API's flat field map into product attribute values.
//!
//! # Design
//! The mapper is total: it never fails, malformed values degrade to safe
//! defaults. It runs two passes with different policies:
//!
//! - text and date fields are written only when their code is present, and
//!   a falsy value writes an empty string or clears the date;
//! - numeric and boolean fields always resolve to a value when their code is
//!   present, falling back to `0.0` / `false`. A JSON boolean in a numeric
//!   field counts as `1.0` / `0.0`.
//!
//! Derived product fields and the success stamp are added afterwards so the
//! whole result can be persisted in a single write.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::types::{AttributeValues, CategoryId, FlatFieldMap, SyncStamp};

pub const ITEM_NO: &str = "F_1";
pub const DESCRIPTION: &str = "F_3";
pub const CAD_ISO: &str = "F_50001";
pub const DEALER_PRICE: &str = "F_80004";
pub const DATE_NEW_PRICE: &str = "F_80006";
pub const PREVIOUS_DEALER_PRICE: &str = "F_80008";
pub const PREVIOUS_DATE_NEW_PRICE: &str = "F_80010";
pub const RECUPEL: &str = "C_50000";
pub const NET_WEIGHT: &str = "F_42";
pub const GROSS_WEIGHT: &str = "F_41";
pub const ENERGY_CLASS: &str = "C_50010";
pub const TARIFF_NO: &str = "F_47";
pub const BLOCKED: &str = "F_54";

/// Name of the category assigned to every synchronized product.
pub const SYNC_CATEGORY_NAME: &str = "100 % Light";

const FALSE_TOKENS: &[&str] = &["no", "n", "false", "off", "0"];

/// Maps flat field maps onto `AttributeValues`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMapper {
    sync_category: Option<CategoryId>,
}

impl FieldMapper {
    /// `sync_category` is assigned to every mapped product when present.
    pub fn new(sync_category: Option<CategoryId>) -> Self {
        Self { sync_category }
    }

    pub fn map(&self, flat: &FlatFieldMap) -> AttributeValues {
        self.map_at(flat, Utc::now())
    }

    /// Like `map`, stamping the result with `now`.
    pub fn map_at(&self, flat: &FlatFieldMap, now: DateTime<Utc>) -> AttributeValues {
        let mut values = AttributeValues::stamp_only(SyncStamp::success(now));
        map_present_fields(flat, &mut values);
        map_resolved_fields(flat, &mut values);
        self.apply_derived(&mut values);
        values
    }

    fn apply_derived(&self, values: &mut AttributeValues) {
        if let Some(description) = values.description.as_ref().filter(|d| !d.is_empty()) {
            values.name = Some(description.clone());
        }
        if let Some(price) = values.dealer_price.filter(|p| *p != 0.0) {
            values.list_price = Some(price);
        }
        if let Some(weight) = values.net_weight.filter(|w| *w != 0.0) {
            values.weight = Some(weight);
        }
        values.category = self.sync_category;
    }
}

/// Text and date fields: written only when the code is present.
fn map_present_fields(flat: &FlatFieldMap, values: &mut AttributeValues) {
    let text = |code: &str| flat.get(code).map(coerce_text);
    let date = |code: &str| flat.get(code).map(|v| coerce_date(code, v));

    values.item_no = text(ITEM_NO);
    values.description = text(DESCRIPTION);
    values.cad_iso = text(CAD_ISO);
    values.recupel = text(RECUPEL);
    values.energy_class = text(ENERGY_CLASS);
    values.tariff_no = text(TARIFF_NO);

    values.date_new_price = date(DATE_NEW_PRICE);
    values.previous_date_new_price = date(PREVIOUS_DATE_NEW_PRICE);
}

/// Numeric and boolean fields: always resolve when the code is present.
fn map_resolved_fields(flat: &FlatFieldMap, values: &mut AttributeValues) {
    let number = |code: &str| flat.get(code).map(coerce_number);

    values.dealer_price = number(DEALER_PRICE);
    values.previous_dealer_price = number(PREVIOUS_DEALER_PRICE);
    values.net_weight = number(NET_WEIGHT);
    values.gross_weight = number(GROSS_WEIGHT);

    values.blocked = flat.get(BLOCKED).map(coerce_bool);
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn coerce_text(value: &Value) -> String {
    if !is_truthy(value) {
        return String::new();
    }
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn coerce_number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).unwrap_or(0.0)
}

fn coerce_bool(value: &Value) -> bool {
    if !is_truthy(value) {
        return false;
    }
    match value {
        Value::String(s) => {
            let token = s.trim().to_ascii_lowercase();
            !token.is_empty() && !FALSE_TOKENS.contains(&token.as_str())
        }
        _ => true,
    }
}

/// `None` means the stored date is cleared.
fn coerce_date(code: &str, value: &Value) -> Option<NaiveDateTime> {
    if !is_truthy(value) {
        return None;
    }
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    let parsed = if raw.contains('/') {
        NaiveDate::parse_from_str(&raw, "%d/%m/%Y")
            .ok()
            .map(|d| d.and_time(NaiveTime::MIN))
    } else {
        parse_iso(&raw)
    };
    if parsed.is_none() {
        warn!(field = code, value = %raw, "invalid date format, leaving date unset");
    }
    parsed
}

fn parse_iso(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}
