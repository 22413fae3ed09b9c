//! Domain types: the API envelope, the product record and the mapper output.
//!
//! # Design
//! `AttributeValues` is the only way a product's API-owned state changes.
//! Every field is optional except the sync bookkeeping, and
//! `ProductRecord::apply` merges it in one pass, so a success or a failure
//! always lands together with its status, message and timestamp.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The `data` payload of a successful envelope: field code to raw value.
pub type FlatFieldMap = serde_json::Map<String, serde_json::Value>;

/// Outer JSON structure of every article API response.
///
/// Fields are kept as raw JSON so that an envelope with a `null` status or a
/// numeric message still yields the upstream text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub status: serde_json::Value,
    #[serde(default)]
    pub message: serde_json::Value,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ApiEnvelope {
    pub fn is_success(&self) -> bool {
        self.status.as_str() == Some("success")
    }

    /// Upstream message as text; `None` when absent, null or empty.
    pub fn message_text(&self) -> Option<String> {
        match &self.message {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// The flat field map, when the envelope reports success and carries one.
    pub fn into_data(self) -> Option<FlatFieldMap> {
        if !self.is_success() {
            return None;
        }
        match self.data {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Error,
    #[default]
    Never,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Error => "error",
            SyncStatus::Never => "never",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub u32);

/// Attributes populated from the article API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiAttributes {
    pub item_no: Option<String>,
    pub description: Option<String>,
    pub cad_iso: Option<String>,
    pub dealer_price: Option<f64>,
    pub date_new_price: Option<NaiveDateTime>,
    pub previous_dealer_price: Option<f64>,
    pub previous_date_new_price: Option<NaiveDateTime>,
    pub recupel: Option<String>,
    pub net_weight: Option<f64>,
    pub gross_weight: Option<f64>,
    pub energy_class: Option<String>,
    pub tariff_no: Option<String>,
    pub blocked: Option<bool>,
}

/// Persisted sync bookkeeping of a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    pub last_sync: Option<DateTime<Utc>>,
    pub status: SyncStatus,
    pub message: Option<String>,
}

/// Bookkeeping written by every sync attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStamp {
    pub at: DateTime<Utc>,
    pub status: SyncStatus,
    pub message: String,
}

impl SyncStamp {
    pub const SUCCESS_MESSAGE: &'static str = "Successfully updated from API";

    pub fn success(at: DateTime<Utc>) -> Self {
        Self {
            at,
            status: SyncStatus::Success,
            message: Self::SUCCESS_MESSAGE.to_string(),
        }
    }

    pub fn failure(at: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            at,
            status: SyncStatus::Error,
            message: message.into(),
        }
    }
}

/// One bulk write against a product.
///
/// `None` leaves the stored value untouched. Date fields carry a second
/// level: `Some(None)` clears the stored date.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeValues {
    pub item_no: Option<String>,
    pub description: Option<String>,
    pub cad_iso: Option<String>,
    pub dealer_price: Option<f64>,
    pub date_new_price: Option<Option<NaiveDateTime>>,
    pub previous_dealer_price: Option<f64>,
    pub previous_date_new_price: Option<Option<NaiveDateTime>>,
    pub recupel: Option<String>,
    pub net_weight: Option<f64>,
    pub gross_weight: Option<f64>,
    pub energy_class: Option<String>,
    pub tariff_no: Option<String>,
    pub blocked: Option<bool>,

    pub name: Option<String>,
    pub list_price: Option<f64>,
    pub weight: Option<f64>,
    pub category: Option<CategoryId>,

    pub sync: SyncStamp,
}

impl AttributeValues {
    /// Values that touch nothing but the sync bookkeeping.
    pub fn stamp_only(sync: SyncStamp) -> Self {
        Self {
            item_no: None,
            description: None,
            cad_iso: None,
            dealer_price: None,
            date_new_price: None,
            previous_dealer_price: None,
            previous_date_new_price: None,
            recupel: None,
            net_weight: None,
            gross_weight: None,
            energy_class: None,
            tariff_no: None,
            blocked: None,
            name: None,
            list_price: None,
            weight: None,
            category: None,
            sync,
        }
    }

    pub fn failure(at: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self::stamp_only(SyncStamp::failure(at, message))
    }
}

/// A product as seen by the sync core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub barcode: Option<String>,
    /// Explicit 100p article reference, preferred over the item number.
    #[serde(default)]
    pub article_reference: Option<String>,
    #[serde(default)]
    pub list_price: f64,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub attributes: ApiAttributes,
    #[serde(default)]
    pub sync: SyncState,
}

impl ProductRecord {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            barcode: None,
            article_reference: None,
            list_price: 0.0,
            weight: 0.0,
            category: None,
            attributes: ApiAttributes::default(),
            sync: SyncState::default(),
        }
    }

    pub fn with_barcode(mut self, barcode: &str) -> Self {
        self.barcode = Some(barcode.to_string());
        self
    }

    pub fn with_article_reference(mut self, reference: &str) -> Self {
        self.article_reference = Some(reference.to_string());
        self
    }

    pub fn with_item_no(mut self, item_no: &str) -> Self {
        self.attributes.item_no = Some(item_no.to_string());
        self
    }

    pub fn has_barcode(&self) -> bool {
        self.barcode.as_deref().is_some_and(|b| !b.trim().is_empty())
    }

    /// Query key for the article API: the article reference if set,
    /// otherwise the item number.
    pub fn query_identifier(&self) -> Option<&str> {
        non_blank(&self.article_reference).or_else(|| non_blank(&self.attributes.item_no))
    }

    pub fn apply(&mut self, values: &AttributeValues) {
        let attrs = &mut self.attributes;
        merge(&mut attrs.item_no, &values.item_no);
        merge(&mut attrs.description, &values.description);
        merge(&mut attrs.cad_iso, &values.cad_iso);
        merge(&mut attrs.dealer_price, &values.dealer_price);
        if let Some(date) = values.date_new_price {
            attrs.date_new_price = date;
        }
        merge(&mut attrs.previous_dealer_price, &values.previous_dealer_price);
        if let Some(date) = values.previous_date_new_price {
            attrs.previous_date_new_price = date;
        }
        merge(&mut attrs.recupel, &values.recupel);
        merge(&mut attrs.net_weight, &values.net_weight);
        merge(&mut attrs.gross_weight, &values.gross_weight);
        merge(&mut attrs.energy_class, &values.energy_class);
        merge(&mut attrs.tariff_no, &values.tariff_no);
        merge(&mut attrs.blocked, &values.blocked);

        if let Some(name) = &values.name {
            self.name = name.clone();
        }
        if let Some(price) = values.list_price {
            self.list_price = price;
        }
        if let Some(weight) = values.weight {
            self.weight = weight;
        }
        if values.category.is_some() {
            self.category = values.category;
        }

        self.sync = SyncState {
            last_sync: Some(values.sync.at),
            status: values.sync.status,
            message: Some(values.sync.message.clone()),
        };
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn merge<T: Clone>(target: &mut Option<T>, update: &Option<T>) {
    if let Some(value) = update {
        *target = Some(value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn envelope_defaults_missing_fields() {
        let env: ApiEnvelope = serde_json::from_str("{}").unwrap();
        assert!(!env.is_success());
        assert!(env.message_text().is_none());
        assert!(env.into_data().is_none());
    }

    #[test]
    fn envelope_accepts_loose_status_and_message() {
        let env: ApiEnvelope = serde_json::from_str(r#"{"status":null,"message":"Rate limited"}"#).unwrap();
        assert!(!env.is_success());
        assert_eq!(env.message_text().as_deref(), Some("Rate limited"));

        let env: ApiEnvelope = serde_json::from_str(r#"{"status":"error","message":429}"#).unwrap();
        assert_eq!(env.message_text().as_deref(), Some("429"));

        let env: ApiEnvelope = serde_json::from_str(r#"{"status":"error","message":""}"#).unwrap();
        assert!(env.message_text().is_none());
    }

    #[test]
    fn envelope_data_requires_success_and_object() {
        let env: ApiEnvelope = serde_json::from_str(r#"{"status":"success","data":[1,2]}"#).unwrap();
        assert!(env.into_data().is_none());

        let env: ApiEnvelope = serde_json::from_str(r#"{"status":"error","data":{"F_1":"1"}}"#).unwrap();
        assert!(env.into_data().is_none());

        let env: ApiEnvelope = serde_json::from_str(r#"{"status":"success","data":{"F_1":"1"}}"#).unwrap();
        assert_eq!(env.into_data().unwrap()["F_1"], "1");
    }

    #[test]
    fn sync_status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(SyncStatus::Never).unwrap(), "never");
        let status: SyncStatus = serde_json::from_str(r#""error""#).unwrap();
        assert_eq!(status, SyncStatus::Error);
        assert_eq!(SyncStatus::default(), SyncStatus::Never);
        assert_eq!(SyncStatus::Success.as_str(), "success");
        assert_eq!(SyncStatus::Error.to_string(), "error");
    }

    #[test]
    fn new_product_was_never_synced() {
        let product = ProductRecord::new("Fridge");
        assert_eq!(product.sync.status, SyncStatus::Never);
        assert!(product.sync.last_sync.is_none());
    }

    #[test]
    fn query_identifier_prefers_article_reference() {
        let product = ProductRecord::new("Fridge")
            .with_article_reference("REF-1")
            .with_item_no("12441114");
        assert_eq!(product.query_identifier(), Some("REF-1"));

        let product = ProductRecord::new("Fridge")
            .with_article_reference("  ")
            .with_item_no("12441114");
        assert_eq!(product.query_identifier(), Some("12441114"));

        let product = ProductRecord::new("Fridge").with_barcode("5400000000001");
        assert_eq!(product.query_identifier(), None);
    }

    #[test]
    fn apply_leaves_absent_fields_untouched() {
        let mut product = ProductRecord::new("Fridge").with_item_no("OLD");
        product.attributes.energy_class = Some("A".to_string());
        product.list_price = 99.0;

        let mut values = AttributeValues::stamp_only(SyncStamp::success(Utc::now()));
        values.item_no = Some("NEW".to_string());
        product.apply(&values);

        assert_eq!(product.attributes.item_no.as_deref(), Some("NEW"));
        assert_eq!(product.attributes.energy_class.as_deref(), Some("A"));
        assert_eq!(product.list_price, 99.0);
        assert_eq!(product.sync.status, SyncStatus::Success);
    }

    #[test]
    fn apply_clears_date_on_explicit_unset() {
        let mut product = ProductRecord::new("Fridge");
        let date = NaiveDate::from_ymd_opt(2024, 12, 25)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        product.attributes.date_new_price = Some(date);
        product.attributes.previous_date_new_price = Some(date);

        let mut values = AttributeValues::stamp_only(SyncStamp::success(Utc::now()));
        values.date_new_price = Some(None);
        product.apply(&values);

        assert!(product.attributes.date_new_price.is_none());
        assert_eq!(product.attributes.previous_date_new_price, Some(date));
    }

    #[test]
    fn failure_replaces_stale_success() {
        let mut product = ProductRecord::new("Fridge");
        product.apply(&AttributeValues::stamp_only(SyncStamp::success(Utc::now())));
        assert_eq!(product.sync.status, SyncStatus::Success);

        let at = Utc::now();
        product.apply(&AttributeValues::failure(at, "HTTP 500: boom"));
        assert_eq!(product.sync.status, SyncStatus::Error);
        assert_eq!(product.sync.message.as_deref(), Some("HTTP 500: boom"));
        assert_eq!(product.sync.last_sync, Some(at));
    }

    #[test]
    fn product_record_roundtrips_through_json() {
        let product = ProductRecord::new("Fridge").with_barcode("12441114");
        let json = serde_json::to_string(&product).unwrap();
        let back: ProductRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, product);
    }
}
