use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog row normalized from a supplier export, ready for the bulk
/// upsert. One record per usable source row; rows without a product name
/// never become records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// External product code from the supplier file, kept as free text.
    pub product_code: Option<String>,
    /// Unique, case-sensitive reconciliation key.
    pub name: String,
    pub category: Option<String>,
    /// Defaults to `"Generic"` when the source cell is missing.
    pub brand: String,
    pub description: Option<String>,
    /// Packages on hand.
    pub stock_packets: i64,
    /// Units per package; at least 1.
    pub tablets_per_packet: i64,
    /// Per-unit price, already derived from the package price when the
    /// direct value was absent or zero.
    pub price_per_tablet: Decimal,
    pub expiry_date: Option<NaiveDate>,
}

impl CatalogRecord {
    /// Total sellable units this record represents. The store recomputes the
    /// same product in its generated column; this accessor exists for
    /// reporting and tests, never for persistence.
    #[must_use]
    pub fn total_tablets(&self) -> i64 {
        self.stock_packets * self.tablets_per_packet
    }
}

/// A historical order row normalized from the order-log export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Catalog name the order references; resolved or created at import time.
    pub product_name: String,
    pub customer_name: Option<String>,
    /// Free text, not validated.
    pub mobile: String,
    pub total_price: Decimal,
    pub quantity: i64,
    /// `None` when the source date was missing or unparseable; the store
    /// default (import time) applies in that case.
    pub purchased_at: Option<NaiveDateTime>,
}
