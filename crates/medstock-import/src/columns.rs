//! Logical-field to source-column mapping.
//!
//! Exact column names in the supplier exports are configuration, not
//! protocol. The defaults below match the headers observed in the known
//! export files; a YAML file can override any of them per deployment.
//! Header matching runs through [`normalize_header`], so trailing spaces and
//! stray quotes in a source file do not break the mapping.

use std::collections::HashMap;
use std::path::Path;

use medstock_core::normalize::normalize_header;
use serde::Deserialize;

use crate::ImportError;

/// Maps every logical field the importers consume to a source column name.
/// The product fields apply to the catalog export, the order fields to the
/// order-history export; `product_name` is shared by both files.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnMap {
    pub product_name: String,
    pub product_code: String,
    pub category: String,
    pub brand: String,
    pub description: String,
    pub stock_packets: String,
    pub tablets_per_packet: String,
    pub price_per_tablet: String,
    pub price_per_packet: String,
    pub expiry_date: String,
    pub customer_name: String,
    pub mobile: String,
    pub total_price: String,
    pub quantity: String,
    pub purchase_date: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            product_name: "Product Name".to_string(),
            product_code: "Product ID".to_string(),
            category: "Category".to_string(),
            brand: "Brand".to_string(),
            description: "Description".to_string(),
            stock_packets: "Total Packets".to_string(),
            tablets_per_packet: "Tablets Per Packet".to_string(),
            price_per_tablet: "Price Per Tablet".to_string(),
            price_per_packet: "Price Per Packet".to_string(),
            // The supplier export really does spell it this way.
            expiry_date: "Expiray Date".to_string(),
            customer_name: "Name".to_string(),
            mobile: "Mobile number".to_string(),
            total_price: "Total Price (EUR)".to_string(),
            quantity: "Quantity".to_string(),
            purchase_date: "Purchase Date".to_string(),
        }
    }
}

impl ColumnMap {
    /// Loads a mapping from a YAML file. Fields absent from the file keep
    /// their defaults; unknown fields are rejected so a typo cannot silently
    /// fall back to a default column.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::ColumnMap`] when the file cannot be read or
    /// parsed.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ImportError> {
        let text = std::fs::read_to_string(path).map_err(|e| ImportError::ColumnMap {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_yaml::from_str(&text).map_err(|e| ImportError::ColumnMap {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Positions of normalized headers within one source file. Built once per
/// import from the file's header record.
#[derive(Debug)]
pub struct HeaderIndex {
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    /// Indexes a header record, normalizing each header. The first
    /// occurrence wins when a file repeats a header.
    #[must_use]
    pub fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut positions = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            positions.entry(normalize_header(header)).or_insert(idx);
        }
        Self { positions }
    }

    /// Returns the raw cell under `column` for `record`, or `None` when the
    /// file has no such column or the row is short.
    #[must_use]
    pub fn get<'r>(&self, record: &'r csv::StringRecord, column: &str) -> Option<&'r str> {
        let idx = *self.positions.get(&normalize_header(column))?;
        record.get(idx)
    }

    /// Returns `true` when the file carries `column` at all. Importers use
    /// this to reject a file that lacks its identifying column before any
    /// row is processed.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.positions.contains_key(&normalize_header(column))
    }
}
