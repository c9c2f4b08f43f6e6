//! Catalog import: stage every usable row, then one all-or-nothing bulk
//! upsert keyed on product name.

use std::path::Path;

use medstock_core::normalize::{
    clean, clean_or, derive_unit_price, parse_count, parse_price, parse_expiry, NormalizeError,
};
use medstock_core::CatalogRecord;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::columns::{ColumnMap, HeaderIndex};
use crate::reader::read_rows;
use crate::ImportError;

/// Outcome of one catalog import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogImportReport {
    /// Data rows in the source file.
    pub rows: usize,
    /// Rows staged for the bulk upsert.
    pub staged: usize,
    /// Rows dropped before the batch: no product name, or an unparseable
    /// numeric cell.
    pub skipped: usize,
    /// Rows the store reports written. Zero whenever the batch rolled back.
    pub committed: u64,
}

/// Normalizes one source row into a [`CatalogRecord`].
///
/// The caller has already resolved a non-empty product name; everything else
/// defaults per the data model (brand "Generic", one tablet per packet, zero
/// stock and price).
fn stage_catalog_row(
    index: &HeaderIndex,
    record: &csv::StringRecord,
    map: &ColumnMap,
    name: String,
) -> Result<CatalogRecord, NormalizeError> {
    let stock_packets = parse_count(index.get(record, &map.stock_packets), 0)?.value;
    let tablets_per_packet = parse_count(index.get(record, &map.tablets_per_packet), 1)?.value;

    let direct_price = parse_price(index.get(record, &map.price_per_tablet), Decimal::ZERO)?;
    let price_per_tablet = if direct_price.value > Decimal::ZERO {
        direct_price.value
    } else {
        let pack_price = parse_price(index.get(record, &map.price_per_packet), Decimal::ZERO)?;
        derive_unit_price(direct_price.value, pack_price.value, tablets_per_packet)
    };

    Ok(CatalogRecord {
        product_code: clean(index.get(record, &map.product_code)),
        name,
        category: clean(index.get(record, &map.category)),
        brand: clean_or(index.get(record, &map.brand), "Generic").value,
        description: clean(index.get(record, &map.description)),
        stock_packets,
        // The unit price above was derived with the raw pack size, so a
        // source zero still yields a zero price; the stored pack size is
        // floored at one to keep the total-units product meaningful.
        tablets_per_packet: tablets_per_packet.max(1),
        price_per_tablet,
        expiry_date: parse_expiry(index.get(record, &map.expiry_date)),
    })
}

/// Stages all rows of a catalog export, skipping unusable ones.
///
/// Pure with respect to the store; exposed to the import entry point and to
/// tests.
fn stage_catalog_rows(
    headers: &csv::StringRecord,
    rows: &[csv::StringRecord],
    map: &ColumnMap,
) -> (Vec<CatalogRecord>, usize) {
    let index = HeaderIndex::from_headers(headers);
    let mut staged = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;

    for (row, record) in rows.iter().enumerate() {
        let Some(name) = clean(index.get(record, &map.product_name)) else {
            tracing::warn!(row, "skipping catalog row with no product name");
            skipped += 1;
            continue;
        };

        match stage_catalog_row(&index, record, map, name) {
            Ok(normalized) => staged.push(normalized),
            Err(e) => {
                tracing::warn!(row, error = %e, "skipping unparseable catalog row");
                skipped += 1;
            }
        }
    }

    (staged, skipped)
}

/// Imports a catalog export file.
///
/// Reads and normalizes the whole file first (file-level errors abort before
/// any write), then performs a single bulk upsert. The batch commits
/// atomically; on a store failure nothing is committed and the error carries
/// the attempted row count.
///
/// # Errors
///
/// Returns [`ImportError::Open`]/[`ImportError::Read`] for file problems,
/// [`ImportError::MissingColumn`] when the file lacks the product-name
/// column, and [`ImportError::BulkUpsert`] when the batch was rolled back.
pub async fn import_products(
    pool: &PgPool,
    path: &Path,
    map: &ColumnMap,
) -> Result<CatalogImportReport, ImportError> {
    let (headers, rows) = read_rows(path)?;

    let index = HeaderIndex::from_headers(&headers);
    if !index.contains(&map.product_name) {
        return Err(ImportError::MissingColumn {
            path: path.to_path_buf(),
            column: map.product_name.clone(),
        });
    }

    let (staged, skipped) = stage_catalog_rows(&headers, &rows, map);

    let committed = medstock_db::bulk_upsert_medicines(pool, &staged)
        .await
        .map_err(|e| ImportError::BulkUpsert {
            attempted: staged.len(),
            source: e,
        })?;

    Ok(CatalogImportReport {
        rows: rows.len(),
        staged: staged.len(),
        skipped,
        committed,
    })
}
