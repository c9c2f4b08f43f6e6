//! Order-history import with per-row fault isolation.
//!
//! Every usable row runs inside its own savepoint on the surrounding batch
//! transaction. A row that fails rolls back alone (including any catalog
//! placeholder it created) and the loop moves on; the batch commit at the
//! end makes every surviving row durable. No order header can outlive its
//! line item, because both inserts sit inside the same savepoint.

use std::path::Path;

use medstock_core::normalize::{
    clean, clean_or, parse_count, parse_price, parse_purchase_timestamp, NormalizeError,
};
use medstock_core::OrderRecord;
use medstock_db::{
    create_history_medicine, find_medicine_price_by_name, insert_order, insert_order_item,
    DbError, NewOrder,
};
use rust_decimal::Decimal;
use sqlx::{Acquire, PgConnection, PgPool};
use thiserror::Error;

use crate::columns::{ColumnMap, HeaderIndex};
use crate::reader::read_rows;
use crate::ImportError;

/// Outcome of one order-history import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderImportReport {
    /// Data rows in the source file.
    pub rows: usize,
    /// Rows whose savepoint committed.
    pub succeeded: usize,
    /// Rows rolled back to their savepoint.
    pub failed: usize,
    /// Rows with no product name; these never open a savepoint.
    pub skipped: usize,
}

/// Why a single order row was rolled back. Never escapes the batch loop.
#[derive(Debug, Error)]
enum RowError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Normalizes one source row into an [`OrderRecord`]. The caller has already
/// resolved a non-empty product name.
fn stage_order_row(
    index: &HeaderIndex,
    record: &csv::StringRecord,
    map: &ColumnMap,
    product_name: String,
) -> Result<OrderRecord, NormalizeError> {
    Ok(OrderRecord {
        product_name,
        customer_name: clean(index.get(record, &map.customer_name)),
        mobile: clean_or(index.get(record, &map.mobile), "").value,
        total_price: parse_price(index.get(record, &map.total_price), Decimal::ZERO)?.value,
        quantity: parse_count(index.get(record, &map.quantity), 1)?.value,
        purchased_at: parse_purchase_timestamp(index.get(record, &map.purchase_date)),
    })
}

/// Writes one staged order row: resolve or create the catalog entry, insert
/// the header, insert the line with the price captured from the catalog.
async fn write_order_row(conn: &mut PgConnection, staged: &OrderRecord) -> Result<(), RowError> {
    let medicine = match find_medicine_price_by_name(conn, &staged.product_name).await? {
        Some(found) => found,
        None => create_history_medicine(conn, &staged.product_name).await?,
    };

    let order = NewOrder {
        customer_name: staged.customer_name.clone(),
        mobile: staged.mobile.clone(),
        total_price: staged.total_price,
        placed_at: staged.purchased_at.map(|naive| naive.and_utc()),
    };
    let order_id = insert_order(conn, &order).await?;

    insert_order_item(
        conn,
        order_id,
        medicine.id,
        staged.quantity,
        medicine.price_per_tablet,
    )
    .await?;

    Ok(())
}

/// Imports an order-history export file.
///
/// The file is read in full before any write. Each usable row is processed
/// under its own savepoint; a failure rolls back that row only, is logged
/// with its row index, and the loop continues. The surrounding transaction
/// commits every successful row at the end.
///
/// # Errors
///
/// Returns [`ImportError::Open`]/[`ImportError::Read`] for file problems,
/// [`ImportError::MissingColumn`] when the file lacks the product-name
/// column, and [`ImportError::Db`] when the batch transaction itself cannot
/// be started or committed. Row-level failures are counted, not returned.
pub async fn import_orders(
    pool: &PgPool,
    path: &Path,
    map: &ColumnMap,
) -> Result<OrderImportReport, ImportError> {
    let (headers, rows) = read_rows(path)?;

    let index = HeaderIndex::from_headers(&headers);
    if !index.contains(&map.product_name) {
        return Err(ImportError::MissingColumn {
            path: path.to_path_buf(),
            column: map.product_name.clone(),
        });
    }

    let mut report = OrderImportReport {
        rows: rows.len(),
        ..OrderImportReport::default()
    };

    let mut tx = pool.begin().await.map_err(DbError::from)?;

    for (row, record) in rows.iter().enumerate() {
        let Some(name) = clean(index.get(record, &map.product_name)) else {
            tracing::warn!(row, "skipping order row with no product name");
            report.skipped += 1;
            continue;
        };

        let mut checkpoint = tx.begin().await.map_err(DbError::from)?;
        let outcome = match stage_order_row(&index, record, map, name.clone()) {
            Ok(staged) => write_order_row(&mut checkpoint, &staged).await,
            Err(e) => Err(RowError::from(e)),
        };

        match outcome {
            Ok(()) => {
                checkpoint.commit().await.map_err(DbError::from)?;
                report.succeeded += 1;
            }
            Err(e) => {
                checkpoint.rollback().await.map_err(DbError::from)?;
                tracing::warn!(row, product = %name, error = %e, "order row rolled back");
                report.failed += 1;
            }
        }
    }

    tx.commit().await.map_err(DbError::from)?;

    Ok(report)
}
