//! Database operations for the `medicines` catalog.

use medstock_core::CatalogRecord;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::DbError;

/// Category assigned to catalog rows created implicitly by the order
/// importer for names the catalog has never seen.
pub const HISTORY_CATEGORY: &str = "Imported History";

/// Each row binds nine parameters; Postgres caps a statement at 65535 binds,
/// so batches are split well below that.
const UPSERT_CHUNK_ROWS: usize = 1000;

/// The id and current per-unit price of a catalog row, as captured by the
/// order importer at the moment a line item is written.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MedicinePrice {
    pub id: i64,
    pub price_per_tablet: Decimal,
}

/// A reporting view over a catalog row. `total_tablets` comes from the
/// store's generated column, never from application arithmetic.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MedicineSummary {
    pub name: String,
    pub category: Option<String>,
    pub stock_packets: i64,
    pub tablets_per_packet: i64,
    pub total_tablets: i64,
    pub price_per_tablet: Decimal,
}

fn build_upsert_chunk<'a>(records: &'a [CatalogRecord]) -> QueryBuilder<'a, Postgres> {
    let mut builder: QueryBuilder<'a, Postgres> = QueryBuilder::new(
        "INSERT INTO medicines \
             (product_code, name, category, brand, description, \
              stock_packets, tablets_per_packet, price_per_tablet, expiry_date) ",
    );
    builder.push_values(records, |mut b, record| {
        b.push_bind(&record.product_code)
            .push_bind(&record.name)
            .push_bind(&record.category)
            .push_bind(&record.brand)
            .push_bind(&record.description)
            .push_bind(record.stock_packets)
            .push_bind(record.tablets_per_packet)
            .push_bind(record.price_per_tablet)
            .push_bind(record.expiry_date);
    });
    builder.push(
        " ON CONFLICT (name) DO UPDATE SET \
             product_code       = EXCLUDED.product_code, \
             category           = EXCLUDED.category, \
             brand              = EXCLUDED.brand, \
             description        = EXCLUDED.description, \
             stock_packets      = EXCLUDED.stock_packets, \
             tablets_per_packet = EXCLUDED.tablets_per_packet, \
             price_per_tablet   = EXCLUDED.price_per_tablet, \
             expiry_date        = EXCLUDED.expiry_date",
    );
    builder
}

/// Upserts a batch of catalog records keyed on `name`.
///
/// Conflicting rows have every mutable attribute overwritten with the
/// incoming value; the last import wins wholesale, there is no per-field
/// merge. The whole batch runs in one transaction: either every record
/// commits or none does, because a partially merged catalog would corrupt
/// every later order lookup.
///
/// Returns the number of rows written. An empty batch touches nothing and
/// returns zero.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the transaction is
/// rolled back and zero rows are committed.
pub async fn bulk_upsert_medicines(
    pool: &PgPool,
    records: &[CatalogRecord],
) -> Result<u64, DbError> {
    if records.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut written: u64 = 0;
    for chunk in records.chunks(UPSERT_CHUNK_ROWS) {
        let mut builder = build_upsert_chunk(chunk);
        let result = builder.build().execute(&mut *tx).await?;
        written += result.rows_affected();
    }
    tx.commit().await?;

    Ok(written)
}

/// Looks up a catalog row by exact name, returning its id and current
/// per-unit price.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_medicine_price_by_name(
    conn: &mut PgConnection,
    name: &str,
) -> Result<Option<MedicinePrice>, DbError> {
    let row = sqlx::query_as::<_, MedicinePrice>(
        "SELECT id, price_per_tablet FROM medicines WHERE name = $1",
    )
    .bind(name)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

/// Creates a minimal catalog row for a name first seen in the order log.
///
/// Every attribute except the name takes its schema default, so the
/// returned price is zero and stock is empty until a real catalog import
/// supplies values.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_history_medicine(
    conn: &mut PgConnection,
    name: &str,
) -> Result<MedicinePrice, DbError> {
    let row = sqlx::query_as::<_, MedicinePrice>(
        "INSERT INTO medicines (name, category) VALUES ($1, $2) \
         RETURNING id, price_per_tablet",
    )
    .bind(name)
    .bind(HISTORY_CATEGORY)
    .fetch_one(conn)
    .await?;

    Ok(row)
}

/// Number of catalog rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_medicines(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM medicines")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// A small sample of catalog rows for operator-facing summaries.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_medicine_summaries(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<MedicineSummary>, DbError> {
    let rows = sqlx::query_as::<_, MedicineSummary>(
        "SELECT name, category, stock_packets, tablets_per_packet, \
                total_tablets, price_per_tablet \
         FROM medicines \
         ORDER BY name \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> CatalogRecord {
        CatalogRecord {
            product_code: None,
            name: name.to_string(),
            category: None,
            brand: "Generic".to_string(),
            description: None,
            stock_packets: 1,
            tablets_per_packet: 1,
            price_per_tablet: Decimal::ZERO,
            expiry_date: None,
        }
    }

    #[test]
    fn upsert_sql_overwrites_every_mutable_attribute() {
        let records = vec![record("A")];
        let mut builder = build_upsert_chunk(&records);
        let sql = builder.sql();
        for column in [
            "product_code",
            "category",
            "brand",
            "description",
            "stock_packets",
            "tablets_per_packet",
            "price_per_tablet",
            "expiry_date",
        ] {
            assert!(
                sql.contains(&format!("EXCLUDED.{column}")),
                "blanket overwrite is missing {column}: {sql}"
            );
        }
    }

    #[test]
    fn upsert_sql_conflicts_on_name_only() {
        let records = vec![record("A")];
        let mut builder = build_upsert_chunk(&records);
        assert!(builder.sql().contains("ON CONFLICT (name) DO UPDATE SET"));
    }

    #[test]
    fn upsert_sql_binds_one_group_per_record() {
        let records = vec![record("A"), record("B"), record("C")];
        let mut builder = build_upsert_chunk(&records);
        // Nine placeholders per row; the last one tells us all rows bound.
        assert!(builder.sql().contains("$27"));
        assert!(!builder.sql().contains("$28"));
    }

    #[test]
    fn upsert_sql_never_writes_the_generated_column() {
        let records = vec![record("A")];
        let mut builder = build_upsert_chunk(&records);
        assert!(!builder.sql().contains("total_tablets"));
    }
}
