//! Schema initialization for the four persistent entities.
//!
//! The import pipeline owns its own schema: tables are created on `init`
//! rather than through migration files, and a reset truncates everything
//! before a fresh bulk load. `total_tablets` is a stored generated column so
//! the package-count x pack-size invariant is enforced by the database; no
//! code path writes it.

use sqlx::PgPool;

use crate::DbError;

const CREATE_MEDICINES: &str = "\
    CREATE TABLE IF NOT EXISTS medicines (
        id BIGSERIAL PRIMARY KEY,
        product_code VARCHAR(50),
        name VARCHAR(255) UNIQUE NOT NULL,
        category VARCHAR(100),
        brand VARCHAR(255),
        description TEXT,
        stock_packets BIGINT NOT NULL DEFAULT 0,
        tablets_per_packet BIGINT NOT NULL DEFAULT 1,
        total_tablets BIGINT GENERATED ALWAYS AS (stock_packets * tablets_per_packet) STORED,
        price_per_tablet NUMERIC(10, 2) NOT NULL DEFAULT 0,
        expiry_date DATE,
        low_stock_threshold BIGINT DEFAULT 30,
        is_deleted BOOLEAN DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )";

const CREATE_ORDERS: &str = "\
    CREATE TABLE IF NOT EXISTS orders (
        id BIGSERIAL PRIMARY KEY,
        customer_name VARCHAR(255),
        mobile VARCHAR(20),
        total_price NUMERIC(10, 2) NOT NULL,
        status VARCHAR(50) DEFAULT 'completed',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )";

const CREATE_ORDER_ITEMS: &str = "\
    CREATE TABLE IF NOT EXISTS order_items (
        id BIGSERIAL PRIMARY KEY,
        order_id BIGINT REFERENCES orders(id),
        medicine_id BIGINT REFERENCES medicines(id),
        quantity BIGINT NOT NULL,
        price_at_time NUMERIC(10, 2) NOT NULL
    )";

const CREATE_ALERTS: &str = "\
    CREATE TABLE IF NOT EXISTS alerts (
        id BIGSERIAL PRIMARY KEY,
        medicine_id BIGINT REFERENCES medicines(id),
        message TEXT NOT NULL,
        type VARCHAR(50),
        is_resolved BOOLEAN DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )";

// Truncation order mirrors the foreign-key dependencies: line items first,
// then their orders, then alerts, then the catalog they all reference.
const RESET_ALL: &str =
    "TRUNCATE TABLE order_items, orders, alerts, medicines RESTART IDENTITY CASCADE";

/// Ensures all four tables exist with their declared columns and constraints.
///
/// A database created by an earlier revision may have a `medicines` table
/// without the unique name constraint the upsert relies on; the constraint is
/// probed via `pg_constraint` and added when missing.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any DDL statement fails.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DbError> {
    for statement in [CREATE_MEDICINES, CREATE_ORDERS, CREATE_ORDER_ITEMS, CREATE_ALERTS] {
        sqlx::query(statement).execute(pool).await?;
    }

    let name_key: Option<i32> =
        sqlx::query_scalar("SELECT 1 FROM pg_constraint WHERE conname = 'medicines_name_key'")
            .fetch_optional(pool)
            .await?;
    if name_key.is_none() {
        sqlx::query("ALTER TABLE medicines ADD CONSTRAINT medicines_name_key UNIQUE (name)")
            .execute(pool)
            .await?;
        tracing::info!("added missing unique constraint on medicines(name)");
    }

    Ok(())
}

/// Truncates all rows from every table, restarting identity sequences.
///
/// Irreversible. Callers must gate this behind an explicit operator flag;
/// it is never run implicitly before an import.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the truncation fails.
pub async fn reset_data(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query(RESET_ALL).execute(pool).await?;
    tracing::info!("cleared all medicines, orders, order items and alerts");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_tablets_is_a_stored_generated_column() {
        assert!(CREATE_MEDICINES
            .contains("GENERATED ALWAYS AS (stock_packets * tablets_per_packet) STORED"));
    }

    #[test]
    fn medicines_name_is_unique() {
        assert!(CREATE_MEDICINES.contains("name VARCHAR(255) UNIQUE NOT NULL"));
    }

    #[test]
    fn reset_truncates_dependents_before_catalog() {
        let items = RESET_ALL.find("order_items").unwrap();
        let orders = RESET_ALL.find(" orders").unwrap();
        let alerts = RESET_ALL.find("alerts").unwrap();
        let medicines = RESET_ALL.find("medicines").unwrap();
        assert!(items < orders && orders < alerts && alerts < medicines);
    }

    #[test]
    fn reset_restarts_identity_sequences() {
        assert!(RESET_ALL.contains("RESTART IDENTITY"));
    }
}
