//! Database operations for `orders` and `order_items`.
//!
//! Two callers share these inserts: the order-history importer, which runs
//! them inside its own per-row savepoint, and [`place_order`], the entry
//! point a downstream order-intake service reuses. Both get the same
//! guarantees: the medicine exists before the line is written, and the line
//! captures the catalog price at write time.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::DbError;

/// An order header to insert.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_name: Option<String>,
    pub mobile: String,
    pub total_price: Decimal,
    /// When `None`, the store default (insert time) applies.
    pub placed_at: Option<DateTime<Utc>>,
}

/// One line of an order placed through [`place_order`].
#[derive(Debug, Clone, Copy)]
pub struct OrderLine {
    pub medicine_id: i64,
    pub quantity: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct StockedMedicine {
    price_per_tablet: Decimal,
    total_tablets: i64,
    tablets_per_packet: i64,
}

/// Inserts an order header, returning its generated id.
///
/// `created_at` takes `placed_at` when the source supplied a parseable
/// purchase date, otherwise the store's own default.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_order(conn: &mut PgConnection, order: &NewOrder) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO orders (customer_name, mobile, total_price, created_at) \
         VALUES ($1, $2, $3, COALESCE($4, NOW())) \
         RETURNING id",
    )
    .bind(&order.customer_name)
    .bind(&order.mobile)
    .bind(order.total_price)
    .bind(order.placed_at)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

/// Inserts one order line, returning its generated id.
///
/// `price_at_time` is whatever the caller captured from the catalog before
/// calling; it is deliberately not re-read here.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_order_item(
    conn: &mut PgConnection,
    order_id: i64,
    medicine_id: i64,
    quantity: i64,
    price_at_time: Decimal,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO order_items (order_id, medicine_id, quantity, price_at_time) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id",
    )
    .bind(order_id)
    .bind(medicine_id)
    .bind(quantity)
    .bind(price_at_time)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

/// Creates an order with its line items in one transaction.
///
/// For each line the medicine's current per-unit price is captured into
/// `price_at_time`, and `stock_packets` is recomputed in whole packets from
/// the remaining units. Either the header, every line, and every stock
/// update commit together, or none of them do.
///
/// Returns the new order's id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if a line references a medicine id that
/// does not exist, or [`DbError::Sqlx`] on any store failure. Both roll the
/// whole order back.
pub async fn place_order(
    pool: &PgPool,
    order: &NewOrder,
    lines: &[OrderLine],
) -> Result<i64, DbError> {
    let mut tx = pool.begin().await?;

    let order_id = insert_order(&mut tx, order).await?;

    for line in lines {
        let medicine = sqlx::query_as::<_, StockedMedicine>(
            "SELECT price_per_tablet, total_tablets, tablets_per_packet \
             FROM medicines WHERE id = $1",
        )
        .bind(line.medicine_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::NotFound)?;

        insert_order_item(
            &mut tx,
            order_id,
            line.medicine_id,
            line.quantity,
            medicine.price_per_tablet,
        )
        .await?;

        // total_tablets is generated from stock_packets, so stock is reduced
        // by rewriting the packet count from the remaining units.
        let new_packets = remaining_packets(
            medicine.total_tablets,
            line.quantity,
            medicine.tablets_per_packet,
        );
        sqlx::query("UPDATE medicines SET stock_packets = $1 WHERE id = $2")
            .bind(new_packets)
            .bind(line.medicine_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(order_id)
}

/// Whole packets left after selling `quantity` units. Never negative.
fn remaining_packets(total_tablets: i64, quantity: i64, tablets_per_packet: i64) -> i64 {
    if tablets_per_packet <= 0 {
        return 0;
    }
    let tablets_left = (total_tablets - quantity).max(0);
    tablets_left / tablets_per_packet
}

/// Number of order headers.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_orders(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Number of order lines.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_order_items(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM order_items")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
