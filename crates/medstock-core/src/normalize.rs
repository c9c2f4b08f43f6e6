//! Pure normalization of raw tabular cells into typed domain values.
//!
//! Supplier exports are messy: cells go missing, carry stray whitespace, or
//! hold the literal text `nan` left over from an upstream export step. All
//! coercion lives here so both importers share one set of rules, and every
//! defaulting path is observable through [`Cleaned::defaulted`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("cannot interpret {value:?} as a whole number")]
    InvalidCount { value: String },

    #[error("cannot interpret {value:?} as an amount")]
    InvalidAmount { value: String },
}

/// A normalized value plus whether the fallback default was substituted for
/// a missing cell. Lets callers (and tests) distinguish a real `0` in the
/// source from a defaulted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cleaned<T> {
    pub value: T,
    pub defaulted: bool,
}

impl<T> Cleaned<T> {
    fn present(value: T) -> Self {
        Self {
            value,
            defaulted: false,
        }
    }

    fn fallback(value: T) -> Self {
        Self {
            value,
            defaulted: true,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Returns `true` when a trimmed cell is one of the missing-value sentinels.
fn is_missing(trimmed: &str) -> bool {
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("nat")
}

/// Maps missing sentinels (absent cell, blank after trim, literal "nan"/"nat")
/// to `None`; trims surrounding whitespace on everything else.
#[must_use]
pub fn clean(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if is_missing(trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Total variant of [`clean`]: missing cells take `default` and are flagged.
#[must_use]
pub fn clean_or(raw: Option<&str>, default: &str) -> Cleaned<String> {
    match clean(raw) {
        Some(value) => Cleaned::present(value),
        None => Cleaned::fallback(default.to_string()),
    }
}

/// Parses a whole-number cell, defaulting when the cell is missing.
///
/// Spreadsheet exports frequently render integers as `10.0`; a decimal value
/// with no fractional part is accepted as the integer it denotes.
///
/// # Errors
///
/// Returns [`NormalizeError::InvalidCount`] when the cell is present but not
/// interpretable as a whole number.
pub fn parse_count(raw: Option<&str>, default: i64) -> Result<Cleaned<i64>, NormalizeError> {
    let Some(text) = clean(raw) else {
        return Ok(Cleaned::fallback(default));
    };

    if let Ok(n) = text.parse::<i64>() {
        return Ok(Cleaned::present(n));
    }

    let as_decimal = text
        .parse::<Decimal>()
        .map_err(|_| NormalizeError::InvalidCount {
            value: text.clone(),
        })?;
    if as_decimal.fract() != Decimal::ZERO {
        return Err(NormalizeError::InvalidCount { value: text });
    }
    as_decimal
        .to_i64()
        .map(Cleaned::present)
        .ok_or(NormalizeError::InvalidCount { value: text })
}

/// Parses a currency cell, defaulting when the cell is missing.
///
/// # Errors
///
/// Returns [`NormalizeError::InvalidAmount`] when the cell is present but not
/// a decimal number.
pub fn parse_price(raw: Option<&str>, default: Decimal) -> Result<Cleaned<Decimal>, NormalizeError> {
    match clean(raw) {
        None => Ok(Cleaned::fallback(default)),
        Some(text) => text
            .parse::<Decimal>()
            .map(Cleaned::present)
            .map_err(|_| NormalizeError::InvalidAmount { value: text }),
    }
}

/// Resolves the per-unit price for a catalog row.
///
/// The direct per-unit price wins when it is positive. Otherwise the price is
/// derived from the per-package price; a zero or missing package size yields
/// zero rather than a division fault.
#[must_use]
pub fn derive_unit_price(direct: Decimal, pack_price: Decimal, units_per_pack: i64) -> Decimal {
    if direct > Decimal::ZERO {
        return direct;
    }
    if units_per_pack > 0 {
        return pack_price / Decimal::from(units_per_pack);
    }
    Decimal::ZERO
}

/// Normalizes an external column header: strips quote characters and
/// surrounding whitespace, tolerating drift like `"Product Name "` between
/// source files.
#[must_use]
pub fn normalize_header(raw: &str) -> String {
    raw.replace(['"', '\''], "").trim().to_string()
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parses an expiry cell into a date. Total: any unparseable or missing value
/// is `None`.
#[must_use]
pub fn parse_expiry(raw: Option<&str>) -> Option<NaiveDate> {
    let text = clean(raw)?;

    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(&text, format) {
            return Some(ts.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&text, format) {
            return Some(date);
        }
    }
    None
}

/// Parses a purchase-date cell into a timestamp. Total: `None` on any parse
/// failure, so the caller can fall back to the store's own default instead of
/// failing the row.
#[must_use]
pub fn parse_purchase_timestamp(raw: Option<&str>) -> Option<NaiveDateTime> {
    let text = clean(raw)?;

    if let Ok(ts) = DateTime::parse_from_rfc3339(&text) {
        return Some(ts.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(&text, format) {
            return Some(ts);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("test decimal literal")
    }

    // -----------------------------------------------------------------------
    // clean / clean_or
    // -----------------------------------------------------------------------

    #[test]
    fn clean_trims_surrounding_whitespace() {
        assert_eq!(clean(Some("  Paracetamol ")), Some("Paracetamol".to_string()));
    }

    #[test]
    fn clean_maps_absent_cell_to_none() {
        assert_eq!(clean(None), None);
    }

    #[test]
    fn clean_maps_blank_after_trim_to_none() {
        assert_eq!(clean(Some("   ")), None);
    }

    #[test]
    fn clean_maps_literal_nan_to_none_case_insensitive() {
        assert_eq!(clean(Some("nan")), None);
        assert_eq!(clean(Some("NaN")), None);
        assert_eq!(clean(Some(" NAN ")), None);
    }

    #[test]
    fn clean_maps_not_a_time_sentinel_to_none() {
        assert_eq!(clean(Some("NaT")), None);
    }

    #[test]
    fn clean_passes_real_values_through() {
        assert_eq!(clean(Some("Nandrolone")), Some("Nandrolone".to_string()));
    }

    #[test]
    fn clean_or_flags_applied_default() {
        let cleaned = clean_or(Some("nan"), "Generic");
        assert_eq!(cleaned.value, "Generic");
        assert!(cleaned.defaulted);
    }

    #[test]
    fn clean_or_does_not_flag_real_value() {
        let cleaned = clean_or(Some(" Cipla "), "Generic");
        assert_eq!(cleaned.value, "Cipla");
        assert!(!cleaned.defaulted);
    }

    // -----------------------------------------------------------------------
    // parse_count / parse_price
    // -----------------------------------------------------------------------

    #[test]
    fn parse_count_reads_plain_integer() {
        let parsed = parse_count(Some("10"), 1).unwrap();
        assert_eq!(parsed.value, 10);
        assert!(!parsed.defaulted);
    }

    #[test]
    fn parse_count_accepts_spreadsheet_style_float() {
        let parsed = parse_count(Some("10.0"), 1).unwrap();
        assert_eq!(parsed.value, 10);
        assert!(!parsed.defaulted);
    }

    #[test]
    fn parse_count_defaults_missing_cell() {
        let parsed = parse_count(None, 1).unwrap();
        assert_eq!(parsed.value, 1);
        assert!(parsed.defaulted);
    }

    #[test]
    fn parse_count_defaults_nan_cell() {
        let parsed = parse_count(Some("nan"), 0).unwrap();
        assert_eq!(parsed.value, 0);
        assert!(parsed.defaulted);
    }

    #[test]
    fn parse_count_rejects_text() {
        let err = parse_count(Some("ten"), 1).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidCount { value } if value == "ten"));
    }

    #[test]
    fn parse_count_rejects_fractional_value() {
        let err = parse_count(Some("2.5"), 1).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidCount { .. }));
    }

    #[test]
    fn parse_price_reads_decimal() {
        let parsed = parse_price(Some("12.50"), Decimal::ZERO).unwrap();
        assert_eq!(parsed.value, dec("12.50"));
        assert!(!parsed.defaulted);
    }

    #[test]
    fn parse_price_defaults_missing_cell() {
        let parsed = parse_price(None, Decimal::ZERO).unwrap();
        assert_eq!(parsed.value, Decimal::ZERO);
        assert!(parsed.defaulted);
    }

    #[test]
    fn parse_price_rejects_text() {
        let err = parse_price(Some("free"), Decimal::ZERO).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidAmount { value } if value == "free"));
    }

    // -----------------------------------------------------------------------
    // derive_unit_price
    // -----------------------------------------------------------------------

    #[test]
    fn derive_unit_price_splits_pack_price_when_direct_is_zero() {
        assert_eq!(
            derive_unit_price(Decimal::ZERO, dec("100"), 4),
            dec("25")
        );
    }

    #[test]
    fn derive_unit_price_returns_zero_when_pack_size_is_zero() {
        assert_eq!(derive_unit_price(Decimal::ZERO, dec("100"), 0), Decimal::ZERO);
    }

    #[test]
    fn derive_unit_price_prefers_positive_direct_price() {
        assert_eq!(derive_unit_price(dec("7"), dec("100"), 4), dec("7"));
    }

    #[test]
    fn derive_unit_price_zero_when_everything_is_missing() {
        assert_eq!(derive_unit_price(Decimal::ZERO, Decimal::ZERO, 0), Decimal::ZERO);
    }

    // -----------------------------------------------------------------------
    // normalize_header
    // -----------------------------------------------------------------------

    #[test]
    fn normalize_header_strips_trailing_spaces() {
        assert_eq!(normalize_header("Product Name  "), "Product Name");
    }

    #[test]
    fn normalize_header_strips_stray_quotes() {
        assert_eq!(normalize_header("\"Price Per Tablet\""), "Price Per Tablet");
        assert_eq!(normalize_header("'Quantity'"), "Quantity");
    }

    #[test]
    fn normalize_header_strips_quotes_wrapping_padded_text() {
        assert_eq!(normalize_header("\" Mobile number \""), "Mobile number");
    }

    // -----------------------------------------------------------------------
    // dates
    // -----------------------------------------------------------------------

    #[test]
    fn parse_expiry_reads_iso_date() {
        assert_eq!(
            parse_expiry(Some("2027-03-31")),
            NaiveDate::from_ymd_opt(2027, 3, 31)
        );
    }

    #[test]
    fn parse_expiry_reads_spreadsheet_timestamp() {
        assert_eq!(
            parse_expiry(Some("2027-03-31 00:00:00")),
            NaiveDate::from_ymd_opt(2027, 3, 31)
        );
    }

    #[test]
    fn parse_expiry_reads_day_first_date() {
        assert_eq!(
            parse_expiry(Some("31/03/2027")),
            NaiveDate::from_ymd_opt(2027, 3, 31)
        );
    }

    #[test]
    fn parse_expiry_none_on_garbage() {
        assert_eq!(parse_expiry(Some("soon")), None);
        assert_eq!(parse_expiry(Some("nan")), None);
        assert_eq!(parse_expiry(None), None);
    }

    #[test]
    fn parse_purchase_timestamp_reads_rfc3339() {
        let ts = parse_purchase_timestamp(Some("2025-06-01T09:30:00+00:00")).unwrap();
        assert_eq!(ts.to_string(), "2025-06-01 09:30:00");
    }

    #[test]
    fn parse_purchase_timestamp_reads_space_separated() {
        let ts = parse_purchase_timestamp(Some("2025-06-01 09:30:00")).unwrap();
        assert_eq!(ts.to_string(), "2025-06-01 09:30:00");
    }

    #[test]
    fn parse_purchase_timestamp_reads_bare_date_at_midnight() {
        let ts = parse_purchase_timestamp(Some("2025-06-01")).unwrap();
        assert_eq!(ts.to_string(), "2025-06-01 00:00:00");
    }

    #[test]
    fn parse_purchase_timestamp_none_on_unparseable_value() {
        assert_eq!(parse_purchase_timestamp(Some("last tuesday")), None);
        assert_eq!(parse_purchase_timestamp(Some("NaT")), None);
        assert_eq!(parse_purchase_timestamp(None), None);
    }
}
