//! # Utilities Module
//!
//! Small helpers shared by the API layer and the services.

/// US dollar.
pub const USD: &str = "USD";
/// Euro.
pub const EUR: &str = "EUR";
/// Canadian dollar.
pub const CAD: &str = "CAD";

/// Currencies accounts may be opened in.
pub const SUPPORTED_CURRENCIES: [&str; 3] = [USD, EUR, CAD];

/// Check a currency code against [`SUPPORTED_CURRENCIES`].
///
/// Codes are case-sensitive, as stored.
pub fn is_supported_currency(currency: &str) -> bool {
    SUPPORTED_CURRENCIES.contains(&currency)
}

/// Ids are assigned from 1 upwards, so anything below is rejected up front.
pub fn validate_id(field: &str, id: i64) -> Result<(), String> {
    if id < 1 {
        return Err(format!("{} must be at least 1, got {}", field, id));
    }
    Ok(())
}

/// Validate a page request and return `(limit, offset)`.
///
/// ## Arguments
///
/// * `page_id` - 1-based page number
/// * `page_size` - Rows per page, `1..=max_page_size`
///
/// ## Returns
///
/// * `Ok((page_size, (page_id - 1) * page_size))`
/// * `Err(String)` - Out of range
pub fn page_bounds(page_id: i64, page_size: i64, max_page_size: i64) -> Result<(i64, i64), String> {
    if page_id < 1 {
        return Err(format!("pageId must be at least 1, got {}", page_id));
    }
    if page_size < 1 || page_size > max_page_size {
        return Err(format!(
            "pageSize must be between 1 and {}, got {}",
            max_page_size, page_size
        ));
    }

    let offset = (page_id - 1)
        .checked_mul(page_size)
        .ok_or_else(|| format!("pageId {} is too large", page_id))?;
    Ok((page_size, offset))
}

/// Format minor units as a decimal amount with the currency code.
///
/// ## Examples
///
/// ```rust,ignore
/// assert_eq!(format_amount(12_345, "USD"), "123.45 USD");
/// assert_eq!(format_amount(-5, "EUR"), "-0.05 EUR");
/// ```
pub fn format_amount(amount: i64, currency: &str) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{}{}.{:02} {}", sign, abs / 100, abs % 100, currency)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_currencies() {
        assert!(is_supported_currency("USD"));
        assert!(is_supported_currency("EUR"));
        assert!(is_supported_currency("CAD"));
        assert!(!is_supported_currency("usd"));
        assert!(!is_supported_currency("INV"));
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("id", 1).is_ok());
        assert!(validate_id("id", 0).is_err());
        assert!(validate_id("fromAccountId", -3).unwrap_err().contains("fromAccountId"));
    }

    #[test]
    fn test_page_bounds() {
        assert_eq!(page_bounds(1, 5, 10), Ok((5, 0)));
        assert_eq!(page_bounds(3, 5, 10), Ok((5, 10)));
        assert!(page_bounds(0, 5, 10).is_err());
        assert!(page_bounds(1, 0, 10).is_err());
        assert!(page_bounds(1, 11, 10).is_err());
        assert!(page_bounds(i64::MAX, 10, 10).is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(12_345, "USD"), "123.45 USD");
        assert_eq!(format_amount(0, "CAD"), "0.00 CAD");
        assert_eq!(format_amount(-5, "EUR"), "-0.05 EUR");
    }
}
