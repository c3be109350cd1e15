//! # API Request Models
//!
//! Structures for incoming API request bodies and query strings.
//! Each struct represents the expected JSON body for an endpoint.

use serde::{Deserialize, Serialize};

/// Request to open a new account.
///
/// ## Example JSON
///
/// ```json
/// {
///     "owner": "alice",
///     "currency": "USD"
/// }
/// ```
///
/// Accounts always open with a zero balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    /// Account holder name.
    pub owner: String,

    /// One of `USD`, `EUR`, `CAD`.
    pub currency: String,
}

/// Paging query parameters.
///
/// ## Example
///
/// `GET /accounts?pageId=2&pageSize=5`
///
/// ## Notes
///
/// - Both parameters are required
/// - `pageId` starts at 1
/// - `pageSize` is capped by `MAX_PAGE_SIZE`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page_id: i64,
    pub page_size: i64,
}

/// Request to move money between two accounts.
///
/// ## Example JSON
///
/// ```json
/// {
///     "fromAccountId": 1,
///     "toAccountId": 2,
///     "amount": 3000,
///     "currency": "USD"
/// }
/// ```
///
/// ## Notes
///
/// - `amount` is in minor units (cents) and must be positive
/// - both accounts must hold `currency`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferRequest {
    /// Account debited.
    pub from_account_id: i64,

    /// Account credited.
    pub to_account_id: i64,

    /// Amount in minor units.
    pub amount: i64,

    /// Currency both accounts must hold.
    pub currency: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_request_uses_camel_case() {
        let request: CreateTransferRequest = serde_json::from_str(
            r#"{"fromAccountId":1,"toAccountId":2,"amount":3000,"currency":"USD"}"#,
        )
        .unwrap();

        assert_eq!(request.from_account_id, 1);
        assert_eq!(request.to_account_id, 2);
        assert_eq!(request.amount, 3000);
        assert_eq!(request.currency, "USD");
    }

    #[test]
    fn test_page_query_requires_both_fields() {
        let query: PageQuery = serde_json::from_str(r#"{"pageId":2,"pageSize":5}"#).unwrap();
        assert_eq!(query.page_id, 2);
        assert_eq!(query.page_size, 5);

        assert!(serde_json::from_str::<PageQuery>("{}").is_err());
        assert!(serde_json::from_str::<PageQuery>(r#"{"pageId":1}"#).is_err());
    }
}
