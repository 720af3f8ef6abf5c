//! Request payloads accepted by [`crate::service::FarmerService`].
//!
//! Farmer ids arrive as raw, optional integers and statuses arrive as strings. Both are validated by the service
//! before anything reaches the engine.
use chrono::{DateTime, Utc};
use harvest_common::Kilograms;
use harvest_engine::db_types::{DropPoint, HaulerInfo};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmerRequest {
    pub farmer_id: Option<i64>,
}

impl FarmerRequest {
    pub fn new(farmer_id: i64) -> Self {
        Self { farmer_id: Some(farmer_id) }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersRequest {
    pub farmer_id: Option<i64>,
    /// `active`, `completed` or `all`. Defaults to `all`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub order_id: String,
    pub farmer_id: Option<i64>,
}

impl OrderRequest {
    pub fn new<S: Into<String>>(order_id: S, farmer_id: i64) -> Self {
        Self { order_id: order_id.into(), farmer_id: Some(farmer_id) }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOrderRequest {
    pub order_id: String,
    pub new_status: String,
    pub actor: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub hauler: Option<HaulerInfo>,
    #[serde(default)]
    pub drop_point: Option<DropPoint>,
    #[serde(default)]
    pub eta: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delay_minutes: Option<i64>,
    #[serde(default)]
    pub delay_reason: Option<String>,
    #[serde(default)]
    pub upi_transaction_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayRequest {
    pub order_id: String,
    pub delay_minutes: i64,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub eta: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub match_id: i64,
    pub farmer_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptMatchRequest {
    pub match_id: i64,
    #[serde(default)]
    pub is_partial: bool,
    #[serde(default)]
    pub accepted_quantity: Option<Kilograms>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectMatchRequest {
    pub match_id: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsRequest {
    pub farmer_id: Option<i64>,
    /// `completed`, `pending` or `all`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub from_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub crop_type: Option<String>,
    /// `date`, `amount` or `crop`.
    #[serde(default)]
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    #[serde(default)]
    pub sort_order: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveOrderCount {
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResult {
    pub expired: usize,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn requests_deserialize_from_camel_case() {
        let json = r#"{"farmerId": 3, "status": "pending", "sortBy": "amount", "fromDate": "2024-05-01T00:00:00Z"}"#;
        let req: TransactionsRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.farmer_id, Some(3));
        assert_eq!(req.status.as_deref(), Some("pending"));
        assert_eq!(req.sort_by.as_deref(), Some("amount"));
        assert!(req.from_date.is_some());
        assert!(req.page.is_none());

        let json = r#"{"matchId": 12, "isPartial": true, "acceptedQuantity": "12.5"}"#;
        let req: AcceptMatchRequest = serde_json::from_str(json).unwrap();
        assert!(req.is_partial);
        assert_eq!(req.accepted_quantity, Some("12.5".parse().unwrap()));

        let req: FarmerRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.farmer_id, None);
    }
}
