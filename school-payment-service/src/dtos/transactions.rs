use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PaymentStatus;

/// Raw query string of the listing endpoints. Kept as strings so bad values
/// surface as our own 400 rather than an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "sortBy", alias = "sort_by")]
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "schoolId", alias = "school_id")]
    pub school_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TransactionRow {
    pub collect_id: String,
    pub school_id: String,
    pub gateway: String,
    pub order_amount: f64,
    pub transaction_amount: Option<f64>,
    pub status: PaymentStatus,
    pub custom_order_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionPage {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
    pub data: Vec<TransactionRow>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionStatusResponse {
    pub custom_order_id: String,
    pub status: PaymentStatus,
    pub order_amount: f64,
    pub transaction_amount: Option<f64>,
    pub payment_time: Option<DateTime<Utc>>,
}
