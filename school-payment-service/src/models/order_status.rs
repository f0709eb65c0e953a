use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] = [
        PaymentStatus::Pending,
        PaymentStatus::Success,
        PaymentStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; gateways report `SUCCESS`, `Success` and `success` interchangeably.
impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "success" => Ok(PaymentStatus::Success),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(format!("Unsupported payment status: {}", other)),
        }
    }
}

/// Latest known payment state of an [`Order`](super::Order), one per order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatus {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// `_id` of the owning order.
    pub collect_id: ObjectId,
    pub order_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_amount: Option<f64>,
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_time: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl OrderStatus {
    pub fn pending(collect_id: ObjectId, order_amount: f64) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            collect_id,
            order_amount,
            transaction_amount: None,
            status: PaymentStatus::Pending,
            payment_mode: None,
            payment_details: None,
            bank_reference: None,
            payment_message: None,
            error_message: None,
            payment_time: None,
            created_at: now,
            updated_at: now,
        }
    }
}
