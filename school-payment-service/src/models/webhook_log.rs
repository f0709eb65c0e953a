use mongodb::bson::{oid::ObjectId, Bson, DateTime};
use serde::{Deserialize, Serialize};

/// Raw copy of an inbound gateway callback. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookLog {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Parsed JSON document, or the raw body string when it was not JSON.
    pub payload: Bson,
    pub received_at: DateTime,
}

impl WebhookLog {
    pub fn new(payload: Bson) -> Self {
        Self {
            id: ObjectId::new(),
            payload,
            received_at: DateTime::now(),
        }
    }
}
