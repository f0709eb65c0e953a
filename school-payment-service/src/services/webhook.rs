use crate::{
    models::{PaymentStatus, WebhookLog},
    services::{metrics::record_webhook, PaymentDb, ServiceError},
};
use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use serde_json::{Map, Value};

/// Fields of a gateway callback that update an order's status.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookUpdate {
    pub order_id: String,
    pub status: Option<PaymentStatus>,
    pub transaction_amount: Option<f64>,
    pub bank_reference: Option<String>,
    pub payment_message: Option<String>,
    pub payment_mode: Option<String>,
    pub payment_details: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    Updated { order_id: String },
    UnknownOrder { order_id: String },
}

impl WebhookOutcome {
    pub fn message(&self) -> String {
        match self {
            WebhookOutcome::Updated { .. } => "Webhook received successfully.".to_string(),
            WebhookOutcome::UnknownOrder { order_id } => format!(
                "Order with collect_id {} not found, but webhook acknowledged.",
                order_id
            ),
        }
    }
}

#[derive(Clone)]
pub struct WebhookService {
    db: PaymentDb,
}

impl WebhookService {
    pub fn new(db: PaymentDb) -> Self {
        Self { db }
    }

    /// Log the raw callback, then apply it to the matching order status.
    pub async fn handle(&self, body: &[u8]) -> Result<WebhookOutcome, ServiceError> {
        let parsed = serde_json::from_slice::<Value>(body).ok();

        let payload = audit_payload(parsed.as_ref(), body);

        self.db
            .webhook_logs()
            .insert_one(WebhookLog::new(payload), None)
            .await?;

        let update = match parsed {
            Some(Value::Object(map)) => parse_update(&map),
            _ => Err(ServiceError::ValidationError(
                "Malformed webhook payload".to_string(),
            )),
        }
        .inspect_err(|e| {
            tracing::warn!(error = %e, "Rejected webhook payload");
            record_webhook("invalid");
        })?;

        let outcome = self.apply(update).await?;
        match &outcome {
            WebhookOutcome::Updated { order_id } => {
                tracing::info!(collect_id = %order_id, "Order status updated from webhook");
                record_webhook("updated");
            }
            WebhookOutcome::UnknownOrder { order_id } => {
                tracing::warn!(collect_id = %order_id, "Webhook received for unknown order");
                record_webhook("unknown_order");
            }
        }

        Ok(outcome)
    }

    async fn apply(&self, update: WebhookUpdate) -> Result<WebhookOutcome, ServiceError> {
        let Ok(collect_id) = ObjectId::parse_str(&update.order_id) else {
            return Ok(WebhookOutcome::UnknownOrder {
                order_id: update.order_id,
            });
        };

        let result = self
            .db
            .order_statuses()
            .update_one(
                doc! { "collect_id": collect_id },
                doc! { "$set": update_document(&update, DateTime::now()) },
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Ok(WebhookOutcome::UnknownOrder {
                order_id: update.order_id,
            });
        }

        Ok(WebhookOutcome::Updated {
            order_id: update.order_id,
        })
    }
}

/// What goes into `webhook_logs`: the JSON object as a document when BSON can hold it,
/// otherwise the raw body text.
pub fn audit_payload(parsed: Option<&Value>, body: &[u8]) -> Bson {
    let raw = || Bson::String(String::from_utf8_lossy(body).into_owned());
    match parsed {
        Some(value @ Value::Object(_)) => mongodb::bson::to_bson(value).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Webhook payload not representable as BSON; logging raw body");
            raw()
        }),
        _ => raw(),
    }
}

/// Pull the status update out of a callback body.
pub fn parse_update(payload: &Map<String, Value>) -> Result<WebhookUpdate, ServiceError> {
    let order_id = text(payload.get("order_id")).ok_or_else(|| {
        ServiceError::ValidationError("Webhook received without order_id.".to_string())
    })?;

    let status = match text(payload.get("status")) {
        Some(raw) => Some(raw.parse::<PaymentStatus>().map_err(|_| {
            ServiceError::ValidationError("Unsupported payment status".to_string())
        })?),
        None => None,
    };

    Ok(WebhookUpdate {
        order_id,
        status,
        transaction_amount: amount(payload.get("transaction_amount")),
        bank_reference: text(payload.get("bank_ref_num")),
        payment_message: text(payload.get("message")),
        payment_mode: text(payload.get("payment_mode")),
        payment_details: text(payload.get("payment_details")),
    })
}

/// `$set` body for an update. Absent fields are left untouched.
pub fn update_document(update: &WebhookUpdate, now: DateTime) -> Document {
    let mut set = doc! {
        "payment_time": now,
        "updated_at": now,
    };
    if let Some(status) = update.status {
        set.insert("status", status.as_str());
    }
    if let Some(amount) = update.transaction_amount {
        set.insert("transaction_amount", amount);
    }
    if let Some(v) = &update.bank_reference {
        set.insert("bank_reference", v.as_str());
    }
    if let Some(v) = &update.payment_message {
        set.insert("payment_message", v.as_str());
    }
    if let Some(v) = &update.payment_mode {
        set.insert("payment_mode", v.as_str());
    }
    if let Some(v) = &update.payment_details {
        set.insert("payment_details", v.as_str());
    }
    set
}

/// Non-empty string form of a scalar; objects are kept as their JSON text.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        other => Some(other.to_string()),
    }
}

fn amount(value: Option<&Value>) -> Option<f64> {
    let amount = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    amount.filter(|a| a.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn validation_message(result: Result<WebhookUpdate, ServiceError>) -> String {
        match result {
            Err(ServiceError::ValidationError(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn parses_full_payload() {
        let update = parse_update(&object(json!({
            "order_id": "65f1c0d2a1b2c3d4e5f60718",
            "status": "SUCCESS",
            "transaction_amount": 1520.5,
            "bank_ref_num": "YESB0001",
            "message": "payment success",
            "payment_mode": "upi",
            "payment_details": "success@ybl"
        })))
        .unwrap();

        assert_eq!(update.order_id, "65f1c0d2a1b2c3d4e5f60718");
        assert_eq!(update.status, Some(PaymentStatus::Success));
        assert_eq!(update.transaction_amount, Some(1520.5));
        assert_eq!(update.bank_reference.as_deref(), Some("YESB0001"));
        assert_eq!(update.payment_message.as_deref(), Some("payment success"));
        assert_eq!(update.payment_mode.as_deref(), Some("upi"));
    }

    #[test]
    fn order_id_is_required() {
        for payload in [
            json!({ "status": "success" }),
            json!({ "order_id": null }),
            json!({ "order_id": "" }),
        ] {
            assert_eq!(
                validation_message(parse_update(&object(payload))),
                "Webhook received without order_id."
            );
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result = parse_update(&object(json!({ "order_id": "abc", "status": "refunded" })));
        assert_eq!(validation_message(result), "Unsupported payment status");
    }

    #[test]
    fn numeric_order_id_is_stringified() {
        let update = parse_update(&object(json!({ "order_id": 42 }))).unwrap();
        assert_eq!(update.order_id, "42");
        assert!(update.status.is_none());
    }

    #[test]
    fn update_document_only_sets_present_fields() {
        let update = parse_update(&object(json!({
            "order_id": "65f1c0d2a1b2c3d4e5f60718",
            "status": "Failed",
            "transaction_amount": "99.5"
        })))
        .unwrap();
        let now = DateTime::now();
        let set = update_document(&update, now);

        assert_eq!(set.get_str("status").unwrap(), "failed");
        assert_eq!(set.get_f64("transaction_amount").unwrap(), 99.5);
        assert_eq!(set.get_datetime("payment_time").unwrap(), &now);
        assert!(!set.contains_key("bank_reference"));
        assert!(!set.contains_key("payment_mode"));
    }

    #[test]
    fn audit_payload_keeps_objects_as_documents() {
        let body = br#"{"order_id":"abc","status":"success"}"#;
        let parsed: Value = serde_json::from_slice(body).unwrap();
        match audit_payload(Some(&parsed), body) {
            Bson::Document(doc) => assert_eq!(doc.get_str("order_id").unwrap(), "abc"),
            other => panic!("expected document, got {:?}", other),
        }
    }

    #[test]
    fn audit_payload_falls_back_to_raw_text_when_bson_cannot_hold_it() {
        let body = br#"{"order_id":"abc","transaction_amount":18446744073709551615}"#;
        let parsed: Value = serde_json::from_slice(body).unwrap();
        assert_eq!(
            audit_payload(Some(&parsed), body),
            Bson::String(String::from_utf8_lossy(body).into_owned())
        );
        assert_eq!(
            audit_payload(None, b"not json"),
            Bson::String("not json".to_string())
        );
    }

    #[test]
    fn unknown_order_message_names_the_id() {
        let outcome = WebhookOutcome::UnknownOrder {
            order_id: "abc".to_string(),
        };
        assert_eq!(
            outcome.message(),
            "Order with collect_id abc not found, but webhook acknowledged."
        );
    }
}
