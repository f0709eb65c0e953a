//! Payment gateway client.
//!
//! The gateway's collect-request API takes a single JWT, signed with the
//! merchant API key, wrapped as `{"data": "<jwt>"}`. A successful reply
//! carries the hosted payment page URL in `data`.

use crate::config::GatewayConfig;
use crate::services::error::ServiceError;
use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

/// What the orchestrator asks the gateway to collect.
#[derive(Debug, Clone)]
pub struct CollectRequest {
    pub school_id: String,
    /// Hex ObjectId of the order; echoed back as `order_id` in webhooks.
    pub collect_id: String,
    pub custom_order_id: String,
    pub order_amount: f64,
}

/// Claims of the signed collect payload. Carries no `exp`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectClaims {
    pub pg_key: String,
    pub school_id: String,
    pub collect_id: String,
    pub custom_order_id: String,
    /// Stringified amount, e.g. `"1500"` or `"1500.5"`.
    pub order_amount: String,
}

#[derive(Debug, Serialize)]
struct CollectEnvelope<'a> {
    data: &'a str,
}

/// Body of a 2xx gateway reply. Every field is optional; the gateway is loose about shape.
#[derive(Debug, Deserialize)]
struct CollectReply {
    status: Option<String>,
    data: Option<serde_json::Value>,
    message: Option<serde_json::Value>,
}

/// Result of a collect request the gateway understood.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayOutcome {
    /// Hosted payment page the student should be sent to.
    PaymentLink(String),
    /// The gateway declined; carries its message when it gave one.
    Rejected(Option<String>),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// `Err(GatewayUnavailable)` for anything other than a well-formed answer.
    async fn create_collect_request(
        &self,
        request: &CollectRequest,
    ) -> Result<GatewayOutcome, ServiceError>;
}

/// HTTP implementation backed by `reqwest`.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    url: String,
    pg_key: String,
    api_key: Secret<String>,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            client: Client::new(),
            url: config.url.clone(),
            pg_key: config.pg_key.clone(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn claims(&self, request: &CollectRequest) -> CollectClaims {
        CollectClaims {
            pg_key: self.pg_key.clone(),
            school_id: request.school_id.clone(),
            collect_id: request.collect_id.clone(),
            custom_order_id: request.custom_order_id.clone(),
            order_amount: format_amount(request.order_amount),
        }
    }

    /// HS256-sign the collect claims with the merchant API key.
    pub fn sign(&self, claims: &CollectClaims) -> Result<String, ServiceError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(self.api_key.expose_secret().as_bytes()),
        )
        .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Failed to sign collect payload: {}", e)))
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn create_collect_request(
        &self,
        request: &CollectRequest,
    ) -> Result<GatewayOutcome, ServiceError> {
        let signed = self.sign(&self.claims(request))?;

        let response = self
            .client
            .post(&self.url)
            .json(&CollectEnvelope { data: &signed })
            .send()
            .await
            .map_err(|e| ServiceError::GatewayUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::GatewayUnavailable(format!("failed to read body: {}", e)))?;

        tracing::debug!(
            status = %status,
            collect_id = %request.collect_id,
            "Gateway collect-request response"
        );

        if !status.is_success() {
            return Err(ServiceError::GatewayUnavailable(format!(
                "gateway returned {}: {}",
                status, body
            )));
        }

        let reply: CollectReply = serde_json::from_str(&body).map_err(|e| {
            ServiceError::GatewayUnavailable(format!("unparsable gateway reply: {}", e))
        })?;

        interpret_reply(reply)
    }
}

fn interpret_reply(reply: CollectReply) -> Result<GatewayOutcome, ServiceError> {
    if reply.status.as_deref() == Some("Success") {
        return match reply.data {
            Some(serde_json::Value::String(url)) if !url.is_empty() => {
                Ok(GatewayOutcome::PaymentLink(url))
            }
            _ => Err(ServiceError::GatewayUnavailable(
                "gateway reported success without a payment URL".to_string(),
            )),
        };
    }

    let message = match reply.message {
        Some(serde_json::Value::String(m)) if !m.trim().is_empty() => Some(m),
        Some(serde_json::Value::Null) | None => None,
        Some(serde_json::Value::String(_)) => None,
        Some(other) => Some(other.to_string()),
    };

    Ok(GatewayOutcome::Rejected(message))
}

/// Render an amount the way the gateway expects: no trailing `.0` for whole numbers.
pub fn format_amount(amount: f64) -> String {
    format!("{}", amount)
}
