use crate::{
    config::SchoolConfig,
    dtos::payment::{
        parse_amount, CreatePaymentRequest, CreatePaymentResponse, StudentInfoInput,
        INVALID_AMOUNT, MISSING_FIELDS,
    },
    models::{Order, OrderStatus, PaymentStatus, StudentInfo},
    services::{
        gateway::{CollectRequest, GatewayOutcome, PaymentGateway},
        metrics::record_payment_request,
        PaymentDb, ServiceError,
    },
};
use mongodb::bson::{doc, DateTime};
use std::sync::Arc;

/// Typed form of a validated create-payment body.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPayment {
    pub student_info: StudentInfo,
    pub order_amount: f64,
}

/// Creates orders and asks the gateway for a payment link.
#[derive(Clone)]
pub struct PaymentService {
    db: PaymentDb,
    gateway: Arc<dyn PaymentGateway>,
    school: SchoolConfig,
    gateway_name: String,
}

impl PaymentService {
    pub fn new(
        db: PaymentDb,
        gateway: Arc<dyn PaymentGateway>,
        school: SchoolConfig,
        gateway_name: String,
    ) -> Self {
        Self {
            db,
            gateway,
            school,
            gateway_name,
        }
    }

    pub async fn create_payment(
        &self,
        req: CreatePaymentRequest,
    ) -> Result<CreatePaymentResponse, ServiceError> {
        let payment = into_valid(req).inspect_err(|_| record_payment_request("invalid"))?;

        let order = Order::new(
            self.school.school_id.clone(),
            self.school.trustee_id.clone(),
            payment.student_info,
            Some(self.gateway_name.clone()),
        );
        let status = OrderStatus::pending(order.id, payment.order_amount);

        self.persist(&order, &status)
            .await
            .inspect_err(|_| record_payment_request("storage_error"))?;

        tracing::info!(
            collect_id = %order.id,
            custom_order_id = %order.custom_order_id,
            order_amount = payment.order_amount,
            "Order created, requesting payment link"
        );

        let request = CollectRequest {
            school_id: order.school_id.clone(),
            collect_id: order.id.to_hex(),
            custom_order_id: order.custom_order_id.clone(),
            order_amount: payment.order_amount,
        };

        let outcome = match self.gateway.create_collect_request(&request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    collect_id = %order.id,
                    error = %e,
                    "Gateway call failed; order left pending for reconciliation"
                );
                record_payment_request("gateway_error");
                return Err(e);
            }
        };

        match outcome {
            GatewayOutcome::PaymentLink(payment_url) => {
                record_payment_request("created");
                Ok(CreatePaymentResponse { payment_url })
            }
            GatewayOutcome::Rejected(message) => {
                tracing::warn!(
                    collect_id = %order.id,
                    message = ?message,
                    "Gateway rejected collect request"
                );
                self.mark_failed(&order, message.as_deref().unwrap_or("Gateway error"))
                    .await?;
                record_payment_request("rejected");
                Err(ServiceError::GatewayRejected(
                    message.unwrap_or_else(|| "Failed to create payment link".to_string()),
                ))
            }
        }
    }

    /// Order first, then its status. A failed status write rolls the order back on a best-effort basis.
    async fn persist(&self, order: &Order, status: &OrderStatus) -> Result<(), ServiceError> {
        self.db.orders().insert_one(order, None).await?;

        if let Err(e) = self.db.order_statuses().insert_one(status, None).await {
            tracing::error!(collect_id = %order.id, error = %e, "Failed to persist order status");
            if let Err(cleanup) = self
                .db
                .orders()
                .delete_one(doc! { "_id": order.id }, None)
                .await
            {
                tracing::error!(
                    collect_id = %order.id,
                    error = %cleanup,
                    "Failed to remove orphaned order"
                );
            }
            return Err(ServiceError::Database(e));
        }

        Ok(())
    }

    async fn mark_failed(&self, order: &Order, error_message: &str) -> Result<(), ServiceError> {
        self.db
            .order_statuses()
            .update_one(
                doc! { "collect_id": order.id },
                doc! { "$set": {
                    "status": PaymentStatus::Failed.as_str(),
                    "error_message": error_message,
                    "updated_at": DateTime::now(),
                } },
                None,
            )
            .await?;
        Ok(())
    }
}

/// Pull the typed values out of a request that passed its `validator` rules.
///
/// Anything still missing here is reported with the same message the rules use.
pub fn into_valid(req: CreatePaymentRequest) -> Result<ValidPayment, ServiceError> {
    let missing = || ServiceError::ValidationError(MISSING_FIELDS.to_string());

    let StudentInfoInput { name, id, email } = req.student_info.ok_or_else(missing)?;
    let name = non_blank(name).ok_or_else(missing)?;
    let email = non_blank(email).ok_or_else(missing)?;

    let order_amount = req.order_amount.as_ref().ok_or_else(missing)?;
    let order_amount = parse_amount(order_amount)
        .filter(|amount| *amount > 0.0)
        .ok_or_else(|| ServiceError::ValidationError(INVALID_AMOUNT.to_string()))?;

    Ok(ValidPayment {
        student_info: StudentInfo {
            name,
            id: non_blank(id),
            email: Some(email),
        },
        order_amount,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
