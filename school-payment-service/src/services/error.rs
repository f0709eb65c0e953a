use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The gateway answered but declined to create a payment link.
    #[error("Gateway rejected request: {0}")]
    GatewayRejected(String),

    /// Transport failure, non-2xx reply, or a reply we could not understand.
    #[error("Gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Transaction not found")]
    TransactionNotFound,

    #[error("Transaction status not found")]
    TransactionStatusNotFound,
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(e) => AppError::from(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid email or password"))
            }
            ServiceError::UserAlreadyExists => {
                AppError::BadRequest(anyhow::anyhow!("User already exists"))
            }
            ServiceError::ValidationError(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ServiceError::GatewayRejected(message) => AppError::BadRequest(anyhow::anyhow!(message)),
            ServiceError::GatewayUnavailable(e) => {
                tracing::warn!(error = %e, "Payment gateway unavailable");
                AppError::GatewayError(anyhow::anyhow!(
                    "Payment gateway unreachable or misconfigured"
                ))
            }
            ServiceError::TransactionNotFound => {
                AppError::NotFound(anyhow::anyhow!("Transaction not found"))
            }
            ServiceError::TransactionStatusNotFound => {
                AppError::NotFound(anyhow::anyhow!("Transaction status not found"))
            }
        }
    }
}
