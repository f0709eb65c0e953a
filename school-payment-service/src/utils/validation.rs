use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use validator::Validate;

use crate::utils::extract::JsonBody;

/// JSON body that must also pass its `validator` rules.
///
/// Parse failures and rule failures both render as a 400 `{"error": ...}`
/// carrying the rule's message.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(value) = JsonBody::<T>::from_request(req, state).await?;

        value.validate().map_err(|e| {
            tracing::debug!(errors = %e, "Request body failed validation");
            AppError::from(e)
        })?;

        Ok(ValidatedJson(value))
    }
}
