use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub const MISSING_FIELDS: &str = "Missing required fields";
pub const INVALID_AMOUNT: &str = "order_amount must be a positive number";

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct StudentInfoInput {
    #[serde(default)]
    #[validate(
        required(message = "Missing required fields"),
        custom(function = "not_blank")
    )]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    #[validate(
        required(message = "Missing required fields"),
        custom(function = "not_blank")
    )]
    pub email: Option<String>,
}

/// `order_amount` is accepted as a JSON number or a numeric string.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    #[serde(default)]
    #[validate(required(message = "Missing required fields"), nested)]
    pub student_info: Option<StudentInfoInput>,
    #[serde(default)]
    #[validate(
        required(message = "Missing required fields"),
        custom(function = "positive_amount")
    )]
    pub order_amount: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePaymentResponse {
    pub payment_url: String,
}

/// Numeric value of an amount given as a number or a numeric string.
pub fn parse_amount(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|amount| amount.is_finite())
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(rule("blank", MISSING_FIELDS));
    }
    Ok(())
}

/// `null` and blank strings count as missing; anything else must parse to a value above zero.
fn positive_amount(value: &serde_json::Value) -> Result<(), ValidationError> {
    match value {
        serde_json::Value::Null => Err(rule("required", MISSING_FIELDS)),
        serde_json::Value::String(s) if s.trim().is_empty() => {
            Err(rule("required", MISSING_FIELDS))
        }
        _ => match parse_amount(value) {
            Some(amount) if amount > 0.0 => Ok(()),
            _ => Err(rule("range", INVALID_AMOUNT)),
        },
    }
}

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}
