pub mod auth;
pub mod database;
pub mod error;
pub mod gateway;
pub mod jwt;
pub mod metrics;
pub mod payment;
pub mod transactions;
pub mod webhook;

pub use auth::AuthService;
pub use database::PaymentDb;
pub use error::ServiceError;
pub use gateway::{HttpGateway, PaymentGateway};
pub use jwt::{AccessTokenClaims, JwtService};
pub use metrics::{get_metrics, init_metrics};
pub use payment::PaymentService;
pub use transactions::TransactionService;
pub use webhook::WebhookService;
