pub mod order;
pub mod order_status;
pub mod user;
pub mod webhook_log;

pub use order::{Order, StudentInfo, DEFAULT_GATEWAY_NAME};
pub use order_status::{OrderStatus, PaymentStatus};
pub use user::User;
pub use webhook_log::WebhookLog;
