pub mod auth;
pub mod payment;
pub mod transactions;
