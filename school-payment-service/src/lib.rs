pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, RequestId},
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::PaymentConfig;
use crate::services::{
    AuthService, JwtService, PaymentDb, PaymentGateway, PaymentService, TransactionService,
    WebhookService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: PaymentConfig,
    pub db: PaymentDb,
    pub jwt: JwtService,
    pub auth_service: AuthService,
    pub payment_service: PaymentService,
    pub webhook_service: WebhookService,
    pub transaction_service: TransactionService,
    pub auth_rate_limiter: IpRateLimiter,
}

impl AppState {
    pub fn new(config: PaymentConfig, db: PaymentDb, gateway: Arc<dyn PaymentGateway>) -> Self {
        let jwt = JwtService::new(&config.jwt);

        Self {
            auth_service: AuthService::new(db.clone(), jwt.clone()),
            payment_service: PaymentService::new(
                db.clone(),
                gateway,
                config.school.clone(),
                config.gateway.gateway_name.clone(),
            ),
            webhook_service: WebhookService::new(db.clone()),
            transaction_service: TransactionService::new(db.clone()),
            auth_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.auth_attempts,
                config.rate_limit.auth_window_seconds,
            ),
            jwt,
            db,
            config,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .layer(from_fn_with_state(
            state.auth_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let protected_routes = Router::new()
        .route("/payment/create", post(handlers::payment::create_payment))
        .route(
            "/transactions",
            get(handlers::transactions::list_transactions),
        )
        .route(
            "/transactions/school/:school_id",
            get(handlers::transactions::list_school_transactions),
        )
        .route(
            "/transactions/status/:custom_order_id",
            get(handlers::transactions::get_transaction_status),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        // Called by the gateway, so no bearer token.
        .route("/payment/webhook", post(handlers::payment::webhook))
        .merge(auth_routes)
        .merge(protected_routes)
        .with_state(state.clone())
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .extensions()
                    .get::<RequestId>()
                    .map(|id| id.0.as_str())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config.security.allowed_origins))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed_origins.iter().filter_map(|origin| {
            match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::error!("Ignoring invalid CORS origin '{}': {}", origin, e);
                    None
                }
            }
        }))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
