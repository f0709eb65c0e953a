#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use school_payment_service::{
    build_router,
    config::{
        GatewayConfig, GatewayMode, JwtConfig, MongoConfig, PaymentConfig, RateLimitConfig,
        SchoolConfig, SecurityConfig,
    },
    models::{Order, OrderStatus, PaymentStatus, StudentInfo},
    services::{HttpGateway, PaymentDb},
    AppState,
};
use secrecy::Secret;
use serde_json::Value;
use service_core::config::{Config as CoreConfig, Environment};
use std::sync::Arc;
use tower::util::ServiceExt;
use wiremock::MockServer;

pub const TEST_SCHOOL_ID: &str = "65b0e6293e9f76a9694d84b4";
pub const TEST_PG_KEY: &str = "edvtest01";
pub const TEST_API_KEY: &str = "test-gateway-api-key";
pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
pub const COLLECT_PATH: &str = "/create-collect-request";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: PaymentDb,
    pub gateway: MockServer,
    pub config: PaymentConfig,
}

pub fn test_config(db_name: &str, gateway_url: &str) -> PaymentConfig {
    PaymentConfig {
        common: CoreConfig { port: 0 },
        environment: Environment::Dev,
        service_name: "school-payment-service-test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        mongodb: MongoConfig {
            uri: Secret::new(
                std::env::var("TEST_MONGODB_URI")
                    .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            ),
            database: db_name.to_string(),
        },
        jwt: JwtConfig {
            secret: Secret::new(TEST_JWT_SECRET.to_string()),
            expiry_seconds: 3600,
        },
        gateway: GatewayConfig {
            mode: GatewayMode::Sandbox,
            url: format!("{}{}", gateway_url, COLLECT_PATH),
            pg_key: TEST_PG_KEY.to_string(),
            api_key: Secret::new(TEST_API_KEY.to_string()),
            gateway_name: "EduVanz".to_string(),
        },
        school: SchoolConfig {
            school_id: TEST_SCHOOL_ID.to_string(),
            trustee_id: None,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        rate_limit: RateLimitConfig {
            auth_attempts: 100,
            auth_window_seconds: 60,
        },
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn with a config tweak applied before the router is built.
    pub async fn spawn_with(tweak: impl FnOnce(&mut PaymentConfig)) -> Self {
        let gateway = MockServer::start().await;
        let db_name = format!("school_payment_test_{}", uuid::Uuid::new_v4());
        let mut config = test_config(&db_name, &gateway.uri());
        tweak(&mut config);

        let db = PaymentDb::connect(
            secrecy::ExposeSecret::expose_secret(&config.mongodb.uri),
            &config.mongodb.database,
        )
        .await
        .expect("Failed to connect to MongoDB");
        db.initialize_indexes()
            .await
            .expect("Failed to initialize indexes");

        let http_gateway = Arc::new(HttpGateway::new(&config.gateway));
        let state = AppState::new(config.clone(), db.clone(), http_gateway);
        let router = build_router(state);

        TestApp {
            router,
            db,
            gateway,
            config,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).unwrap()).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, None, token).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.request(Method::POST, uri, Some(body), token).await
    }

    /// Register a fresh operator and return their bearer token.
    pub async fn login_token(&self) -> String {
        let email = format!("bursar-{}@school.test", uuid::Uuid::new_v4());
        let res = self
            .post(
                "/auth/register",
                serde_json::json!({ "email": email, "password": "fees-2024" }),
                None,
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "register failed: {}", res.text());
        res.json()["token"].as_str().unwrap().to_string()
    }

    /// Insert an order and its status directly, bypassing the gateway.
    pub async fn seed_order(
        &self,
        school_id: &str,
        order_amount: f64,
        status: PaymentStatus,
    ) -> (Order, OrderStatus) {
        let order = Order::new(
            school_id.to_string(),
            None,
            StudentInfo {
                name: "Seeded Student".to_string(),
                id: None,
                email: Some("seeded@example.com".to_string()),
            },
            None,
        );
        let mut order_status = OrderStatus::pending(order.id, order_amount);
        order_status.status = status;

        self.db.orders().insert_one(&order, None).await.unwrap();
        self.db
            .order_statuses()
            .insert_one(&order_status, None)
            .await
            .unwrap();

        (order, order_status)
    }

    pub async fn cleanup(&self) {
        self.db
            .database()
            .drop(None)
            .await
            .expect("Failed to drop test database");
    }
}
