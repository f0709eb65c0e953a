use crate::{
    dtos::auth::{AuthResponse, CredentialsRequest, CREDENTIALS_REQUIRED},
    models::{user::normalize_email, User},
    services::{database::is_duplicate_key, JwtService, PaymentDb, ServiceError},
    utils::password::{hash_password, verify_password, Password},
};
use mongodb::bson::doc;

#[derive(Clone)]
pub struct AuthService {
    db: PaymentDb,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(db: PaymentDb, jwt: JwtService) -> Self {
        Self { db, jwt }
    }

    pub async fn register(&self, req: CredentialsRequest) -> Result<AuthResponse, ServiceError> {
        let (email, password) = credentials(req)?;

        if self
            .db
            .users()
            .find_one(doc! { "email": &email }, None)
            .await?
            .is_some()
        {
            return Err(ServiceError::UserAlreadyExists);
        }

        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Hashing task failed: {}", e)))??;

        let user = User::new(email, password_hash);

        // The unique index catches a concurrent registration of the same address.
        self.db
            .users()
            .insert_one(&user, None)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    ServiceError::UserAlreadyExists
                } else {
                    ServiceError::Database(e)
                }
            })?;

        tracing::info!(user_id = %user.id, "User registered");

        self.respond(&user)
    }

    pub async fn login(&self, req: CredentialsRequest) -> Result<AuthResponse, ServiceError> {
        let (email, password) = credentials(req).map_err(|_| ServiceError::InvalidCredentials)?;

        let user = self
            .db
            .users()
            .find_one(doc! { "email": &email }, None)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        let stored_hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Verify task failed: {}", e)))??;

        if !matches {
            tracing::info!(user_id = %user.id, "Login rejected: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "User logged in");

        self.respond(&user)
    }

    fn respond(&self, user: &User) -> Result<AuthResponse, ServiceError> {
        let token = self.jwt.generate_access_token(&user.id, &user.email)?;

        Ok(AuthResponse {
            id: user.id.clone(),
            email: user.email.clone(),
            token,
        })
    }
}

/// Normalized email plus password. Register has already run the request rules; login has not,
/// so blank values are still treated as missing here.
fn credentials(req: CredentialsRequest) -> Result<(String, Password), ServiceError> {
    let email = req
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty());
    let password = req.password.filter(|p| !p.trim().is_empty());

    match (email, password) {
        (Some(email), Some(password)) => Ok((email, Password::new(password))),
        _ => Err(ServiceError::ValidationError(
            CREDENTIALS_REQUIRED.to_string(),
        )),
    }
}
