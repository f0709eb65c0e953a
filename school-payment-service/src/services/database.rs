use crate::models::{Order, OrderStatus, User, WebhookLog};
use mongodb::{
    bson::doc, options::IndexOptions, Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct PaymentDb {
    client: MongoClient,
    db: Database,
}

impl PaymentDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for school-payment-service");

        create_index(&self.users(), doc! { "email": 1 }, "email_unique_idx", true).await?;

        let orders = self.orders();
        create_index(
            &orders,
            doc! { "custom_order_id": 1 },
            "custom_order_id_unique_idx",
            true,
        )
        .await?;
        create_index(&orders, doc! { "school_id": 1 }, "school_id_idx", false).await?;

        let statuses = self.order_statuses();
        create_index(&statuses, doc! { "collect_id": 1 }, "collect_id_unique_idx", true).await?;
        create_index(&statuses, doc! { "status": 1 }, "status_idx", false).await?;
        create_index(&statuses, doc! { "created_at": -1 }, "created_at_idx", false).await?;

        create_index(
            &self.webhook_logs(),
            doc! { "received_at": -1 },
            "received_at_idx",
            false,
        )
        .await?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn orders(&self) -> Collection<Order> {
        self.db.collection("orders")
    }

    pub fn order_statuses(&self) -> Collection<OrderStatus> {
        self.db.collection("order_statuses")
    }

    pub fn webhook_logs(&self) -> Collection<WebhookLog> {
        self.db.collection("webhook_logs")
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

async fn create_index<T>(
    collection: &Collection<T>,
    keys: mongodb::bson::Document,
    name: &str,
    unique: bool,
) -> Result<(), AppError>
where
    T: Send + Sync,
{
    let index = IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .name(name.to_string())
                .unique(unique)
                .build(),
        )
        .build();

    collection.create_index(index, None).await.map_err(|e| {
        tracing::error!(index = %name, "Failed to create index: {}", e);
        AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
    })?;
    Ok(())
}

/// True when a write failed on a unique index.
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == 11000,
        ErrorKind::Command(e) => e.code == 11000,
        _ => false,
    }
}
