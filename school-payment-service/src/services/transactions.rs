use crate::{
    dtos::transactions::{
        TransactionPage, TransactionQuery, TransactionRow, TransactionStatusResponse,
    },
    models::PaymentStatus,
    services::{PaymentDb, ServiceError},
};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use serde::Deserialize;

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    PaymentTime,
    OrderAmount,
    TransactionAmount,
    Status,
    SchoolId,
    CustomOrderId,
}

impl SortField {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "createdAt" | "created_at" => Some(SortField::CreatedAt),
            "payment_time" => Some(SortField::PaymentTime),
            "order_amount" => Some(SortField::OrderAmount),
            "transaction_amount" => Some(SortField::TransactionAmount),
            "status" => Some(SortField::Status),
            "school_id" => Some(SortField::SchoolId),
            "custom_order_id" => Some(SortField::CustomOrderId),
            _ => None,
        }
    }

    /// Path of the field in a joined `order_statuses` + `order` document.
    fn path(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::PaymentTime => "payment_time",
            SortField::OrderAmount => "order_amount",
            SortField::TransactionAmount => "transaction_amount",
            SortField::Status => "status",
            SortField::SchoolId => "order.school_id",
            SortField::CustomOrderId => "order.custom_order_id",
        }
    }
}

/// Validated listing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub page: u64,
    pub limit: u64,
    pub sort: SortField,
    /// 1 ascending, -1 descending.
    pub direction: i32,
    pub statuses: Vec<PaymentStatus>,
    pub school_ids: Vec<String>,
    /// Documents skipped before the page; always representable as a BSON `Int64`.
    pub skip: i64,
}

impl ListParams {
    pub fn from_query(query: TransactionQuery) -> Result<Self, ServiceError> {
        let page = parse_positive(query.page.as_deref(), "page")?.unwrap_or(1);
        let limit = parse_positive(query.limit.as_deref(), "limit")?
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        let skip = (page - 1)
            .checked_mul(limit)
            .and_then(|skip| i64::try_from(skip).ok())
            .ok_or_else(|| ServiceError::ValidationError("page is out of range".to_string()))?;

        let sort = match blank_to_none(query.sort_by.as_deref()) {
            None => SortField::CreatedAt,
            Some(raw) => SortField::parse(raw).ok_or_else(|| {
                ServiceError::ValidationError(format!("Unsupported sortBy field: {}", raw))
            })?,
        };

        let direction = match blank_to_none(query.order.as_deref()).map(str::to_lowercase) {
            None => -1,
            Some(order) if order == "desc" => -1,
            Some(order) if order == "asc" => 1,
            Some(order) => {
                return Err(ServiceError::ValidationError(format!(
                    "order must be 'asc' or 'desc', got '{}'",
                    order
                )))
            }
        };

        let statuses = split_list(query.status.as_deref())
            .into_iter()
            .map(|s| {
                s.parse::<PaymentStatus>()
                    .map_err(|_| ServiceError::ValidationError(format!("Unsupported status: {}", s)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            page,
            limit,
            sort,
            direction,
            statuses,
            school_ids: split_list(query.school_id.as_deref()),
            skip,
        })
    }

    fn match_stage(&self) -> Document {
        let mut filter = Document::new();
        if !self.statuses.is_empty() {
            let values: Vec<&str> = self.statuses.iter().map(|s| s.as_str()).collect();
            filter.insert("status", doc! { "$in": values });
        }
        if !self.school_ids.is_empty() {
            filter.insert("order.school_id", doc! { "$in": self.school_ids.clone() });
        }
        filter
    }

    /// Join statuses to orders, filter, then count and page in a single `$facet`.
    pub fn pipeline(&self) -> Vec<Document> {
        let mut sort = Document::new();
        sort.insert(self.sort.path(), self.direction);
        sort.insert("_id", self.direction);
        let skip = self.skip;
        let limit = self.limit as i64;

        vec![
            doc! { "$lookup": {
                "from": "orders",
                "localField": "collect_id",
                "foreignField": "_id",
                "as": "order",
            } },
            doc! { "$unwind": "$order" },
            doc! { "$match": self.match_stage() },
            doc! { "$facet": {
                "metadata": [ { "$count": "total" } ],
                "data": [
                    { "$sort": sort },
                    { "$skip": skip },
                    { "$limit": limit },
                    { "$project": {
                        "_id": 0,
                        "collect_id": "$collect_id",
                        "school_id": "$order.school_id",
                        "gateway": "$order.gateway_name",
                        "order_amount": 1,
                        "transaction_amount": 1,
                        "status": 1,
                        "custom_order_id": "$order.custom_order_id",
                    } },
                ],
            } },
        ]
    }
}

/// Row as projected by the pipeline, before `collect_id` becomes hex.
#[derive(Debug, Deserialize)]
struct ProjectedRow {
    collect_id: ObjectId,
    school_id: String,
    gateway: String,
    order_amount: f64,
    #[serde(default)]
    transaction_amount: Option<f64>,
    status: PaymentStatus,
    custom_order_id: String,
}

impl From<ProjectedRow> for TransactionRow {
    fn from(row: ProjectedRow) -> Self {
        TransactionRow {
            collect_id: row.collect_id.to_hex(),
            school_id: row.school_id,
            gateway: row.gateway,
            order_amount: row.order_amount,
            transaction_amount: row.transaction_amount,
            status: row.status,
            custom_order_id: row.custom_order_id,
        }
    }
}

#[derive(Clone)]
pub struct TransactionService {
    db: PaymentDb,
}

impl TransactionService {
    pub fn new(db: PaymentDb) -> Self {
        Self { db }
    }

    pub async fn list(&self, params: &ListParams) -> Result<TransactionPage, ServiceError> {
        let results: Vec<Document> = self
            .db
            .order_statuses()
            .aggregate(params.pipeline(), None)
            .await?
            .try_collect()
            .await?;

        let facet = results.into_iter().next().unwrap_or_default();
        let total = facet_total(&facet);

        let data = match facet.get_array("data") {
            Ok(rows) => rows
                .iter()
                .filter_map(Bson::as_document)
                .map(|row| {
                    mongodb::bson::from_document::<ProjectedRow>(row.clone())
                        .map(TransactionRow::from)
                        .map_err(|e| {
                            ServiceError::Internal(anyhow::anyhow!(
                                "Malformed transaction row: {}",
                                e
                            ))
                        })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Err(_) => Vec::new(),
        };

        Ok(TransactionPage {
            total,
            page: params.page,
            limit: params.limit,
            pages: page_count(total, params.limit),
            data,
        })
    }

    pub async fn status(
        &self,
        custom_order_id: &str,
    ) -> Result<TransactionStatusResponse, ServiceError> {
        let order = self
            .db
            .orders()
            .find_one(doc! { "custom_order_id": custom_order_id }, None)
            .await?
            .ok_or(ServiceError::TransactionNotFound)?;

        let status = self
            .db
            .order_statuses()
            .find_one(doc! { "collect_id": order.id }, None)
            .await?
            .ok_or(ServiceError::TransactionStatusNotFound)?;

        Ok(TransactionStatusResponse {
            custom_order_id: order.custom_order_id,
            status: status.status,
            order_amount: status.order_amount,
            transaction_amount: status.transaction_amount,
            payment_time: status.payment_time.map(|t| t.to_chrono()),
        })
    }
}

fn facet_total(facet: &Document) -> u64 {
    facet
        .get_array("metadata")
        .ok()
        .and_then(|m| m.first())
        .and_then(Bson::as_document)
        .and_then(|m| match m.get("total") {
            Some(Bson::Int32(n)) => Some(*n as u64),
            Some(Bson::Int64(n)) => Some(*n as u64),
            _ => None,
        })
        .unwrap_or(0)
}

pub fn page_count(total: u64, limit: u64) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit)
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_positive(raw: Option<&str>, name: &str) -> Result<Option<u64>, ServiceError> {
    match blank_to_none(raw) {
        None => Ok(None),
        Some(v) => match v.parse::<u64>() {
            Ok(n) if n >= 1 => Ok(Some(n)),
            _ => Err(ServiceError::ValidationError(format!(
                "{} must be a positive integer",
                name
            ))),
        },
    }
}

/// Comma-separated values, trimmed, blanks dropped.
fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
