use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_GATEWAY_NAME: &str = "EduVanz";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// One payment request. Written once by the orchestrator and never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Internal order id; the gateway calls it `collect_id`.
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub school_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trustee_id: Option<String>,
    pub student_info: StudentInfo,
    pub gateway_name: String,
    /// External-facing id handed to callers and the gateway.
    pub custom_order_id: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Order {
    pub fn new(
        school_id: String,
        trustee_id: Option<String>,
        student_info: StudentInfo,
        gateway_name: Option<String>,
    ) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            school_id,
            trustee_id,
            student_info,
            gateway_name: gateway_name.unwrap_or_else(|| DEFAULT_GATEWAY_NAME.to_string()),
            custom_order_id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> StudentInfo {
        StudentInfo {
            name: "Asha Rao".to_string(),
            id: Some("STU-12".to_string()),
            email: Some("asha@example.com".to_string()),
        }
    }

    #[test]
    fn gateway_name_defaults() {
        let order = Order::new("school-1".to_string(), None, student(), None);
        assert_eq!(order.gateway_name, DEFAULT_GATEWAY_NAME);

        let order = Order::new(
            "school-1".to_string(),
            None,
            student(),
            Some("Cashfree".to_string()),
        );
        assert_eq!(order.gateway_name, "Cashfree");
    }

    #[test]
    fn custom_order_ids_are_unique_uuids() {
        let a = Order::new("school-1".to_string(), None, student(), None);
        let b = Order::new("school-1".to_string(), None, student(), None);
        assert_ne!(a.custom_order_id, b.custom_order_id);
        assert!(Uuid::parse_str(&a.custom_order_id).is_ok());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn optional_student_fields_are_omitted_from_bson() {
        let info = StudentInfo {
            name: "Asha Rao".to_string(),
            id: None,
            email: None,
        };
        let doc = mongodb::bson::to_document(&info).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.get_str("name").unwrap(), "Asha Rao");
    }
}
