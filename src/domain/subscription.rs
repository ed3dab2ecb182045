use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::month::Month;
use crate::domain::price::Price;
use crate::domain::service_name::ServiceName;

#[derive(Debug, Clone)]
pub struct Subscription {
    pub id: Uuid,
    pub service_name: ServiceName,
    pub price: Price,
    pub user_id: Uuid,
    pub start_month: Month,
    pub end_month: Option<Month>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wire representation of a stored subscription.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub service_name: String,
    pub price: i32,
    pub user_id: Uuid,
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(subscription: Subscription) -> Self {
        SubscriptionResponse {
            id: subscription.id,
            service_name: subscription.service_name.as_ref().to_string(),
            price: subscription.price.value(),
            user_id: subscription.user_id,
            start_date: subscription.start_month.to_string(),
            end_date: subscription.end_month.map(|month| month.to_string()),
            created_at: subscription.created_at,
            updated_at: subscription.updated_at,
        }
    }
}
