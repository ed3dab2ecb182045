use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    month::Month,
    new_subscription::{NewSubscription, SubscriptionBody},
    service_name::ServiceName,
    subscription::SubscriptionResponse,
};
use crate::storage::{
    filter::SubscriptionFilter,
    subscriptions::{
        delete_subscription, get_subscription, insert_subscription, list_subscriptions,
        summarize_subscriptions, update_subscription, SummaryFilter,
    },
    QueryTimeout, StoreError,
};

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 200;

#[derive(Deserialize, Debug)]
pub struct ListParameters {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub user_id: Option<String>,
    pub service_name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SummaryParameters {
    pub from: Option<String>,
    pub to: Option<String>,
    pub user_id: Option<String>,
    pub service_name: Option<String>,
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct CreatedSubscription {
    pub id: Uuid,
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct SummaryResponse {
    pub total: i64,
}

#[derive(thiserror::Error)]
pub enum SubscriptionError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("not found")]
    NotFound,
    #[error("Failed to reach the subscriptions store.")]
    Persistence(#[source] StoreError),
}

impl std::fmt::Debug for SubscriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;

        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            write!(f, "\n\tCaused by: {}", cause)?;
            source = cause.source();
        }

        Ok(())
    }
}

impl From<StoreError> for SubscriptionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => SubscriptionError::NotFound,
            other => SubscriptionError::Persistence(other),
        }
    }
}

impl ResponseError for SubscriptionError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscriptionError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SubscriptionError::NotFound => StatusCode::NOT_FOUND,
            SubscriptionError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            SubscriptionError::Persistence(_) => String::from("internal error"),
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": message }))
    }
}

#[tracing::instrument(
    name = "Creating a new subscription handler",
    skip(body, db_pool, timeout),
    fields(
        user_id = %body.user_id,
        service_name = %body.service_name
    )
)]
pub async fn handle_create_subscription(
    body: web::Json<SubscriptionBody>,
    db_pool: web::Data<PgPool>,
    timeout: web::Data<QueryTimeout>,
) -> Result<HttpResponse, SubscriptionError> {
    let new_subscription: NewSubscription = body.try_into().map_err(|err| {
        tracing::warn!("Validation error: {:?}", err);
        SubscriptionError::InvalidInput(err)
    })?;

    let id = insert_subscription(&db_pool, **timeout, &new_subscription).await?;

    Ok(HttpResponse::Created().json(CreatedSubscription { id }))
}

#[tracing::instrument(name = "Fetching a subscription handler", skip(db_pool, timeout))]
pub async fn handle_get_subscription(
    path: web::Path<String>,
    db_pool: web::Data<PgPool>,
    timeout: web::Data<QueryTimeout>,
) -> Result<HttpResponse, SubscriptionError> {
    let subscription_id = parse_id(&path)?;
    let subscription = get_subscription(&db_pool, **timeout, subscription_id).await?;

    Ok(HttpResponse::Ok().json(SubscriptionResponse::from(subscription)))
}

#[tracing::instrument(name = "Listing subscriptions handler", skip(db_pool, timeout))]
pub async fn handle_list_subscriptions(
    parameters: web::Query<ListParameters>,
    db_pool: web::Data<PgPool>,
    timeout: web::Data<QueryTimeout>,
) -> Result<HttpResponse, SubscriptionError> {
    let parameters = parameters.into_inner();
    let (limit, offset) = page(parameters.limit.as_deref(), parameters.offset.as_deref());
    let filter = subscription_filter(parameters.user_id, parameters.service_name)?;

    let subscriptions = list_subscriptions(&db_pool, **timeout, &filter, limit, offset).await?;
    let body: Vec<SubscriptionResponse> = subscriptions
        .into_iter()
        .map(SubscriptionResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(body))
}

#[tracing::instrument(
    name = "Replacing a subscription handler",
    skip(body, db_pool, timeout),
    fields(
        user_id = %body.user_id,
        service_name = %body.service_name
    )
)]
pub async fn handle_update_subscription(
    path: web::Path<String>,
    body: web::Json<SubscriptionBody>,
    db_pool: web::Data<PgPool>,
    timeout: web::Data<QueryTimeout>,
) -> Result<HttpResponse, SubscriptionError> {
    let subscription_id = parse_id(&path)?;
    let subscription: NewSubscription = body.try_into().map_err(|err| {
        tracing::warn!("Validation error: {:?}", err);
        SubscriptionError::InvalidInput(err)
    })?;

    update_subscription(&db_pool, **timeout, subscription_id, &subscription).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[tracing::instrument(name = "Deleting a subscription handler", skip(db_pool, timeout))]
pub async fn handle_delete_subscription(
    path: web::Path<String>,
    db_pool: web::Data<PgPool>,
    timeout: web::Data<QueryTimeout>,
) -> Result<HttpResponse, SubscriptionError> {
    let subscription_id = parse_id(&path)?;

    delete_subscription(&db_pool, **timeout, subscription_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[tracing::instrument(name = "Subscriptions summary handler", skip(db_pool, timeout))]
pub async fn handle_subscriptions_summary(
    parameters: web::Query<SummaryParameters>,
    db_pool: web::Data<PgPool>,
    timeout: web::Data<QueryTimeout>,
) -> Result<HttpResponse, SubscriptionError> {
    let parameters = parameters.into_inner();
    let from = required_month("from", parameters.from.as_deref())?;
    let to = required_month("to", parameters.to.as_deref())?;

    if to < from {
        return Err(SubscriptionError::InvalidInput(String::from(
            "`to` must be >= `from`",
        )));
    }

    let filter = SummaryFilter {
        from,
        to,
        subscriptions: subscription_filter(parameters.user_id, parameters.service_name)?,
    };
    let total = summarize_subscriptions(&db_pool, **timeout, &filter).await?;

    Ok(HttpResponse::Ok().json(SummaryResponse { total }))
}

/// Resolves pagination. Values that are missing, unparsable or out of
/// range fall back to the defaults instead of failing the request.
pub fn page(limit: Option<&str>, offset: Option<&str>) -> (i64, i64) {
    let limit = limit
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| *value > 0 && *value <= MAX_LIMIT)
        .unwrap_or(DEFAULT_LIMIT);
    let offset = offset
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| *value >= 0)
        .unwrap_or(0);

    (limit, offset)
}

fn parse_id(raw: &str) -> Result<Uuid, SubscriptionError> {
    Uuid::parse_str(raw).map_err(|_| SubscriptionError::InvalidInput(String::from("invalid id")))
}

fn required_month(name: &str, token: Option<&str>) -> Result<Month, SubscriptionError> {
    token
        .and_then(|token| Month::parse(token).ok())
        .ok_or_else(|| SubscriptionError::InvalidInput(format!("{} (MM-YYYY) required", name)))
}

fn subscription_filter(
    user_id: Option<String>,
    service_name: Option<String>,
) -> Result<SubscriptionFilter, SubscriptionError> {
    let user_id = match user_id.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(
            Uuid::parse_str(raw)
                .map_err(|_| SubscriptionError::InvalidInput(String::from("invalid user_id")))?,
        ),
    };
    // Free text: a blank name is simply no filter.
    let service_name = service_name.and_then(|name| ServiceName::parse(name).ok());

    Ok(SubscriptionFilter {
        user_id,
        service_name,
    })
}
