use actix_web::web;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::month::Month;
use crate::domain::price::Price;
use crate::domain::service_name::ServiceName;

/// Validated input for creating or replacing a subscription.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub service_name: ServiceName,
    pub price: Price,
    pub user_id: Uuid,
    pub start_month: Month,
    pub end_month: Option<Month>,
}

#[derive(Deserialize, Debug)]
pub struct SubscriptionBody {
    pub service_name: String,
    pub price: i64,
    pub user_id: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl TryFrom<SubscriptionBody> for NewSubscription {
    type Error = String;

    fn try_from(body: SubscriptionBody) -> Result<Self, Self::Error> {
        let service_name = ServiceName::parse(body.service_name)?;
        let price = Price::parse(body.price)?;
        let user_id = Uuid::parse_str(&body.user_id)
            .map_err(|_| format!("{} is not a valid user_id", body.user_id))?;
        let start_month = Month::parse(&body.start_date)
            .map_err(|_| String::from("invalid start_date, expected MM-YYYY"))?;
        let end_month = match body.end_date.as_deref() {
            None | Some("") => None,
            Some(token) => {
                let end_month = Month::parse(token)
                    .map_err(|_| String::from("invalid end_date, expected MM-YYYY"))?;

                if end_month < start_month {
                    return Err(String::from("end_date must be >= start_date"));
                }

                Some(end_month)
            }
        };

        Ok(NewSubscription {
            service_name,
            price,
            user_id,
            start_month,
            end_month,
        })
    }
}

impl TryFrom<web::Json<SubscriptionBody>> for NewSubscription {
    type Error = String;

    fn try_from(body: web::Json<SubscriptionBody>) -> Result<Self, Self::Error> {
        NewSubscription::try_from(body.into_inner())
    }
}
