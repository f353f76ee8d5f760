use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};

use crate::domain::{SubscriberEmail, SubscriberName};
use crate::registry::{LookupError, SubscribeError, SubscriptionRegistry};

#[derive(serde::Deserialize)]
pub struct FormData {
    email: String,
    name: String,
}

impl FormData {
    /// Format checks for submissions coming through the web form. The registry only requires
    /// both fields to be present, so anything stricter belongs here, at the edge.
    fn validate(self) -> Result<(SubscriberEmail, SubscriberName), String> {
        let email = SubscriberEmail::parse(self.email)?;
        let name = SubscriberName::parse(self.name)?;
        Ok((email, name))
    }
}

/// actix-web rejects the request with `400 Bad Request` before calling us if either form field
/// is missing. Malformed fields are rejected by `FormData::validate`; uniqueness is decided by
/// the registry.
#[tracing::instrument(name = "Handling a subscription request", skip(form, registry))]
pub async fn subscribe(
    form: web::Form<FormData>,
    registry: web::Data<SubscriptionRegistry>,
) -> Result<HttpResponse, SubscribeError> {
    let (email, name) = form
        .into_inner()
        .validate()
        .map_err(SubscribeError::InvalidInput)?;
    let subscription = registry.subscribe(email.into(), name.into()).await?;
    Ok(HttpResponse::Ok().json(subscription))
}

#[derive(serde::Deserialize)]
pub struct LookupParameters {
    email: String,
}

#[tracing::instrument(name = "Handling a subscription lookup", skip(parameters, registry))]
pub async fn lookup(
    parameters: web::Query<LookupParameters>,
    registry: web::Data<SubscriptionRegistry>,
) -> Result<HttpResponse, LookupError> {
    let subscription = registry.lookup(&parameters.email).await?;
    Ok(HttpResponse::Ok().json(subscription))
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscribeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SubscribeError::DuplicateEmail(_) => StatusCode::CONFLICT,
            SubscribeError::StorageUnavailable(_) => storage_failure_status(self.is_transient()),
        }
    }
}

impl ResponseError for LookupError {
    fn status_code(&self) -> StatusCode {
        match self {
            LookupError::NotFound => StatusCode::NOT_FOUND,
            LookupError::StorageUnavailable(_) => storage_failure_status(self.is_transient()),
        }
    }
}

fn storage_failure_status(transient: bool) -> StatusCode {
    if transient {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
