//! Customer REST routes.
//!
//! - `POST   /customers`       : create a customer, 201 with the stored record
//! - `PUT    /customers/{id}`  : overwrite name and birth date, 200 or 404
//! - `DELETE /customers/{id}`  : remove a customer, always 204
//! - `GET    /customers/{text}`: customers whose first or last name contains `text`

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use crm_core::domain::customer::{Customer, CustomerId, CustomerPatch};
use crm_core::errors::{ApplicationError, InterfaceError};
use crm_db::{CustomerRepository, RepositoryError};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct CustomerState {
    repository: Arc<dyn CustomerRepository>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub correlation_id: String,
}

type ApiFailure = (StatusCode, Json<ApiError>);

pub fn router(repository: Arc<dyn CustomerRepository>) -> Router {
    Router::new()
        .route("/customers", post(create_customer))
        // `{key}` is an id for PUT/DELETE and search text for GET.
        .route(
            "/customers/{key}",
            get(search_customers).put(update_customer).delete(delete_customer),
        )
        .with_state(CustomerState { repository })
}

async fn create_customer(
    State(state): State<CustomerState>,
    Json(body): Json<Customer>,
) -> Result<(StatusCode, Json<Customer>), ApiFailure> {
    let correlation_id = correlation_id();

    let created = state
        .repository
        .save(Customer { id: None, ..body })
        .await
        .map_err(|error| failure(error, &correlation_id, "api.customer.create_failed"))?;

    info!(
        event_name = "api.customer.created",
        correlation_id = %correlation_id,
        customer_id = ?created.id,
        "customer created"
    );

    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_customer(
    Path(id): Path<i64>,
    State(state): State<CustomerState>,
    Json(patch): Json<CustomerPatch>,
) -> Result<Json<Customer>, ApiFailure> {
    let correlation_id = correlation_id();
    let id = CustomerId(id);

    let updated = state
        .repository
        .update(id, patch)
        .await
        .map_err(|error| failure(error, &correlation_id, "api.customer.update_failed"))?;

    info!(
        event_name = "api.customer.updated",
        correlation_id = %correlation_id,
        customer_id = %id,
        "customer updated"
    );

    Ok(Json(updated))
}

async fn delete_customer(
    Path(id): Path<i64>,
    State(state): State<CustomerState>,
) -> Result<StatusCode, ApiFailure> {
    let correlation_id = correlation_id();
    let id = CustomerId(id);

    state
        .repository
        .delete(id)
        .await
        .map_err(|error| failure(error, &correlation_id, "api.customer.delete_failed"))?;

    info!(
        event_name = "api.customer.deleted",
        correlation_id = %correlation_id,
        customer_id = %id,
        "customer deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

async fn search_customers(
    Path(text): Path<String>,
    State(state): State<CustomerState>,
) -> Result<Json<Vec<Customer>>, ApiFailure> {
    let correlation_id = correlation_id();

    let matches = state
        .repository
        .find_by_name_contains(&text)
        .await
        .map_err(|error| failure(error, &correlation_id, "api.customer.search_failed"))?;

    info!(
        event_name = "api.customer.searched",
        correlation_id = %correlation_id,
        match_count = matches.len(),
        "customer search completed"
    );

    Ok(Json(matches))
}

fn failure(error: RepositoryError, correlation_id: &str, event_name: &str) -> ApiFailure {
    let interface = ApplicationError::from(error).into_interface(correlation_id);

    let (status, message) = match &interface {
        InterfaceError::BadRequest { message, .. } => (StatusCode::BAD_REQUEST, message.clone()),
        InterfaceError::NotFound { message, .. } => (StatusCode::NOT_FOUND, message.clone()),
        InterfaceError::Internal { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, interface.user_message().to_string())
        }
    };

    if status.is_server_error() {
        error!(event_name, correlation_id, error = %interface, "customer request failed");
    } else {
        warn!(event_name, correlation_id, error = %interface, "customer request rejected");
    }

    (status, Json(ApiError { error: message, correlation_id: correlation_id.to_string() }))
}

fn correlation_id() -> String {
    Uuid::new_v4().to_string()
}
