//! HTTP routes for the agenda service

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    aggregation::PeriodTotals,
    dashboard::DaySummary,
    error::AgendaError,
    middleware::{Identity, identity_middleware},
    models::{
        AppointmentPatch, ClientPatch, NewClient, NewService, ProfilePatch, ServicePatch,
        TransactionInput,
    },
    resolver::AppointmentDraft,
    state::AppState,
};

/// Query parameters for appointment listing
#[derive(Debug, Deserialize)]
pub struct AppointmentQuery {
    pub date: Option<NaiveDate>,
}

/// Create the router for the agenda service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route("/clients/:id", patch(update_client).delete(delete_client))
        .route("/services", get(list_services).post(create_service))
        .route("/services/:id", patch(update_service).delete(delete_service))
        .route(
            "/appointments",
            get(list_appointments).post(create_appointment),
        )
        .route(
            "/appointments/:id",
            patch(update_appointment).delete(delete_appointment),
        )
        .route("/appointments/:id/complete", post(complete_appointment))
        .route("/appointments/:id/cancel", post(cancel_appointment))
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/transactions/totals", get(transaction_totals))
        .route("/transactions/:id", axum::routing::delete(delete_transaction))
        .route("/dashboard", get(dashboard))
        .route("/profile", get(get_profile).put(save_profile))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            identity_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "agenda-service",
        "store": state.store_backend,
    }))
}

// Clients

pub async fn list_clients(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
) -> Result<impl IntoResponse, AgendaError> {
    let clients = state.catalog.list_clients(owner).await?;
    Ok(Json((*clients).clone()))
}

pub async fn create_client(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Json(payload): Json<NewClient>,
) -> Result<impl IntoResponse, AgendaError> {
    let client = state.catalog.create_client(owner, payload).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn update_client(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClientPatch>,
) -> Result<impl IntoResponse, AgendaError> {
    state.catalog.update_client(owner, id, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_client(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AgendaError> {
    state.catalog.delete_client(owner, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Services

pub async fn list_services(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
) -> Result<impl IntoResponse, AgendaError> {
    let services = state.catalog.list_services(owner).await?;
    Ok(Json((*services).clone()))
}

pub async fn create_service(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Json(payload): Json<NewService>,
) -> Result<impl IntoResponse, AgendaError> {
    let service = state.catalog.create_service(owner, payload).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

pub async fn update_service(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ServicePatch>,
) -> Result<impl IntoResponse, AgendaError> {
    state.catalog.update_service(owner, id, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_service(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AgendaError> {
    state.catalog.delete_service(owner, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Appointments

pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Query(query): Query<AppointmentQuery>,
) -> Result<impl IntoResponse, AgendaError> {
    let appointments = state.appointments.list(owner, query.date).await?;
    Ok(Json((*appointments).clone()))
}

/// Book an appointment; picked client/service ids are resolved against the
/// owner's current lists before validation
pub async fn create_appointment(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Json(draft): Json<AppointmentDraft>,
) -> Result<impl IntoResponse, AgendaError> {
    let appointment = state
        .appointments
        .create_resolved(owner, draft, &state.catalog)
        .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn update_appointment(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AppointmentPatch>,
) -> Result<impl IntoResponse, AgendaError> {
    state.appointments.update(owner, id, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn complete_appointment(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AgendaError> {
    let transaction = state.appointments.complete_by_id(owner, id).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn cancel_appointment(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AgendaError> {
    state.appointments.cancel(owner, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_appointment(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AgendaError> {
    state.appointments.delete(owner, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Transactions

pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
) -> Result<impl IntoResponse, AgendaError> {
    let transactions = state.catalog.list_transactions(owner).await?;
    Ok(Json((*transactions).clone()))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Json(payload): Json<TransactionInput>,
) -> Result<impl IntoResponse, AgendaError> {
    let transaction = state
        .catalog
        .create_transaction(owner, payload, today())
        .await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AgendaError> {
    state.catalog.delete_transaction(owner, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn transaction_totals(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
) -> Result<impl IntoResponse, AgendaError> {
    let transactions = state.catalog.list_transactions(owner).await?;
    Ok(Json(PeriodTotals::compute(&transactions, today())))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
) -> Result<impl IntoResponse, AgendaError> {
    let today = today();
    let appointments = state.appointments.list(owner, Some(today)).await?;
    let transactions = state.catalog.list_transactions(owner).await?;
    let clients = state.catalog.list_clients(owner).await?;

    Ok(Json(DaySummary::build(
        &appointments,
        &transactions,
        clients.len(),
        today,
    )))
}

// Profile

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
) -> Result<impl IntoResponse, AgendaError> {
    Ok(Json(state.catalog.profile(owner).await?))
}

pub async fn save_profile(
    State(state): State<AppState>,
    Extension(Identity(owner)): Extension<Identity>,
    Json(payload): Json<ProfilePatch>,
) -> Result<impl IntoResponse, AgendaError> {
    Ok(Json(state.catalog.save_profile(owner, payload).await?))
}
