//! Axum REST API over the indexed marketplace events.
//!
//! | Route                                          | Returns                          |
//! |------------------------------------------------|----------------------------------|
//! | `GET /health`                                  | service status                   |
//! | `GET /events`                                  | every indexed event              |
//! | `GET /projects/:id/events`                     | events of one project            |
//! | `GET /projects/:id/milestones/:milestone_id/events` | history of one milestone    |
//! | `GET /actors/:address/events`                  | events about one principal       |

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::db;
use crate::errors::Result;
use crate::events::EventRecord;

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events", get(get_all_events))
        .route("/projects/:id/events", get(get_project_events))
        .route(
            "/projects/:id/milestones/:milestone_id/events",
            get(get_milestone_events),
        )
        .route("/actors/:address/events", get(get_actor_events))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

impl EventsResponse {
    fn new(events: Vec<EventRecord>) -> Self {
        EventsResponse {
            project_id: None,
            milestone_id: None,
            actor: None,
            count: events.len(),
            events,
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /events`
pub async fn get_all_events(State(state): State<Arc<ApiState>>) -> Result<Json<EventsResponse>> {
    let events = db::get_all_events(&state.pool).await?;
    Ok(Json(EventsResponse::new(events)))
}

/// `GET /projects/:id/events`
pub async fn get_project_events(
    State(state): State<Arc<ApiState>>,
    Path(project_id): Path<String>,
) -> Result<Json<EventsResponse>> {
    let events = db::get_events_for_project(&state.pool, &project_id).await?;
    Ok(Json(EventsResponse {
        project_id: Some(project_id),
        ..EventsResponse::new(events)
    }))
}

/// `GET /projects/:id/milestones/:milestone_id/events`
pub async fn get_milestone_events(
    State(state): State<Arc<ApiState>>,
    Path((project_id, milestone_id)): Path<(String, String)>,
) -> Result<Json<EventsResponse>> {
    let events = db::get_events_for_milestone(&state.pool, &project_id, &milestone_id).await?;
    Ok(Json(EventsResponse {
        project_id: Some(project_id),
        milestone_id: Some(milestone_id),
        ..EventsResponse::new(events)
    }))
}

/// `GET /actors/:address/events`
pub async fn get_actor_events(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
) -> Result<Json<EventsResponse>> {
    let events = db::get_events_for_actor(&state.pool, &address).await?;
    Ok(Json(EventsResponse {
        actor: Some(address),
        ..EventsResponse::new(events)
    }))
}
