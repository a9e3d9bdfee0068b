// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    blockchain::approvals::{ApprovalKind, ApprovalTicket},
    models::SubmissionResponse,
    state::AppState,
};

pub mod health;
pub mod relay;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/relay", post(relay::relay))
        .route("/approvals", post(relay::submit_approval));

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(health::health, relay::relay, relay::submit_approval),
    components(
        schemas(
            SubmissionResponse,
            ApprovalTicket,
            ApprovalKind,
            health::HealthResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Relay", description = "Meta-transaction relaying")
    )
)]
pub struct ApiDoc;
