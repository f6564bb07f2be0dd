//! API Server Module
//!
//! This module implements the HTTP boundary in front of the record sink.
//!
//! # Routes
//! - `POST /records`: submit `{"Name": "..."}`, answered with the committed
//!   `{"ID": n, "Name": "..."}` once its batch has been applied
//! - `GET /records`: every committed record, ordered by ID

use crate::{config::ApiConfig, sink::RecordSink, NewRecord, Record, SinkError};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state that is accessible across all request handlers
#[derive(Clone)]
pub struct AppState {
    sink: Arc<RecordSink>,
}

/// The main API server struct
///
/// Encapsulates the listen address and the sink that requests are served from.
pub struct Server {
    config: ApiConfig,
    state: AppState,
}

impl Server {
    /// Creates a new API server instance
    ///
    /// # Arguments
    /// * `config` - Listen address
    /// * `sink` - The record sink handling submissions and reads
    pub fn new(config: ApiConfig, sink: Arc<RecordSink>) -> Self {
        Self {
            config,
            state: AppState { sink },
        }
    }

    /// Serves requests until `shutdown` resolves
    ///
    /// In-flight requests are allowed to finish before this returns.
    ///
    /// # Returns
    /// `Ok(())` after a graceful shutdown, or an error if binding fails
    pub async fn start(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let app = router(self.state.sink);

        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("API server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("API server stopped");
        Ok(())
    }
}

/// Builds the router serving `/records`
pub fn router(sink: Arc<RecordSink>) -> Router {
    Router::new()
        .route("/records", get(list_records).post(create_record))
        .with_state(AppState { sink })
}

/// Error body: `{"error": "..."}`
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Maps a sink failure to its HTTP status
fn sink_error_response(err: SinkError) -> Response {
    let status = match &err {
        SinkError::Validation(_) => StatusCode::BAD_REQUEST,
        SinkError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        SinkError::Shutdown => StatusCode::SERVICE_UNAVAILABLE,
        SinkError::StoreWrite { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, err.to_string())
}

/// Handles `POST /records`
///
/// Malformed JSON is answered with 400 before the sink is involved.
async fn create_record(
    State(state): State<AppState>,
    payload: Result<Json<NewRecord>, JsonRejection>,
) -> Response {
    let Json(record) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("Rejected record body: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    match state.sink.submit(record).await {
        Ok(committed) => (StatusCode::CREATED, Json(committed)).into_response(),
        Err(err) => sink_error_response(err),
    }
}

/// Handles `GET /records`
async fn list_records(State(state): State<AppState>) -> Json<Vec<Record>> {
    Json(state.sink.list_all().await)
}
