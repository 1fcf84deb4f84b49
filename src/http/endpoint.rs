//! The single-route function endpoint.

use std::sync::Arc;

use axum::{extract::State, routing::post, Router};
use tower_http::trace::TraceLayer;

/// The externally supplied request transform.
pub type Transform = Arc<dyn Fn(String) -> String + Send + Sync>;

/// Builds the wire endpoint for a transform.
pub struct FunctionEndpoint {
    transform: Transform,
}

impl FunctionEndpoint {
    /// Wrap a transform.
    pub fn new(transform: Transform) -> Self {
        Self { transform }
    }

    /// The router serving `POST /`.
    ///
    /// Other methods and paths fall through to axum's defaults (405/404);
    /// they are not this endpoint's concern.
    pub fn into_router(self) -> Router {
        Router::new()
            .route("/", post(invoke))
            .with_state(self.transform)
            .layer(TraceLayer::new_for_http())
    }
}

/// Pass the request body through the transform verbatim.
async fn invoke(State(transform): State<Transform>, body: String) -> String {
    transform(body)
}
