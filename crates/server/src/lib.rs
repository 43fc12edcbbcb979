use axum::Router;
use local_deployment::LocalDeployment;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod error;
pub mod extract;
pub mod routes;

pub type DeploymentImpl = LocalDeployment;

/// The full application: every route under `/api`, with request tracing and
/// permissive CORS for the storefront client.
pub fn app(deployment: DeploymentImpl) -> Router {
    Router::new()
        .nest("/api", routes::router(&deployment))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(deployment)
}
