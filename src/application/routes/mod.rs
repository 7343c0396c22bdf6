pub mod cover_search;
pub mod process_cover;

use axum::http::{HeaderName, HeaderValue, Method, Request, StatusCode, header};
use axum::routing::post;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::{DefaultOnResponse, MakeSpan, TraceLayer};
use tracing::{Level, Span};

use crate::application::errors::AppError;
use crate::application::state::AppState;

/// 10 MB request body limit.
const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

pub fn app_router(state: AppState) -> axum::Router {
    axum::Router::new()
        .nest("/functions/v1", functions_router())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        // Outside the body limit so rejected uploads still carry CORS headers
        .layer(cors_layer())
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(FunctionMakeSpan)
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                )),
        )
        .with_state(state)
}

fn functions_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/cover-search",
            post(cover_search::search_cover)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/process-cover",
            post(process_cover::process_cover)
                .options(preflight)
                .fallback(method_not_allowed),
        )
}

/// Browsers may call the functions from any origin.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("apikey"),
            HeaderName::from_static("x-client-info"),
        ])
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

#[derive(Clone)]
struct FunctionMakeSpan;

impl<B> MakeSpan<B> for FunctionMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            version = ?request.version(),
        )
    }
}
