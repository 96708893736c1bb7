//! # JSON API Server
//!
//! Thin HTTP boundary over the analysis pipeline. Request and response
//! shapes bind directly to the pipeline types; all real work happens in
//! [`crate::pipeline`].
//!
//! ## Endpoints
//!
//! - `POST /api/analyze` — barcode plus user profile, returns the full
//!   analysis report
//! - `POST /api/scan` — base64 image plus user profile, returns the OCR
//!   categorization and the analysis over extracted ingredients
//! - `GET /api/health` — liveness probe
//!
//! Responses carry permissive CORS headers so a browser frontend can call
//! the API directly; preflight `OPTIONS` requests are answered with 204.

use base64::{engine::general_purpose, Engine as _};
use http_body_util::BodyExt;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::errors::{error_logging, AnalysisError, AppResult};
use crate::lookup::ProductLookup;
use crate::ocr::OcrEngine;
use crate::pipeline::LabelAnalyzer;
use crate::recommendations::UserHealthProfile;

/// Shared state handed to every connection task
pub struct AppState {
    pub analyzer: LabelAnalyzer,
    pub lookup: Arc<dyn ProductLookup>,
    pub ocr_engine: Arc<dyn OcrEngine>,
}

/// Barcode analysis request body
#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    barcode: String,
    #[serde(default)]
    user_profile: UserHealthProfile,
}

/// Label photo analysis request body
#[derive(Debug, Deserialize)]
struct ScanRequest {
    /// Base64-encoded image, with or without a `data:` URL prefix
    image_base64: String,
    #[serde(default)]
    user_profile: UserHealthProfile,
}

fn http_status(error: &AnalysisError) -> hyper::StatusCode {
    match error {
        AnalysisError::NotFound(_) => hyper::StatusCode::NOT_FOUND,
        AnalysisError::InvalidInput(_) => hyper::StatusCode::BAD_REQUEST,
        AnalysisError::Upstream(_) => hyper::StatusCode::BAD_GATEWAY,
        AnalysisError::Internal(_) | AnalysisError::Config(_) => {
            hyper::StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn json_response(status: hyper::StatusCode, body: String) -> hyper::Response<String> {
    let mut response = hyper::Response::new(body);
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    apply_cors_headers(&mut response);
    response
}

fn error_response(error: &AnalysisError) -> hyper::Response<String> {
    let body = serde_json::json!({
        "error": error.kind(),
        "message": error.message(),
    });
    json_response(http_status(error), body.to_string())
}

fn apply_cors_headers(response: &mut hyper::Response<String>) {
    let headers = response.headers_mut();
    headers.insert(
        hyper::header::ACCESS_CONTROL_ALLOW_ORIGIN,
        hyper::header::HeaderValue::from_static("*"),
    );
    headers.insert(
        hyper::header::ACCESS_CONTROL_ALLOW_METHODS,
        hyper::header::HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        hyper::header::ACCESS_CONTROL_ALLOW_HEADERS,
        hyper::header::HeaderValue::from_static("content-type"),
    );
}

/// Decode a base64 image payload, tolerating a `data:` URL prefix
fn decode_image_payload(payload: &str) -> AppResult<Vec<u8>> {
    let encoded = match payload.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    };
    general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| AnalysisError::InvalidInput(format!("Invalid base64 image data: {}", e)))
}

async fn read_json_body<T: serde::de::DeserializeOwned>(
    req: hyper::Request<hyper::body::Incoming>,
) -> AppResult<T> {
    let bytes = req
        .into_body()
        .collect()
        .await
        .map_err(|e| AnalysisError::InvalidInput(format!("Failed to read request body: {}", e)))?
        .to_bytes();
    serde_json::from_slice(&bytes)
        .map_err(|e| AnalysisError::InvalidInput(format!("Invalid request body: {}", e)))
}

async fn handle_analyze(
    state: &AppState,
    req: hyper::Request<hyper::body::Incoming>,
) -> AppResult<String> {
    let request: AnalyzeRequest = read_json_body(req).await?;
    let report = state
        .analyzer
        .analyze_barcode(state.lookup.as_ref(), &request.barcode, &request.user_profile)
        .await?;
    serde_json::to_string(&report)
        .map_err(|e| AnalysisError::Internal(format!("Failed to encode response: {}", e)))
}

async fn handle_scan(
    state: &AppState,
    req: hyper::Request<hyper::body::Incoming>,
) -> AppResult<String> {
    let request: ScanRequest = read_json_body(req).await?;
    let image_bytes = decode_image_payload(&request.image_base64)?;
    let report = state
        .analyzer
        .analyze_image(
            state.ocr_engine.as_ref(),
            &image_bytes,
            &request.user_profile,
        )
        .await?;
    serde_json::to_string(&report)
        .map_err(|e| AnalysisError::Internal(format!("Failed to encode response: {}", e)))
}

async fn route(
    state: Arc<AppState>,
    req: hyper::Request<hyper::body::Incoming>,
) -> hyper::Response<String> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start_time = std::time::Instant::now();

    let response = match (&method, path.as_str()) {
        (&hyper::Method::OPTIONS, _) => {
            let mut response = hyper::Response::new(String::new());
            *response.status_mut() = hyper::StatusCode::NO_CONTENT;
            apply_cors_headers(&mut response);
            response
        }
        (&hyper::Method::GET, "/api/health") => json_response(
            hyper::StatusCode::OK,
            serde_json::json!({"status": "healthy", "message": "Server is running"}).to_string(),
        ),
        (&hyper::Method::POST, "/api/analyze") => match handle_analyze(&state, req).await {
            Ok(body) => json_response(hyper::StatusCode::OK, body),
            Err(e) => {
                if matches!(e, AnalysisError::Upstream(_) | AnalysisError::Internal(_)) {
                    error_logging::log_pipeline_error(&e, "analyze_barcode");
                }
                error_response(&e)
            }
        },
        (&hyper::Method::POST, "/api/scan") => match handle_scan(&state, req).await {
            Ok(body) => json_response(hyper::StatusCode::OK, body),
            Err(e) => {
                if matches!(e, AnalysisError::Upstream(_) | AnalysisError::Internal(_)) {
                    error_logging::log_pipeline_error(&e, "analyze_scan");
                }
                error_response(&e)
            }
        },
        _ => error_response(&AnalysisError::NotFound(format!(
            "No route for {} {}",
            method, path
        ))),
    };

    metrics::counter!(
        "requests_total",
        "method" => method.to_string(),
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);
    metrics::histogram!("request_duration_seconds").record(start_time.elapsed().as_secs_f64());

    response
}

/// Run the API server until the process exits
pub async fn run_api_server(state: Arc<AppState>, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("API server listening on {}", addr);

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let state = Arc::clone(&state);

                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = hyper::service::service_fn(
                        move |req: hyper::Request<hyper::body::Incoming>| {
                            let state = Arc::clone(&state);
                            async move {
                                Ok::<_, std::convert::Infallible>(route(state, req).await)
                            }
                        },
                    );

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving API connection: {:?}", err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting API connection: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_base64() {
        let encoded = general_purpose::STANDARD.encode(b"label image bytes");
        let decoded = decode_image_payload(&encoded).unwrap();
        assert_eq!(decoded, b"label image bytes");
    }

    #[test]
    fn test_decode_data_url_payload() {
        let encoded = format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(b"png bytes")
        );
        let decoded = decode_image_payload(&encoded).unwrap();
        assert_eq!(decoded, b"png bytes");
    }

    #[test]
    fn test_decode_invalid_base64_is_invalid_input() {
        let result = decode_image_payload("not base64 at all!!!");
        assert!(matches!(result, Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            http_status(&AnalysisError::NotFound("x".into())),
            hyper::StatusCode::NOT_FOUND
        );
        assert_eq!(
            http_status(&AnalysisError::InvalidInput("x".into())),
            hyper::StatusCode::BAD_REQUEST
        );
        assert_eq!(
            http_status(&AnalysisError::Upstream("x".into())),
            hyper::StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            http_status(&AnalysisError::Internal("x".into())),
            hyper::StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
