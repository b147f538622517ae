// POST /optimize - the transcoding endpoint

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::{ConnectInfo, FromRequest, Multipart, Query, Request, State};
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::gate;
use crate::pipeline::{self, OptimizationResult, ResponseMode, Stage, TransformRequest};
use crate::state::AppState;
use crate::store;

/// Raw query parameters. Parsed leniently: anything unparseable falls back
/// to the configured default instead of failing the request.
#[derive(Debug, Deserialize)]
pub struct OptimizeQuery {
    pub quality: Option<String>,
    pub format: Option<String>,
    #[serde(rename = "maxWidth")]
    pub max_width: Option<String>,
    #[serde(rename = "return")]
    pub response_mode: Option<String>,
}

/// The uploaded `image` multipart field.
struct InboundImage {
    bytes: Bytes,
    declared_mime: String,
}

pub async fn optimize(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<OptimizeQuery>,
    request: Request,
) -> Result<Response, ApiError> {
    let client = peer.ip();
    tracing::debug!(stage = %Stage::Received, client = %client, "optimize request");

    let provided_key = headers
        .get(gate::API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    gate::check_api_key(provided_key, &state.config.security.api_key)?;
    tracing::debug!(stage = %Stage::Authenticated, client = %client, "api key accepted");

    state.limiter.check(client)?;
    tracing::debug!(stage = %Stage::RateChecked, client = %client, "within rate limit");

    let max_bytes = state.config.limits.max_upload_bytes;
    // Fail fast on the declared length before buffering anything; the
    // collected bytes are re-checked below. Slack covers multipart framing.
    if let Some(declared) = content_length(&headers) {
        gate::check_payload_size(declared.saturating_sub(MULTIPART_SLACK), max_bytes)?;
    }

    // The multipart parse happens after the gates so a malformed body can
    // never pre-empt the 401/429 decision.
    let multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| match e.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::payload_too_large(format!(
                "Maximum file size is {}MB",
                max_bytes / (1024 * 1024)
            )),
            _ => ApiError::missing_file(format!("Invalid multipart body: {}", e.body_text())),
        })?;

    let upload = read_image_field(multipart, max_bytes).await?;
    gate::check_media_type(&upload.declared_mime)?;
    gate::check_payload_size(upload.bytes.len(), max_bytes)?;
    tracing::debug!(
        stage = %Stage::Validated,
        size = upload.bytes.len(),
        mime = %upload.declared_mime,
        "upload admitted"
    );

    let request = TransformRequest::new(
        query.quality.as_deref().and_then(|v| v.parse().ok()),
        query.format.as_deref(),
        query.max_width.as_deref().and_then(|v| v.parse().ok()),
        query.response_mode.as_deref(),
        &state.config.optimize,
    );
    let response_mode = request.response_mode;

    // Codec work is CPU-bound; keep it off the async workers.
    let result = {
        let bytes = upload.bytes;
        let request = request.clone();
        tokio::task::spawn_blocking(move || pipeline::transform(&bytes, &request))
            .await
            .map_err(|e| ApiError::internal_error(format!("transform task failed: {e}")))??
    };

    match response_mode {
        ResponseMode::Binary => {
            tracing::debug!(stage = %Stage::Responded, mode = "binary", "sending optimized bytes");
            Ok(binary_response(result))
        }
        ResponseMode::Url => {
            let response = url_response(&state, result).await?;
            tracing::debug!(stage = %Stage::Responded, mode = "url", "sending artifact descriptor");
            Ok(response)
        }
    }
}

/// Headroom for multipart boundaries and part headers when comparing the
/// declared Content-Length against the file-size cap.
const MULTIPART_SLACK: usize = 64 * 1024;

fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

async fn read_image_field(
    mut multipart: Multipart,
    max_bytes: usize,
) -> Result<InboundImage, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let declared_mime = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_bytes))?;
        return Ok(InboundImage {
            bytes,
            declared_mime,
        });
    }
    Err(ApiError::missing_file("No image file provided"))
}

fn multipart_error(err: MultipartError, max_bytes: usize) -> ApiError {
    // The body-size limit surfaces as a 413 inside the multipart stream;
    // everything else is a malformed upload.
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(format!(
            "Maximum file size is {}MB",
            max_bytes / (1024 * 1024)
        ))
    } else {
        ApiError::missing_file(format!("Invalid multipart body: {}", err.body_text()))
    }
}

fn binary_response(result: OptimizationResult) -> Response {
    let headers = [
        (header::CONTENT_TYPE, result.content_type()),
        (header::CONTENT_LENGTH, result.optimized_size.to_string()),
        (
            HeaderName::from_static("x-original-size"),
            result.original_size.to_string(),
        ),
        (
            HeaderName::from_static("x-optimized-size"),
            result.optimized_size.to_string(),
        ),
        (
            HeaderName::from_static("x-savings-percent"),
            format!("{:.2}", result.savings_percent),
        ),
    ];
    (StatusCode::OK, headers, result.output).into_response()
}

async fn url_response(state: &AppState, result: OptimizationResult) -> Result<Response, ApiError> {
    let name = store::unique_name(result.extension());
    let url = state.store.put(&name, &result.output).await?;
    Ok(Json(json!({
        "success": true,
        "originalSize": result.original_size,
        "optimizedSize": result.optimized_size,
        "savingsPercent": result.savings_percent,
        "format": result.format.label(),
        "width": result.width,
        "height": result.height,
        "url": url,
    }))
    .into_response())
}
