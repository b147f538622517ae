//! Transform pipeline: decode, metadata inspect, conditional resize,
//! re-encode, savings statistics. One request, one pass, no retries and no
//! fallback between formats.

use std::fmt;

use image::ImageFormat;

use crate::codec::{self, OutputFormat, TransformError};
use crate::config::OptimizeConfig;

/// Steps a request moves through, in order. Terminal states are `Responded`
/// and `Errored`; no step is ever revisited within a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Authenticated,
    RateChecked,
    Validated,
    Decoded,
    Resized,
    Encoded,
    Responded,
    Errored,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Authenticated => "authenticated",
            Stage::RateChecked => "rate_checked",
            Stage::Validated => "validated",
            Stage::Decoded => "decoded",
            Stage::Resized => "resized",
            Stage::Encoded => "encoded",
            Stage::Responded => "responded",
            Stage::Errored => "errored",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the optimized bytes are returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Binary,
    Url,
}

impl ResponseMode {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "url" => Self::Url,
            _ => Self::Binary,
        }
    }
}

/// Validated transform parameters. Every field has a safe default; garbage
/// input falls back rather than failing the request.
#[derive(Debug, Clone)]
pub struct TransformRequest {
    pub quality: u8,
    pub format: OutputFormat,
    pub max_width: u32,
    pub response_mode: ResponseMode,
}

impl TransformRequest {
    pub fn new(
        quality: Option<u8>,
        format: Option<&str>,
        max_width: Option<u32>,
        response_mode: Option<&str>,
        defaults: &OptimizeConfig,
    ) -> Self {
        // Zero quality/width take the default, matching the original
        // service's falsy-value handling.
        let quality = quality
            .filter(|q| *q > 0)
            .unwrap_or(defaults.default_quality)
            .clamp(1, 100);
        let format = format
            .filter(|s| !s.trim().is_empty())
            .map(OutputFormat::parse)
            .unwrap_or_else(|| OutputFormat::parse(&defaults.default_format));
        let max_width = max_width
            .filter(|w| *w > 0)
            .unwrap_or(defaults.default_max_width);
        let response_mode = response_mode
            .map(ResponseMode::parse)
            .unwrap_or(ResponseMode::Binary);
        Self {
            quality,
            format,
            max_width,
            response_mode,
        }
    }
}

/// Outcome of one optimization: the encoded bytes plus the statistics both
/// response modes report. Immutable after creation.
#[derive(Debug)]
pub struct OptimizationResult {
    pub original_size: usize,
    pub optimized_size: usize,
    pub savings_percent: f64,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub output: Vec<u8>,
}

impl OptimizationResult {
    fn new(
        original_size: usize,
        output: Vec<u8>,
        width: u32,
        height: u32,
        format: OutputFormat,
    ) -> Result<Self, TransformError> {
        // A zero-byte original makes the savings ratio undefined; the
        // pipeline rejects the upload before decoding, this guards the
        // constructor itself.
        if original_size == 0 {
            return Err(TransformError::EmptyInput);
        }
        let optimized_size = output.len();
        Ok(Self {
            original_size,
            optimized_size,
            savings_percent: savings_percent(original_size, optimized_size),
            width,
            height,
            format,
            output,
        })
    }

    pub fn content_type(&self) -> String {
        self.format.content_type()
    }

    pub fn extension(&self) -> &str {
        self.format.label()
    }
}

/// Relative size reduction in percent, rounded to 2 decimals. Negative when
/// the "optimized" encoding came out larger.
fn savings_percent(original: usize, optimized: usize) -> f64 {
    let raw = (original as f64 - optimized as f64) / original as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Run the full transform: decode -> inspect -> conditional fit-inside
/// resize -> encode -> statistics.
pub fn transform(
    bytes: &[u8],
    request: &TransformRequest,
) -> Result<OptimizationResult, TransformError> {
    if bytes.is_empty() {
        return Err(TransformError::EmptyInput);
    }

    let (img, source) = codec::decode_image(bytes)?;
    let (natural_width, natural_height) = (img.width(), img.height());
    tracing::debug!(
        stage = %Stage::Decoded,
        width = natural_width,
        height = natural_height,
        source = source_label(source),
        "decoded upload"
    );

    let img = if natural_width > request.max_width {
        let resized = codec::resize_to_width(&img, request.max_width);
        tracing::debug!(
            stage = %Stage::Resized,
            width = resized.width(),
            height = resized.height(),
            "resized to fit max width"
        );
        resized
    } else {
        img
    };
    let (out_width, out_height) = (img.width(), img.height());

    let output = codec::encode_image(&img, &request.format, request.quality, source)?;
    tracing::debug!(stage = %Stage::Encoded, bytes = output.len(), "encoded output");

    let result = OptimizationResult::new(
        bytes.len(),
        output,
        out_width,
        out_height,
        request.format.clone(),
    )?;
    tracing::info!(
        "Optimized image: {} -> {} bytes ({:.2}% saved)",
        result.original_size,
        result.optimized_size,
        result.savings_percent
    );
    Ok(result)
}

fn source_label(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("unknown")
}
