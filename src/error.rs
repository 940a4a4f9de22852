use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Which stage of an operation gave up.
///
/// Carried by the operation-level errors so callers can tell a network problem
/// from a malformed model response without ever seeing the underlying cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Input rejected before any remote call was made.
    InvalidInput,
    /// The remote call failed (network, quota, HTTP status, blocked prompt).
    Transport,
    /// The remote call did not finish within the configured timeout.
    Timeout,
    /// The response text was not valid JSON.
    Parse,
    /// The response was JSON but did not match the expected shape.
    Shape,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::InvalidInput => "invalid input",
            FailureKind::Transport => "transport",
            FailureKind::Timeout => "timeout",
            FailureKind::Parse => "parse",
            FailureKind::Shape => "shape",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug)]
pub enum AnalystError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Financial analysis failed. The model response could not be used; please check the data and try again.")]
    AnalysisFailed { kind: FailureKind },

    #[error("Forecast update failed. Please try again.")]
    ForecastFailed { kind: FailureKind },

    #[error("Data query failed. Please try again.")]
    QueryFailed { kind: FailureKind },
}

impl AnalystError {
    /// The failing stage, if this error came from an operation.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            AnalystError::Config(_) => None,
            AnalystError::AnalysisFailed { kind }
            | AnalystError::ForecastFailed { kind }
            | AnalystError::QueryFailed { kind } => Some(*kind),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalystError>;

/// Failures raised by an [`crate::llm::InferenceService`] implementation.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Gemini API error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Prompt blocked by the model: {0}")]
    Blocked(String),

    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Inference failed: {0}")]
    Other(String),
}

// Request URLs never reach error text or logs.
impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        InferenceError::Http(err.without_url())
    }
}

/// One mismatch between a response and the requested schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeViolation {
    /// JSON path of the offending node, e.g. `$.analystView.breakevenAnalysis`.
    pub path: String,
    pub problem: String,
}

impl fmt::Display for ShapeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.problem)
    }
}

/// Internal error for a single request/response round trip.
///
/// Never returned from the public operations; it is logged and then collapsed
/// into the matching [`AnalystError`] variant.
#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("Response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Response does not match the expected shape: {}", join_violations(.0))]
    Shape(Vec<ShapeViolation>),
}

impl ResponseError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ResponseError::InvalidInput(_) => FailureKind::InvalidInput,
            ResponseError::Inference(InferenceError::Timeout(_)) => FailureKind::Timeout,
            ResponseError::Inference(_) => FailureKind::Transport,
            ResponseError::Parse(_) => FailureKind::Parse,
            ResponseError::Shape(_) => FailureKind::Shape,
        }
    }
}

fn join_violations(violations: &[ShapeViolation]) -> String {
    const SHOWN: usize = 5;
    let mut summary = violations
        .iter()
        .take(SHOWN)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    if violations.len() > SHOWN {
        summary.push_str(&format!("; ... and {} more", violations.len() - SHOWN));
    }
    summary
}
