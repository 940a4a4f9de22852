//! # CSV Financial Analyst
//!
//! A thin client that sends raw CSV transaction data to Google Gemini and
//! shapes the answer into a typed financial report.
//!
//! The crate does no accounting of its own. Every figure, ratio and comment is
//! produced by the remote model; this crate builds the request (prompt plus a
//! response schema) and checks that what comes back has the declared shape.
//!
//! ## Operations
//!
//! - [`AnalysisClient::analyze_financial_data`]: statements, ratios, charts
//!   and commentary as a [`FinancialAnalysis`], optionally for one outlet.
//! - [`AnalysisClient::get_updated_forecast`]: a short projection under
//!   revenue and expense growth assumptions.
//! - [`AnalysisClient::get_outlets`]: outlet names found in the data. Never
//!   fails; problems yield an empty list.
//! - [`AnalysisClient::query_data`]: a free-form question answered from the
//!   data alone.
//!
//! ## Example
//!
//! ```rust,ignore
//! use csv_financial_analyst::{AnalysisClient, AnalystConfig};
//!
//! let client = AnalysisClient::new(AnalystConfig::new(api_key).with_currency_code("PHP"))?;
//! let csv = std::fs::read_to_string("transactions.csv")?;
//!
//! for outlet in client.get_outlets(&csv).await {
//!     let report = client.analyze_financial_data(&csv, Some(&outlet)).await?;
//!     println!("{}: {}", outlet, report.executive_summary.join(" "));
//! }
//! ```

pub mod analyst;
pub mod config;
pub mod error;
pub mod llm;
pub mod schema;
pub mod validation;

pub use analyst::AnalysisClient;
pub use config::AnalystConfig;
pub use error::{AnalystError, FailureKind, InferenceError, Result, ShapeViolation};
pub use llm::{GeminiClient, GenerationParams, InferenceRequest, InferenceService};
pub use schema::*;
pub use validation::{validate_against_schema, ResponseValidation};
