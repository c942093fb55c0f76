//! Core library for the `aqs` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The rate-limited EPA AQS API client and its endpoint templates
//! - Shared domain models (request templates, daily records)
//! - Yearly mean-AQI series derivation
//!
//! It is used by `aqs-cli`, but can also be reused by other binaries or services.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod model;
pub mod query;
pub mod series;

pub use client::{AqsClient, DEFAULT_THROTTLE, HttpTransport, Transport};
pub use config::{Config, Credentials};
pub use endpoint::{API_BASE, Endpoint};
pub use error::AqsError;
pub use model::{Area, DailyQuery, DailyRecord, daily_records, header_status, is_success};
pub use query::{QueryTemplate, split_county_fips};
pub use series::{YearlyAqi, mean_aqi, render_csv};
