//! REST client for the rental backend

pub mod client;
pub mod envelope;
pub mod errors;

pub use client::{ApiClient, BodyEncoding, RequestBody};
pub use envelope::{ListPage, Unwrapped};
pub use errors::{extract_api_error, ApiError, ExtractedError};
