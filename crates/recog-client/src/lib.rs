//! Resource client: typed access to the forge server's `/recog` endpoints.

pub mod api;
pub mod client;
mod config;
mod error;

pub use api::{InsightFilter, ListQuery, Page, RecogApi};
pub use client::RecogClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::ClientError;
