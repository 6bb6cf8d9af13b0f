//! Auth backend module.
//!
//! This module defines the `AuthBackend` trait the session manager depends
//! on, plus the two implementations the app toggles between:
//! - `HttpBackend`: the school's REST API (JSON envelope, bearer tokens)
//! - `MockBackend`: simulated delay and canned users for offline work

pub mod backend;
pub mod client;
pub mod error;
pub mod mock;

use std::sync::Arc;
use std::time::Duration;

pub use backend::{ApiResponse, AuthBackend, BackendError, LoginResponse};
pub use client::HttpBackend;
pub use error::ApiError;
pub use mock::MockBackend;

use crate::config::Config;

/// Build the backend selected by `use_mock_data`.
pub fn backend_from_config(config: &Config) -> Result<Arc<dyn AuthBackend>, ApiError> {
    if config.use_mock_data {
        tracing::info!(delay_ms = config.mock_delay_ms, "Using mock auth backend");
        Ok(Arc::new(MockBackend::new(Duration::from_millis(config.mock_delay_ms))))
    } else {
        tracing::info!(base_url = %config.base_url, "Using HTTP auth backend");
        let backend = HttpBackend::new(
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Arc::new(backend))
    }
}
