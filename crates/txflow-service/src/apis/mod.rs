//! HTTP handlers, one module per page area.

pub mod error;
pub mod session;
pub mod transaction;
pub mod wallet;

pub use error::{ApiError, ErrorResponse};

/// Joins an explorer base URL and a path.
pub(crate) fn explorer_link(base: Option<&str>, kind: &str, id: &str) -> Option<String> {
	base.map(|base| format!("{}/{}/{}", base.trim_end_matches('/'), kind, id))
}
