//! Error reporting hook shared by every search operation.

use tracing::{debug, warn};

use crate::error::SearchError;

/// Receives every error the search layer produces, before it reaches the
/// caller. Presentation is left to whoever installs the reporter.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, operation: &str, error: &SearchError);
}

/// Default reporter: writes the error to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, operation: &str, error: &SearchError) {
        match error {
            // Caller mistakes are not worth a warning
            SearchError::InvalidRequest(_) => debug!(operation, %error, "search request rejected"),
            _ => warn!(operation, %error, "search request failed"),
        }
    }
}
