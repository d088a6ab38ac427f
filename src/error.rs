//! Error types for the camera source.

use crate::camera::NegotiationError;
use crate::il::{ComponentRole, ComponentState, IlError, PortRole};
use thiserror::Error;

/// Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for camera source operations.
///
/// Setup and teardown failures are surfaced through this type to the caller
/// of the enclosing lifecycle operation. Per-frame data problems are not:
/// they only mark the affected output buffer as corrupted.
#[derive(Error, Debug)]
pub enum Error {
    /// A hardware component call failed.
    #[error("hardware component error: {0}")]
    Il(#[from] IlError),

    /// Negotiation with the pipeline failed.
    #[error("negotiation failed: {0}")]
    Negotiation(#[from] NegotiationError),

    /// A frame was requested before a format was committed.
    #[error("not negotiated")]
    NotNegotiated,

    /// A component did not reach the requested state within the bound.
    #[error("{component} did not switch to {state} state: {source}")]
    StateTimeout {
        /// Component name.
        component: String,
        /// State that was requested.
        state: ComponentState,
        /// Underlying hardware error.
        source: IlError,
    },

    /// A component was observed in a state that the operation cannot handle.
    #[error("{component} in unexpected state {state}")]
    InvalidState {
        /// Component name.
        component: String,
        /// Observed state.
        state: ComponentState,
    },

    /// A component required by the operation was never opened.
    #[error("{0} component not opened")]
    ComponentMissing(ComponentRole),

    /// A port required by the operation could not be resolved.
    #[error("{0} port not available")]
    PortMissing(PortRole),

    /// A property was set to a value outside its range.
    #[error("invalid value for property {name}: {reason}")]
    InvalidProperty {
        /// Property name.
        name: &'static str,
        /// Reason the value was rejected.
        reason: String,
    },
}

impl Error {
    /// Create an invalid-property error.
    pub fn invalid_property(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidProperty {
            name,
            reason: reason.into(),
        }
    }
}
