//! Session error types.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors that can end a session operation.
///
/// Deliberately small: most failures inside a turn degrade to fallback text
/// or silent continuation rather than surfacing here.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A turn was requested before initialization succeeded.
    #[error("session is not ready (initialization failed or was never run)")]
    NotReady,

    /// A backend failed during session initialization.
    #[error("backend '{name}' failed during startup: {source}")]
    BackendStartup {
        name: String,
        #[source]
        source: BackendError,
    },
}
