use freeview_core::SceneError;

/// Errors returned by the anchor controller.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AnchorError {
    #[error("viewer frame is not available")]
    AnchorUnavailable,
    #[error("scene node `{0}` not found")]
    NodeNotFound(String),
    #[error("invalid anchor transition: {0}")]
    InvalidTransition(&'static str),
    #[error(transparent)]
    Scene(#[from] SceneError),
}
