//! Listener errors

use dom_tree::DomError;
use thiserror::Error;

pub type ListenerResult = std::result::Result<(), ListenerError>;

#[derive(Debug, Error)]
pub enum ListenerError {
    /// A tree operation inside the handler failed
    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("Listener failed: {0}")]
    Failed(String),

    #[error("Maximum dispatch depth exceeded: {current} > {max}")]
    DispatchDepthExceeded { current: usize, max: usize },
}
