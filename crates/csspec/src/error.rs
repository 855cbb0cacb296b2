use core::result;
use thiserror::Error;

/// Everything that can abort preparing or running a stylesheet.
///
/// Expectation mismatches are not errors; they surface as failed cases.
#[derive(Debug, Error)]
pub enum CsspecError {
    #[error("cannot parse selector {selector:?}: {reason}")]
    Parse { selector: String, reason: String },

    #[error("nested requirement: {0:?} contains more than one -it- class")]
    NestedRequirement(String),

    #[error("selector {0:?} cannot be applied to the fixture")]
    UnappliableSelector(String),

    #[error("unsupported function source {text:?}")]
    FunctionSource { text: String },

    #[error("failed to load stylesheet {url}: {reason}")]
    Load { url: String, reason: String },

    #[error(transparent)]
    Dom(#[from] anyhow::Error),
}

impl CsspecError {
    pub(crate) fn parse(selector: &str, reason: &str) -> Self {
        Self::Parse {
            selector: selector.to_owned(),
            reason: reason.to_owned(),
        }
    }
}

pub type Result<T, E = CsspecError> = result::Result<T, E>;
