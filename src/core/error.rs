//! Error types for the mine reset engine

use thiserror::Error;

use crate::world::SinkError;

/// Main error type for the engine
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown world '{0}'")]
    UnknownWorld(String),

    #[error("malformed composition: {0}")]
    MalformedComposition(String),

    #[error("invalid block '{0}'")]
    InvalidBlock(String),

    #[error("non-numeric reset warning '{0}'")]
    InvalidWarning(String),

    #[error("invalid weight {weight} for block {block}")]
    InvalidWeight { block: String, weight: f64 },

    #[error("malformed mine record: {0}")]
    MalformedRecord(String),

    #[error("teleport point {0} is below y = 0")]
    InvalidTeleportPoint(String),

    #[error("mine '{0}' already exists")]
    DuplicateMine(String),

    #[error("no mine named '{0}'")]
    UnknownMine(String),

    #[error("block sink failed while resetting mine '{mine}': {source}")]
    Sink {
        mine: String,
        #[source]
        source: SinkError,
    },

    #[error("mine '{0}' is already resetting")]
    ResetInFlight(String),

    #[error("fill for mine '{0}' ended without signalling completion")]
    FillAborted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error belongs to the load-time configuration class.
    ///
    /// Configuration errors keep a single mine offline; they never touch other mines.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownWorld(_)
                | Error::MalformedComposition(_)
                | Error::InvalidBlock(_)
                | Error::InvalidWarning(_)
                | Error::InvalidWeight { .. }
                | Error::MalformedRecord(_)
                | Error::InvalidTeleportPoint(_)
                | Error::DuplicateMine(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(Error::UnknownWorld("nether".into()).is_configuration());
        assert!(Error::InvalidWarning("soon".into()).is_configuration());
        assert!(Error::InvalidTeleportPoint("[0, -1, 0]".into()).is_configuration());
        assert!(!Error::ResetInFlight("quarry".into()).is_configuration());
        assert!(!Error::Sink { mine: "quarry".into(), source: SinkError::Closed }.is_configuration());
    }

    #[test]
    fn test_display_mentions_mine() {
        let err = Error::Sink { mine: "quarry".into(), source: SinkError::Closed };
        assert!(err.to_string().contains("quarry"));
    }
}
