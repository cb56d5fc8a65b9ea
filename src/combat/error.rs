use thiserror::Error;

/// Failure to parse a stored or user-supplied label
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown character type: {0}")]
    CharacterKind(String),

    #[error("unknown reset condition: {0}")]
    ResetCondition(String),

    #[error("unknown recovery type: {0}")]
    RecoveryType(String),
}
