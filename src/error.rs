/// Errors produced while validating, counting or marshalling an election.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StvError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal fault: {0}")]
    InternalFault(String),
    #[error("Allocation failure: could not obtain {words} words")]
    AllocationFailure { words: usize },
}

pub type Result<T> = std::result::Result<T, StvError>;

/// Status word written into slot 0 of a result buffer on success.
pub const STATUS_OK: u32 = 0;
pub const STATUS_INVALID_INPUT: u32 = 1;
pub const STATUS_INTERNAL_FAULT: u32 = 2;
pub const STATUS_ALLOCATION_FAILURE: u32 = 3;

impl StvError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        StvError::InvalidInput(msg.into())
    }

    pub fn fault(msg: impl Into<String>) -> Self {
        StvError::InternalFault(msg.into())
    }

    /// Status code used on the wire for this error kind.
    pub fn status_code(&self) -> u32 {
        match self {
            StvError::InvalidInput(_) => STATUS_INVALID_INPUT,
            StvError::InternalFault(_) => STATUS_INTERNAL_FAULT,
            StvError::AllocationFailure { .. } => STATUS_ALLOCATION_FAILURE,
        }
    }

    /// Rebuild an error from a nonzero status word read back from a buffer.
    ///
    /// The wire format carries only the kind, so the message is generic.
    /// Unknown codes are treated as internal faults.
    pub fn from_status(code: u32) -> Option<Self> {
        match code {
            STATUS_OK => None,
            STATUS_INVALID_INPUT => Some(StvError::invalid("engine rejected the input buffer")),
            STATUS_ALLOCATION_FAILURE => Some(StvError::AllocationFailure { words: 0 }),
            STATUS_INTERNAL_FAULT => Some(StvError::fault("engine reported an internal fault")),
            other => Some(StvError::fault(format!("unknown status code {}", other))),
        }
    }
}
