use thiserror::Error;

/// Errors raised by the clustering, association and merge engines and by the
/// sample store. Configuration errors always name the offending sample or
/// parameter so the caller can report them without further context.
#[derive(Debug, Error)]
pub enum TsrError {
    #[error("Invalid value for `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Unstranded interval {fhash} in sample '{sample}'; TSS and TSR data must be stranded")]
    Unstranded { sample: String, fhash: String },

    #[error("Interval {fhash} in sample '{sample}' must have 1 <= start <= end")]
    InvalidInterval { sample: String, fhash: String },

    #[error("Feature {fhash} appears more than once in sample '{sample}'")]
    DuplicateFeature { sample: String, fhash: String },

    #[error("Sample '{sample}' declares `{field}` but interval {fhash} has no value for it")]
    MissingField {
        sample: String,
        field: &'static str,
        fhash: String,
    },

    #[error("Unknown {role} sample '{sample}'")]
    UnknownSample { role: &'static str, sample: String },

    #[error("TSS sample '{sample}' has no TSR sample of the same name and no sample mapping was given")]
    MissingSamplePair { sample: String },

    #[error("TSS sample '{sample}' is mapped to more than one TSR sample")]
    DuplicateMapping { sample: String },

    #[error("Slot '{slot}' holds {found} records, expected {expected}")]
    SlotKind {
        slot: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Slot '{slot}' is empty")]
    EmptySlot { slot: &'static str },

    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(String),
}

impl TsrError {
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        TsrError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl From<TsrError> for std::io::Error {
    fn from(e: TsrError) -> Self {
        match e {
            TsrError::Io(inner) => inner,
            other => std::io::Error::new(std::io::ErrorKind::InvalidInput, other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, TsrError>;
