use thiserror::Error;

/// Per-write uniform errors.
///
/// A failed write leaves both the host copy and the device buffer untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UniformError {
    /// No field with this name exists in the layout.
    #[error("unknown uniform field `{0}`")]
    UnknownField(String),

    /// More values were supplied than the field has components.
    #[error("uniform field `{field}` takes at most {expected} values, got {got}")]
    SizeMismatch {
        field: String,
        expected: usize,
        got: usize,
    },
}
