use thiserror::Error;

/// Setup-time layout errors.
///
/// All of these are configuration mistakes; none is transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The type name matched no grammar, or named an unknown scalar kind.
    #[error("unsupported uniform type `{0}`")]
    UnsupportedType(String),

    /// The same field name appeared twice in one struct.
    #[error("duplicate uniform field `{0}`")]
    DuplicateField(String),

    /// A field or struct name is not a valid WGSL identifier.
    #[error("`{0}` is not a valid WGSL identifier")]
    InvalidIdentifier(String),

    /// A struct declaration was requested for a layout with no fields.
    #[error("struct `{0}` has no members")]
    EmptyStruct(String),
}
