//! Error types for record and collection validation
//!
//! Error codes:
//! - FIELD_NOT_NULLABLE (absent value where not permitted)
//! - FIELD_VALUE_ERROR (predicate or arity failure)
//! - FIELD_TYPE_ERROR (post-coercion type mismatch)
//! - CANNOT_BE_SERIALIZED_TO_PODS
//! - RECORDS_ARE_IMMUTABLE
//! - TYPE_REDEFINED, UNKNOWN_TYPE (registry)
//! - INVALID_ARGUMENTS (construction signature)
//! - PERSISTENCE_FAILED
//! - EXTERNAL (raised by caller-supplied coerce/check code, passed through)
//!
//! The first three share the common "field error" root: they are the only
//! kinds that receive a path prefix at a field boundary.

use std::error::Error as StdError;
use std::fmt;

/// Boxed error raised by caller-supplied code.
pub type ExternalError = Box<dyn StdError + Send + Sync + 'static>;

/// Error kinds, each with a stable string code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Absent value in a non-nullable position
    FieldNotNullable,
    /// Present value rejected by a predicate, a conversion, or an arity rule
    FieldValueError,
    /// Value does not conform to the declared type
    FieldTypeError,
    /// Value type has neither a PODS projection nor a marshaller
    CannotBeSerializedToPods,
    /// Attempted post-construction mutation
    RecordsAreImmutable,
    /// Type name already registered
    TypeRedefined,
    /// Type name not found in the registry
    UnknownType,
    /// Construction called with the wrong argument shape
    InvalidArguments,
    /// Opaque-graph encoding or decoding failed
    PersistenceFailed,
    /// Error raised by caller code, carried verbatim
    External,
}

impl ErrorKind {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::FieldNotNullable => "FIELD_NOT_NULLABLE",
            ErrorKind::FieldValueError => "FIELD_VALUE_ERROR",
            ErrorKind::FieldTypeError => "FIELD_TYPE_ERROR",
            ErrorKind::CannotBeSerializedToPods => "CANNOT_BE_SERIALIZED_TO_PODS",
            ErrorKind::RecordsAreImmutable => "RECORDS_ARE_IMMUTABLE",
            ErrorKind::TypeRedefined => "TYPE_REDEFINED",
            ErrorKind::UnknownType => "UNKNOWN_TYPE",
            ErrorKind::InvalidArguments => "INVALID_ARGUMENTS",
            ErrorKind::PersistenceFailed => "PERSISTENCE_FAILED",
            ErrorKind::External => "EXTERNAL",
        }
    }

    /// Whether this kind belongs to the field error family
    pub fn is_field_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::FieldNotNullable | ErrorKind::FieldValueError | ErrorKind::FieldTypeError
        )
    }

    /// Whether this kind is a value error. A non-nullable violation is a
    /// specialised value error.
    pub fn is_value_error(&self) -> bool {
        matches!(self, ErrorKind::FieldNotNullable | ErrorKind::FieldValueError)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error raised while defining, constructing, serializing or reconstructing
/// records and collections
#[derive(Debug)]
pub struct RecordError {
    kind: ErrorKind,
    message: String,
    source: Option<ExternalError>,
}

impl RecordError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Absent value where a value is required
    pub fn not_nullable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FieldNotNullable, message)
    }

    /// Value rejected
    pub fn value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FieldValueError, message)
    }

    /// Value of the wrong type
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FieldTypeError, message)
    }

    /// Value cannot be projected to a PODS
    pub fn cannot_serialize(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CannotBeSerializedToPods, message)
    }

    /// Mutation attempted on an instance of `type_name`
    pub fn immutable(type_name: &str) -> Self {
        Self::new(
            ErrorKind::RecordsAreImmutable,
            format!("{} objects are immutable", type_name),
        )
    }

    /// Type name already taken
    pub fn redefined(type_name: &str) -> Self {
        Self::new(
            ErrorKind::TypeRedefined,
            format!("a type named '{}' is already defined", type_name),
        )
    }

    /// Type name not registered
    pub fn unknown_type(type_name: &str) -> Self {
        Self::new(
            ErrorKind::UnknownType,
            format!("no type named '{}' is registered", type_name),
        )
    }

    /// Bad construction arguments
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArguments, message)
    }

    /// Opaque-graph persistence failure
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PersistenceFailed, message)
    }

    /// Wraps an error raised by caller code. The wrapper is transparent:
    /// its message is the source's, and no path prefix is ever added.
    pub fn external(err: impl Into<ExternalError>) -> Self {
        let source = err.into();
        Self {
            kind: ErrorKind::External,
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Prefixes the message with a path descriptor. Only field errors are
    /// annotated; everything else is returned untouched.
    pub fn with_path(mut self, path: &str) -> Self {
        if self.kind.is_field_error() && !path.is_empty() {
            self.message = join_path(path, &self.message);
        }
        self
    }

    /// Returns the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message, including any path prefix
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether this is a field error (not-nullable, value or type)
    pub fn is_field_error(&self) -> bool {
        self.kind.is_field_error()
    }

    /// Recovers the caller error carried by an `External` error
    pub fn downcast_external<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref::<E>()
    }

    /// Consumes the error, returning the caller error if there is one
    pub fn into_external(self) -> Option<ExternalError> {
        self.source
    }
}

/// Joins a path descriptor onto a message. Messages that already start with
/// a separator ("[elem] ...", ": ...", " cannot ...") are appended directly.
fn join_path(path: &str, message: &str) -> String {
    match message.chars().next() {
        Some(' ' | ':' | '.' | '[' | '<') | None => format!("{}{}", path, message),
        Some(_) => format!("{}: {}", path, message),
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::External => write!(f, "{}", self.message),
            kind => write!(f, "{}: {}", kind.code(), self.message.trim_start()),
        }
    }
}

impl StdError for RecordError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

/// Result type for record operations
pub type RecordResult<T> = Result<T, RecordError>;
