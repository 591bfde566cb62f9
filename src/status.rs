//! Status codes and the error type every fallible operation returns.
//!
//! [`Status`] is the closed taxonomy shared with external readers and writers.
//! [`CifError`] is what operations actually return: one variant per fault
//! status, convertible back to its [`Status`] with [`CifError::status`].
//! Absence ("no such block", "no such item", ...) is reported through
//! `Option`, not through this type.

use std::fmt;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CifError>;

/// Syntax-diagnostic codes owned by text readers and writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxCode {
    InvalidBareValue,
    InvalidChar,
    DisallowedChar,
    MissingSpace,
    MissingEndQuote,
    UnclosedText,
    OverlengthLine,
    NoBlockHeader,
    FrameNotAllowed,
    NoFrameTerminator,
    UnexpectedTerm,
    EofInFrame,
    ReservedWord,
    MissingValue,
    UnexpectedValue,
    UnexpectedDelimiter,
    MissingDelimiter,
    MissingKey,
    UnquotedKey,
    NullKey,
}

impl SyntaxCode {
    /// Numeric code of this diagnostic.
    pub fn code(self) -> i32 {
        match self {
            SyntaxCode::InvalidBareValue => 74,
            SyntaxCode::InvalidChar => 102,
            SyntaxCode::DisallowedChar => 104,
            SyntaxCode::MissingSpace => 105,
            SyntaxCode::MissingEndQuote => 106,
            SyntaxCode::UnclosedText => 107,
            SyntaxCode::OverlengthLine => 108,
            SyntaxCode::NoBlockHeader => 113,
            SyntaxCode::FrameNotAllowed => 122,
            SyntaxCode::NoFrameTerminator => 123,
            SyntaxCode::UnexpectedTerm => 124,
            SyntaxCode::EofInFrame => 126,
            SyntaxCode::ReservedWord => 132,
            SyntaxCode::MissingValue => 133,
            SyntaxCode::UnexpectedValue => 144,
            SyntaxCode::UnexpectedDelimiter => 135,
            SyntaxCode::MissingDelimiter => 136,
            SyntaxCode::MissingKey => 137,
            SyntaxCode::UnquotedKey => 138,
            SyntaxCode::NullKey => 140,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            SyntaxCode::InvalidBareValue => "bare value starts with a disallowed character",
            SyntaxCode::InvalidChar => "invalid code sequence",
            SyntaxCode::DisallowedChar => "disallowed character",
            SyntaxCode::MissingSpace => "missing whitespace",
            SyntaxCode::MissingEndQuote => "missing closing quote",
            SyntaxCode::UnclosedText => "unterminated text field",
            SyntaxCode::OverlengthLine => "line too long",
            SyntaxCode::NoBlockHeader => "content before the first data block header",
            SyntaxCode::FrameNotAllowed => "save frames are not allowed",
            SyntaxCode::NoFrameTerminator => "missing save frame terminator",
            SyntaxCode::UnexpectedTerm => "save frame terminator outside a save frame",
            SyntaxCode::EofInFrame => "end of input inside a save frame",
            SyntaxCode::ReservedWord => "unquoted reserved word",
            SyntaxCode::MissingValue => "missing data value",
            SyntaxCode::UnexpectedValue => "unexpected data value",
            SyntaxCode::UnexpectedDelimiter => "unexpected closing delimiter",
            SyntaxCode::MissingDelimiter => "missing closing delimiter",
            SyntaxCode::MissingKey => "table entry without a key",
            SyntaxCode::UnquotedKey => "unquoted table key",
            SyntaxCode::NullKey => "table entry with an empty key",
        }
    }
}

impl fmt::Display for SyntaxCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// The closed set of operation status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    Finished,
    Error,
    MemoryError,
    InternalError,
    ArgumentError,
    Misuse,
    NotSupported,
    EnvironmentError,
    ClientError,
    DuplicateBlockCode,
    InvalidBlockCode,
    NoSuchBlock,
    DuplicateFrameCode,
    InvalidFrameCode,
    NoSuchFrame,
    CategoryNotUnique,
    InvalidCategory,
    NoSuchLoop,
    ReservedLoop,
    WrongLoop,
    EmptyLoop,
    NullLoop,
    DuplicateItemName,
    InvalidItemName,
    NoSuchItem,
    InvalidPacket,
    PartialPacket,
    DisallowedValue,
    InvalidNumber,
    InvalidIndex,
    Syntax(SyntaxCode),
}

impl Status {
    /// Numeric code, compatible with the classic CIF API numbering.
    pub fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Finished => 1,
            Status::Error => 2,
            Status::MemoryError => 3,
            Status::InternalError => 5,
            Status::ArgumentError => 6,
            Status::Misuse => 7,
            Status::NotSupported => 8,
            Status::EnvironmentError => 9,
            Status::ClientError => 10,
            Status::DuplicateBlockCode => 11,
            Status::InvalidBlockCode => 12,
            Status::NoSuchBlock => 13,
            Status::DuplicateFrameCode => 21,
            Status::InvalidFrameCode => 22,
            Status::NoSuchFrame => 23,
            Status::CategoryNotUnique => 31,
            Status::InvalidCategory => 32,
            Status::NoSuchLoop => 33,
            Status::ReservedLoop => 34,
            Status::WrongLoop => 35,
            Status::EmptyLoop => 36,
            Status::NullLoop => 37,
            Status::DuplicateItemName => 41,
            Status::InvalidItemName => 42,
            Status::NoSuchItem => 43,
            Status::InvalidPacket => 52,
            Status::PartialPacket => 53,
            Status::DisallowedValue => 62,
            Status::InvalidNumber => 72,
            Status::InvalidIndex => 73,
            Status::Syntax(code) => code.code(),
        }
    }

    /// `true` for `Ok` and `Finished`.
    pub fn is_success(self) -> bool {
        matches!(self, Status::Ok | Status::Finished)
    }

    /// `true` for the lookup-miss family, which callers see as absence.
    pub fn is_absence(self) -> bool {
        matches!(
            self,
            Status::NoSuchBlock | Status::NoSuchFrame | Status::NoSuchLoop | Status::NoSuchItem
        )
    }
}

/// A handler-originated fault raised from inside a [`Visitor`](crate::visit::Visitor).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ClientError {
    message: String,
}

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors returned by document, value, and traversal operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CifError {
    #[error("underlying failure: {0}")]
    Error(String),
    #[error("allocation failure")]
    Memory,
    #[error("internal inconsistency: {0}")]
    Internal(String),
    #[error("invalid argument: {0}")]
    Argument(String),
    #[error("operation not allowed here: {0}")]
    Misuse(String),
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("environment error: {0}")]
    Environment(String),
    #[error("handler fault: {0}")]
    Client(#[from] ClientError),
    #[error("duplicate block code `{0}`")]
    DuplicateBlockCode(String),
    #[error("invalid block code `{0}`")]
    InvalidBlockCode(String),
    #[error("duplicate frame code `{0}`")]
    DuplicateFrameCode(String),
    #[error("invalid frame code `{0}`")]
    InvalidFrameCode(String),
    #[error("more than one loop has category `{0}`")]
    CategoryNotUnique(String),
    #[error("invalid category `{0}`")]
    InvalidCategory(String),
    #[error("the scalar item loop cannot be changed this way")]
    ReservedLoop,
    #[error("packet item `{0}` does not belong to this loop")]
    WrongLoop(String),
    #[error("loop has no packets")]
    EmptyLoop,
    #[error("loop declares no item names")]
    NullLoop,
    #[error("duplicate item name `{0}`")]
    DuplicateItemName(String),
    #[error("invalid item name `{0}`")]
    InvalidItemName(String),
    #[error("no element at index {0}")]
    NoSuchItem(usize),
    #[error("invalid packet: {0}")]
    InvalidPacket(String),
    #[error("packet is missing item `{0}`")]
    PartialPacket(String),
    #[error("value not allowed here: {0}")]
    DisallowedValue(String),
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("invalid table key `{0}`")]
    InvalidIndex(String),
    #[error("{code} at byte offset {offset}")]
    Syntax { code: SyntaxCode, offset: usize },
}

impl CifError {
    /// The status code this error reports.
    pub fn status(&self) -> Status {
        match self {
            CifError::Error(_) => Status::Error,
            CifError::Memory => Status::MemoryError,
            CifError::Internal(_) => Status::InternalError,
            CifError::Argument(_) => Status::ArgumentError,
            CifError::Misuse(_) => Status::Misuse,
            CifError::NotSupported(_) => Status::NotSupported,
            CifError::Environment(_) => Status::EnvironmentError,
            CifError::Client(_) => Status::ClientError,
            CifError::DuplicateBlockCode(_) => Status::DuplicateBlockCode,
            CifError::InvalidBlockCode(_) => Status::InvalidBlockCode,
            CifError::DuplicateFrameCode(_) => Status::DuplicateFrameCode,
            CifError::InvalidFrameCode(_) => Status::InvalidFrameCode,
            CifError::CategoryNotUnique(_) => Status::CategoryNotUnique,
            CifError::InvalidCategory(_) => Status::InvalidCategory,
            CifError::ReservedLoop => Status::ReservedLoop,
            CifError::WrongLoop(_) => Status::WrongLoop,
            CifError::EmptyLoop => Status::EmptyLoop,
            CifError::NullLoop => Status::NullLoop,
            CifError::DuplicateItemName(_) => Status::DuplicateItemName,
            CifError::InvalidItemName(_) => Status::InvalidItemName,
            CifError::NoSuchItem(_) => Status::NoSuchItem,
            CifError::InvalidPacket(_) => Status::InvalidPacket,
            CifError::PartialPacket(_) => Status::PartialPacket,
            CifError::DisallowedValue(_) => Status::DisallowedValue,
            CifError::InvalidNumber(_) => Status::InvalidNumber,
            CifError::InvalidIndex(_) => Status::InvalidIndex,
            CifError::Syntax { code, .. } => Status::Syntax(*code),
        }
    }

    /// `true` for faults that leave the failing operation unrecoverable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CifError::Error(_) | CifError::Memory | CifError::Internal(_) | CifError::Environment(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_classic_numbering() {
        assert_eq!(Status::Ok.code(), 0);
        assert_eq!(Status::ClientError.code(), 10);
        assert_eq!(Status::NullLoop.code(), 37);
        assert_eq!(Status::InvalidIndex.code(), 73);
        assert_eq!(Status::Syntax(SyntaxCode::UnclosedText).code(), 107);
        assert_eq!(SyntaxCode::MissingValue.code(), 133);
        assert_eq!(SyntaxCode::UnexpectedValue.code(), 144);
        assert_eq!(SyntaxCode::UnexpectedDelimiter.code(), 135);
    }

    #[test]
    fn error_maps_to_status() {
        assert_eq!(CifError::ReservedLoop.status(), Status::ReservedLoop);
        assert_eq!(
            CifError::PartialPacket("_x".into()).status(),
            Status::PartialPacket
        );
        let client: CifError = ClientError::new("stop").into();
        assert_eq!(client.status(), Status::ClientError);
        assert!(!client.is_fatal());
        assert!(CifError::Memory.is_fatal());
    }

    #[test]
    fn absence_family() {
        assert!(Status::NoSuchBlock.is_absence());
        assert!(!Status::DuplicateBlockCode.is_absence());
        assert!(Status::Finished.is_success());
        assert!(!Status::Misuse.is_success());
    }

    #[test]
    fn syntax_error_display() {
        let err = CifError::Syntax {
            code: SyntaxCode::MissingEndQuote,
            offset: 12,
        };
        assert_eq!(err.to_string(), "missing closing quote at byte offset 12");
    }
}
