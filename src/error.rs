//! Error types for decoding.

use thiserror::Error;

/// Error during binary decoding.
///
/// Every way a byte stream can be malformed maps to one variant here.
/// Misuse of the API on the encoding side (an unregistered type, a
/// duplicate registration) is a programming error and panics instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The input ended in the middle of a value.
    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    /// A tag byte that is not valid where it appeared, including the
    /// reserved range 251-254.
    #[error("bad code {code} while reading {context}")]
    BadCode { code: u8, context: &'static str },

    /// The width byte of a multi-byte unsigned integer was not 4 or 8.
    #[error("bad uint width {width}, expected 4 or 8")]
    BadUintWidth { width: u8 },

    /// A boolean byte other than 0 or 1.
    #[error("bad bool value {value}, expected 0 or 1")]
    BadBool { value: u8 },

    /// A string value was not valid UTF-8.
    #[error("invalid UTF-8 in {context}")]
    InvalidUtf8 { context: &'static str },

    /// A fixed-length list had the wrong number of elements.
    #[error("list of length {len} where {expected} elements were expected")]
    BadListLength { expected: usize, len: usize },

    /// A type number past the end of the stream's type table.
    #[error("type number {num} out of range, stream declares {count} types")]
    TypeNumOutOfRange { num: u64, count: usize },

    /// The prelude declared more types than the decoder will allocate for.
    #[error("stream declares {count} types, more than the supported {max}")]
    TooManyTypes { count: usize, max: usize },

    /// A type name in the prelude that the registry does not know.
    #[error("unregistered type {name:?}")]
    UnregisteredType { name: String },

    /// A back-reference to a record that has not been decoded yet.
    #[error("record reference {index} out of range, {count} records seen so far")]
    RefOutOfRange { index: u64, count: usize },

    /// A shared record resolved to a value of the wrong type.
    #[error("shared record does not have the type expected by {context}")]
    RefTypeMismatch { context: &'static str },

    /// Nesting deeper than the skip routine will follow.
    #[error("value nesting deeper than {max} levels")]
    NestingTooDeep { max: usize },
}
