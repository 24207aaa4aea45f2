//! Tagged binary encoding and decoding.
//!
//! Every encoded value begins with a single tag byte that says what, if
//! anything, follows. There is enough information in the tag alone to skip
//! over a value, which is what keeps the format forward-compatible: a
//! decoder that meets a record field it does not know can step over it.
//!
//! Most tag byte values are devoted to small unsigned integers, which
//! represent themselves: the number 17 is the single byte 17. Only the high
//! end of the byte range has special meaning.

pub mod decoder;
pub mod encoder;
pub mod primitives;

#[cfg(test)]
mod proptest_tests;

pub use decoder::{Decoder, StructStart};
pub use encoder::Encoder;
pub use primitives::{zigzag_decode, zigzag_encode, Reader, Writer};

/// Fixed-length sequence: a uint n follows, then n encoded values.
pub const NVALUES_CODE: u8 = 246;

/// Back-reference to a previously seen record: a uint index follows.
pub const REF_CODE: u8 = 247;

/// Start of a value of indeterminate length (a record body).
pub const START_CODE: u8 = 248;

/// End of a value that began with [`START_CODE`].
///
/// Also the numeric boundary of the tag vocabulary: wherever a byte is
/// tested for being an immediate unsigned integer, the test is
/// `byte < END_CODE`.
pub const END_CODE: u8 = 249;

/// Length-prefixed raw bytes: a uint n follows, then n bytes. Also
/// introduces the 4- or 8-byte form of unsigned integers too large for an
/// immediate.
pub const NBYTES_CODE: u8 = 250;

// 251-254 are reserved for future use; the decoder rejects them.

/// A nil value. Nothing follows.
pub const NIL_CODE: u8 = 255;
