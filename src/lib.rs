//! graphwire: a self-describing binary codec for object graphs that
//! preserves pointer sharing.
//!
//! The codec targets serialization of large trees with internal sharing: a
//! record referenced from multiple points is encoded once and referenced by
//! position everywhere else, so shared subtrees and even cycles survive a
//! round trip intact. It relies on per-type codec functions supplied at
//! registration rather than runtime reflection, trading compactness for
//! speed and predictability.
//!
//! # Quick Start
//!
//! ```rust
//! use graphwire::{Decoder, Encoder, Registry};
//!
//! // Built once at startup; record types are added with `register`.
//! let registry = Registry::new();
//!
//! let mut enc = Encoder::new(&registry);
//! enc.encode_any(Some(&42u64));
//! enc.encode_any(Some(&String::from("hi")));
//! let bytes = enc.bytes();
//!
//! let mut dec = Decoder::new(&registry, &bytes);
//! let n = dec.decode().unwrap().unwrap();
//! assert_eq!(*n.downcast::<u64>().unwrap(), 42);
//! let s = dec.decode().unwrap().unwrap();
//! assert_eq!(*s.downcast::<String>().unwrap(), "hi");
//! ```
//!
//! # Modules
//!
//! - [`codec`]: the tag vocabulary, [`Encoder`], [`Decoder`], and the byte
//!   primitives they are built on
//! - [`registry`]: the type directory driving top-level dispatch
//! - [`error`]: the decode error type
//! - [`limits`]: hardening limits for untrusted input
//!
//! # Wire Format
//!
//! A stream has two sections. The prelude lists the names of the types the
//! payload uses, in the order they were first encoded; a type's position in
//! that list is its number for the rest of the stream. The payload is one
//! encoded value per encode call. Every value starts with a single tag
//! byte; small unsigned integers are their own tag, and records are framed
//! regions whose repeat appearances collapse into back-references.
//!
//! # Security
//!
//! The decoder never trusts the input: every read is bounds-checked, tag
//! bytes outside the vocabulary are rejected, table indices are checked
//! against what the stream has actually declared, and recursive skipping
//! of unknown fields is depth-limited.
//!
//! # Sharing
//!
//! Records participate in sharing detection through `Rc` handles; identity
//! is the `Rc` allocation address plus the pointee type. Sharing of
//! primitives, strings, and sequences is not tracked. Encoders and decoders
//! are single-threaded; the registry is read-only after startup and may be
//! shared freely.

pub mod codec;
pub mod error;
pub mod limits;
pub mod registry;

pub use codec::{Decoder, Encoder, StructStart};
pub use error::DecodeError;
pub use registry::{DecodeFn, EncodeFn, Registry, TypeInfo};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
