//! Hardening limits for decoding untrusted input.
//!
//! The wire format itself places no bounds on nesting or table sizes, so
//! the decoder enforces these before recursing or allocating.

/// Maximum recursion depth of the generic skip routine.
///
/// Skipping an unknown field follows nested lists and framed regions
/// recursively; input nested deeper than this is rejected.
pub const MAX_SKIP_DEPTH: usize = 128;

/// Maximum number of type names a stream prelude may declare.
///
/// Bounds the table allocation performed before any name has been
/// resolved against the registry.
pub const MAX_STREAM_TYPES: usize = 1 << 16;
