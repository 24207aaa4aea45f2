//! Stream encoding.

use std::any::{Any, TypeId};
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::codec::primitives::{zigzag_encode, Writer};
use crate::codec::{END_CODE, NBYTES_CODE, NIL_CODE, NVALUES_CODE, REF_CODE, START_CODE};
use crate::registry::{Registry, TypeInfo};

/// Identity key for a record pointer: the raw `Rc` address plus the
/// pointee's type, so two live records never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RefKey {
    addr: usize,
    type_id: TypeId,
}

impl RefKey {
    fn of<T: 'static>(rc: &Rc<T>) -> Self {
        Self {
            addr: Rc::as_ptr(rc) as usize,
            type_id: TypeId::of::<T>(),
        }
    }
}

/// An encoder for a single byte stream.
///
/// To use an encoder:
/// - create one over a [`Registry`] with [`Encoder::new`];
/// - call [`Encoder::encode_any`] one or more times;
/// - retrieve the finished stream with [`Encoder::bytes`].
///
/// Record encode functions drive the lower-level operations directly:
/// [`Encoder::start_struct`] / [`Encoder::end_struct`] for framing and the
/// per-primitive `encode_*` methods for field values.
///
/// An encoder is single-threaded; it holds interior numbering state that is
/// mutated by every call.
pub struct Encoder<'r> {
    registry: &'r Registry,
    w: Writer,
    /// Stream numbers assigned to types, in first-use order. The map and
    /// the vector grow together; `stream_types[n]` is the type numbered n.
    type_nums: FxHashMap<TypeId, usize>,
    stream_types: Vec<&'r TypeInfo>,
    /// Records already emitted, keyed by pointer identity. The value is the
    /// record number assigned at first emission.
    seen: FxHashMap<RefKey, u64>,
}

impl<'r> Encoder<'r> {
    /// Creates an empty encoder that dispatches through `registry`.
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_capacity(registry, 0)
    }

    /// Creates an empty encoder with a pre-allocated payload buffer.
    pub fn with_capacity(registry: &'r Registry, capacity: usize) -> Self {
        Self {
            registry,
            w: Writer::with_capacity(capacity),
            type_nums: FxHashMap::default(),
            stream_types: Vec::new(),
            seen: FxHashMap::default(),
        }
    }

    /// Encodes one top-level value. Equivalent to [`Encoder::encode_any`].
    ///
    /// # Panics
    ///
    /// Panics if the value's type has not been registered.
    pub fn encode(&mut self, x: Option<&dyn Any>) {
        self.encode_any(x);
    }

    // =========================================================================
    // PRIMITIVES
    // =========================================================================

    /// Encodes an unsigned integer.
    ///
    /// Values below [`END_CODE`] fit in the tag byte itself; larger values
    /// are written as [`NBYTES_CODE`], a literal width byte (4 or 8), and
    /// that many little-endian bytes.
    pub fn encode_uint(&mut self, u: u64) {
        if u < u64::from(END_CODE) {
            self.w.write_byte(u as u8);
        } else if u <= u64::from(u32::MAX) {
            self.w.write_byte(NBYTES_CODE);
            self.w.write_byte(4);
            self.w.write_u32(u as u32);
        } else {
            self.w.write_byte(NBYTES_CODE);
            self.w.write_byte(8);
            self.w.write_u64(u);
        }
    }

    /// Encodes a signed integer via the zigzag fold, so small negative
    /// values stay as short as small positive ones.
    pub fn encode_int(&mut self, i: i64) {
        self.encode_uint(zigzag_encode(i));
    }

    /// Encodes an f64 as the unsigned encoding of its bit pattern.
    pub fn encode_float(&mut self, f: f64) {
        self.encode_uint(f.to_bits());
    }

    /// Encodes a bool as a single 0 or 1 byte.
    pub fn encode_bool(&mut self, b: bool) {
        self.w.write_byte(u8::from(b));
    }

    /// Encodes the length prefix of a byte sequence.
    fn encode_len(&mut self, n: usize) {
        self.w.write_byte(NBYTES_CODE);
        self.encode_uint(n as u64);
    }

    /// Encodes a byte slice.
    pub fn encode_bytes(&mut self, b: &[u8]) {
        self.encode_len(b.len());
        self.w.write_bytes(b);
    }

    /// Encodes a string. The bytes are preserved verbatim.
    pub fn encode_string(&mut self, s: &str) {
        self.encode_len(s.len());
        self.w.write_str(s);
    }

    /// Encodes the nil marker.
    pub fn encode_nil(&mut self) {
        self.w.write_byte(NIL_CODE);
    }

    /// Starts a fixed-length sequence of `len` values. The caller encodes
    /// the elements afterwards; there is no end marker.
    pub fn start_list(&mut self, len: usize) {
        self.w.write_byte(NVALUES_CODE);
        self.encode_uint(len as u64);
    }

    // =========================================================================
    // RECORD FRAMING
    // =========================================================================

    /// Starts a record. Returns whether the caller should encode fields.
    ///
    /// `None` encodes the nil marker. A pointer already seen in this stream
    /// encodes a back-reference to its record number. A new pointer is
    /// assigned the next record number and opens a framed region; the
    /// caller then emits (field number, field value) pairs and finishes
    /// with [`Encoder::end_struct`].
    pub fn start_struct<T: 'static>(&mut self, ptr: Option<&Rc<T>>) -> bool {
        let Some(rc) = ptr else {
            self.encode_nil();
            return false;
        };
        let key = RefKey::of(rc);
        if let Some(&num) = self.seen.get(&key) {
            self.w.write_byte(REF_CODE);
            self.encode_uint(num);
            return false;
        }
        let num = self.seen.len() as u64;
        self.seen.insert(key, num);
        self.w.write_byte(START_CODE);
        true
    }

    /// Closes the framed region opened by [`Encoder::start_struct`].
    pub fn end_struct(&mut self) {
        self.w.write_byte(END_CODE);
    }

    // =========================================================================
    // TOP-LEVEL DISPATCH
    // =========================================================================

    /// Encodes a value of any registered type, or the nil value.
    ///
    /// `None` is a single zero byte. Anything else is a two-element list of
    /// the type's stream number (assigned on first use) and the payload
    /// produced by the type's encode function.
    ///
    /// # Panics
    ///
    /// Panics if the value's type has not been registered.
    pub fn encode_any(&mut self, x: Option<&dyn Any>) {
        let Some(x) = x else {
            self.w.write_byte(0);
            return;
        };
        let registry = self.registry;
        let type_id = x.type_id();
        let Some(info) = registry.lookup_by_type(type_id) else {
            panic!("encode_any: value type is not registered ({type_id:?})");
        };
        let num = match self.type_nums.get(&type_id) {
            Some(&num) => num,
            None => {
                let num = self.stream_types.len();
                self.type_nums.insert(type_id, num);
                self.stream_types.push(info);
                num
            }
        };
        self.start_list(2);
        self.encode_uint(num as u64);
        (info.encode)(self, x);
    }

    // =========================================================================
    // FINALIZATION
    // =========================================================================

    /// Finishes the stream and returns its bytes.
    ///
    /// The prelude (the list of type names in stream-number order) cannot
    /// be written until every payload value has been encoded, so the
    /// payload is detached, the prelude is encoded into the emptied buffer,
    /// and the payload is appended after it.
    pub fn bytes(mut self) -> Vec<u8> {
        let payload = self.w.take_bytes();
        let types = std::mem::take(&mut self.stream_types);
        self.start_list(types.len());
        for info in types {
            self.encode_string(info.name());
        }
        let mut out = self.w.into_bytes();
        out.extend_from_slice(&payload);
        out
    }
}
