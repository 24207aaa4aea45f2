//! Stream decoding.

use std::any::Any;
use std::rc::Rc;

use crate::codec::primitives::{zigzag_decode, Reader};
use crate::codec::{END_CODE, NBYTES_CODE, NIL_CODE, NVALUES_CODE, REF_CODE, START_CODE};
use crate::error::DecodeError;
use crate::limits::{MAX_SKIP_DEPTH, MAX_STREAM_TYPES};
use crate::registry::{Registry, TypeInfo};

/// Outcome of reading the leading byte of a record.
#[derive(Clone)]
pub enum StructStart {
    /// The record was nil; the caller leaves its destination empty.
    Nil,
    /// A back-reference to a record decoded earlier in this stream; the
    /// caller downcasts and adopts it instead of decoding fields.
    Ref(Rc<dyn Any>),
    /// A new record. The caller allocates it, calls
    /// [`Decoder::store_ref`], and then decodes fields.
    New,
}

/// A decoder for a stream produced by [`Encoder`](crate::Encoder).
///
/// To use a decoder:
/// - construct one over the stream bytes with [`Decoder::new`], using a
///   registry holding the same types the encoder dispatched through;
/// - call [`Decoder::decode`] once for each encoder-side encode call.
///
/// Byte- and string-returning operations borrow from the input buffer
/// without copying; callers that outlive the buffer must copy.
pub struct Decoder<'a> {
    registry: &'a Registry,
    r: Reader<'a>,
    /// Type descriptors in stream-number order, rebuilt from the prelude on
    /// the first decode call.
    type_infos: Option<Vec<&'a TypeInfo>>,
    /// Previously decoded records in sighting order; back-references index
    /// into this.
    refs: Vec<Rc<dyn Any>>,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder over `data`, dispatching through `registry`.
    pub fn new(registry: &'a Registry, data: &'a [u8]) -> Self {
        Self {
            registry,
            r: Reader::new(data),
            type_infos: None,
            refs: Vec::new(),
        }
    }

    /// Returns the current read position in the input.
    pub fn position(&self) -> usize {
        self.r.position()
    }

    /// Returns the number of input bytes not yet consumed.
    pub fn remaining_len(&self) -> usize {
        self.r.remaining_len()
    }

    /// Decodes one top-level value. Equivalent to [`Decoder::decode_any`].
    pub fn decode(&mut self) -> Result<Option<Box<dyn Any>>, DecodeError> {
        self.decode_any()
    }

    // =========================================================================
    // PRIMITIVES
    // =========================================================================

    /// Decodes an unsigned integer.
    pub fn decode_uint(&mut self) -> Result<u64, DecodeError> {
        let b = self.r.read_byte("uint")?;
        match b {
            b if b < END_CODE => Ok(u64::from(b)),
            NBYTES_CODE => match self.r.read_byte("uint width")? {
                4 => Ok(u64::from(self.r.read_u32("uint payload")?)),
                8 => self.r.read_u64("uint payload"),
                width => Err(DecodeError::BadUintWidth { width }),
            },
            code => Err(DecodeError::BadCode { code, context: "uint" }),
        }
    }

    /// Decodes a signed integer.
    pub fn decode_int(&mut self) -> Result<i64, DecodeError> {
        Ok(zigzag_decode(self.decode_uint()?))
    }

    /// Decodes an f64 from its bit pattern.
    pub fn decode_float(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_bits(self.decode_uint()?))
    }

    /// Decodes a bool.
    pub fn decode_bool(&mut self) -> Result<bool, DecodeError> {
        match self.r.read_byte("bool")? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(DecodeError::BadBool { value }),
        }
    }

    /// Decodes the length prefix of a byte sequence.
    fn decode_len(&mut self) -> Result<usize, DecodeError> {
        let b = self.r.read_byte("length prefix")?;
        if b != NBYTES_CODE {
            return Err(DecodeError::BadCode { code: b, context: "length prefix" });
        }
        Ok(self.decode_uint()? as usize)
    }

    /// Decodes a byte slice, borrowed from the input.
    pub fn decode_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let n = self.decode_len()?;
        self.r.read_bytes(n, "bytes payload")
    }

    /// Decodes a string, borrowed from the input.
    pub fn decode_string(&mut self) -> Result<&'a str, DecodeError> {
        let n = self.decode_len()?;
        self.r.read_str(n, "string payload")
    }

    /// Starts a fixed-length sequence, returning its length, or `None` if
    /// the encoded list was nil. Element decoding is the caller's
    /// responsibility.
    pub fn start_list(&mut self) -> Result<Option<usize>, DecodeError> {
        let b = self.r.read_byte("list")?;
        match b {
            NIL_CODE => Ok(None),
            NVALUES_CODE => Ok(Some(self.decode_uint()? as usize)),
            code => Err(DecodeError::BadCode { code, context: "list" }),
        }
    }

    // =========================================================================
    // RECORD FRAMING
    // =========================================================================

    /// Starts a record.
    ///
    /// In the [`StructStart::New`] case the caller must allocate the record
    /// and call [`Decoder::store_ref`] BEFORE decoding any fields, so that
    /// the record takes the next record number and a back-reference to
    /// itself resolves.
    pub fn start_struct(&mut self) -> Result<StructStart, DecodeError> {
        let b = self.r.read_byte("struct")?;
        match b {
            NIL_CODE => Ok(StructStart::Nil),
            REF_CODE => {
                let index = self.decode_uint()?;
                match self.refs.get(index as usize) {
                    Some(record) => Ok(StructStart::Ref(record.clone())),
                    None => Err(DecodeError::RefOutOfRange {
                        index,
                        count: self.refs.len(),
                    }),
                }
            }
            START_CODE => Ok(StructStart::New),
            code => Err(DecodeError::BadCode { code, context: "struct" }),
        }
    }

    /// Records a freshly allocated record so later back-references can
    /// resolve to it. Must be called before the record's fields are
    /// decoded.
    pub fn store_ref(&mut self, record: Rc<dyn Any>) {
        self.refs.push(record);
    }

    /// Returns the next field number, or `None` when the record body ends
    /// (consuming the end marker).
    pub fn next_struct_field(&mut self) -> Result<Option<u64>, DecodeError> {
        if self.r.peek_byte("struct field")? == END_CODE {
            self.r.read_byte("struct end")?;
            return Ok(None);
        }
        Ok(Some(self.decode_uint()?))
    }

    /// Steps over the value of a field number this decoder does not know.
    /// Keeps old consumers compatible with streams from newer producers.
    pub fn unknown_field(&mut self, _type_name: &str, _field: u64) -> Result<(), DecodeError> {
        self.skip_value(0)
    }

    /// Reads past exactly one encoded value.
    fn skip_value(&mut self, depth: usize) -> Result<(), DecodeError> {
        if depth >= MAX_SKIP_DEPTH {
            return Err(DecodeError::NestingTooDeep { max: MAX_SKIP_DEPTH });
        }
        let b = self.r.read_byte("value")?;
        match b {
            NIL_CODE => Ok(()),
            NBYTES_CODE => {
                let n = self.decode_uint()? as usize;
                self.r.read_bytes(n, "skipped bytes")?;
                Ok(())
            }
            NVALUES_CODE => {
                let n = self.decode_uint()?;
                for _ in 0..n {
                    self.skip_value(depth + 1)?;
                }
                Ok(())
            }
            REF_CODE => {
                self.decode_uint()?;
                Ok(())
            }
            START_CODE => {
                while self.r.peek_byte("struct body")? != END_CODE {
                    self.skip_value(depth + 1)?;
                }
                self.r.read_byte("struct end")?;
                Ok(())
            }
            b if b < END_CODE => Ok(()),
            code => Err(DecodeError::BadCode { code, context: "skipped value" }),
        }
    }

    // =========================================================================
    // TOP-LEVEL DISPATCH
    // =========================================================================

    /// Decodes a value encoded with
    /// [`Encoder::encode_any`](crate::Encoder::encode_any).
    ///
    /// The first call materializes the type table from the stream prelude;
    /// later calls share it.
    pub fn decode_any(&mut self) -> Result<Option<Box<dyn Any>>, DecodeError> {
        if self.type_infos.is_none() {
            self.decode_initial()?;
        }
        // A zero byte here is the nil value, not a pair.
        if self.r.peek_byte("top-level value")? == 0 {
            self.r.read_byte("top-level value")?;
            return Ok(None);
        }
        let len = self
            .start_list()?
            .ok_or(DecodeError::BadCode { code: NIL_CODE, context: "top-level pair" })?;
        if len != 2 {
            return Err(DecodeError::BadListLength { expected: 2, len });
        }
        let num = self.decode_uint()?;
        let info = {
            let infos = self.type_infos.as_ref().expect("type table materialized above");
            *infos
                .get(num as usize)
                .ok_or(DecodeError::TypeNumOutOfRange { num, count: infos.len() })?
        };
        Ok(Some((info.decode)(self)?))
    }

    /// Rebuilds the type table from the prelude: a list of type names whose
    /// positions are the stream's type numbers.
    fn decode_initial(&mut self) -> Result<(), DecodeError> {
        let count = self
            .start_list()?
            .ok_or(DecodeError::BadCode { code: NIL_CODE, context: "type prelude" })?;
        if count > MAX_STREAM_TYPES {
            return Err(DecodeError::TooManyTypes { count, max: MAX_STREAM_TYPES });
        }
        let registry = self.registry;
        let mut infos = Vec::with_capacity(count);
        for _ in 0..count {
            let name = self.decode_string()?;
            let info = registry
                .lookup_by_name(name)
                .ok_or_else(|| DecodeError::UnregisteredType { name: name.to_owned() })?;
            infos.push(info);
        }
        self.type_infos = Some(infos);
        Ok(())
    }
}
