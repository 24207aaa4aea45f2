//! The type registry: the directory the top-level dispatch runs on.
//!
//! Every type that crosses [`Encoder::encode_any`](crate::Encoder::encode_any)
//! must be registered, built-ins included. A registry is built once during
//! single-threaded startup and then shared immutably by every encoder and
//! decoder; the stream itself carries only type names, so encoder and
//! decoder processes agree as long as they register the same names.

use std::any::{Any, TypeId};
use std::fmt;

use rustc_hash::FxHashMap;

use crate::codec::{Decoder, Encoder};
use crate::error::DecodeError;

/// Encodes one value of a registered type. The value is guaranteed to be of
/// the type the function was registered under.
pub type EncodeFn = fn(&mut Encoder<'_>, &dyn Any);

/// Decodes one value of a registered type.
pub type DecodeFn = fn(&mut Decoder<'_>) -> Result<Box<dyn Any>, DecodeError>;

/// How to encode and decode one registered type.
pub struct TypeInfo {
    name: String,
    pub(crate) encode: EncodeFn,
    pub(crate) decode: DecodeFn,
}

impl TypeInfo {
    /// The canonical name, the identifier that appears in stream preludes.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Directory from type identities and canonical names to codec functions.
///
/// [`Registry::new`] pre-registers the built-in primitive types. Consumers
/// add their record types with [`Registry::register`] before constructing
/// any encoder or decoder.
pub struct Registry {
    types: Vec<TypeInfo>,
    by_name: FxHashMap<String, usize>,
    by_type: FxHashMap<TypeId, usize>,
}

impl Registry {
    /// Creates a registry holding the built-in types: `i64`, `u64`,
    /// `isize`, `f64`, `bool`, `String`, and `Vec<u8>`.
    pub fn new() -> Self {
        let mut registry = Self {
            types: Vec::new(),
            by_name: FxHashMap::default(),
            by_type: FxHashMap::default(),
        };
        registry.register_builtins();
        registry
    }

    /// Registers type `T` under `name` with its codec function pair.
    ///
    /// Names are canonical: `<qualifier>.<simple-name>` for qualified
    /// types (e.g. `"ast.File"`), the simple name otherwise.
    ///
    /// # Panics
    ///
    /// Panics if `name` or `T` is already registered; registering the same
    /// type twice is a programming error, not a recoverable condition.
    pub fn register<T: 'static>(&mut self, name: impl Into<String>, encode: EncodeFn, decode: DecodeFn) {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            panic!("register: duplicate type name {name:?}");
        }
        let type_id = TypeId::of::<T>();
        if self.by_type.contains_key(&type_id) {
            panic!("register: type already registered, refusing second name {name:?}");
        }
        let index = self.types.len();
        self.by_name.insert(name.clone(), index);
        self.by_type.insert(type_id, index);
        self.types.push(TypeInfo { name, encode, decode });
    }

    /// Looks up a type by canonical name.
    pub fn lookup_by_name(&self, name: &str) -> Option<&TypeInfo> {
        self.by_name.get(name).map(|&i| &self.types[i])
    }

    /// Looks up a type by its Rust type identity.
    pub fn lookup_by_type(&self, type_id: TypeId) -> Option<&TypeInfo> {
        self.by_type.get(&type_id).map(|&i| &self.types[i])
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn register_builtins(&mut self) {
        self.register::<i64>(
            "i64",
            |e, x| e.encode_int(*expect_concrete::<i64>(x)),
            |d| Ok(Box::new(d.decode_int()?)),
        );
        self.register::<u64>(
            "u64",
            |e, x| e.encode_uint(*expect_concrete::<u64>(x)),
            |d| Ok(Box::new(d.decode_uint()?)),
        );
        // The platform-sized integer travels as i64 and is narrowed back on
        // the decoding side.
        self.register::<isize>(
            "isize",
            |e, x| e.encode_int(*expect_concrete::<isize>(x) as i64),
            |d| Ok(Box::new(d.decode_int()? as isize)),
        );
        self.register::<f64>(
            "f64",
            |e, x| e.encode_float(*expect_concrete::<f64>(x)),
            |d| Ok(Box::new(d.decode_float()?)),
        );
        self.register::<bool>(
            "bool",
            |e, x| e.encode_bool(*expect_concrete::<bool>(x)),
            |d| Ok(Box::new(d.decode_bool()?)),
        );
        self.register::<String>(
            "string",
            |e, x| e.encode_string(expect_concrete::<String>(x)),
            |d| Ok(Box::new(d.decode_string()?.to_owned())),
        );
        self.register::<Vec<u8>>(
            "bytes",
            |e, x| e.encode_bytes(expect_concrete::<Vec<u8>>(x)),
            |d| Ok(Box::new(d.decode_bytes()?.to_vec())),
        );
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.types.iter().map(TypeInfo::name).collect::<Vec<_>>())
            .finish()
    }
}

/// Downcasts the value handed to a registered encode function. Dispatch is
/// by type identity, so a mismatch here is a registration bug.
fn expect_concrete<T: 'static>(x: &dyn Any) -> &T {
    x.downcast_ref::<T>().expect("encode function invoked with a value of the wrong type")
}
