//! The in-memory value graph model.
//!
//! This module defines the [`Value`] enum, the host representation a graph
//! codec works over. Composite values (arrays, objects, maps, sets) are
//! reference-counted and interior-mutable so a graph can share subtrees and
//! contain itself; scalar leaves are plain data.
//!
//! # Examples
//!
//! ```
//! use atompack::Value;
//!
//! let shared = Value::from("twice");
//! let v = Value::array(vec![shared.clone(), shared.clone()]);
//! assert_eq!(v.kind(), atompack::Kind::Array);
//! ```
use alloc::{rc::Rc, vec::Vec};
use core::{any::Any, cell::RefCell, fmt};

/// Shared, mutable element storage of an array or set value.
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;
/// Shared, mutable entry storage of a string-keyed object value.
pub type ObjectRef = Rc<RefCell<Vec<(Rc<str>, Value)>>>;
/// Shared, mutable entry storage of a map value with arbitrary keys.
pub type MapRef = Rc<RefCell<Vec<(Value, Value)>>>;
/// Shared, mutable element storage of a set value.
pub type SetRef = Rc<RefCell<Vec<Value>>>;

/// Interop flavor of a byte buffer.
///
/// `U8` is the plain packed form. The remaining flavors mark buffers that
/// peers exchange as typed views over raw bytes; they round-trip through the
/// wire format with their flavor intact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ByteFlavor {
    /// A plain byte string.
    #[default]
    U8,
    /// A raw backing buffer.
    Buffer,
    /// Bytes interpreted as signed octets.
    I8,
    /// Bytes with clamped-write semantics.
    ClampedU8,
    /// A view over a backing buffer.
    View,
}

/// A byte buffer leaf with its interop flavor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteBuf {
    pub flavor: ByteFlavor,
    pub data: Vec<u8>,
}

/// Classification of a [`Value`], the unit the builder table is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Void,
    Null,
    Bool,
    Number,
    Str,
    Bytes,
    Array,
    Object,
    Map,
    Set,
    Opaque,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::Void => "void",
            Kind::Null => "null",
            Kind::Bool => "boolean",
            Kind::Number => "number",
            Kind::Str => "string",
            Kind::Bytes => "bytes",
            Kind::Array => "array",
            Kind::Object => "object",
            Kind::Map => "map",
            Kind::Set => "set",
            Kind::Opaque => "opaque",
        })
    }
}

/// A node in a value graph.
///
/// Scalars are stored inline; strings and byte buffers are reference-counted
/// leaves; composites are reference-counted, interior-mutable containers.
/// Cloning a `Value` clones the handle, not the contents, so two clones of a
/// composite refer to the same underlying storage; this is the identity the
/// encoder deduplicates on.
///
/// `Object` keys are strings and `Map` keys are arbitrary values; both keep
/// insertion order, and that order is preserved across a round-trip. `Set`
/// elements likewise keep their insertion order.
#[derive(Clone)]
pub enum Value {
    Void,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Bytes(Rc<ByteBuf>),
    Array(ArrayRef),
    Object(ObjectRef),
    Map(MapRef),
    Set(SetRef),
    /// A host-extension value the codec has no intrinsic representation for.
    Opaque(Rc<dyn Any>),
}

impl Value {
    /// Classifies this value for builder dispatch.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Value::Void => Kind::Void,
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) | Value::Float(_) => Kind::Number,
            Value::Str(_) => Kind::Str,
            Value::Bytes(_) => Kind::Bytes,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
            Value::Map(_) => Kind::Map,
            Value::Set(_) => Kind::Set,
            Value::Opaque(_) => Kind::Opaque,
        }
    }

    /// Builds an array value from its elements.
    #[must_use]
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// Builds a set value from its elements, keeping their order.
    #[must_use]
    pub fn set(items: Vec<Value>) -> Value {
        Value::Set(Rc::new(RefCell::new(items)))
    }

    /// Builds a string-keyed object value from its entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use atompack::Value;
    ///
    /// let v = Value::object(vec![("answer", Value::Int(42))]);
    /// assert_eq!(v.kind(), atompack::Kind::Object);
    /// ```
    pub fn object<K, I>(entries: I) -> Value
    where
        K: Into<Rc<str>>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(Rc::new(RefCell::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )))
    }

    /// Builds a map value with arbitrary keys from its entries.
    pub fn map<I>(entries: I) -> Value
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        Value::Map(Rc::new(RefCell::new(entries.into_iter().collect())))
    }

    /// Builds a plain byte-string leaf.
    #[must_use]
    pub fn bytes(data: impl Into<Vec<u8>>) -> Value {
        Value::view(ByteFlavor::U8, data)
    }

    /// Builds a byte buffer leaf with an explicit interop flavor.
    #[must_use]
    pub fn view(flavor: ByteFlavor, data: impl Into<Vec<u8>>) -> Value {
        Value::Bytes(Rc::new(ByteBuf {
            flavor,
            data: data.into(),
        }))
    }

    /// Wraps a host-extension value.
    #[must_use]
    pub fn opaque(value: Rc<dyn Any>) -> Value {
        Value::Opaque(value)
    }

    /// Identity comparison: `true` when both handles designate the same
    /// node (or the same scalar for inline leaves).
    ///
    /// Unlike `==` this never recurses, so it is safe on cyclic graphs.
    #[must_use]
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b),
            (Value::Bytes(a), Value::Bytes(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) | (Value::Set(a), Value::Set(b)) => {
                Rc::ptr_eq(a, b)
            }
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Opaque(a), Value::Opaque(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Bool(b) = self { Some(*b) } else { None }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        if let Value::Int(n) = self { Some(*n) } else { None }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let Value::Float(f) = self { Some(*f) } else { None }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        if let Value::Str(s) = self { Some(&**s) } else { None }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&ByteBuf> {
        if let Value::Bytes(b) = self { Some(&**b) } else { None }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&ArrayRef> {
        if let Value::Array(a) = self { Some(a) } else { None }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        if let Value::Object(o) = self { Some(o) } else { None }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&MapRef> {
        if let Value::Map(m) = self { Some(m) } else { None }
    }

    #[must_use]
    pub fn as_set(&self) -> Option<&SetRef> {
        if let Value::Set(s) = self { Some(s) } else { None }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(Rc::from(v))
    }
}

impl From<alloc::string::String> for Value {
    fn from(v: alloc::string::String) -> Self {
        Self::Str(Rc::from(v))
    }
}

impl From<Rc<str>> for Value {
    fn from(v: Rc<str>) -> Self {
        Self::Str(v)
    }
}

/// Structural equality.
///
/// Scalars compare by content, composites by contents in order, opaques by
/// identity. Comparison recurses through composites and does not terminate
/// on cyclic graphs; use [`Value::same`] for identity checks on those.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Array(a), Value::Array(b)) | (Value::Set(a), Value::Set(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Object(a), Value::Object(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Opaque(a), Value::Opaque(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// Depth-capped so that debug-printing a cyclic graph terminates.
const DEBUG_DEPTH: usize = 8;

struct DebugAt<'a>(&'a Value, usize);

impl fmt::Debug for DebugAt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let DebugAt(value, depth) = *self;
        if depth > DEBUG_DEPTH {
            return f.write_str("…");
        }
        match value {
            Value::Void => f.write_str("Void"),
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Bytes(b) => write!(f, "Bytes({:?}, {:?})", b.flavor, b.data),
            Value::Array(items) => f
                .debug_list()
                .entries(items.borrow().iter().map(|v| DebugAt(v, depth + 1)))
                .finish(),
            Value::Set(items) => f
                .debug_set()
                .entries(items.borrow().iter().map(|v| DebugAt(v, depth + 1)))
                .finish(),
            Value::Object(entries) => {
                let entries = entries.borrow();
                let mut map = f.debug_map();
                for (k, v) in entries.iter() {
                    map.entry(&&**k, &DebugAt(v, depth + 1));
                }
                map.finish()
            }
            Value::Map(entries) => {
                let entries = entries.borrow();
                let mut map = f.debug_map();
                for (k, v) in entries.iter() {
                    map.entry(&DebugAt(k, depth + 1), &DebugAt(v, depth + 1));
                }
                map.finish()
            }
            Value::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        DebugAt(self, 0).fmt(f)
    }
}
