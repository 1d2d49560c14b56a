//! The traversal that flattens a value graph into an atom stream.
//!
//! Encoding is single-pass: a composite registers itself in the reference
//! table *before* its children are walked, so a child (or a deeper
//! descendant) that contains the composite again resolves to a
//! back-reference instead of recursing forever. The table entry passes
//! through two states: an open sentinel while the value may not be
//! referenced yet, then its atom-index once the value is addressable on the
//! decoding side.

use alloc::{collections::BTreeMap, rc::Rc, vec::Vec};

use crate::{
    atom::Atom,
    builders,
    error::EncodeError,
    options::{AtomizerOptions, Cacheability},
    value::{Kind, Value},
    writer::Writer,
};

/// Identity key of a value in the reference table.
///
/// Reference-counted values key by pointer, so two equal-but-distinct
/// strings encode twice while a shared one deduplicates. Numbers key by
/// value, the way the reference table of a host with primitive numbers
/// would.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum RefKey {
    Ptr(usize),
    Int(i64),
    Float(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RefSlot {
    /// The value is mid-encode and may not be back-referenced yet.
    Open,
    /// The value owns this atom-index; occurrences become back-references.
    Indexed(usize),
}

pub(crate) fn ref_key(value: &Value) -> Option<RefKey> {
    match value {
        Value::Void | Value::Null | Value::Bool(_) => None,
        Value::Int(n) => Some(RefKey::Int(*n)),
        Value::Float(f) => Some(RefKey::Float(f.to_bits())),
        Value::Str(s) => Some(RefKey::Ptr(Rc::as_ptr(s).cast::<u8>() as usize)),
        Value::Bytes(b) => Some(RefKey::Ptr(Rc::as_ptr(b).cast::<u8>() as usize)),
        Value::Array(a) | Value::Set(a) => Some(RefKey::Ptr(Rc::as_ptr(a).cast::<u8>() as usize)),
        Value::Object(o) => Some(RefKey::Ptr(Rc::as_ptr(o).cast::<u8>() as usize)),
        Value::Map(m) => Some(RefKey::Ptr(Rc::as_ptr(m).cast::<u8>() as usize)),
        Value::Opaque(v) => Some(RefKey::Ptr(Rc::as_ptr(v).cast::<u8>() as usize)),
    }
}

/// The value currently being atomized. `allow_self_reference` and the
/// close-time promotion act on this frame.
#[derive(Debug, Clone, Copy)]
struct Frame {
    key: Option<RefKey>,
    index: usize,
}

#[derive(Default)]
pub(crate) struct EncodeState {
    pub(crate) out: Vec<Atom>,
    refs: BTreeMap<RefKey, RefSlot>,
    pub(crate) jumps: Vec<usize>,
    atom_index: usize,
    active: Option<Frame>,
}

impl EncodeState {
    fn seeded(dictionary: &[Value]) -> Self {
        let mut state = EncodeState::default();
        for (index, value) in dictionary.iter().enumerate() {
            if let Some(key) = ref_key(value) {
                state.refs.insert(key, RefSlot::Indexed(index));
            }
        }
        state.atom_index = dictionary.len();
        state
    }

    /// Promotes the active frame's reference entry from the open sentinel
    /// to its atom-index. No-op once promoted.
    pub(crate) fn promote_active(&mut self) {
        let Some(frame) = self.active else { return };
        let Some(key) = frame.key else { return };
        if self.refs.get(&key) == Some(&RefSlot::Open) {
            self.refs.insert(key, RefSlot::Indexed(frame.index));
        }
    }
}

pub(crate) fn atomize_value(
    options: &AtomizerOptions,
    state: &mut EncodeState,
    value: &Value,
) -> Result<(), EncodeError> {
    let key = ref_key(value);
    if let Some(key) = key {
        match state.refs.get(&key) {
            Some(RefSlot::Open) => return Err(EncodeError::InfiniteLoop),
            Some(RefSlot::Indexed(index)) => {
                state.out.push(Atom::BackRef(*index));
                return Ok(());
            }
            None => {}
        }
    }

    let index = state.atom_index;
    state.atom_index += 1;
    if let Some(key) = key {
        state.refs.insert(key, RefSlot::Open);
    }
    let saved = state.active.replace(Frame { key, index });
    let start = state.out.len();

    let cacheability = dispatch(options, state, value)?;

    if state.out.len() == start {
        return Err(EncodeError::ValueEncodedIntoNothing);
    }
    if let Some(key) = key {
        match cacheability {
            Cacheability::Cacheable => {
                state.refs.insert(key, RefSlot::Indexed(index));
            }
            Cacheability::Transient => {
                state.refs.remove(&key);
            }
        }
    }
    state.active = saved;
    Ok(())
}

fn dispatch(
    options: &AtomizerOptions,
    state: &mut EncodeState,
    value: &Value,
) -> Result<Cacheability, EncodeError> {
    let kind = value.kind();
    let mut writer = Writer { state, options };
    if let Some(build) = options.override_for(kind) {
        return build(value, &mut writer);
    }
    match kind {
        Kind::Void | Kind::Null | Kind::Bool => builders::sentinel(value, &mut writer),
        Kind::Number => builders::number(value, &mut writer),
        Kind::Str => builders::string(value, &mut writer),
        Kind::Bytes => builders::bytes(value, &mut writer),
        Kind::Array => builders::array(value, &mut writer),
        Kind::Set => builders::set(value, &mut writer),
        Kind::Object => builders::object(value, &mut writer),
        Kind::Map => builders::map(value, &mut writer),
        Kind::Opaque => builders::opaque(value, &mut writer),
    }
}

/// Flattens value graphs into atom streams.
///
/// Recursion depth is proportional to the graph's nesting; deeply nested
/// inputs are bounded by the call stack.
///
/// # Examples
///
/// ```
/// use atompack::{Atom, AtomKind, Atomizer, Value};
///
/// let x = Value::array(vec![Value::Int(1)]);
/// if let Value::Array(items) = &x {
///     items.borrow_mut().push(x.clone()); // x now contains itself
/// }
///
/// let atoms = Atomizer::default().atomize(&x).unwrap();
/// assert_eq!(
///     atoms,
///     vec![
///         Atom::Header { kind: AtomKind::Array, until: 4 },
///         Atom::AsIs,
///         Atom::Scalar(Value::Int(1)),
///         Atom::BackRef(0),
///     ]
/// );
/// ```
pub struct Atomizer {
    options: AtomizerOptions,
}

impl Atomizer {
    #[must_use]
    pub fn new(options: AtomizerOptions) -> Self {
        Self { options }
    }

    /// Atomizes one value graph.
    ///
    /// # Errors
    ///
    /// Any [`EncodeError`] raised during the traversal; partial output is
    /// discarded.
    pub fn atomize(&self, value: &Value) -> Result<Vec<Atom>, EncodeError> {
        let mut state = EncodeState::seeded(&self.options.dictionary);
        atomize_value(&self.options, &mut state, value)?;
        if !state.jumps.is_empty() {
            return Err(EncodeError::UnbalancedJump);
        }
        Ok(state.out)
    }
}

impl Default for Atomizer {
    fn default() -> Self {
        Self::new(AtomizerOptions::default())
    }
}
