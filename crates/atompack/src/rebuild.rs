//! Reconstruction of value graphs from atoms or packed bytes.
//!
//! The central discipline: a container is allocated and cached *before* its
//! contents are recursed into, so a child holding a back-reference to its
//! still-being-populated ancestor resolves to the very shell being filled.
//! Both input forms, atom cells and packed bytes, feed the same core
//! through the [`CellSource`] seam; only the meaning of a position differs
//! (cell index vs byte offset).

use alloc::{rc::Rc, vec::Vec};
use core::cell::RefCell;

use crate::{
    atom::{Atom, AtomKind},
    error::DecodeError,
    value::Value,
};

/// A normalized cell, as either cursor yields it.
pub(crate) enum Cell {
    Scalar(Value),
    Header { kind: AtomKind, until: usize },
    BackRef(usize),
}

/// Linear supply of cells with a positional cursor.
///
/// `pos` is the until-index domain of the source: cell index for atom
/// streams, byte offset for packed bytes. The region boundary is
/// positional; there is no terminator cell.
pub(crate) trait CellSource {
    fn pos(&self) -> usize;
    fn done(&self) -> bool;
    fn next(&mut self) -> Result<Cell, DecodeError>;
}

struct AtomCursor<'a> {
    atoms: &'a [Atom],
    pos: usize,
}

impl CellSource for AtomCursor<'_> {
    fn pos(&self) -> usize {
        self.pos
    }

    fn done(&self) -> bool {
        self.pos >= self.atoms.len()
    }

    fn next(&mut self) -> Result<Cell, DecodeError> {
        let Some(atom) = self.atoms.get(self.pos) else {
            return Err(DecodeError::IncompleteData);
        };
        self.pos += 1;
        match atom {
            Atom::Scalar(value) => Ok(Cell::Scalar(value.clone())),
            Atom::AsIs => {
                let Some(Atom::Scalar(value)) = self.atoms.get(self.pos) else {
                    return Err(DecodeError::IncompleteData);
                };
                self.pos += 1;
                Ok(Cell::Scalar(value.clone()))
            }
            Atom::Header { kind: AtomKind::AsIs, .. } => Err(DecodeError::BadTag(0)),
            Atom::Header { kind, until } => Ok(Cell::Header { kind: *kind, until: *until }),
            Atom::BackRef(index) => Ok(Cell::BackRef(*index)),
        }
    }
}

/// The bounded reader a custom decoder consumes its children through.
///
/// Yields the values the custom encoder wrote, in order, and `None` once
/// the custom atom's region is exhausted.
pub trait ValueReader {
    /// # Errors
    ///
    /// Any [`DecodeError`] raised while decoding the next child.
    fn read_next(&mut self) -> Result<Option<Value>, DecodeError>;
}

/// Reconstructs the value of a custom atom from its children.
pub type CustomDecodeFn = dyn Fn(&mut dyn ValueReader) -> Result<Value, DecodeError>;

struct RegionReader<'a, S: CellSource> {
    inner: &'a mut Reconstructor<S>,
    until: usize,
}

impl<S: CellSource> ValueReader for RegionReader<'_, S> {
    fn read_next(&mut self) -> Result<Option<Value>, DecodeError> {
        self.inner.next_value(Some(self.until))
    }
}

pub(crate) struct Reconstructor<S> {
    source: S,
    cache: Vec<Value>,
    custom: Option<Rc<CustomDecodeFn>>,
}

impl<S: CellSource> Reconstructor<S> {
    pub(crate) fn new(
        source: S,
        dictionary: &[Value],
        custom: Option<Rc<CustomDecodeFn>>,
    ) -> Self {
        Self {
            source,
            cache: dictionary.to_vec(),
            custom,
        }
    }

    pub(crate) fn run(mut self) -> Result<Value, DecodeError> {
        let value = self
            .next_value(None)?
            .ok_or(DecodeError::IncompleteData)?;
        if !self.source.done() {
            return Err(DecodeError::ExcessContent);
        }
        Ok(value)
    }

    /// Decodes one value, or returns `None` at the `until` boundary.
    ///
    /// Every decoded value claims the next cache slot in stream order,
    /// mirroring the atom-index assignment on the encoding side; back-
    /// references consume no slot.
    fn next_value(&mut self, until: Option<usize>) -> Result<Option<Value>, DecodeError> {
        if let Some(until) = until {
            if self.source.pos() >= until {
                return Ok(None);
            }
        }
        match self.source.next()? {
            Cell::BackRef(index) => {
                let value = self
                    .cache
                    .get(index)
                    .ok_or(DecodeError::BadBackRef(index))?;
                Ok(Some(value.clone()))
            }
            Cell::Scalar(value) => {
                self.cache.push(value.clone());
                Ok(Some(value))
            }
            Cell::Header { kind, until } => self.composite(kind, until).map(Some),
        }
    }

    fn composite(&mut self, kind: AtomKind, until: usize) -> Result<Value, DecodeError> {
        match kind {
            AtomKind::Array | AtomKind::Set => {
                let items = Rc::new(RefCell::new(Vec::new()));
                let shell = if matches!(kind, AtomKind::Array) {
                    Value::Array(Rc::clone(&items))
                } else {
                    Value::Set(Rc::clone(&items))
                };
                self.cache.push(shell.clone());
                while let Some(child) = self.next_value(Some(until))? {
                    items.borrow_mut().push(child);
                }
                Ok(shell)
            }
            AtomKind::Object => {
                let entries = Rc::new(RefCell::new(Vec::new()));
                let shell = Value::Object(Rc::clone(&entries));
                self.cache.push(shell.clone());
                let mut keys = Vec::new();
                while let Some(key) = self.next_value(Some(until))? {
                    keys.push(key);
                }
                for key in keys {
                    let Value::Str(key) = key else {
                        return Err(DecodeError::NonStringKey);
                    };
                    let child = self
                        .next_value(None)?
                        .ok_or(DecodeError::IncompleteData)?;
                    entries.borrow_mut().push((key, child));
                }
                Ok(shell)
            }
            AtomKind::Map => {
                let entries = Rc::new(RefCell::new(Vec::new()));
                let shell = Value::Map(Rc::clone(&entries));
                self.cache.push(shell.clone());
                let mut keys = Vec::new();
                while let Some(key) = self.next_value(Some(until))? {
                    keys.push(key);
                }
                for key in keys {
                    let child = self
                        .next_value(None)?
                        .ok_or(DecodeError::IncompleteData)?;
                    entries.borrow_mut().push((key, child));
                }
                Ok(shell)
            }
            AtomKind::Custom => {
                let Some(decode) = self.custom.clone() else {
                    return Err(DecodeError::UnknownCustom);
                };
                // The slot is claimed before the children so index
                // assignment stays aligned; a custom atom cannot be
                // referenced from inside its own region.
                let slot = self.cache.len();
                self.cache.push(Value::Null);
                let decode: &CustomDecodeFn = &*decode;
                let value = decode(&mut RegionReader { inner: self, until })?;
                if self.source.pos() != until {
                    return Err(DecodeError::ExcessContent);
                }
                self.cache[slot] = value.clone();
                Ok(value)
            }
            AtomKind::AsIs => Err(DecodeError::BadTag(0)),
        }
    }
}

/// Reconstructs value graphs from atom streams.
///
/// The in-memory counterpart of [`Deserializer`](crate::Deserializer):
/// consumes the atomizer's output directly, so values an encode kept as-is
/// (opaque handles) are handed back untouched. Recursion depth is
/// proportional to the graph's nesting, as on the encoding side.
#[derive(Default)]
pub struct Rebuilder {
    dictionary: Vec<Value>,
    custom: Option<Rc<CustomDecodeFn>>,
}

impl Rebuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the reconstruction cache, mirroring the encoder's dictionary.
    #[must_use]
    pub fn with_dictionary(mut self, dictionary: Vec<Value>) -> Self {
        self.dictionary = dictionary;
        self
    }

    /// Installs the decoder for custom atoms.
    #[must_use]
    pub fn with_decoder<F>(mut self, decode: F) -> Self
    where
        F: Fn(&mut dyn ValueReader) -> Result<Value, DecodeError> + 'static,
    {
        let decode: Rc<CustomDecodeFn> = Rc::new(decode);
        self.custom = Some(decode);
        self
    }

    /// Rebuilds one value graph from its atom stream.
    ///
    /// # Errors
    ///
    /// Any [`DecodeError`]; excess or incomplete input fails.
    pub fn rebuild(&self, atoms: &[Atom]) -> Result<Value, DecodeError> {
        Reconstructor::new(
            AtomCursor { atoms, pos: 0 },
            &self.dictionary,
            self.custom.clone(),
        )
        .run()
    }
}
