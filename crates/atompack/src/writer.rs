//! The emission surface handed to builders.

use crate::{
    atom::{Atom, AtomKind, MAX_UNTIL},
    atomizer::{atomize_value, EncodeState},
    error::EncodeError,
    options::AtomizerOptions,
    value::Value,
};

/// Append-only sink for atoms during an encode.
///
/// A `Writer` borrows the in-flight encoding state, so everything a builder
/// emits lands in the same stream, reference table and jump stack as the
/// surrounding traversal. Builders receive it by `&mut` and use it for
/// everything they produce.
pub struct Writer<'a> {
    pub(crate) state: &'a mut EncodeState,
    pub(crate) options: &'a AtomizerOptions,
}

impl Writer<'_> {
    /// Recursively atomizes a child value.
    ///
    /// The child is classified, dispatched to its builder, assigned its own
    /// atom-index, and deduplicated against the reference table.
    pub fn write(&mut self, child: &Value) -> Result<(), EncodeError> {
        atomize_value(self.options, self.state, child)
    }

    /// Appends a cell verbatim. No atom-index is assigned.
    ///
    /// Scalar cells appended this way still occupy a stream position the
    /// decoding side will treat as a value; prefer [`Writer::scalar`] or
    /// [`Writer::write`] unless the cell layout is managed by hand.
    pub fn raw(&mut self, atom: Atom) {
        self.state.out.push(atom);
    }

    /// Appends an inline scalar literal.
    ///
    /// Integers get an as-is marker first; any other literal's cell form
    /// already distinguishes it from a header word and is appended bare.
    pub fn scalar(&mut self, value: Value) {
        if matches!(value, Value::Int(_)) {
            self.state.out.push(Atom::AsIs);
        }
        self.state.out.push(Atom::Scalar(value));
    }

    /// Appends a composite header with its until-index left open, and
    /// reserves the slot on the jump stack.
    pub fn push(&mut self, kind: AtomKind) {
        self.state.jumps.push(self.state.out.len());
        self.state.out.push(Atom::Header { kind, until: 0 });
    }

    /// Closes the innermost open header: the current stream length becomes
    /// its until-index.
    ///
    /// If the active value has not yet declared itself self-referencable,
    /// this is the point its reference-table entry is promoted from the
    /// open sentinel to its atom-index, so occurrences from here on become
    /// back-references.
    ///
    /// # Errors
    ///
    /// [`EncodeError::JumpOverflow`] when the until-index does not survive
    /// the header's packed representation, [`EncodeError::UnbalancedJump`]
    /// without a matching [`Writer::push`].
    pub fn pop(&mut self) -> Result<(), EncodeError> {
        let Some(reserved) = self.state.jumps.pop() else {
            return Err(EncodeError::UnbalancedJump);
        };
        let until = self.state.out.len();
        if until > MAX_UNTIL {
            return Err(EncodeError::JumpOverflow);
        }
        match self.state.out.get_mut(reserved) {
            Some(Atom::Header { until: slot, .. }) => *slot = until,
            _ => return Err(EncodeError::UnbalancedJump),
        }
        self.state.promote_active();
        Ok(())
    }

    /// Declares that the active value may be back-referenced by its own
    /// descendants.
    ///
    /// Installs the active value's atom-index in the reference table while
    /// its subtree is still open. Idempotent per frame. A descendant that
    /// reaches the value without this declaration fails the encode with
    /// [`EncodeError::InfiniteLoop`].
    pub fn allow_self_reference(&mut self) {
        self.state.promote_active();
    }
}
