//! Configuration for the atomizer.
//!
//! Every value kind dispatches to a builder; [`AtomizerOptions`] lets any of
//! them be replaced, seeds a pre-shared dictionary, and controls what
//! happens to values no builder claims.

use alloc::{boxed::Box, vec::Vec};

use crate::{
    atom::AtomKind,
    error::EncodeError,
    value::{Kind, Value},
    writer::Writer,
};

/// A builder's hint whether the value it just emitted is worth
/// deduplicating.
///
/// Cacheable values are entered into the reference table under their
/// atom-index, so later occurrences of the same value become
/// back-references. Transient values are re-emitted every time; leaves whose
/// inline encoding is already as small as a back-reference (small integers,
/// NaN) opt out this way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cacheability {
    Cacheable,
    Transient,
}

/// A builder: emits the cells representing `value` through the [`Writer`]
/// and reports the value's cacheability.
pub type BuildFn = Box<dyn Fn(&Value, &mut Writer<'_>) -> Result<Cacheability, EncodeError>>;

/// Configuration options for [`Atomizer`](crate::Atomizer).
///
/// Each kind field, when set, replaces the default builder for that kind.
/// Overrides receive the full [`Writer`] surface, so they can emit scalars,
/// wrap children in header/jump pairs, and recurse.
///
/// # Examples
///
/// ```
/// use atompack::{custom_encoder, AtomizerOptions, Cacheability, Value};
///
/// let options = AtomizerOptions {
///     string: Some(custom_encoder(|_, writer| {
///         writer.write(&Value::Bool(true))?;
///         Ok(Cacheability::Cacheable)
///     })),
///     ..AtomizerOptions::default()
/// };
/// ```
#[derive(Default)]
pub struct AtomizerOptions {
    pub void: Option<BuildFn>,
    pub null: Option<BuildFn>,
    pub boolean: Option<BuildFn>,
    /// Covers both integer and float values.
    pub number: Option<BuildFn>,
    pub string: Option<BuildFn>,
    pub bytes: Option<BuildFn>,
    pub array: Option<BuildFn>,
    pub object: Option<BuildFn>,
    pub map: Option<BuildFn>,
    pub set: Option<BuildFn>,
    /// Builder for host-extension values. Without one, opaque values fail
    /// the encode unless [`keep_unknowns_as_is`] is set.
    ///
    /// [`keep_unknowns_as_is`]: AtomizerOptions::keep_unknowns_as_is
    pub opaque: Option<BuildFn>,

    /// Pass values nobody can atomize through the stream unchanged.
    ///
    /// The resulting atoms rebuild in-memory (the opaque handle is handed
    /// back), but they cannot be packed into bytes.
    ///
    /// # Default
    ///
    /// `false`
    pub keep_unknowns_as_is: bool,

    /// Values both peers agree on out of band.
    ///
    /// Dictionary entries occupy the first atom-indices, so occurrences in
    /// the input encode as bare back-references and never appear in the
    /// output. The decoding side must be seeded with the same dictionary,
    /// in the same order.
    ///
    /// # Default
    ///
    /// Empty.
    pub dictionary: Vec<Value>,
}

impl AtomizerOptions {
    pub(crate) fn override_for(&self, kind: Kind) -> Option<&BuildFn> {
        match kind {
            Kind::Void => self.void.as_ref(),
            Kind::Null => self.null.as_ref(),
            Kind::Bool => self.boolean.as_ref(),
            Kind::Number => self.number.as_ref(),
            Kind::Str => self.string.as_ref(),
            Kind::Bytes => self.bytes.as_ref(),
            Kind::Array => self.array.as_ref(),
            Kind::Object => self.object.as_ref(),
            Kind::Map => self.map.as_ref(),
            Kind::Set => self.set.as_ref(),
            Kind::Opaque => self.opaque.as_ref(),
        }
    }
}

/// Wraps a user emission closure in the framing a custom atom needs.
///
/// The closure's emissions land between a `Custom` header and its jump
/// close, so the decoding side can hand them to a custom decoder one child
/// at a time. The closure's cacheability verdict is passed through.
pub fn custom_encoder<F>(encode: F) -> BuildFn
where
    F: Fn(&Value, &mut Writer<'_>) -> Result<Cacheability, EncodeError> + 'static,
{
    Box::new(move |value, writer| {
        writer.push(AtomKind::Custom);
        let cacheability = encode(value, writer)?;
        writer.pop()?;
        Ok(cacheability)
    })
}
