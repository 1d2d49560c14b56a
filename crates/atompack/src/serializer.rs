//! End-to-end façades: value graph to packed bytes and back.

use alloc::{rc::Rc, vec::Vec};

use crate::{
    atomizer::Atomizer,
    error::{DecodeError, EncodeError},
    options::AtomizerOptions,
    rebuild::{CustomDecodeFn, Reconstructor, ValueReader},
    value::Value,
    wire::{serialize_atoms, ByteCursor},
};

/// Atomizes a value graph and packs the atoms into bytes in one step.
///
/// # Examples
///
/// ```
/// use atompack::{AtomizerOptions, Deserializer, Serializer, Value};
///
/// let serializer = Serializer::new(AtomizerOptions::default());
/// let bytes = serializer.serialize(&Value::from("hello")).unwrap();
/// let back = Deserializer::new().deserialize(&bytes).unwrap();
/// assert_eq!(back, Value::from("hello"));
/// ```
#[derive(Default)]
pub struct Serializer {
    atomizer: Atomizer,
}

impl Serializer {
    #[must_use]
    pub fn new(options: AtomizerOptions) -> Self {
        Self {
            atomizer: Atomizer::new(options),
        }
    }

    /// # Errors
    ///
    /// Any [`EncodeError`] from the traversal or the packing stage.
    pub fn serialize(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        let atoms = self.atomizer.atomize(value)?;
        serialize_atoms(&atoms)
    }
}

/// Parses packed bytes and reconstructs the value graph.
///
/// Must be configured with the same dictionary (and a matching custom
/// decoder) as the encoding side; the wire format carries no version or
/// dictionary fingerprint.
#[derive(Default)]
pub struct Deserializer {
    dictionary: Vec<Value>,
    custom: Option<Rc<CustomDecodeFn>>,
}

impl Deserializer {
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

    /// # Errors
    ///
    /// Any [`DecodeError`]; a stream is complete exactly when the cursor
    /// reaches its end.
    pub fn deserialize(&self, bytes: &[u8]) -> Result<Value, DecodeError> {
        Reconstructor::new(ByteCursor::new(bytes), &self.dictionary, self.custom.clone()).run()
    }
}

/// Serializes with default options.
///
/// # Errors
///
/// Any [`EncodeError`].
pub fn serialize(value: &Value) -> Result<Vec<u8>, EncodeError> {
    Serializer::default().serialize(value)
}

/// Deserializes with default options.
///
/// # Errors
///
/// Any [`DecodeError`].
pub fn deserialize(bytes: &[u8]) -> Result<Value, DecodeError> {
    Deserializer::default().deserialize(bytes)
}
