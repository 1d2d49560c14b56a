//! Cycle-aware, reference-deduplicating serialization for in-memory value
//! graphs.
//!
//! A value graph, possibly containing cycles, shared subtrees, composite
//! containers and scalar leaves, is flattened into a linear *atom stream*,
//! then packed into a compact byte form of tag-embedded varints and
//! length-prefixed regions. Reconstruction yields an isomorphic graph:
//! shared substructure is shared again, and self-reference survives.
//!
//! Encoding is single-pass. A composite registers itself before its
//! children are walked, so a descendant that contains it again becomes a
//! back-reference; the decoder allocates each container shell before
//! recursing into its contents, so those back-references resolve mid-build.
//!
//! # Examples
//!
//! ```
//! use atompack::{deserialize, serialize, Value};
//!
//! let shared = Value::from("shared");
//! let graph = Value::array(vec![shared.clone(), shared.clone()]);
//! if let Value::Array(items) = &graph {
//!     items.borrow_mut().push(graph.clone()); // the array now contains itself
//! }
//!
//! let bytes = serialize(&graph).unwrap();
//! let back = deserialize(&bytes).unwrap();
//! let items = back.as_array().unwrap().borrow();
//! assert!(items[0].same(&items[1])); // sharing preserved
//! assert!(items[2].same(&back)); // cycle preserved
//! ```

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod atom;
mod atomizer;
mod builders;
mod error;
mod options;
mod rebuild;
mod serializer;
mod value;
mod wire;
mod writer;

pub use atom::{Atom, AtomKind, ATOM_BITS};
pub use atomizer::Atomizer;
pub use error::{DecodeError, EncodeError};
pub use options::{custom_encoder, AtomizerOptions, BuildFn, Cacheability};
pub use rebuild::{CustomDecodeFn, Rebuilder, ValueReader};
pub use serializer::{deserialize, serialize, Deserializer, Serializer};
pub use value::{
    ArrayRef, ByteBuf, ByteFlavor, Kind, MapRef, ObjectRef, SetRef, Value,
};
pub use wire::serialize_atoms;
pub use writer::Writer;

#[cfg(test)]
mod tests;
