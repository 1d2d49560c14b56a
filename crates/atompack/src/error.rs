use alloc::string::String;

use thiserror::Error;

use crate::value::Kind;

/// Failures while atomizing a value graph or packing atoms into bytes.
///
/// All failures abort the encode; partial output is discarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("no way to atomize {0} values")]
    UnsupportedValue(Kind),
    /// A value contains a currently-open ancestor that did not declare
    /// itself self-referencable.
    #[error("infinite loop when encoding")]
    InfiniteLoop,
    #[error("value encoded into nothing")]
    ValueEncodedIntoNothing,
    #[error("value too large to encode")]
    JumpOverflow,
    #[error("pop jump without a matching push")]
    UnbalancedJump,
    #[error("atom stream is not well formed")]
    MalformedAtoms,
    #[error("custom encoder failed: {0}")]
    Custom(String),
}

/// Failures while rebuilding a value graph from atoms or bytes.
///
/// Validation is best-effort: malformed input fails, but the decoder makes
/// no promises against adversarial streams.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of input")]
    IncompleteData,
    #[error("input continues past the end of the value")]
    ExcessContent,
    #[error("unrecognized tag byte {0:#04x}")]
    BadTag(u8),
    #[error("back-reference {0} does not name an earlier value")]
    BadBackRef(usize),
    #[error("varint exceeds 64 bits")]
    VarintOverflow,
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,
    #[error("object key is not a string")]
    NonStringKey,
    #[error("custom atom without a custom decoder")]
    UnknownCustom,
    #[error("custom decoder failed: {0}")]
    Custom(String),
}
