//! The packed byte form of an atom stream.
//!
//! Every position is driven by its first byte. The low bits select the
//! shape: bit 0 marks a complex atom (composite header, string or byte
//! region), bit 1 a back-reference, bit 2 an inline integer. When all three
//! are clear the byte is a scalar sentinel with its payload, if any,
//! following. Varints start in the bits of the tag byte above the tag and
//! continue with seven payload bits per continuation byte.
//!
//! Complex atoms carry their kind in bits 1–3 and a byte length above: the
//! number of bytes to the region's close. For strings and plain byte
//! buffers the region is the payload itself; for composites it is the
//! nested serialized cells of the first child-run. Object and map values
//! follow *after* the region, one complete value per key.
#![allow(clippy::cast_possible_truncation)]

use alloc::{rc::Rc, vec::Vec};

use crate::{
    atom::{Atom, AtomKind},
    error::{DecodeError, EncodeError},
    rebuild::Cell,
    value::{ByteBuf, ByteFlavor, Value},
};

/// Bits of the first byte a complex atom's tag occupies.
const SERIAL_BITS: u32 = 4;

const COMPLEX: u8 = 1;
const BACK_REF: u8 = 1 << 1;
const INT: u8 = 1 << 2;
const INT_SIGN: u8 = 1 << 3;

/// Complex-atom kinds fused with the composite kinds of the atom stream.
const KIND_BYTES: u8 = 6;
const KIND_STRING: u8 = 7;

// Scalar sentinels. All have their low four bits clear.
const VOID: u8 = 1 << 4;
const NULL: u8 = 2 << 4;
const TRUE: u8 = 3 << 4;
const FALSE: u8 = 4 << 4;
const NAN: u8 = 5 << 4;
const FLOAT64: u8 = 6 << 4;
const BUFFER: u8 = 7 << 4;
const SIGNED_BYTES: u8 = 8 << 4;
const CLAMPED_BYTES: u8 = 9 << 4;
const BYTE_VIEW: u8 = 10 << 4;

/// Packs an atom stream into bytes.
///
/// # Errors
///
/// [`EncodeError::UnsupportedValue`] for inline scalars the wire format has
/// no representation for (opaque handles kept as-is, composite handles
/// smuggled into scalar cells), [`EncodeError::MalformedAtoms`] when the
/// stream's headers and cells do not line up.
pub fn serialize_atoms(atoms: &[Atom]) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    let mut cursor = 0;
    while cursor < atoms.len() {
        serialize_value(atoms, &mut cursor, &mut out)?;
    }
    Ok(out)
}

fn serialize_value(atoms: &[Atom], cursor: &mut usize, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    let Some(atom) = atoms.get(*cursor) else {
        return Err(EncodeError::MalformedAtoms);
    };
    *cursor += 1;
    match atom {
        // On the wire the as-is marker is absorbed into the integer tag.
        Atom::AsIs => {
            let Some(Atom::Scalar(value)) = atoms.get(*cursor) else {
                return Err(EncodeError::MalformedAtoms);
            };
            *cursor += 1;
            scalar(value, out)
        }
        Atom::Scalar(value) => scalar(value, out),
        Atom::BackRef(index) => {
            put_uvarint(out, BACK_REF, 2, *index as u64);
            Ok(())
        }
        Atom::Header { kind: AtomKind::AsIs, .. } => Err(EncodeError::MalformedAtoms),
        Atom::Header { kind, until } => {
            let mut region = Vec::new();
            let mut children = 0usize;
            while *cursor < *until {
                serialize_value(atoms, cursor, &mut region)?;
                children += 1;
            }
            if *cursor != *until {
                return Err(EncodeError::MalformedAtoms);
            }
            put_uvarint(out, COMPLEX | ((*kind as u8) << 1), SERIAL_BITS, region.len() as u64);
            out.extend_from_slice(&region);
            if matches!(kind, AtomKind::Object | AtomKind::Map) {
                for _ in 0..children {
                    serialize_value(atoms, cursor, out)?;
                }
            }
            Ok(())
        }
    }
}

fn scalar(value: &Value, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    match value {
        Value::Void => out.push(VOID),
        Value::Null => out.push(NULL),
        Value::Bool(true) => out.push(TRUE),
        Value::Bool(false) => out.push(FALSE),
        Value::Int(n) => {
            if *n < 0 {
                put_uvarint(out, INT | INT_SIGN, SERIAL_BITS, !*n as u64);
            } else {
                put_uvarint(out, INT, SERIAL_BITS, *n as u64);
            }
        }
        Value::Float(f) if f.is_nan() => out.push(NAN),
        Value::Float(f) => {
            out.push(FLOAT64);
            out.extend_from_slice(&f.to_le_bytes());
        }
        Value::Str(s) => {
            put_uvarint(out, COMPLEX | (KIND_STRING << 1), SERIAL_BITS, s.len() as u64);
            out.extend_from_slice(s.as_bytes());
        }
        Value::Bytes(b) => {
            match b.flavor {
                ByteFlavor::U8 => {}
                ByteFlavor::Buffer => out.push(BUFFER),
                ByteFlavor::I8 => out.push(SIGNED_BYTES),
                ByteFlavor::ClampedU8 => out.push(CLAMPED_BYTES),
                ByteFlavor::View => out.push(BYTE_VIEW),
            }
            put_uvarint(out, COMPLEX | (KIND_BYTES << 1), SERIAL_BITS, b.data.len() as u64);
            out.extend_from_slice(&b.data);
        }
        _ => return Err(EncodeError::UnsupportedValue(value.kind())),
    }
    Ok(())
}

fn put_uvarint(out: &mut Vec<u8>, tag: u8, trash_bits: u32, mut value: u64) {
    let first_bits = 7 - trash_bits;
    let mask = (1u64 << first_bits) - 1;
    let mut byte = tag | (((value & mask) as u8) << trash_bits);
    value >>= first_bits;
    if value != 0 {
        byte |= 0x80;
    }
    out.push(byte);
    while value != 0 {
        let mut next = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            next |= 0x80;
        }
        out.push(next);
    }
}

fn get_uvarint(
    bytes: &[u8],
    cursor: &mut usize,
    first: u8,
    trash_bits: u32,
) -> Result<u64, DecodeError> {
    let first_bits = 7 - trash_bits;
    let mut value = u64::from((first >> trash_bits) & ((1u8 << first_bits) - 1));
    if first & 0x80 == 0 {
        return Ok(value);
    }
    let mut shift = first_bits;
    loop {
        let Some(&byte) = bytes.get(*cursor) else {
            return Err(DecodeError::IncompleteData);
        };
        *cursor += 1;
        if shift >= 64 {
            return Err(DecodeError::VarintOverflow);
        }
        value |= u64::from(byte & 0x7f) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
}

/// Positional cursor over packed bytes, yielding normalized cells.
pub(crate) struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.pos.checked_add(len).ok_or(DecodeError::IncompleteData)?;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or(DecodeError::IncompleteData)?;
        self.pos = end;
        Ok(slice)
    }

    /// Reads the plain byte region a flavor sentinel is followed by.
    fn byte_region(&mut self) -> Result<Vec<u8>, DecodeError> {
        let Some(&tag) = self.bytes.get(self.pos) else {
            return Err(DecodeError::IncompleteData);
        };
        self.pos += 1;
        if tag & COMPLEX == 0 || (tag >> 1) & 0x7 != KIND_BYTES {
            return Err(DecodeError::BadTag(tag));
        }
        let len = get_uvarint(self.bytes, &mut self.pos, tag, SERIAL_BITS)? as usize;
        Ok(self.take(len)?.to_vec())
    }
}

impl crate::rebuild::CellSource for ByteCursor<'_> {
    fn pos(&self) -> usize {
        self.pos
    }

    fn done(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn next(&mut self) -> Result<Cell, DecodeError> {
        let Some(&tag) = self.bytes.get(self.pos) else {
            return Err(DecodeError::IncompleteData);
        };
        self.pos += 1;

        if tag & COMPLEX != 0 {
            let kind_bits = (tag >> 1) & 0x7;
            let len = get_uvarint(self.bytes, &mut self.pos, tag, SERIAL_BITS)? as usize;
            return match kind_bits {
                KIND_STRING => {
                    let raw = self.take(len)?;
                    let s = core::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8)?;
                    Ok(Cell::Scalar(Value::Str(Rc::from(s))))
                }
                KIND_BYTES => Ok(Cell::Scalar(Value::Bytes(Rc::new(ByteBuf {
                    flavor: ByteFlavor::U8,
                    data: self.take(len)?.to_vec(),
                })))),
                _ => {
                    let kind = AtomKind::from_u8(kind_bits)
                        .filter(|kind| !matches!(kind, AtomKind::AsIs))
                        .ok_or(DecodeError::BadTag(tag))?;
                    let until = self
                        .pos
                        .checked_add(len)
                        .ok_or(DecodeError::IncompleteData)?;
                    if until > self.bytes.len() {
                        return Err(DecodeError::IncompleteData);
                    }
                    Ok(Cell::Header { kind, until })
                }
            };
        }
        if tag & BACK_REF != 0 {
            let index = get_uvarint(self.bytes, &mut self.pos, tag, 2)? as usize;
            return Ok(Cell::BackRef(index));
        }
        if tag & INT != 0 {
            let magnitude = get_uvarint(self.bytes, &mut self.pos, tag, SERIAL_BITS)?;
            let n = if tag & INT_SIGN != 0 {
                !(magnitude as i64)
            } else {
                magnitude as i64
            };
            return Ok(Cell::Scalar(Value::Int(n)));
        }

        match tag {
            VOID => Ok(Cell::Scalar(Value::Void)),
            NULL => Ok(Cell::Scalar(Value::Null)),
            TRUE => Ok(Cell::Scalar(Value::Bool(true))),
            FALSE => Ok(Cell::Scalar(Value::Bool(false))),
            NAN => Ok(Cell::Scalar(Value::Float(f64::NAN))),
            FLOAT64 => {
                let raw = self.take(8)?;
                let raw: [u8; 8] = raw.try_into().map_err(|_| DecodeError::IncompleteData)?;
                Ok(Cell::Scalar(Value::Float(f64::from_le_bytes(raw))))
            }
            BUFFER | SIGNED_BYTES | CLAMPED_BYTES | BYTE_VIEW => {
                let flavor = match tag {
                    BUFFER => ByteFlavor::Buffer,
                    SIGNED_BYTES => ByteFlavor::I8,
                    CLAMPED_BYTES => ByteFlavor::ClampedU8,
                    _ => ByteFlavor::View,
                };
                let data = self.byte_region()?;
                Ok(Cell::Scalar(Value::Bytes(Rc::new(ByteBuf { flavor, data }))))
            }
            _ => Err(DecodeError::BadTag(tag)),
        }
    }
}
