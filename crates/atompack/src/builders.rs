//! Default builders, one per value kind.
//!
//! Composites declare themselves self-referencable before their children
//! are walked, so cycles through them resolve as back-references. Objects
//! and maps emit keys inside the header's jump region and values after it;
//! the decoding side allocates the empty shell at the header, reads the
//! keys, then pairs them with the values that follow.

use alloc::rc::Rc;

use crate::{
    atom::AtomKind,
    error::EncodeError,
    options::Cacheability,
    value::Value,
    writer::Writer,
};

pub(crate) fn sentinel(value: &Value, writer: &mut Writer<'_>) -> Result<Cacheability, EncodeError> {
    writer.scalar(value.clone());
    Ok(Cacheability::Transient)
}

pub(crate) fn number(value: &Value, writer: &mut Writer<'_>) -> Result<Cacheability, EncodeError> {
    match *value {
        Value::Int(n) => {
            writer.scalar(Value::Int(n));
            // A single-byte integer is already as compact as a back-reference.
            if (-128..128).contains(&n) {
                Ok(Cacheability::Transient)
            } else {
                Ok(Cacheability::Cacheable)
            }
        }
        Value::Float(f) => {
            writer.scalar(Value::Float(f));
            if f.is_nan() {
                Ok(Cacheability::Transient)
            } else {
                Ok(Cacheability::Cacheable)
            }
        }
        _ => Err(EncodeError::UnsupportedValue(value.kind())),
    }
}

pub(crate) fn string(value: &Value, writer: &mut Writer<'_>) -> Result<Cacheability, EncodeError> {
    writer.scalar(value.clone());
    Ok(Cacheability::Cacheable)
}

pub(crate) fn bytes(value: &Value, writer: &mut Writer<'_>) -> Result<Cacheability, EncodeError> {
    writer.scalar(value.clone());
    Ok(Cacheability::Cacheable)
}

pub(crate) fn array(value: &Value, writer: &mut Writer<'_>) -> Result<Cacheability, EncodeError> {
    let Value::Array(items) = value else {
        return Err(EncodeError::UnsupportedValue(value.kind()));
    };
    writer.allow_self_reference();
    writer.push(AtomKind::Array);
    for child in items.borrow().iter() {
        writer.write(child)?;
    }
    writer.pop()?;
    Ok(Cacheability::Cacheable)
}

pub(crate) fn set(value: &Value, writer: &mut Writer<'_>) -> Result<Cacheability, EncodeError> {
    let Value::Set(items) = value else {
        return Err(EncodeError::UnsupportedValue(value.kind()));
    };
    writer.allow_self_reference();
    writer.push(AtomKind::Set);
    for child in items.borrow().iter() {
        writer.write(child)?;
    }
    writer.pop()?;
    Ok(Cacheability::Cacheable)
}

pub(crate) fn object(value: &Value, writer: &mut Writer<'_>) -> Result<Cacheability, EncodeError> {
    let Value::Object(entries) = value else {
        return Err(EncodeError::UnsupportedValue(value.kind()));
    };
    writer.allow_self_reference();
    writer.push(AtomKind::Object);
    let entries = entries.borrow();
    for (key, _) in entries.iter() {
        writer.write(&Value::Str(Rc::clone(key)))?;
    }
    writer.pop()?;
    for (_, child) in entries.iter() {
        writer.write(child)?;
    }
    Ok(Cacheability::Cacheable)
}

pub(crate) fn map(value: &Value, writer: &mut Writer<'_>) -> Result<Cacheability, EncodeError> {
    let Value::Map(entries) = value else {
        return Err(EncodeError::UnsupportedValue(value.kind()));
    };
    writer.allow_self_reference();
    writer.push(AtomKind::Map);
    let entries = entries.borrow();
    for (key, _) in entries.iter() {
        writer.write(key)?;
    }
    writer.pop()?;
    for (_, child) in entries.iter() {
        writer.write(child)?;
    }
    Ok(Cacheability::Cacheable)
}

pub(crate) fn opaque(value: &Value, writer: &mut Writer<'_>) -> Result<Cacheability, EncodeError> {
    if writer.options.keep_unknowns_as_is {
        writer.scalar(value.clone());
        Ok(Cacheability::Cacheable)
    } else {
        Err(EncodeError::UnsupportedValue(value.kind()))
    }
}
