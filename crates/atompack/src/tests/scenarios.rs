//! End-to-end round-trips over graphs that exercise the codec's reason to
//! exist: cycles, mutual reference, sharing, and custom atoms.

use alloc::{vec, vec::Vec};

use crate::{
    custom_encoder, deserialize, serialize, Atom, AtomKind, Atomizer, AtomizerOptions, ByteFlavor,
    Cacheability, DecodeError, Deserializer, Serializer, Value,
};

/// `x = [1]; x.push(x)`
fn cyclic_array() -> Value {
    let x = Value::array(vec![Value::Int(1)]);
    if let Value::Array(items) = &x {
        items.borrow_mut().push(x.clone());
    }
    x
}

fn map_get(map: &Value, probe: &Value) -> Option<Value> {
    let entries = map.as_map().expect("expected a map");
    let entries = entries.borrow();
    entries
        .iter()
        .find(|(key, _)| key == probe)
        .map(|(_, value)| value.clone())
}

#[test]
fn cyclic_array_atom_stream_shape() {
    let atoms = Atomizer::default().atomize(&cyclic_array()).unwrap();
    assert_eq!(
        atoms,
        vec![
            Atom::Header { kind: AtomKind::Array, until: 4 },
            Atom::AsIs,
            Atom::Scalar(Value::Int(1)),
            Atom::BackRef(0),
        ]
    );
}

#[test]
fn cyclic_array_roundtrip() {
    let bytes = serialize(&cyclic_array()).unwrap();
    let y = deserialize(&bytes).unwrap();

    let items = y.as_array().unwrap().borrow();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0], Value::Int(1));
    assert!(items[1].same(&y));
}

#[test]
fn mutually_referencing_map_roundtrip() {
    let x = cyclic_array();
    let hi = Value::from("hi");
    let y = Value::map(Vec::new());
    let inner = Value::set(vec![y.clone(), Value::from("boom")]);
    if let Value::Map(entries) = &y {
        let mut entries = entries.borrow_mut();
        entries.push((Value::Int(1), hi.clone()));
        entries.push((hi, Value::Int(4)));
        entries.push((x, inner));
    }

    let bytes = serialize(&y).unwrap();
    let y2 = deserialize(&bytes).unwrap();

    assert_eq!(map_get(&y2, &Value::Int(1)), Some(Value::from("hi")));
    assert_eq!(map_get(&y2, &Value::from("hi")), Some(Value::Int(4)));

    let entries = y2.as_map().unwrap().borrow();
    let (key, value) = entries.last().unwrap().clone();
    // The third key is the cyclic array from scenario one.
    let key_items = key.as_array().unwrap().borrow();
    assert!(key_items[1].same(&key));
    // ... and its value is a set whose first element is the map itself.
    let set_items = value.as_set().unwrap().borrow();
    assert!(set_items[0].same(&y2));
    assert_eq!(set_items[1], Value::from("boom"));
}

#[test]
fn negative_one_is_a_single_signed_byte() {
    let bytes = serialize(&Value::Int(-1)).unwrap();
    assert_eq!(bytes, vec![0b1100]);
    assert_eq!(deserialize(&bytes).unwrap(), Value::Int(-1));
}

#[test]
fn byte_view_roundtrips_behind_its_sentinel() {
    let view = Value::view(ByteFlavor::View, vec![1, 2, 3]);
    let bytes = serialize(&view).unwrap();
    assert_eq!(bytes[0], 10 << 4);

    let back = deserialize(&bytes).unwrap();
    let buf = back.as_bytes().unwrap();
    assert_eq!(buf.flavor, ByteFlavor::View);
    assert_eq!(buf.data, vec![1, 2, 3]);
}

#[test]
fn custom_string_vocabulary_roundtrip() {
    // Encode strings as a single boolean: `true` for "hi", `false` for
    // anything else.
    let options = AtomizerOptions {
        string: Some(custom_encoder(|value, writer| {
            let is_hi = value.as_str() == Some("hi");
            writer.write(&Value::Bool(is_hi))?;
            Ok(Cacheability::Cacheable)
        })),
        ..AtomizerOptions::default()
    };

    let a = Value::array(vec![]);
    if let Value::Array(items) = &a {
        items.borrow_mut().push(a.clone());
    }
    let input = Value::array(vec![Value::from("hi"), a]);

    let bytes = Serializer::new(options).serialize(&input).unwrap();
    let out = Deserializer::new()
        .with_decoder(|reader| match reader.read_next()? {
            Some(Value::Bool(true)) => Ok(Value::from("hi")),
            Some(Value::Bool(false)) => Ok(Value::from("baloney")),
            _ => Err(DecodeError::Custom("expected a boolean".into())),
        })
        .deserialize(&bytes)
        .unwrap();

    let items = out.as_array().unwrap().borrow();
    assert_eq!(items[0], Value::from("hi"));
    let inner = items[1].as_array().unwrap().borrow();
    assert!(inner[0].same(&items[1]));
}

#[test]
fn self_referential_object_roundtrip() {
    let o = Value::object(vec![("test", Value::Int(1))]);
    if let Value::Object(entries) = &o {
        entries.borrow_mut()[0].1 = o.clone();
    }

    let bytes = serialize(&o).unwrap();
    let o2 = deserialize(&bytes).unwrap();

    let entries = o2.as_object().unwrap().borrow();
    assert_eq!(&*entries[0].0, "test");
    assert!(entries[0].1.same(&o2));
}
