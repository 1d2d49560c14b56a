//! The codec's behavioral laws: round-trip identity, determinism, sharing
//! and ordering preservation, dictionary agreement.

use alloc::{vec, vec::Vec};

use crate::{
    deserialize, serialize, serialize_atoms, Atom, Atomizer, AtomizerOptions, Deserializer,
    Rebuilder, Serializer, Value,
};

fn nested_sample() -> Value {
    Value::object(vec![
        ("null", Value::Null),
        ("flag", Value::Bool(true)),
        ("count", Value::Int(1234)),
        ("ratio", Value::Float(0.25)),
        ("name", Value::from("deep")),
        ("blob", Value::bytes(vec![0, 1, 2, 255])),
        (
            "items",
            Value::array(vec![
                Value::Int(-3),
                Value::set(vec![Value::from("a"), Value::from("b")]),
                Value::map(vec![(Value::Int(1), Value::from("one"))]),
            ]),
        ),
    ])
}

#[test]
fn roundtrip_preserves_structure() {
    let input = nested_sample();
    let bytes = serialize(&input).unwrap();
    assert_eq!(deserialize(&bytes).unwrap(), input);
}

#[test]
fn roundtrip_through_atoms_preserves_structure() {
    let input = nested_sample();
    let atoms = Atomizer::default().atomize(&input).unwrap();
    assert_eq!(Rebuilder::new().rebuild(&atoms).unwrap(), input);
}

#[test]
fn encoding_is_deterministic() {
    let input = nested_sample();
    assert_eq!(serialize(&input).unwrap(), serialize(&input).unwrap());
}

#[test]
fn shared_node_is_encoded_once() {
    let shared = Value::array(vec![Value::from("payload")]);
    let input = Value::array(vec![shared.clone(), shared]);

    let atoms = Atomizer::default().atomize(&input).unwrap();
    let back_refs = atoms
        .iter()
        .filter(|atom| matches!(atom, Atom::BackRef(_)))
        .count();
    assert_eq!(back_refs, 1);

    let out = deserialize(&serialize_atoms(&atoms).unwrap()).unwrap();
    let items = out.as_array().unwrap().borrow();
    assert!(items[0].same(&items[1]));
}

#[test]
fn map_iteration_order_is_preserved() {
    let input = Value::map(vec![
        (Value::from("k1"), Value::Int(1)),
        (Value::from("k2"), Value::Int(2)),
        (Value::from("k3"), Value::Int(3)),
    ]);
    let out = deserialize(&serialize(&input).unwrap()).unwrap();
    let keys: Vec<Value> = out
        .as_map()
        .unwrap()
        .borrow()
        .iter()
        .map(|(key, _)| key.clone())
        .collect();
    assert_eq!(
        keys,
        vec![Value::from("k1"), Value::from("k2"), Value::from("k3")]
    );
}

#[test]
fn object_key_order_is_preserved() {
    let input = Value::object(vec![
        ("zebra", Value::Int(1)),
        ("aardvark", Value::Int(2)),
    ]);
    let out = deserialize(&serialize(&input).unwrap()).unwrap();
    let keys: Vec<_> = out
        .as_object()
        .unwrap()
        .borrow()
        .iter()
        .map(|(key, _)| key.clone())
        .collect();
    assert_eq!(&*keys[0], "zebra");
    assert_eq!(&*keys[1], "aardvark");
}

#[test]
fn dictionary_values_stay_off_the_wire() {
    let alpha = Value::from("alphabet");
    let beta = Value::from("betatron");
    let dictionary = vec![alpha.clone(), beta.clone()];

    let options = AtomizerOptions {
        dictionary: dictionary.clone(),
        ..AtomizerOptions::default()
    };
    let input = Value::array(vec![alpha.clone(), beta, alpha.clone()]);
    let bytes = Serializer::new(options).serialize(&input).unwrap();

    assert!(!bytes.windows(8).any(|w| w == b"alphabet"));
    assert!(!bytes.windows(8).any(|w| w == b"betatron"));

    let out = Deserializer::new()
        .with_dictionary(dictionary)
        .deserialize(&bytes)
        .unwrap();
    let items = out.as_array().unwrap().borrow();
    assert!(items[0].same(&alpha));
    assert!(items[2].same(&items[0]));
    assert_eq!(items[1], Value::from("betatron"));
}

#[test]
fn cycle_structure_survives() {
    let x = Value::array(vec![]);
    if let Value::Array(items) = &x {
        items.borrow_mut().push(x.clone());
    }
    let y = deserialize(&serialize(&x).unwrap()).unwrap();
    let items = y.as_array().unwrap().borrow();
    assert!(items[0].same(&y));
}
