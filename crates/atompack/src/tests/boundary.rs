//! Edge-of-range and failure-path behavior.

use alloc::{rc::Rc, vec, vec::Vec};

use rstest::rstest;

use crate::{
    custom_encoder, deserialize, serialize, serialize_atoms, Atomizer, AtomizerOptions,
    Cacheability, DecodeError, Deserializer, EncodeError, Kind, Rebuilder, Serializer, Value,
};

#[rstest]
#[case(0)]
#[case(-1)]
#[case(127)]
#[case(128)]
#[case(-128)]
#[case(-129)]
#[case((1 << 30) - 1)]
#[case(1 << 30)]
#[case(-(1 << 30))]
#[case(-((1 << 30) - 1))]
#[case(i64::MAX)]
#[case(i64::MIN)]
fn integers_roundtrip(#[case] n: i64) {
    let bytes = serialize(&Value::Int(n)).unwrap();
    assert_eq!(deserialize(&bytes).unwrap(), Value::Int(n));
}

#[rstest]
#[case(Value::array(vec![]))]
#[case(Value::object(Vec::<(&str, Value)>::new()))]
#[case(Value::map(Vec::new()))]
#[case(Value::set(vec![]))]
fn empty_composites_roundtrip(#[case] input: Value) {
    let bytes = serialize(&input).unwrap();
    assert_eq!(deserialize(&bytes).unwrap(), input);
}

#[test]
fn nan_maps_to_the_nan_sentinel() {
    let bytes = serialize(&Value::Float(f64::NAN)).unwrap();
    assert_eq!(bytes, vec![5 << 4]);
    let out = deserialize(&bytes).unwrap();
    assert!(out.as_float().unwrap().is_nan());
}

#[test]
fn float_extremes_roundtrip() {
    for f in [0.0, -0.0, f64::INFINITY, f64::NEG_INFINITY, f64::MIN_POSITIVE] {
        let out = deserialize(&serialize(&Value::Float(f)).unwrap()).unwrap();
        assert_eq!(out.as_float().unwrap().to_bits(), f.to_bits());
    }
}

#[test]
fn zero_child_custom_atom_is_decodable() {
    let options = AtomizerOptions {
        opaque: Some(custom_encoder(|_, _| Ok(Cacheability::Transient))),
        ..AtomizerOptions::default()
    };
    let input = Value::opaque(Rc::new(()));

    let bytes = Serializer::new(options).serialize(&input).unwrap();
    let out = Deserializer::new()
        .with_decoder(|reader| {
            assert!(reader.read_next().unwrap().is_none());
            Ok(Value::from("token"))
        })
        .deserialize(&bytes)
        .unwrap();
    assert_eq!(out, Value::from("token"));
}

#[test]
fn unknowns_pass_through_the_atom_path_when_allowed() {
    let options = AtomizerOptions {
        keep_unknowns_as_is: true,
        ..AtomizerOptions::default()
    };
    let handle = Value::opaque(Rc::new(42u32));
    let input = Value::array(vec![handle.clone(), handle.clone()]);

    let atoms = Atomizer::new(options).atomize(&input).unwrap();
    let out = Rebuilder::new().rebuild(&atoms).unwrap();
    let items = out.as_array().unwrap().borrow();
    assert!(items[0].same(&handle));
    assert!(items[1].same(&items[0]));

    // The handle survives atoms, but has no byte representation.
    assert_eq!(
        serialize_atoms(&atoms),
        Err(EncodeError::UnsupportedValue(Kind::Opaque))
    );
}

#[test]
fn unknowns_fail_the_encode_by_default() {
    let input = Value::opaque(Rc::new(42u32));
    assert_eq!(
        Atomizer::default().atomize(&input),
        Err(EncodeError::UnsupportedValue(Kind::Opaque))
    );
}

#[test]
fn trailing_bytes_are_excess_content() {
    let mut bytes = serialize(&Value::Null).unwrap();
    bytes.push(0);
    assert_eq!(deserialize(&bytes), Err(DecodeError::ExcessContent));
}

#[test]
fn truncated_input_is_incomplete() {
    let bytes = serialize(&Value::array(vec![Value::from("long enough")])).unwrap();
    for len in 0..bytes.len() {
        let err = deserialize(&bytes[..len]).unwrap_err();
        assert!(
            matches!(err, DecodeError::IncompleteData),
            "prefix of {len} bytes gave {err:?}"
        );
    }
}

#[test]
fn unknown_sentinel_is_a_bad_tag() {
    assert_eq!(deserialize(&[0]), Err(DecodeError::BadTag(0)));
    assert_eq!(deserialize(&[0xF0]), Err(DecodeError::BadTag(0xF0)));
}

#[test]
fn dangling_back_reference_is_rejected() {
    // A bare back-reference to index 5 with an empty cache.
    let bytes = [0b0001_0110];
    assert_eq!(deserialize(&bytes), Err(DecodeError::BadBackRef(5)));
}

#[test]
fn custom_atom_without_decoder_is_rejected() {
    let options = AtomizerOptions {
        opaque: Some(custom_encoder(|_, _| Ok(Cacheability::Transient))),
        ..AtomizerOptions::default()
    };
    let bytes = Serializer::new(options)
        .serialize(&Value::opaque(Rc::new(())))
        .unwrap();
    assert_eq!(deserialize(&bytes), Err(DecodeError::UnknownCustom));
}

#[test]
fn underconsuming_custom_decoder_is_rejected() {
    let options = AtomizerOptions {
        opaque: Some(custom_encoder(|_, writer| {
            writer.write(&Value::Int(1))?;
            writer.write(&Value::Int(2))?;
            Ok(Cacheability::Transient)
        })),
        ..AtomizerOptions::default()
    };
    let bytes = Serializer::new(options)
        .serialize(&Value::opaque(Rc::new(())))
        .unwrap();
    let result = Deserializer::new()
        .with_decoder(|reader| {
            // Read one of the two children, then stop.
            reader.read_next()?;
            Ok(Value::Null)
        })
        .deserialize(&bytes);
    assert_eq!(result, Err(DecodeError::ExcessContent));
}
