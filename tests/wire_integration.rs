// Byte-exact wire format vectors and stream-level behaviour.

use lbin::value::{Code, Table, Userdata, Value};
use lbin::wire::{self, DEFAULT_MAX_DEPTH, DecodeError, EncodeError};
use lbin::{Algorithm, ErrorKind};

fn enc(value: impl Into<Value>) -> Vec<u8> {
    wire::encode(&[value.into()]).unwrap()
}

fn roundtrip(value: Value) {
    let bytes = wire::encode(std::slice::from_ref(&value)).unwrap();
    assert_eq!(wire::decode_all(&bytes).unwrap(), [value]);
}

fn nested(depth: usize) -> Value {
    let mut value = Value::Table(Table::new());
    for _ in 1..depth {
        let mut outer = Table::new();
        outer.push(value);
        value = Value::Table(outer);
    }
    value
}

#[test]
fn scalar_vectors() {
    assert_eq!(enc(Value::Nil), [0x00]);
    assert_eq!(enc(false), [0x01]);
    assert_eq!(enc(true), [0x09]);
}

#[test]
fn integer_compaction_vectors() {
    assert_eq!(enc(0), [0x02]);
    assert_eq!(enc(255), [0x0A, 0xFF]);
    assert_eq!(enc(256), [0x12, 0x01, 0x00]);
    assert_eq!(enc(65535), [0x12, 0xFF, 0xFF]);
    assert_eq!(enc(65536), [0x22, 0x00, 0x01, 0x00, 0x00]);
    assert_eq!(enc(-1), [0x22, 0xFF, 0xFF, 0xFF, 0xFF]);
    assert_eq!(
        enc(1i64 << 31),
        [0x32, 0x00, 0x00, 0x00, 0x00, 0x80, 0x00, 0x00, 0x00]
    );
    assert_eq!(
        enc(-(1i64 << 31) - 1),
        [0x32, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F, 0xFF, 0xFF, 0xFF]
    );
    assert_eq!(enc(1.5), [0x42, 0x3F, 0xF8, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn integers_and_reals_stay_distinct() {
    for v in [
        Value::Integer(0),
        Value::Integer(i64::MIN),
        Value::Integer(i64::MAX),
        Value::Integer(-70000),
        Value::Real(0.0),
        Value::Real(-0.5),
        Value::Real(3.0),
        Value::Real(f64::INFINITY),
    ] {
        roundtrip(v);
    }
}

#[test]
fn string_length_boundaries() {
    for (len, header) in [
        (0usize, vec![0x04]),
        (30, vec![0xF4]),
        (31, vec![0xFC]),
        (32, vec![0x15, 0x00, 0x20]),
        (65535, vec![0x15, 0xFF, 0xFF]),
        (65536, vec![0x25, 0x00, 0x01, 0x00, 0x00]),
    ] {
        let s = vec![b'z'; len];
        let bytes = enc(s.clone());
        assert_eq!(&bytes[..header.len()], header.as_slice(), "len {len}");
        assert_eq!(bytes.len(), header.len() + len);
        assert_eq!(wire::decode_all(&bytes).unwrap(), [Value::String(s)]);
    }
}

#[test]
fn strings_are_binary_safe() {
    roundtrip(Value::String(vec![0x00, 0xFF, 0x80, b'\n', 0x00]));
}

#[test]
fn aggregate_split_sequence_plus_pair() {
    let mut t: Table = [1, 2, 3].into_iter().collect();
    t.insert("x", true).unwrap();
    assert_eq!(
        enc(t.clone()),
        [0x1E, 0x0A, 0x01, 0x0A, 0x02, 0x0A, 0x03, 0x0C, b'x', 0x09, 0x00]
    );
    roundtrip(Value::Table(t));
}

#[test]
fn aggregate_split_stops_at_first_gap() {
    let mut t = Table::new();
    t.insert(1, "a").unwrap();
    t.insert(3, "c").unwrap();
    assert_eq!(t.len(), 1);
    assert_eq!(
        enc(t.clone()),
        [0x0E, 0x0C, b'a', 0x0A, 0x03, 0x0C, b'c', 0x00]
    );
    let decoded = wire::decode_all(&enc(t.clone())).unwrap();
    let dt = decoded[0].as_table().unwrap();
    assert_eq!(dt.len(), 1);
    assert_eq!(dt.get(&Value::Integer(3)), Some(&Value::from("c")));
    assert_eq!(decoded, [Value::Table(t)]);
}

#[test]
fn array_length_boundaries() {
    let t30: Table = (1..=30).collect::<Vec<i64>>().into_iter().collect();
    let bytes = enc(t30.clone());
    assert_eq!(bytes[0], 0xF6);
    roundtrip(Value::Table(t30));

    let t31: Table = (1..=31).collect::<Vec<i64>>().into_iter().collect();
    let bytes = enc(t31.clone());
    assert_eq!(&bytes[..3], [0xFE, 0x0A, 0x1F]);
    roundtrip(Value::Table(t31));

    let big: Table = (0..1000).map(|i| Value::Integer(i * 7)).collect();
    roundtrip(Value::Table(big));
}

#[test]
fn empty_table() {
    assert_eq!(enc(Table::new()), [0x06, 0x00]);
    roundtrip(Value::Table(Table::new()));
}

#[test]
fn code_length_boundaries() {
    let bytes = enc(Code::new(vec![0xAB; 30]));
    assert_eq!(bytes[0], 0xF7);
    assert_eq!(bytes.len(), 31);

    let bytes = enc(Code::new(vec![0xAB; 31]));
    assert_eq!(&bytes[..3], [0x07, 0x0A, 0x1F]);
    assert_eq!(bytes.len(), 34);
    assert_eq!(
        wire::decode_all(&bytes).unwrap(),
        [Value::Code(Code::new(vec![0xAB; 31]))]
    );
}

#[test]
fn empty_code_is_rejected() {
    let err = wire::encode(&[Value::Code(Code::new(Vec::new()))]).unwrap_err();
    assert!(matches!(err, EncodeError::EmptyCode));
}

#[test]
fn userdata_is_unsupported() {
    let err = wire::encode(&[Value::Userdata(Userdata(0xBEEF))]).unwrap_err();
    assert!(matches!(err, EncodeError::UnsupportedKind { kind: "userdata" }));
    assert_eq!(err.to_string(), "unsupported type `userdata` to serialize");

    // Type 3 never appears in a valid stream.
    assert!(matches!(
        wire::decode_all(&[0x03]),
        Err(DecodeError::Invalid { offset: 1, .. })
    ));
}

#[test]
fn depth_limit_is_exact() {
    let at_limit = nested(DEFAULT_MAX_DEPTH);
    let bytes = wire::encode(std::slice::from_ref(&at_limit)).unwrap();
    assert_eq!(wire::decode_all(&bytes).unwrap(), [at_limit]);

    let too_deep = nested(DEFAULT_MAX_DEPTH + 1);
    let err = lbin::pack(&[too_deep], Algorithm::None, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DepthExceeded);
}

#[test]
fn table_keys_may_be_tables() {
    let mut key = Table::new();
    key.push("inner");
    let mut t = Table::new();
    t.insert(Value::Table(key), 1).unwrap();
    t.insert(2.5, "half").unwrap();
    t.insert(false, Value::Real(-1.0)).unwrap();
    roundtrip(Value::Table(t));
}

#[test]
fn multiple_values_decode_in_order() {
    let values = [Value::Integer(1), Value::from("two"), Value::Nil, Value::Real(4.5)];
    let bytes = wire::encode(&values).unwrap();
    assert_eq!(wire::decode_all(&bytes).unwrap(), values);
}

#[test]
fn truncation_is_reported() {
    let bytes = wire::encode(&[Value::from("hello"), Value::Integer(70000)]).unwrap();
    for cut in 1..bytes.len() {
        let prefix = &bytes[..cut];
        // Cutting right after the string leaves a valid one-value stream.
        if cut == 6 {
            assert_eq!(wire::decode_all(prefix).unwrap().len(), 1);
            continue;
        }
        let err = lbin::unpack(prefix, Algorithm::None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedOrInvalidStream, "cut {cut}");
        assert!(err.offset().is_some());
    }
}

#[test]
fn invalid_cookies_are_rejected() {
    // Nil with a nonzero cookie.
    assert!(wire::decode_all(&[0x08]).is_err());
    // Boolean cookie 2.
    assert!(wire::decode_all(&[0x11]).is_err());
    // Number cookie 3 is unassigned.
    assert!(wire::decode_all(&[0x1A, 0, 0, 0]).is_err());
    // Long string with cookie 1.
    assert!(wire::decode_all(&[0x0D, 0x00]).is_err());
}

#[test]
fn nan_map_key_is_rejected() {
    let mut bytes = vec![0x06, 0x42];
    bytes.extend_from_slice(&f64::NAN.to_bits().to_be_bytes());
    bytes.extend_from_slice(&[0x09, 0x00]);
    assert!(matches!(
        wire::decode_all(&bytes),
        Err(DecodeError::Invalid { .. })
    ));
}

#[test]
fn huge_declared_lengths_fail_cleanly() {
    // Array of 2^31-1 items with nothing behind it.
    let bytes = [0xFE, 0x22, 0x7F, 0xFF, 0xFF, 0xFF];
    assert!(wire::decode_all(&bytes).is_err());
    // Long string claiming 4 GiB.
    let bytes = [0x25, 0xFF, 0xFF, 0xFF, 0xFF, b'a'];
    assert!(matches!(
        wire::decode_all(&bytes),
        Err(DecodeError::Truncated { .. })
    ));
}
