#![no_main]
use libfuzzer_sys::fuzz_target;
use lbin::Algorithm;
use lbin::value::{Table, Value};

/// Build a value tree from the input bytes, consuming them as it goes.
fn build(data: &mut &[u8], depth: usize) -> Value {
    let Some((&op, rest)) = data.split_first() else {
        return Value::Nil;
    };
    *data = rest;
    match op % 8 {
        0 => Value::Nil,
        1 => Value::Boolean(op & 0x80 != 0),
        2 => {
            let n = data.len().min(8);
            let mut buf = [0u8; 8];
            buf[..n].copy_from_slice(&data[..n]);
            *data = &data[n..];
            Value::Integer(i64::from_le_bytes(buf) >> (op >> 3))
        }
        3 => Value::Real(f64::from(op) / 3.0),
        4 | 5 => {
            let n = data.len().min(usize::from(op >> 2));
            let s = data[..n].to_vec();
            *data = &data[n..];
            Value::String(s)
        }
        _ if depth == 0 => Value::Integer(i64::from(op)),
        _ => {
            let mut t = Table::new();
            for _ in 0..(op >> 4) {
                let key = build(data, depth - 1);
                let value = build(data, depth - 1);
                // Nil and NaN keys are rejected by the table; skip them.
                let _ = t.insert(key, value);
            }
            Value::Table(t)
        }
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&selector, mut rest)) = data.split_first() else {
        return;
    };
    let algo = match selector % 4 {
        0 => Algorithm::None,
        1 => Algorithm::Snappy,
        2 => Algorithm::Zlib,
        _ => Algorithm::Zstd,
    };

    let mut values = Vec::new();
    while !rest.is_empty() && values.len() < 16 {
        values.push(build(&mut rest, 4));
    }

    let packed = lbin::pack(&values, algo.clone(), 1).unwrap();
    let unpacked = lbin::unpack(&packed, algo).unwrap();
    assert_eq!(unpacked, values);
});
