#![no_main]
use libfuzzer_sys::fuzz_target;
use lbin::value::OpaqueCode;
use lbin::wire::{self, Decoder};

fuzz_target!(|data: &[u8]| {
    // The decoder must never panic, only return errors.
    let _ = wire::decode_all(data);

    // A tight depth limit exercises the nesting guard.
    let _ = Decoder::new(data, &OpaqueCode).with_max_depth(2).decode_all();

    // Whatever decodes must re-encode to a stable byte stream. Bytes are
    // compared rather than values since NaN reals never equal themselves.
    if let Ok(values) = wire::decode_all(data) {
        let bytes = wire::encode(&values).expect("decoded values must re-encode");
        let again = wire::decode_all(&bytes).expect("re-encoded stream must decode");
        assert_eq!(wire::encode(&again).expect("second encode"), bytes);
    }
});
