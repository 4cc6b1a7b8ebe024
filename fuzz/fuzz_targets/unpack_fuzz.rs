#![no_main]
use libfuzzer_sys::fuzz_target;
use lbin::Algorithm;

fuzz_target!(|data: &[u8]| {
    // Every backend must reject corrupt input without panicking or
    // allocating from an unchecked header.
    for algo in [Algorithm::Snappy, Algorithm::Zlib, Algorithm::Zstd] {
        let _ = lbin::unpack(data, algo);
    }
});
