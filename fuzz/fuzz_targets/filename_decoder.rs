#![no_main]

use libfuzzer_sys::fuzz_target;
use rowpress_ingest::experiment::ExperimentKind;
use rowpress_ingest::grammar::decode_filename;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Decoding must never panic, and whatever decodes must re-encode
        // to a name that decodes again
        for kind in ExperimentKind::ALL {
            if let Ok(decoded) = decode_filename(kind, input) {
                let again = decode_filename(kind, &decoded.encode());
                assert!(again.is_ok());
            }
        }
    }
});
