#![no_main]

use libfuzzer_sys::fuzz_target;
use stagehand::domain::value_objects::{resolve_port, Port, Requirement};

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        if let Some(req) = Requirement::parse_pep508(raw) {
            let _ = req.fingerprint();
        }
        let _ = resolve_port(Some(raw), Port::DEFAULT);
    }
});
