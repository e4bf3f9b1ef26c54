#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use stagehand::domain::entities::LockSnapshot;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let _ = LockSnapshot::from_package_lock(Path::new("package-lock.json"), content);
    }
});
