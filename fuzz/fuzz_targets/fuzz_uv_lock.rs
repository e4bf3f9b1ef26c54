#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use stagehand::domain::entities::LockSnapshot;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        if let Ok(lock) = LockSnapshot::from_uv_lock(Path::new("uv.lock"), content) {
            let _ = lock.pinned_requirements();
            let _ = lock.digest();
        }
    }
});
