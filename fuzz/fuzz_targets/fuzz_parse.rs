#![no_main]
use libfuzzer_sys::fuzz_target;
use quarry::{Dom, LoadOptions};

fuzz_target!(|data: &[u8]| {
    // Loading never panics, and a loaded document always renders.
    for xml in [false, true] {
        if let Ok(dom) = Dom::load_bytes(data, LoadOptions::default().xml(xml)) {
            let _ = dom.html();
            let _ = dom.text();
        }
    }
});
