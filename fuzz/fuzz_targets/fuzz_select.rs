#![no_main]
use libfuzzer_sys::fuzz_target;
use quarry::Dom;

const PAGE: &str = r#"<div id="a" class="x y"><p lang="en">one</p><p>two<b>three</b></p><input type="checkbox" checked></div>"#;

fuzz_target!(|data: &[u8]| {
    // Selector parsing either fails with an error or evaluates without
    // panicking.
    if let Ok(selector) = std::str::from_utf8(data) {
        if let Ok(dom) = Dom::load(PAGE) {
            if let Ok(found) = dom.select(selector) {
                let _ = found.closest(selector);
                let _ = found.is(selector);
            }
        }
    }
});
