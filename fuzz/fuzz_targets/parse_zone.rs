#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate zonemgr;

use zonemgr::{Zone, ZoneDefaults};

fuzz_target!(|data: &[u8]| {
    let text = match std::str::from_utf8(data) {
        Ok(text) => text,
        Err(_) => return,
    };

    let mut zone = match Zone::new("example.com", &ZoneDefaults::default()) {
        Ok(zone) => zone,
        Err(_) => return,
    };

    // Anything that imports must render to text that parses again.
    if zone.update_from_text(text, false).is_ok() {
        let rendered = zonemgr::zones::render(&zone);
        if let Err(e) = zonemgr::zones::parse(&rendered, "example.com") {
            panic!("rendered zone failed to parse: {}\n{}", e, rendered);
        }
    }
});
