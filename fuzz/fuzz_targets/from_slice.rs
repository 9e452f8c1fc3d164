#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate zonemgr;

fuzz_target!(|data: &[u8]| {
    #[allow(unused_must_use)]
    {
        zonemgr::Message::from_slice(data);
    }
});
