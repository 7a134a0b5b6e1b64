#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(doc) = libsie::parse(input) {
            let config = libsie::ReportConfig::default();
            let _ = libsie::report::income_statement(&doc, &config);
            let _ = libsie::report::annotation_views(&doc);
        }
    }
});
