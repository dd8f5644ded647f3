#![no_main]

use autograde::json;
use autograde::LessonFile;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Decoding must never panic, and re-encoding a decoded value must decode to the same repr
        if let Ok(lesson) = LessonFile::from_json(s) {
            for case in lesson.cases {
                let expected = json::from_json(case.expected);
                let again = json::from_json(json::to_json(&expected));
                assert_eq!(expected.to_string(), again.to_string());
            }
        }
    }
});
