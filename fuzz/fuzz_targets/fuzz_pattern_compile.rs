#![no_main]
use libfuzzer_sys::fuzz_target;
use policy_match::Matcher;

// Compiling arbitrary pattern text and matching against it must never panic
fuzz_target!(|input: (&str, &str)| {
    let (pattern, candidate) = input;

    if let Ok(matcher) = Matcher::new(pattern) {
        let _ = matcher.is_match(candidate);
        if !pattern.contains(['{', '}', '*', '\\']) && !pattern.trim().is_empty() {
            assert!(matcher.is_match(pattern.trim()));
        }
    }
});
