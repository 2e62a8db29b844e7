use std::collections::HashMap;
use std::path::Path;

use proptest::prelude::*;

use looplaunch::config::MalformedLinePolicy;
use looplaunch::envfile::EnvOverrides;

fn key_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_]{0,12}"
}

proptest! {
    // Single quotes never interpret their content.
    #[test]
    fn single_quoted_values_round_trip(
        key in key_strategy(),
        value in "[^'\n\r]{0,40}",
    ) {
        let line = format!("{key}='{value}'");
        let parsed = EnvOverrides::parse(&line, Path::new(".env"), MalformedLinePolicy::Reject, |_| None)
            .expect("single-quoted line parses");
        prop_assert_eq!(parsed.get(&key), Some(value.as_str()));
    }

    // Whatever the sequence of assignments, each key ends at its last value.
    #[test]
    fn last_assignment_wins(
        assignments in proptest::collection::vec((key_strategy(), "[A-Za-z0-9/._-]{0,16}"), 0..20),
    ) {
        let contents: String = assignments
            .iter()
            .map(|(k, v)| format!("{k}={v}\n"))
            .collect();
        let parsed = EnvOverrides::parse(&contents, Path::new(".env"), MalformedLinePolicy::Reject, |_| None)
            .expect("plain assignments parse");

        let mut expected: HashMap<&str, &str> = HashMap::new();
        for (k, v) in &assignments {
            expected.insert(k.as_str(), v.as_str());
        }

        prop_assert_eq!(parsed.len(), expected.len());
        for (k, v) in expected {
            prop_assert_eq!(parsed.get(k), Some(v));
        }
    }

    // Arbitrary input never panics in skip mode, and every surviving key is valid.
    #[test]
    fn skip_mode_accepts_any_input(contents in "\\PC{0,200}") {
        let parsed = EnvOverrides::parse(&contents, Path::new(".env"), MalformedLinePolicy::Skip, |_| None)
            .expect("skip mode never fails");
        for key in parsed.keys() {
            prop_assert!(!key.is_empty());
            prop_assert!(!key.starts_with(|c: char| c.is_ascii_digit()));
        }
    }
}
