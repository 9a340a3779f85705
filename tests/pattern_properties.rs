// tests/pattern_properties.rs

use proptest::prelude::*;
use publink::pattern::PatternRule;

// Text that cannot contain the " -> " separator.
fn plain_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9:/._-]{1,40}"
}

proptest! {
    #[test]
    fn separator_line_yields_destination(src in plain_text(), dst in plain_text()) {
        let rule = PatternRule::default();
        let line = format!("{src} -> {dst}");
        prop_assert_eq!(rule.extract(&line), Some(dst.as_str()));
    }

    #[test]
    fn lines_without_separator_never_match(text in "[a-zA-Z0-9 :/._]{0,80}") {
        let rule = PatternRule::default();
        prop_assert_eq!(rule.extract(&text), None);
    }
}
