//! Property-based tests for invariants that must hold on arbitrary input.

use proptest::prelude::*;

use planfact_core::config::RedundancyPolicy;
use planfact_extract::ocr::postprocess::{fix_digit_confusion, OcrPostProcessor};

proptest! {
    /// The whole post-processing pass is idempotent on any string.
    #[test]
    fn postprocess_is_idempotent(input in ".{0,300}") {
        let post = OcrPostProcessor::new();
        let once = post.apply(&input);
        let twice = post.apply(&once);
        prop_assert_eq!(once, twice);
    }

    /// Digit-confusion repair never changes the character count and only
    /// ever rewrites the confusable letters.
    #[test]
    fn digit_fix_rewrites_only_confusable_letters(input in ".{0,300}") {
        let fixed = fix_digit_confusion(&input);
        prop_assert_eq!(fixed.chars().count(), input.chars().count());
        for (before, after) in input.chars().zip(fixed.chars()) {
            if before != after {
                prop_assert!(matches!(before, 'O' | 'o' | 'l' | 'I' | 'S' | 'B'));
                prop_assert!(after.is_ascii_digit());
            }
        }
    }

    /// Text with no digits at all passes through the digit fix untouched.
    #[test]
    fn digit_fix_ignores_digitless_text(input in "[A-Za-z ]{0,200}") {
        prop_assert_eq!(fix_digit_confusion(&input), input);
    }

    /// The redundancy tiers are monotonically non-decreasing in the count
    /// of corroborating sources.
    #[test]
    fn redundancy_is_monotonic(a in 0usize..10, b in 0usize..10) {
        let policy = RedundancyPolicy::default();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(policy.score(low) <= policy.score(high));
    }
}
