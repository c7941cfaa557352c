//! Deterministic repair of common OCR artifacts.
//!
//! Applied only to OCR-sourced text, in a fixed order:
//! (1) rejoin hyphen-broken words, (2) digit/letter confusion strictly
//! between two digits, (3) table whitespace normalization, (4) collapse
//! repeated rule/pipe/dot-leader artifacts. The whole pass is idempotent:
//! applying it twice produces the same output as applying it once.

use regex::Regex;

pub struct OcrPostProcessor {
    hyphen_break: Regex,
    thousands_gap: Regex,
    wide_gap: Regex,
    dash_run: Regex,
    equals_run: Regex,
    underscore_run: Regex,
    pipe_run: Regex,
    dot_leader: Regex,
}

impl OcrPostProcessor {
    pub fn new() -> Self {
        Self {
            // "RESI-\n DENTIAL" → "RESIDENTIAL"; only joins when both sides
            // are letters, so list dashes at line ends survive. NBSP counts
            // as trailing space here, or a later NBSP conversion would
            // expose a join the first application missed.
            hyphen_break: Regex::new(r"([A-Za-z])-[ \t\u{A0}]*\r?\n[ \t\u{A0}]*([A-Za-z])").unwrap(),
            // "14, 250" → "14,250"
            thousands_gap: Regex::new(r"(\d), +(\d{3})").unwrap(),
            wide_gap: Regex::new(r" {3,}").unwrap(),
            dash_run: Regex::new(r"-{4,}").unwrap(),
            equals_run: Regex::new(r"={4,}").unwrap(),
            underscore_run: Regex::new(r"_{4,}").unwrap(),
            pipe_run: Regex::new(r"\|{2,}").unwrap(),
            dot_leader: Regex::new(r"\.{4,}").unwrap(),
        }
    }

    /// Run all repair passes in order.
    pub fn apply(&self, text: &str) -> String {
        // Chained breaks ("a-\nb-\nc") and nested thousands groups
        // ("1, 000, 000") need the replacement run to a fixpoint, otherwise
        // a second application would keep finding work.
        let text = replace_to_fixpoint(&self.hyphen_break, text, "$1$2");
        let text = fix_digit_confusion(&text);
        let text = text.replace('\u{a0}', " ");
        let text = replace_to_fixpoint(&self.thousands_gap, &text, "$1,$2");
        let text = self.wide_gap.replace_all(&text, "  ");
        let text = self.dash_run.replace_all(&text, "---");
        let text = self.equals_run.replace_all(&text, "===");
        let text = self.underscore_run.replace_all(&text, "___");
        let text = self.pipe_run.replace_all(&text, "|");
        self.dot_leader.replace_all(&text, "...").into_owned()
    }
}

impl Default for OcrPostProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply a shrinking replacement until it stops matching. Terminates because
/// every replacement strictly shortens the text.
fn replace_to_fixpoint(pattern: &Regex, text: &str, replacement: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = pattern.replace_all(&current, replacement);
        if next == current {
            return current;
        }
        current = next.into_owned();
    }
}

/// Fix digit/letter confusion strictly between two digits: `O`/`o`→0,
/// `l`/`I`→1, `S`→5, `B`→8. Letters anywhere else are left alone so words
/// like "BLOCK" never get corrupted. Neighbor checks run against the
/// original characters, which keeps the pass idempotent.
pub fn fix_digit_confusion(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        let replacement = match c {
            'O' | 'o' => Some('0'),
            'l' | 'I' => Some('1'),
            'S' => Some('5'),
            'B' => Some('8'),
            _ => None,
        };
        match replacement {
            Some(digit)
                if i > 0
                    && i + 1 < chars.len()
                    && chars[i - 1].is_ascii_digit()
                    && chars[i + 1].is_ascii_digit() =>
            {
                out.push(digit);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_confusion_only_between_digits() {
        assert_eq!(fix_digit_confusion("1O5"), "105");
        assert_eq!(fix_digit_confusion("BLOCK"), "BLOCK");
        assert_eq!(fix_digit_confusion("LOT 1O5 AREA"), "LOT 105 AREA");
        assert_eq!(fix_digit_confusion("2S4 UNITS"), "254 UNITS");
        assert_eq!(fix_digit_confusion("8B8"), "888");
        assert_eq!(fix_digit_confusion("O5"), "O5", "no left digit, untouched");
        assert_eq!(fix_digit_confusion("5O"), "5O", "no right digit, untouched");
    }

    #[test]
    fn hyphen_breaks_are_rejoined() {
        let post = OcrPostProcessor::new();
        assert_eq!(post.apply("RESI-\nDENTIAL"), "RESIDENTIAL");
        assert_eq!(post.apply("RESI- \n  DENTIAL"), "RESIDENTIAL");
        // A dash before a digit is not a broken word.
        assert_eq!(post.apply("UNITS -\n14"), "UNITS -\n14");
    }

    #[test]
    fn table_whitespace_is_normalized() {
        let post = OcrPostProcessor::new();
        assert_eq!(post.apply("LOT AREA 14, 250 SF"), "LOT AREA 14,250 SF");
        assert_eq!(post.apply("A      B"), "A  B");
        assert_eq!(post.apply("A\u{a0}B"), "A B");
    }

    #[test]
    fn artifact_runs_collapse() {
        let post = OcrPostProcessor::new();
        assert_eq!(post.apply("------------"), "---");
        assert_eq!(post.apply("TOTAL........14"), "TOTAL...14");
        assert_eq!(post.apply("|||cell|||"), "|cell|");
        assert_eq!(post.apply("________"), "___");
    }

    #[test]
    fn chained_repairs_converge_in_one_apply() {
        let post = OcrPostProcessor::new();
        assert_eq!(post.apply("a-\nb-\nc"), "abc");
        assert_eq!(post.apply("LOT AREA 1, 000, 000 SF"), "LOT AREA 1,000,000 SF");
    }

    #[test]
    fn apply_is_idempotent_on_samples() {
        let post = OcrPostProcessor::new();
        for sample in [
            "RESI-\nDENTIAL  BUILDING with 1O5 units and 14, 250 SF-------",
            "ZONING  ANALYSIS ....... FAR 3.S5 |||",
            "",
            "plain text stays plain",
        ] {
            let once = post.apply(sample);
            let twice = post.apply(&once);
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }
}
