use crate::charclass::{CharClass, DIGIT_SENTINEL, STRING_SENTINEL};
use crate::grouper::{Group, GroupedWord, Grouper, concat_chunks};
use crate::table::{FrequencyTable, Report};
use log::debug;
use thiserror::Error;

/// Rule template → weighted occurrence count.
pub type RuleTable = FrequencyTable;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RuleGenError {
    /// Nothing produced a structural rule; callers normally print a notice.
    #[error("No rules to display.")]
    NoRules,
}

/// Extracts structural rules: each alpha group of a word is swapped for a
/// string placeholder, leaving the literal context around it.
///
/// With custom digits configured, digit groups in that context are swapped for
/// a digit placeholder too (one at a time) and every such rule counts once per
/// custom digit candidate.
#[derive(Debug, Clone, Default)]
pub struct RuleGen {
    custom_digits: Vec<Vec<u8>>,
    table: RuleTable,
}

impl RuleGen {
    pub fn new(custom_digits: Vec<Vec<u8>>) -> Self {
        Self {
            custom_digits,
            table: RuleTable::new(),
        }
    }

    /// Groups every word with `grouper` and adds it.
    pub fn from_words<I>(words: I, grouper: &Grouper, custom_digits: Vec<Vec<u8>>) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let mut rulegen = Self::new(custom_digits);
        for grouped in grouper.parse(words) {
            rulegen.add(&grouped);
        }
        debug!(
            "rulegen: {} distinct rules, total weight {}",
            rulegen.table.len(),
            rulegen.table.total()
        );
        rulegen
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Records every rule derivable from an already grouped word.
    ///
    /// Words with fewer than two groups carry no structure and are skipped.
    /// There is no upper bound on the number of groups.
    pub fn add(&mut self, word: &GroupedWord) {
        let groups = word.groups();
        if groups.len() <= 1 {
            return;
        }

        for (index, group) in groups.iter().enumerate() {
            if group.class != CharClass::Alpha {
                continue;
            }
            let before = &groups[..index];
            let after = &groups[index + 1..];

            if self.custom_digits.is_empty() {
                self.table.record(template(before, after), 1);
                continue;
            }

            let weight = self.custom_digits.len() as u64;
            let prepend = concat_chunks(before);
            let append = concat_chunks(after);
            for variant in digit_variants(before) {
                let mut rule = variant;
                rule.push(STRING_SENTINEL);
                rule.extend_from_slice(&append);
                self.table.record(rule, weight);
            }
            for variant in digit_variants(after) {
                let mut rule = prepend.clone();
                rule.push(STRING_SENTINEL);
                rule.extend_from_slice(&variant);
                self.table.record(rule, weight);
            }
        }
    }

    /// Ranks the table and keeps the top `limit` rules.
    pub fn summary(&self, limit: usize) -> Result<Report, RuleGenError> {
        self.table
            .summarize("Rules", limit, render_rule)
            .ok_or(RuleGenError::NoRules)
    }

    /// Plain-text ranked report of the top `limit` rules.
    pub fn report(&self, limit: usize) -> Result<String, RuleGenError> {
        self.summary(limit).map(|report| report.to_string())
    }
}

fn template(before: &[Group], after: &[Group]) -> Vec<u8> {
    let mut rule = concat_chunks(before);
    rule.push(STRING_SENTINEL);
    rule.extend(after.iter().flat_map(|g| g.chunk.iter().copied()));
    rule
}

/// One concatenation of `groups` per digit group, with that group replaced by
/// the digit placeholder.
fn digit_variants(groups: &[Group]) -> impl Iterator<Item = Vec<u8>> + '_ {
    groups
        .iter()
        .enumerate()
        .filter(|(_, g)| g.class == CharClass::Digit)
        .map(move |(target, _)| {
            let mut out = Vec::new();
            for (i, g) in groups.iter().enumerate() {
                if i == target {
                    out.push(DIGIT_SENTINEL);
                } else {
                    out.extend_from_slice(&g.chunk);
                }
            }
            out
        })
}

/// Human-readable form of a rule template.
pub fn render_rule(rule: &[u8]) -> String {
    let mut out = Vec::with_capacity(rule.len() + 8);
    for &b in rule {
        match b {
            STRING_SENTINEL => out.extend_from_slice(b"[string]"),
            DIGIT_SENTINEL => out.extend_from_slice(b"[digit]"),
            _ => out.push(b),
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rulegen(words: &[&str], digits: &[&str]) -> RuleGen {
        let digits = digits.iter().map(|d| d.as_bytes().to_vec()).collect();
        RuleGen::from_words(words.iter().map(|w| w.as_bytes()), &Grouper::new(), digits)
    }

    #[test]
    fn alpha_then_digits_yields_one_rule() {
        let rules = rulegen(&["password123"], &[]);
        assert_eq!(rules.table().len(), 1);
        assert_eq!(rules.table().count(b"\x00123"), 1);
        assert_eq!(rules.table().total(), 1);
    }

    #[test]
    fn single_group_words_are_skipped() {
        let rules = rulegen(&["password", "12345", "", "p@$$w0rd"], &[]);
        assert!(rules.table().is_empty());
        assert_eq!(rules.report(10), Err(RuleGenError::NoRules));
        assert_eq!(RuleGenError::NoRules.to_string(), "No rules to display.");
    }

    #[test]
    fn every_alpha_group_is_a_core() {
        let rules = rulegen(&["abc123def"], &[]);
        assert_eq!(rules.table().count(b"\x00123def"), 1);
        assert_eq!(rules.table().count(b"abc123\x00"), 1);
        assert_eq!(rules.table().total(), 2);
    }

    #[test]
    fn leet_merged_core_is_replaced_as_a_whole() {
        let rules = rulegen(&["!p@$$w0rd99"], &[]);
        assert_eq!(rules.table().len(), 1);
        assert_eq!(rules.table().count(b"!\x0099"), 1);
    }

    #[test]
    fn many_groups_are_not_capped() {
        // Groups: a1b ! c3d ! e7f
        let rules = rulegen(&["a1b!c3d!e7f"], &[]);
        assert_eq!(rules.table().total(), 3, "one rule per alpha group");
        assert_eq!(rules.table().count(b"a1b!c3d!\x00"), 1);
    }

    #[test]
    fn custom_digits_weight_digit_variants() {
        let rules = rulegen(&["abc123def"], &["0", "1"]);
        assert_eq!(rules.table().len(), 2);
        assert_eq!(rules.table().count(b"\x00\x01def"), 2);
        assert_eq!(rules.table().count(b"abc\x01\x00"), 2);
        assert_eq!(
            rules.table().count(b"\x00123def"),
            0,
            "The plain template is not recorded when custom digits are set"
        );
        assert_eq!(rules.table().total(), 4);
    }

    #[test]
    fn custom_digits_replace_one_digit_group_at_a_time() {
        let rules = rulegen(&["12pass34"], &["7", "8", "9"]);
        assert_eq!(rules.table().count(b"\x01\x0034"), 3);
        assert_eq!(rules.table().count(b"12\x00\x01"), 3);
        assert_eq!(rules.table().total(), 6);
    }

    #[test]
    fn custom_digits_without_digit_groups_record_nothing() {
        let rules = rulegen(&["abc!def"], &["0"]);
        assert!(rules.table().is_empty());
    }

    #[test]
    fn report_ranks_and_renders_placeholders() {
        let rules = rulegen(&["pass1", "word1", "abc2"], &[]);
        let summary = rules.summary(1).unwrap();
        assert_eq!(summary.distinct, 2);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.entries[0].text, "[string]1");
        assert_eq!(summary.entries[0].count, 2);
        assert!((summary.coverage - 200.0 / 3.0).abs() < 1e-9);

        let text = rules.report(1).unwrap();
        assert!(text.starts_with("\n\nTop 1 Rules out of 2 (66.7% coverage)\n"));
        assert!(text.contains(&format!("{:>15} (66.7%):    [string]1", "2")));

        let full = rules.summary(50).unwrap();
        assert_eq!(full.shown_count(), full.total);
    }

    #[test]
    fn render_rule_handles_both_placeholders_and_invalid_utf8() {
        assert_eq!(render_rule(b"!\x00\x01"), "![string][digit]");
        assert_eq!(render_rule(b"\xff\x00"), "\u{fffd}[string]");
    }
}
