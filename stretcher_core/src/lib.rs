//! Wordlist analysis for password-cracking rule generation.
//!
//! Words are segmented into character-class groups ([`Grouper`]), ranked
//! structural rules are extracted from the groups ([`RuleGen`]), individual
//! strings and digit runs are tallied ([`ListGen`]), and case/leetspeak
//! variants are generated lazily under per-word budgets ([`Mutator`]).

pub mod charclass;
pub mod config;
pub mod grouper;
pub mod listgen;
pub mod mutator;
pub mod rulegen;
pub mod table;
pub mod wordlist;

pub use charclass::{CharClass, DIGIT_SENTINEL, STRING_SENTINEL};
pub use config::StretcherConfig;
pub use grouper::{Group, GroupedWord, Grouper};
pub use listgen::{ListGen, ListGenError, ListKind};
pub use mutator::{MutationBudget, Mutations, Mutator, MutatorConfig};
pub use rulegen::{RuleGen, RuleGenError, RuleTable};
pub use table::{FrequencyTable, Report};
pub use wordlist::{WordSource, WordlistError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_and_lists_share_one_grouping_pass_shape() {
        let words = ["summer2020!", "winter2020!", "p@$$w0rd1"].map(str::as_bytes);
        let grouper = Grouper::new();

        let rules = RuleGen::from_words(words.iter().copied(), &grouper, Vec::new());
        assert_eq!(rules.table().count(b"\x002020!"), 2);
        assert_eq!(rules.table().count(b"\x001"), 1);

        let lists = ListGen::from_words(words.iter().copied(), &grouper, true);
        assert_eq!(lists.table(ListKind::Digits).count(b"2020"), 2);
        assert_eq!(lists.table(ListKind::Words).count(b"p@$$w0rd"), 1);
    }

    #[test]
    fn mutator_output_feeds_back_into_rule_extraction() {
        let mut mutator = Mutator::new(MutatorConfig {
            cap: true,
            ..MutatorConfig::default()
        });
        let variants: Vec<Vec<u8>> = mutator.mutate_word(b"admin1").collect();
        assert_eq!(variants.len(), 3, "admin1, ADMIN1, Admin1");

        let rules = RuleGen::from_words(&variants, &Grouper::new(), Vec::new());
        assert_eq!(rules.table().len(), 1);
        assert_eq!(rules.table().count(b"\x001"), 3);
    }
}
