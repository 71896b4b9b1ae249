use itertools::Itertools;
use itertools::structs::Combinations;
use log::trace;
use std::collections::HashSet;
use std::ops::Range;

/// Default number of leet variants a single word may emit before carry-over.
pub const DEFAULT_MAX_LEET_PER_WORD: i64 = 64;
/// Default number of case variants a single word may emit before carry-over.
pub const DEFAULT_MAX_CAP_PER_WORD: i64 = 128;

/// Which mutation stages run, and how many variants each word is allotted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutatorConfig {
    /// Enables leetspeak substitutions.
    pub leet: bool,
    /// Enables the common case variants (lower, upper, swapcase, ...).
    pub cap: bool,
    /// Enables every upper/lower combination. Implies `cap`.
    pub capswap: bool,
    /// Concatenate up to this many input words together. Values `<= 1` disable
    /// permutation. Output grows as `words^depth`.
    pub perm_depth: usize,
    pub max_leet_per_word: i64,
    pub max_cap_per_word: i64,
}

impl Default for MutatorConfig {
    fn default() -> Self {
        Self {
            leet: false,
            cap: false,
            capswap: false,
            perm_depth: 0,
            max_leet_per_word: DEFAULT_MAX_LEET_PER_WORD,
            max_cap_per_word: DEFAULT_MAX_CAP_PER_WORD,
        }
    }
}

/// Running per-stage quotas.
///
/// Each word adds its per-word allowance before emitting. The leet stage also
/// hands back `allowance - emitted` once the word is finished, so counters can
/// grow well past the allowance or fall below zero; a word that starts with a
/// non-positive leet budget emits nothing. The case stage has no such
/// correction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationBudget {
    pub leet: i64,
    pub cap: i64,
}

/// Maps a byte to the bytes that may replace it in a leet mutation.
#[derive(Debug, Clone)]
pub struct LeetTable {
    substitutes: Vec<Vec<u8>>,
}

impl LeetTable {
    /// Builds a table from `(letter, substitutes)` pairs. ASCII letters are
    /// registered under both cases.
    pub fn from_pairs(pairs: &[(u8, &[u8])]) -> Self {
        let mut substitutes = vec![Vec::new(); 256];
        for &(key, subs) in pairs {
            substitutes[key.to_ascii_lowercase() as usize] = subs.to_vec();
            substitutes[key.to_ascii_uppercase() as usize] = subs.to_vec();
        }
        Self { substitutes }
    }

    /// The small, high-yield table tried first.
    pub fn common() -> Self {
        Self::from_pairs(&[
            (b'a', b"@"),
            (b'e', b"3"),
            (b'i', b"1"),
            (b'o', b"0"),
            (b's', b"$"),
        ])
    }

    pub fn full() -> Self {
        Self::from_pairs(&[
            (b'a', b"4@"),
            (b'b', b"8"),
            (b'e', b"3"),
            (b'i', b"1"),
            (b'l', b"1"),
            (b'o', b"0"),
            (b's', b"5$"),
            (b't', b"7"),
        ])
    }

    pub fn substitutes(&self, byte: u8) -> &[u8] {
        &self.substitutes[byte as usize]
    }

    /// Every `(position, replacement)` pair applicable to `word`, ordered by
    /// position and then by table order.
    fn swaps(&self, word: &[u8]) -> Vec<(usize, u8)> {
        word.iter()
            .enumerate()
            .flat_map(|(pos, &b)| self.substitutes(b).iter().map(move |&sub| (pos, sub)))
            .collect()
    }
}

/// Leet candidates for one word and one table: 1 substitution, then 2, ...
#[derive(Debug)]
struct LeetCandidates {
    word: Vec<u8>,
    swaps: Vec<(usize, u8)>,
    passthrough: bool,
    size: usize,
    max_size: usize,
    combinations: Combinations<Range<usize>>,
}

impl LeetCandidates {
    fn new(word: &[u8], table: &LeetTable, passthrough: bool) -> Self {
        let swaps = table.swaps(word);
        // Combinations larger than the number of distinct positions always
        // substitute some position twice.
        let mut max_size = 0;
        let mut last_pos = None;
        for &(pos, _) in &swaps {
            if last_pos != Some(pos) {
                max_size += 1;
                last_pos = Some(pos);
            }
        }
        Self {
            word: word.to_vec(),
            combinations: (0..swaps.len()).combinations(1),
            swaps,
            passthrough,
            size: 1,
            max_size,
        }
    }
}

impl Iterator for LeetCandidates {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        if self.passthrough {
            self.passthrough = false;
            return Some(self.word.clone());
        }
        loop {
            if self.size > self.max_size {
                return None;
            }
            let Some(picks) = self.combinations.next() else {
                self.size += 1;
                self.combinations = (0..self.swaps.len()).combinations(self.size);
                continue;
            };
            // Swaps are sorted by position, so a repeated position is adjacent.
            if picks
                .windows(2)
                .any(|w| self.swaps[w[0]].0 == self.swaps[w[1]].0)
            {
                continue;
            }
            let mut candidate = self.word.clone();
            for pick in picks {
                let (pos, sub) = self.swaps[pick];
                candidate[pos] = sub;
            }
            return Some(candidate);
        }
    }
}

#[derive(Debug)]
struct LeetWord {
    common: LeetCandidates,
    full: LeetCandidates,
    seen: HashSet<Vec<u8>>,
}

impl LeetWord {
    fn new(word: &[u8], common: &LeetTable, full: &LeetTable) -> Self {
        Self {
            common: LeetCandidates::new(word, common, true),
            full: LeetCandidates::new(word, full, false),
            seen: HashSet::new(),
        }
    }

    fn next_unseen(&mut self) -> Option<Vec<u8>> {
        let seen = &self.seen;
        self.common
            .by_ref()
            .chain(self.full.by_ref())
            .find(|candidate| !seen.contains(candidate))
    }
}

/// Permutation stage: passthrough, or every concatenation of up to `depth`
/// input words (with repetition).
#[derive(Debug)]
pub struct PermStage<I> {
    source: Option<I>,
    depth: usize,
    words: Vec<Vec<u8>>,
    odometer: Vec<usize>,
    done: bool,
}

impl<I: Iterator<Item = Vec<u8>>> PermStage<I> {
    pub fn new(source: I, depth: usize) -> Self {
        Self {
            source: Some(source),
            depth,
            words: Vec::new(),
            odometer: Vec::new(),
            done: false,
        }
    }

    fn advance(&mut self) {
        for slot in self.odometer.iter_mut().rev() {
            *slot += 1;
            if *slot < self.words.len() {
                return;
            }
            *slot = 0;
        }
        let width = self.odometer.len() + 1;
        if width > self.depth {
            self.done = true;
        } else {
            self.odometer = vec![0; width];
        }
    }
}

impl<I: Iterator<Item = Vec<u8>>> Iterator for PermStage<I> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        if self.depth <= 1 {
            return self.source.as_mut()?.next();
        }
        if let Some(source) = self.source.take() {
            self.words = source.collect();
            self.odometer = vec![0];
            self.done = self.words.is_empty();
        }
        if self.done {
            return None;
        }
        let joined = self
            .odometer
            .iter()
            .flat_map(|&i| self.words[i].iter().copied())
            .collect();
        self.advance();
        Some(joined)
    }
}

/// Leetspeak stage. See [`MutationBudget`] for the quota rules.
#[derive(Debug)]
pub struct LeetStage<'m, I> {
    source: I,
    enabled: bool,
    common: &'m LeetTable,
    full: &'m LeetTable,
    budget: &'m mut i64,
    max_per_word: i64,
    current: Option<LeetWord>,
}

impl<'m, I: Iterator<Item = Vec<u8>>> LeetStage<'m, I> {
    pub fn new(
        source: I,
        enabled: bool,
        common: &'m LeetTable,
        full: &'m LeetTable,
        budget: &'m mut i64,
        max_per_word: i64,
    ) -> Self {
        Self {
            source,
            enabled,
            common,
            full,
            budget,
            max_per_word,
            current: None,
        }
    }
}

impl<I: Iterator<Item = Vec<u8>>> Iterator for LeetStage<'_, I> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        if !self.enabled {
            return self.source.next();
        }
        loop {
            if let Some(state) = self.current.as_mut() {
                if let Some(candidate) = state.next_unseen() {
                    if *self.budget > 0 {
                        state.seen.insert(candidate.clone());
                        *self.budget -= 1;
                        return Some(candidate);
                    }
                }
                let emitted = state.seen.len() as i64;
                *self.budget += self.max_per_word - emitted;
                trace!("leet: {} variants emitted, budget now {}", emitted, self.budget);
                self.current = None;
            }
            let word = self.source.next()?;
            *self.budget += self.max_per_word;
            self.current = Some(LeetWord::new(&word, self.common, self.full));
        }
    }
}

fn swapcase(word: &[u8]) -> Vec<u8> {
    word.iter()
        .map(|&b| {
            if b.is_ascii_lowercase() {
                b.to_ascii_uppercase()
            } else {
                b.to_ascii_lowercase()
            }
        })
        .collect()
}

/// First byte upper case, the rest lower case.
fn capitalize(word: &[u8]) -> Vec<u8> {
    let mut out = word.to_ascii_lowercase();
    if let Some(first) = out.first_mut() {
        first.make_ascii_uppercase();
    }
    out
}

/// Upper-cases every letter that follows a non-letter and lower-cases the rest.
fn title(word: &[u8]) -> Vec<u8> {
    let mut prev_cased = false;
    word.iter()
        .map(|&b| {
            let out = if !b.is_ascii_alphabetic() {
                b
            } else if prev_cased {
                b.to_ascii_lowercase()
            } else {
                b.to_ascii_uppercase()
            };
            prev_cased = b.is_ascii_alphabetic();
            out
        })
        .collect()
}

/// Every upper/lower assignment of the word's letters, starting all lower and
/// flipping the last letter fastest.
#[derive(Debug)]
struct CaseCombinations {
    current: Vec<u8>,
    letters: Vec<usize>,
    upper: Vec<bool>,
    done: bool,
}

impl CaseCombinations {
    fn new(word: &[u8]) -> Self {
        let letters: Vec<usize> = word
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_ascii_alphabetic())
            .map(|(i, _)| i)
            .collect();
        Self {
            current: word.to_ascii_lowercase(),
            upper: vec![false; letters.len()],
            letters,
            done: false,
        }
    }
}

impl Iterator for CaseCombinations {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        if self.done {
            return None;
        }
        let out = self.current.clone();
        self.done = true;
        for slot in (0..self.letters.len()).rev() {
            let pos = self.letters[slot];
            if self.upper[slot] {
                self.upper[slot] = false;
                self.current[pos].make_ascii_lowercase();
            } else {
                self.upper[slot] = true;
                self.current[pos].make_ascii_uppercase();
                self.done = false;
                break;
            }
        }
        Some(out)
    }
}

#[derive(Debug)]
struct CaseWord {
    base: std::vec::IntoIter<Vec<u8>>,
    combinations: Option<CaseCombinations>,
    seen: HashSet<Vec<u8>>,
    stopped: bool,
}

impl CaseWord {
    fn new(word: &[u8], capswap: bool) -> Self {
        let mut base = Vec::with_capacity(6);
        let mut seen = HashSet::new();
        for variant in [
            word.to_vec(),
            word.to_ascii_lowercase(),
            word.to_ascii_uppercase(),
            swapcase(word),
            capitalize(word),
            title(word),
        ] {
            if seen.insert(variant.clone()) {
                base.push(variant);
            }
        }
        Self {
            base: base.into_iter(),
            combinations: capswap.then(|| CaseCombinations::new(word)),
            seen,
            stopped: false,
        }
    }

    fn next_candidate(&mut self) -> Option<Vec<u8>> {
        if let Some(variant) = self.base.next() {
            return Some(variant);
        }
        let seen = &mut self.seen;
        self.combinations
            .as_mut()?
            .find(|candidate| seen.insert(candidate.clone()))
    }
}

/// Case stage. Stops a word once its budget is spent; unused budget carries
/// over to the next word without correction.
#[derive(Debug)]
pub struct CaseStage<'m, I> {
    source: I,
    enabled: bool,
    capswap: bool,
    budget: &'m mut i64,
    max_per_word: i64,
    current: Option<CaseWord>,
}

impl<'m, I: Iterator<Item = Vec<u8>>> CaseStage<'m, I> {
    pub fn new(
        source: I,
        enabled: bool,
        capswap: bool,
        budget: &'m mut i64,
        max_per_word: i64,
    ) -> Self {
        Self {
            source,
            enabled,
            capswap,
            budget,
            max_per_word,
            current: None,
        }
    }
}

impl<I: Iterator<Item = Vec<u8>>> Iterator for CaseStage<'_, I> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        if !self.enabled {
            return self.source.next();
        }
        loop {
            if let Some(state) = self.current.as_mut() {
                if !state.stopped {
                    if let Some(candidate) = state.next_candidate() {
                        *self.budget -= 1;
                        if *self.budget <= 0 {
                            state.stopped = true;
                        }
                        return Some(candidate);
                    }
                }
                trace!("case: word finished, budget now {}", self.budget);
                self.current = None;
            }
            let word = self.source.next()?;
            *self.budget += self.max_per_word;
            self.current = Some(CaseWord::new(&word, self.capswap));
        }
    }
}

/// Lazy stream of mutated words: permutation, then leet, then case.
#[derive(Debug)]
pub struct Mutations<'m, I: Iterator<Item = Vec<u8>>> {
    inner: CaseStage<'m, LeetStage<'m, PermStage<I>>>,
}

impl<I: Iterator<Item = Vec<u8>>> Iterator for Mutations<'_, I> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        self.inner.next()
    }
}

/// Generates case, leetspeak and permutation variants of words.
///
/// The mutation budget belongs to the instance and persists across calls to
/// [`Mutator::mutations`]; use a separate instance (or [`Mutator::reset_budget`])
/// for each independent consumer.
#[derive(Debug, Clone)]
pub struct Mutator {
    config: MutatorConfig,
    leet_common: LeetTable,
    leet_full: LeetTable,
    budget: MutationBudget,
}

impl Mutator {
    pub fn new(config: MutatorConfig) -> Self {
        Self::with_tables(config, LeetTable::common(), LeetTable::full())
    }

    /// Creates a mutator with custom substitution tables. `common` is tried
    /// first and contributes the unmodified word; `full` follows.
    pub fn with_tables(config: MutatorConfig, common: LeetTable, full: LeetTable) -> Self {
        Self {
            config,
            leet_common: common,
            leet_full: full,
            budget: MutationBudget::default(),
        }
    }

    pub fn budget(&self) -> MutationBudget {
        self.budget
    }

    pub fn reset_budget(&mut self) {
        self.budget = MutationBudget::default();
    }

    /// Returns the lazy mutation stream for `words`. Nothing is computed until
    /// the stream is pulled; dropping it early abandons the remaining work.
    pub fn mutations<I>(&mut self, words: I) -> Mutations<'_, I::IntoIter>
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        let Mutator {
            config,
            leet_common,
            leet_full,
            budget,
        } = self;
        let perm = PermStage::new(words.into_iter(), config.perm_depth);
        let leet = LeetStage::new(
            perm,
            config.leet,
            leet_common,
            leet_full,
            &mut budget.leet,
            config.max_leet_per_word,
        );
        let case = CaseStage::new(
            leet,
            config.cap || config.capswap,
            config.capswap,
            &mut budget.cap,
            config.max_cap_per_word,
        );
        Mutations { inner: case }
    }

    pub fn mutate_word(&mut self, word: &[u8]) -> Mutations<'_, std::iter::Once<Vec<u8>>> {
        self.mutations(std::iter::once(word.to_vec()))
    }
}
