use crate::charclass::CharClass;
use log::info;

/// Bytes accepted as a letter substitute inside a leet-merged group.
pub const DEFAULT_LEET_CHARS: &[u8] = b"013578@$";

/// How often, in words, [`Grouped`] reports progress when not configured otherwise.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 1000;

/// A contiguous run of one character class within a word.
///
/// After leet merging a group may also be a composite alpha/leet/alpha run,
/// in which case it carries the class of its first run (`Alpha`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Group {
    pub class: CharClass,
    pub chunk: Vec<u8>,
}

impl Group {
    pub fn new(class: CharClass, chunk: impl Into<Vec<u8>>) -> Self {
        Self {
            class,
            chunk: chunk.into(),
        }
    }
}

/// A word split into ordered [`Group`]s. Concatenating every chunk yields the
/// original word.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupedWord {
    groups: Vec<Group>,
}

impl GroupedWord {
    pub fn new(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Group> {
        self.groups.iter()
    }

    /// Reassembles the word from its chunks.
    pub fn concat(&self) -> Vec<u8> {
        concat_chunks(&self.groups)
    }

    pub fn into_groups(self) -> Vec<Group> {
        self.groups
    }
}

impl<'a> IntoIterator for &'a GroupedWord {
    type Item = &'a Group;
    type IntoIter = std::slice::Iter<'a, Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

pub(crate) fn concat_chunks(groups: &[Group]) -> Vec<u8> {
    let len = groups.iter().map(|g| g.chunk.len()).sum();
    let mut out = Vec::with_capacity(len);
    for group in groups {
        out.extend_from_slice(&group.chunk);
    }
    out
}

/// Splits words into character-class runs and folds leetspeak substrings
/// (`p@$$w0rd`) back into a single alpha group.
#[derive(Debug, Clone)]
pub struct Grouper {
    leet: bool,
    leet_chars: [bool; 256],
    progress_interval: usize,
}

impl Default for Grouper {
    fn default() -> Self {
        Self::new()
    }
}

impl Grouper {
    /// Creates a grouper with leet merging enabled over [`DEFAULT_LEET_CHARS`].
    pub fn new() -> Self {
        let mut grouper = Self {
            leet: true,
            leet_chars: [false; 256],
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        };
        grouper.set_leet_chars(DEFAULT_LEET_CHARS);
        grouper
    }

    pub fn with_leet(mut self, leet: bool) -> Self {
        self.leet = leet;
        self
    }

    /// Replaces the set of bytes allowed in the middle of a leet merge.
    pub fn with_leet_chars(mut self, chars: &[u8]) -> Self {
        self.set_leet_chars(chars);
        self
    }

    /// Sets how often [`Grouped`] logs progress. Zero disables it.
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    fn set_leet_chars(&mut self, chars: &[u8]) {
        self.leet_chars = [false; 256];
        for &c in chars {
            self.leet_chars[c as usize] = true;
        }
    }

    pub fn is_leet_char(&self, byte: u8) -> bool {
        self.leet_chars[byte as usize]
    }

    /// Segments a word into groups, applying leet merging if enabled.
    pub fn segment(&self, word: &[u8]) -> GroupedWord {
        let runs = self.runs(word);
        if self.leet {
            GroupedWord::new(self.merge_leet(runs))
        } else {
            GroupedWord::new(runs)
        }
    }

    /// Splits `word` into maximal runs of a single character class.
    pub fn runs(&self, word: &[u8]) -> Vec<Group> {
        let mut runs = Vec::new();
        let mut start = 0;
        let mut prev: Option<CharClass> = None;

        for (index, &byte) in word.iter().enumerate() {
            let class = CharClass::of(byte);
            if let Some(prev_class) = prev {
                if !class.intersects(prev_class.flag()) {
                    runs.push(Group::new(prev_class, &word[start..index]));
                    start = index;
                }
            }
            prev = Some(class);
        }
        if let Some(prev_class) = prev {
            runs.push(Group::new(prev_class, &word[start..]));
        }
        runs
    }

    /// Repeats merge passes over `groups` until one of them changes nothing.
    pub fn merge_leet(&self, mut groups: Vec<Group>) -> Vec<Group> {
        while let Some(merged) = self.merge_pass(&groups) {
            groups = merged;
        }
        groups
    }

    /// Runs a single left-to-right merge pass. Returns `None` when the pass
    /// would leave `groups` unchanged, including when the guard declines to try.
    fn merge_pass(&self, groups: &[Group]) -> Option<Vec<Group>> {
        if groups.len() <= 2 {
            return None;
        }
        let common = groups
            .iter()
            .fold(u8::MAX, |acc, g| acc & g.class.flag());
        if CharClass::from_flag(common).is_some() {
            return None;
        }

        let mut merged = Vec::with_capacity(groups.len());
        let mut changed = false;
        let mut index = 0;

        while index < groups.len() {
            if let [first, middle, last, ..] = &groups[index..] {
                if first.class == CharClass::Alpha
                    && middle.class.intersects(CharClass::NON_ALPHA)
                    && last.class == CharClass::Alpha
                {
                    if middle.chunk.iter().all(|&b| self.is_leet_char(b)) {
                        merged.push(Group::new(
                            first.class,
                            concat_chunks(&groups[index..index + 3]),
                        ));
                        changed = true;
                        index += 3;
                    } else {
                        merged.extend_from_slice(&groups[index..index + 2]);
                        index += 2;
                    }
                    continue;
                }
            }
            merged.push(groups[index].clone());
            index += 1;
        }

        changed.then_some(merged)
    }

    /// Lazily segments every word from `words`.
    pub fn parse<I>(&self, words: I) -> Grouped<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        Grouped {
            grouper: self,
            words: words.into_iter(),
            processed: 0,
        }
    }
}

/// Iterator returned by [`Grouper::parse`].
#[derive(Debug)]
pub struct Grouped<'g, I> {
    grouper: &'g Grouper,
    words: I,
    processed: usize,
}

impl<I> Grouped<'_, I> {
    /// Number of words segmented so far.
    pub fn processed(&self) -> usize {
        self.processed
    }
}

impl<I> Iterator for Grouped<'_, I>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    type Item = GroupedWord;

    fn next(&mut self) -> Option<GroupedWord> {
        let word = self.words.next()?;
        let interval = self.grouper.progress_interval;
        if interval > 0 && self.processed > 0 && self.processed % interval == 0 {
            info!("{} words processed", self.processed);
        }
        self.processed += 1;
        Some(self.grouper.segment(word.as_ref()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.words.size_hint()
    }
}
