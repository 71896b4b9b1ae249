use crate::charclass::CharClass;
use crate::grouper::{GroupedWord, Grouper};
use crate::table::{FrequencyTable, Report};
use log::debug;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListGenError {
    #[error("Failed to write list to {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The kinds of chunk a [`ListGen`] can collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Words,
    Digits,
}

impl ListKind {
    pub fn class(self) -> CharClass {
        match self {
            ListKind::Words => CharClass::Alpha,
            ListKind::Digits => CharClass::Digit,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ListKind::Words => "words",
            ListKind::Digits => "digits",
        }
    }

    fn title(self) -> &'static str {
        match self {
            ListKind::Words => "Words",
            ListKind::Digits => "Digits",
        }
    }
}

/// Counts the individual strings (and optionally digit runs) found in a
/// wordlist, e.g. to seed a dictionary for the rules RuleGen produces.
#[derive(Debug, Clone, Default)]
pub struct ListGen {
    digits: bool,
    words: FrequencyTable,
    digit_runs: FrequencyTable,
}

impl ListGen {
    pub fn new(digits: bool) -> Self {
        Self {
            digits,
            ..Self::default()
        }
    }

    pub fn from_words<I>(words: I, grouper: &Grouper, digits: bool) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let mut listgen = Self::new(digits);
        for grouped in grouper.parse(words) {
            listgen.add(&grouped);
        }
        debug!(
            "listgen: {} distinct words, {} distinct digit runs",
            listgen.words.len(),
            listgen.digit_runs.len()
        );
        listgen
    }

    /// Kinds collected by this instance, in report order.
    pub fn kinds(&self) -> Vec<ListKind> {
        if self.digits {
            vec![ListKind::Words, ListKind::Digits]
        } else {
            vec![ListKind::Words]
        }
    }

    pub fn table(&self, kind: ListKind) -> &FrequencyTable {
        match kind {
            ListKind::Words => &self.words,
            ListKind::Digits => &self.digit_runs,
        }
    }

    pub fn add(&mut self, word: &GroupedWord) {
        let kinds = self.kinds();
        for group in word {
            if let Some(&kind) = kinds.iter().find(|kind| kind.class() == group.class) {
                let table = match kind {
                    ListKind::Words => &mut self.words,
                    ListKind::Digits => &mut self.digit_runs,
                };
                table.record(group.chunk.clone(), 1);
            }
        }
    }

    /// Ranked summary of one kind; `None` when nothing of that kind was seen.
    pub fn summary(&self, kind: ListKind, limit: usize) -> Option<Report> {
        self.table(kind).summarize(kind.title(), limit, |chunk| {
            String::from_utf8_lossy(chunk).into_owned()
        })
    }

    /// Plain-text report with one section per collected kind.
    pub fn report(&self, limit: usize) -> String {
        let mut out = String::new();
        for kind in self.kinds() {
            match self.summary(kind, limit) {
                Some(report) => out.push_str(&report.to_string()),
                None => out.push_str(&format!("\nNo {} to display.\n\n", kind.label())),
            }
        }
        out
    }

    /// Writes every collected kind, most frequent first and one entry per line,
    /// to `<base>_words` and `<base>_digits`. Returns the paths written.
    pub fn write_lists(&self, base: &Path) -> Result<Vec<PathBuf>, ListGenError> {
        let mut written = Vec::new();
        for kind in self.kinds() {
            let mut name = OsString::from(base.as_os_str());
            name.push("_");
            name.push(kind.label());
            let path = PathBuf::from(name);
            self.write_list(kind, &path)
                .map_err(|source| ListGenError::Io {
                    path: path.clone(),
                    source,
                })?;
            debug!("wrote {} {} to {:?}", self.table(kind).len(), kind.label(), path);
            written.push(path);
        }
        Ok(written)
    }

    fn write_list(&self, kind: ListKind, path: &Path) -> std::io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        for (chunk, _) in self.table(kind).ranked() {
            out.write_all(chunk)?;
            out.write_all(b"\n")?;
        }
        out.flush()
    }
}
