use crate::charclass::contains_sentinel;
use log::debug;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WordlistError {
    #[error("Cannot find the file {0:?}")]
    NotFound(PathBuf),
    #[error("Wordlist I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Strips any leading and trailing `\r` / `\n` bytes.
pub fn strip_line_endings(line: &[u8]) -> &[u8] {
    let is_eol = |b: &u8| *b == b'\r' || *b == b'\n';
    let start = line.iter().position(|b| !is_eol(b)).unwrap_or(line.len());
    let end = line.iter().rposition(|b| !is_eol(b)).map_or(start, |i| i + 1);
    &line[start..end]
}

/// Iterator over the words of a newline-separated wordlist.
///
/// Lines containing a sentinel byte are dropped, since they could not be told
/// apart from placeholders in rule templates.
#[derive(Debug)]
pub struct Words<R> {
    reader: R,
    line: Vec<u8>,
    discarded: usize,
}

impl<R> Words<R> {
    /// Number of lines dropped so far for containing a sentinel byte.
    pub fn discarded(&self) -> usize {
        self.discarded
    }
}

impl<R: BufRead> Iterator for Words<R> {
    type Item = Result<Vec<u8>, WordlistError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => return None,
                Ok(_) if contains_sentinel(&self.line) => {
                    self.discarded += 1;
                    debug!("discarding line containing a reserved byte");
                }
                Ok(_) => return Some(Ok(strip_line_endings(&self.line).to_vec())),
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

pub fn read_words<R: BufRead>(reader: R) -> Words<R> {
    Words {
        reader,
        line: Vec::new(),
        discarded: 0,
    }
}

/// Opens a wordlist file for streaming.
pub fn open_wordlist(path: &Path) -> Result<Words<BufReader<File>>, WordlistError> {
    if !path.is_file() {
        return Err(WordlistError::NotFound(path.to_path_buf()));
    }
    Ok(read_words(BufReader::new(File::open(path)?)))
}

/// Where the wordlist comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordSource {
    File(PathBuf),
    Stdin,
}

impl WordSource {
    /// Reads every word from the source into memory.
    pub fn load(&self) -> Result<Vec<Vec<u8>>, WordlistError> {
        let words = match self {
            WordSource::File(path) => open_wordlist(path)?.collect::<Result<Vec<_>, _>>()?,
            WordSource::Stdin => read_words(io::stdin().lock()).collect::<Result<Vec<_>, _>>()?,
        };
        debug!("loaded {} words from {:?}", words.len(), self);
        Ok(words)
    }
}

/// Interprets the custom digit argument: the words of `arg` if it names a
/// file, otherwise its comma-separated values.
pub fn parse_custom_digits(arg: &str) -> Result<Vec<Vec<u8>>, WordlistError> {
    let path = Path::new(arg);
    if path.is_file() {
        return open_wordlist(path)?.collect();
    }
    Ok(arg.split(',').map(|d| d.as_bytes().to_vec()).collect())
}
