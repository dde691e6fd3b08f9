//! Candidate wordlist loading.
//!
//! Reads a text resource into an ordered candidate list: lossy UTF-8, lines
//! trimmed, blank lines skipped. File order is significant and preserved.
//! An unreadable file is a configuration error surfaced before any sweep
//! starts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Ordered candidate list read from a wordlist file.
#[derive(Debug, Clone)]
pub struct Wordlist {
    candidates: Vec<String>,
}

impl Wordlist {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WordlistError> {
        let path = path.as_ref();
        let raw = fs::read(path).map_err(|source| WordlistError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let text = String::from_utf8_lossy(&raw);
        let candidates = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self { candidates })
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(String::as_str)
    }

    pub fn into_candidates(self) -> Vec<String> {
        self.candidates
    }
}

#[derive(Debug, Error)]
pub enum WordlistError {
    #[error("could not read wordlist {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn preserves_order_and_skips_blanks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "first").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  second  ").unwrap();
        writeln!(file, "   ").unwrap();
        writeln!(file, "third").unwrap();

        let wordlist = Wordlist::load(file.path()).unwrap();
        assert_eq!(
            wordlist.into_candidates(),
            vec!["first".to_string(), "second".to_string(), "third".to_string()]
        );
    }

    #[test]
    fn empty_file_yields_empty_list() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let wordlist = Wordlist::load(file.path()).unwrap();
        assert!(wordlist.is_empty());
        assert_eq!(wordlist.len(), 0);
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let result = Wordlist::load("/definitely/not/here.txt");
        assert!(matches!(result, Err(WordlistError::Io { .. })));
    }

    #[test]
    fn invalid_utf8_is_read_lossily() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"ok\n\xff\xfebad\nlast\n").unwrap();

        let wordlist = Wordlist::load(file.path()).unwrap();
        assert_eq!(wordlist.len(), 3);
    }
}
