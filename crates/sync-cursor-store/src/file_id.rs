use crate::{CursorError, CursorResult};
use std::fmt;
use std::str::FromStr;

const LOG_SUFFIX: &str = ".log";

/// Identifier of a remote log file, serialized as `<prefix>_<sequence>.log`.
///
/// Ordering is by `(prefix, sequence)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId {
    pub prefix: u64,
    pub sequence: u64,
}

impl FileId {
    pub fn new(prefix: u64, sequence: u64) -> Self {
        Self { prefix, sequence }
    }

    /// Parse a file name such as `20230101_5.log`.
    pub fn parse(name: &str) -> CursorResult<Self> {
        let invalid = || CursorError::InvalidName(name.to_string());

        let stem = name.strip_suffix(LOG_SUFFIX).ok_or_else(invalid)?;
        let (prefix, sequence) = stem.split_once('_').ok_or_else(invalid)?;
        if !is_digits(prefix) || !is_digits(sequence) {
            return Err(invalid());
        }

        Ok(Self {
            prefix: prefix.parse().map_err(|_| invalid())?,
            sequence: sequence.parse().map_err(|_| invalid())?,
        })
    }

    /// Whether `name` is a well-formed log file name.
    pub fn is_valid_name(name: &str) -> bool {
        Self::parse(name).is_ok()
    }

    /// The following file in the same prefix.
    pub fn next(&self) -> CursorResult<Self> {
        let sequence = self
            .sequence
            .checked_add(1)
            .ok_or_else(|| CursorError::SequenceOverflow(self.file_name()))?;
        Ok(Self {
            prefix: self.prefix,
            sequence,
        })
    }

    /// Parse `name` and return the file that follows it.
    pub fn next_after(name: &str) -> CursorResult<Self> {
        Self::parse(name)?.next()
    }

    pub fn file_name(&self) -> String {
        self.to_string()
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}{}", self.prefix, self.sequence, LOG_SUFFIX)
    }
}

impl FromStr for FileId {
    type Err = CursorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
