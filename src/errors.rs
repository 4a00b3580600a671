use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProfileError>;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Loading was cancelled")]
    Cancelled,
    #[error("Parsing error at byte {offset} (line {line}, column {column}): {source}")]
    Parse {
        offset: usize,
        line: usize,
        column: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaViolation),
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("Profile exceeds the size limit of {limit} bytes")]
    TooLarge { limit: usize },
}

/// Ways a well-formed document can fail to be a profile.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaViolation {
    #[error("top-level value is not an object")]
    NotAnObject,
    #[error("required member \"uid\" is missing")]
    MissingUid,
    #[error("member \"uid\" is not a string")]
    UidNotString,
    #[error("member \"uid\" is empty")]
    EmptyUid,
}

impl ProfileError {
    /// Wraps a syntax error raised while parsing `data`, locating it
    /// as a byte offset into the buffer.
    pub(crate) fn parse(data: &[u8], source: serde_json::Error) -> Self {
        let line = source.line();
        let column = source.column();
        Self::Parse {
            offset: byte_offset(data, line, column),
            line,
            column,
            source,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

// serde_json counts columns as bytes consumed on the current line
fn byte_offset(data: &[u8], line: usize, column: usize) -> usize {
    let line_start = if line <= 1 {
        0
    } else {
        data.iter()
            .enumerate()
            .filter(|(_, byte)| **byte == b'\n')
            .nth(line - 2)
            .map(|(index, _)| index + 1)
            .unwrap_or(data.len())
    };
    (line_start + column).min(data.len())
}
