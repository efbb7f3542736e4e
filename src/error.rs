#[derive(thiserror::Error, Debug)]
pub enum LinHashError {
    #[error("record too large: {size} bytes exceeds page capacity {max}")]
    RecordTooLarge { size: usize, max: usize },

    #[error("malformed record at page {page}, offset {offset}: {reason}")]
    MalformedRecord {
        page: u32,
        offset: usize,
        reason: String,
    },

    #[error("short read at page {page}: expected {expected} bytes, got {got}")]
    ShortRead {
        page: u32,
        expected: usize,
        got: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    BadSliceLength(#[from] std::array::TryFromSliceError),
}
