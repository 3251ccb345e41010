use crate::deps::thiserror;



#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("way {way} is out of range, a filter probes 4 to 8 bits per key")]
    Way {
        way: u32,
    },

    #[error("page level {page_level} is out of range for way {way}, expected {min} to 13")]
    PageLevel {
        way:        u32,
        page_level: u32,
        min:        u32,
    },

    #[error("page count {page_num} is out of range, expected 1 to 2^31 - 1")]
    PageCount {
        page_num: u64,
    },

    #[error("buffer of {len} bytes is not a positive multiple of the {page_size} byte page size")]
    BufferLength {
        len:       usize,
        page_size: usize,
    },

    #[error("an error occurred casting between integer types: {source}")]
    Number {
        #[from] source: std::num::TryFromIntError,
        #[cfg(feature = "nightly")]
        backtrace: std::backtrace::Backtrace,
    },

    #[error("parsing {typename} from {value:?}, reason: {reason:}")]
    Parse {
        value:    String,
        typename: &'static str,
        reason:   String,
    },
}
