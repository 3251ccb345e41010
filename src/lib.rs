#![allow(warnings)]
#![cfg_attr(feature = "nightly", feature(backtrace))]

pub(crate) mod deps {
    pub use derive_more;
    pub use lazy_static;
    pub use log;
    pub use serde;
    pub use thiserror;
}

pub mod error;
pub mod filter;
pub mod hash;
pub mod params;
