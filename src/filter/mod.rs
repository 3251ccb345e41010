//! The page-partitioned Bloom filter.
//!
//! A classical Bloom filter scatters the `k` bits of one key across the
//! whole bit array; at realistic sizes every probe is a cache miss. Here the
//! backing buffer is split into pages and one hash pass pins a key to a
//! single page plus eight candidate bit positions inside it:
//!
//! ```text
//! data:  | page 0 | page 1 | page 2 | ... | page N-1 |     2^pageLevel bytes each
//!
//! key  --hash128-->  (pageCode, v[0..8])
//!
//! page   = pageCode % pageNum
//! bit i  = v[i] & (2^(pageLevel + 3) - 1)        for i in 0..way
//! ```
//!
//! Every `set` and `test` therefore touches exactly one page, which fits in
//! one or two cache lines at the small page levels.
//!
//! A filter is single-threaded by contract: `set` is a read-modify-write on
//! page bytes and concurrent `set` calls can lose updates. Callers that
//! share a filter across threads must serialize mutation themselves.

mod engine;

use std::{
    convert::TryFrom,
    fmt,
};

use self::engine::Engine;
use crate::{
    deps::log::debug,
    error::Error,
    params::{
        Params,
        Way,
    },
};


/// A page-partitioned Bloom filter over arbitrary byte-sequence keys.
///
/// Construction fixes the layout; afterwards [`set`](PageBloomFilter::set)
/// and [`test`](PageBloomFilter::test) never fail and never allocate.
pub struct PageBloomFilter {
    params: Params,
    engine: Engine,
}


impl PageBloomFilter {
    /// Construct an empty filter from an explicit layout.
    pub fn new(
        way: Way,
        page_level: u32,
        page_num: u32,
    ) -> Result<Self, Error> {
        let params = Params::new(way, page_level, page_num)?;
        Ok(PageBloomFilter {
            params,
            engine: Engine::with_params(&params),
        })
    }

    /// Construct an empty filter sized for `items` keys at false-positive
    /// rate `fpr`. Out-of-range targets are clamped, not rejected; see
    /// [`Params::with_target`].
    pub fn with_target(
        items: usize,
        fpr: f64,
    ) -> Result<Self, Error> {
        let params = Params::with_target(items, fpr)?;
        Ok(PageBloomFilter {
            params,
            engine: Engine::with_params(&params),
        })
    }

    /// Reconstitute a filter from a previously exposed buffer.
    ///
    /// `data` must be non-empty and a whole number of `2^page_level`-byte
    /// pages; it is copied into the new filter. `unique_cnt` restores the
    /// insertion counter the buffer was saved with.
    pub fn from_bytes(
        way: Way,
        page_level: u32,
        data: &[u8],
        unique_cnt: usize,
    ) -> Result<Self, Error> {
        if page_level > Params::MAX_PAGE_LEVEL {
            return Err(Error::PageLevel {
                way: way.probes(),
                page_level,
                min: way.min_page_level(),
            });
        }

        let page_size = 1usize << page_level;
        if data.is_empty() || data.len() % page_size != 0 {
            return Err(Error::BufferLength {
                len: data.len(),
                page_size,
            });
        }

        let page_num = u32::try_from(data.len() / page_size)?;
        let params = Params::new(way, page_level, page_num)?;
        debug!(
            "reloading filter: way {} page_level {} from {} bytes, {} unique",
            way,
            page_level,
            data.len(),
            unique_cnt
        );

        let mut engine = Engine::with_params(&params);
        engine.load(data, unique_cnt);
        Ok(PageBloomFilter { params, engine })
    }

    /// Insert a key. Returns `true` when the key was not already present by
    /// the Bloom test, i.e. at least one of its bits was still zero.
    pub fn set(
        &mut self,
        key: &[u8],
    ) -> bool {
        match self.params.way() {
            Way::W4 => self.engine.set::<4>(key),
            Way::W5 => self.engine.set::<5>(key),
            Way::W6 => self.engine.set::<6>(key),
            Way::W7 => self.engine.set::<7>(key),
            Way::W8 => self.engine.set::<8>(key),
        }
    }

    /// Query a key. `false` means the key was definitely never inserted;
    /// `true` means it probably was.
    pub fn test(
        &self,
        key: &[u8],
    ) -> bool {
        match self.params.way() {
            Way::W4 => self.engine.test::<4>(key),
            Way::W5 => self.engine.test::<5>(key),
            Way::W6 => self.engine.test::<6>(key),
            Way::W7 => self.engine.test::<7>(key),
            Way::W8 => self.engine.test::<8>(key),
        }
    }

    /// Zero the buffer and reset the unique counter.
    pub fn clear(&mut self) {
        self.engine.clear();
    }

    /// The raw backing buffer.
    ///
    /// Together with `way`, `page_level` and `unique` this is the complete
    /// persisted form of a filter; feed it back through
    /// [`from_bytes`](PageBloomFilter::from_bytes). The view is read-only
    /// on purpose: mutating the buffer behind the filter's back would
    /// invalidate the unique counter.
    pub fn data(&self) -> &[u8] {
        self.engine.data()
    }

    /// Approximate count of distinct keys inserted so far.
    ///
    /// Incremented only when `set` reports a fresh insertion, so hash
    /// collisions make it undercount. That drift is inherent to a Bloom
    /// filter and is not corrected for.
    pub fn unique(&self) -> usize {
        self.engine.unique()
    }

    pub const fn way(&self) -> u32 {
        self.params.way().probes()
    }

    pub const fn page_level(&self) -> u32 {
        self.params.page_level()
    }

    /// Advisory upper bound on well-behaved insertions:
    /// `len(data) * 8 / way`. Running past it degrades the false-positive
    /// rate rather than failing.
    pub fn cap(&self) -> usize {
        self.data().len() * 8 / self.way() as usize
    }

    pub const fn params(&self) -> Params {
        self.params
    }
}


impl fmt::Debug for PageBloomFilter {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("PageBloomFilter")
            .field("way", &self.way())
            .field("page_level", &self.page_level())
            .field("page_num", &self.params.page_num())
            .field("unique", &self.unique())
            .field("len", &self.data().len())
            .finish()
    }
}
