//! Filter geometry: the probe count and the page layout, and the selection
//! of both from a target item count and false-positive rate.
//!
//! ```text
//! way        number of bits probed per key, 4 to 8
//! pageLevel  log2 of the page size in bytes, so one page holds
//!            2^(pageLevel + 3) candidate bit positions
//! pageNum    number of pages in the backing buffer
//! ```
//!
//! The selection formula works in bytes per item: a target rate `p` costs
//! `-log2(p) / ln2` bits per item, the probe count is `-log2(p)` rounded,
//! and the page level is the smallest page that keeps the buffer at three
//! pages or more so the page selector has something to choose between.

use std::{
    convert::TryFrom,
    str::FromStr,
};

use crate::{
    deps::{
        derive_more,
        log::debug,
        serde,
    },
    error::Error,
};


macro_rules! warn_once {
    ($name:ident; $($arg:tt)+) => {{
        use $crate::deps::lazy_static::lazy_static;
        use $crate::deps::log::warn;

        lazy_static! {
            static ref $name: ::std::sync::Once = ::std::sync::Once::new();
        }

        (&*($name)).call_once(|| {
            warn!("[WARN_ONCE] {}", format_args!($($arg)*))
        })
   }};
}


/// Number of bits probed per key.
///
/// Fixing the probe count to one of five known constants lets the probe
/// loop monomorphize and unroll; everything else about the filter layout is
/// runtime data.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialOrd,
    PartialEq,
    Eq,
    Ord,
    Hash,
    derive_more::Display,
    serde::Serialize,
    serde::Deserialize,
)]
#[repr(u32)]
pub enum Way {
    #[display(fmt = "4")]
    W4 = 4,
    #[display(fmt = "5")]
    W5 = 5,
    #[display(fmt = "6")]
    W6 = 6,
    #[display(fmt = "7")]
    W7 = 7,
    #[display(fmt = "8")]
    W8 = 8,
}


impl Way {
    pub const fn probes(&self) -> u32 {
        *self as u32
    }

    /// The smallest page level wide enough that a masked 16-bit coordinate
    /// addresses every bit of the page: `8 - 8/way`.
    pub const fn min_page_level(&self) -> u32 {
        8 - 8 / self.probes()
    }
}


impl TryFrom<u32> for Way {
    type Error = Error;

    fn try_from(way: u32) -> Result<Self, Self::Error> {
        match way {
            4 => Ok(Way::W4),
            5 => Ok(Way::W5),
            6 => Ok(Way::W6),
            7 => Ok(Way::W7),
            8 => Ok(Way::W8),
            way => Err(Error::Way { way }),
        }
    }
}


impl FromStr for Way {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "4" => Ok(Way::W4),
            "5" => Ok(Way::W5),
            "6" => Ok(Way::W6),
            "7" => Ok(Way::W7),
            "8" => Ok(Way::W8),
            _ => {
                Err(Error::Parse {
                    value:    value.to_string(),
                    typename: std::any::type_name::<Way>(),
                    reason:   "value was not one of: 4, 5, 6, 7, 8".to_string(),
                })
            }
        }
    }
}


/// A validated filter layout: probe count, page size and page count.
///
/// Instances only exist with `way.min_page_level() <= page_level <= 13` and
/// `page_num >= 1`, so the probe arithmetic downstream never range-checks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Params {
    way:        Way,
    page_level: u32,
    page_num:   u32,
}


impl Params {
    pub const MAX_FPR: f64 = 0.1;
    pub const MAX_PAGE_LEVEL: u32 = 13;
    pub const MAX_PAGE_NUM: u64 = (1 << 31) - 1;
    pub const MIN_FPR: f64 = 0.0005;

    pub fn new(
        way: Way,
        page_level: u32,
        page_num: u32,
    ) -> Result<Self, Error> {
        if page_level < way.min_page_level() || page_level > Params::MAX_PAGE_LEVEL {
            return Err(Error::PageLevel {
                way: way.probes(),
                page_level,
                min: way.min_page_level(),
            });
        }
        if page_num == 0 {
            return Err(Error::PageCount { page_num: 0 });
        }

        Ok(Params {
            way,
            page_level,
            page_num,
        })
    }

    /// Choose a layout for an expected item count and false-positive rate.
    ///
    /// `items` is raised to at least 1 and `fpr` is clamped into
    /// `[MIN_FPR, MAX_FPR]`. Fails only when the computed page count
    /// exceeds [`Params::MAX_PAGE_NUM`].
    pub fn with_target(
        items: usize,
        fpr: f64,
    ) -> Result<Self, Error> {
        let items = items.max(1);
        let fpr = clamp_fpr(fpr);

        let w = -fpr.log2();
        let mut bytes_per_item = w / (std::f64::consts::LN_2 * 8.0);
        let way = match w.round() as u32 {
            rounded if rounded < 4 => Way::W4,
            rounded if rounded >= 8 => {
                bytes_per_item *= 1.025;
                Way::W8
            }
            rounded => {
                bytes_per_item *= 1.01;
                Way::try_from(rounded)?
            }
        };

        let target_bytes = (bytes_per_item * items as f64) as u64;
        let mut page_level = 0;
        for level in 6u32..=11 {
            // smallest page size that still leaves at least ~4 pages
            if target_bytes < (1u64 << (level + 2)) {
                page_level = level;
                if page_level < way.min_page_level() {
                    page_level += 1;
                }
                break;
            }
        }
        if page_level == 0 {
            page_level = 12;
        }

        let page_size = 1u64 << page_level;
        let pages = ((target_bytes + page_size - 1) >> page_level).max(1);
        if pages > Params::MAX_PAGE_NUM {
            return Err(Error::PageCount { page_num: pages });
        }

        let params = Params::new(way, page_level, pages as u32)?;
        debug!(
            "selected {:?} ({} bytes) for {} items at fpr {}",
            params,
            params.byte_len(),
            items,
            fpr
        );
        Ok(params)
    }

    pub const fn way(&self) -> Way {
        self.way
    }

    pub const fn page_level(&self) -> u32 {
        self.page_level
    }

    pub const fn page_num(&self) -> u32 {
        self.page_num
    }

    pub const fn page_size(&self) -> usize {
        1usize << self.page_level
    }

    pub const fn byte_len(&self) -> usize {
        (self.page_num as usize) << self.page_level
    }
}


fn clamp_fpr(fpr: f64) -> f64 {
    // NaN fails the first comparison and lands on the floor
    if !(fpr >= Params::MIN_FPR) {
        warn_once!(FPR_CLAMPED_LOW;
            "false positive rate {} below {}, clamped",
            fpr,
            Params::MIN_FPR
        );
        Params::MIN_FPR
    } else if fpr > Params::MAX_FPR {
        warn_once!(FPR_CLAMPED_HIGH;
            "false positive rate {} above {}, clamped",
            fpr,
            Params::MAX_FPR
        );
        Params::MAX_FPR
    } else {
        fpr
    }
}


#[test]
fn test_target_selection() {
    let params = Params::with_target(500, 0.01).unwrap();
    assert_eq!(params.way(), Way::W7);
    assert_eq!(params.page_level(), 8);
    assert_eq!(params.page_num(), 3);
    assert_eq!(params.byte_len(), 768);

    let params = Params::with_target(1, 0.1).unwrap();
    assert_eq!(params.way(), Way::W4);
    assert!(params.page_level() >= 6);
    assert!(params.page_num() >= 1);

    // a single item never produces an empty buffer
    let params = Params::with_target(0, 0.02).unwrap();
    assert!(params.byte_len() > 0);
}

#[test]
fn test_fpr_clamping() {
    let wild = Params::with_target(1000, 1e-9).unwrap();
    let floor = Params::with_target(1000, Params::MIN_FPR).unwrap();
    assert_eq!(wild, floor);
    assert_eq!(floor.way(), Way::W8);

    let loose = Params::with_target(1000, 0.9).unwrap();
    let cap = Params::with_target(1000, Params::MAX_FPR).unwrap();
    assert_eq!(loose, cap);
    assert_eq!(cap.way(), Way::W4);
}

#[test]
fn test_way_bounds() {
    assert!(Way::try_from(3u32).is_err());
    assert!(Way::try_from(9u32).is_err());
    assert_eq!(Way::try_from(8u32).unwrap(), Way::W8);

    assert_eq!("7".parse::<Way>().unwrap(), Way::W7);
    assert_eq!(" 5 ".parse::<Way>().unwrap(), Way::W5);
    assert!("nine".parse::<Way>().is_err());

    assert_eq!(Way::W4.min_page_level(), 6);
    assert_eq!(Way::W5.min_page_level(), 7);
    assert_eq!(Way::W8.min_page_level(), 7);
}

#[test]
fn test_layout_validation() {
    assert!(Params::new(Way::W4, 6, 1).is_ok());
    assert!(Params::new(Way::W5, 6, 1).is_err());
    assert!(Params::new(Way::W8, 14, 1).is_err());
    assert!(Params::new(Way::W8, 13, 0).is_err());
}

#[test]
fn test_params_serde_round_trip() {
    let params = Params::with_target(5000, 0.004).unwrap();
    let encoded = serde_json::to_string(&params).unwrap();
    let decoded: Params = serde_json::from_str(&encoded).unwrap();
    assert_eq!(params, decoded);
}
