//! Fixed-seed 128-bit mixer in the SpookyHash family, specialized for the
//! short keys a membership filter sees.
//!
//! The four-lane ARX core and its seed constant come from Bob Jenkins'
//! SpookyHash (http://burtleburtle.net/bob/hash/spooky.html):
//!
//! ```text
//! a constant which:
//!  * is not zero
//!  * is odd
//!  * is a not-very-regular mix of 1's and 0's
//!  * does not need any other special mathematical properties
//! ```
//!
//! One pass over the key yields 128 bits, and from those the filter derives
//! both the page selector and all eight in-page probe coordinates without a
//! second hash. Distributional quality is the requirement here, not
//! collision resistance.

use crate::deps::derive_more;


const MAGIC: u64 = 0xdead_beef_dead_beef;


/// The 128-bit digest of one key.
///
/// The filter consumes it twice over: [`Digest::page_code`] selects the page
/// and [`Digest::coords`] names the candidate bits inside it. Both
/// derivations read the same four 32-bit halves of the digest, so the bits
/// feeding the page choice and the bits feeding the probes overlap by
/// construction. That is acceptable for a Bloom filter and is pinned by the
/// regression vectors below.
#[derive(Copy, Clone, PartialEq, Eq, Hash, derive_more::Display)]
#[display(fmt = "{:016x}{:016x}", hi, lo)]
pub struct Digest {
    lo: u64,
    hi: u64,
}


impl Digest {
    pub const fn new(
        lo: u64,
        hi: u64,
    ) -> Self {
        Digest { lo, hi }
    }

    pub const fn lo(&self) -> u64 {
        self.lo
    }

    pub const fn hi(&self) -> u64 {
        self.hi
    }

    const fn halves(&self) -> [u32; 4] {
        [
            self.lo as u32,
            (self.lo >> 32) as u32,
            self.hi as u32,
            (self.hi >> 32) as u32,
        ]
    }

    /// The 32-bit page selector, folded from all four digest halves.
    pub const fn page_code(&self) -> u32 {
        let w = self.halves();
        w[0].rotate_left(8) ^ w[1].rotate_left(6) ^ w[2].rotate_left(4) ^ w[3].rotate_left(2)
    }

    /// The eight 16-bit in-page probe coordinates, in little-endian half
    /// order across the digest.
    pub const fn coords(&self) -> [u16; 8] {
        let w = self.halves();
        [
            w[0] as u16,
            (w[0] >> 16) as u16,
            w[1] as u16,
            (w[1] >> 16) as u16,
            w[2] as u16,
            (w[2] >> 16) as u16,
            w[3] as u16,
            (w[3] >> 16) as u16,
        ]
    }
}


impl std::fmt::Debug for Digest {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter,
    ) -> std::fmt::Result {
        f.debug_struct("Digest")
            .field("lo", &format_args!("{:#018x}", self.lo))
            .field("hi", &format_args!("{:#018x}", self.hi))
            .finish()
    }
}


struct State {
    a: u64,
    b: u64,
    c: u64,
    d: u64,
}


/// One block-mix round: rotate a lane, fold the next lane in with an add,
/// then xor the result into a third.
macro_rules! mix_round {
    ($s:ident, $rot:ident, $k:literal, $add:ident, $xor:ident) => {
        $s.$rot = $s.$rot.rotate_left($k);
        $s.$rot = $s.$rot.wrapping_add($s.$add);
        $s.$xor ^= $s.$rot;
    };
}

/// One finalization round: xor a lane in, rotate it, add it back.
macro_rules! end_round {
    ($s:ident, $x:ident, $rot:ident, $k:literal) => {
        $s.$x ^= $s.$rot;
        $s.$rot = $s.$rot.rotate_left($k);
        $s.$x = $s.$x.wrapping_add($s.$rot);
    };
}


impl State {
    fn new() -> Self {
        State {
            a: 0,
            b: 0,
            c: MAGIC,
            d: MAGIC,
        }
    }

    fn mix(&mut self) {
        mix_round!(self, c, 50, d, a);
        mix_round!(self, d, 52, a, b);
        mix_round!(self, a, 30, b, c);
        mix_round!(self, b, 41, c, d);
        mix_round!(self, c, 54, d, a);
        mix_round!(self, d, 48, a, b);
        mix_round!(self, a, 38, b, c);
        mix_round!(self, b, 37, c, d);
        mix_round!(self, c, 62, d, a);
        mix_round!(self, d, 34, a, b);
        mix_round!(self, a, 5, b, c);
        mix_round!(self, b, 36, c, d);
    }

    fn end(&mut self) {
        end_round!(self, d, c, 15);
        end_round!(self, a, d, 52);
        end_round!(self, b, a, 26);
        end_round!(self, c, b, 51);
        end_round!(self, d, c, 28);
        end_round!(self, a, d, 9);
        end_round!(self, b, a, 47);
        end_round!(self, c, b, 54);
        end_round!(self, d, c, 32);
        end_round!(self, a, d, 25);
        end_round!(self, b, a, 63);
    }
}


#[inline]
fn load_u64(bytes: &[u8]) -> u64 {
    let mut buffer = 0u64.to_le_bytes();
    buffer.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buffer)
}


/// Hash a key to its 128-bit digest.
///
/// Keys are byte sequences and word loads are little-endian, so the digest
/// is identical across platforms.
pub fn hash128(key: &[u8]) -> Digest {
    let mut state = State::new();
    let length = key.len() as u64;

    let mut blocks = key.chunks_exact(32);
    for block in &mut blocks {
        state.c = state.c.wrapping_add(load_u64(&block[0..8]));
        state.d = state.d.wrapping_add(load_u64(&block[8..16]));
        state.mix();
        state.a = state.a.wrapping_add(load_u64(&block[16..24]));
        state.b = state.b.wrapping_add(load_u64(&block[24..32]));
    }

    let mut rest = blocks.remainder();
    if rest.len() >= 16 {
        state.c = state.c.wrapping_add(load_u64(&rest[0..8]));
        state.d = state.d.wrapping_add(load_u64(&rest[8..16]));
        state.mix();
        rest = &rest[16..];
    }

    // the length stamp keeps "aa" and "aa\0" apart despite the zero padding
    state.d = state.d.wrapping_add(length << 56);
    if rest.is_empty() {
        state.c = state.c.wrapping_add(MAGIC);
        state.d = state.d.wrapping_add(MAGIC);
    } else {
        let mut tail = [0u8; 16];
        tail[..rest.len()].copy_from_slice(rest);
        state.c = state.c.wrapping_add(load_u64(&tail[0..8]));
        state.d = state.d.wrapping_add(load_u64(&tail[8..16]));
    }

    state.end();
    Digest::new(state.a, state.b)
}


#[test]
fn test_frozen_digests() {
    let vectors: &[(&[u8], u64, u64)] = &[
        (b"", 0x232706fc6bf50919, 0x8b72ee65b4e851c7),
        (b"abc", 0x8aab15f77537c967, 0xc61367f8ca7811b0),
        (b"hello world", 0xce4e98819bff125d, 0x8be188ee0d3f1025),
    ];
    for &(key, lo, hi) in vectors {
        let digest = hash128(key);
        assert_eq!(digest, Digest::new(lo, hi), "key {:?}", key);
    }
}

#[test]
fn test_frozen_digests_by_length() {
    // one vector per tail-schedule class: every remainder length 0..=15,
    // both sides of the 16-byte half-block, both sides of a 32-byte block
    let vectors: &[(usize, u64, u64)] = &[
        (1, 0x8ae2f41804291280, 0x1f315d714e2d1d29),
        (2, 0xe4f27a60a543df4a, 0x9aa7a50e1fffd9d2),
        (3, 0x0bb75587709b4eba, 0x5e4dd36fcaabba1a),
        (4, 0xccbe79614651590a, 0xc22a479081b5ce18),
        (5, 0xf723d36938f6a093, 0x681584e95224a368),
        (6, 0x8417fa88a31f5b7e, 0x93e2b86847f90c96),
        (7, 0xdf46961a1163469d, 0x52a663b93d351d39),
        (8, 0x7c816246374a845c, 0x2c13bcccc8349657),
        (9, 0x73cf4d8c702119f2, 0xf52d2149547578a5),
        (10, 0x3f99c60d0043b609, 0x19717eddc3b2431c),
        (11, 0x517e40ccbc4b0648, 0x60a9852eb2f57a1e),
        (12, 0x76585dc839cdca5a, 0xa74a2cca2d7ea43f),
        (13, 0xdd2557563725efda, 0x596aba57a777c300),
        (14, 0x82f96785be427119, 0x758f717b242c09d4),
        (15, 0xd9aa86de65dc278b, 0xda240564552a4a10),
        (16, 0x340225d6331f2651, 0x886e7c23939a583d),
        (17, 0x9eff109b3512e3b9, 0xe52259d521c8dca4),
        (31, 0xa3962a6c761ffe09, 0x678fc7da4ac3197a),
        (32, 0x57f50b68e2623fd2, 0x893924eff994198b),
        (33, 0x3e958dcbef6dd224, 0x6482a6da6de7dc07),
        (48, 0x99813df6e1aff986, 0x318eb6f6552a98c2),
        (64, 0x0d1eb0dbc200ee89, 0xb3b14b59feeba967),
    ];
    for &(n, lo, hi) in vectors {
        let key: Vec<u8> = (0..n).map(|i| i as u8).collect();
        let digest = hash128(&key);
        assert_eq!(digest, Digest::new(lo, hi), "length {}", n);
    }
}

#[test]
fn test_page_code_fold() {
    assert_eq!(hash128(b"").page_code(), 0x5f86038e);
    assert_eq!(hash128(b"abc").page_code(), 0x22c09e78);
}

#[test]
fn test_coordinate_order() {
    let digest = Digest::new(0x2327_06fc_6bf5_0919, 0x8b72_ee65_b4e8_51c7);
    assert_eq!(
        digest.coords(),
        [0x0919, 0x6bf5, 0x06fc, 0x2327, 0x51c7, 0xb4e8, 0xee65, 0x8b72]
    );
    assert_eq!(format!("{}", digest), "8b72ee65b4e851c7232706fc6bf50919");
}
