use crate::{
    hash,
    params::Params,
};


/// The bit engine behind every probe width: one zero-initialized buffer of
/// `page_num << page_level` bytes, probed through a single page per key.
///
/// `WAY` is threaded through `set`/`test` as a const generic so each of the
/// five probe widths gets its own unrolled loop over one shared storage
/// layout.
pub(crate) struct Engine {
    page_level: u32,
    page_num:   u32,
    unique_cnt: usize,
    data:       Box<[u8]>,
}


impl Engine {
    pub fn with_params(params: &Params) -> Self {
        Engine {
            page_level: params.page_level(),
            page_num:   params.page_num(),
            unique_cnt: 0,
            data:       vec![0u8; params.byte_len()].into_boxed_slice(),
        }
    }

    /// Replace the buffer contents wholesale. The caller guarantees `data`
    /// has exactly the constructed length.
    pub fn load(
        &mut self,
        data: &[u8],
        unique_cnt: usize,
    ) {
        self.data.copy_from_slice(data);
        self.unique_cnt = unique_cnt;
    }

    fn page_span(
        &self,
        page_code: u32,
    ) -> std::ops::Range<usize> {
        let start = ((page_code % self.page_num) as usize) << self.page_level;
        start..start + (1usize << self.page_level)
    }

    /// Bit positions within a page span `0..2^(page_level + 3)`.
    fn coord_mask(&self) -> u16 {
        ((1u32 << (self.page_level + 3)) - 1) as u16
    }

    pub fn set<const WAY: usize>(
        &mut self,
        key: &[u8],
    ) -> bool {
        let digest = hash::hash128(key);
        let coords = digest.coords();
        let mask = self.coord_mask();
        let span = self.page_span(digest.page_code());
        let page = &mut self.data[span];

        // each byte is read before its bit is set, so overlapping probes
        // still answer "was any bit previously zero"
        let mut hit = 1u8;
        for i in 0..WAY {
            let idx = coords[i] & mask;
            let byte = (idx >> 3) as usize;
            hit &= page[byte] >> (idx & 7);
            page[byte] |= 1u8 << (idx & 7);
        }

        if hit != 0 {
            return false;
        }
        self.unique_cnt += 1;
        true
    }

    pub fn test<const WAY: usize>(
        &self,
        key: &[u8],
    ) -> bool {
        let digest = hash::hash128(key);
        let coords = digest.coords();
        let mask = self.coord_mask();
        let span = self.page_span(digest.page_code());
        let page = &self.data[span];

        for i in 0..WAY {
            let idx = coords[i] & mask;
            if page[(idx >> 3) as usize] & (1u8 << (idx & 7)) == 0 {
                return false;
            }
        }
        true
    }

    pub fn clear(&mut self) {
        self.unique_cnt = 0;
        self.data.fill(0);
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub const fn unique(&self) -> usize {
        self.unique_cnt
    }
}
