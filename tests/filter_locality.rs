use std::collections::HashSet;

use palisade::{
    filter::PageBloomFilter,
    params::Way,
};

#[test]
fn one_insert_writes_one_page() {
    let mut filter = PageBloomFilter::new(Way::W8, 7, 5).expect("valid layout");
    let page_size = 1usize << filter.page_level();

    for i in 0..256u64 {
        let before = filter.data().to_vec();
        filter.set(&i.to_le_bytes());

        let pages: HashSet<usize> = filter
            .data()
            .iter()
            .zip(before.iter())
            .enumerate()
            .filter(|(_, (after, before))| after != before)
            .map(|(offset, _)| offset / page_size)
            .collect();
        assert!(
            pages.len() <= 1,
            "insert {} wrote to pages {:?}",
            i,
            pages
        );
    }
}

#[test]
fn buffer_length_is_page_num_pages() {
    let filter = PageBloomFilter::new(Way::W4, 9, 11).expect("valid layout");
    assert_eq!(filter.data().len(), 11 << 9);
    assert_eq!(filter.data().len() % 8, 0);
}

#[test]
fn cap_is_bits_over_way() {
    let filter = PageBloomFilter::new(Way::W4, 7, 2).expect("valid layout");
    assert_eq!(filter.cap(), 256 * 8 / 4);

    let filter = PageBloomFilter::new(Way::W8, 7, 3).expect("valid layout");
    assert_eq!(filter.cap(), 384 * 8 / 8);
}
