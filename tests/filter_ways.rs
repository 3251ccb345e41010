use std::convert::TryFrom;

use palisade::{
    filter::PageBloomFilter,
    params::Way,
};

fn new_filter(way: u32) -> PageBloomFilter {
    let way = Way::try_from(way).expect("way in range");
    PageBloomFilter::new(way, 7, 3).expect("valid layout")
}

fn le_key(i: u64) -> [u8; 8] {
    i.to_le_bytes()
}

fn fill_and_query(way: u32) {
    let mut filter = new_filter(way);

    for i in 0..200u64 {
        assert!(filter.set(&le_key(i)), "key {} should be fresh", i);
    }
    assert_eq!(filter.unique(), 200);

    for i in 0..200u64 {
        assert!(filter.test(&le_key(i)), "key {} must stay present", i);
    }
    for i in 200..400u64 {
        assert!(!filter.test(&le_key(i)), "key {} was never inserted", i);
    }
}

#[test]
fn fill_and_query_w4() {
    fill_and_query(4);
}

#[test]
fn fill_and_query_w5() {
    fill_and_query(5);
}

#[test]
fn fill_and_query_w6() {
    fill_and_query(6);
}

#[test]
fn fill_and_query_w7() {
    fill_and_query(7);
}

#[test]
fn fill_and_query_w8() {
    fill_and_query(8);
}

#[test]
fn second_insert_is_not_fresh() {
    for way in 4..=8 {
        let mut filter = new_filter(way);
        for i in 0..200u64 {
            assert!(filter.set(&le_key(i)));
        }
        let unique = filter.unique();

        for i in 0..200u64 {
            assert!(!filter.set(&le_key(i)), "key {} was already present", i);
        }
        assert_eq!(filter.unique(), unique, "reinsertion must not advance unique");
    }
}

#[test]
fn clear_empties_the_filter() {
    let mut filter = new_filter(6);
    for i in 0..200u64 {
        filter.set(&le_key(i));
    }

    filter.clear();

    assert_eq!(filter.unique(), 0);
    assert!(filter.data().iter().all(|&byte| byte == 0));
    for i in 0..200u64 {
        assert!(!filter.test(&le_key(i)), "key {} must be gone after clear", i);
    }
}

#[test]
fn inserted_keys_survive_later_inserts() {
    let mut filter = new_filter(7);
    for i in 0..100u64 {
        filter.set(&le_key(i));
    }
    // bits are only ever set, never unset, so later traffic cannot evict
    for i in 100..300u64 {
        filter.set(&le_key(i));
        for j in 0..100u64 {
            if !filter.test(&le_key(j)) {
                panic!("key {} lost after inserting {}", j, i);
            }
        }
    }
}

#[test]
fn degenerate_keys_are_ordinary() {
    let mut filter = new_filter(5);
    assert!(filter.set(b""));
    assert!(filter.test(b""));
    assert!(!filter.set(b""));

    assert!(filter.set(b"\x00"));
    assert!(filter.test(b"\x00"));

    let long = vec![0xabu8; 1024];
    assert!(filter.set(&long));
    assert!(filter.test(&long));
    assert_eq!(filter.unique(), 3);
}
