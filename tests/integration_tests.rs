use samplesort::prelude::*;
use rand::Rng;

#[test]
fn test_basic_sort_stable() {
    let input = vec![5, 2, 5, 1, 3];
    let sorted = sort_by(&input, |a, b| a < b, true);

    assert_eq!(sorted, vec![1, 2, 3, 5, 5]);
    // Input untouched.
    assert_eq!(input, vec![5, 2, 5, 1, 3]);
}

#[test]
fn test_basic_sort_inplace() {
    let mut data = vec![3, 1, 4, 1, 5, 9, 2, 6, 5, 3, 5];
    sort_inplace(&mut data);
    assert_eq!(data, vec![1, 1, 2, 3, 3, 4, 5, 5, 5, 6, 9]);
}

#[test]
fn test_boundary_sizes() {
    // Straddle the base-sort threshold (16384) from both sides, plus the
    // degenerate sizes.
    for n in [0usize, 1, 2, 16383, 16384, 16385] {
        let input: Vec<u64> = (0..n as u64).map(|i| i.wrapping_mul(0x9e3779b97f4a7c15)).collect();

        let mut expected = input.clone();
        expected.sort_unstable();

        let sorted = sort(&input);
        assert_eq!(sorted, expected, "copying variant failed at n = {}", n);

        let mut data = input.clone();
        sort_inplace(&mut data);
        assert_eq!(data, expected, "in-place variant failed at n = {}", n);
    }
}

#[test]
fn test_threshold_paths_agree() {
    // 16383 runs the pure base sort, 16384 the full sample sort; both must
    // agree with the reference on the same data.
    let mut rng = rand::rng();
    let input: Vec<u32> = (0..16384).map(|_| rng.random()).collect();

    let small = sort(&input[..16383]);
    let large = sort(&input);

    let mut expected = input.clone();
    expected.sort_unstable();
    assert_eq!(large, expected);

    let mut expected_small = input[..16383].to_vec();
    expected_small.sort_unstable();
    assert_eq!(small, expected_small);
}

#[test]
fn test_sorted_and_reverse_inputs() {
    let n = 100_000u64;
    let sorted_input: Vec<u64> = (0..n).collect();
    let reverse_input: Vec<u64> = (0..n).rev().collect();

    assert_eq!(sort(&sorted_input), sorted_input);
    assert_eq!(sort(&reverse_input), sorted_input);

    let mut data = reverse_input.clone();
    sort_inplace(&mut data);
    assert_eq!(data, sorted_input);
}

#[test]
fn test_all_equal_input() {
    let n = 100_000;
    let input = vec![42u64; n];

    assert_eq!(sort(&input), input);
    assert_eq!(sort_by(&input, |a, b| a < b, true), input);

    let mut data = input.clone();
    sort_inplace(&mut data);
    assert_eq!(data, input);
}

#[test]
fn test_idempotent() {
    let mut rng = rand::rng();
    let input: Vec<u32> = (0..50_000).map(|_| rng.random_range(0..1000)).collect();

    let once = sort(&input);
    let twice = sort(&once);
    assert_eq!(once, twice);
}

#[test]
fn test_stability() {
    // Pairs (key, arrival); the comparator only sees the key, so the stable
    // sort must keep arrivals increasing within each key.
    let mut rng = rand::rng();
    let n = 60_000u32;
    let input: Vec<(u32, u32)> = (0..n).map(|i| (rng.random_range(0..100), i)).collect();

    let sorted = sort_by(&input, |a, b| a.0 < b.0, true);

    for w in sorted.windows(2) {
        assert!(w[0].0 <= w[1].0);
        if w[0].0 == w[1].0 {
            assert!(
                w[0].1 < w[1].1,
                "stability violated: {:?} before {:?}",
                w[0],
                w[1]
            );
        }
    }
}

#[test]
fn test_large_elements() {
    // 32-byte elements take the large-type parameter set and the quicksort
    // base path.
    let mut rng = rand::rng();
    let input: Vec<[u64; 4]> = (0..40_000)
        .map(|_| {
            let k: u64 = rng.random();
            [k, k ^ 1, k ^ 2, k ^ 3]
        })
        .collect();

    let mut expected = input.clone();
    expected.sort_unstable();

    assert_eq!(sort(&input), expected);

    let mut data = input.clone();
    sort_inplace(&mut data);
    assert_eq!(data, expected);
}

#[test]
fn test_custom_comparator_descending() {
    let mut rng = rand::rng();
    let mut data: Vec<i32> = (0..30_000).map(|_| rng.random()).collect();

    let mut expected = data.clone();
    expected.sort_unstable_by(|a, b| b.cmp(a));

    sort_inplace_by(&mut data, |a, b| a > b);
    assert_eq!(data, expected);
}

#[test]
fn test_fuzz_random() {
    let mut rng = rand::rng();

    for _ in 0..20 {
        let len = rng.random_range(0..5_000);
        let input: Vec<u16> = (0..len).map(|_| rng.random()).collect();

        let mut expected = input.clone();
        expected.sort_unstable();

        assert_eq!(sort(&input), expected);

        let mut data = input.clone();
        sort_inplace(&mut data);
        assert_eq!(data, expected);
    }
}

#[test]
fn test_fuzz_random_large() {
    let mut rng = rand::rng();

    for _ in 0..5 {
        let len = rng.random_range(16_000..120_000);
        // A narrow key range forces heavy duplication and equal pivots.
        let input: Vec<u32> = (0..len).map(|_| rng.random_range(0..500)).collect();

        let mut expected = input.clone();
        expected.sort_unstable();

        assert_eq!(sort(&input), expected);

        let mut data = input.clone();
        sort_inplace(&mut data);
        assert_eq!(data, expected);
    }
}

#[test]
fn test_strings_inplace() {
    let mut rng = rand::rng();
    let mut data: Vec<String> = (0..20_000)
        .map(|_| {
            let len = rng.random_range(1..12);
            (0..len).map(|_| rng.random_range('a'..='z')).collect()
        })
        .collect();

    let mut expected = data.clone();
    expected.sort_unstable();

    sort_inplace(&mut data);
    assert_eq!(data, expected);
}
