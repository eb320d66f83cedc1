use super::*;

fn job(name: &str, frame_count: u64) -> AnimationJob {
    AnimationJob {
        name: name.to_string(),
        frame_count,
        dominant_bone: "Hips".to_string(),
    }
}

#[test]
fn remainder_goes_to_leading_pieces() {
    let items: Vec<u32> = (0..10).collect();
    let pieces = split_even(&items, 4);
    assert_eq!(
        pieces,
        vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7], vec![8, 9]]
    );
}

#[test]
fn pieces_are_balanced_and_cover_input_in_order() {
    for len in 0..40usize {
        let items: Vec<usize> = (0..len).collect();
        for n in 1..12usize {
            let pieces = split_even(&items, n);
            assert_eq!(pieces.len(), n);

            let sizes: Vec<usize> = pieces.iter().map(Vec::len).collect();
            let max = *sizes.iter().max().unwrap();
            let min = *sizes.iter().min().unwrap();
            assert!(max - min <= 1, "len={len} n={n} sizes={sizes:?}");

            let flat: Vec<usize> = pieces.into_iter().flatten().collect();
            assert_eq!(flat, items, "len={len} n={n}");
        }
    }
}

#[test]
fn more_workers_than_items_leaves_trailing_empties() {
    let pieces = split_even(&["a", "b"], 5);
    assert_eq!(pieces[0], vec!["a"]);
    assert_eq!(pieces[1], vec!["b"]);
    assert!(pieces[2..].iter().all(Vec::is_empty));
}

#[test]
fn zero_workers_behaves_like_one() {
    let pieces = split_even(&[1, 2, 3], 0);
    assert_eq!(pieces, vec![vec![1, 2, 3]]);
}

#[test]
fn walk_and_run_land_on_separate_workers() {
    let long = vec![job("Walk", 45), job("Run", 120)];
    let parts = partition_jobs(&long, 2);
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0], vec![job("Walk", 45)]);
    assert_eq!(parts[1], vec![job("Run", 120)]);
}

#[test]
fn default_worker_count_is_positive() {
    assert!(default_worker_count() >= 1);
}
