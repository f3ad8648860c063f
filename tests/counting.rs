//! End-to-end counts through the public library API.

use ranked_stv::{
    count, encode, encode_result, Ballot, Completion, CountOptions, NullSink, StvError,
    Tabulator, UNRANKED,
};

fn droop_ballots() -> Vec<Vec<u32>> {
    vec![
        vec![0, 1, 2],
        vec![0, 1, 2],
        vec![1, 0, 2],
        vec![2, 0, 1],
        vec![2, 0, 1],
    ]
}

#[test]
fn droop_example_elects_first_candidate() {
    let outcome = count(1, 3, &droop_ballots(), &[0, 1, 2]).unwrap();
    assert_eq!(outcome.quota, 3);
    assert_eq!(outcome.winners, vec![0]);
    assert_eq!(outcome.completion, Completion::SeatsFilled);
}

#[test]
fn every_candidate_wins_when_seats_match() {
    let ballots: Vec<Vec<u32>> = vec![vec![1, 0], vec![1, 0], vec![0, 1]];
    let outcome = count(2, 2, &ballots, &[0, 1]).unwrap();
    assert_eq!(outcome.winners, vec![1, 0]);
    assert_eq!(outcome.completion, Completion::SeatsFilled);
}

#[test]
fn identical_inputs_give_identical_buffers() {
    let ballots = droop_ballots();
    let first = encode_result(&count(2, 3, &ballots, &[2, 0, 1])).unwrap();
    let second = encode_result(&count(2, 3, &ballots, &[2, 0, 1])).unwrap();
    assert_eq!(first, second);
    assert_eq!(first[0], 0);
    assert_eq!(first[1], 2);
}

#[test]
fn short_ballot_row_is_rejected() {
    let ballots: Vec<Vec<u32>> = vec![vec![0, 1, 2], vec![0, 1]];
    let err = count(1, 3, &ballots, &[0, 1, 2]).unwrap_err();
    assert!(matches!(err, StvError::InvalidInput(_)));
    assert_eq!(err.status_code(), 1);

    let buffer = encode_result(&Err(err)).unwrap();
    assert_eq!(buffer, vec![1, 0]);
}

#[test]
fn partial_ballots_pad_with_sentinel() {
    // Three seats, quota floor(7 / 4) + 1 = 2.
    let ballots = vec![
        Ballot::partial(&[0], 4),
        Ballot::partial(&[0], 4),
        Ballot::partial(&[0, 3], 4),
        Ballot::partial(&[1], 4),
        Ballot::partial(&[1, 2], 4),
        Ballot::partial(&[2], 4),
        Ballot::partial(&[], 4),
    ];
    assert_eq!(ballots[6].ranking(), &[UNRANKED; 4]);

    let outcome = count(3, 4, &ballots, &[0, 1, 2, 3]).unwrap();
    assert_eq!(outcome.quota, 2);
    assert_eq!(outcome.winners.len(), 3);
    assert_eq!(&outcome.winners[..2], &[0, 1]);

    // The blank ballot is exhausted before the first round.
    assert!(outcome.rounds[0].exhausted >= 1.0);
}

#[test]
fn out_of_range_entries_mean_unranked() {
    let ballots: Vec<Vec<u32>> = vec![vec![1, 7, 9], vec![1, 3, 3], vec![0, 2, 1]];
    let outcome = count(1, 3, &ballots, &[0, 1, 2]).unwrap();
    assert_eq!(outcome.winners, vec![1]);
}

#[test]
fn ranked_entry_after_gap_is_rejected() {
    let ballots: Vec<Vec<u32>> = vec![vec![0, UNRANKED, 1]];
    let err = count(1, 3, &ballots, &[0, 1, 2]).unwrap_err();
    assert!(matches!(err, StvError::InvalidInput(_)));
}

#[test]
fn tie_rank_must_be_a_permutation() {
    let err = count(1, 3, &droop_ballots(), &[0, 0, 1]).unwrap_err();
    assert!(matches!(err, StvError::InvalidInput(_)));

    let err = count(1, 3, &droop_ballots(), &[0, 1]).unwrap_err();
    assert!(matches!(err, StvError::InvalidInput(_)));
}

#[test]
fn packed_input_counts_the_same() {
    let ballots = droop_ballots();
    let packed = encode(&ballots, &[0, 1, 2]).unwrap();
    let view = packed.view();

    let direct = count(1, 3, &ballots, &[0, 1, 2]).unwrap();
    let from_buffer = count(1, 3, &view.ballots(), view.tie_rank()).unwrap();
    assert_eq!(direct, from_buffer);
}

#[test]
fn loose_tolerance_turns_near_ties_into_ties() {
    // After the first surplus, candidates 1 and 2 sit a third of a vote
    // apart at the bottom of the count.
    let mut ballots: Vec<Vec<u32>> = vec![vec![0, 1, 2, 3]; 2];
    ballots.extend(vec![vec![0, 2, 3, 1]; 4]);
    ballots.push(vec![1, 3, 2, 0]);
    ballots.extend(vec![vec![3, 1, 2, 0]; 3]);

    let strict = Tabulator::new(CountOptions::default(), &NullSink)
        .count(2, 4, &ballots, &[0, 1, 2, 3])
        .unwrap();
    let loose = Tabulator::new(CountOptions { tolerance: 0.5 }, &NullSink)
        .count(2, 4, &ballots, &[0, 1, 2, 3])
        .unwrap();

    assert_eq!(strict.winners, vec![0, 3]);
    assert_eq!(strict.rounds[1].eliminated, Some(2));
    assert!(!strict.rounds.iter().any(|r| r.tie_broken));

    assert_eq!(loose.rounds[1].eliminated, Some(2));
    assert!(loose.rounds[1].tie_broken);
}

/// Candidate `c` is the only preference on `(3c mod n) + 1` ballots, so every
/// tally is distinct but neighbours are one vote apart.
fn spread_ballots(n: u32) -> Vec<Vec<u32>> {
    let mut ballots = Vec::new();
    for c in 0..n {
        let mut ballot = vec![UNRANKED; n as usize];
        ballot[0] = c;
        ballots.extend(std::iter::repeat(ballot).take(((3 * c) % n + 1) as usize));
    }
    ballots
}

#[test]
fn wide_tolerance_counts_large_fields() {
    for &(n, tolerance) in &[(32u32, 1.0), (32, 1.5), (100, 2.5)] {
        let ballots = spread_ballots(n);
        let identity: Vec<u32> = (0..n).collect();
        let tabulator = Tabulator::new(CountOptions { tolerance }, &NullSink);

        for &seats in &[1, 5, n] {
            let outcome = tabulator.count(seats, n, &ballots, &identity).unwrap();
            assert_eq!(outcome.winners.len(), seats as usize);

            let mut distinct = outcome.winners.clone();
            distinct.sort_unstable();
            distinct.dedup();
            assert_eq!(distinct.len(), seats as usize);
        }
    }
}
