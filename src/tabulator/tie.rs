use crate::model::{CandidateId, TieRank};
use itertools::Itertools;
use std::cmp::Ordering;

/// Compares two tallies, treating values within `tolerance` as equal.
pub(crate) fn compare_tally(a: f64, b: f64, tolerance: f64) -> Ordering {
    if (a - b).abs() <= tolerance {
        Ordering::Equal
    } else if a < b {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

/// A candidate order decided with help from the tie-rank.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Ranked {
    pub order: Vec<CandidateId>,
    /// Set when the tie-rank ordered a group of tallies within tolerance.
    pub tie_broken: bool,
}

/// Orders `candidates` for election: highest tally first. Candidates within
/// `tolerance` of the highest tally in their group are ordered by tie-rank
/// (earlier first).
pub(crate) fn election_order(
    candidates: &[CandidateId],
    tally: &[f64],
    tie_rank: &TieRank,
    tolerance: f64,
) -> Ranked {
    let by_tally: Vec<CandidateId> = candidates
        .iter()
        .copied()
        .sorted_by(|&a, &b| {
            tally[b as usize]
                .total_cmp(&tally[a as usize])
                .then_with(|| tie_rank.position(a).cmp(&tie_rank.position(b)))
        })
        .collect();

    let mut order = Vec::with_capacity(by_tally.len());
    let mut tie_broken = false;
    let mut rest = by_tally.as_slice();
    while let Some(&leader) = rest.first() {
        let top = tally[leader as usize];
        let len = rest
            .iter()
            .take_while(|&&c| compare_tally(top, tally[c as usize], tolerance) == Ordering::Equal)
            .count()
            .max(1);
        let (group, tail) = rest.split_at(len);
        tie_broken |= len > 1;
        order.extend(
            group
                .iter()
                .copied()
                .sorted_by_key(|&c| tie_rank.position(c)),
        );
        rest = tail;
    }

    Ranked { order, tie_broken }
}

/// Picks the candidate to eliminate. Among the candidates within `tolerance`
/// of the lowest tally, the one latest in the tie-rank goes. Returns `None`
/// for an empty slice.
pub(crate) fn elimination_choice(
    candidates: &[CandidateId],
    tally: &[f64],
    tie_rank: &TieRank,
    tolerance: f64,
) -> Option<(CandidateId, bool)> {
    let floor = candidates
        .iter()
        .map(|&c| tally[c as usize])
        .min_by(|a, b| a.total_cmp(b))?;

    let lowest: Vec<CandidateId> = candidates
        .iter()
        .copied()
        .filter(|&c| tally[c as usize] - floor <= tolerance)
        .collect();
    let loser = lowest
        .iter()
        .copied()
        .max_by_key(|&c| tie_rank.position(c))?;

    Some((loser, lowest.len() > 1))
}
