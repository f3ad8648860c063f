use crate::error::{Result, StvError};
use serde::{Deserialize, Serialize};

/// Zero-based candidate index in `[0, candidates)`.
pub type CandidateId = u32;

/// Canonical marker for an unranked ballot position. Any value
/// `>= candidates` is read the same way.
pub const UNRANKED: CandidateId = u32::MAX;

/// One voter's preference ranking, padded to the candidate count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ballot {
    ranking: Vec<CandidateId>,
}

impl Ballot {
    pub fn new(ranking: Vec<CandidateId>) -> Ballot {
        Ballot { ranking }
    }

    /// Builds a ballot ranking `prefs` in order, padding with [`UNRANKED`]
    /// up to `candidates` positions.
    pub fn partial(prefs: &[CandidateId], candidates: usize) -> Ballot {
        let mut ranking = prefs.to_vec();
        if ranking.len() < candidates {
            ranking.resize(candidates, UNRANKED);
        }
        Ballot { ranking }
    }

    pub fn ranking(&self) -> &[CandidateId] {
        &self.ranking
    }

    pub fn len(&self) -> usize {
        self.ranking.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranking.is_empty()
    }
}

impl AsRef<[CandidateId]> for Ballot {
    fn as_ref(&self) -> &[CandidateId] {
        &self.ranking
    }
}

impl From<Vec<CandidateId>> for Ballot {
    fn from(ranking: Vec<CandidateId>) -> Self {
        Ballot::new(ranking)
    }
}

/// Total order over candidates used to resolve exact ties.
///
/// Built from a list of candidates from highest to lowest priority; stores
/// each candidate's position in that list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TieRank {
    order: Vec<CandidateId>,
    position: Vec<u32>,
}

impl TieRank {
    pub fn from_order(order: &[CandidateId], candidates: usize) -> Result<TieRank> {
        if order.len() != candidates {
            return Err(StvError::invalid(format!(
                "tie-rank has {} entries, expected {}",
                order.len(),
                candidates
            )));
        }

        let mut position = vec![u32::MAX; candidates];
        for (pos, &candidate) in order.iter().enumerate() {
            let slot = position.get_mut(candidate as usize).ok_or_else(|| {
                StvError::invalid(format!(
                    "tie-rank entry {} is not a candidate (candidates = {})",
                    candidate, candidates
                ))
            })?;
            if *slot != u32::MAX {
                return Err(StvError::invalid(format!(
                    "tie-rank lists candidate {} twice",
                    candidate
                )));
            }
            *slot = pos as u32;
        }

        Ok(TieRank {
            order: order.to_vec(),
            position,
        })
    }

    /// Candidate 0 first, then 1, and so on.
    pub fn identity(candidates: usize) -> TieRank {
        let order: Vec<CandidateId> = (0..candidates as u32).collect();
        TieRank {
            position: order.clone(),
            order,
        }
    }

    /// Position of `candidate` in the order; smaller means higher priority.
    pub fn position(&self, candidate: CandidateId) -> u32 {
        self.position[candidate as usize]
    }

    pub fn order(&self) -> &[CandidateId] {
        &self.order
    }
}

/// A validated election: every ballot reduced to its ranked prefix.
#[derive(Debug, Clone)]
pub struct Election {
    seats: u32,
    candidates: u32,
    ballots: Vec<Vec<CandidateId>>,
    tie_rank: TieRank,
}

impl Election {
    /// Checks every precondition of a count. Nothing is counted here; an
    /// error means the run must not start.
    pub fn new<B: AsRef<[CandidateId]>>(
        seats: u32,
        candidates: u32,
        ballots: &[B],
        tie_rank: &[CandidateId],
    ) -> Result<Election> {
        if candidates == 0 {
            return Err(StvError::invalid("an election needs at least one candidate"));
        }
        if seats == 0 {
            return Err(StvError::invalid("an election needs at least one seat"));
        }
        if seats > candidates {
            return Err(StvError::invalid(format!(
                "{} seats cannot be filled from {} candidates",
                seats, candidates
            )));
        }
        if ballots.is_empty() {
            return Err(StvError::invalid("an election needs at least one ballot"));
        }
        check_ballot_count(ballots.len())?;

        let tie_rank = TieRank::from_order(tie_rank, candidates as usize)?;

        let mut seen = vec![false; candidates as usize];
        let ranked = ballots
            .iter()
            .enumerate()
            .map(|(i, ballot)| ranked_prefix(i, ballot.as_ref(), &mut seen))
            .collect::<Result<Vec<_>>>()?;

        Ok(Election {
            seats,
            candidates,
            ballots: ranked,
            tie_rank,
        })
    }

    pub fn seats(&self) -> u32 {
        self.seats
    }

    pub fn candidates(&self) -> u32 {
        self.candidates
    }

    pub fn votes(&self) -> u32 {
        self.ballots.len() as u32
    }

    /// Ranked prefixes, one per ballot.
    pub fn ballots(&self) -> &[Vec<CandidateId>] {
        &self.ballots
    }

    pub fn tie_rank(&self) -> &TieRank {
        &self.tie_rank
    }

    /// Droop quota: `floor(votes / (seats + 1)) + 1`.
    pub fn quota(&self) -> u32 {
        droop_quota(self.votes(), self.seats)
    }

    /// Number of ballots naming each candidate first.
    pub fn first_preferences(&self) -> Vec<u32> {
        let mut counts = vec![0u32; self.candidates as usize];
        for ballot in &self.ballots {
            if let Some(&first) = ballot.first() {
                counts[first as usize] += 1;
            }
        }
        counts
    }
}

/// Largest ballot count a count accepts. The tie-rank row after the ballots
/// must still have a `u32` row index.
pub const MAX_BALLOTS: usize = u32::MAX as usize - 1;

pub(crate) fn check_ballot_count(ballots: usize) -> Result<u32> {
    if ballots > MAX_BALLOTS {
        return Err(StvError::invalid(format!(
            "{} ballots exceed the limit of {}",
            ballots, MAX_BALLOTS
        )));
    }
    Ok(ballots as u32)
}

pub fn droop_quota(votes: u32, seats: u32) -> u32 {
    (u64::from(votes) / (u64::from(seats) + 1)) as u32 + 1
}

/// Returns the ranked part of a ballot. `seen` is scratch space of
/// `candidates` flags and is left cleared on success.
fn ranked_prefix(
    index: usize,
    ballot: &[CandidateId],
    seen: &mut [bool],
) -> Result<Vec<CandidateId>> {
    let candidates = seen.len();
    if ballot.len() != candidates {
        return Err(StvError::invalid(format!(
            "ballot {} has {} entries, expected {}",
            index,
            ballot.len(),
            candidates
        )));
    }

    let ranked_len = ballot
        .iter()
        .position(|&c| c as usize >= candidates)
        .unwrap_or(candidates);

    if let Some(offset) = ballot[ranked_len..]
        .iter()
        .position(|&c| (c as usize) < candidates)
    {
        return Err(StvError::invalid(format!(
            "ballot {} ranks candidate {} after an unranked position",
            index,
            ballot[ranked_len + offset]
        )));
    }

    let prefix = &ballot[..ranked_len];
    let mut duplicate = None;
    for &c in prefix {
        if seen[c as usize] {
            duplicate = Some(c);
            break;
        }
        seen[c as usize] = true;
    }
    for &c in prefix {
        seen[c as usize] = false;
    }

    match duplicate {
        Some(c) => Err(StvError::invalid(format!(
            "ballot {} ranks candidate {} more than once",
            index, c
        ))),
        None => Ok(prefix.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn droop_quota_matches_formula() {
        assert_eq!(droop_quota(5, 1), 3);
        assert_eq!(droop_quota(100, 3), 26);
        assert_eq!(droop_quota(1, 1), 1);
        assert_eq!(droop_quota(u32::MAX, 1), u32::MAX / 2 + 1);
    }

    #[test]
    fn ballot_count_leaves_room_for_tie_rank_row() {
        assert_eq!(check_ballot_count(MAX_BALLOTS).unwrap(), u32::MAX - 1);
        assert!(matches!(
            check_ballot_count(u32::MAX as usize),
            Err(StvError::InvalidInput(_))
        ));
    }

    #[test]
    fn partial_ballots_keep_ranked_prefix() {
        let ballots = vec![Ballot::partial(&[2], 3), Ballot::partial(&[], 3)];
        let election = Election::new(1, 3, &ballots, &[0, 1, 2]).unwrap();
        assert_eq!(election.ballots()[0], vec![2]);
        assert!(election.ballots()[1].is_empty());
        assert_eq!(election.first_preferences(), vec![0, 0, 1]);
    }

    #[test]
    fn any_out_of_range_value_is_unranked() {
        let ballots: Vec<Vec<u32>> = vec![vec![1, 7, 3]];
        let election = Election::new(1, 3, &ballots, &[0, 1, 2]).unwrap();
        assert_eq!(election.ballots()[0], vec![1]);
    }

    #[test]
    fn rejects_ranking_after_gap() {
        let ballots: Vec<Vec<u32>> = vec![vec![1, UNRANKED, 0]];
        let err = Election::new(1, 3, &ballots, &[0, 1, 2]).unwrap_err();
        assert!(matches!(err, StvError::InvalidInput(_)));
    }

    #[test]
    fn rejects_duplicate_candidate() {
        let ballots: Vec<Vec<u32>> = vec![vec![0, 1, 2], vec![1, 1, 2]];
        let err = Election::new(1, 3, &ballots, &[0, 1, 2]).unwrap_err();
        assert_eq!(
            err,
            StvError::invalid("ballot 1 ranks candidate 1 more than once")
        );
    }

    #[test]
    fn rejects_wrong_ballot_length() {
        let ballots: Vec<Vec<u32>> = vec![vec![0, 1, 2], vec![0, 1]];
        let err = Election::new(1, 3, &ballots, &[0, 1, 2]).unwrap_err();
        assert!(matches!(err, StvError::InvalidInput(_)));
    }

    #[test]
    fn rejects_bad_shapes() {
        let ballots: Vec<Vec<u32>> = vec![vec![0u32, 1]];
        assert!(Election::new(0, 2, &ballots, &[0, 1]).is_err());
        assert!(Election::new(3, 2, &ballots, &[0, 1]).is_err());
        assert!(Election::new(1, 0, &Vec::<Vec<u32>>::new(), &[]).is_err());
        assert!(Election::new(1, 2, &Vec::<Vec<u32>>::new(), &[0, 1]).is_err());
    }

    #[test]
    fn tie_rank_must_be_permutation() {
        assert!(TieRank::from_order(&[0, 1, 2], 3).is_ok());
        assert!(TieRank::from_order(&[0, 1], 3).is_err());
        assert!(TieRank::from_order(&[0, 0, 2], 3).is_err());
        assert!(TieRank::from_order(&[0, 1, 3], 3).is_err());
    }

    #[test]
    fn tie_rank_positions() {
        let rank = TieRank::from_order(&[2, 0, 1], 3).unwrap();
        assert_eq!(rank.position(2), 0);
        assert_eq!(rank.position(0), 1);
        assert_eq!(rank.position(1), 2);
        assert_eq!(TieRank::identity(3).position(1), 1);
    }
}
