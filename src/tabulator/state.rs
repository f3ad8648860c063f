use crate::error::{Result, StvError};
use crate::model::{CandidateId, Election};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    Standing,
    Elected,
    Eliminated,
}

/// A share of one ballot's weight held by the candidate at `cursor` in that
/// ballot's ranking.
#[derive(Debug, Clone, Copy)]
struct Parcel {
    ballot: u32,
    cursor: u32,
    weight: f64,
}

/// Mutable per-run state: owned by exactly one count.
pub(crate) struct RoundState<'e> {
    election: &'e Election,
    status: Vec<Status>,
    tally: Vec<f64>,
    piles: Vec<Vec<Parcel>>,
    elected: Vec<CandidateId>,
    exhausted: f64,
}

impl<'e> RoundState<'e> {
    /// Every ballot starts as a full-weight parcel with its first preference.
    pub fn new(election: &'e Election) -> RoundState<'e> {
        let candidates = election.candidates() as usize;
        let mut state = RoundState {
            election,
            status: vec![Status::Standing; candidates],
            tally: vec![0.0; candidates],
            piles: vec![Vec::new(); candidates],
            elected: Vec::new(),
            exhausted: 0.0,
        };

        for (i, ballot) in election.ballots().iter().enumerate() {
            match ballot.first() {
                Some(&first) => state.give(
                    first,
                    Parcel {
                        ballot: i as u32,
                        cursor: 0,
                        weight: 1.0,
                    },
                ),
                None => state.exhausted += 1.0,
            }
        }

        state
    }

    pub fn tally(&self) -> &[f64] {
        &self.tally
    }

    pub fn elected(&self) -> &[CandidateId] {
        &self.elected
    }

    pub fn exhausted(&self) -> f64 {
        self.exhausted
    }

    pub fn standing(&self) -> Vec<CandidateId> {
        self.status
            .iter()
            .enumerate()
            .filter(|(_, &s)| s == Status::Standing)
            .map(|(c, _)| c as CandidateId)
            .collect()
    }

    pub fn elect(&mut self, candidate: CandidateId) {
        debug_assert_eq!(self.status[candidate as usize], Status::Standing);
        self.status[candidate as usize] = Status::Elected;
        self.elected.push(candidate);
    }

    /// Forwards the part of `candidate`'s tally above `quota` along its
    /// ballots. Each parcel passes on `surplus / tally` of its weight; the
    /// candidate keeps the rest and its parcels are dropped, since an elected
    /// candidate never transfers twice.
    pub fn transfer_surplus(&mut self, candidate: CandidateId, quota: f64) {
        let c = candidate as usize;
        let total = self.tally[c];
        let surplus = total - quota;
        if surplus <= 0.0 || total <= 0.0 {
            self.piles[c].clear();
            return;
        }

        let fraction = surplus / total;
        let pile = std::mem::take(&mut self.piles[c]);
        let mut moved = 0.0;
        for parcel in pile {
            let forwarded = parcel.weight * fraction;
            moved += forwarded;
            self.route(Parcel {
                weight: forwarded,
                ..parcel
            });
        }
        self.tally[c] = total - moved;
    }

    /// Removes `candidate` and moves all of its parcels at full weight.
    pub fn eliminate(&mut self, candidate: CandidateId) {
        let c = candidate as usize;
        self.status[c] = Status::Eliminated;
        let pile = std::mem::take(&mut self.piles[c]);
        for parcel in pile {
            self.route(parcel);
        }
        self.tally[c] = 0.0;
    }

    /// Weight held by Standing and Elected candidates plus exhausted weight
    /// must still equal the number of ballots.
    pub fn check_conservation(&self, slack: f64) -> Result<()> {
        let held: f64 = self
            .status
            .iter()
            .zip(&self.tally)
            .filter(|(&s, _)| s != Status::Eliminated)
            .map(|(_, &t)| t)
            .sum();
        let votes = f64::from(self.election.votes());
        let drift = (held + self.exhausted - votes).abs();

        if !drift.is_finite() || drift > slack {
            return Err(StvError::fault(format!(
                "vote weight not conserved: held {} + exhausted {} != {} votes",
                held, self.exhausted, votes
            )));
        }

        let eliminated_weight = self
            .status
            .iter()
            .zip(&self.tally)
            .any(|(&s, &t)| s == Status::Eliminated && t != 0.0);
        if eliminated_weight {
            return Err(StvError::fault("an eliminated candidate still holds weight"));
        }

        Ok(())
    }

    /// Hands a parcel to the next Standing preference after its cursor, or
    /// exhausts it.
    fn route(&mut self, parcel: Parcel) {
        let election = self.election;
        let ranking = &election.ballots()[parcel.ballot as usize];
        let next = ranking
            .iter()
            .enumerate()
            .skip(parcel.cursor as usize + 1)
            .find(|(_, &c)| self.status[c as usize] == Status::Standing)
            .map(|(pos, &c)| (pos, c));

        match next {
            Some((pos, candidate)) => self.give(
                candidate,
                Parcel {
                    cursor: pos as u32,
                    ..parcel
                },
            ),
            None => self.exhausted += parcel.weight,
        }
    }

    fn give(&mut self, candidate: CandidateId, parcel: Parcel) {
        self.tally[candidate as usize] += parcel.weight;
        self.piles[candidate as usize].push(parcel);
    }
}
