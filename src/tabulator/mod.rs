//! Single Transferable Vote counting.
//!
//! A run validates its input into an [`Election`], seeds every ballot with its
//! first preference, then repeats rounds of election, surplus transfer and
//! elimination until every seat is filled or no candidate is left standing.
//! Exact ties are settled by the tie-rank, never by chance.

mod state;
mod tie;

use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::{Result, StvError};
use crate::model::{CandidateId, Election};
use serde::{Deserialize, Serialize};
use state::RoundState;

/// Rounding drift allowed per ballot when checking that weight is conserved.
const CONSERVATION_EPSILON: f64 = 1e-6;

/// Tabulation options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountOptions {
    /// Tallies closer than this are treated as equal when checking the quota
    /// and when ordering candidates.
    pub tolerance: f64,
}

impl Default for CountOptions {
    fn default() -> Self {
        Self { tolerance: 1e-9 }
    }
}

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Completion {
    SeatsFilled,
    /// No candidate was left standing before every seat was filled.
    ///
    /// Not reached for input accepted by `Election::new`: it enforces
    /// `seats <= candidates`, and the count elects every remaining candidate
    /// once they fit the open seats.
    Exhausted,
}

/// State of the count at the end of one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub round: u32,
    pub tally: Vec<f64>,
    pub elected: Vec<CandidateId>,
    pub eliminated: Option<CandidateId>,
    pub exhausted: f64,
    /// The tie-rank decided an ordering in this round.
    pub tie_broken: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    /// Elected candidates in election order.
    pub winners: Vec<CandidateId>,
    pub quota: u32,
    pub completion: Completion,
    pub rounds: Vec<RoundSummary>,
}

/// Runs counts with a fixed set of options and a diagnostic sink.
///
/// Holds no per-run state; every call to `count` starts from scratch.
pub struct Tabulator<'s> {
    options: CountOptions,
    sink: &'s dyn DiagnosticSink,
}

impl Default for Tabulator<'static> {
    fn default() -> Self {
        Tabulator {
            options: CountOptions::default(),
            sink: &TracingSink,
        }
    }
}

impl<'s> Tabulator<'s> {
    pub fn new(options: CountOptions, sink: &'s dyn DiagnosticSink) -> Tabulator<'s> {
        Tabulator { options, sink }
    }

    pub fn options(&self) -> &CountOptions {
        &self.options
    }

    /// Validates the input and counts it.
    pub fn count<B: AsRef<[CandidateId]>>(
        &self,
        seats: u32,
        candidates: u32,
        ballots: &[B],
        tie_rank: &[CandidateId],
    ) -> Result<Outcome> {
        let election = Election::new(seats, candidates, ballots, tie_rank)?;
        self.count_election(&election)
    }

    pub fn count_election(&self, election: &Election) -> Result<Outcome> {
        let tolerance = self.options.tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(StvError::invalid(format!(
                "tolerance must be a finite non-negative number, got {}",
                tolerance
            )));
        }

        let seats = election.seats() as usize;
        let quota = election.quota();
        let quota_weight = f64::from(quota);
        let tie_rank = election.tie_rank();
        let slack = conservation_slack(election.votes());
        let max_rounds = election.candidates().saturating_mul(2).saturating_add(1);

        self.sink.emit(&format!(
            "counting {} ballots for {} seats among {} candidates, quota {}",
            election.votes(),
            seats,
            election.candidates(),
            quota
        ));

        let mut state = RoundState::new(election);
        state.check_conservation(slack)?;

        let mut rounds = Vec::new();
        let mut round = 0;

        loop {
            let standing = state.standing();
            if state.elected().len() >= seats || standing.is_empty() {
                break;
            }

            round += 1;
            if round > max_rounds {
                return Err(StvError::fault(format!(
                    "count did not finish within {} rounds",
                    max_rounds
                )));
            }

            let remaining = seats - state.elected().len();
            let mut elected = Vec::new();
            let mut eliminated = None;
            let tie_broken;

            if standing.len() <= remaining {
                // Everyone left fits in the remaining seats.
                let ranked = tie::election_order(&standing, state.tally(), tie_rank, tolerance);
                tie_broken = ranked.tie_broken;
                elected = ranked.order;
                for &c in &elected {
                    state.elect(c);
                }
            } else {
                let reached: Vec<CandidateId> = standing
                    .iter()
                    .copied()
                    .filter(|&c| state.tally()[c as usize] + tolerance >= quota_weight)
                    .collect();

                if reached.is_empty() {
                    let (loser, tie) =
                        tie::elimination_choice(&standing, state.tally(), tie_rank, tolerance)
                            .ok_or_else(|| StvError::fault("no candidate to eliminate"))?;
                    tie_broken = tie;
                    state.eliminate(loser);
                    eliminated = Some(loser);
                } else {
                    let ranked =
                        tie::election_order(&reached, state.tally(), tie_rank, tolerance);
                    tie_broken = ranked.tie_broken;
                    elected = ranked.order;
                    elected.truncate(remaining);
                    for &c in &elected {
                        state.elect(c);
                    }
                    if state.elected().len() < seats {
                        for &c in &elected {
                            state.transfer_surplus(c, quota_weight);
                        }
                    }
                }
            }

            state.check_conservation(slack)?;

            if tie_broken {
                self.sink
                    .emit(&format!("round {}: tie resolved by tie-rank", round));
            }
            self.sink.emit(&format!(
                "round {}: elected {:?}, eliminated {:?}, exhausted {}",
                round,
                elected,
                eliminated,
                state.exhausted()
            ));

            rounds.push(RoundSummary {
                round,
                tally: state.tally().to_vec(),
                elected,
                eliminated,
                exhausted: state.exhausted(),
                tie_broken,
            });
        }

        let winners = state.elected().to_vec();
        check_winners(&winners, election)?;

        debug_assert_eq!(winners.len(), seats, "validated election left seats open");
        let completion = if winners.len() == seats {
            Completion::SeatsFilled
        } else {
            Completion::Exhausted
        };

        Ok(Outcome {
            winners,
            quota,
            completion,
            rounds,
        })
    }
}

/// Counts with default options, logging diagnostics through `tracing`.
pub fn count<B: AsRef<[CandidateId]>>(
    seats: u32,
    candidates: u32,
    ballots: &[B],
    tie_rank: &[CandidateId],
) -> Result<Outcome> {
    Tabulator::default().count(seats, candidates, ballots, tie_rank)
}

/// Independent of [`CountOptions::tolerance`], which only widens ties.
fn conservation_slack(votes: u32) -> f64 {
    CONSERVATION_EPSILON * f64::from(votes)
}

fn check_winners(winners: &[CandidateId], election: &Election) -> Result<()> {
    if winners.len() > election.seats() as usize {
        return Err(StvError::fault(format!(
            "{} winners for {} seats",
            winners.len(),
            election.seats()
        )));
    }
    let mut seen = vec![false; election.candidates() as usize];
    for &w in winners {
        match seen.get_mut(w as usize) {
            Some(flag) if !*flag => *flag = true,
            _ => {
                return Err(StvError::fault(format!(
                    "winner {} is repeated or out of range",
                    w
                )))
            }
        }
    }
    Ok(())
}
