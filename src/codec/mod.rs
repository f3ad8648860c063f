//! Packed `u32` buffers exchanged with the engine.
//!
//! An input buffer is `votes` ballot rows of `candidates` words followed by
//! one tie-rank row, all contiguous, so a single allocation and a single copy
//! describe a whole election and rows are read with a fixed stride.

pub mod result;

use crate::error::{Result, StvError};
use crate::model::election::check_ballot_count;
use crate::model::{CandidateId, TieRank};

pub use result::{counted_len, decode_result, encode_result, ResultLayout};

/// Number of words needed for `votes` ballots over `candidates`.
pub fn input_words(candidates: u32, votes: u32) -> Result<usize> {
    (votes as usize)
        .checked_add(1)
        .and_then(|rows| rows.checked_mul(candidates as usize))
        .ok_or_else(|| {
            StvError::invalid(format!(
                "{} ballots over {} candidates do not fit in memory",
                votes, candidates
            ))
        })
}

/// Allocates an empty word buffer with room for exactly `words` words.
pub(crate) fn reserve_words(words: usize) -> Result<Vec<u32>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(words)
        .map_err(|_| StvError::AllocationFailure { words })?;
    Ok(buffer)
}

/// An owned input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedInput {
    candidates: u32,
    votes: u32,
    words: Vec<u32>,
}

/// A borrowed input buffer, e.g. one received across the ABI.
#[derive(Debug, Clone, Copy)]
pub struct PackedView<'a> {
    candidates: u32,
    votes: u32,
    words: &'a [u32],
}

/// Packs ballots and the tie-rank into one buffer.
///
/// The candidate count is the tie-rank length. Every ballot must have exactly
/// that many entries and the tie-rank must be a permutation; otherwise no
/// buffer is produced.
pub fn encode<B: AsRef<[CandidateId]>>(
    ballots: &[B],
    tie_rank: &[CandidateId],
) -> Result<PackedInput> {
    let candidates = tie_rank.len();
    if candidates == 0 || candidates > u32::MAX as usize {
        return Err(StvError::invalid(format!(
            "tie-rank must list between 1 and {} candidates",
            u32::MAX
        )));
    }
    let votes = check_ballot_count(ballots.len())?;
    TieRank::from_order(tie_rank, candidates)?;

    if let Some((i, ballot)) = ballots
        .iter()
        .enumerate()
        .find(|(_, b)| b.as_ref().len() != candidates)
    {
        return Err(StvError::invalid(format!(
            "ballot {} has {} entries, expected {}",
            i,
            ballot.as_ref().len(),
            candidates
        )));
    }

    let candidates = candidates as u32;
    let mut words = reserve_words(input_words(candidates, votes)?)?;
    for ballot in ballots {
        words.extend_from_slice(ballot.as_ref());
    }
    words.extend_from_slice(tie_rank);

    Ok(PackedInput {
        candidates,
        votes,
        words,
    })
}

impl PackedInput {
    /// Wraps a buffer whose length must match `candidates * (votes + 1)`.
    pub fn from_words(candidates: u32, votes: u32, words: Vec<u32>) -> Result<PackedInput> {
        PackedView::new(candidates, votes, &words)?;
        Ok(PackedInput {
            candidates,
            votes,
            words,
        })
    }

    /// Reads little-endian words; the ballot count follows from the length.
    pub fn from_le_bytes(candidates: u32, bytes: &[u8]) -> Result<PackedInput> {
        if candidates == 0 {
            return Err(StvError::invalid("candidate count must be positive"));
        }
        if bytes.len() % 4 != 0 {
            return Err(StvError::invalid(format!(
                "{} bytes is not a whole number of words",
                bytes.len()
            )));
        }
        let word_count = bytes.len() / 4;
        let stride = candidates as usize;
        if word_count % stride != 0 || word_count < stride {
            return Err(StvError::invalid(format!(
                "{} words is not a whole number of {}-candidate rows",
                word_count, candidates
            )));
        }
        let votes = check_ballot_count(word_count / stride - 1)?;

        let mut words = reserve_words(word_count)?;
        words.extend(
            bytes
                .chunks_exact(4)
                .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]])),
        );
        PackedInput::from_words(candidates, votes, words)
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    pub fn candidates(&self) -> u32 {
        self.candidates
    }

    pub fn votes(&self) -> u32 {
        self.votes
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn view(&self) -> PackedView<'_> {
        PackedView {
            candidates: self.candidates,
            votes: self.votes,
            words: &self.words,
        }
    }
}

impl<'a> PackedView<'a> {
    pub fn new(candidates: u32, votes: u32, words: &'a [u32]) -> Result<PackedView<'a>> {
        if candidates == 0 {
            return Err(StvError::invalid("candidate count must be positive"));
        }
        let expected = input_words(candidates, votes)?;
        if words.len() != expected {
            return Err(StvError::invalid(format!(
                "input buffer has {} words, expected {} for {} ballots over {} candidates",
                words.len(),
                expected,
                votes,
                candidates
            )));
        }
        Ok(PackedView {
            candidates,
            votes,
            words,
        })
    }

    pub fn candidates(&self) -> u32 {
        self.candidates
    }

    pub fn votes(&self) -> u32 {
        self.votes
    }

    /// Ballot rows in buffer order.
    pub fn ballots(&self) -> Vec<&'a [CandidateId]> {
        let stride = self.candidates as usize;
        self.words[..stride * self.votes as usize]
            .chunks_exact(stride)
            .collect()
    }

    pub fn tie_rank(&self) -> &'a [CandidateId] {
        let stride = self.candidates as usize;
        &self.words[stride * self.votes as usize..]
    }
}
