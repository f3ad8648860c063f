use super::reserve_words;
use crate::error::{Result, StvError, STATUS_OK};
use crate::model::CandidateId;
use crate::tabulator::Outcome;

/// Result buffer shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultLayout {
    /// `[status, winner_count, winners...]`. The only layout the engine writes.
    Counted,
    /// `[status, slot_1 .. slot_seats]` with no winner count. Older engines
    /// wrote this; a result with fewer than `seats` winners cannot be told
    /// apart from padding, so every slot is returned as-is.
    Fixed,
}

/// Length of a counted result buffer given its first two words.
pub fn counted_len(header: [u32; 2]) -> usize {
    2 + header[1] as usize
}

/// Writes the counted layout for a finished run.
pub fn encode_result(result: &Result<Outcome>) -> Result<Vec<u32>> {
    let (status, winners) = match result {
        Ok(outcome) => (STATUS_OK, outcome.winners.as_slice()),
        Err(err) => (err.status_code(), &[][..]),
    };

    let mut words = reserve_words(2 + winners.len())?;
    words.push(status);
    words.push(winners.len() as u32);
    words.extend_from_slice(winners);
    Ok(words)
}

/// Reads winners back from a result buffer. A nonzero status becomes the
/// matching error.
pub fn decode_result(
    words: &[u32],
    seats: u32,
    layout: ResultLayout,
) -> Result<Vec<CandidateId>> {
    let status = *words
        .first()
        .ok_or_else(|| StvError::fault("result buffer is empty"))?;
    if let Some(err) = StvError::from_status(status) {
        return Err(err);
    }

    match layout {
        ResultLayout::Counted => {
            let count = *words
                .get(1)
                .ok_or_else(|| StvError::fault("result buffer has no winner count"))?;
            if count > seats {
                return Err(StvError::fault(format!(
                    "result reports {} winners for {} seats",
                    count, seats
                )));
            }
            words
                .get(2..2 + count as usize)
                .map(|winners| winners.to_vec())
                .ok_or_else(|| {
                    StvError::fault(format!(
                        "result buffer has {} words, expected {}",
                        words.len(),
                        2 + count as usize
                    ))
                })
        }
        ResultLayout::Fixed => words
            .get(1..=seats as usize)
            .map(|winners| winners.to_vec())
            .ok_or_else(|| {
                StvError::fault(format!(
                    "fixed result buffer has {} words, expected {}",
                    words.len(),
                    seats as usize + 1
                ))
            }),
    }
}
