//! C ABI entry points, exported from the `cdylib` (native or `wasm32`).
//!
//! Buffers cross the boundary as `u32` words. The host obtains an input
//! buffer from [`stv_alloc_u32`], fills it, calls
//! [`single_transferable_vote`] and frees the input with [`stv_free_u32`]. The
//! returned result buffer belongs to the engine until the host hands it back
//! to [`stv_free_result`], exactly once.

use crate::codec::{self, counted_len, encode_result, PackedView};
use crate::error::{Result, StvError};
use crate::tabulator::{Outcome, Tabulator};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

fn into_raw(words: Vec<u32>) -> *mut u32 {
    Box::into_raw(words.into_boxed_slice()) as *mut u32
}

/// Allocates a zeroed buffer of `words` words. Returns null when `words` is
/// zero or memory is unavailable.
#[no_mangle]
pub extern "C" fn stv_alloc_u32(words: u32) -> *mut u32 {
    if words == 0 {
        return ptr::null_mut();
    }
    match codec::reserve_words(words as usize) {
        Ok(mut buffer) => {
            buffer.resize(words as usize, 0);
            into_raw(buffer)
        }
        Err(err) => {
            tracing::warn!(words, "{}", err);
            ptr::null_mut()
        }
    }
}

/// Frees a buffer returned by [`stv_alloc_u32`].
///
/// # Safety
///
/// `ptr` must be null or come from `stv_alloc_u32(words)` with the same
/// `words`, and must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn stv_free_u32(ptr: *mut u32, words: u32) {
    if ptr.is_null() {
        return;
    }
    drop(Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, words as usize)));
}

/// Counts an election held in a packed input buffer.
///
/// The result is `[status, winner_count, winners...]`; a nonzero status
/// carries no winners. Null is returned only when the result buffer itself
/// cannot be allocated. The input buffer is not referenced after return.
///
/// # Safety
///
/// `input` must be null or point to `candidates * (votes + 1)` readable
/// words that stay valid for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn single_transferable_vote(
    seats: u32,
    candidates: u32,
    votes: u32,
    input: *const u32,
) -> *mut u32 {
    let result = run_guarded(|| count_raw(seats, candidates, votes, input));

    match &result {
        Ok(outcome) => tracing::debug!(
            seats,
            candidates,
            votes,
            winners = outcome.winners.len(),
            "count finished"
        ),
        Err(err) => tracing::warn!(seats, candidates, votes, "count failed: {}", err),
    }

    match encode_result(&result) {
        Ok(words) => into_raw(words),
        Err(err) => {
            tracing::error!("{}", err);
            ptr::null_mut()
        }
    }
}

/// Releases a result buffer returned by [`single_transferable_vote`].
///
/// # Safety
///
/// `result` must be null or a pointer returned by `single_transferable_vote`
/// that has not been released yet.
#[no_mangle]
pub unsafe extern "C" fn stv_free_result(result: *mut u32) {
    if result.is_null() {
        return;
    }
    let len = counted_len([*result, *result.add(1)]);
    drop(Box::from_raw(ptr::slice_from_raw_parts_mut(result, len)));
}

/// Runs a count, turning a panic into an internal fault.
fn run_guarded<F>(count: F) -> Result<Outcome>
where
    F: FnOnce() -> Result<Outcome>,
{
    panic::catch_unwind(AssertUnwindSafe(count))
        .unwrap_or_else(|_| Err(StvError::fault("engine panicked")))
}

unsafe fn count_raw(
    seats: u32,
    candidates: u32,
    votes: u32,
    input: *const u32,
) -> Result<Outcome> {
    if input.is_null() {
        return Err(StvError::invalid("input buffer is null"));
    }
    let words = codec::input_words(candidates, votes)?;
    let view = PackedView::new(
        candidates,
        votes,
        std::slice::from_raw_parts(input, words),
    )?;
    Tabulator::default().count(seats, candidates, &view.ballots(), view.tie_rank())
}
