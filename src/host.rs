//! Host-side binding over the engine's C ABI.
//!
//! Every buffer that crosses the boundary is wrapped in a guard as soon as it
//! is obtained, so the input buffer is freed and the result buffer is
//! released exactly once, whichever way a call returns.

use crate::abi;
use crate::codec::{self, counted_len, decode_result, ResultLayout};
use crate::error::{Result, StvError};
use crate::model::CandidateId;
use std::convert::TryFrom;
use std::ptr::NonNull;

/// The four entry points an engine module exports.
///
/// Implemented by [`NativeEngine`] for this crate's own exports; other
/// implementations can drive a separately loaded module.
pub trait EngineAbi {
    /// # Safety
    /// Returns an engine-owned buffer, or null.
    unsafe fn alloc_words(&self, words: u32) -> *mut u32;

    /// # Safety
    /// `ptr` must come from `alloc_words(words)` on the same engine.
    unsafe fn free_words(&self, ptr: *mut u32, words: u32);

    /// # Safety
    /// `input` must point to `candidates * (votes + 1)` readable words.
    unsafe fn count(
        &self,
        seats: u32,
        candidates: u32,
        votes: u32,
        input: *const u32,
    ) -> *mut u32;

    /// # Safety
    /// `result` must come from `count` on the same engine and not be released yet.
    unsafe fn free_result(&self, result: *mut u32);
}

/// The engine compiled into this crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeEngine;

impl EngineAbi for NativeEngine {
    unsafe fn alloc_words(&self, words: u32) -> *mut u32 {
        abi::stv_alloc_u32(words)
    }

    unsafe fn free_words(&self, ptr: *mut u32, words: u32) {
        abi::stv_free_u32(ptr, words)
    }

    unsafe fn count(
        &self,
        seats: u32,
        candidates: u32,
        votes: u32,
        input: *const u32,
    ) -> *mut u32 {
        abi::single_transferable_vote(seats, candidates, votes, input)
    }

    unsafe fn free_result(&self, result: *mut u32) {
        abi::stv_free_result(result)
    }
}

/// An engine-allocated input buffer, freed on drop.
pub struct InputBuffer<'e, E: EngineAbi + ?Sized> {
    engine: &'e E,
    ptr: NonNull<u32>,
    words: u32,
}

impl<'e, E: EngineAbi + ?Sized> InputBuffer<'e, E> {
    pub fn acquire(engine: &'e E, words: u32) -> Result<Self> {
        // SAFETY: the pointer is owned by the guard from here on.
        let raw = unsafe { engine.alloc_words(words) };
        let ptr = NonNull::new(raw).ok_or(StvError::AllocationFailure {
            words: words as usize,
        })?;
        Ok(InputBuffer { engine, ptr, words })
    }

    pub fn as_mut_slice(&mut self) -> &mut [u32] {
        // SAFETY: the engine handed out `words` writable words and the guard
        // holds the only pointer to them.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.words as usize) }
    }

    pub fn as_ptr(&self) -> *const u32 {
        self.ptr.as_ptr()
    }
}

impl<'e, E: EngineAbi + ?Sized> Drop for InputBuffer<'e, E> {
    fn drop(&mut self) {
        // SAFETY: allocated by `alloc_words(self.words)` on this engine.
        unsafe { self.engine.free_words(self.ptr.as_ptr(), self.words) }
    }
}

/// A result buffer owned by the engine, released on drop.
pub struct ResultBuffer<'e, E: EngineAbi + ?Sized> {
    engine: &'e E,
    ptr: NonNull<u32>,
}

impl<'e, E: EngineAbi + ?Sized> ResultBuffer<'e, E> {
    /// Takes ownership of a pointer returned by `count`; `None` for null.
    ///
    /// # Safety
    /// `raw` must come from `engine.count` and not be released elsewhere.
    pub unsafe fn wrap(engine: &'e E, raw: *mut u32) -> Option<Self> {
        NonNull::new(raw).map(|ptr| ResultBuffer { engine, ptr })
    }

    /// The whole buffer in the counted layout.
    pub fn words(&self) -> &[u32] {
        let ptr = self.ptr.as_ptr();
        // SAFETY: a counted result always has a status word and a winner
        // count, followed by that many winners.
        unsafe {
            let len = counted_len([*ptr, *ptr.add(1)]);
            std::slice::from_raw_parts(ptr, len)
        }
    }
}

impl<'e, E: EngineAbi + ?Sized> Drop for ResultBuffer<'e, E> {
    fn drop(&mut self) {
        // SAFETY: wrapped from `count` and released only here.
        unsafe { self.engine.free_result(self.ptr.as_ptr()) }
    }
}

/// Packs `ballots` and `tie_rank`, runs them through `engine` and returns the
/// winners in election order.
///
/// Shapes are checked before the engine is touched. A null result from the
/// engine is reported as an allocation failure.
pub fn run_election<E, B>(
    engine: &E,
    seats: u32,
    ballots: &[B],
    tie_rank: &[CandidateId],
) -> Result<Vec<CandidateId>>
where
    E: EngineAbi + ?Sized,
    B: AsRef<[CandidateId]>,
{
    let packed = codec::encode(ballots, tie_rank)?;
    let words = u32::try_from(packed.words().len())
        .map_err(|_| StvError::invalid("input does not fit a 32-bit word count"))?;

    let mut input = InputBuffer::acquire(engine, words)?;
    input.as_mut_slice().copy_from_slice(packed.words());

    // SAFETY: `input` holds exactly the packed words for these dimensions
    // and outlives the call.
    let result = unsafe {
        let raw = engine.count(seats, packed.candidates(), packed.votes(), input.as_ptr());
        ResultBuffer::wrap(engine, raw)
    }
    .ok_or(StvError::AllocationFailure {
        words: 2 + seats as usize,
    })?;
    drop(input);

    decode_result(result.words(), seats, ResultLayout::Counted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::ptr;

    #[derive(Default)]
    struct Tracked {
        allocs: Cell<usize>,
        input_frees: Cell<usize>,
        counts: Cell<usize>,
        result_frees: Cell<usize>,
        fail_alloc: bool,
        fail_result: bool,
    }

    impl EngineAbi for Tracked {
        unsafe fn alloc_words(&self, words: u32) -> *mut u32 {
            if self.fail_alloc {
                return ptr::null_mut();
            }
            self.allocs.set(self.allocs.get() + 1);
            NativeEngine.alloc_words(words)
        }

        unsafe fn free_words(&self, ptr: *mut u32, words: u32) {
            self.input_frees.set(self.input_frees.get() + 1);
            NativeEngine.free_words(ptr, words)
        }

        unsafe fn count(
            &self,
            seats: u32,
            candidates: u32,
            votes: u32,
            input: *const u32,
        ) -> *mut u32 {
            self.counts.set(self.counts.get() + 1);
            if self.fail_result {
                return ptr::null_mut();
            }
            NativeEngine.count(seats, candidates, votes, input)
        }

        unsafe fn free_result(&self, result: *mut u32) {
            self.result_frees.set(self.result_frees.get() + 1);
            NativeEngine.free_result(result)
        }
    }

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
    fn success_releases_everything_once() {
        let engine = Tracked::default();
        let winners = run_election(&engine, 1, &droop_ballots(), &[0, 1, 2]).unwrap();
        assert_eq!(winners, vec![0]);
        assert_eq!(engine.allocs.get(), 1);
        assert_eq!(engine.input_frees.get(), 1);
        assert_eq!(engine.counts.get(), 1);
        assert_eq!(engine.result_frees.get(), 1);
    }

    #[test]
    fn engine_error_status_still_releases_result() {
        let engine = Tracked::default();
        let err = run_election(&engine, 4, &droop_ballots(), &[0, 1, 2]).unwrap_err();
        assert!(matches!(err, StvError::InvalidInput(_)));
        assert_eq!(engine.input_frees.get(), 1);
        assert_eq!(engine.result_frees.get(), 1);
    }

    #[test]
    fn malformed_ballot_never_reaches_engine() {
        let engine = Tracked::default();
        let ballots: Vec<Vec<u32>> = vec![vec![0, 1, 2], vec![1, 0]];
        let err = run_election(&engine, 1, &ballots, &[0, 1, 2]).unwrap_err();
        assert!(matches!(err, StvError::InvalidInput(_)));
        assert_eq!(engine.allocs.get(), 0);
        assert_eq!(engine.counts.get(), 0);
        assert_eq!(engine.result_frees.get(), 0);
    }

    #[test]
    fn failed_input_allocation() {
        let engine = Tracked {
            fail_alloc: true,
            ..Tracked::default()
        };
        let err = run_election(&engine, 1, &droop_ballots(), &[0, 1, 2]).unwrap_err();
        assert_eq!(err, StvError::AllocationFailure { words: 18 });
        assert_eq!(engine.counts.get(), 0);
        assert_eq!(engine.input_frees.get(), 0);
    }

    #[test]
    fn null_result_is_allocation_failure() {
        let engine = Tracked {
            fail_result: true,
            ..Tracked::default()
        };
        let err = run_election(&engine, 1, &droop_ballots(), &[0, 1, 2]).unwrap_err();
        assert!(matches!(err, StvError::AllocationFailure { .. }));
        assert_eq!(engine.input_frees.get(), 1);
        assert_eq!(engine.result_frees.get(), 0);
    }
}
