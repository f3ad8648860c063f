//! Single Transferable Vote counting with a packed-buffer C ABI.
//!
//! ```text
//!  host ballots ──encode──▶ packed u32 buffer ──▶ single_transferable_vote
//!                                                        │
//!  winners ◀──decode── [status, count, winners..] ◀──────┘ (released by host)
//! ```
//!
//! Use [`count`] or a [`Tabulator`] to count in-process, [`codec`] to build
//! and read buffers, and [`host::run_election`] to go through the ABI.

pub mod abi;
pub mod codec;
pub mod diagnostics;
pub mod error;
pub mod host;
pub mod model;
pub mod tabulator;

pub use codec::{decode_result, encode, encode_result, PackedInput, PackedView, ResultLayout};
pub use diagnostics::{DiagnosticSink, NullSink, TracingSink};
pub use error::{Result, StvError};
pub use model::{Ballot, CandidateId, Election, TieRank, UNRANKED};
pub use tabulator::{count, Completion, CountOptions, Outcome, RoundSummary, Tabulator};
