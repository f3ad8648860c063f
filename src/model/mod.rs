pub mod election;

pub use election::{droop_quota, Ballot, CandidateId, Election, TieRank, UNRANKED};
