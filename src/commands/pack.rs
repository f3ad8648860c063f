use super::CommandResult;
use crate::read_election::read_election;
use colored::*;
use ranked_stv::{encode, PackedInput, Tabulator};
use std::fs;
use std::path::Path;

/// Write the packed input buffer for an election file as little-endian words.
pub fn pack(election_path: &Path, out_path: &Path) -> CommandResult {
    let file = read_election(election_path)?;
    let packed = encode(&file.ballots(), &file.tie_rank())?;

    fs::write(out_path, packed.to_le_bytes())?;

    println!(
        "📦 Packed {} ballots over {} candidates into {}",
        packed.votes().to_string().bright_yellow(),
        packed.candidates().to_string().bright_yellow(),
        out_path.display().to_string().bright_cyan()
    );
    Ok(())
}

/// Count a buffer written by `pack` and print winners as candidate indices.
pub fn run_packed(packed_path: &Path, seats: u32, candidates: u32) -> CommandResult {
    let bytes = fs::read(packed_path)?;
    let packed = PackedInput::from_le_bytes(candidates, &bytes)?;
    let view = packed.view();

    let outcome = Tabulator::default().count(seats, candidates, &view.ballots(), view.tie_rank())?;

    let winners: Vec<String> = outcome.winners.iter().map(|w| w.to_string()).collect();
    println!(
        "🏁 {} ballots, quota {}, winners: {}",
        packed.votes().to_string().bright_yellow(),
        outcome.quota.to_string().bright_yellow(),
        winners.join(" ").bright_green()
    );
    Ok(())
}
