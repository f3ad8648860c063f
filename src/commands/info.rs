use super::CommandResult;
use crate::read_election::read_election;
use colored::*;
use ranked_stv::{encode, Election};
use sha1::{Digest, Sha1};
use std::path::Path;

/// Validate an election file and dump what the engine will see.
pub fn info(election_path: &Path) -> CommandResult {
    let file = read_election(election_path)?;
    let ballots = file.ballots();
    let tie_rank = file.tie_rank();

    println!("🗳️  {}", file.display_name().bright_cyan().bold());

    let election = Election::new(file.seats, file.candidate_count(), &ballots, &tie_rank)?;
    let packed = encode(&ballots, &tie_rank)?;

    let mut hasher = Sha1::new();
    hasher.update(packed.to_le_bytes());
    let fingerprint = format!("{:x}", hasher.finalize());

    println!("  Seats:       {}", election.seats().to_string().bright_yellow());
    println!("  Ballots:     {}", election.votes().to_string().bright_yellow());
    println!("  Droop quota: {}", election.quota().to_string().bright_yellow());
    println!("  Fingerprint: {}", fingerprint.dimmed());
    println!();

    println!("{}", "  Candidates (tie-rank order)".bright_white().bold());
    let first = election.first_preferences();
    for &candidate in election.tie_rank().order() {
        println!(
            "    {:>3}  {:<24} {} first preferences",
            candidate,
            file.candidate_name(candidate),
            first[candidate as usize].to_string().bright_green()
        );
    }

    let blank = election.ballots().iter().filter(|b| b.is_empty()).count();
    if blank > 0 {
        println!(
            "  {} {} ballots rank no candidate",
            "⚠️".yellow(),
            blank.to_string().yellow()
        );
    }

    println!("✅ {}", "Election is valid".green());
    Ok(())
}
