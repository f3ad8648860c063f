use super::CommandResult;
use crate::read_election::{read_election, ElectionFile};
use colored::*;
use instant::Instant;
use ranked_stv::host::{run_election, NativeEngine};
use ranked_stv::model::droop_quota;
use ranked_stv::{CandidateId, CountOptions, Outcome, Tabulator, TracingSink};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CountReport {
    winners: Vec<CandidateId>,
    names: Vec<String>,
    quota: u32,
}

/// Count an election file and print the winners.
///
/// With `via_abi` the count goes through the exported C entry points, which
/// always use default options.
pub fn count(
    election_path: &Path,
    via_abi: bool,
    json: bool,
    tolerance: Option<f64>,
) -> CommandResult {
    let file = read_election(election_path)?;
    let ballots = file.ballots();
    let tie_rank = file.tie_rank();

    let start = Instant::now();
    let (winners, quota, outcome) = if via_abi {
        if tolerance.is_some() {
            eprintln!(
                "{} {}",
                "⚠️".yellow(),
                "--tolerance is ignored when counting through the ABI".yellow()
            );
        }
        let winners = run_election(&NativeEngine, file.seats, &ballots, &tie_rank)?;
        let quota = droop_quota(ballots.len() as u32, file.seats);
        (winners, quota, None)
    } else {
        let mut options: CountOptions = file.options.clone();
        if let Some(tolerance) = tolerance {
            options.tolerance = tolerance;
        }
        let tabulator = Tabulator::new(options, &TracingSink);
        let outcome = tabulator.count(file.seats, file.candidate_count(), &ballots, &tie_rank)?;
        (outcome.winners.clone(), outcome.quota, Some(outcome))
    };
    let elapsed = start.elapsed();

    if json {
        let report = CountReport {
            names: winners.iter().map(|&c| file.candidate_name(c)).collect(),
            winners,
            quota,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("🗳️  {}", file.display_name().bright_cyan().bold());
    println!(
        "  {} seats, quota {}",
        file.seats.to_string().bright_yellow(),
        quota.to_string().bright_yellow()
    );
    if let Some(outcome) = &outcome {
        print_rounds(&file, outcome);
    }

    println!("{}", "  Elected".bright_white().bold());
    for (place, &winner) in winners.iter().enumerate() {
        println!(
            "    {}. {}",
            place + 1,
            file.candidate_name(winner).bright_green()
        );
    }
    if winners.len() < file.seats as usize {
        println!(
            "  {} {} seats left unfilled",
            "⚠️".yellow(),
            (file.seats as usize - winners.len()).to_string().yellow()
        );
    }

    println!(
        "✅ Counted in {}",
        format!("{:.2?}", elapsed).bright_blue()
    );
    Ok(())
}

fn print_rounds(file: &ElectionFile, outcome: &Outcome) {
    for summary in &outcome.rounds {
        let mut events = Vec::new();
        if !summary.elected.is_empty() {
            let names: Vec<String> = summary
                .elected
                .iter()
                .map(|&c| file.candidate_name(c))
                .collect();
            events.push(format!("elected {}", names.join(", ")));
        }
        if let Some(eliminated) = summary.eliminated {
            events.push(format!("eliminated {}", file.candidate_name(eliminated)));
        }
        if summary.tie_broken {
            events.push("tie broken by tie-rank".to_string());
        }
        println!(
            "  Round {}: {} {}",
            summary.round.to_string().bright_cyan(),
            events.join("; "),
            format!("(exhausted {:.3})", summary.exhausted).dimmed()
        );
    }
}
