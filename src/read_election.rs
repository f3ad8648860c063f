use ranked_stv::{Ballot, CandidateId, CountOptions};
use serde::Deserialize;
use std::convert::TryFrom;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ElectionFileError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid election file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Election file {0} lists more candidates than can be counted")]
    TooManyCandidates(PathBuf),
}

/// An election description: candidate names plus already-indexed ballots.
///
/// Ballots list candidate indices in preference order and may be shorter
/// than the candidate list; the rest is padded as unranked.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionFile {
    pub name: Option<String>,
    pub seats: u32,
    pub candidates: Vec<String>,
    pub ballots: Vec<Vec<CandidateId>>,
    pub tie_rank: Option<Vec<CandidateId>>,
    #[serde(default)]
    pub options: CountOptions,
}

impl ElectionFile {
    pub fn candidate_count(&self) -> u32 {
        self.candidates.len() as u32
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed election")
    }

    /// Ballots padded to the candidate count.
    pub fn ballots(&self) -> Vec<Ballot> {
        let candidates = self.candidates.len();
        self.ballots
            .iter()
            .map(|prefs| Ballot::partial(prefs, candidates))
            .collect()
    }

    /// The declared tie-rank, or candidates in listed order.
    pub fn tie_rank(&self) -> Vec<CandidateId> {
        match &self.tie_rank {
            Some(order) => order.clone(),
            None => (0..self.candidate_count()).collect(),
        }
    }

    pub fn candidate_name(&self, candidate: CandidateId) -> String {
        self.candidates
            .get(candidate as usize)
            .cloned()
            .unwrap_or_else(|| format!("#{}", candidate))
    }
}

pub fn read_election(path: &Path) -> Result<ElectionFile, ElectionFileError> {
    let file = File::open(path).map_err(|source| ElectionFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let election: ElectionFile =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            ElectionFileError::Json {
                path: path.to_path_buf(),
                source,
            }
        })?;

    if u32::try_from(election.candidates.len()).is_err() {
        return Err(ElectionFileError::TooManyCandidates(path.to_path_buf()));
    }

    Ok(election)
}
