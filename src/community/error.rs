use std::io;

use thiserror::Error;

use crate::community::genome::GenomeId;
use crate::community::species::SpeciesId;

/// Failures of species membership and fitness sharing.
#[derive(Debug, Error)]
pub enum SpeciesError {
    #[error("genome {genome} is already a member of species {species}")]
    DuplicateGenome {
        genome: GenomeId,
        species: SpeciesId,
    },

    #[error("distance threshold {0} must be a non-negative number")]
    InvalidThreshold(f64),

    #[error("genome {0} has a sharing adjustment of zero")]
    ZeroAdjustment(GenomeId),

    #[error("a fitness sharing worker panicked")]
    WorkerPanicked,
}

/// Failures while building a genome.
#[derive(Debug, Error)]
pub enum GenomeError {
    #[error("genome {genome} carries innovation {innovation} more than once")]
    DuplicateInnovation {
        genome: GenomeId,
        innovation: usize,
    },
}

/// Failures while loading or checking parameters.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("unable to read parameter file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed parameter yaml: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("distance threshold {0} must be a non-negative number")]
    InvalidThreshold(f64),

    #[error("num_threads must be at least 1")]
    NoThreads,
}
