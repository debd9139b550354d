//! Species and explicit fitness sharing for NEAT.
//!
//! Genomes live in a population owned elsewhere. A [`Species`] borrows the
//! genomes that belong to it and divides each one's raw fitness by the number
//! of species-mates within the compatibility threshold.

// This module contains all of the evolutionary stuff
pub mod community;

pub use community::community_params::{CompatibilityParams, SharingParams};
pub use community::error::{GenomeError, ParamsError, SpeciesError};
pub use community::genome::{EdgeGene, Genome, GenomeId, Shareable};
pub use community::species::{sharing, Species, SpeciesId};
pub use community::Community;

use log::info;
use serde::{Deserialize, Serialize};

use std::fs;
use std::path::Path;

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NEATParams {
    pub compatibility: CompatibilityParams,
    pub sharing: SharingParams,
}

impl NEATParams {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<NEATParams, ParamsError> {
        let path = path.as_ref();

        // extract a string from the file
        let yaml_string = fs::read_to_string(path).map_err(|source| ParamsError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let params = Self::from_yaml(&yaml_string)?;
        info!("loaded parameters from {}", path.display());
        Ok(params)
    }

    pub fn from_yaml(fstring: &str) -> Result<NEATParams, ParamsError> {
        let params: NEATParams = serde_yml::from_str(fstring)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        let threshold = self.sharing.distance_threshold;
        if !(threshold >= 0.0) {
            return Err(ParamsError::InvalidThreshold(threshold));
        }
        if self.sharing.num_threads == 0 {
            return Err(ParamsError::NoThreads);
        }
        Ok(())
    }
}
