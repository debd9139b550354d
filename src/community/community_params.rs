use serde::{Deserialize, Serialize};

// weights of the terms in the genome compatibility distance
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatibilityParams {
    pub excess_imp: f64,
    pub disjoint_imp: f64,
    pub weight_imp: f64,
}

impl CompatibilityParams {
    pub fn new() -> CompatibilityParams {
        CompatibilityParams {
            excess_imp: 1.,
            disjoint_imp: 1.,
            weight_imp: 0.4,
        }
    }

    pub fn get_test_params() -> CompatibilityParams {
        CompatibilityParams {
            excess_imp: 1.,
            disjoint_imp: 1.,
            weight_imp: 0.1,
        }
    }
}

impl Default for CompatibilityParams {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SharingParams {
    // genomes closer than this count against each other's fitness
    pub distance_threshold: f64,
    // workers used when sharing fitness across a whole community
    pub num_threads: usize,
}

impl SharingParams {
    pub fn new() -> SharingParams {
        SharingParams {
            distance_threshold: 3.0,
            num_threads: 4,
        }
    }

    pub fn get_test_params() -> SharingParams {
        SharingParams {
            distance_threshold: 1.0,
            num_threads: 2,
        }
    }
}

impl Default for SharingParams {
    fn default() -> Self {
        Self::new()
    }
}
