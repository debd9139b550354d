use std::cmp::Ordering;

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::community::community_params::CompatibilityParams;
use crate::community::error::GenomeError;

pub type GenomeId = usize;

/// What a species needs from its members in order to share fitness.
///
/// The species never owns a genome. It reads fitness and distances during the
/// read pass and writes fitness, and nothing else, during the write pass.
///
/// Implementations must keep `compatibility` symmetric and non-negative, and
/// a genome must be at distance `0.0` from itself.
pub trait Shareable {
    fn id(&self) -> GenomeId;
    fn fitness(&self) -> f64;
    fn set_fitness(&mut self, fitness: f64);
    fn compatibility(&self, other: &Self) -> f64;
}

/// A connection gene, identified across genomes by its innovation number.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EdgeGene {
    pub innovation: usize,
    pub input: usize,
    pub output: usize,
    pub weight: f64,
    pub enabled: bool,
}

impl EdgeGene {
    pub fn new(innovation: usize, input: usize, output: usize, weight: f64) -> EdgeGene {
        EdgeGene {
            innovation,
            input,
            output,
            weight,
            enabled: true,
        }
    }
}

/// Gene bookkeeping between two genomes.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Alignment {
    pub matching: usize,
    pub disjoint: usize,
    pub excess: usize,
    // summed absolute weight difference over matching genes
    pub weight_diff: f64,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Genome {
    id: GenomeId,
    fitness: f64,
    // sorted by innovation, no innovation appears twice
    edge_genes: Vec<EdgeGene>,
    pub params: CompatibilityParams,
}

impl Genome {
    pub fn new(
        id: GenomeId,
        mut edge_genes: Vec<EdgeGene>,
        params: CompatibilityParams,
    ) -> Result<Genome, GenomeError> {
        // alignment walks both gene lists in innovation order
        edge_genes.sort_by_key(|gene| gene.innovation);

        if let Some(pair) = edge_genes
            .windows(2)
            .find(|pair| pair[0].innovation == pair[1].innovation)
        {
            return Err(GenomeError::DuplicateInnovation {
                genome: id,
                innovation: pair[0].innovation,
            });
        }

        Ok(Genome {
            id,
            fitness: 0.0,
            edge_genes,
            params,
        })
    }

    // genome that translates to a dense two-layer network
    pub fn new_minimal_dense(
        id: GenomeId,
        sensors: usize,
        outputs: usize,
        params: CompatibilityParams,
    ) -> Genome {
        let mut rng = rand::thread_rng();

        // we will start with sensors fully connected to outputs
        let mut innov_num = 0;
        let mut edge_genes = Vec::with_capacity(sensors * outputs);
        for si in 0..sensors {
            for oi in 0..outputs {
                let unif_weight: f64 = rng.gen_range(-1.0..1.0);
                edge_genes.push(EdgeGene::new(innov_num, si, sensors + oi, unif_weight));
                innov_num += 1;
            }
        }

        // innovations are already unique and ascending
        Genome {
            id,
            fitness: 0.0,
            edge_genes,
            params,
        }
    }

    pub fn edge_genes(&self) -> &[EdgeGene] {
        &self.edge_genes
    }

    /// Counts matching, disjoint and excess genes against `partner`.
    ///
    /// Genes left over once the other genome runs out of innovations are
    /// excess; every other unmatched gene is disjoint.
    pub fn align(&self, partner: &Genome) -> Alignment {
        let mut aln = Alignment::default();

        let (mut i, mut j) = (0, 0);
        while i < self.edge_genes.len() && j < partner.edge_genes.len() {
            let self_gene = &self.edge_genes[i];
            let part_gene = &partner.edge_genes[j];

            match self_gene.innovation.cmp(&part_gene.innovation) {
                Ordering::Equal => {
                    aln.matching += 1;
                    aln.weight_diff += (self_gene.weight - part_gene.weight).abs();
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    aln.disjoint += 1;
                    i += 1;
                }
                Ordering::Greater => {
                    aln.disjoint += 1;
                    j += 1;
                }
            }
        }

        aln.excess = (self.edge_genes.len() - i) + (partner.edge_genes.len() - j);
        aln
    }

    /// NEAT compatibility distance.
    ///
    /// Each coefficient is the mean of both genomes' params, so the distance
    /// is the same whichever genome it is measured from.
    pub fn incompatibility(&self, partner: &Genome) -> f64 {
        let aln = self.align(partner);

        // normalize by the larger genome
        let longest = self.edge_genes.len().max(partner.edge_genes.len());
        let n = longest.max(1) as f64;

        let avg_diff = if aln.matching > 0 {
            aln.weight_diff / aln.matching as f64
        } else {
            0.0
        };

        let excess_imp = (self.params.excess_imp + partner.params.excess_imp) / 2.0;
        let disjoint_imp = (self.params.disjoint_imp + partner.params.disjoint_imp) / 2.0;
        let weight_imp = (self.params.weight_imp + partner.params.weight_imp) / 2.0;

        excess_imp * aln.excess as f64 / n
            + disjoint_imp * aln.disjoint as f64 / n
            + weight_imp * avg_diff
    }
}

impl Shareable for Genome {
    fn id(&self) -> GenomeId {
        self.id
    }

    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    fn compatibility(&self, other: &Self) -> f64 {
        self.incompatibility(other)
    }
}
