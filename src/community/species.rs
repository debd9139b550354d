use log::{debug, trace, warn};
use rand::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::community::error::SpeciesError;
use crate::community::genome::{GenomeId, Shareable};

pub type SpeciesId = usize;

/// A named, aged cluster of genomes.
///
/// Members are exclusive borrows of genomes owned by the population, so a
/// genome can sit in at most one species and the species is the only writer
/// of its fitness while it is alive. A species is never empty: it is founded
/// with one genome and only ever grows.
#[derive(Debug)]
pub struct Species<'a, G: Shareable> {
    id: SpeciesId,
    age: usize,
    members: Vec<&'a mut G>,
    member_ids: FxHashSet<GenomeId>,
}

/// Read-only view over the members of a species.
pub struct Members<'s, G> {
    inner: std::slice::Iter<'s, &'s mut G>,
}

impl<'s, G> Iterator for Members<'s, G> {
    type Item = &'s G;

    fn next(&mut self) -> Option<&'s G> {
        self.inner.next().map(|member| &**member)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'s, G> ExactSizeIterator for Members<'s, G> {}

/// Explicit sharing function: genomes within `distance_threshold` of each
/// other (inclusive) share fitness.
pub fn sharing(distance: f64, distance_threshold: f64) -> f64 {
    if distance > distance_threshold {
        0.0
    } else {
        1.0
    }
}

impl<'a, G: Shareable> Species<'a, G> {
    pub fn new(id: SpeciesId, founder: &'a mut G) -> Species<'a, G> {
        let mut member_ids = FxHashSet::default();
        member_ids.insert(founder.id());

        Species {
            id,
            age: 0,
            members: vec![founder],
            member_ids,
        }
    }

    pub fn id(&self) -> SpeciesId {
        self.id
    }

    pub fn age(&self) -> usize {
        self.age
    }

    // called once per generation by whoever manages the population
    pub fn increment_age(&mut self) {
        self.age += 1;
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    // always false, a species is founded with one genome
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member genomes in the order they joined.
    pub fn members(&self) -> Members<'_, G> {
        Members {
            inner: self.members.iter(),
        }
    }

    pub fn founder(&self) -> &G {
        &*self.members[0]
    }

    // produce a random member to check compatibility against
    pub fn random_member<R: Rng + ?Sized>(&self, rng: &mut R) -> &G {
        let member_i = rng.gen_range(0..self.members.len());
        &*self.members[member_i]
    }

    /// Appends a genome. Membership is not distance checked here; deciding
    /// which species a genome belongs to is up to the caller.
    pub fn add_genome(&mut self, genome: &'a mut G) -> Result<(), SpeciesError> {
        if !self.member_ids.insert(genome.id()) {
            warn!("species {} rejected duplicate genome {}", self.id, genome.id());
            return Err(SpeciesError::DuplicateGenome {
                genome: genome.id(),
                species: self.id,
            });
        }

        self.members.push(genome);
        Ok(())
    }

    pub fn fitness_sum(&self) -> f64 {
        self.members.iter().map(|member| member.fitness()).sum()
    }

    /// Number of species-mates (itself included) each genome shares with.
    ///
    /// Distance is symmetric, so each pair is measured once and credited to
    /// both genomes.
    pub fn adjustments(&self, distance_threshold: f64) -> FxHashMap<GenomeId, f64> {
        let mut adjustments = FxHashMap::default();
        adjustments.reserve(self.members.len());

        for (i, g0) in self.members.iter().enumerate() {
            let own = sharing(g0.compatibility(&**g0), distance_threshold);
            *adjustments.entry(g0.id()).or_insert(0.0) += own;

            for g1 in &self.members[i + 1..] {
                let shared = sharing(g0.compatibility(&**g1), distance_threshold);
                *adjustments.entry(g0.id()).or_insert(0.0) += shared;
                *adjustments.entry(g1.id()).or_insert(0.0) += shared;
            }
        }

        adjustments
    }

    /// Replaces each member's raw fitness with its shared fitness: raw fitness
    /// divided by the number of members within `distance_threshold`.
    ///
    /// Only meaningful once per raw fitness evaluation, since a second call
    /// divides the already shared values again. On error no fitness has been
    /// touched.
    pub fn fitness_share(&mut self, distance_threshold: f64) -> Result<(), SpeciesError> {
        // also catches NaN
        if !(distance_threshold >= 0.0) {
            warn!(
                "species {} refused to share fitness with threshold {}",
                self.id, distance_threshold
            );
            return Err(SpeciesError::InvalidThreshold(distance_threshold));
        }

        // all of the reads happen before any write
        let adjustments = self.adjustments(distance_threshold);

        let mut shared = Vec::with_capacity(self.members.len());
        for member in &self.members {
            let id = member.id();
            match adjustments.get(&id) {
                Some(&adjustment) if adjustment > 0.0 => {
                    trace!("genome {} shares with {} species-mates", id, adjustment);
                    shared.push(member.fitness() / adjustment);
                }
                _ => {
                    warn!("genome {} in species {} shares with nobody", id, self.id);
                    return Err(SpeciesError::ZeroAdjustment(id));
                }
            }
        }

        for (member, fitness) in self.members.iter_mut().zip(shared) {
            member.set_fitness(fitness);
        }

        debug!(
            "species {} (age {}) shared fitness across {} genomes at threshold {}",
            self.id,
            self.age,
            self.members.len(),
            distance_threshold
        );

        Ok(())
    }
}
