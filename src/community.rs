pub mod community_params;
pub mod error;
pub mod genome;
pub mod species;

use crossbeam::thread;
use log::debug;

use crate::community::community_params::SharingParams;
use crate::community::error::SpeciesError;
use crate::community::genome::Shareable;
use crate::community::species::{Species, SpeciesId};

/// All species of one generation.
///
/// Species borrow disjoint genomes from the population, so each one can
/// share fitness on its own thread.
pub struct Community<'a, G: Shareable> {
    species: Vec<Species<'a, G>>,
    params: SharingParams,
}

impl<'a, G: Shareable> Community<'a, G> {
    pub fn new(params: SharingParams) -> Community<'a, G> {
        Community {
            species: Vec::new(),
            params,
        }
    }

    pub fn push(&mut self, species: Species<'a, G>) {
        self.species.push(species);
    }

    pub fn species(&self) -> &[Species<'a, G>] {
        &self.species
    }

    pub fn get_species(&self, id: SpeciesId) -> Option<&Species<'a, G>> {
        self.species.iter().find(|species| species.id() == id)
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    // every surviving species gets one generation older
    pub fn next_generation(&mut self) {
        for species in &mut self.species {
            species.increment_age();
        }
    }
}

impl<'a, G: Shareable + Send> Community<'a, G> {
    /// Shares fitness within every species, spreading the species over
    /// `num_threads` scoped threads.
    ///
    /// A bad threshold is rejected before any species is touched. Otherwise
    /// every species is attempted: one that fails keeps its raw fitness while
    /// the rest are shared, whatever the thread count. The error returned is
    /// the one from the earliest failing species.
    pub fn share_fitness(&mut self) -> Result<(), SpeciesError> {
        let threshold = self.params.distance_threshold;
        if !(threshold >= 0.0) {
            return Err(SpeciesError::InvalidThreshold(threshold));
        }

        if self.species.is_empty() {
            return Ok(());
        }

        let num_threads = self.params.num_threads.max(1);
        let chunk_size = (self.species.len() + num_threads - 1) / num_threads;

        // one scope for all chunks, each chunk on its own thread
        let results = thread::scope(|s| {
            let handles: Vec<thread::ScopedJoinHandle<Result<(), SpeciesError>>> = self
                .species
                .chunks_mut(chunk_size)
                .map(|chunk| {
                    s.spawn(move |_| {
                        // keep going after a failure so the outcome is per species
                        let mut first_err = None;
                        for species in chunk.iter_mut() {
                            if let Err(e) = species.fitness_share(threshold) {
                                first_err.get_or_insert(e);
                            }
                        }
                        first_err.map_or(Ok(()), Err)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join())
                .collect::<Vec<_>>()
        })
        .map_err(|_| SpeciesError::WorkerPanicked)?;

        for result in results {
            result.map_err(|_| SpeciesError::WorkerPanicked)??;
        }

        debug!(
            "shared fitness across {} species on {} threads",
            self.species.len(),
            num_threads
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::community_params::CompatibilityParams;
    use crate::community::genome::Genome;
    use assert_approx_eq::assert_approx_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn pool(#[default(12)] num: usize) -> Vec<Genome> {
        (0..num)
            .map(|i| {
                let mut genome = Genome::new_minimal_dense(i, 2, 2, CompatibilityParams::new());
                genome.set_fitness(i as f64 + 1.0);
                genome
            })
            .collect()
    }

    // consecutive runs of `per_species` genomes form a species
    fn speciate<G: Shareable>(pool: &mut [G], per_species: usize) -> Vec<Species<'_, G>> {
        pool.chunks_mut(per_species)
            .enumerate()
            .map(|(sid, chunk)| {
                let mut members = chunk.iter_mut();
                let mut species = Species::new(sid, members.next().unwrap());
                for genome in members {
                    species.add_genome(genome).unwrap();
                }
                species
            })
            .collect()
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(8)]
    fn test_share_fitness_matches_sequential(mut pool: Vec<Genome>, #[case] num_threads: usize) {
        let mut sequential = pool.clone();
        let params = SharingParams {
            distance_threshold: 1.0,
            num_threads,
        };

        {
            let mut comm = Community::new(params.clone());
            for species in speciate(&mut pool, 3) {
                comm.push(species);
            }
            assert_eq!(comm.len(), 4);
            comm.share_fitness().unwrap();
        }

        for mut species in speciate(&mut sequential, 3) {
            species.fitness_share(params.distance_threshold).unwrap();
        }

        for (parallel, sequential) in pool.iter().zip(&sequential) {
            assert_eq!(parallel.fitness(), sequential.fitness());
        }
    }

    // same topology and weights in [-1, 1) keep every distance under 1
    #[rstest]
    fn test_share_fitness_divides_by_species_size(mut pool: Vec<Genome>) {
        {
            let mut comm = Community::new(SharingParams::get_test_params());
            for species in speciate(&mut pool, 4) {
                comm.push(species);
            }
            comm.share_fitness().unwrap();
        }

        for (i, genome) in pool.iter().enumerate() {
            assert_approx_eq!(genome.fitness(), (i as f64 + 1.0) / 4.0);
        }
    }

    #[rstest]
    fn test_share_fitness_reports_errors(mut pool: Vec<Genome>) {
        let params = SharingParams {
            distance_threshold: -0.5,
            num_threads: 3,
        };

        let mut comm = Community::new(params);
        for species in speciate(&mut pool, 5) {
            comm.push(species);
        }

        let result = comm.share_fitness();
        assert!(matches!(result, Err(SpeciesError::InvalidThreshold(_))));
    }

    // genome that is far from everything, itself included, when it is a loner
    #[derive(Debug, Clone)]
    struct Tagged {
        id: usize,
        fitness: f64,
        loner: bool,
    }

    impl Shareable for Tagged {
        fn id(&self) -> usize {
            self.id
        }

        fn fitness(&self) -> f64 {
            self.fitness
        }

        fn set_fitness(&mut self, fitness: f64) {
            self.fitness = fitness;
        }

        fn compatibility(&self, other: &Self) -> f64 {
            if self.loner || other.loner {
                10.0
            } else {
                0.0
            }
        }
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    fn test_failing_species_does_not_stop_the_rest(#[case] num_threads: usize) {
        let mut pool: Vec<Tagged> = (0..6)
            .map(|id| Tagged {
                id,
                fitness: 8.0,
                loner: id == 2,
            })
            .collect();

        {
            let mut comm = Community::new(SharingParams {
                distance_threshold: 1.0,
                num_threads,
            });
            for species in speciate(&mut pool, 2) {
                comm.push(species);
            }

            let result = comm.share_fitness();
            assert!(matches!(result, Err(SpeciesError::ZeroAdjustment(2))));
        }

        let fitness: Vec<f64> = pool.iter().map(|genome| genome.fitness).collect();
        assert_eq!(fitness, vec![4.0, 4.0, 8.0, 8.0, 4.0, 4.0]);
    }

    #[rstest]
    fn test_bad_threshold_touches_nothing(#[with(4)] mut pool: Vec<Genome>) {
        let raw: Vec<f64> = pool.iter().map(|genome| genome.fitness()).collect();
        {
            let mut comm = Community::new(SharingParams {
                distance_threshold: f64::NAN,
                num_threads: 2,
            });
            for species in speciate(&mut pool, 2) {
                comm.push(species);
            }

            let result = comm.share_fitness();
            assert!(matches!(result, Err(SpeciesError::InvalidThreshold(_))));
        }

        let after: Vec<f64> = pool.iter().map(|genome| genome.fitness()).collect();
        assert_eq!(after, raw);
    }

    #[test]
    fn test_share_fitness_empty() {
        let mut comm: Community<Genome> = Community::new(SharingParams::new());
        assert!(comm.is_empty());
        assert!(comm.share_fitness().is_ok());
    }

    #[rstest]
    fn test_next_generation(#[with(6)] mut pool: Vec<Genome>) {
        let mut comm = Community::new(SharingParams::new());
        for species in speciate(&mut pool, 2) {
            comm.push(species);
        }

        comm.next_generation();
        comm.next_generation();

        assert!(comm.species().iter().all(|species| species.age() == 2));
        assert_eq!(comm.get_species(1).map(|species| species.len()), Some(2));
        assert!(comm.get_species(3).is_none());
    }
}
