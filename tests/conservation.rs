mod common;

use biotope_core::config::EngineConfig;
use biotope_core::gene::Mutation;
use biotope_core::matrix::Matrix;
use biotope_core::process::ExchangeResourcesProcess;
use biotope_core::Topology;
use biotope_lib::session::Session;
use common::{inert_population, inert_species, total_mass};
use ndarray::{array, Axis};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[test]
fn test_two_cell_diffusion_is_symmetric() {
    let topology = Topology::from_adjacency(vec![vec![1], vec![0]], 1.0).unwrap();
    for k in [0.1, 0.5, 2.0] {
        let alpha = Matrix::from_elem((1, 2), k);
        let flux = topology.flux(&array![[10.0, 4.0]], &alpha).unwrap();
        for dt in [0.01, 0.1, 1.0] {
            let into_one = flux[[0, 1]] * dt;
            let out_of_zero = -flux[[0, 0]] * dt;
            assert!(into_one > 0.0);
            assert!((into_one - out_of_zero).abs() < 1e-12);
        }
    }
}

#[test]
fn test_slower_side_throttles_diffusion() {
    let topology = Topology::from_adjacency(vec![vec![1], vec![0]], 1.0).unwrap();
    let field = array![[10.0, 4.0]];
    let mixed = topology.flux(&field, &array![[1.0, 0.25]]).unwrap();
    let slow = topology.flux(&field, &array![[0.25, 0.25]]).unwrap();
    assert_eq!(mixed, slow);
}

#[test]
fn test_exchange_is_zero_sum_per_cell() {
    let process = ExchangeResourcesProcess::new(vec![0, 1], 2).unwrap();
    let resources = array![[1.0, 9.0, 4.0], [3.0, 0.0, 2.0]];
    let environment = array![[20.0, 6.0], [1.0, 8.0]];
    let targets = array![[5.0, 2.0, 10.0], [1.0, 7.0, 6.0]];
    let locations = [0, 0, 1];
    let shares = array![0.25, 0.75, 1.0];
    let changes = process
        .compute_changes(&resources, &environment, &locations, &shares, &targets)
        .unwrap();

    for cell in 0..2 {
        for row in 0..2 {
            let individuals: f64 = locations
                .iter()
                .enumerate()
                .filter(|(_, c)| **c == cell)
                .map(|(i, _)| changes.individual[[row, i]])
                .sum();
            assert!((individuals + changes.environment[[row, cell]]).abs() < 1e-12);
        }
    }
}

#[test]
fn test_clone_debits_parents_exactly() {
    let population = inert_population(inert_species(0.0, 0.0), &[(12.0, 6.0, 0), (3.0, 0.5, 1)]);
    let original = population.resources().clone();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let cloned = population
        .perform_clone(&[0, 1], &[1, 0], 0.25, 1.0, 1, &Mutation::new(0.0, 0.0).unwrap(), &mut rng)
        .unwrap();

    assert_eq!(cloned.len(), 4);
    for parent in 0..2 {
        for row in 0..2 {
            let child = cloned.resources()[[row, parent + 2]];
            assert_eq!(cloned.resources()[[row, parent]], original[[row, parent]] - child);
        }
    }
    assert_eq!(
        cloned.resources().sum_axis(Axis(1)),
        original.sum_axis(Axis(1))
    );
}

#[test]
fn test_demo_world_conserves_matter() {
    let config = EngineConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let Session {
        engine, mut status, ..
    } = Session::demo(&config, &mut rng).unwrap();
    let masses = engine.molecular_masses().clone();
    let before = total_mass(&status, &masses);

    for step in 1..=40 {
        status = engine.next(status, step as f64 * 0.1, &mut rng).unwrap();
    }
    let after = total_mass(&status, &masses);
    assert!(
        (before - after).abs() < 1e-6 * before,
        "matter drifted from {before} to {after}"
    );
}
