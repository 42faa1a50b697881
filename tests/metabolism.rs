mod common;

use common::{inert_population, inert_species, WorldBuilder};

#[test]
fn test_starving_individual_loses_energy_then_dies() {
    // mass 10, rate 1/8, dt 1/2: exactly 0.625 energy per step
    let population = inert_population(inert_species(0.125, 1.0), &[(10.0, 2.5, 3)]);
    let (engine, mut status, mut rng) = WorldBuilder::new()
        .with_population(population)
        .with_max_time_step(0.5)
        .build();

    let mut energy = 2.5;
    for step in 1..=3 {
        status = engine.next(status, step as f64 * 0.5, &mut rng).unwrap();
        energy -= 0.625;
        let population = &status.populations[0];
        assert_eq!(population.len(), 1, "alive after step {step}");
        assert!((population.resources()[[1, 0]] - energy).abs() < 1e-12);
        assert_eq!(population.resources()[[0, 0]], 10.0);
    }

    status = engine.next(status, 2.0, &mut rng).unwrap();
    assert!(status.populations[0].is_empty());
    // the body goes back to its cell
    assert_eq!(status.environment[[0, 3]], 10.0);
    assert_eq!(status.environment.row(0).sum(), 10.0);
}

#[test]
fn test_energy_never_goes_negative() {
    let population = inert_population(inert_species(10.0, 1.0), &[(10.0, 1.0, 0), (10.0, 500.0, 1)]);
    let (engine, status, mut rng) = WorldBuilder::new().with_population(population).build();
    let status = engine.step(status, 0.5, &mut rng).unwrap();
    // first individual hit zero and died; second paid 50
    let population = &status.populations[0];
    assert_eq!(population.len(), 1);
    assert_eq!(population.locations(), &[1]);
    assert_eq!(population.resources()[[1, 0]], 450.0);
    assert_eq!(status.environment[[1, 0]], 0.0);
}

#[test]
fn test_light_mass_dies_despite_energy() {
    let population = inert_population(inert_species(0.0, 1.0), &[(0.5, 100.0, 2), (2.0, 1.0, 2)]);
    let (engine, status, mut rng) = WorldBuilder::new().with_population(population).build();
    let status = engine.step(status, 0.1, &mut rng).unwrap();
    let population = &status.populations[0];
    assert_eq!(population.len(), 1);
    assert_eq!(population.resources()[[0, 0]], 2.0);
    assert_eq!(status.environment[[0, 2]], 0.5);
    assert_eq!(status.environment[[1, 2]], 100.0);
}
