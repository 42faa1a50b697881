use biotope_core::config::{EngineConfig, EngineSection};
use biotope_lib::session::{rng_for, Session};

fn run(config: &EngineConfig, steps: usize) -> biotope_core::SimulationStatus {
    let mut rng = rng_for(config);
    let Session {
        engine, mut status, ..
    } = Session::demo(config, &mut rng).unwrap();
    for step in 1..=steps {
        status = engine.next(status, step as f64 * 0.1, &mut rng).unwrap();
    }
    status
}

#[test]
fn test_determinism_consistency() {
    let config = EngineConfig {
        engine: EngineSection {
            seed: Some(12345),
            deterministic: true,
            ..Default::default()
        },
        ..Default::default()
    };

    let first = run(&config, 30);
    let second = run(&config, 30);

    assert_eq!(first.time, second.time);
    assert_eq!(
        first.individuals(),
        second.individuals(),
        "Individual counts should match"
    );
    for (a, b) in first.populations.iter().zip(&second.populations) {
        assert_eq!(a.locations(), b.locations(), "Locations should match");
        assert_eq!(a.resources(), b.resources(), "Resources should match");
    }
    assert_eq!(first.environment, second.environment);
}

#[test]
fn test_different_seeds_diverge() {
    let seeded = |seed| EngineConfig {
        engine: EngineSection {
            seed: Some(seed),
            ..Default::default()
        },
        ..Default::default()
    };
    let first = run(&seeded(1), 5);
    let second = run(&seeded(2), 5);
    assert_ne!(first.populations[0].locations(), second.populations[0].locations());
}
