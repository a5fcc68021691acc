use bubblepack::core::domain::{
    AdaptiveOptions, EvolutionOptions, EvolutionSettings, RangeOptions,
};
use bubblepack::core::rng::RandomSource;
use bubblepack::engine::coordinator::EvolutionCoordinator;
use bubblepack::engine::error::EvolutionError;
use bubblepack::engine::operators::{
    breed_with, Adaptive, BreedPolicy, Offspring, RangeConstrained, Standard,
    MAX_MUTATIONS_PER_TRIAL, MAX_TRIALS,
};
use crate::common::{quiet_options, Tracer};

mod common;

fn parents() -> Vec<Tracer> {
    vec![Tracer::new(0.0, 1.0), Tracer::new(10.0, 1.0), Tracer::new(20.0, 1.0)]
}

fn range_options(min: f64, max: f64, num_children: usize) -> RangeOptions {
    RangeOptions {
        base: EvolutionOptions {
            num_children,
            ..quiet_options(10, 2)
        },
        min_magnitude: min,
        max_magnitude: max,
    }
}

#[test]
fn test_generation_shape() {
    let mut rng = RandomSource::new(1);
    let mut kinds = Vec::new();
    let generation = breed_with(&parents(), 6, &mut rng, |pheno, kind, _| {
        kinds.push(kind);
        Ok(pheno)
    })
    .expect("breeding succeeds");

    assert_eq!(generation.len(), 6);
    assert_eq!(
        kinds,
        vec![
            Offspring::Elite,
            Offspring::Crossed,
            Offspring::Crossed,
            Offspring::Clone,
            Offspring::Clone,
            Offspring::Clone,
        ]
    );
    // crossed children mix the elite with each runner-up in turn
    assert_eq!(generation[1].value, 5.0);
    assert_eq!(generation[2].value, 10.0);
}

#[test]
fn test_generation_never_smaller_than_parents() {
    let mut rng = RandomSource::new(1);
    let generation = breed_with(&parents(), 1, &mut rng, |p, _, _| Ok(p)).expect("breeds");
    assert_eq!(generation.len(), 3);
}

#[test]
fn test_standard_mutates_all_but_elite() {
    let mut rng = RandomSource::new(3);
    let coordinator = EvolutionCoordinator::new(10);
    let opts = EvolutionOptions {
        num_children: 5,
        ..quiet_options(10, 3)
    };
    let generation = Standard
        .breed(&parents(), &mut rng, &coordinator, &opts)
        .expect("breeds");

    assert_eq!(generation.len(), 5);
    assert_eq!(generation[0], Tracer::new(0.0, 1.0));
    assert_eq!(generation[1].value, 6.0);
    assert_eq!(generation[2].value, 11.0);
    for clone in &generation[3..] {
        assert_eq!(clone.value, 1.0);
        assert_eq!(clone.mutations, 1);
        assert_eq!(clone.crossovers, 0);
    }
}

#[test]
fn test_empty_parents_is_an_error() {
    let mut rng = RandomSource::new(0);
    let coordinator = EvolutionCoordinator::new(10);
    let empty: Vec<Tracer> = Vec::new();

    assert_eq!(
        Standard
            .breed(&empty, &mut rng, &coordinator, &quiet_options(10, 1))
            .unwrap_err(),
        EvolutionError::NoParents
    );
    assert_eq!(
        RangeConstrained
            .breed(&empty, &mut rng, &coordinator, &range_options(0.0, 1.0, 5))
            .unwrap_err(),
        EvolutionError::NoParents
    );
    assert_eq!(
        Adaptive
            .breed(&empty, &mut rng, &coordinator, &AdaptiveOptions::default())
            .unwrap_err(),
        EvolutionError::NoParents
    );
}

#[test]
fn test_range_repairs_every_member() {
    let mut rng = RandomSource::new(5);
    let coordinator = EvolutionCoordinator::new(10);
    let parents = vec![Tracer::new(0.0, 1.0), Tracer::new(4.0, 1.0)];
    let opts = range_options(2.0, 1e6, 6);

    let generation = RangeConstrained
        .breed(&parents, &mut rng, &coordinator, &opts)
        .expect("breeds");

    assert_eq!(generation.len(), 6);
    for member in &generation {
        assert!(member.value >= 2.0 && member.value <= 1e6, "{}", member);
    }
    // the out-of-range elite is walked up to the lower bound
    assert_eq!(generation[0].value, 2.0);
    assert_eq!(generation[0].mutations, 2);
    // the crossed child lands in range after its regular mutation
    assert_eq!(generation[1].value, 3.0);
    assert_eq!(generation[1].mutations, 1);
}

#[test]
fn test_range_keeps_in_range_elite_untouched() {
    let mut rng = RandomSource::new(5);
    let coordinator = EvolutionCoordinator::new(10);
    let parents = vec![Tracer::new(3.0, 1.0)];
    let generation = RangeConstrained
        .breed(&parents, &mut rng, &coordinator, &range_options(2.0, 10.0, 3))
        .expect("breeds");
    assert_eq!(generation[0], Tracer::new(3.0, 1.0));
    assert_eq!(generation[1].value, 4.0);
}

#[test]
fn test_range_gives_up_when_unreachable() {
    let mut rng = RandomSource::new(5);
    let coordinator = EvolutionCoordinator::new(10);
    // a zero step can never leave magnitude 5
    let parents = vec![Tracer::new(5.0, 0.0)];
    let err = RangeConstrained
        .breed(&parents, &mut rng, &coordinator, &range_options(0.0, 1.0, 3))
        .unwrap_err();
    assert_eq!(
        err,
        EvolutionError::MagnitudeUnreachable {
            min: 0.0,
            max: 1.0,
            attempts: MAX_TRIALS * MAX_MUTATIONS_PER_TRIAL,
        }
    );
}

#[test]
fn test_adaptive_intensity_follows_improvement() {
    let opts = AdaptiveOptions {
        max_num_mutations: 1000,
        ..Default::default()
    };
    let mut coordinator = EvolutionCoordinator::new(10);
    assert_eq!(Adaptive::intensity(&coordinator, &opts), 1000);

    coordinator.record(1.0);
    coordinator.record(2.0);
    // factor 0.01 / 2
    assert_eq!(Adaptive::intensity(&coordinator, &opts), 5);
}

#[test]
fn test_adaptive_mutates_only_clones() {
    let mut rng = RandomSource::new(9);
    let mut coordinator = EvolutionCoordinator::new(10);
    coordinator.record(1.0);
    coordinator.record(2.0);
    let opts = AdaptiveOptions {
        base: EvolutionOptions {
            num_children: 5,
            ..quiet_options(10, 3)
        },
        max_num_mutations: 1000,
    };

    let generation = Adaptive
        .breed(&parents(), &mut rng, &coordinator, &opts)
        .expect("breeds");

    assert_eq!(generation[0].mutations, 0);
    assert_eq!(generation[1].mutations, 0);
    assert_eq!(generation[1].crossovers, 1);
    assert_eq!(generation[2].mutations, 0);
    for clone in &generation[3..] {
        assert_eq!(clone.mutations, 6);
        assert_eq!(clone.value, 6.0);
    }
}

#[test]
fn test_options_validation() {
    assert!(EvolutionOptions::default().validate().is_ok());
    assert!(AdaptiveOptions::default().validate().is_ok());
    assert!(RangeOptions::default().validate().is_ok());

    for broken in [quiet_options(0, 2), quiet_options(10, 0)] {
        assert!(matches!(
            broken.validate(),
            Err(EvolutionError::InvalidOptions(_))
        ));
    }

    let nan_bounds = range_options(f64::NAN, 1.0, 5);
    assert!(nan_bounds.validate().is_err());
    let inverted = range_options(2.0, 1.0, 5);
    assert!(inverted.validate().is_err());
}
