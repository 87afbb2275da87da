use docsweep::services::guard::{
    Confirmation, ConfirmationPolicy, Environment, ProductionGuard, Target,
};
use docsweep::SweepError;

fn guard() -> ProductionGuard {
    ProductionGuard::new(vec!["prod".to_string(), "live".to_string()])
}

#[test]
fn test_development_target_needs_no_confirmation() {
    let target = Target::new("acme-dev", Environment::Development);

    let clearance = guard()
        .authorize(&target, ConfirmationPolicy::ProductionOnly, None)
        .unwrap();

    assert!(!clearance.is_confirmed());
    assert_eq!(clearance.target(), &target);
}

#[test]
fn test_production_target_requires_confirmation() {
    let target = Target::new("acme", Environment::Production);

    let result = guard().authorize(&target, ConfirmationPolicy::ProductionOnly, None);

    match result {
        Err(SweepError::ConfirmationRequired { target }) => {
            assert_eq!(target, "production:acme")
        }
        other => panic!("expected ConfirmationRequired, got {:?}", other),
    }
}

#[test]
fn test_matching_confirmation_is_accepted() {
    let target = Target::new("acme", Environment::Production);
    let confirmation: Confirmation = "production:acme".parse().unwrap();

    let clearance = guard()
        .authorize(&target, ConfirmationPolicy::ProductionOnly, Some(&confirmation))
        .unwrap();

    assert!(clearance.is_confirmed());
}

#[test]
fn test_wrong_project_is_rejected() {
    let target = Target::new("acme", Environment::Production);
    let confirmation: Confirmation = "production:acme-staging".parse().unwrap();

    let result = guard().authorize(&target, ConfirmationPolicy::ProductionOnly, Some(&confirmation));

    assert!(matches!(result, Err(SweepError::ConfirmationMismatch { .. })));
}

#[test]
fn test_production_looking_project_overrides_configured_environment() {
    let target = Target::new("acme-prod-eu", Environment::Development);
    let g = guard();

    assert!(g.is_production(&target));
    assert_eq!(g.effective_environment(&target), Environment::Production);

    let dev_claim: Confirmation = "development:acme-prod-eu".parse().unwrap();
    let result = g.authorize(&target, ConfirmationPolicy::ProductionOnly, Some(&dev_claim));
    assert!(matches!(result, Err(SweepError::ConfirmationMismatch { .. })));

    let prod_claim: Confirmation = "production:acme-prod-eu".parse().unwrap();
    let clearance = g
        .authorize(&target, ConfirmationPolicy::ProductionOnly, Some(&prod_claim))
        .unwrap();
    assert_eq!(clearance.target().environment, Environment::Production);
}

#[test]
fn test_pattern_match_is_case_insensitive() {
    let target = Target::new("ACME-LIVE", Environment::Staging);
    assert!(guard().is_production(&target));
}

#[test]
fn test_always_policy_requires_confirmation_in_development() {
    let target = Target::new("acme-dev", Environment::Development);
    let g = guard();

    assert!(matches!(
        g.authorize(&target, ConfirmationPolicy::Always, None),
        Err(SweepError::ConfirmationRequired { .. })
    ));

    let confirmation: Confirmation = "dev:acme-dev".parse().unwrap();
    let clearance = g
        .authorize(&target, ConfirmationPolicy::Always, Some(&confirmation))
        .unwrap();
    assert!(clearance.is_confirmed());
}

#[test]
fn test_confirmation_parsing() {
    let parsed: Confirmation = " prod : acme ".parse().unwrap();
    assert_eq!(parsed.environment, Environment::Production);
    assert_eq!(parsed.project_id, "acme");

    assert!("acme".parse::<Confirmation>().is_err());
    assert!("production:".parse::<Confirmation>().is_err());
    assert!("qa:acme".parse::<Confirmation>().is_err());
}

#[test]
fn test_environment_display_round_trips_aliases() {
    for (raw, expected) in [
        ("dev", Environment::Development),
        ("Staging", Environment::Staging),
        ("PRODUCTION", Environment::Production),
    ] {
        let env: Environment = raw.parse().unwrap();
        assert_eq!(env, expected);
        assert_eq!(env.to_string().parse::<Environment>().unwrap(), expected);
    }
}
