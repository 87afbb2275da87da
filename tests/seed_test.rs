use docsweep::modules::api_key::model::ApiKeyDocument;
use docsweep::modules::crud::Crud;
use docsweep::modules::user::model::User;
use docsweep::services::guard::{
    Clearance, Confirmation, ConfirmationPolicy, Environment, ProductionGuard, Target,
};
use docsweep::services::inspector::{Inspector, ReferenceCheck};
use docsweep::services::seed::{SeedPlan, Seeder};
use docsweep::store::memory::MemoryStore;
use docsweep::SweepError;

const PROJECT: &str = "acme-dev";

fn guard() -> ProductionGuard {
    ProductionGuard::new(vec!["prod".to_string()])
}

fn target() -> Target {
    Target::new(PROJECT, Environment::Development)
}

fn unconfirmed() -> Clearance {
    guard()
        .authorize(&target(), ConfirmationPolicy::ProductionOnly, None)
        .unwrap()
}

fn confirmed() -> Clearance {
    let confirmation: Confirmation = "development:acme-dev".parse().unwrap();
    guard()
        .authorize(&target(), ConfirmationPolicy::Always, Some(&confirmation))
        .unwrap()
}

fn emails() -> Vec<String> {
    vec!["ann@acme.test".to_string(), "bob@acme.test".to_string()]
}

#[tokio::test]
async fn test_seed_requires_explicit_confirmation() {
    let store = MemoryStore::new();
    let plan = SeedPlan::demo("demo-org", "Demo Org", &emails());

    let result = Seeder::new(&store).seed(&plan, &unconfirmed()).await;

    assert!(matches!(result, Err(SweepError::ConfirmationRequired { .. })));
    assert_eq!(store.len("organizations").await, 0);
}

#[tokio::test]
async fn test_seed_writes_linked_documents_in_order() {
    let store = MemoryStore::new();
    let plan = SeedPlan::demo("demo-org", "Demo Org", &emails());

    let report = Seeder::new(&store).seed(&plan, &confirmed()).await.unwrap();

    let collections: Vec<&str> = report.written.iter().map(|(c, _)| c.as_str()).collect();
    assert_eq!(
        collections,
        vec!["organizations", "users", "users", "api_keys", "website_configs"]
    );
    assert_eq!(store.ids("users").await, vec!["demo-org-user-1", "demo-org-user-2"]);

    let admin = Crud::<_, User>::new(&store)
        .find_by_id("demo-org-user-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.role, "admin");
    assert_eq!(admin.display_name, "ann");
}

#[tokio::test]
async fn test_seeded_keys_are_placeholder_references() {
    let store = MemoryStore::new();
    let plan = SeedPlan::demo("demo-org", "Demo Org", &emails());
    Seeder::new(&store).seed(&plan, &confirmed()).await.unwrap();

    let keys = Crud::<_, ApiKeyDocument>::new(&store)
        .find_by_id("demo-org-keys")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(keys.providers.len(), 2);
    assert!(keys.providers.values().all(|k| k.key_ref.starts_with("demo-")));
}

#[tokio::test]
async fn test_seeded_data_has_no_orphans() {
    let store = MemoryStore::new();
    let plan = SeedPlan::demo("demo-org", "Demo Org", &emails());
    Seeder::new(&store).seed(&plan, &confirmed()).await.unwrap();

    let check = ReferenceCheck::organization();
    let inspector = Inspector::new(&store);
    for collection in ["users", "api_keys", "website_configs"] {
        let report = inspector.inspect(collection, &[], Some(&check)).await.unwrap();
        assert!(report.orphans.is_empty(), "{} has orphans", collection);
        assert!(report.scanned() > 0);
    }
}

#[tokio::test]
async fn test_invalid_plan_writes_nothing() {
    let store = MemoryStore::new();
    let plan = SeedPlan::demo(
        "demo-org",
        "Demo Org",
        &["ann@acme.test".to_string(), "not-an-email".to_string()],
    );

    let result = Seeder::new(&store).seed(&plan, &confirmed()).await;

    assert!(matches!(result, Err(SweepError::Validation(_))));
    assert_eq!(store.len("organizations").await, 0);
    assert_eq!(store.len("users").await, 0);
}

#[test]
fn test_plan_with_stray_reference_is_rejected() {
    let mut plan = SeedPlan::demo("demo-org", "Demo Org", &emails());
    plan.users[1].organization_id = "elsewhere".to_string();

    match plan.validate() {
        Err(SweepError::Config(message)) => assert!(message.contains("elsewhere")),
        other => panic!("expected config error, got {:?}", other),
    }
}
