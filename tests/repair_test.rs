use bson::{doc, oid::ObjectId, Bson};
use docsweep::services::guard::{Clearance, ConfirmationPolicy, Environment, ProductionGuard, Target};
use docsweep::services::inspector::{Inspector, ReferenceCheck};
use docsweep::services::repair::Repairer;
use docsweep::store::memory::MemoryStore;
use docsweep::store::{DocumentStore, Record};
use docsweep::SweepError;

fn clearance() -> Clearance {
    ProductionGuard::new(vec!["prod".to_string()])
        .authorize(
            &Target::new("acme-dev", Environment::Development),
            ConfirmationPolicy::ProductionOnly,
            None,
        )
        .unwrap()
}

fn store() -> MemoryStore {
    MemoryStore::new()
        .with_records(
            "organizations",
            vec![
                Record::new("acme", doc! { "name": "Acme" }),
                Record::new("default-org", doc! { "name": "Default" }),
            ],
        )
        .with_records(
            "users",
            vec![
                Record::new("u1", doc! { "email": "ann@acme.test", "organizationId": "acme" }),
                Record::new("u2", doc! { "email": "bob@gone.test", "organizationId": "gone" }),
                Record::new("u3", doc! { "email": "cy@gone.test", "organizationId": "gone" }),
            ],
        )
}

#[tokio::test]
async fn test_orphans_are_pointed_at_fallback() {
    let store = store();
    let inspection = Inspector::new(&store)
        .inspect("users", &[], Some(&ReferenceCheck::organization()))
        .await
        .unwrap();
    assert_eq!(inspection.orphans.len(), 2);

    let report = Repairer::new(&store)
        .reassign_orphans(&inspection, "default-org", &clearance())
        .await
        .unwrap();

    assert_eq!(report.repaired, vec!["u2", "u3"]);
    assert!(report.skipped.is_empty());

    let u2 = store.get("users", "u2").await.unwrap().unwrap();
    assert_eq!(u2.str_field("organizationId"), Some("default-org"));
    assert_eq!(u2.str_field("email"), Some("bob@gone.test"));

    let again = Inspector::new(&store)
        .inspect("users", &[], Some(&ReferenceCheck::organization()))
        .await
        .unwrap();
    assert!(again.orphans.is_empty());
}

#[tokio::test]
async fn test_missing_fallback_org_is_refused() {
    let store = store();
    let inspection = Inspector::new(&store)
        .inspect("users", &[], Some(&ReferenceCheck::organization()))
        .await
        .unwrap();

    let result = Repairer::new(&store)
        .reassign_orphans(&inspection, "no-such-org", &clearance())
        .await;

    assert!(matches!(
        result,
        Err(SweepError::RecordNotFound { ref collection, ref id })
            if collection == "organizations" && id == "no-such-org"
    ));
    let u2 = store.get("users", "u2").await.unwrap().unwrap();
    assert_eq!(u2.str_field("organizationId"), Some("gone"));
}

#[tokio::test]
async fn test_changed_orphans_are_skipped() {
    let store = store();
    let inspection = Inspector::new(&store)
        .inspect("users", &[], Some(&ReferenceCheck::organization()))
        .await
        .unwrap();

    store
        .set(
            "users",
            &Record::new("u3", doc! { "email": "cy@acme.test", "organizationId": "acme" }),
        )
        .await
        .unwrap();

    let report = Repairer::new(&store)
        .reassign_orphans(&inspection, "default-org", &clearance())
        .await
        .unwrap();

    assert_eq!(report.repaired, vec!["u2"]);
    assert_eq!(report.skipped, vec!["u3"]);
    let u3 = store.get("users", "u3").await.unwrap().unwrap();
    assert_eq!(u3.str_field("organizationId"), Some("acme"));
}

#[tokio::test]
async fn test_padded_orphan_reference_is_repaired() {
    let store = store().with_records(
        "website_configs",
        vec![Record::new("site-1", doc! { "organizationId": "gone " })],
    );
    let inspection = Inspector::new(&store)
        .inspect("website_configs", &[], Some(&ReferenceCheck::organization()))
        .await
        .unwrap();

    let report = Repairer::new(&store)
        .reassign_orphans(&inspection, "default-org", &clearance())
        .await
        .unwrap();

    assert_eq!(report.repaired, vec!["site-1"]);
    assert!(report.skipped.is_empty());
}

#[tokio::test]
async fn test_object_id_orphan_keeps_its_reference_type() {
    let fallback = ObjectId::new();
    let store = MemoryStore::new()
        .with_records(
            "organizations",
            vec![Record::new(fallback.to_hex(), doc! { "name": "Fallback" })],
        )
        .with_records(
            "api_keys",
            vec![Record::new("keys-1", doc! { "organizationId": ObjectId::new() })],
        );
    let inspection = Inspector::new(&store)
        .inspect("api_keys", &[], Some(&ReferenceCheck::organization()))
        .await
        .unwrap();
    assert_eq!(inspection.orphans.len(), 1);

    let report = Repairer::new(&store)
        .reassign_orphans(&inspection, &fallback.to_hex(), &clearance())
        .await
        .unwrap();

    assert_eq!(report.repaired, vec!["keys-1"]);
    let keys = store.get("api_keys", "keys-1").await.unwrap().unwrap();
    assert_eq!(keys.lookup("organizationId"), Some(&Bson::ObjectId(fallback)));
}
