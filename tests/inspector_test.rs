use bson::{doc, oid::ObjectId};
use docsweep::services::inspector::{project, Inspector, Orphan, ReferenceCheck, ORGANIZATIONS};
use docsweep::store::memory::MemoryStore;
use docsweep::store::Record;

fn setup_store() -> MemoryStore {
    MemoryStore::new()
        .with_records(
            ORGANIZATIONS,
            vec![
                Record::new("acme", doc! { "name": "Acme", "status": "active" }),
                Record::new("globex", doc! { "name": "Globex" }),
            ],
        )
        .with_records(
            "users",
            vec![
                Record::new("u1", doc! { "email": "ann@acme.test", "organizationId": "acme" }),
                Record::new("u2", doc! { "email": "bob@gone.test", "organizationId": "initech" }),
                Record::new("u3", doc! { "email": "cy@nowhere.test" }),
                Record::new("u4", doc! { "email": "di@blank.test", "organizationId": "" }),
            ],
        )
}

#[tokio::test]
async fn test_flags_references_to_missing_organizations() {
    let store = setup_store();

    let report = Inspector::new(&store)
        .inspect("users", &["email"], Some(&ReferenceCheck::organization()))
        .await
        .unwrap();

    assert_eq!(report.scanned(), 4);
    assert_eq!(
        report.orphans,
        vec![Orphan {
            id: "u2".to_string(),
            field: "organizationId".to_string(),
            missing: "initech".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_no_reference_check_means_no_orphans() {
    let store = setup_store();

    let report = Inspector::new(&store)
        .inspect("users", &["email", "organizationId"], None)
        .await
        .unwrap();

    assert!(report.orphans.is_empty());
    assert_eq!(
        report.lines[2],
        "u3 | email=cy@nowhere.test | organizationId=N/A"
    );
}

#[tokio::test]
async fn test_self_referencing_collection() {
    let store = MemoryStore::new().with_records(
        "teams",
        vec![
            Record::new("root", doc! { "name": "Root" }),
            Record::new("child", doc! { "name": "Child", "parentId": "root" }),
            Record::new("stray", doc! { "name": "Stray", "parentId": "deleted" }),
        ],
    );

    let report = Inspector::new(&store)
        .inspect("teams", &["name"], Some(&ReferenceCheck::new("parentId", "teams")))
        .await
        .unwrap();

    assert_eq!(report.orphans.len(), 1);
    assert_eq!(report.orphans[0].id, "stray");
}

#[tokio::test]
async fn test_inspection_does_not_modify_the_store() {
    let store = setup_store();

    Inspector::new(&store)
        .inspect("users", &[], Some(&ReferenceCheck::organization()))
        .await
        .unwrap();

    assert_eq!(store.len("users").await, 4);
    assert_eq!(store.batch_calls(), 0);
}

#[test]
fn test_projection_hides_credential_values() {
    let record = Record::new(
        "keys-1",
        doc! {
            "organizationId": "acme",
            "providers": { "openai": { "apiKey": "sk-live-123" } },
        },
    );

    let line = project(&record, &["organizationId", "providers", "label"]);

    assert_eq!(line, "keys-1 | organizationId=acme | providers={openai} | label=N/A");
    assert!(!line.contains("sk-live"));
}

#[tokio::test]
async fn test_object_id_references_are_checked() {
    let existing = ObjectId::new();
    let missing = ObjectId::new();
    let store = MemoryStore::new()
        .with_records(
            ORGANIZATIONS,
            vec![Record::new(existing.to_hex(), doc! { "name": "Acme" })],
        )
        .with_records(
            "api_keys",
            vec![
                Record::new("keys-1", doc! { "organizationId": existing }),
                Record::new("keys-2", doc! { "organizationId": missing }),
            ],
        );

    let report = Inspector::new(&store)
        .inspect("api_keys", &[], Some(&ReferenceCheck::organization()))
        .await
        .unwrap();

    assert_eq!(
        report.orphans,
        vec![Orphan {
            id: "keys-2".to_string(),
            field: "organizationId".to_string(),
            missing: missing.to_hex(),
        }]
    );
}

#[tokio::test]
async fn test_padded_reference_is_compared_as_stored() {
    let store = setup_store().with_records(
        "website_configs",
        vec![
            Record::new("site-1", doc! { "organizationId": " acme" }),
            Record::new("site-2", doc! { "organizationId": "acme" }),
        ],
    );

    let report = Inspector::new(&store)
        .inspect("website_configs", &[], Some(&ReferenceCheck::organization()))
        .await
        .unwrap();

    assert_eq!(report.orphans.len(), 1);
    assert_eq!(report.orphans[0].id, "site-1");
    assert_eq!(report.orphans[0].missing, " acme");
}
