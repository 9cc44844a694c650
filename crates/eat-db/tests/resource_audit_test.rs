//! Integration tests for tracked-resource CRUD and its audit trail,
//! using in-memory SurrealDB.
//!
//! Covers audit completeness (exactly one entry per mutation, with the
//! right detail shape) and atomicity (a failing audit write rolls the
//! mutation back).

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

use eat_core::models::audit::{AuditAction, AuditFilter};
use eat_core::models::cloud_platform::{CreateCloudPlatform, UpdateCloudPlatform};
use eat_core::models::kind::ResourceKind;
use eat_core::repository::{AuditContext, AuditRepository, Pagination, ResourceRepository};
use eat_db::repository::{SurrealAuditRepository, SurrealCloudPlatformRepository};

async fn setup() -> (
    Surreal<Db>,
    SurrealCloudPlatformRepository<Db>,
    SurrealAuditRepository<Db>,
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    eat_db::run_migrations(&db).await.unwrap();
    (
        db.clone(),
        SurrealCloudPlatformRepository::new(db.clone()),
        SurrealAuditRepository::new(db),
    )
}

fn actor() -> AuditContext {
    AuditContext {
        actor_id: Some(Uuid::new_v4()),
        actor_name: "alice".into(),
        ip_address: Some("10.0.0.1".into()),
        user_agent: Some("eatcmd/0.1".into()),
    }
}

fn aws() -> CreateCloudPlatform {
    CreateCloudPlatform {
        name: "AWS".into(),
        code: "aws".into(),
        description: "Amazon Web Services".into(),
        public_visible: true,
        notes: String::new(),
        system_manager_notes: Some("master account in the vault".into()),
    }
}

async fn entries_for(
    audit: &SurrealAuditRepository<Db>,
    id: Uuid,
) -> Vec<eat_core::models::audit::AuditEntry> {
    audit
        .list(
            AuditFilter {
                resource_kind: Some(ResourceKind::CloudPlatform),
                resource_id: Some(id.to_string()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap()
        .items
}

#[tokio::test]
async fn create_writes_exactly_one_audit_entry_with_snapshot() {
    let (_db, repo, audit) = setup().await;
    let ctx = actor();

    let platform = repo.create(aws(), &ctx).await.unwrap();

    let entries = entries_for(&audit, platform.id).await;
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.action, AuditAction::Create);
    assert_eq!(entry.actor_id, ctx.actor_id);
    assert_eq!(entry.actor_name, "alice");
    assert_eq!(entry.ip_address.as_deref(), Some("10.0.0.1"));
    // CREATE detail is the flat field map of initial values.
    assert_eq!(entry.detail["name"], "AWS");
    assert_eq!(entry.detail["code"], "aws");
}

#[tokio::test]
async fn update_detail_holds_only_changed_fields_as_old_new_pairs() {
    let (_db, repo, audit) = setup().await;
    let ctx = actor();

    let platform = repo.create(aws(), &ctx).await.unwrap();
    repo.update(
        platform.id,
        UpdateCloudPlatform {
            name: Some("Amazon Web Services".into()),
            ..Default::default()
        },
        &ctx,
    )
    .await
    .unwrap();

    let entries = entries_for(&audit, platform.id).await;
    assert_eq!(entries.len(), 2);
    let update = &entries[1];
    assert_eq!(update.action, AuditAction::Update);
    assert_eq!(update.detail["name"]["old"], "AWS");
    assert_eq!(update.detail["name"]["new"], "Amazon Web Services");
    // Unchanged fields are omitted entirely.
    assert!(update.detail.get("code").is_none());
    assert!(update.detail.get("description").is_none());
}

#[tokio::test]
async fn noop_update_writes_nothing() {
    let (_db, repo, audit) = setup().await;
    let ctx = actor();

    let platform = repo.create(aws(), &ctx).await.unwrap();
    let unchanged = repo
        .update(platform.id, UpdateCloudPlatform::default(), &ctx)
        .await
        .unwrap();

    assert_eq!(unchanged.updated_at, platform.updated_at);
    let entries = entries_for(&audit, platform.id).await;
    assert_eq!(entries.len(), 1, "only the CREATE entry should exist");
}

#[tokio::test]
async fn soft_delete_keeps_row_and_records_snapshot() {
    let (_db, repo, audit) = setup().await;
    let ctx = actor();

    let platform = repo.create(aws(), &ctx).await.unwrap();
    repo.soft_delete(platform.id, &ctx).await.unwrap();

    // Row still readable, marked inactive.
    let fetched = repo.get(platform.id).await.unwrap();
    assert!(!fetched.is_active);

    let entries = entries_for(&audit, platform.id).await;
    assert_eq!(entries.len(), 2);
    let delete = &entries[1];
    assert_eq!(delete.action, AuditAction::Delete);
    // DELETE detail is the full pre-deletion snapshot.
    assert_eq!(delete.detail["name"], "AWS");
    assert_eq!(delete.detail["is_active"], true);

    // Deleting again is a no-op — no extra audit entry.
    repo.soft_delete(platform.id, &ctx).await.unwrap();
    assert_eq!(entries_for(&audit, platform.id).await.len(), 2);
}

#[tokio::test]
async fn audit_entries_come_back_in_commit_order() {
    let (_db, repo, audit) = setup().await;
    let ctx = actor();

    let platform = repo.create(aws(), &ctx).await.unwrap();
    repo.update(
        platform.id,
        UpdateCloudPlatform {
            description: Some("primary cloud".into()),
            ..Default::default()
        },
        &ctx,
    )
    .await
    .unwrap();
    repo.soft_delete(platform.id, &ctx).await.unwrap();

    let entries = entries_for(&audit, platform.id).await;
    let actions: Vec<AuditAction> = entries.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![AuditAction::Create, AuditAction::Update, AuditAction::Delete]
    );
    assert!(entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test]
async fn mutation_rolls_back_when_audit_write_fails() {
    let (db, repo, audit) = setup().await;
    let ctx = actor();

    let platform = repo.create(aws(), &ctx).await.unwrap();

    // Simulate an audit-store fault: tighten the action constraint so
    // every subsequent audit append violates the schema.
    db.query(
        "DEFINE FIELD OVERWRITE action ON TABLE audit_log TYPE string \
         ASSERT $value IN ['UNREACHABLE']",
    )
    .await
    .unwrap()
    .check()
    .unwrap();

    let result = repo
        .update(
            platform.id,
            UpdateCloudPlatform {
                name: Some("Altered".into()),
                ..Default::default()
            },
            &ctx,
        )
        .await;
    assert!(result.is_err(), "update must fail when the audit write fails");

    // The mutation must not be observable afterward.
    let fetched = repo.get(platform.id).await.unwrap();
    assert_eq!(fetched.name, "AWS");

    // And no partial audit entry was kept either.
    let entries = entries_for(&audit, platform.id).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::Create);
}
