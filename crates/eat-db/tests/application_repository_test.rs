//! Integration tests for the application repository: lifecycle stage
//! tracking and data-store dependencies, using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

use eat_core::error::EatError;
use eat_core::models::application::{
    CreateApplication, CreateApplicationDataStoreDependency, Criticality, LifecycleStage,
    UpdateApplication,
};
use eat_core::models::audit::{AuditAction, AuditFilter};
use eat_core::models::kind::ResourceKind;
use eat_core::repository::{
    ApplicationRepository, AuditContext, AuditRepository, Pagination, ResourceRepository,
};
use eat_db::repository::{SurrealApplicationRepository, SurrealAuditRepository};

async fn setup() -> (
    Surreal<Db>,
    SurrealApplicationRepository<Db>,
    SurrealAuditRepository<Db>,
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    eat_db::run_migrations(&db).await.unwrap();
    (
        db.clone(),
        SurrealApplicationRepository::new(db.clone()),
        SurrealAuditRepository::new(db),
    )
}

fn actor() -> AuditContext {
    AuditContext {
        actor_id: Some(Uuid::new_v4()),
        actor_name: "alice".into(),
        ip_address: None,
        user_agent: None,
    }
}

fn payroll(server_id: Uuid) -> CreateApplication {
    CreateApplication {
        name: "Payroll".into(),
        description: "Monthly payroll runs".into(),
        business_purpose: "Pays everyone on time".into(),
        lifecycle_stage: LifecycleStage::Development,
        criticality: Criticality::High,
        business_owner: "Finance".into(),
        technical_owner: "Platform team".into(),
        primary_server_id: server_id,
        version: "2.3".into(),
        deployment_path: "/opt/payroll".into(),
        public_visible: true,
        notes: String::new(),
        system_manager_notes: None,
    }
}

#[tokio::test]
async fn change_lifecycle_stage_records_event_and_audit_entry() {
    let (_db, repo, audit) = setup().await;
    let ctx = actor();

    let app = repo.create(payroll(Uuid::new_v4()), &ctx).await.unwrap();
    let moved = repo
        .change_lifecycle_stage(
            app.id,
            LifecycleStage::Production,
            "go-live approved".into(),
            &ctx,
        )
        .await
        .unwrap();
    assert_eq!(moved.lifecycle_stage, LifecycleStage::Production);

    let events = repo.list_lifecycle_events(app.id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].from_stage, Some(LifecycleStage::Development));
    assert_eq!(events[0].to_stage, LifecycleStage::Production);
    assert_eq!(events[0].notes, "go-live approved");

    let entries = audit
        .list(
            AuditFilter {
                resource_kind: Some(ResourceKind::Application),
                resource_id: Some(app.id.to_string()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap()
        .items;
    assert_eq!(entries.len(), 2);
    let update = &entries[1];
    assert_eq!(update.action, AuditAction::Update);
    assert_eq!(update.detail["lifecycle_stage"]["old"], "development");
    assert_eq!(update.detail["lifecycle_stage"]["new"], "production");
}

#[tokio::test]
async fn changing_to_the_same_stage_is_a_noop() {
    let (_db, repo, _audit) = setup().await;
    let ctx = actor();

    let app = repo.create(payroll(Uuid::new_v4()), &ctx).await.unwrap();
    repo.change_lifecycle_stage(app.id, LifecycleStage::Development, String::new(), &ctx)
        .await
        .unwrap();

    assert!(repo.list_lifecycle_events(app.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn ordinary_update_that_moves_the_stage_also_records_an_event() {
    let (_db, repo, _audit) = setup().await;
    let ctx = actor();

    let app = repo.create(payroll(Uuid::new_v4()), &ctx).await.unwrap();
    repo.update(
        app.id,
        UpdateApplication {
            lifecycle_stage: Some(LifecycleStage::Testing),
            version: Some("2.4".into()),
            ..Default::default()
        },
        &ctx,
    )
    .await
    .unwrap();

    let events = repo.list_lifecycle_events(app.id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].to_stage, LifecycleStage::Testing);
}

#[tokio::test]
async fn dependencies_add_list_remove_with_audit() {
    let (_db, repo, audit) = setup().await;
    let ctx = actor();

    let app = repo.create(payroll(Uuid::new_v4()), &ctx).await.unwrap();
    let instance_id = Uuid::new_v4();

    let dependency = repo
        .add_datastore_dependency(
            CreateApplicationDataStoreDependency {
                application_id: app.id,
                datastore_instance_id: instance_id,
                is_primary: true,
                connection_type: "read-write".into(),
                notes: String::new(),
                system_manager_notes: None,
            },
            &ctx,
        )
        .await
        .unwrap();

    let listed = repo.list_datastore_dependencies(app.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].datastore_instance_id, instance_id);
    assert!(listed[0].is_primary);

    repo.remove_datastore_dependency(dependency.id, &ctx)
        .await
        .unwrap();
    assert!(repo.list_datastore_dependencies(app.id).await.unwrap().is_empty());

    let entries = audit
        .list(
            AuditFilter {
                resource_kind: Some(ResourceKind::ApplicationDataStoreDependency),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap()
        .items;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].action, AuditAction::Create);
    assert_eq!(entries[1].action, AuditAction::Delete);
    // The DELETE snapshot preserves the link for forensics.
    assert_eq!(
        entries[1].detail["datastore_instance_id"],
        instance_id.to_string()
    );
}

#[tokio::test]
async fn soft_deleted_application_takes_no_new_dependencies() {
    let (_db, repo, _audit) = setup().await;
    let ctx = actor();

    let app = repo.create(payroll(Uuid::new_v4()), &ctx).await.unwrap();
    repo.soft_delete(app.id, &ctx).await.unwrap();

    let result = repo
        .add_datastore_dependency(
            CreateApplicationDataStoreDependency {
                application_id: app.id,
                datastore_instance_id: Uuid::new_v4(),
                is_primary: false,
                connection_type: String::new(),
                notes: String::new(),
                system_manager_notes: None,
            },
            &ctx,
        )
        .await;
    assert!(matches!(result, Err(EatError::NotFound { .. })));
}
