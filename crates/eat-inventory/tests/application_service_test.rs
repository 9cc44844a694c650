//! Application service tests: lifecycle changes and dependency
//! management behind the permission evaluator.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

use eat_core::error::EatError;
use eat_core::models::application::{
    CreateApplication, CreateApplicationDataStoreDependency, Criticality, LifecycleStage,
};
use eat_core::models::role::Role;
use eat_db::repository::{SurrealApplicationRepository, SurrealGrantRepository};
use eat_inventory::{Actor, ApplicationService};

type TestApplicationService =
    ApplicationService<SurrealApplicationRepository<Db>, SurrealGrantRepository<Db>>;

async fn setup() -> TestApplicationService {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    eat_db::run_migrations(&db).await.unwrap();

    ApplicationService::new(
        SurrealApplicationRepository::new(db.clone()),
        SurrealGrantRepository::new(db),
    )
}

fn actor(role: Option<Role>, name: &str) -> Actor {
    Actor {
        user_id: Uuid::new_v4(),
        username: name.into(),
        role,
        ip_address: None,
        user_agent: None,
    }
}

fn payroll() -> CreateApplication {
    CreateApplication {
        name: "Payroll".into(),
        description: "Monthly payroll runs".into(),
        business_purpose: "Pays everyone on time".into(),
        lifecycle_stage: LifecycleStage::Staging,
        criticality: Criticality::High,
        business_owner: "Finance".into(),
        technical_owner: "Platform team".into(),
        primary_server_id: Uuid::new_v4(),
        version: "2.3".into(),
        deployment_path: "/opt/payroll".into(),
        public_visible: true,
        notes: String::new(),
        system_manager_notes: Some("escrow keys in the vault".into()),
    }
}

#[tokio::test]
async fn lifecycle_change_requires_edit_access() {
    let service = setup().await;
    let manager = actor(Some(Role::SystemsManager), "morgan");
    let business = actor(Some(Role::BusinessManager), "blair");

    let app = service.create(&manager, payroll()).await.unwrap();

    let result = service
        .change_lifecycle_stage(
            &business,
            app.id,
            LifecycleStage::Production,
            String::new(),
        )
        .await;
    assert!(matches!(result, Err(EatError::AuthorizationDenied)));

    let moved = service
        .change_lifecycle_stage(
            &manager,
            app.id,
            LifecycleStage::Production,
            "go-live".into(),
        )
        .await
        .unwrap();
    assert_eq!(moved.lifecycle_stage, LifecycleStage::Production);

    let events = service.lifecycle_events(&manager, app.id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].from_stage, Some(LifecycleStage::Staging));
}

#[tokio::test]
async fn dependencies_are_redacted_for_business_viewers() {
    let service = setup().await;
    let manager = actor(Some(Role::SystemsManager), "morgan");
    let business = actor(Some(Role::BusinessUser), "blair");

    let app = service.create(&manager, payroll()).await.unwrap();
    service
        .add_datastore_dependency(
            &manager,
            CreateApplicationDataStoreDependency {
                application_id: app.id,
                datastore_instance_id: Uuid::new_v4(),
                is_primary: true,
                connection_type: "read-write".into(),
                notes: String::new(),
                system_manager_notes: Some("uses the break-glass login".into()),
            },
        )
        .await
        .unwrap();

    let seen = service
        .datastore_dependencies(&business, app.id)
        .await
        .unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].system_manager_notes, None);

    let seen = service
        .datastore_dependencies(&manager, app.id)
        .await
        .unwrap();
    assert!(seen[0].system_manager_notes.is_some());
}

#[tokio::test]
async fn dependency_add_and_remove_require_edit_access() {
    let service = setup().await;
    let manager = actor(Some(Role::SystemsManager), "morgan");
    let tech = actor(Some(Role::Technician), "taylor");

    let app = service.create(&manager, payroll()).await.unwrap();

    let result = service
        .add_datastore_dependency(
            &tech,
            CreateApplicationDataStoreDependency {
                application_id: app.id,
                datastore_instance_id: Uuid::new_v4(),
                is_primary: false,
                connection_type: String::new(),
                notes: String::new(),
                system_manager_notes: None,
            },
        )
        .await;
    assert!(matches!(result, Err(EatError::AuthorizationDenied)));

    let dependency = service
        .add_datastore_dependency(
            &manager,
            CreateApplicationDataStoreDependency {
                application_id: app.id,
                datastore_instance_id: Uuid::new_v4(),
                is_primary: false,
                connection_type: "read-only".into(),
                notes: String::new(),
                system_manager_notes: None,
            },
        )
        .await
        .unwrap();

    // Removing against the wrong application is NotFound, not a
    // silent cross-application delete.
    let other = service.create(&manager, payroll()).await.unwrap();
    let result = service
        .remove_datastore_dependency(&manager, other.id, dependency.id)
        .await;
    assert!(matches!(result, Err(EatError::NotFound { .. })));

    service
        .remove_datastore_dependency(&manager, app.id, dependency.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn redaction_applies_to_application_reads() {
    let service = setup().await;
    let manager = actor(Some(Role::SystemsManager), "morgan");
    let tech = actor(Some(Role::Technician), "taylor");

    let app = service.create(&manager, payroll()).await.unwrap();

    // The technician created nothing and holds no grant; a view grant
    // is not needed for creator/manager paths, so check via manager
    // first, then the redaction boundary through a granted read.
    let seen = service.get(&manager, app.id).await.unwrap();
    assert!(seen.system_manager_notes.is_some());

    // Technicians without any relationship to the record cannot see
    // it at all.
    let result = service.get(&tech, app.id).await;
    assert!(matches!(result, Err(EatError::AuthorizationDenied)));
}
