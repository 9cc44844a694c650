//! End-to-end permission flow tests: evaluate → mutate with audit →
//! redact, against in-memory SurrealDB.

use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

use eat_core::error::EatError;
use eat_core::models::grant::GrantKind;
use eat_core::models::kind::ResourceKind;
use eat_core::models::role::Role;
use eat_core::models::server_environment::{
    CreateServerEnvironment, EnvironmentType, UpdateServerEnvironment,
};
use eat_core::repository::{GrantRepository, Pagination, ResourceRepository};
use eat_db::repository::{
    SurrealAuditRepository, SurrealGrantRepository, SurrealServerEnvironmentRepository,
    SurrealUserProfileRepository,
};
use eat_inventory::admin::GrantRequest;
use eat_inventory::{Actor, AdminService, ResourceService};

type ServerService =
    ResourceService<
        eat_core::models::server_environment::ServerEnvironment,
        SurrealServerEnvironmentRepository<Db>,
        SurrealGrantRepository<Db>,
    >;

type TestAdminService = AdminService<
    SurrealUserProfileRepository<Db>,
    SurrealGrantRepository<Db>,
    SurrealAuditRepository<Db>,
>;

async fn setup() -> (Surreal<Db>, ServerService, TestAdminService) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    eat_db::run_migrations(&db).await.unwrap();

    let service = ResourceService::new(
        SurrealServerEnvironmentRepository::new(db.clone()),
        SurrealGrantRepository::new(db.clone()),
    );
    let admin_service = AdminService::new(
        SurrealUserProfileRepository::new(db.clone()),
        SurrealGrantRepository::new(db.clone()),
        SurrealAuditRepository::new(db.clone()),
    );
    (db, service, admin_service)
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

fn server(name: &str, public_visible: bool) -> CreateServerEnvironment {
    CreateServerEnvironment {
        name: name.into(),
        hostname: format!("{name}.internal"),
        ip_address: "192.0.2.10".into(),
        environment_type: EnvironmentType::Virtual,
        operating_system: "Debian".into(),
        os_version: "13".into(),
        cloud_platform_id: None,
        cloud_instance_id: None,
        cloud_region: None,
        cpu_cores: Some(8),
        memory_gb: Some(32),
        storage_gb: Some(500),
        public_visible,
        notes: String::new(),
        system_manager_notes: Some("secret".into()),
    }
}

#[tokio::test]
async fn technician_cannot_edit_a_foreign_record_without_a_grant() {
    let (_db, service, _admin) = setup().await;
    let manager = actor(Some(Role::SystemsManager), "morgan");
    let tech = actor(Some(Role::Technician), "taylor");

    let record = service.create(&manager, server("db-42", true)).await.unwrap();

    let result = service
        .update(
            &tech,
            record.id,
            UpdateServerEnvironment {
                notes: Some("swapped the PSU".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(EatError::AuthorizationDenied)));
}

#[tokio::test]
async fn edit_grant_allows_until_it_expires() {
    let (_db, service, admin) = setup().await;
    let manager = actor(Some(Role::SystemsManager), "morgan");
    let tech = actor(Some(Role::Technician), "taylor");

    let record = service.create(&manager, server("db-42", true)).await.unwrap();

    // Grant edit for an hour — the same update now succeeds.
    admin
        .grant(
            &manager,
            GrantRequest {
                user_id: tech.user_id,
                resource_kind: ResourceKind::ServerEnvironment,
                resource_id: record.id,
                kind: GrantKind::Edit,
                expires_at: Some(Utc::now() + Duration::hours(1)),
                notes: String::new(),
            },
        )
        .await
        .unwrap();

    service
        .update(
            &tech,
            record.id,
            UpdateServerEnvironment {
                notes: Some("swapped the PSU".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // Re-grant with an expiry already in the past — back to deny.
    admin
        .grant(
            &manager,
            GrantRequest {
                user_id: tech.user_id,
                resource_kind: ResourceKind::ServerEnvironment,
                resource_id: record.id,
                kind: GrantKind::Edit,
                expires_at: Some(Utc::now() - Duration::seconds(1)),
                notes: String::new(),
            },
        )
        .await
        .unwrap();

    let result = service
        .update(
            &tech,
            record.id,
            UpdateServerEnvironment {
                notes: Some("one more thing".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(EatError::AuthorizationDenied)));
}

#[tokio::test]
async fn technician_edits_own_record_without_any_grant() {
    let (db, service, _admin) = setup().await;
    let tech = actor(Some(Role::Technician), "taylor");

    // Seed a record created by the technician (role assignments can
    // change after records are created).
    let repo = SurrealServerEnvironmentRepository::new(db);
    let record = repo
        .create(server("own-box", true), &tech.audit_context())
        .await
        .unwrap();

    service
        .update(
            &tech,
            record.id,
            UpdateServerEnvironment {
                notes: Some("my machine".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn restricted_notes_are_redacted_by_role() {
    let (_db, service, _admin) = setup().await;
    let manager = actor(Some(Role::SystemsManager), "morgan");
    let business = actor(Some(Role::BusinessUser), "blair");

    let record = service.create(&manager, server("db-42", true)).await.unwrap();

    // Scenario: business viewer loses the restricted attribute.
    let seen = service.get(&business, record.id).await.unwrap();
    assert_eq!(seen.system_manager_notes, None);
    assert_eq!(seen.hostname, "db-42.internal");

    // Systems manager sees it unchanged.
    let seen = service.get(&manager, record.id).await.unwrap();
    assert_eq!(seen.system_manager_notes.as_deref(), Some("secret"));
}

#[tokio::test]
async fn business_roles_see_only_public_or_granted_records() {
    let (_db, service, admin) = setup().await;
    let manager = actor(Some(Role::SystemsManager), "morgan");
    let business = actor(Some(Role::BusinessManager), "blair");

    let hidden = service.create(&manager, server("vault", false)).await.unwrap();
    let public = service.create(&manager, server("wiki", true)).await.unwrap();

    assert!(matches!(
        service.get(&business, hidden.id).await,
        Err(EatError::AuthorizationDenied)
    ));
    service.get(&business, public.id).await.unwrap();

    // Listing filters the hidden record out.
    let page = service.list(&business, Pagination::default()).await.unwrap();
    let hostnames: Vec<_> = page.items.iter().map(|s| s.hostname.as_str()).collect();
    assert_eq!(hostnames, vec!["wiki.internal"]);

    // A view grant opens the hidden record.
    admin
        .grant(
            &manager,
            GrantRequest {
                user_id: business.user_id,
                resource_kind: ResourceKind::ServerEnvironment,
                resource_id: hidden.id,
                kind: GrantKind::View,
                expires_at: None,
                notes: String::new(),
            },
        )
        .await
        .unwrap();
    service.get(&business, hidden.id).await.unwrap();
}

#[tokio::test]
async fn create_and_delete_are_level_gated() {
    let (_db, service, _admin) = setup().await;
    let manager = actor(Some(Role::SystemsManager), "morgan");
    let tech = actor(Some(Role::Technician), "taylor");
    let business = actor(Some(Role::BusinessUser), "blair");

    assert!(matches!(
        service.create(&tech, server("nope", true)).await,
        Err(EatError::AuthorizationDenied)
    ));
    assert!(matches!(
        service.create(&business, server("nope", true)).await,
        Err(EatError::AuthorizationDenied)
    ));

    let record = service.create(&manager, server("db-42", true)).await.unwrap();
    assert!(matches!(
        service.delete(&tech, record.id).await,
        Err(EatError::AuthorizationDenied)
    ));
    service.delete(&manager, record.id).await.unwrap();
}

#[tokio::test]
async fn unknown_role_fails_closed_everywhere() {
    let (_db, service, _admin) = setup().await;
    let manager = actor(Some(Role::SystemsManager), "morgan");
    let ghost = actor(None, "ghost");

    let record = service.create(&manager, server("db-42", true)).await.unwrap();

    assert!(matches!(
        service.get(&ghost, record.id).await,
        Err(EatError::AuthorizationDenied)
    ));
    assert!(matches!(
        service.list(&ghost, Pagination::default()).await,
        Err(EatError::AuthorizationDenied)
    ));
    assert!(matches!(
        service.create(&ghost, server("nope", true)).await,
        Err(EatError::AuthorizationDenied)
    ));
}

#[tokio::test]
async fn grant_then_revoke_round_trip() {
    let (db, _service, admin) = setup().await;
    let manager = actor(Some(Role::ApplicationAdmin), "avery");
    let user = Uuid::new_v4();
    let app = Uuid::new_v4();

    admin
        .grant(
            &manager,
            GrantRequest {
                user_id: user,
                resource_kind: ResourceKind::Application,
                resource_id: app,
                kind: GrantKind::View,
                expires_at: None,
                notes: String::new(),
            },
        )
        .await
        .unwrap();

    let grants = SurrealGrantRepository::new(db.clone());
    assert!(
        grants
            .has_grant(user, ResourceKind::Application, app, GrantKind::View)
            .await
            .unwrap()
    );

    admin
        .revoke(&manager, user, ResourceKind::Application, app, GrantKind::View)
        .await
        .unwrap();
    assert!(
        !grants
            .has_grant(user, ResourceKind::Application, app, GrantKind::View)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn grant_management_and_audit_reads_are_gated() {
    let (_db, _service, admin) = setup().await;
    let tech = actor(Some(Role::Technician), "taylor");
    let manager = actor(Some(Role::SystemsManager), "morgan");

    // Technicians may neither issue grants nor read the audit log.
    let result = admin
        .grant(
            &tech,
            GrantRequest {
                user_id: Uuid::new_v4(),
                resource_kind: ResourceKind::Application,
                resource_id: Uuid::new_v4(),
                kind: GrantKind::View,
                expires_at: None,
                notes: String::new(),
            },
        )
        .await;
    assert!(matches!(result, Err(EatError::AuthorizationDenied)));

    let result = admin
        .audit_log(&tech, Default::default(), Pagination::default())
        .await;
    assert!(matches!(result, Err(EatError::AuthorizationDenied)));

    // Systems managers may do both.
    admin
        .audit_log(&manager, Default::default(), Pagination::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn user_management_is_admin_only() {
    let (_db, _service, admin) = setup().await;
    let manager = actor(Some(Role::SystemsManager), "morgan");
    let root = actor(Some(Role::ApplicationAdmin), "avery");

    let input = eat_core::models::user_profile::CreateUserProfile {
        username: "newhire".into(),
        email: "newhire@example.com".into(),
        password: "correct horse battery staple".into(),
        role: Role::BusinessUser,
        department: String::new(),
        phone: String::new(),
    };

    assert!(matches!(
        admin.create_user(&manager, input.clone()).await,
        Err(EatError::AuthorizationDenied)
    ));

    let created = admin.create_user(&root, input).await.unwrap();
    assert_eq!(created.role, Role::BusinessUser);

    // Role reassignment by the admin.
    let updated = admin
        .update_user(
            &root,
            created.id,
            eat_core::models::user_profile::UpdateUserProfile {
                role: Some(Role::Technician),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.role, Role::Technician);
}
