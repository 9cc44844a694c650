//! Integration tests for the user profile repository using in-memory
//! SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

use eat_core::error::EatError;
use eat_core::models::audit::AuditFilter;
use eat_core::models::kind::ResourceKind;
use eat_core::models::role::Role;
use eat_core::models::user_profile::{CreateUserProfile, UpdateUserProfile};
use eat_core::repository::{
    AuditContext, AuditRepository, Pagination, UserProfileRepository,
};
use eat_db::repository::{
    SurrealAuditRepository, SurrealUserProfileRepository, verify_password,
};

async fn setup() -> (
    SurrealUserProfileRepository<Db>,
    SurrealAuditRepository<Db>,
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    eat_db::run_migrations(&db).await.unwrap();
    (
        SurrealUserProfileRepository::new(db.clone()),
        SurrealAuditRepository::new(db),
    )
}

fn technician(username: &str) -> CreateUserProfile {
    CreateUserProfile {
        username: username.into(),
        email: format!("{username}@example.com"),
        password: "correct horse battery staple".into(),
        role: Role::Technician,
        department: "Infrastructure".into(),
        phone: String::new(),
    }
}

#[tokio::test]
async fn create_and_fetch_by_username() {
    let (repo, _audit) = setup().await;

    let created = repo
        .create(technician("alice"), &AuditContext::system())
        .await
        .unwrap();
    assert_eq!(created.role, Role::Technician);
    assert!(created.is_active);

    let fetched = repo.get_by_username("alice").await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.email, "alice@example.com");

    // The stored hash verifies against the original password and is
    // not the raw password.
    assert_ne!(fetched.password_hash, "correct horse battery staple");
    assert!(verify_password("correct horse battery staple", &fetched.password_hash, None).unwrap());
}

#[tokio::test]
async fn unknown_username_is_not_found() {
    let (repo, _audit) = setup().await;
    assert!(matches!(
        repo.get_by_username("nobody").await,
        Err(EatError::NotFound { .. })
    ));
}

#[tokio::test]
async fn role_reassignment_is_audited_without_password_material() {
    let (repo, audit) = setup().await;

    let user = repo
        .create(technician("bob"), &AuditContext::system())
        .await
        .unwrap();

    repo.update(
        user.id,
        UpdateUserProfile {
            role: Some(Role::SystemsManager),
            ..Default::default()
        },
        &AuditContext::system(),
    )
    .await
    .unwrap();

    let entries = audit
        .list(
            AuditFilter {
                resource_kind: Some(ResourceKind::UserProfile),
                resource_id: Some(user.id.to_string()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap()
        .items;

    assert_eq!(entries.len(), 2);
    let update = &entries[1];
    assert_eq!(update.detail["role"]["old"], "technician");
    assert_eq!(update.detail["role"]["new"], "systems_manager");

    // No audit payload ever carries the password hash.
    for entry in &entries {
        assert!(entry.detail.get("password_hash").is_none());
    }
}

#[tokio::test]
async fn deactivate_is_soft_and_idempotent() {
    let (repo, audit) = setup().await;

    let user = repo
        .create(technician("carol"), &AuditContext::system())
        .await
        .unwrap();

    repo.deactivate(user.id, &AuditContext::system())
        .await
        .unwrap();
    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert!(!fetched.is_active);

    repo.deactivate(user.id, &AuditContext::system())
        .await
        .unwrap();

    let entries = audit
        .list(
            AuditFilter {
                resource_kind: Some(ResourceKind::UserProfile),
                resource_id: Some(user.id.to_string()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap()
        .items;
    // One CREATE, one DELETE — the second deactivate wrote nothing.
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn count_by_role_sees_only_active_profiles() {
    let (repo, _audit) = setup().await;

    assert_eq!(repo.count_by_role(Role::Technician).await.unwrap(), 0);

    let a = repo
        .create(technician("dave"), &AuditContext::system())
        .await
        .unwrap();
    repo.create(technician("erin"), &AuditContext::system())
        .await
        .unwrap();
    assert_eq!(repo.count_by_role(Role::Technician).await.unwrap(), 2);

    repo.deactivate(a.id, &AuditContext::system()).await.unwrap();
    assert_eq!(repo.count_by_role(Role::Technician).await.unwrap(), 1);
}

#[tokio::test]
async fn list_pages_by_username() {
    let (repo, _audit) = setup().await;

    for name in ["zoe", "amy", "mia"] {
        repo.create(technician(name), &AuditContext::system())
            .await
            .unwrap();
    }

    let page = repo
        .list(Pagination {
            offset: 0,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].username, "amy");
    assert_eq!(page.items[1].username, "mia");
}
