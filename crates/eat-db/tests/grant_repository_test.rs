//! Integration tests for the record-level grant store using in-memory
//! SurrealDB.

use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

use eat_core::models::grant::{CreateRecordGrant, GrantKind};
use eat_core::models::kind::ResourceKind;
use eat_core::repository::GrantRepository;
use eat_db::repository::SurrealGrantRepository;

async fn setup() -> SurrealGrantRepository<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    eat_db::run_migrations(&db).await.unwrap();
    SurrealGrantRepository::new(db)
}

fn edit_grant(user_id: Uuid, resource_id: Uuid) -> CreateRecordGrant {
    CreateRecordGrant {
        user_id,
        resource_kind: ResourceKind::ServerEnvironment,
        resource_id,
        kind: GrantKind::Edit,
        granted_by: Uuid::new_v4(),
        expires_at: None,
        notes: String::new(),
    }
}

#[tokio::test]
async fn grant_then_has_grant() {
    let repo = setup().await;
    let user = Uuid::new_v4();
    let server = Uuid::new_v4();

    assert!(
        !repo
            .has_grant(user, ResourceKind::ServerEnvironment, server, GrantKind::Edit)
            .await
            .unwrap()
    );

    repo.grant(edit_grant(user, server)).await.unwrap();

    assert!(
        repo.has_grant(user, ResourceKind::ServerEnvironment, server, GrantKind::Edit)
            .await
            .unwrap()
    );
    // A different kind on the same target is not implied.
    assert!(
        !repo
            .has_grant(user, ResourceKind::ServerEnvironment, server, GrantKind::View)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn granting_twice_is_idempotent() {
    let repo = setup().await;
    let user = Uuid::new_v4();
    let server = Uuid::new_v4();

    let first = repo.grant(edit_grant(user, server)).await.unwrap();
    let second = repo.grant(edit_grant(user, server)).await.unwrap();

    // Same effective grant, not a duplicate.
    assert_eq!(first.id, second.id);
    let all = repo.grants_for_user(user).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn regrant_refreshes_expiry() {
    let repo = setup().await;
    let user = Uuid::new_v4();
    let server = Uuid::new_v4();

    let mut input = edit_grant(user, server);
    input.expires_at = Some(Utc::now() - Duration::hours(1));
    repo.grant(input).await.unwrap();

    // Expired — reads as absent.
    assert!(
        !repo
            .has_grant(user, ResourceKind::ServerEnvironment, server, GrantKind::Edit)
            .await
            .unwrap()
    );

    let mut input = edit_grant(user, server);
    input.expires_at = Some(Utc::now() + Duration::hours(1));
    repo.grant(input).await.unwrap();

    assert!(
        repo.has_grant(user, ResourceKind::ServerEnvironment, server, GrantKind::Edit)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn expired_grant_reads_as_absent_without_cleanup() {
    let repo = setup().await;
    let user = Uuid::new_v4();
    let server = Uuid::new_v4();

    let mut input = edit_grant(user, server);
    input.expires_at = Some(Utc::now() - Duration::seconds(1));
    repo.grant(input).await.unwrap();

    assert!(
        !repo
            .has_grant(user, ResourceKind::ServerEnvironment, server, GrantKind::Edit)
            .await
            .unwrap()
    );

    // The row itself is still there (lazy expiry, no sweep) — only
    // the evaluation treats it as gone.
    let all = repo.grants_for_user(user).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn unexpired_grant_with_future_expiry_counts() {
    let repo = setup().await;
    let user = Uuid::new_v4();
    let server = Uuid::new_v4();

    let mut input = edit_grant(user, server);
    input.expires_at = Some(Utc::now() + Duration::hours(1));
    repo.grant(input).await.unwrap();

    assert!(
        repo.has_grant(user, ResourceKind::ServerEnvironment, server, GrantKind::Edit)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn revoke_removes_the_grant() {
    let repo = setup().await;
    let user = Uuid::new_v4();
    let app = Uuid::new_v4();

    let input = CreateRecordGrant {
        user_id: user,
        resource_kind: ResourceKind::Application,
        resource_id: app,
        kind: GrantKind::View,
        granted_by: Uuid::new_v4(),
        expires_at: None,
        notes: "temporary review access".into(),
    };
    repo.grant(input).await.unwrap();
    assert!(
        repo.has_grant(user, ResourceKind::Application, app, GrantKind::View)
            .await
            .unwrap()
    );

    repo.revoke(user, ResourceKind::Application, app, GrantKind::View)
        .await
        .unwrap();
    assert!(
        !repo
            .has_grant(user, ResourceKind::Application, app, GrantKind::View)
            .await
            .unwrap()
    );
    assert!(repo.grants_for_user(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn grants_for_resource_lists_all_users() {
    let repo = setup().await;
    let server = Uuid::new_v4();
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();

    repo.grant(edit_grant(user_a, server)).await.unwrap();
    let mut view = edit_grant(user_b, server);
    view.kind = GrantKind::View;
    repo.grant(view).await.unwrap();

    let grants = repo
        .grants_for_resource(ResourceKind::ServerEnvironment, server)
        .await
        .unwrap();
    assert_eq!(grants.len(), 2);
}
