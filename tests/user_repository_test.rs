//! Repository integration tests against a real Postgres.
//!
//! Each test starts its own container, so these need Docker:
//! `cargo test -- --ignored`

use std::time::Duration;

use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::testcontainers::ContainerAsync;

use user_persistence::{AppError, Config, Database, User, UserRepository, UserStore};

/// Migrated database wrapper that keeps the container alive
struct TestDb {
    repo: UserStore,
    _container: ContainerAsync<Postgres>,
}

impl TestDb {
    async fn new() -> Self {
        let container = Postgres::default()
            .start()
            .await
            .expect("Failed to start postgres container");
        let host = container.get_host().await.expect("Failed to get host");
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("Failed to get port");

        let config = Config {
            database_url: format!("postgres://postgres:postgres@{}:{}/postgres", host, port),
            ..Config::default()
        };
        let db = Database::connect(&config)
            .await
            .expect("Failed to connect and migrate");

        Self {
            repo: UserStore::new(db.into_connection()),
            _container: container,
        }
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_create_user() {
    let db = TestDb::new().await;

    let created = db
        .repo
        .create(User::with_names("testuser", "test@example.com", "Test", "User"))
        .await
        .unwrap();

    assert!(created.id > 0);
    assert_eq!(created.username, "testuser");
    assert_eq!(created.email, "test@example.com");
    assert_eq!(created.first_name, "Test");
    assert_eq!(created.last_name, "User");
    assert_ne!(created.created_at, chrono::DateTime::<chrono::Utc>::default());
    assert_eq!(created.created_at, created.updated_at);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_create_assigns_unique_ids() {
    let db = TestDb::new().await;

    let first = db.repo.create(User::new("one", "one@example.com")).await.unwrap();
    let second = db.repo.create(User::new("two", "two@example.com")).await.unwrap();

    assert!(first.id > 0);
    assert!(second.id > 0);
    assert_ne!(first.id, second.id);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_round_trip_matches_every_field() {
    let db = TestDb::new().await;

    let named = db
        .repo
        .create(User::with_names("named", "named@example.com", "Ann", "Lee"))
        .await
        .unwrap();
    let bare = db.repo.create(User::new("bare", "bare@example.com")).await.unwrap();

    assert_eq!(db.repo.find_by_id(named.id).await.unwrap(), Some(named));
    assert_eq!(db.repo.find_by_id(bare.id).await.unwrap(), Some(bare));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_duplicate_username_is_constraint_violation() {
    let db = TestDb::new().await;
    db.repo.create(User::new("dup", "first@example.com")).await.unwrap();

    let err = db
        .repo
        .create(User::new("dup", "second@example.com"))
        .await
        .unwrap_err();

    assert!(err.is_constraint_violation(), "unexpected error: {err}");
    assert_eq!(db.repo.count().await.unwrap(), 1);
    assert!(db.repo.find_by_email("second@example.com").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_duplicate_email_is_constraint_violation() {
    let db = TestDb::new().await;
    db.repo.create(User::new("first", "dup@example.com")).await.unwrap();

    let err = db
        .repo
        .create(User::new("second", "dup@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ConstraintViolation { operation: "create", .. }));
    assert_eq!(db.repo.count().await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_lookups_on_missing_keys_return_none() {
    let db = TestDb::new().await;

    assert!(db.repo.find_by_id(999).await.unwrap().is_none());
    assert!(db.repo.find_by_username("nobody").await.unwrap().is_none());
    assert!(db.repo.find_by_email("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_find_by_username_and_email() {
    let db = TestDb::new().await;
    let created = db
        .repo
        .create(User::with_names("usernameuser", "username@example.com", "Username", "User"))
        .await
        .unwrap();

    let by_username = db.repo.find_by_username("usernameuser").await.unwrap().unwrap();
    let by_email = db.repo.find_by_email("username@example.com").await.unwrap().unwrap();

    assert_eq!(by_username, created);
    assert_eq!(by_email, created);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_update_user() {
    let db = TestDb::new().await;
    let mut user = db
        .repo
        .create(User::with_names("updateuser", "update@example.com", "Update", "User"))
        .await
        .unwrap();
    let original_updated_at = user.updated_at;

    // Ensure the clock moves past the creation timestamp
    tokio::time::sleep(Duration::from_millis(10)).await;

    user.first_name = "Updated".to_string();
    user.last_name = String::new();
    db.repo.update(&mut user).await.unwrap();

    assert!(user.updated_at > original_updated_at);
    assert!(user.updated_at > user.created_at);

    let stored = db.repo.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.first_name, "Updated");
    assert_eq!(stored.last_name, "");
    assert_eq!(stored, user);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_update_missing_user_is_not_found() {
    let db = TestDb::new().await;
    let keep = db.repo.create(User::new("keep", "keep@example.com")).await.unwrap();
    let gone = db.repo.create(User::new("gone", "gone@example.com")).await.unwrap();
    db.repo.delete(gone.id).await.unwrap();

    let mut deleted = gone.clone();
    deleted.username = "renamed".to_string();
    let err = db.repo.update(&mut deleted).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { id } if id == gone.id));

    let mut never_existed = User::new("ghost", "ghost@example.com");
    never_existed.id = 424242;
    assert!(db.repo.update(&mut never_existed).await.unwrap_err().is_not_found());

    // Store unchanged
    assert_eq!(db.repo.find_all().await.unwrap(), vec![keep]);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_update_to_taken_username_is_store_error() {
    let db = TestDb::new().await;
    db.repo.create(User::new("taken", "taken@example.com")).await.unwrap();
    let mut other = db.repo.create(User::new("other", "other@example.com")).await.unwrap();

    other.username = "taken".to_string();
    let err = db.repo.update(&mut other).await.unwrap_err();

    assert!(matches!(err, AppError::Store { operation: "update", .. }));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_delete_user() {
    let db = TestDb::new().await;
    let user = db.repo.create(User::new("deleteuser", "delete@example.com")).await.unwrap();

    db.repo.delete(user.id).await.unwrap();

    assert!(db.repo.find_by_id(user.id).await.unwrap().is_none());
    let err = db.repo.delete(user.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { id } if id == user.id));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_find_all_ordered_and_matches_count() {
    let db = TestDb::new().await;
    assert!(db.repo.find_all().await.unwrap().is_empty());

    let mut ids = Vec::new();
    for name in ["u1", "u2", "u3", "u4"] {
        let user = db
            .repo
            .create(User::new(name, format!("{}@example.com", name)))
            .await
            .unwrap();
        ids.push(user.id);
    }
    db.repo.delete(ids[1]).await.unwrap();
    db.repo.create(User::new("u5", "u5@example.com")).await.unwrap();

    let users = db.repo.find_all().await.unwrap();
    let listed: Vec<i32> = users.iter().map(|u| u.id).collect();
    let mut sorted = listed.clone();
    sorted.sort_unstable();

    assert_eq!(listed, sorted);
    assert!(!listed.contains(&ids[1]));
    assert_eq!(users.len() as u64, db.repo.count().await.unwrap());
    assert_eq!(users.len(), 4);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_delete_all() {
    let db = TestDb::new().await;
    db.repo.create(User::new("a", "a@example.com")).await.unwrap();
    db.repo.create(User::new("b", "b@example.com")).await.unwrap();

    db.repo.delete_all().await.unwrap();

    assert_eq!(db.repo.count().await.unwrap(), 0);
    assert!(db.repo.find_all().await.unwrap().is_empty());
    // Nothing to delete is still fine
    db.repo.delete_all().await.unwrap();
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_alice_and_bob_scenario() {
    let db = TestDb::new().await;

    let alice = db.repo.create(User::new("alice", "a@x.com")).await.unwrap();
    db.repo.create(User::new("bob", "b@x.com")).await.unwrap();
    assert_eq!(db.repo.count().await.unwrap(), 2);

    db.repo.delete(alice.id).await.unwrap();
    assert_eq!(db.repo.count().await.unwrap(), 1);
    assert!(db.repo.find_by_username("alice").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_ping_and_close() {
    let TestDb { repo, _container } = TestDb::new().await;

    repo.ping().await.unwrap();
    repo.close().await.unwrap();
}
