use std::sync::Arc;

use chrono::Utc;
use turnstile_auth::{
    Argon2Hasher, AuthError, DirectoryError, NewCredential, Registration, Role, SessionConfig,
    SessionManager, UserDirectory,
};
use turnstile_data::{PgTodoStore, PgUserDirectory, connect};
use turnstile_test_support::postgres::start_postgres;
use turnstile_todo::{NewTodo, TodoError, TodoQuery, TodoService};

fn credential(identity: &str, email: &str) -> NewCredential {
    NewCredential {
        identity: identity.to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
        role: Role::User,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn directory_enforces_uniqueness_and_swaps_atomically() -> anyhow::Result<()> {
    let postgres = match start_postgres() {
        Ok(db) => db,
        Err(err) => {
            eprintln!("skipping directory_enforces_uniqueness_and_swaps_atomically: {err}");
            return Ok(());
        }
    };
    let pool = connect(postgres.connection_string()).await?;
    let directory = PgUserDirectory::new(pool);

    let stored = directory.insert(credential("alice", "a@x.com")).await?;
    assert_eq!(stored.role, Role::User);
    assert!(!stored.has_session());

    assert!(matches!(
        directory.insert(credential("alice", "other@x.com")).await,
        Err(DirectoryError::Duplicate { field: "username" })
    ));
    assert!(matches!(
        directory.insert(credential("alicia", "a@x.com")).await,
        Err(DirectoryError::Duplicate { field: "email" })
    ));

    assert!(directory.set_refresh_token("alice", Some("t1")).await?);
    assert!(!directory.swap_refresh_token("alice", "stale", "t2").await?);
    assert!(directory.swap_refresh_token("alice", "t1", "t2").await?);
    assert!(!directory.swap_refresh_token("alice", "t1", "t3").await?);

    let record = directory
        .find_by_email("a@x.com")
        .await?
        .expect("record by email");
    assert_eq!(record.refresh_token.as_deref(), Some("t2"));

    assert!(directory.replace_password_hash("alice", "$argon2id$next").await?);
    let record = directory
        .find_by_identity("alice")
        .await?
        .expect("record by identity");
    assert_eq!(record.password_hash, "$argon2id$next");
    assert!(record.refresh_token.is_none());
    assert!(!directory.replace_password_hash("ghost", "$argon2id$next").await?);

    assert!(directory.set_refresh_token("alice", None).await?);
    assert!(!directory.set_refresh_token("ghost", None).await?);
    assert!(directory.find_by_identity("ghost").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn session_lifecycle_against_postgres() -> anyhow::Result<()> {
    let postgres = match start_postgres() {
        Ok(db) => db,
        Err(err) => {
            eprintln!("skipping session_lifecycle_against_postgres: {err}");
            return Ok(());
        }
    };
    let pool = connect(postgres.connection_string()).await?;
    let manager = SessionManager::new(
        SessionConfig::new("access-secret", "refresh-secret"),
        Arc::new(PgUserDirectory::new(pool)),
        Arc::new(Argon2Hasher::new(256, 1)?),
    );

    manager
        .register(Registration {
            identity: "alice".into(),
            email: "a@x.com".into(),
            password: "pw1".into(),
            elevation_claim: None,
        })
        .await?;
    let pair = manager.authenticate("a@x.com", "pw1").await?;
    let rotated = manager.refresh(&pair.refresh_token).await?;
    assert!(manager.refresh(&pair.refresh_token).await.is_err());

    manager.logout(&rotated.refresh_token).await?;
    assert!(matches!(
        manager.refresh(&rotated.refresh_token).await,
        Err(AuthError::Authentication { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn todo_store_scopes_by_owner() -> anyhow::Result<()> {
    let postgres = match start_postgres() {
        Ok(db) => db,
        Err(err) => {
            eprintln!("skipping todo_store_scopes_by_owner: {err}");
            return Ok(());
        }
    };
    let pool = connect(postgres.connection_string()).await?;
    let directory = PgUserDirectory::new(pool.clone());
    directory.insert(credential("alice", "a@x.com")).await?;
    directory.insert(credential("bob", "b@x.com")).await?;

    let todos = TodoService::new(Arc::new(PgTodoStore::new(pool)));
    for text in ["one", "two", "three"] {
        todos.create("alice", NewTodo { text: text.into() }).await?;
    }
    let bobs = todos.create("bob", NewTodo { text: "bob".into() }).await?;

    let page = todos
        .list(
            "alice",
            TodoQuery {
                limit: 2,
                ..TodoQuery::default()
            },
        )
        .await?;
    assert_eq!(page.total, 3);
    assert_eq!(page.pages, 2);
    assert_eq!(page.todos.len(), 2);
    assert!(page.todos.iter().all(|todo| todo.owner == "alice"));

    assert!(matches!(
        todos.get("alice", bobs.id).await,
        Err(TodoError::NotFound { .. })
    ));
    assert_eq!(todos.get("bob", bobs.id).await?, bobs);
    assert!(matches!(
        todos.delete("alice", bobs.id).await,
        Err(TodoError::NotFound { .. })
    ));
    todos.delete("bob", bobs.id).await?;
    Ok(())
}
