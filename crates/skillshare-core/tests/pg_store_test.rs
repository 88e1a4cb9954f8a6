//! The engine over the PostgreSQL stores.
//!
//! Each test runs in its own temporary database. Ignored by default: run
//! with `--ignored` where Docker or `SKILLSHARE_TEST_PG_URL` is available.

use skillshare_core::notes::{NoteRequest, NoteService};
use skillshare_core::plan::{PlanService, parse_plan_toml, seed_templates};
use skillshare_core::social::FollowService;
use skillshare_core::store::{PgNoteStore, PgPlanStore, PgUserStore, PlanStore, UserStore};
use skillshare_core::{Entity, Error};
use skillshare_db::models::UserProfile;
use skillshare_test_utils::{create_test_db, drop_test_db};

const PLAN: &str = r#"
[plan]
title = "Postgres deep dive"
estimated_hours = 4

[[modules]]
title = "Indexes"
estimated_hours = 4

[[modules.tasks]]
title = "B-trees"
estimated_minutes = 60

[[modules.tasks.resources]]
title = "Docs"
url = "https://www.postgresql.org/docs/current/indexes.html"
type = "link"

[[modules.tasks]]
title = "GIN"
estimated_minutes = 90
"#;

#[tokio::test]
#[ignore = "requires Docker or SKILLSHARE_TEST_PG_URL"]
async fn lifecycle_round_trips_through_postgres() {
    let (pool, db_name) = create_test_db().await;
    let svc = PlanService::new(PgPlanStore::new(pool.clone()));

    let plan = svc.create("alice", &parse_plan_toml(PLAN).unwrap()).await.unwrap();
    assert_eq!(plan.revision, 0);

    let module = &plan.modules[0];
    let plan = svc
        .update_progress("alice", plan.id, module.id, module.tasks[0].id)
        .await
        .unwrap();
    assert_eq!(plan.completed_hours, 1);
    assert_eq!(plan.revision, 1);

    let stored = svc.get("alice", plan.id).await.unwrap();
    assert_eq!(stored.modules, plan.modules);
    assert!(svc.get("bob", plan.id).await.unwrap_err().is_not_authorized());

    svc.delete("alice", plan.id).await.unwrap();
    assert!(svc.get("alice", plan.id).await.unwrap_err().is_not_found());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
#[ignore = "requires Docker or SKILLSHARE_TEST_PG_URL"]
async fn stale_revision_conflicts() {
    let (pool, db_name) = create_test_db().await;
    let store = PgPlanStore::new(pool.clone());
    let svc = PlanService::new(store.clone());

    let plan = svc.create("alice", &parse_plan_toml(PLAN).unwrap()).await.unwrap();
    let mut first = plan.clone();
    first.title = "first".into();
    store.save(&first).await.unwrap();

    let err = store.save(&plan).await.unwrap_err();
    assert!(matches!(err, Error::Conflict { id, .. } if id == plan.id.to_string()));
    assert_eq!(store.load(plan.id).await.unwrap().unwrap().title, "first");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
#[ignore = "requires Docker or SKILLSHARE_TEST_PG_URL"]
async fn seeded_templates_instantiate() {
    let (pool, db_name) = create_test_db().await;
    let svc = PlanService::new(PgPlanStore::new(pool.clone()));

    assert_eq!(seed_templates(&svc).await.unwrap().len(), 2);
    assert!(seed_templates(&svc).await.unwrap().is_empty());

    let templates = svc.list_templates().await.unwrap();
    let copy = svc.instantiate_template("alice", templates[0].id).await.unwrap();
    assert!(!copy.is_template);
    assert_eq!(svc.list_for_user("alice").await.unwrap().len(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
#[ignore = "requires Docker or SKILLSHARE_TEST_PG_URL"]
async fn follow_graph_persists() {
    let (pool, db_name) = create_test_db().await;
    let svc = FollowService::new(PgUserStore::new(pool.clone()));

    svc.register("alice", "alice@example.com", "Alice").await.unwrap();
    svc.register("bob", "bob@example.com", "Bob").await.unwrap();
    assert!(matches!(
        svc.register("carol", "bob@example.com", "Carol").await,
        Err(Error::InvalidOperation(_))
    ));

    svc.follow("alice", "bob").await.unwrap();
    let bob = svc.profile("bob").await.unwrap();
    assert_eq!(bob.followers, vec!["alice".to_string()]);
    assert_eq!(bob.follower_count, 1);

    svc.unfollow("alice", "bob").await.unwrap();
    assert!(!svc.is_following("alice", "bob").await.unwrap());
    assert!(svc.follow("alice", "ghost").await.unwrap_err().is_not_found());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
#[ignore = "requires Docker or SKILLSHARE_TEST_PG_URL"]
async fn profile_saves_report_missing_and_stale_users() {
    let (pool, db_name) = create_test_db().await;
    let store = PgUserStore::new(pool.clone());
    let svc = FollowService::new(store.clone());

    let alice = svc.register("alice", "alice@example.com", "Alice").await.unwrap();
    let ghost = UserProfile::new("ghost", "ghost@example.com", "Ghost");
    let err = store.save_users(&[alice.clone(), ghost]).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { entity: Entity::User, ref id } if id == "ghost"));
    assert_eq!(store.load_user("alice").await.unwrap().unwrap().revision, 0);

    svc.update_profile("alice", "Alice L").await.unwrap();
    let err = store.save_users(&[alice]).await.unwrap_err();
    assert!(matches!(err, Error::Conflict { entity: Entity::User, ref id } if id == "alice"));
    assert_eq!(svc.profile("alice").await.unwrap().display_name, "Alice L");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
#[ignore = "requires Docker or SKILLSHARE_TEST_PG_URL"]
async fn concurrent_follows_keep_both_edges() {
    let (pool, db_name) = create_test_db().await;
    let svc = FollowService::new(PgUserStore::new(pool.clone()));
    for id in ["bob", "u1", "u2", "u3", "u4"] {
        svc.register(id, &format!("{id}@example.com"), id).await.unwrap();
    }

    let (a, b, c, d) = tokio::join!(
        svc.follow("u1", "bob"),
        svc.follow("u2", "bob"),
        svc.follow("u3", "bob"),
        svc.follow("u4", "bob"),
    );
    for result in [a, b, c, d] {
        result.unwrap();
    }

    let bob = svc.profile("bob").await.unwrap();
    assert_eq!(bob.followers, vec!["u1", "u2", "u3", "u4"]);
    assert_eq!(bob.follower_count, 4);

    let listed: Vec<String> = svc
        .followers("bob", "bob")
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(listed, bob.followers);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
#[ignore = "requires Docker or SKILLSHARE_TEST_PG_URL"]
async fn notes_persist_per_owner() {
    let (pool, db_name) = create_test_db().await;
    let svc = NoteService::new(PgNoteStore::new(pool.clone()));

    let note = svc.create("alice", &NoteRequest::new("Indexes", "btree, gin")).await.unwrap();
    svc.create("bob", &NoteRequest::new("Joins", "")).await.unwrap();

    assert_eq!(svc.list("alice").await.unwrap().len(), 1);
    assert_eq!(svc.search("alice", "GIN").await.unwrap()[0].id, note.id);
    assert!(svc.get("bob", note.id).await.unwrap_err().is_not_authorized());

    let updated = svc
        .update("alice", note.id, &NoteRequest::new("Indexes", "btree, gin, brin"))
        .await
        .unwrap();
    assert_eq!(updated.content, "btree, gin, brin");

    svc.delete("alice", note.id).await.unwrap();
    assert!(svc.get("alice", note.id).await.unwrap_err().is_not_found());

    pool.close().await;
    drop_test_db(&db_name).await;
}
