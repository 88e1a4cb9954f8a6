//! End-to-end tests for the plan lifecycle against the in-memory store.

use uuid::Uuid;

use skillshare_core::Error;
use skillshare_core::ids::SequentialIds;
use skillshare_core::plan::{PlanFilter, PlanMetadata, PlanService, parse_plan_toml};
use skillshare_core::store::{MemoryPlanStore, PlanStore};
use skillshare_db::models::{Plan, PlanStatus, SYSTEM_OWNER};

const SIXTY_NINETY: &str = r#"
[plan]
title = "Rust in a weekend"
category = "Programming"
estimated_hours = 3

[[modules]]
title = "Basics"
estimated_hours = 3

[[modules.tasks]]
title = "Hello"
estimated_minutes = 60

[[modules.tasks]]
title = "Ownership"
estimated_minutes = 90
"#;

const TEMPLATE: &str = r#"
template = true

[plan]
title = "Java path"
category = "Programming"
estimated_hours = 10

[[modules]]
title = "Basics"
estimated_hours = 5

[[modules.tasks]]
title = "Syntax"
estimated_minutes = 120

[[modules.tasks.resources]]
title = "Intro"
url = "https://example.com/intro"
type = "article"

[[modules.tasks]]
title = "Flow"
estimated_minutes = 45

[[modules]]
title = "Empty"
estimated_hours = 5
"#;

fn service() -> PlanService<MemoryPlanStore> {
    PlanService::with_id_generator(MemoryPlanStore::new(), SequentialIds::default())
}

fn ids(plan: &Plan) -> (Uuid, Uuid, Uuid) {
    let module = &plan.modules[0];
    (plan.id, module.id, module.tasks[0].id)
}

#[tokio::test]
async fn completing_tasks_rolls_hours_up() {
    let svc = service();
    let plan = svc.create("alice", &parse_plan_toml(SIXTY_NINETY).unwrap()).await.unwrap();
    assert_eq!(plan.completed_hours, 0);
    assert_eq!(plan.status(), PlanStatus::NotStarted);

    let module_id = plan.modules[0].id;
    let first = plan.modules[0].tasks[0].id;
    let second = plan.modules[0].tasks[1].id;

    let plan = svc.update_progress("alice", plan.id, module_id, first).await.unwrap();
    assert_eq!(plan.modules[0].completed_hours, 1);
    assert_eq!(plan.completed_hours, 1);
    assert_eq!(plan.status(), PlanStatus::InProgress);

    // 60 + 90 = 150 minutes, floored to 2 hours.
    let plan = svc.update_progress("alice", plan.id, module_id, second).await.unwrap();
    assert_eq!(plan.modules[0].completed_hours, 2);
    assert_eq!(plan.completed_hours, 2);
    assert_eq!(plan.status(), PlanStatus::Completed);

    let stored = svc.get("alice", plan.id).await.unwrap();
    assert_eq!(stored, plan);
}

#[tokio::test]
async fn first_task_of_120_and_45_gives_two_hours() {
    let svc = service();
    let template = svc.create(SYSTEM_OWNER, &parse_plan_toml(TEMPLATE).unwrap()).await.unwrap();
    let plan = svc.instantiate_template("alice", template.id).await.unwrap();

    let (plan_id, module_id, task_id) = ids(&plan);
    let plan = svc.update_progress("alice", plan_id, module_id, task_id).await.unwrap();
    assert_eq!(plan.modules[0].completed_hours, 2);
    assert_eq!(plan.modules[1].completed_hours, 0);
    assert_eq!(plan.completed_hours, 2);
}

#[tokio::test]
async fn recompleting_a_task_is_a_no_op() {
    let svc = service();
    let plan = svc.create("alice", &parse_plan_toml(SIXTY_NINETY).unwrap()).await.unwrap();
    let (plan_id, module_id, task_id) = ids(&plan);

    let once = svc.update_progress("alice", plan_id, module_id, task_id).await.unwrap();
    let twice = svc.update_progress("alice", plan_id, module_id, task_id).await.unwrap();
    assert_eq!(once, twice);
    assert_eq!(
        once.modules[0].tasks[0].completed_at,
        twice.modules[0].tasks[0].completed_at
    );
}

#[tokio::test]
async fn create_assigns_fresh_ids_and_zero_progress() {
    let svc = service();
    let plan = svc.create("alice", &parse_plan_toml(TEMPLATE.replace("template = true", "").as_str()).unwrap())
        .await
        .unwrap();
    assert_eq!(plan.owner_id, "alice");
    assert!(!plan.is_template);
    assert_eq!(plan.revision, 0);
    assert!(plan.modules.iter().all(|m| m.completed_hours == 0));
    assert!(plan.tasks().all(|t| t.completed_at.is_none()));
    // Plan, two modules, two tasks and one resource: ids 1 through 6.
    assert_eq!(plan.id, Uuid::from_u128(1));
    assert_eq!(plan.modules[1].id, Uuid::from_u128(6));
}

#[tokio::test]
async fn only_the_system_creates_templates() {
    let svc = service();
    let err = svc.create("alice", &parse_plan_toml(TEMPLATE).unwrap()).await.unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));
    assert!(svc.store().is_empty().await);
}

#[tokio::test]
async fn ownership_isolates_plans() {
    let svc = service();
    let plan = svc.create("alice", &parse_plan_toml(SIXTY_NINETY).unwrap()).await.unwrap();
    let (plan_id, module_id, task_id) = ids(&plan);

    assert!(svc.get("bob", plan_id).await.unwrap_err().is_not_authorized());
    assert!(svc.update_progress("bob", plan_id, module_id, task_id).await.unwrap_err().is_not_authorized());
    assert!(svc.delete("bob", plan_id).await.unwrap_err().is_not_authorized());
    let meta = PlanMetadata {
        title: "mine now".into(),
        description: None,
        category: None,
        estimated_hours: 1,
    };
    assert!(svc.update_metadata("bob", plan_id, &meta).await.unwrap_err().is_not_authorized());
    assert!(svc.list_for_user("bob").await.unwrap().is_empty());

    // Nothing changed for the owner.
    let stored = svc.get("alice", plan_id).await.unwrap();
    assert_eq!(stored, plan);
}

#[tokio::test]
async fn update_progress_checks_in_order() {
    let svc = service();
    let template = svc.create(SYSTEM_OWNER, &parse_plan_toml(TEMPLATE).unwrap()).await.unwrap();
    let plan = svc.create("alice", &parse_plan_toml(SIXTY_NINETY).unwrap()).await.unwrap();
    let (plan_id, module_id, task_id) = ids(&plan);
    let missing = Uuid::from_u128(9999);

    assert!(svc.update_progress("alice", missing, missing, missing).await.unwrap_err().is_not_found());
    assert!(svc.update_progress("bob", plan_id, missing, missing).await.unwrap_err().is_not_authorized());

    let (t_id, t_module, t_task) = ids(&template);
    let err = svc.update_progress(SYSTEM_OWNER, t_id, t_module, t_task).await.unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));

    let err = svc.update_progress("alice", plan_id, missing, task_id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { entity: skillshare_core::Entity::Module, .. }));

    // A task id belonging to another plan does not resolve.
    let err = svc.update_progress("alice", plan_id, module_id, t_task).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { entity: skillshare_core::Entity::Task, .. }));
}

#[tokio::test]
async fn templates_are_readable_by_anyone() {
    let svc = service();
    let template = svc.create(SYSTEM_OWNER, &parse_plan_toml(TEMPLATE).unwrap()).await.unwrap();
    assert_eq!(svc.get("bob", template.id).await.unwrap().id, template.id);
    assert!(svc.list_for_user(SYSTEM_OWNER).await.unwrap().is_empty());

    let summaries = svc.list_templates().await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].module_count, 2);
    assert_eq!(summaries[0].task_count, 2);
}

#[tokio::test]
async fn instantiated_plans_are_independent_of_the_template() {
    let svc = service();
    let template = svc.create(SYSTEM_OWNER, &parse_plan_toml(TEMPLATE).unwrap()).await.unwrap();
    let copy = svc.instantiate_template("alice", template.id).await.unwrap();

    assert_eq!(copy.owner_id, "alice");
    assert!(!copy.is_template);
    assert_ne!(copy.id, template.id);
    assert_ne!(copy.modules[0].id, template.modules[0].id);
    assert_ne!(copy.modules[0].tasks[0].resources[0].id, template.modules[0].tasks[0].resources[0].id);

    let (plan_id, module_id, task_id) = ids(&copy);
    svc.update_progress("alice", plan_id, module_id, task_id).await.unwrap();

    let untouched = svc.get("alice", template.id).await.unwrap();
    assert_eq!(untouched, template);
    assert!(untouched.tasks().all(|t| t.completed_at.is_none()));
}

#[tokio::test]
async fn instantiating_a_personal_plan_fails() {
    let svc = service();
    let plan = svc.create("alice", &parse_plan_toml(SIXTY_NINETY).unwrap()).await.unwrap();
    let err = svc.instantiate_template("bob", plan.id).await.unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));

    let err = svc.instantiate_template("bob", Uuid::from_u128(4242)).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { entity: skillshare_core::Entity::Template, .. }));
}

#[tokio::test]
async fn metadata_update_keeps_the_tree() {
    let svc = service();
    let plan = svc.create("alice", &parse_plan_toml(SIXTY_NINETY).unwrap()).await.unwrap();
    let (plan_id, module_id, task_id) = ids(&plan);
    svc.update_progress("alice", plan_id, module_id, task_id).await.unwrap();

    let meta = PlanMetadata {
        title: "Rust in a month".into(),
        description: Some("slower".into()),
        category: Some("Systems".into()),
        estimated_hours: 40,
    };
    let updated = svc.update_metadata("alice", plan_id, &meta).await.unwrap();
    assert_eq!(updated.title, "Rust in a month");
    assert_eq!(updated.estimated_hours, 40);
    assert_eq!(updated.completed_hours, 1);
    assert!(updated.modules[0].tasks[0].is_complete());

    let blank = PlanMetadata { title: " ".into(), ..meta };
    let err = svc.update_metadata("alice", plan_id, &blank).await.unwrap_err();
    assert!(matches!(err, Error::ValidationFailed(_)));
}

#[tokio::test]
async fn delete_removes_the_plan() {
    let svc = service();
    let plan = svc.create("alice", &parse_plan_toml(SIXTY_NINETY).unwrap()).await.unwrap();
    svc.delete("alice", plan.id).await.unwrap();
    assert!(svc.get("alice", plan.id).await.unwrap_err().is_not_found());
    assert!(svc.delete("alice", plan.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn filtered_listing() {
    let svc = service();
    let short = svc.create("alice", &parse_plan_toml(SIXTY_NINETY).unwrap()).await.unwrap();
    let long = parse_plan_toml(
        &SIXTY_NINETY
            .replace("estimated_hours = 3\n\n[[modules]]", "estimated_hours = 30\n\n[[modules]]")
            .replace("\"Programming\"", "\"Systems\""),
    )
    .unwrap();
    let long = svc.create("alice", &long).await.unwrap();
    let (plan_id, module_id, task_id) = ids(&short);
    svc.update_progress("alice", plan_id, module_id, task_id).await.unwrap();

    let by_category = svc
        .list_filtered("alice", &PlanFilter { category: Some("PROGRAMMING".into()), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(by_category.len(), 1);
    assert_eq!(by_category[0].id, short.id);

    let by_hours = svc
        .list_filtered("alice", &PlanFilter { min_hours: Some(10), max_hours: Some(30), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(by_hours.len(), 1);
    assert_eq!(by_hours[0].id, long.id);

    let in_progress = svc
        .list_filtered("alice", &PlanFilter { status: Some(PlanStatus::InProgress), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(in_progress.len(), 1);
    assert_eq!(in_progress[0].id, short.id);

    let err = svc
        .list_filtered("alice", &PlanFilter { min_hours: Some(5), max_hours: Some(1), ..Default::default() })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ValidationFailed(_)));
}

#[tokio::test]
async fn progress_summary_reports_counts() {
    let svc = service();
    let plan = svc.create("alice", &parse_plan_toml(SIXTY_NINETY).unwrap()).await.unwrap();
    let (plan_id, module_id, task_id) = ids(&plan);
    svc.update_progress("alice", plan_id, module_id, task_id).await.unwrap();

    let summary = svc.progress("alice", plan_id).await.unwrap();
    assert_eq!(summary.completed_tasks, 1);
    assert_eq!(summary.total_tasks, 2);
    assert_eq!(summary.completed_hours, 1);
    assert_eq!(summary.estimated_hours, 3);
    assert_eq!(summary.percent_complete(), 50);
}

#[tokio::test]
async fn concurrent_stale_writes_conflict() {
    let svc = service();
    let plan = svc.create("alice", &parse_plan_toml(SIXTY_NINETY).unwrap()).await.unwrap();

    // Two readers of the same revision; the second writer loses.
    let mut a = plan.clone();
    a.title = "a".into();
    let mut b = plan.clone();
    b.title = "b".into();
    svc.store().save(&a).await.unwrap();
    let err = svc.store().save(&b).await.unwrap_err();
    assert!(matches!(err, Error::Conflict { id, .. } if id == plan.id.to_string()));

    // Service operations reload, so they still succeed.
    let (plan_id, module_id, task_id) = ids(&plan);
    let updated = svc.update_progress("alice", plan_id, module_id, task_id).await.unwrap();
    assert_eq!(updated.title, "a");
    assert_eq!(updated.revision, 2);
}
