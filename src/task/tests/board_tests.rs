//! Service tests for task creation, listing, and board moves.

use super::world::World;
use crate::session::services::SessionServiceError;
use crate::task::{
    domain::{TaskDomainError, TaskPriority, TaskStatus},
    ports::TaskRepository,
    services::{CreateTaskRequest, TaskServiceError},
};
use crate::workspace::{domain::UserId, services::WorkspaceServiceError};
use rstest::{fixture, rstest};

#[fixture]
fn world() -> World {
    World::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn created_tasks_are_listed_in_board_order(world: World) {
    let project = world.project().await;
    for (title, position) in [("second", 2), ("first", 1)] {
        world
            .board
            .create_task(
                project.id(),
                world.owner,
                CreateTaskRequest::new(title)
                    .with_position(position)
                    .with_priority(TaskPriority::Low),
            )
            .await
            .expect("task creation should succeed");
    }

    let tasks = world
        .board
        .list_tasks(project.id(), world.owner)
        .await
        .expect("tasks should list");

    let titles: Vec<_> = tasks.iter().map(|task| task.title().to_owned()).collect();
    assert_eq!(titles, ["first", "second"]);
    assert!(tasks.iter().all(|task| task.status() == TaskStatus::Todo));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn strangers_cannot_create_tasks(world: World) {
    let project = world.project().await;

    let err = world
        .board
        .create_task(project.id(), UserId::new(), CreateTaskRequest::new("sneaky"))
        .await
        .expect_err("only the owner may add tasks");

    assert!(matches!(
        err,
        TaskServiceError::Workspace(WorkspaceServiceError::Forbidden(_))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_titles_fail_validation(world: World) {
    let project = world.project().await;

    let err = world
        .board
        .create_task(project.id(), world.owner, CreateTaskRequest::new("  "))
        .await
        .expect_err("blank titles are invalid");

    assert!(matches!(err, TaskServiceError::Domain(TaskDomainError::EmptyTitle)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tasks_of_other_projects_are_not_found(world: World) {
    let project = world.project().await;
    let other = world.project().await;
    let task = world.task(&other, "elsewhere").await;

    let err = world
        .board
        .get_task(project.id(), task.id(), world.owner)
        .await
        .expect_err("task lives in another project");

    assert!(matches!(err, TaskServiceError::TaskNotFound(id) if id == task.id()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn moves_follow_the_transition_table(world: World) {
    let project = world.project().await;
    let task = world.task(&project, "review me").await;

    let moved = world
        .board
        .move_task(project.id(), task.id(), world.owner, TaskStatus::InProgress, 4)
        .await
        .expect("todo -> in_progress");
    assert_eq!(moved.status(), TaskStatus::InProgress);
    assert_eq!(moved.position(), 4);

    let err = world
        .board
        .move_task(project.id(), task.id(), world.owner, TaskStatus::Done, 0)
        .await
        .expect_err("in_progress -> done skips review");
    assert!(matches!(
        err,
        TaskServiceError::Domain(TaskDomainError::InvalidStatusTransition { .. })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn running_tasks_cannot_be_moved_out_of_progress(world: World) {
    let (project, task) = world.ready_task().await;
    world
        .coordinator
        .execute_task(project.id(), task.id(), world.owner)
        .await
        .expect("execution should start");

    let err = world
        .board
        .move_task(project.id(), task.id(), world.owner, TaskStatus::AiReview, 0)
        .await
        .expect_err("an active session pins the task");

    assert!(matches!(
        err,
        TaskServiceError::Session(SessionServiceError::SessionAlreadyActive(id)) if id == task.id()
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_sessions_are_listed_newest_first(world: World) {
    let (project, task) = world.ready_task().await;
    let first = world
        .coordinator
        .execute_task(project.id(), task.id(), world.owner)
        .await
        .expect("first execution starts");
    world
        .coordinator
        .stop_task(project.id(), task.id(), world.owner)
        .await
        .expect("first execution stops");
    let second = world
        .coordinator
        .execute_task(project.id(), task.id(), world.owner)
        .await
        .expect("second execution starts");

    let sessions = world
        .board
        .task_sessions(project.id(), task.id(), world.owner)
        .await
        .expect("sessions should list");

    let ids: Vec<_> = sessions.iter().map(|session| session.id()).collect();
    assert_eq!(ids, [second.session_id, first.session_id]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_task_waits_for_its_session_to_stop(world: World) {
    let (project, task) = world.ready_task().await;
    world
        .coordinator
        .execute_task(project.id(), task.id(), world.owner)
        .await
        .expect("execution should start");

    let err = world
        .board
        .delete_task(project.id(), task.id(), world.owner)
        .await
        .expect_err("an active session pins the task");
    assert!(matches!(
        err,
        TaskServiceError::Session(SessionServiceError::SessionAlreadyActive(id)) if id == task.id()
    ));

    world
        .coordinator
        .stop_task(project.id(), task.id(), world.owner)
        .await
        .expect("stop should succeed");
    world
        .board
        .delete_task(project.id(), task.id(), world.owner)
        .await
        .expect("idle tasks can be deleted");

    let missing = world
        .board
        .get_task(project.id(), task.id(), world.owner)
        .await
        .expect_err("task is gone");
    assert!(matches!(missing, TaskServiceError::TaskNotFound(id) if id == task.id()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tasks_of_other_projects_are_not_deleted(world: World) {
    let (_, task) = world.ready_task().await;
    let other = world.project().await;

    let err = world
        .board
        .delete_task(other.id(), task.id(), world.owner)
        .await
        .expect_err("task lives in another project");

    assert!(matches!(err, TaskServiceError::TaskNotFound(id) if id == task.id()));
    assert!(
        world
            .tasks
            .find_by_id(task.id())
            .await
            .expect("lookup succeeds")
            .is_some()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn active_project_sessions_skip_settled_runs(world: World) {
    let (project, task) = world.ready_task().await;
    let stopped = world.task(&project, "Stopped").await;
    let running = world
        .coordinator
        .execute_task(project.id(), task.id(), world.owner)
        .await
        .expect("execution should start");
    world
        .coordinator
        .execute_task(project.id(), stopped.id(), world.owner)
        .await
        .expect("execution should start");
    world
        .coordinator
        .stop_task(project.id(), stopped.id(), world.owner)
        .await
        .expect("stop should succeed");

    let active = world
        .board
        .active_project_sessions(project.id(), world.owner)
        .await
        .expect("sessions list");
    let err = world
        .board
        .active_project_sessions(project.id(), UserId::new())
        .await
        .expect_err("caller does not own the project");

    let ids: Vec<_> = active.iter().map(|session| session.id()).collect();
    assert_eq!(ids, [running.session_id]);
    assert!(matches!(
        err,
        TaskServiceError::Workspace(WorkspaceServiceError::Forbidden(_))
    ));
}
