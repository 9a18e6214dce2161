//! Given steps for control-plane BDD scenarios.

use super::world::{ControlPlaneWorld, run_async};
use axum::http::{Method, StatusCode};
use rstest_bdd_macros::given;

#[given("a project with an active configuration")]
fn configured_project(world: &mut ControlPlaneWorld) {
    let project_id = run_async(world.app.project());
    run_async(world.app.configure(&project_id));
    world.project_id = Some(project_id);
}

#[given("the configuration has been updated")]
fn configuration_updated(world: &mut ControlPlaneWorld) -> Result<(), eyre::Report> {
    let project_id = world.project_id()?.to_owned();
    run_async(world.app.configure(&project_id));
    Ok(())
}

#[given(r#"a task titled "{title}""#)]
fn task_titled(world: &mut ControlPlaneWorld, title: String) -> Result<(), eyre::Report> {
    let project_id = world.project_id()?.to_owned();
    world.task_id = Some(run_async(world.app.task(&project_id, &title)));
    Ok(())
}

#[given(r#"a second task titled "{title}""#)]
fn second_task_titled(world: &mut ControlPlaneWorld, title: String) -> Result<(), eyre::Report> {
    let project_id = world.project_id()?.to_owned();
    world.second_task_id = Some(run_async(world.app.task(&project_id, &title)));
    Ok(())
}

#[given("the task is executing")]
fn task_executing(world: &mut ControlPlaneWorld) -> Result<(), eyre::Report> {
    let uri = format!(
        "/api/projects/{}/tasks/{}/execute",
        world.project_id()?,
        world.task_id()?
    );
    let reply = run_async(world.app.request(Method::POST, uri).send());
    eyre::ensure!(
        reply.status == StatusCode::OK,
        "execution failed to start: {:?}",
        reply.body
    );
    let session_id = reply.body["session_id"]
        .as_str()
        .ok_or_else(|| eyre::eyre!("execution reply has no session_id"))?;
    world.session_id = Some(session_id.to_owned());
    Ok(())
}
