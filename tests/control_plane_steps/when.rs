//! When steps for control-plane BDD scenarios.

use super::world::{ControlPlaneWorld, run_async};
use axum::http::Method;
use rstest_bdd_macros::when;

fn task_action(world: &ControlPlaneWorld, action: &str) -> Result<String, eyre::Report> {
    Ok(format!(
        "/api/projects/{}/tasks/{}/{action}",
        world.project_id()?,
        world.task_id()?
    ))
}

#[when("the owner stops the task")]
fn stop_task(world: &mut ControlPlaneWorld) -> Result<(), eyre::Report> {
    let uri = task_action(world, "stop")?;
    let reply = run_async(world.app.request(Method::POST, uri).send());
    world.replies.push(reply);
    Ok(())
}

#[when("the owner executes the task twice at once")]
fn execute_twice(world: &mut ControlPlaneWorld) -> Result<(), eyre::Report> {
    let uri = task_action(world, "execute")?;
    let app = &world.app;
    let (first, second) = run_async(async {
        tokio::join!(
            app.request(Method::POST, &uri).send(),
            app.request(Method::POST, &uri).send()
        )
    });
    world.replies.extend([first, second]);
    Ok(())
}

#[when("the owner requests output of the second task for the running session")]
fn foreign_output(world: &mut ControlPlaneWorld) -> Result<(), eyre::Report> {
    let second = world
        .second_task_id
        .as_deref()
        .ok_or_else(|| eyre::eyre!("missing second task in scenario world"))?;
    let session_id = world
        .session_id
        .as_deref()
        .ok_or_else(|| eyre::eyre!("missing running session in scenario world"))?;
    let uri = format!(
        "/api/projects/{}/tasks/{second}/output?session_id={session_id}",
        world.project_id()?
    );
    let reply = run_async(world.app.request(Method::GET, uri).send());
    world.replies.push(reply);
    Ok(())
}

#[when("the owner rolls back to version {version:u32}")]
fn roll_back(world: &mut ControlPlaneWorld, version: u32) -> Result<(), eyre::Report> {
    let uri = format!(
        "/api/projects/{}/config/rollback/{version}",
        world.project_id()?
    );
    let reply = run_async(world.app.request(Method::POST, uri).send());
    world.replies.push(reply);
    Ok(())
}

#[when("the owner deletes version {version:u32}")]
fn delete_version(world: &mut ControlPlaneWorld, version: u32) -> Result<(), eyre::Report> {
    let uri = format!(
        "/api/projects/{}/config/versions/{version}",
        world.project_id()?
    );
    let reply = run_async(world.app.request(Method::DELETE, uri).send());
    world.replies.push(reply);
    Ok(())
}
