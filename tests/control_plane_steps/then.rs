//! Then steps for control-plane BDD scenarios.

use super::world::{ControlPlaneWorld, run_async};
use axum::http::{Method, StatusCode};
use rstest_bdd_macros::then;
use serde_json::Value;

fn fetch(world: &ControlPlaneWorld, uri: String) -> Result<Value, eyre::Report> {
    let reply = run_async(world.app.request(Method::GET, uri).send());
    eyre::ensure!(
        reply.status == StatusCode::OK,
        "lookup failed with {}: {:?}",
        reply.status,
        reply.body
    );
    Ok(reply.body)
}

fn task_sessions(world: &ControlPlaneWorld) -> Result<Vec<Value>, eyre::Report> {
    let body = fetch(
        world,
        format!(
            "/api/projects/{}/tasks/{}/sessions",
            world.project_id()?,
            world.task_id()?
        ),
    )?;
    body["sessions"]
        .as_array()
        .cloned()
        .ok_or_else(|| eyre::eyre!("sessions reply is not a list"))
}

fn config_versions(world: &ControlPlaneWorld) -> Result<Vec<Value>, eyre::Report> {
    let body = fetch(
        world,
        format!("/api/projects/{}/config/versions", world.project_id()?),
    )?;
    body.as_array()
        .cloned()
        .ok_or_else(|| eyre::eyre!("versions reply is not a list"))
}

#[then("the response status is {status:u16}")]
fn response_status(world: &ControlPlaneWorld, status: u16) -> Result<(), eyre::Report> {
    let reply = world.last_reply()?;
    eyre::ensure!(
        reply.status.as_u16() == status,
        "expected {status}, got {}: {:?}",
        reply.status,
        reply.body
    );
    Ok(())
}

#[then(r#"the task status is "{status}""#)]
fn task_status(world: &ControlPlaneWorld, status: String) -> Result<(), eyre::Report> {
    let task = fetch(
        world,
        format!(
            "/api/projects/{}/tasks/{}",
            world.project_id()?,
            world.task_id()?
        ),
    )?;
    eyre::ensure!(
        task["status"] == status.as_str(),
        "expected task status {status}, found {}",
        task["status"]
    );
    Ok(())
}

#[then("one execution succeeds and one conflicts")]
fn one_winner(world: &ControlPlaneWorld) -> Result<(), eyre::Report> {
    let mut statuses: Vec<_> = world.replies.iter().map(|reply| reply.status).collect();
    statuses.sort();
    eyre::ensure!(
        statuses == [StatusCode::OK, StatusCode::CONFLICT],
        "expected one 200 and one 409, got {statuses:?}"
    );
    Ok(())
}

#[then("the task has {count:usize} session")]
fn session_count(world: &ControlPlaneWorld, count: usize) -> Result<(), eyre::Report> {
    let sessions = task_sessions(world)?;
    eyre::ensure!(
        sessions.len() == count,
        "expected {count} sessions, found {}",
        sessions.len()
    );
    Ok(())
}

#[then(r#"the latest session status is "{status}""#)]
fn latest_session_status(world: &ControlPlaneWorld, status: String) -> Result<(), eyre::Report> {
    let sessions = task_sessions(world)?;
    let latest = sessions
        .first()
        .ok_or_else(|| eyre::eyre!("task has no sessions"))?;
    eyre::ensure!(
        latest["status"] == status.as_str(),
        "expected session status {status}, found {}",
        latest["status"]
    );
    Ok(())
}

#[then("no output stream was opened")]
fn no_output_stream(world: &ControlPlaneWorld) -> Result<(), eyre::Report> {
    let opens = world.app.sidecar.stream_opens();
    eyre::ensure!(opens.is_empty(), "upstream streams were opened: {opens:?}");
    Ok(())
}

#[then("the active configuration version is {version:u64}")]
fn active_version(world: &ControlPlaneWorld, version: u64) -> Result<(), eyre::Report> {
    let active = fetch(
        world,
        format!("/api/projects/{}/config", world.project_id()?),
    )?;
    eyre::ensure!(
        active["version"].as_u64() == Some(version),
        "expected active version {version}, found {}",
        active["version"]
    );
    Ok(())
}

#[then("versions {first:u64} and {second:u64} are inactive")]
fn versions_inactive(world: &ControlPlaneWorld, first: u64, second: u64) -> Result<(), eyre::Report> {
    let versions = config_versions(world)?;
    for wanted in [first, second] {
        let config = versions
            .iter()
            .find(|config| config["version"].as_u64() == Some(wanted))
            .ok_or_else(|| eyre::eyre!("version {wanted} is missing"))?;
        eyre::ensure!(
            config["is_active"] == false,
            "version {wanted} is still active"
        );
    }
    Ok(())
}

#[then("the configuration history has {count:usize} version")]
fn history_length(world: &ControlPlaneWorld, count: usize) -> Result<(), eyre::Report> {
    let versions = config_versions(world)?;
    eyre::ensure!(
        versions.len() == count,
        "expected {count} versions, found {}",
        versions.len()
    );
    Ok(())
}
