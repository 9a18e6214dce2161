//! Interaction sessions over a real listener.

use std::net::SocketAddr;
use std::time::Duration;

use crate::test_helpers::TestApp;
use axum::http::{Method, StatusCode};
use futures::{SinkExt, StreamExt};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error, Message, client::IntoClientRequest};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use vibe_control::http::auth::USER_ID_HEADER;
use vibe_control::workspace::domain::UserId;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[fixture]
fn app() -> TestApp {
    TestApp::new()
}

async fn serve(app: &TestApp) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener binds");
    let address = listener.local_addr().expect("listener has an address");
    let router = app.router.clone();
    tokio::spawn(async move { axum::serve(listener, router).await });
    address
}

async fn connect(address: SocketAddr, task_id: &str, user: UserId) -> Result<Socket, Error> {
    let mut request = format!("ws://{address}/api/tasks/{task_id}/interact")
        .into_client_request()
        .expect("valid websocket url");
    request.headers_mut().insert(
        USER_ID_HEADER,
        user.to_string().parse().expect("header value"),
    );
    connect_async(request).await.map(|(socket, _)| socket)
}

async fn next_json(socket: &mut Socket) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("frame arrives in time")
            .expect("socket is open")
            .expect("frame is readable");
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).expect("server frames are JSON");
        }
    }
}

fn contents(batch: &Value) -> Vec<&str> {
    batch["messages"]
        .as_array()
        .expect("messages array")
        .iter()
        .filter_map(|message| message["content"].as_str())
        .collect()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn history_arrives_before_live_messages(app: TestApp) {
    let (project_id, task_id) = app.ready_task().await;
    let session_id = app.execute(&project_id, &task_id).await;
    let posted = app
        .callback(Method::POST, format!("/api/sessions/{session_id}/messages"))
        .json(&json!({"type": "agent_response", "content": "Working on it"}))
        .send()
        .await;
    assert_eq!(posted.status, StatusCode::CREATED);
    let address = serve(&app).await;

    let mut socket = connect(address, &task_id, app.owner)
        .await
        .expect("owner may connect");
    let history = next_json(&mut socket).await;
    socket
        .send(Message::Text(
            json!({"type": "user_message", "content": "Please add tests"}).to_string(),
        ))
        .await
        .expect("socket accepts frames");
    let live = next_json(&mut socket).await;

    assert_eq!(history["type"], "history");
    assert!(contents(&history).contains(&"Working on it"));
    assert_eq!(live["type"], "user_message");
    assert_eq!(live["content"], "Please add tests");
    assert!(live["id"].is_string());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn agent_messages_reach_connected_clients(app: TestApp) {
    let (project_id, task_id) = app.ready_task().await;
    let session_id = app.execute(&project_id, &task_id).await;
    let address = serve(&app).await;
    let mut socket = connect(address, &task_id, app.owner)
        .await
        .expect("owner may connect");
    let _history = next_json(&mut socket).await;

    app.callback(Method::POST, format!("/api/sessions/{session_id}/messages"))
        .json(&json!({"type": "agent_response", "content": "Step one done"}))
        .send()
        .await;

    let live = loop {
        let frame = next_json(&mut socket).await;
        if frame["content"] == "Step one done" {
            break frame;
        }
    };
    assert_eq!(live["type"], "agent_response");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn strangers_are_refused_before_the_upgrade(app: TestApp) {
    let (_, task_id) = app.ready_task().await;
    let address = serve(&app).await;

    let err = connect(address, &task_id, UserId::new())
        .await
        .expect_err("stranger must be refused");

    let Error::Http(response) = err else {
        panic!("expected an HTTP refusal, got {err:?}");
    };
    assert_eq!(response.status().as_u16(), 403);
}
