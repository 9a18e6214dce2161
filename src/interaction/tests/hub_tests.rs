//! Tests for the per-task connection registry.

use crate::interaction::domain::{MessageFrame, ServerFrame};
use crate::interaction::services::{BroadcastHub, ConnectionId};
use crate::task::domain::TaskId;
use mockable::{Clock, DefaultClock};
use rstest::{fixture, rstest};
use tokio::sync::mpsc;

#[fixture]
fn hub() -> BroadcastHub {
    BroadcastHub::new()
}

fn frame(content: &str) -> ServerFrame {
    ServerFrame::Message(MessageFrame::error(content, DefaultClock.utc()))
}

#[rstest]
fn registration_is_counted_per_task(hub: BroadcastHub) {
    let task = TaskId::new();
    let other = TaskId::new();
    let (outbox, _inbox) = mpsc::channel(4);
    let connection = ConnectionId::new();

    hub.register(task, connection, outbox.clone());
    hub.register(task, connection, outbox.clone());
    hub.register(task, ConnectionId::new(), outbox);

    assert_eq!(hub.connection_count(task), 2);
    assert_eq!(hub.connection_count(other), 0);

    hub.unregister(task, connection);
    hub.unregister(task, connection);
    hub.unregister(other, connection);
    assert_eq!(hub.connection_count(task), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn broadcasts_reach_only_the_task_connections(hub: BroadcastHub) {
    let task = TaskId::new();
    let (first, mut first_inbox) = mpsc::channel(4);
    let (second, mut second_inbox) = mpsc::channel(4);
    let (bystander, mut bystander_inbox) = mpsc::channel(4);
    hub.register(task, ConnectionId::new(), first);
    hub.register(task, ConnectionId::new(), second);
    hub.register(TaskId::new(), ConnectionId::new(), bystander);

    let hello = frame("hello");

    let delivered = hub.broadcast(task, &hello);

    assert_eq!(delivered, 2);
    assert_eq!(first_inbox.recv().await.as_ref(), Some(&hello));
    assert_eq!(second_inbox.recv().await.as_ref(), Some(&hello));
    assert!(bystander_inbox.try_recv().is_err());
}

#[rstest]
fn full_outboxes_are_evicted_without_blocking(hub: BroadcastHub) {
    let task = TaskId::new();
    let (slow, mut slow_inbox) = mpsc::channel(1);
    let (fast, mut fast_inbox) = mpsc::channel(8);
    hub.register(task, ConnectionId::new(), slow);
    hub.register(task, ConnectionId::new(), fast);

    assert_eq!(hub.broadcast(task, &frame("one")), 2);
    assert_eq!(hub.broadcast(task, &frame("two")), 1);
    assert_eq!(hub.connection_count(task), 1);
    assert_eq!(hub.broadcast(task, &frame("three")), 1);

    assert!(slow_inbox.try_recv().is_ok());
    assert_eq!(
        slow_inbox.try_recv(),
        Err(mpsc::error::TryRecvError::Disconnected)
    );
    for _ in 0..3 {
        assert!(fast_inbox.try_recv().is_ok());
    }
}

#[rstest]
fn re_registration_replaces_a_full_outbox(hub: BroadcastHub) {
    let task = TaskId::new();
    let connection = ConnectionId::new();
    let (full, _full_inbox) = mpsc::channel(1);
    hub.register(task, connection, full.clone());
    assert_eq!(hub.broadcast(task, &frame("fills")), 1);
    let (fresh, mut fresh_inbox) = mpsc::channel(4);
    hub.register(task, connection, fresh);
    drop(full);

    assert_eq!(hub.broadcast(task, &frame("after")), 1);
    assert_eq!(hub.connection_count(task), 1);
    assert!(fresh_inbox.try_recv().is_ok());
}

#[rstest]
fn closed_outboxes_are_not_counted(hub: BroadcastHub) {
    let task = TaskId::new();
    let (gone, inbox) = mpsc::channel(4);
    drop(inbox);
    hub.register(task, ConnectionId::new(), gone);

    assert_eq!(hub.broadcast(task, &frame("anyone?")), 0);
    assert_eq!(hub.connection_count(task), 0);
}

#[rstest]
fn broadcasting_to_an_idle_task_delivers_nothing(hub: BroadcastHub) {
    assert_eq!(hub.broadcast(TaskId::new(), &frame("echo")), 0);
}
