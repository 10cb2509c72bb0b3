//! Integration tests for the push channel.
//!
//! A mock Socket.IO server speaks Engine.IO v4 frames over a plain
//! `tokio-tungstenite` WebSocket.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use disasterwatch_client::push::{PushChannel, PushEvent};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};
use url::Url;

const HANDSHAKE: &str =
    r#"0{"sid":"s1","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

type ServerSocket = WebSocketStream<tokio::net::TcpStream>;

async fn accept(listener: &TcpListener) -> ServerSocket {
    let (stream, _) = listener.accept().await.unwrap();
    accept_async(stream).await.unwrap()
}

async fn recv_text(ws: &mut ServerSocket) -> String {
    loop {
        match ws.next().await.unwrap().unwrap() {
            Message::Text(text) => return text,
            _ => continue,
        }
    }
}

/// Open the Engine.IO session and join the default namespace.
async fn handshake(ws: &mut ServerSocket) {
    ws.send(Message::Text(HANDSHAKE.to_owned())).await.unwrap();
    assert_eq!(recv_text(ws).await, "40");
    ws.send(Message::Text(String::from(r#"40{"sid":"n1"}"#))).await.unwrap();
}

fn channel_for(listener: &TcpListener, reconnect: Option<Duration>) -> PushChannel {
    let addr = listener.local_addr().unwrap();
    let url = Url::parse(&format!("ws://{addr}/socket.io/?EIO=4&transport=websocket")).unwrap();
    PushChannel::new(url, "new_event", reconnect)
}

async fn next_event(sub: &mut disasterwatch_client::PushSubscription) -> PushEvent {
    timeout(Duration::from_secs(5), sub.next()).await.unwrap().unwrap()
}

fn alert_id(event: &PushEvent) -> Option<&str> {
    match event {
        PushEvent::Alert(raw) => raw.id.as_deref(),
        _ => None,
    }
}

#[tokio::test]
async fn forwards_alerts_in_order_and_answers_pings() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut sub = channel_for(&listener, None).subscribe();

    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        handshake(&mut ws).await;
        ws.send(Message::Text(String::from("2"))).await.unwrap();
        assert_eq!(recv_text(&mut ws).await, "3");
        for frame in [
            r#"42["new_event",{"_id":"a","disaster_type":"Flood","severity":"High"}]"#,
            r#"42["chat",{"text":"hi"}]"#,
            r#"42["new_event",{"_id":"b"}]"#,
            r#"42["new_event",{"_id":"c"}]"#,
        ] {
            ws.send(Message::Text(frame.to_owned())).await.unwrap();
        }
        ws.close(None).await.unwrap();
    });

    assert_eq!(next_event(&mut sub).await, PushEvent::Connected);
    let received = [
        next_event(&mut sub).await,
        next_event(&mut sub).await,
        next_event(&mut sub).await,
    ];
    let ids: Vec<_> = received.iter().map(alert_id).collect();
    assert_eq!(ids, [Some("a"), Some("b"), Some("c")]);
    assert!(matches!(next_event(&mut sub).await, PushEvent::Disconnected { .. }));

    server.await.unwrap();
    // Reconnection disabled: the stream ends.
    assert!(timeout(Duration::from_secs(5), sub.next()).await.unwrap().is_none());
}

#[tokio::test]
async fn reconnects_after_drop() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut sub = channel_for(&listener, Some(Duration::from_millis(20))).subscribe();

    let server = tokio::spawn(async move {
        let mut first = accept(&listener).await;
        handshake(&mut first).await;
        first.send(Message::Text(String::from(r#"42["new_event",{"_id":"1"}]"#))).await.unwrap();
        drop(first);

        let mut second = accept(&listener).await;
        handshake(&mut second).await;
        second.send(Message::Text(String::from(r#"42["new_event",{"_id":"2"}]"#))).await.unwrap();
        // Hold the socket open until the client is done.
        let _ = second.next().await;
    });

    assert_eq!(next_event(&mut sub).await, PushEvent::Connected);
    assert_eq!(alert_id(&next_event(&mut sub).await), Some("1"));
    assert!(matches!(next_event(&mut sub).await, PushEvent::Disconnected { .. }));
    assert_eq!(next_event(&mut sub).await, PushEvent::Connected);
    assert_eq!(alert_id(&next_event(&mut sub).await), Some("2"));

    drop(sub);
    // Dropping the subscription closes the socket, which ends the server.
    timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
}

#[tokio::test]
async fn connect_error_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut sub = channel_for(&listener, None).subscribe();

    tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        ws.send(Message::Text(HANDSHAKE.to_owned())).await.unwrap();
        let _ = recv_text(&mut ws).await;
        ws.send(Message::Text(String::from(r#"44{"message":"Not authorized"}"#)))
            .await
            .unwrap();
        let _ = ws.next().await;
    });

    let event = next_event(&mut sub).await;
    assert!(
        matches!(&event, PushEvent::Disconnected { reason } if reason.contains("Not authorized")),
        "unexpected {event:?}"
    );
}

#[tokio::test]
async fn non_object_alerts_are_dropped() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut sub = channel_for(&listener, None).subscribe();

    tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        handshake(&mut ws).await;
        for frame in [
            r#"42["new_event","flood"]"#,
            "42 not json",
            r#"42["new_event",{"_id":7,"severity":3}]"#,
        ] {
            ws.send(Message::Text(frame.to_owned())).await.unwrap();
        }
        let _ = ws.next().await;
    });

    assert_eq!(next_event(&mut sub).await, PushEvent::Connected);
    assert_eq!(alert_id(&next_event(&mut sub).await), Some("7"));
}
