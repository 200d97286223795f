// Tests for the WebSocket transport against a local axum server

use axum::{
    extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
    Router,
};
use plant_chat::{InboundEvent, Transport, TransportError, WebSocketTransport};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;

async fn echo(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(|mut socket: WebSocket| async move {
        while let Some(Ok(message)) = socket.recv().await {
            let reply = match message {
                Message::Text(text) => format!("echo: {}", text),
                Message::Binary(data) => format!("got {} bytes", data.len()),
                Message::Close(_) => break,
                _ => continue,
            };
            if socket.send(Message::Text(reply)).await.is_err() {
                break;
            }
        }
    })
}

async fn goodbye(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(|mut socket: WebSocket| async move {
        let _ = socket.send(Message::Text("last words".to_string())).await;
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: 1000,
                reason: "session over".into(),
            })))
            .await;
    })
}

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/ws", get(echo))
        .route("/bye", get(goodbye));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("ws://{}", addr)
}

async fn next_event(rx: &mut mpsc::Receiver<InboundEvent>) -> InboundEvent {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for inbound event")
        .expect("inbound channel closed")
}

#[tokio::test]
async fn test_text_frames_round_trip() {
    let base = spawn_server().await;
    let transport = WebSocketTransport::new(format!("{}/ws", base));

    let mut inbound = transport.connect().await.unwrap();
    assert!(transport.is_open());

    transport.send_text("is my monstera thirsty?").await.unwrap();
    match next_event(&mut inbound).await {
        InboundEvent::Text(text) => assert_eq!(text, "echo: is my monstera thirsty?"),
        other => panic!("unexpected event {:?}", other),
    }

    transport.send_binary(vec![0; 32], "audio/wav").await.unwrap();
    match next_event(&mut inbound).await {
        InboundEvent::Text(text) => assert_eq!(text, "got 32 bytes"),
        other => panic!("unexpected event {:?}", other),
    }

    transport.close().await.unwrap();
    assert!(!transport.is_open());
}

#[tokio::test]
async fn test_server_close_is_reported() {
    let base = spawn_server().await;
    let transport = WebSocketTransport::new(format!("{}/bye", base));

    let mut inbound = transport.connect().await.unwrap();

    match next_event(&mut inbound).await {
        InboundEvent::Text(text) => assert_eq!(text, "last words"),
        other => panic!("unexpected event {:?}", other),
    }
    match next_event(&mut inbound).await {
        InboundEvent::Closed(reason) => assert_eq!(reason.as_deref(), Some("session over")),
        other => panic!("unexpected event {:?}", other),
    }

    assert!(!transport.is_open());
    let err = transport.send_text("anyone there?").await.unwrap_err();
    assert!(matches!(err, TransportError::Closed));
}

#[tokio::test]
async fn test_send_before_connect_is_rejected() {
    let transport = WebSocketTransport::new("ws://127.0.0.1:1/ws");

    let err = transport.send_text("hello").await.unwrap_err();
    assert!(matches!(err, TransportError::Closed));
}

#[tokio::test]
async fn test_connect_failure_names_the_url() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = format!("ws://{}/ws", addr);
    let transport = WebSocketTransport::new(url.clone());

    match transport.connect().await {
        Err(TransportError::Connect { url: failed, .. }) => assert_eq!(failed, url),
        Err(other) => panic!("unexpected error {:?}", other),
        Ok(_) => panic!("connected to a closed port"),
    }
    assert!(!transport.is_open());
}
