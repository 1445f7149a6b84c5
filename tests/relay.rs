//! End-to-end tests over a real WebSocket

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use motion_relay::{MotionServer, RegistryConfig, ServerConfig, ServerHandle};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);
const QUIET_PERIOD: Duration = Duration::from_millis(200);

async fn start(config: ServerConfig) -> ServerHandle {
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    MotionServer::new(config.bind(addr)).spawn().await.unwrap()
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws
}

async fn send(ws: &mut Client, event: Value) {
    ws.send(Message::text(event.to_string())).await.unwrap();
}

async fn recv(ws: &mut Client) -> Value {
    loop {
        let msg = timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn assert_silent(ws: &mut Client) {
    if let Ok(Some(Ok(Message::Text(text)))) = timeout(QUIET_PERIOD, ws.next()).await {
        panic!("unexpected frame: {}", text.as_str());
    }
}

/// Round-trip a list request so every earlier event from this client has
/// been applied by the relay
async fn sync(ws: &mut Client) -> Value {
    send(ws, json!({ "event": "list-devices" })).await;
    let reply = recv(ws).await;
    assert_eq!(reply["event"], "device-list");
    reply
}

fn sample(device: &str, ts: i64) -> Value {
    json!({
        "event": "new-sample",
        "data": {
            "deviceId": device,
            "timeStamp": ts,
            "acceleration": { "x": 0.0, "y": 0.0, "z": -9.81 }
        }
    })
}

fn timestamps(batch: &Value) -> Vec<i64> {
    batch["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["timeStamp"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_connect_receives_device_list() {
    let server = start(ServerConfig::default()).await;
    let mut client = connect(server.local_addr()).await;

    let first = recv(&mut client).await;
    assert_eq!(first, json!({ "event": "device-list", "data": [] }));

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_samples_reach_only_subscribers() {
    let server = start(ServerConfig::default()).await;
    let addr = server.local_addr();

    let mut producer = connect(addr).await;
    let mut viewer = connect(addr).await;
    let mut bystander = connect(addr).await;
    recv(&mut producer).await;
    recv(&mut viewer).await;
    recv(&mut bystander).await;

    send(&mut producer, json!({ "event": "register-device", "data": { "deviceId": "d1" } })).await;
    let expected = json!({ "event": "device-list", "data": ["d1"] });
    assert_eq!(recv(&mut producer).await, expected);
    assert_eq!(recv(&mut viewer).await, expected);
    assert_eq!(recv(&mut bystander).await, expected);

    send(&mut viewer, json!({ "event": "subscribe-device", "data": { "deviceId": "d1" } })).await;
    sync(&mut viewer).await;

    send(&mut producer, sample("d1", 1)).await;
    send(&mut producer, sample("d1", 2)).await;

    let batch = recv(&mut viewer).await;
    assert_eq!(batch["event"], "sample-batch");
    assert_eq!(timestamps(&batch), vec![1]);
    assert_eq!(batch["data"][0]["deviceId"], "d1");

    let batch = recv(&mut viewer).await;
    assert_eq!(timestamps(&batch), vec![1, 2]);

    assert_silent(&mut producer).await;
    assert_silent(&mut bystander).await;

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_buffer_window_over_socket() {
    let config = ServerConfig::default().registry(RegistryConfig::default().buffer_capacity(3));
    let server = start(config).await;
    let addr = server.local_addr();

    let mut producer = connect(addr).await;
    let mut viewer = connect(addr).await;
    recv(&mut producer).await;
    recv(&mut viewer).await;

    send(&mut producer, json!({ "event": "register-device", "data": { "deviceId": "d1" } })).await;
    recv(&mut viewer).await;
    send(&mut viewer, json!({ "event": "subscribe-device", "data": { "deviceId": "d1" } })).await;
    sync(&mut viewer).await;

    for ts in 0..5 {
        send(&mut producer, sample("d1", ts)).await;
    }

    let mut last = Value::Null;
    for _ in 0..5 {
        last = recv(&mut viewer).await;
    }
    assert_eq!(timestamps(&last), vec![2, 3, 4]);

    send(&mut producer, json!({ "event": "clear-samples", "data": { "deviceId": "d1" } })).await;
    let cleared = recv(&mut viewer).await;
    assert_eq!(cleared, json!({ "event": "sample-batch", "data": [] }));

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_switching_subscription() {
    let server = start(ServerConfig::default()).await;
    let addr = server.local_addr();

    let mut p1 = connect(addr).await;
    let mut p2 = connect(addr).await;
    let mut viewer = connect(addr).await;
    recv(&mut p1).await;
    recv(&mut p2).await;
    recv(&mut viewer).await;

    send(&mut p1, json!({ "event": "register-device", "data": { "deviceId": "d1" } })).await;
    for client in [&mut p1, &mut p2, &mut viewer] {
        recv(client).await;
    }
    send(&mut p2, json!({ "event": "register-device", "data": { "deviceId": "d2" } })).await;
    for client in [&mut p1, &mut p2, &mut viewer] {
        assert_eq!(recv(client).await["data"], json!(["d1", "d2"]));
    }

    send(&mut viewer, json!({ "event": "subscribe-device", "data": { "deviceId": "d1" } })).await;
    send(
        &mut viewer,
        json!({
            "event": "subscribe-device",
            "data": { "deviceId": "d2", "previousDeviceId": "d1" }
        }),
    )
    .await;
    sync(&mut viewer).await;

    send(&mut p1, sample("d1", 10)).await;
    sync(&mut p1).await;
    send(&mut p2, sample("d2", 20)).await;

    let batch = recv(&mut viewer).await;
    assert_eq!(batch["data"][0]["deviceId"], "d2");
    assert_eq!(timestamps(&batch), vec![20]);
    assert_silent(&mut viewer).await;

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_producer_disconnect_removes_device() {
    let server = start(ServerConfig::default()).await;
    let addr = server.local_addr();

    let mut producer = connect(addr).await;
    let mut viewer = connect(addr).await;
    recv(&mut producer).await;
    recv(&mut viewer).await;

    send(&mut producer, json!({ "event": "register-device", "data": { "deviceId": "d1" } })).await;
    assert_eq!(recv(&mut viewer).await["data"], json!(["d1"]));

    drop(producer);

    let update = recv(&mut viewer).await;
    assert_eq!(update, json!({ "event": "device-list", "data": [] }));

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_malformed_frames_are_ignored() {
    let server = start(ServerConfig::default()).await;
    let mut client = connect(server.local_addr()).await;
    recv(&mut client).await;

    client.send(Message::text("not json".to_string())).await.unwrap();
    send(&mut client, json!({ "event": "reboot" })).await;
    send(&mut client, json!({ "event": "new-sample", "data": { "deviceId": "d1" } })).await;

    // Connection still serves requests
    let reply = sync(&mut client).await;
    assert_eq!(reply["data"], json!([]));

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_legacy_event_names() {
    let server = start(ServerConfig::default()).await;
    let mut client = connect(server.local_addr()).await;
    recv(&mut client).await;

    send(&mut client, json!({ "event": "new_device", "data": { "deviceId": "TJVSV" } })).await;
    assert_eq!(recv(&mut client).await["data"], json!(["TJVSV"]));

    send(&mut client, json!({ "event": "clear_all_devices" })).await;
    assert_eq!(
        recv(&mut client).await,
        json!({ "event": "device-list", "data": [] })
    );

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = start(ServerConfig::default()).await;
    let addr = server.local_addr();

    let mut client = connect(addr).await;
    recv(&mut client).await;
    send(&mut client, json!({ "event": "register-device", "data": { "deviceId": "d1" } })).await;
    recv(&mut client).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    timeout(RECV_TIMEOUT, stream.read_to_string(&mut response))
        .await
        .unwrap()
        .unwrap();

    assert!(response.starts_with("HTTP/1.1 200"));
    let body = response.split("\r\n\r\n").nth(1).unwrap();
    let health: Value = serde_json::from_str(body).unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["devices"], 1);
    assert_eq!(health["connections"], 1);
    assert_eq!(health["producers"], 1);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_bind_conflict_is_reported() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = taken.local_addr().unwrap();

    let result = MotionServer::new(ServerConfig::with_addr(addr)).spawn().await;
    assert!(result.is_err());
}
