// End-to-end tests: a real listener driven by WebSocket clients, and the
// HTTP router driven in-process.
use crate::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server(config: ServerConfig) -> (Arc<RoomServer>, SocketAddr, JoinHandle<Result<(), ServerError>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Arc::new(RoomServer::new(config));
    let handle = {
        let server = server.clone();
        tokio::spawn(async move { server.serve(listener).await })
    };
    (server, addr, handle)
}

async fn join(addr: SocketAddr, room: &str, player: &str) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}/ws/{room}/{player}"))
        .await
        .expect("upgrade should succeed");
    client
}

async fn next_json(client: &mut Client) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a message")
            .expect("connection ended")
            .expect("websocket error");
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn send_json(client: &mut Client, value: Value) {
    client.send(Message::text(value.to_string())).await.unwrap();
}

/// Waits until the server closes the socket.
async fn expect_closed(client: &mut Client) {
    loop {
        match tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for close")
        {
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
            Some(Ok(_)) => continue,
        }
    }
}

fn default_data() -> Value {
    json!({"x": 400.0, "y": 300.0, "trail": [], "score": 0})
}

#[tokio::test(flavor = "multi_thread")]
async fn test_join_and_leave_over_websocket() {
    let (server, addr, _handle) = start_server(ServerConfig::default()).await;

    let mut a = join(addr, "r1", "A").await;
    assert_eq!(next_json(&mut a).await, json!({"type": "roomState", "players": []}));

    let mut b = join(addr, "r1", "B").await;
    assert_eq!(
        next_json(&mut b).await,
        json!({"type": "roomState", "players": [{"id": "A", "data": default_data()}]})
    );
    assert_eq!(
        next_json(&mut a).await,
        json!({"type": "playerJoined", "playerId": "B", "data": default_data()})
    );

    b.close(None).await.unwrap();
    assert_eq!(next_json(&mut a).await, json!({"type": "playerLeft", "playerId": "B"}));

    let manager = server.room_manager();
    assert_eq!(
        manager.members_of(&types::RoomId::from("r1")).await,
        vec![types::PlayerId::from("A")]
    );
    assert_eq!(manager.stats().await, RoomStats { rooms: 1, players: 1 });
}

#[tokio::test(flavor = "multi_thread")]
async fn test_updates_and_collections_are_relayed() {
    let (_server, addr, _handle) = start_server(ServerConfig::default()).await;

    let mut a = join(addr, "r1", "A").await;
    next_json(&mut a).await;
    let mut b = join(addr, "r1", "B").await;
    next_json(&mut b).await;
    next_json(&mut a).await;

    // Junk is ignored and the connection stays usable.
    b.send(Message::text("not json")).await.unwrap();
    send_json(&mut b, json!({"type": "chat", "text": "hi"})).await;
    send_json(&mut b, json!({"type": "emojiCollected", "emojiIndex": "one"})).await;

    send_json(&mut b, json!({"type": "playerUpdate", "data": {"x": 10, "y": 20}})).await;
    let update = next_json(&mut a).await;
    assert_eq!(update["type"], "playerUpdate");
    assert_eq!(update["playerId"], "B");
    assert_eq!(update["data"]["x"], 10.0);
    assert_eq!(update["data"]["y"], 20.0);
    assert_eq!(update["data"]["score"], 0);

    send_json(&mut b, json!({"type": "emojiCollected", "emojiIndex": 3})).await;
    let expected = json!({"type": "emojiCollected", "playerId": "B", "emojiIndex": 3});
    assert_eq!(next_json(&mut a).await, expected);
    // The sender sees its own collection but never its own update.
    assert_eq!(next_json(&mut b).await, expected);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rooms_are_isolated() {
    let (_server, addr, _handle) = start_server(ServerConfig::default()).await;

    let mut a = join(addr, "r1", "A").await;
    next_json(&mut a).await;
    let mut c = join(addr, "r2", "C").await;
    assert_eq!(next_json(&mut c).await, json!({"type": "roomState", "players": []}));

    send_json(&mut c, json!({"type": "emojiCollected", "emojiIndex": 1})).await;
    next_json(&mut c).await;
    send_json(&mut a, json!({"type": "emojiCollected", "emojiIndex": 2})).await;
    // A's next message is its own collection, not C's.
    assert_eq!(next_json(&mut a).await["emojiIndex"], 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reconnect_takes_over() {
    let (server, addr, _handle) = start_server(ServerConfig::default()).await;

    let mut a = join(addr, "r1", "A").await;
    next_json(&mut a).await;
    let mut old = join(addr, "r1", "B").await;
    next_json(&mut old).await;
    next_json(&mut a).await;

    let mut new = join(addr, "r1", "B").await;
    assert_eq!(
        next_json(&mut new).await,
        json!({"type": "roomState", "players": [{"id": "A", "data": default_data()}]})
    );
    assert_eq!(next_json(&mut a).await, json!({"type": "playerLeft", "playerId": "B"}));
    assert_eq!(next_json(&mut a).await["type"], "playerJoined");
    expect_closed(&mut old).await;

    // The replacement stays connected after the old socket is gone.
    send_json(&mut new, json!({"type": "emojiCollected", "emojiIndex": 5})).await;
    assert_eq!(next_json(&mut a).await["playerId"], "B");
    assert_eq!(server.room_manager().stats().await.players, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_identifiers_are_refused() {
    let (_server, addr, _handle) = start_server(ServerConfig::default()).await;

    let too_long = "x".repeat(65);
    match connect_async(format!("ws://{addr}/ws/r1/{too_long}")).await {
        Err(tungstenite::Error::Http(response)) => {
            assert_eq!(response.status(), StatusCode::BAD_REQUEST)
        }
        other => panic!("expected HTTP 400, got {:?}", other.map(|(_, response)| response.status())),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connection_limit_is_enforced() {
    let config = ServerConfig {
        max_connections: 1,
        ..Default::default()
    };
    let (_server, addr, _handle) = start_server(config).await;

    let mut a = join(addr, "r1", "A").await;
    next_json(&mut a).await;

    match connect_async(format!("ws://{addr}/ws/r1/B")).await {
        Err(tungstenite::Error::Http(response)) => {
            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE)
        }
        other => panic!("expected HTTP 503, got {:?}", other.map(|(_, response)| response.status())),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_closes_connections() {
    let (server, addr, handle) = start_server(ServerConfig::default()).await;

    let mut a = join(addr, "r1", "A").await;
    next_json(&mut a).await;

    server.shutdown().await.unwrap();
    expect_closed(&mut a).await;

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server should stop")
        .unwrap();
    assert!(result.is_ok());
    assert!(server.shutdown_state().is_shutdown_complete());
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn generate_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/generate")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_generate_endpoint() {
    let server = create_server();

    let response = server.router().oneshot(generate_request(r#"{"level": 3}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let puzzle = body_json(response).await;
    let trail = puzzle["trail"].as_array().unwrap();
    let options = puzzle["options"].as_array().unwrap();
    assert_eq!(trail.len(), 3);
    assert_eq!(options.len(), 12);
    assert!(trail.iter().all(|symbol| options.contains(symbol)));

    let response = server.router().oneshot(generate_request("{}")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["trail"].as_array().unwrap().len(), 1);

    let response = server.router().oneshot(generate_request(r#"{"level": 0}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_stats_endpoint() {
    let server = create_server();
    let manager = server.room_manager();
    let _a = manager.connect(types::RoomId::from("r1"), types::PlayerId::from("A")).await;
    let _b = manager.connect(types::RoomId::from("r2"), types::PlayerId::from("B")).await;

    let request = Request::builder().uri("/stats").body(Body::empty()).unwrap();
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"rooms": 2, "players": 2}));
}

#[tokio::test]
async fn test_static_assets() {
    let static_dir = tempfile::tempdir().unwrap();
    std::fs::write(static_dir.path().join("index.html"), "<h1>trail</h1>").unwrap();
    std::fs::write(static_dir.path().join("app.js"), "console.log('hi');").unwrap();

    let server = create_server_with_config(ServerConfig {
        static_directory: static_dir.path().to_path_buf(),
        ..Default::default()
    });

    let get = |uri: &str| Request::builder().uri(uri).body(Body::empty()).unwrap();

    let response = server.router().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&page[..], b"<h1>trail</h1>");

    let response = server.router().oneshot(get("/static/app.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/javascript; charset=utf-8"
    );

    let response = server.router().oneshot(get("/static/missing.css")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = server.router().oneshot(get("/static/../Cargo.toml")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_index_falls_back_without_static_dir() {
    let missing = tempfile::tempdir().unwrap();
    let server = create_server_with_config(ServerConfig {
        static_directory: missing.path().join("nope"),
        ..Default::default()
    });

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&page).contains("Emoji Trail"));
}
