use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use todo_api::{server, ServerSettings};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

fn test_router() -> Router {
    Router::new()
        .route("/ping", get(|| async { "pong" }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                "done"
            }),
        )
        .route(
            "/stuck",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                "late"
            }),
        )
}

/// 127.0.0.1 の空きポートでサーバを起動し、停止用の送信側を返す
async fn start(
    shutdown_grace: Duration,
) -> (SocketAddr, oneshot::Sender<()>, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let settings = ServerSettings {
        shutdown_grace,
        ..ServerSettings::default()
    };
    let (tx, rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(server::serve(listener, test_router(), settings, async {
        let _ = rx.await;
    }));

    (addr, tx, handle)
}

/// HTTP/1.1 で 1 リクエストだけ送り、レスポンス全体を文字列で返す
async fn fetch(addr: SocketAddr, path: &str) -> std::io::Result<String> {
    let mut stream = TcpStream::connect(addr).await?;
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;

    let mut response = String::new();
    stream.read_to_string(&mut response).await?;
    Ok(response)
}

#[tokio::test]
async fn serves_requests_until_shutdown() {
    let (addr, tx, handle) = start(Duration::from_secs(5)).await;

    let response = fetch(addr, "/ping").await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.ends_with("pong"));

    tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("server did not stop")
        .unwrap();

    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn in_flight_request_completes_during_grace_period() {
    let (addr, tx, handle) = start(Duration::from_secs(5)).await;

    let in_flight = tokio::spawn(fetch(addr, "/slow"));
    // リクエストがハンドラに到達するまで待つ
    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(()).unwrap();

    let response = in_flight.await.unwrap().unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.ends_with("done"));

    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("server did not stop")
        .unwrap();
}

#[tokio::test]
async fn shutdown_gives_up_after_grace_period() {
    let (addr, tx, handle) = start(Duration::from_millis(100)).await;

    let _stuck = tokio::spawn(fetch(addr, "/stuck"));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("server waited past the grace period")
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
}
