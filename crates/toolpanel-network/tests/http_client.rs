//! Integration tests for AuthClient
//!
//! These tests run the client against a minimal HTTP stub on a local socket,
//! checking the request that reaches the wire and the status that comes back.

use std::time::Duration;

use rstest::rstest;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use toolpanel_core::{OperationKind, PositionId};
use toolpanel_network::{
    AuthClient, AuthClientConfig, AuthClientError, AuthOutcome, AuthTransport,
    AuthorizationRequest,
};

/// Request as seen by the stub server.
#[derive(Debug)]
struct Captured {
    request_line: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl Captured {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

async fn read_request(stream: &mut TcpStream) -> Captured {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8(buf[..header_end].to_vec()).unwrap();
    let mut lines = head.split("\r\n").filter(|l| !l.is_empty());
    let request_line = lines.next().unwrap().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length: usize = headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
        .map(|(_, v)| v.parse().unwrap())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending body");
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = String::from_utf8(buf[header_end..header_end + content_length].to_vec()).unwrap();
    Captured {
        request_line,
        headers,
        body,
    }
}

/// Serve exactly one request, answering with `status`.
async fn spawn_stub(status: u16) -> (String, oneshot::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let captured = read_request(&mut stream).await;

        let response = format!(
            "HTTP/1.1 {} Stub\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            status
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();
        let _ = tx.send(captured);
    });

    (format!("http://{}/api/painel", addr), rx)
}

fn client_for(endpoint: String, timeout: Duration) -> AuthClient {
    AuthClient::new(AuthClientConfig { endpoint, timeout }).unwrap()
}

fn request(position: &str, kind: OperationKind, code: &str) -> AuthorizationRequest {
    AuthorizationRequest::new(&PositionId::new(position).unwrap(), kind, code)
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let (endpoint, captured) = spawn_stub(201).await;
    let client = client_for(endpoint, Duration::from_secs(2));

    let status = client
        .post(&request("1", OperationKind::Take, "4321"))
        .await
        .unwrap();
    assert_eq!(status, 201);

    let captured = captured.await.unwrap();
    assert!(captured.request_line.starts_with("POST /api/painel "));
    assert_eq!(captured.header("content-type"), Some("application/json"));

    let body: serde_json::Value = serde_json::from_str(&captured.body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({"posicao": "1", "tipoOperacao": "Retirada", "codigo": "4321"})
    );
}

#[tokio::test]
async fn test_post_timeout_code_for_return() {
    let (endpoint, captured) = spawn_stub(201).await;
    let client = client_for(endpoint, Duration::from_secs(2));

    client
        .post(&request("3", OperationKind::Return, "0"))
        .await
        .unwrap();

    let body: serde_json::Value = serde_json::from_str(&captured.await.unwrap().body).unwrap();
    assert_eq!(body["tipoOperacao"], "Devolução");
    assert_eq!(body["codigo"], "0");
}

#[rstest]
#[case(201, AuthOutcome::Authenticated)]
#[case(402, AuthOutcome::ToolNotFound)]
#[case(403, AuthOutcome::UserCodeNotFound)]
#[case(500, AuthOutcome::Unclassified(500))]
#[tokio::test]
async fn test_status_classification(#[case] status: u16, #[case] expected: AuthOutcome) {
    let (endpoint, _captured) = spawn_stub(status).await;
    let client = client_for(endpoint, Duration::from_secs(2));

    let received = client
        .post(&request("2", OperationKind::Take, "1"))
        .await
        .unwrap();
    assert_eq!(AuthOutcome::from_status(received), expected);
}

#[tokio::test]
async fn test_connection_refused() {
    // Bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(format!("http://{}/api/painel", addr), Duration::from_secs(2));
    let result = client.post(&request("1", OperationKind::Take, "1")).await;

    assert!(matches!(result, Err(AuthClientError::Transport(_))));
}

#[tokio::test]
async fn test_unresponsive_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Accept and hold the connection without answering
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(stream);
    });

    let client = client_for(format!("http://{}/api/painel", addr), Duration::from_millis(200));
    let result = client.post(&request("1", OperationKind::Take, "1")).await;

    let err = result.unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {err}");
}
