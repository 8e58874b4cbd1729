//! Drive the share service over real HTTP with the sandbox client.

use sandbox_client::{
    HttpTransport, MemoryBackend, MemoryNavigator, Navigation, Navigator, PageLocation, Session,
    SessionConfig, ShareClient, ShareTransport,
};
use sandbox_core::Project;
use sandbox_share::{Config, ShareServer, SqliteStorage};
use sandbox_types::{Envelope, Linker, ShareHandle, SourceFile};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Start a server on a loopback port and return its base URL.
async fn start_server(config: Config) -> String {
    let storage = SqliteStorage::in_memory().await.unwrap();
    let server = Arc::new(ShareServer::new(config, Arc::new(storage)));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve(listener));
    format!("http://{}", addr)
}

fn transport(base: &str) -> HttpTransport {
    HttpTransport::new(base, Duration::from_secs(5)).unwrap()
}

async fn open_session(base: &str, path: &str) -> Session<HttpTransport, MemoryNavigator> {
    let location = PageLocation::parse(path).unwrap();
    Session::open(
        SessionConfig::default(),
        transport(base),
        Arc::new(MemoryBackend::new()),
        MemoryNavigator::new(location.path()),
        &location,
    )
    .await
}

#[tokio::test]
async fn publish_and_fetch_over_http() {
    let base = start_server(Config::default()).await;
    let client = ShareClient::new(transport(&base));

    let envelope = Envelope::new(
        vec![
            SourceFile::new("main.wgsl", "import package::util::f;\nfn main() { f(); }"),
            SourceFile::new("util.wgsl", "fn f() {}"),
        ],
        Linker::Alternate,
        json!({"root": "main.wgsl", "conditions": false}),
    );

    let handle = client.publish(&envelope).await.unwrap();
    let loaded = client.fetch(&handle).await.unwrap();

    assert_eq!(loaded.files, envelope.files);
    assert_eq!(loaded.linker, Some(Linker::Alternate));
    assert_eq!(loaded.options, Some(envelope.options.clone()));
    assert_eq!(loaded.dropped, 0);
}

#[tokio::test]
async fn same_project_gets_same_handle() {
    let base = start_server(Config::default()).await;
    let client = ShareClient::new(transport(&base));
    let envelope = Project::new().to_envelope();

    let first = client.publish(&envelope).await.unwrap();
    let second = client.publish(&envelope).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn unknown_handle_is_a_404() {
    let base = start_server(Config::default()).await;
    let client = ShareClient::new(transport(&base));

    let err = client
        .fetch(&ShareHandle::parse("0123456789abcdef").unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn oversized_publish_is_a_413() {
    let mut config = Config::default();
    config.limits.max_payload_bytes = 128;
    let base = start_server(config).await;
    let client = ShareClient::new(transport(&base));

    let envelope = Envelope::new(
        vec![SourceFile::new("main.wgsl", "x".repeat(1024))],
        Linker::Primary,
        json!({}),
    );
    let err = client.publish(&envelope).await.unwrap_err();
    assert_eq!(err.status(), Some(413));
}

#[tokio::test]
async fn raw_transport_sees_plain_text_handle() {
    let base = start_server(Config::default()).await;
    let transport = transport(&base);

    let response = transport
        .post_form("/share", "data", r#"{"files":[]}"#)
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert!(ShareHandle::parse(&response.body).is_ok());

    let response = transport
        .post_form("/share", "data", r#"{"nofiles":true}"#)
        .await
        .unwrap();
    assert_eq!(response.status, 400);
}

#[tokio::test]
async fn session_publishes_and_another_session_loads() {
    let base = start_server(Config::default()).await;

    let author = open_session(&base, "/").await;
    author
        .mutate(|p| p.add_file("shapes.wgsl", "fn area() -> f32 { return 1.0; }"))
        .await
        .unwrap();
    author
        .mutate(|p| p.set_option(Linker::Primary, "strip", "true"))
        .await
        .unwrap();

    let handle = author.publish().await.unwrap();
    assert_eq!(author.navigator().current(), handle.to_path());
    assert_eq!(author.active_handle().await, Some(handle.clone()));

    let reader = open_session(&base, &handle.to_path()).await;
    assert_eq!(reader.active_handle().await, Some(handle.clone()));

    let published = author.snapshot().await;
    let loaded = reader.snapshot().await;
    assert_eq!(loaded.files(), published.files());
    assert_eq!(loaded.linker(), published.linker());
    assert_eq!(
        loaded.options_value(Linker::Primary),
        published.options_value(Linker::Primary)
    );
}

#[tokio::test]
async fn navigating_to_unknown_share_keeps_project() {
    let base = start_server(Config::default()).await;
    let session = open_session(&base, "/").await;
    let before = session.snapshot().await;

    let result = session.visit("/s/0123456789abcdef").await;
    assert!(result.is_err());
    assert_eq!(session.snapshot().await, before);
    assert_eq!(session.active_handle().await, None);
    assert!(session.output().await.starts_with("load failed"));

    assert_eq!(session.navigate("/").await.unwrap(), Navigation::Cleared);
}
