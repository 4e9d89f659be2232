#[path = "../common/mod.rs"]
mod common;

use common::{dns_config, write_list, MockUpstream, TestServer};
use sluice_dns_application::ports::{ManagedUpstreamFileRepository, ResolutionServer};
use sluice_dns_domain::DomainError;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

#[tokio::test]
async fn test_initialize_serves_configured_upstreams() {
    // Arrange
    let upstream = MockUpstream::answering(Ipv4Addr::new(192, 0, 2, 10)).await;

    // Act
    let app = TestServer::start(dns_config(vec![upstream.upstream()])).await;

    // Assert
    assert!(app.server.is_running().await);
    assert_eq!(
        app.resolve("example.org").await,
        vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10))]
    );

    app.shutdown().await;
}

#[tokio::test]
async fn test_reload_swaps_state_and_closes_previous_groups() {
    // Arrange
    let upstream = MockUpstream::answering(Ipv4Addr::new(192, 0, 2, 10)).await;
    let app = TestServer::start(dns_config(vec![upstream.upstream()])).await;
    let before = app.server.current().unwrap();

    // Act
    app.reload.execute().await.unwrap();

    // Assert
    let after = app.server.current().unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    let closed = before
        .main
        .exchange("example.org", &[0u8; 12], Default::default())
        .await
        .unwrap_err();
    assert!(closed.is_network());
    assert!(app.server.is_running().await);
    assert_eq!(
        app.resolve("example.org").await,
        vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10))]
    );

    app.shutdown().await;
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_state_serving() {
    // Arrange
    let upstream = MockUpstream::answering(Ipv4Addr::new(192, 0, 2, 10)).await;
    let app = TestServer::start(dns_config(vec![upstream.upstream()])).await;
    let list = write_list(app.dir.path(), "extra.txt", &[upstream.upstream()]);
    let file = app
        .add_file
        .execute("extra", list.to_str().unwrap())
        .await
        .unwrap();
    let before = app.server.current().unwrap();
    let addr_before = app.addr().await;

    // A directory in place of the cached list makes it unreadable.
    let cached = file.path(&app.dir.path().join("data"));
    std::fs::remove_file(&cached).unwrap();
    std::fs::create_dir(&cached).unwrap();

    // Act
    let err = app.reload.execute().await.unwrap_err();

    // Assert
    assert!(matches!(err.root_cause(), DomainError::ManagedFileRead { .. }));
    assert!(Arc::ptr_eq(&before, &app.server.current().unwrap()));
    assert_eq!(app.addr().await, addr_before);
    assert_eq!(
        app.resolve("example.org").await,
        vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10))]
    );
    assert_eq!(app.store.snapshot().await.files.len(), 1);

    app.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_reloads_are_serialized() {
    // Arrange
    let upstream = MockUpstream::answering(Ipv4Addr::new(192, 0, 2, 10)).await;
    let app = TestServer::start(dns_config(vec![upstream.upstream()])).await;

    // Act
    let (first, second) = tokio::join!(app.reload.execute(), app.reload.execute());

    // Assert
    first.unwrap();
    second.unwrap();
    assert!(app.server.is_running().await);
    assert_eq!(
        app.resolve("example.org").await,
        vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10))]
    );

    app.shutdown().await;
}
