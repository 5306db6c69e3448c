// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end requests against a daemon bound to an ephemeral port

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use rl_core::{Config, Record};
use rl_daemon::protocol::{decode, encode, read_message, write_message};
use rl_daemon::{startup, Request, Response};
use tokio::net::TcpStream;

async fn send(addr: SocketAddr, request: &Request) -> Response {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    write_message(&mut stream, &encode(request).unwrap())
        .await
        .unwrap();
    let bytes = read_message(&mut stream).await.unwrap();
    decode(&bytes).unwrap()
}

fn config(dir: &tempfile::TempDir) -> Config {
    Config {
        listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        data_dir: dir.path().to_path_buf(),
        ..Config::default()
    }
}

#[tokio::test]
async fn produce_consume_over_tcp() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);

    let mut daemon = startup(&config).await.unwrap();
    let addr = daemon.local_addr().unwrap();
    let server = tokio::spawn(async move { daemon.run(std::future::pending()).await });

    assert_eq!(send(addr, &Request::Ping).await, Response::Pong);

    for (expected, value) in ["alpha", "beta", "gamma"].iter().enumerate() {
        let response = send(
            addr,
            &Request::Produce {
                record: Record::new(value.as_bytes().to_vec()),
            },
        )
        .await;
        assert_eq!(
            response,
            Response::Produce {
                offset: expected as u64
            }
        );
    }

    assert_eq!(
        send(addr, &Request::Consume { offset: 1 }).await,
        Response::Consume {
            record: Record::at(1, b"beta".to_vec())
        }
    );
    assert_eq!(
        send(addr, &Request::Consume { offset: 3 }).await,
        Response::NotFound { offset: 3 }
    );

    match send(addr, &Request::Status).await {
        Response::Status { records, .. } => assert_eq!(records, 3),
        other => panic!("unexpected response: {:?}", other),
    }

    assert_eq!(send(addr, &Request::Shutdown).await, Response::ShuttingDown);
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert!(!config.lock_path().exists());
    // 8-byte length prefix per record
    assert_eq!(
        std::fs::metadata(config.records_path()).unwrap().len(),
        (8 + 5) + (8 + 4) + (8 + 5)
    );
}

#[tokio::test]
async fn malformed_payload_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);

    let mut daemon = startup(&config).await.unwrap();
    let addr = daemon.local_addr().unwrap();
    let server = tokio::spawn(async move { daemon.run(std::future::pending()).await });

    let mut stream = TcpStream::connect(addr).await.unwrap();
    write_message(&mut stream, b"not json").await.unwrap();
    let response: Response = decode(&read_message(&mut stream).await.unwrap()).unwrap();
    assert!(matches!(response, Response::BadRequest { .. }));

    assert_eq!(send(addr, &Request::Shutdown).await, Response::ShuttingDown);
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn records_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);

    let mut daemon = startup(&config).await.unwrap();
    let addr = daemon.local_addr().unwrap();
    let server = tokio::spawn(async move { daemon.run(std::future::pending()).await });
    send(
        addr,
        &Request::Produce {
            record: Record::new(b"persisted".to_vec()),
        },
    )
    .await;
    send(addr, &Request::Shutdown).await;
    server.await.unwrap().unwrap();

    let mut daemon = startup(&config).await.unwrap();
    let addr = daemon.local_addr().unwrap();
    let server = tokio::spawn(async move { daemon.run(std::future::pending()).await });

    assert_eq!(
        send(addr, &Request::Consume { offset: 0 }).await,
        Response::Consume {
            record: Record::at(0, b"persisted".to_vec())
        }
    );
    assert_eq!(
        send(
            addr,
            &Request::Produce {
                record: Record::new(b"next".to_vec())
            }
        )
        .await,
        Response::Produce { offset: 1 }
    );

    send(addr, &Request::Shutdown).await;
    server.await.unwrap().unwrap();
}
