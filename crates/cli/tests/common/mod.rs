// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;

use assert_cmd::Command;
use rl_core::Config;
use tempfile::TempDir;

/// `rl` with its data directory isolated to `data_dir`
pub fn rl(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rl").expect("rl binary");
    cmd.env("RL_DATA_DIR", data_dir)
        .env_remove("RL_LISTEN_ADDR")
        .env_remove("RUST_LOG");
    cmd
}

/// An address nothing is listening on
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().expect("local addr")
}

/// A daemon served from a background thread on an ephemeral port
pub struct TestDaemon {
    pub addr: SocketAddr,
    pub dir: TempDir,
}

impl TestDaemon {
    pub fn start() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let config = Config {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        };

        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("runtime");
            runtime.block_on(async move {
                let mut daemon = rl_daemon::startup(&config).await.expect("startup");
                tx.send(daemon.local_addr().expect("local addr"))
                    .expect("send addr");
                daemon
                    .run(std::future::pending())
                    .await
                    .expect("daemon run");
            });
        });

        let addr = rx.recv().expect("daemon failed to start");
        Self { addr, dir }
    }

    /// `rl --addr <daemon>` sharing the daemon's data directory
    pub fn rl(&self) -> Command {
        let mut cmd = rl(self.dir.path());
        cmd.args(["--addr", &self.addr.to_string()]);
        cmd
    }
}
