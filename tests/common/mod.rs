//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use client_setup::config::WatchEvent;
use client_setup::options::{OptionsRecord, Region};
use client_setup::registration::Capability;
use tempfile::TempDir;
use tokio::sync::broadcast;

/// A client configuration with the settings nested under a section.
pub const CLIENT_CONFIG: &str = r#"{
    "Clients": {
        "Profile": "default",
        "Region": "us-west-2",
        "Services": {
            "Lambda": { "Region": "eu-west-1" }
        }
    }
}"#;

/// A top-level logging configuration.
pub const LOG_TO_CONFIG: &str = r#"{
    "Region": "us-west-2",
    "LogTo": "Console"
}"#;

/// Storage capability used throughout the tests.
pub trait ObjectStore: Send + Sync {
    fn options(&self) -> &OptionsRecord;
    fn kind(&self) -> &'static str;
}

impl Capability for dyn ObjectStore {
    const SERVICE_NAME: &'static str = "S3";
}

pub struct StoreClient {
    options: OptionsRecord,
}

impl ObjectStore for StoreClient {
    fn options(&self) -> &OptionsRecord {
        &self.options
    }

    fn kind(&self) -> &'static str {
        "client"
    }
}

pub struct MockStore {
    options: OptionsRecord,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            options: OptionsRecord::new(),
        }
    }
}

impl ObjectStore for MockStore {
    fn options(&self) -> &OptionsRecord {
        &self.options
    }

    fn kind(&self) -> &'static str {
        "mock"
    }
}

pub fn store_client(options: OptionsRecord) -> Arc<dyn ObjectStore> {
    Arc::new(StoreClient { options })
}

/// Function capability with a fixed built-in region.
pub trait FunctionRunner: Send + Sync {
    fn options(&self) -> &OptionsRecord;
}

impl Capability for dyn FunctionRunner {
    const SERVICE_NAME: &'static str = "Lambda";

    fn builtin_options() -> OptionsRecord {
        OptionsRecord::new().with_region(region("sa-east-1"))
    }
}

pub struct Runner(OptionsRecord);

impl FunctionRunner for Runner {
    fn options(&self) -> &OptionsRecord {
        &self.0
    }
}

pub fn runner(options: OptionsRecord) -> Arc<dyn FunctionRunner> {
    Arc::new(Runner(options))
}

pub fn region(code: &str) -> Region {
    Region::parse(code).unwrap()
}

/// A config file in its own temporary directory.
pub struct TempConfig {
    _dir: TempDir,
    path: PathBuf,
}

impl TempConfig {
    pub fn new(file_name: &str, contents: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(file_name);
        std::fs::write(&path, contents).unwrap();
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, contents: &str) {
        std::fs::write(&self.path, contents).unwrap();
    }
}

/// Wait for the next reparse outcome that is not `Unchanged`.
pub async fn next_outcome(events: &mut broadcast::Receiver<WatchEvent>) -> WatchEvent {
    let wait = async {
        loop {
            match events.recv().await {
                Ok(WatchEvent::Unchanged) => continue,
                Ok(event) => return event,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("watcher closed"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(10), wait)
        .await
        .expect("timed out waiting for a reload")
}
