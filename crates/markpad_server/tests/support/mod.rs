//! Shared integration-test server bootstrap helpers.

use axum_test::TestServer;
use markpad_core::ai::{GenerateRequest, StreamFrame};
use markpad_server::{create_app, AppError, AppState, Config, Database, TextGenerator};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Generator replaying a fixed frame script and recording requests.
#[derive(Default)]
pub(crate) struct ScriptedGenerator {
    frames: Vec<StreamFrame>,
    pub(crate) requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedGenerator {
    pub(crate) fn new(frames: Vec<StreamFrame>) -> Self {
        Self {
            frames,
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, request: GenerateRequest) -> Result<mpsc::Receiver<StreamFrame>, AppError> {
        self.requests.lock().expect("requests").push(request);
        let (tx, rx) = mpsc::channel(self.frames.len().max(1));
        for frame in &self.frames {
            tx.try_send(frame.clone()).expect("buffered frame");
        }
        Ok(rx)
    }
}

pub(crate) fn test_config(temp_dir: &TempDir, overrides: &[(&str, &str)]) -> Config {
    let db_path = temp_dir
        .path()
        .join("db")
        .to_str()
        .expect("db path")
        .to_string();
    let overrides: Vec<(String, String)> = overrides
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| {
        if key == "DB_PATH" {
            return Some(db_path.clone());
        }
        if key == "PUBLIC_BASE_URL" {
            return Some("http://md.test".to_string());
        }
        overrides
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
}

pub(crate) fn server_with(
    config: Config,
    generator: Arc<dyn TextGenerator>,
) -> TestServer {
    let db = Database::new(config.db_path.as_str()).expect("open db");
    let state = AppState::with_generator(config, db, generator);
    TestServer::new(create_app(state, false)).expect("server")
}

pub(crate) fn setup_test_server() -> (TestServer, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let config = test_config(&temp_dir, &[]);
    let server = server_with(config, Arc::new(markpad_server::DisabledGenerator));
    (server, temp_dir)
}
