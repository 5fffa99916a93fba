use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use chatline::backend::fake::FakeBackend;
use chatline::backend::Backend;
use chatline::diagnostics::RecordingDiagnostics;
use chatline::ChatSession;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// A session wired to a fake backend and a recording diagnostics sink
#[allow(dead_code)]
pub fn fake_session(backend: &Arc<FakeBackend>) -> (ChatSession, Arc<RecordingDiagnostics>) {
    let diagnostics = Arc::new(RecordingDiagnostics::new());
    let session = ChatSession::new(
        Arc::clone(backend) as Arc<dyn Backend>,
        Arc::clone(&diagnostics) as Arc<dyn chatline::Diagnostics>,
    );
    (session, diagnostics)
}
