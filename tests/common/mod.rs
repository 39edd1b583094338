#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use labdesk::api::{ApiErrorKind, Changes, PageRequest, ResourceClient};
use labdesk::controller::ScreenView;
use labdesk::resources::Patient;
use labdesk::{Cursor, LabdeskError, Page, Record, RecordId, Resource, Result};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::watch;

/// Helper struct to run labdesk commands in an isolated temp directory
pub struct LabdeskTest {
    pub temp_dir: TempDir,
    binary_path: String,
}

impl LabdeskTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        LabdeskTest {
            temp_dir,
            binary_path: env!("CARGO_BIN_EXE_labdesk").to_string(),
        }
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.run_with_env(args, &[])
    }

    pub fn run_with_env(&self, args: &[&str], envs: &[(&str, &str)]) -> Output {
        self.command(args, envs)
            .output()
            .expect("Failed to execute labdesk command")
    }

    /// Run with `input` piped to stdin
    pub fn run_with_input(&self, args: &[&str], envs: &[(&str, &str)], input: &str) -> Output {
        let mut child = self
            .command(args, envs)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to spawn labdesk command");
        {
            let mut stdin = child.stdin.take().expect("piped stdin");
            stdin
                .write_all(input.as_bytes())
                .expect("Failed to write stdin");
        }
        child
            .wait_with_output()
            .expect("Failed to wait for labdesk command")
    }

    fn command(&self, args: &[&str], envs: &[(&str, &str)]) -> Command {
        let mut command = Command::new(&self.binary_path);
        command
            .args(args)
            .current_dir(self.temp_dir.path())
            .env_remove("LABDESK_ROOT")
            .env_remove("LABDESK_API_URL")
            .env_remove("LABDESK_API_TOKEN")
            .env("NO_COLOR", "1");
        for (key, value) in envs {
            command.env(key, value);
        }
        command
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert_success(args, &output);
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Expected command {:?} to fail, but it succeeded",
            args
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    pub fn config_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join(".labdesk").join("config.yaml")
    }
}

pub fn assert_success(args: &[&str], output: &Output) {
    if !output.status.success() {
        panic!(
            "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
            args,
            output.status,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// Patient fixture with a creation stamp
pub fn patient(id: RecordId, first_name: &str, last_name: &str) -> Patient {
    serde_json::from_value(patient_json(id, first_name, last_name)).expect("valid patient")
}

pub fn patient_json(id: RecordId, first_name: &str, last_name: &str) -> Value {
    json!({
        "id": id,
        "first_name": first_name,
        "last_name": last_name,
        "dni": format!("{}", 30_000_000 + id),
        "is_active": true,
        "created_by": {"username": "recepcion"},
        "created_at": "2024-02-01T12:00:00Z",
        "last_change": {}
    })
}

/// `count` patients named `Paciente <id>`, ids starting at 1
pub fn numbered_patients(count: i64) -> Vec<Patient> {
    (1..=count)
        .map(|id| patient(id, "Paciente", &id.to_string()))
        .collect()
}

/// In-memory collection server.
///
/// Search matches case-insensitively against each record's title. Cursors
/// are offsets into the filtered list.
pub struct MockClient<R> {
    records: Mutex<Vec<R>>,
    requests: Mutex<Vec<PageRequest>>,
    patches: Mutex<Vec<(RecordId, Changes)>>,
    search_delays: Mutex<HashMap<String, Duration>>,
    update_delay: Mutex<Duration>,
    fail_pages: AtomicBool,
    fail_updates: AtomicBool,
    echo_updates: AtomicBool,
}

impl<R: Resource> MockClient<R> {
    pub fn new(records: Vec<R>) -> Self {
        Self {
            records: Mutex::new(records),
            requests: Mutex::new(Vec::new()),
            patches: Mutex::new(Vec::new()),
            search_delays: Mutex::new(HashMap::new()),
            update_delay: Mutex::new(Duration::ZERO),
            fail_pages: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
            echo_updates: AtomicBool::new(true),
        }
    }

    /// Delay every page request for `term`
    pub fn delay_search(&self, term: &str, delay: Duration) {
        self.search_delays
            .lock()
            .unwrap()
            .insert(term.to_string(), delay);
    }

    pub fn delay_updates(&self, delay: Duration) {
        *self.update_delay.lock().unwrap() = delay;
    }

    pub fn fail_pages(&self, fail: bool) {
        self.fail_pages.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Answer updates without a body, like a `204 No Content`
    pub fn silent_updates(&self) {
        self.echo_updates.store(false, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn searched_terms(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|request| request.is_first_page())
            .map(|request| request.search_term)
            .collect()
    }

    pub fn patches(&self) -> Vec<(RecordId, Changes)> {
        self.patches.lock().unwrap().clone()
    }

    pub fn record(&self, id: RecordId) -> Option<R> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|record| record.id() == id)
            .cloned()
    }

    fn matching(&self, term: &str) -> Vec<R> {
        let needle = term.trim().to_lowercase();
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| needle.is_empty() || record.title().to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl<R: Resource> ResourceClient<R> for MockClient<R> {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<R>> {
        self.requests.lock().unwrap().push(request.clone());
        let delay = self
            .search_delays
            .lock()
            .unwrap()
            .get(&request.search_term)
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_pages.load(Ordering::SeqCst) {
            return Err(LabdeskError::Network("connection reset".to_string()));
        }

        let matching = self.matching(&request.search_term);
        let offset: usize = match &request.cursor {
            Some(cursor) => cursor.as_str().parse().expect("offset cursor"),
            None => 0,
        };
        let end = (offset + request.limit as usize).min(matching.len());
        let items = matching[offset.min(end)..end].to_vec();
        Ok(Page {
            items,
            total_count: matching.len() as u64,
            next_cursor: (end < matching.len()).then(|| Cursor::new(end.to_string())),
        })
    }

    async fn fetch_one(&self, id: RecordId) -> Result<R> {
        self.record(id).ok_or(LabdeskError::RecordNotFound(id))
    }

    async fn create(&self, draft: &Changes) -> Result<R> {
        let mut records = self.records.lock().unwrap();
        let id = records.iter().map(|r| r.id()).max().unwrap_or(0) + 1;
        let mut body = draft.clone();
        body.insert("id".to_string(), json!(id));
        let record: R = serde_json::from_value(Value::Object(body))?;
        records.insert(0, record.clone());
        Ok(record)
    }

    async fn update(&self, id: RecordId, changes: &Changes) -> Result<Option<R>> {
        self.patches.lock().unwrap().push((id, changes.clone()));
        let delay = *self.update_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(LabdeskError::Api {
                status: 400,
                kind: ApiErrorKind::General("Patient has pending protocols".to_string()),
            });
        }

        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or(LabdeskError::RecordNotFound(id))?;
        let mut body = serde_json::to_value(&*record)?;
        if let Value::Object(map) = &mut body {
            for (key, value) in changes {
                map.insert(key.clone(), value.clone());
            }
        }
        *record = serde_json::from_value(body)?;

        if self.echo_updates.load(Ordering::SeqCst) {
            Ok(Some(record.clone()))
        } else {
            Ok(None)
        }
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        let index = records
            .iter()
            .position(|r| r.id() == id)
            .ok_or(LabdeskError::RecordNotFound(id))?;
        if R::SOFT_DELETE
            && let Some(inactive) = records[index].with_active(false)
        {
            records[index] = inactive;
        } else {
            records.remove(index);
        }
        Ok(())
    }
}

/// Wait (in paused test time) until the published view satisfies `ready`
pub async fn wait_for_view<R, F>(
    view: &mut watch::Receiver<ScreenView<R>>,
    ready: F,
) -> ScreenView<R>
where
    R: Resource,
    F: FnMut(&ScreenView<R>) -> bool,
{
    let result = tokio::time::timeout(Duration::from_secs(120), view.wait_for(ready))
        .await
        .expect("timed out waiting for the screen");
    result.expect("screen task ended").clone()
}

/// Mounted with nothing loading and no search waiting to commit
pub fn is_settled<R>(view: &ScreenView<R>) -> bool {
    view.phase != labdesk::controller::LoadPhase::Idle
        && !view.is_loading_initial
        && !view.is_loading_more
        && !view.is_searching
        && view.pending_search.is_none()
        && view.rows.iter().all(|row| !row.busy)
}

pub fn ids<R: Record>(view: &ScreenView<R>) -> Vec<RecordId> {
    view.rows.iter().map(|row| row.record.id()).collect()
}
