use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn srag_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("srag");
    path
}

const WEEK_ONE: &str = "Week one covers limits and continuity. \
A derivative measures the instantaneous rate of change of a function.";

type Prompts = Arc<Mutex<Vec<String>>>;

/// Ollama stand-in serving `/api/embed` and `/api/generate`.
///
/// Embeddings are 26-dim letter counts so similar texts score high.
/// Every generation prompt is recorded. The server lives as long as
/// the runtime it was spawned on.
struct FakeOllama {
    url: String,
    prompts: Prompts,
    _runtime: tokio::runtime::Runtime,
}

fn letter_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; 26];
    for c in text.to_lowercase().chars() {
        if c.is_ascii_lowercase() {
            v[(c as u8 - b'a') as usize] += 1.0;
        }
    }
    v
}

async fn embed(Json(body): Json<Value>) -> Json<Value> {
    let embeddings: Vec<Vec<f32>> = body["input"]
        .as_array()
        .map(|inputs| {
            inputs
                .iter()
                .map(|t| letter_vector(t.as_str().unwrap_or_default()))
                .collect()
        })
        .unwrap_or_default();
    Json(json!({ "embeddings": embeddings }))
}

async fn generate(State(prompts): State<Prompts>, Json(body): Json<Value>) -> Json<Value> {
    let prompt = body["prompt"].as_str().unwrap_or_default().to_string();
    prompts.lock().unwrap().push(prompt);
    Json(json!({ "response": "  A derivative is a rate of change.  ", "done": true }))
}

impl FakeOllama {
    fn start() -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();

        let prompts: Prompts = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/api/embed", post(embed))
            .route("/api/generate", post(generate))
            .with_state(prompts.clone());

        let listener = runtime
            .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
            .unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        runtime.spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url,
            prompts,
            _runtime: runtime,
        }
    }
}

fn write_config(root: &Path, providers: &str) -> PathBuf {
    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/srag.sqlite"

[resilience]
max_retries = 0
timeout_secs = 10
{}
"#,
        root.display(),
        providers
    );

    let config_path = config_dir.join("srag.toml");
    fs::write(&config_path, config_content).unwrap();
    config_path
}

fn setup_offline_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(tmp.path(), "");
    fs::write(tmp.path().join("week1.txt"), WEEK_ONE).unwrap();
    (tmp, config_path)
}

fn setup_ollama_env(server: &FakeOllama) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let providers = format!(
        r#"
[embedding]
provider = "ollama"
model = "nomic-embed-text"
dims = 26
url = "{url}"

[generation]
provider = "ollama"
model = "llama3"
url = "{url}"
"#,
        url = server.url
    );
    let config_path = write_config(tmp.path(), &providers);
    fs::write(tmp.path().join("week1.txt"), WEEK_ONE).unwrap();
    (tmp, config_path)
}

fn run_srag(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = srag_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run srag binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_offline_env();

    let (stdout, stderr, success) = run_srag(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/srag.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_offline_env();

    let (_, _, success1) = run_srag(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_srag(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_srag(&tmp.path().join("nope.toml"), &["init"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_ingest_with_embeddings_disabled_fails() {
    let (tmp, config_path) = setup_offline_env();
    run_srag(&config_path, &["init"]);

    let file = tmp.path().join("week1.txt");
    let (stdout, stderr, success) =
        run_srag(&config_path, &["ingest", file.to_str().unwrap()]);
    assert!(!success, "ingest should fail without an embedder");
    assert!(!stdout.contains("ok"));
    assert!(stderr.contains("disabled"));
}

#[test]
fn test_rebuild_without_documents_fails() {
    let (_tmp, config_path) = setup_offline_env();
    run_srag(&config_path, &["init"]);

    let (_, stderr, success) = run_srag(&config_path, &["rebuild"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_ask_empty_prompt_rejected() {
    let (_tmp, config_path) = setup_offline_env();
    run_srag(&config_path, &["init"]);

    let (_, stderr, success) = run_srag(&config_path, &["ask", "   ", "--user", "alice"]);
    assert!(!success);
    assert!(stderr.contains("prompt is required"));
}

#[test]
fn test_report_for_new_user_is_empty() {
    let (_tmp, config_path) = setup_offline_env();
    run_srag(&config_path, &["init"]);

    let (stdout, stderr, success) = run_srag(&config_path, &["report", "--user", "alice"]);
    assert!(success, "report failed: {}", stderr);
    let report: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["topic_count"], json!({}));
    assert_eq!(report["strengths"], json!([]));
    assert_eq!(report["gaps"], json!([]));
}

#[test]
fn test_ingest_ask_report_end_to_end() {
    let server = FakeOllama::start();
    let (tmp, config_path) = setup_ollama_env(&server);
    run_srag(&config_path, &["init"]);

    let file = tmp.path().join("week1.txt");
    let (stdout, stderr, success) = run_srag(
        &config_path,
        &["ingest", file.to_str().unwrap(), "--title", "Week 1"],
    );
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("chunks:     1"));
    assert!(stdout.contains("records:    1"));
    assert!(stdout.trim_end().ends_with("ok"));

    let (stdout, stderr, success) = run_srag(
        &config_path,
        &["ask", "What is a derivative in calculus?", "--user", "alice"],
    );
    assert!(success, "ask failed: stdout={}, stderr={}", stdout, stderr);
    assert_eq!(stdout.trim(), "A derivative is a rate of change.");

    let prompts = server.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].starts_with(WEEK_ONE));
    assert!(prompts[0].ends_with("User Question: What is a derivative in calculus?\nAI Answer:"));

    let (stdout, _, success) = run_srag(&config_path, &["report", "--user", "alice"]);
    assert!(success);
    let report: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["topic_count"]["calculus"], 1);
    assert_eq!(report["strengths"], json!(["calculus"]));
}

#[test]
fn test_rebuild_is_idempotent() {
    let server = FakeOllama::start();
    let (tmp, config_path) = setup_ollama_env(&server);
    run_srag(&config_path, &["init"]);

    let file = tmp.path().join("week1.txt");
    run_srag(&config_path, &["ingest", file.to_str().unwrap()]);

    for _ in 0..2 {
        let (stdout, stderr, success) = run_srag(&config_path, &["rebuild"]);
        assert!(success, "rebuild failed: {}", stderr);
        assert!(stdout.contains("records:    1"));
    }

    let (stdout, _, success) = run_srag(&config_path, &["ask", "derivative", "--user", "bob"]);
    assert!(success);
    assert!(!stdout.trim().is_empty());
    let prompts = server.prompts.lock().unwrap().clone();
    // one stored record despite three builds, so the context is a single chunk
    assert!(prompts[0].starts_with(&format!("{}\n\nUser Question:", WEEK_ONE)));
}
