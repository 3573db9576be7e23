#![cfg(unix)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use vimctl_remote::{InstanceHandle, ReadinessStrategy, RemoteEditor, RemoteEditorConfig};

static WORKSPACE_COUNTER: AtomicU64 = AtomicU64::new(1);

const HISTORY_SIZE: usize = 25;

/// Stand-in editor keeping a shared server registry that uppercases names,
/// the way the real server list reports them.
const MOCK_EDITOR: &str = r#"#!/bin/sh
set -eu
PATH=/usr/bin:/bin
export PATH
state="{state}"
server=""
startup=""
while [ "$#" -gt 0 ]; do
  case "$1" in
    --servername) shift; server=$(printf '%s' "$1" | tr '[:lower:]' '[:upper:]') ;;
    --startuptime) shift; startup="$1" ;;
    --serverlist) cat "$state/servers"; exit 0 ;;
    --remote-expr)
      shift
      grep -qx "$server" "$state/servers" || exit 1
      case "$1" in
        "getcwd()") printf '%s\n' "$state" ;;
        histget*) printf '%s\n%s\n' "cmd-entry" "ignored" ;;
        *) printf '%s\n' "$1" ;;
      esac
      exit 0 ;;
    --remote-tab)
      grep -qx "$server" "$state/servers" || exit 1
      shift 2
      printf '%s\n' "$1" >> "$state/opened"
      exit 0 ;;
    --remote-send)
      shift
      grep -vx "$server" "$state/servers" > "$state/servers.next" || true
      mv "$state/servers.next" "$state/servers"
      exit 0 ;;
  esac
  shift
done
printf '%s\n' "$server" >> "$state/servers"
{
  printf '%s\n' "001.000  001.000: startup timing"
  sleep 0.05
  printf '%s\n' "--- VIM STARTED ---"
} >> "$startup"
"#;

struct IsolatedWorkspace {
    root: PathBuf,
}

impl IsolatedWorkspace {
    fn new(label: &str) -> Self {
        let tick = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let count = WORKSPACE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let root = std::env::temp_dir().join(format!(
            "vimctl-{label}-{}-{tick}-{count}",
            std::process::id()
        ));
        fs::create_dir_all(root.join("state")).expect("must create isolated workspace root");
        fs::write(root.join("state").join("servers"), "").expect("must seed server list");
        Self { root }
    }

    fn state_dir(&self) -> PathBuf {
        self.root.join("state")
    }

    fn install_editor(&self) -> PathBuf {
        let script = self.root.join("mock-vim");
        let body = MOCK_EDITOR.replace("{state}", &self.state_dir().display().to_string());
        fs::write(&script, body).expect("must write mock editor");
        let mut perms = fs::metadata(&script).expect("script metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script, perms).expect("chmod script");
        script
    }
}

impl Drop for IsolatedWorkspace {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn unique_server_name() -> String {
    let tick = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    format!("test-{}-{tick}", std::process::id())
}

async fn history(handle: &InstanceHandle, size: usize) -> Vec<String> {
    let mut entries = Vec::with_capacity(size);
    for index in 0..size {
        let entry = handle
            .evaluate(&format!("histget(\"cmd\", {index})"))
            .await
            .expect("histget should resolve");
        entries.push(entry);
    }
    entries
}

async fn run_lifecycle(readiness: ReadinessStrategy, workspace: &IsolatedWorkspace) {
    let script = workspace.install_editor();
    let editor = RemoteEditor::new(
        RemoteEditorConfig::default()
            .with_executable(script.display().to_string())
            .with_readiness(readiness)
            .with_startup_timeout_ms(10_000),
    )
    .expect("valid config");

    let name = unique_server_name();
    let created = editor
        .create_instance(&name, Some(Path::new("example/index.html")))
        .await
        .expect("instance should start");
    assert_eq!(created.identifier(), name);
    assert_eq!(created.working_directory(), None);

    let listed = editor
        .list_instances()
        .await
        .expect("listing should succeed")
        .into_iter()
        .filter(|handle| handle.identifier() == name.to_uppercase())
        .collect::<Vec<_>>();
    assert_eq!(listed.len(), 1);
    let expected_cwd = workspace.state_dir().display().to_string();
    assert_eq!(listed[0].working_directory(), Some(expected_cwd.as_str()));

    listed[0]
        .open("example/index.html")
        .await
        .expect("open should resolve");
    assert_eq!(
        fs::read_to_string(workspace.state_dir().join("opened")).expect("opened log"),
        "example/index.html\n"
    );

    let entries = history(&created, HISTORY_SIZE).await;
    assert_eq!(entries.len(), HISTORY_SIZE);
    assert!(entries.iter().all(|entry| entry == "cmd-entry"));

    created.exit(false).await.expect("exit should resolve");
    let remaining = editor.list_instances().await.expect("listing after exit");
    assert!(remaining.is_empty(), "instance still listed after exit");
}

#[tokio::test]
async fn integration_inline_stream_instance_lifecycle() {
    let workspace = IsolatedWorkspace::new("inline-lifecycle");
    run_lifecycle(ReadinessStrategy::InlineStream, &workspace).await;
}

#[tokio::test]
async fn integration_watched_file_instance_lifecycle() {
    let workspace = IsolatedWorkspace::new("watched-lifecycle");
    run_lifecycle(ReadinessStrategy::WatchedFile, &workspace).await;
}

#[tokio::test]
async fn integration_unpathed_instance_is_enriched_with_working_directory() {
    let workspace = IsolatedWorkspace::new("enriched");
    let script = workspace.install_editor();
    let editor = RemoteEditor::new(
        RemoteEditorConfig::default().with_executable(script.display().to_string()),
    )
    .expect("valid config");

    let handle = editor
        .create_instance("enrich-me", None)
        .await
        .expect("instance should start");
    let expected_cwd = workspace.state_dir().display().to_string();
    assert_eq!(handle.working_directory(), Some(expected_cwd.as_str()));
    assert_eq!(handle.target_path(), None);
}

#[tokio::test]
async fn integration_missing_editor_fails_every_operation() {
    let workspace = IsolatedWorkspace::new("missing");
    let editor = RemoteEditor::new(
        RemoteEditorConfig::default()
            .with_executable(workspace.root.join("absent").display().to_string()),
    )
    .expect("valid config");

    assert!(editor
        .create_instance("ghost", Some(Path::new("a.txt")))
        .await
        .expect_err("create")
        .is_spawn_failure());
    assert!(editor
        .list_instances()
        .await
        .expect_err("list")
        .is_spawn_failure());
    let handle = editor.instance("GHOST").expect("bare handle");
    assert!(handle.open("a.txt").await.expect_err("open").is_spawn_failure());
    assert!(handle
        .evaluate("getcwd()")
        .await
        .expect_err("evaluate")
        .is_spawn_failure());
    assert!(handle.send_keys("x").await.expect_err("send").is_spawn_failure());
    assert!(handle.exit(true).await.expect_err("exit").is_spawn_failure());
}
