//! Scripted stand-ins for the editor binary used by unit tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use tempfile::TempDir;

use crate::command::CommandExecutor;
use crate::config::RemoteEditorConfig;

/// Writes the sentinel twice after a short pause, like a slow instance that
/// also appends a second report. All writes share one open descriptor, as the
/// editor's own timing output does.
pub(crate) const READY_STARTUP: &str = r#"
{
  printf '%s\n' "000.008  000.008: --- VIM STARTING ---"
  sleep 0.05
  printf '%s\n' "--- VIM STARTED ---"
  printf '%s\n' "--- VIM STARTED ---"
} >> "$startup"
"#;

const MOCK_EDITOR: &str = r#"
state="{state}"
printf '%s\n' "$*" >> "$state/calls.log"
server=""
startup=""
while [ "$#" -gt 0 ]; do
  case "$1" in
    --servername) shift; server="$1" ;;
    --startuptime) shift; startup="$1" ;;
    --serverlist) cat "$state/servers"; exit 0 ;;
    --remote-expr)
      shift
      case "$1" in
        "getcwd()") printf '%s\n%s\n' "$(cat "$state/cwd")" "trailing output" ;;
        *) printf '%s\n%s\n' "expr:$1" "trailing output" ;;
      esac
      exit 0 ;;
    --remote-send)
      shift
      case "$1" in
        ":qa<CR>"|":qa!<CR>")
          upper=$(printf '%s' "$server" | tr '[:lower:]' '[:upper:]')
          grep -vx "$upper" "$state/servers" > "$state/servers.next" || true
          mv "$state/servers.next" "$state/servers" ;;
      esac
      exit 0 ;;
    --remote-tab) exit 0 ;;
  esac
  shift
done
printf '%s\n' "$server" | tr '[:lower:]' '[:upper:]' >> "$state/servers"
{startup}
"#;

pub(crate) fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let script = dir.join(name);
    let content = format!("#!/bin/sh\nset -eu\nPATH=/usr/bin:/bin\nexport PATH\n{body}\n");
    std::fs::write(&script, content).expect("write script");
    #[cfg(unix)]
    {
        let mut perms = std::fs::metadata(&script)
            .expect("script metadata")
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).expect("chmod script");
    }
    script
}

pub(crate) fn mock_config(script: &Path) -> RemoteEditorConfig {
    RemoteEditorConfig::default().with_executable(script.display().to_string())
}

pub(crate) fn mock_executor(script: &Path) -> CommandExecutor {
    CommandExecutor::new(Arc::new(mock_config(script)))
}

/// Script that only records its argument list, one invocation per line.
pub(crate) fn write_recording_script(dir: &Path) -> (PathBuf, PathBuf) {
    let calls = dir.join("calls.log");
    let body = format!("printf '%s\\n' \"$*\" >> \"{}\"", calls.display());
    (write_script(dir, "mock-vim", &body), calls)
}

pub(crate) fn read_calls(calls: &Path) -> Vec<String> {
    std::fs::read_to_string(calls)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Polls until `path` exists or `limit` elapses.
pub(crate) async fn wait_for_path(path: &Path, limit: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if path.exists() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    path.exists()
}

/// Stand-in editor that keeps a server list, a working directory and a call
/// log in its own state directory.
pub(crate) struct MockEditor {
    _dir: TempDir,
    pub(crate) script: PathBuf,
    state: PathBuf,
}

impl MockEditor {
    pub(crate) fn install(startup: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = dir.path().join("state");
        std::fs::create_dir_all(&state).expect("state dir");
        std::fs::write(state.join("servers"), "").expect("servers file");
        std::fs::write(state.join("cwd"), "/srv/project\n").expect("cwd file");
        let body = MOCK_EDITOR
            .replace("{state}", &state.display().to_string())
            .replace("{startup}", startup);
        let script = write_script(dir.path(), "mock-vim", &body);
        Self {
            _dir: dir,
            script,
            state,
        }
    }

    pub(crate) fn config(&self) -> RemoteEditorConfig {
        mock_config(&self.script)
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        read_calls(&self.state.join("calls.log"))
    }

    pub(crate) fn servers(&self) -> Vec<String> {
        read_calls(&self.state.join("servers"))
    }

    /// Path of a file inside the mock's state directory, visible to scripts
    /// as `"$state/<name>"`.
    pub(crate) fn state_file(&self, name: &str) -> PathBuf {
        self.state.join(name)
    }

    pub(crate) fn set_servers(&self, raw: &str) {
        std::fs::write(self.state.join("servers"), raw).expect("write servers");
    }
}
