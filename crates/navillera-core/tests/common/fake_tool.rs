//! Stand-in for gallery-dl: a shell script that echoes the URLs it receives.
//!
//! For every `http*` argument it prints `fetched <url>` on stdout and
//! `note <url>` on stderr. URLs containing `fail` make it exit 3, `slow`
//! makes it sleep (for cancellation tests), `media` makes it print a media
//! file path that does not exist yet.
//!
//! A second script stands in for a tool that runs a child without `exec`,
//! so the child keeps the output pipes open after the tool itself dies.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;

const SCRIPT: &str = r#"#!/bin/sh
status=0
slow=0
for a in "$@"; do
  case "$a" in
    http*)
      echo "fetched $a"
      echo "note $a" >&2
      case "$a" in *fail*) status=3 ;; esac
      case "$a" in *slow*) slow=1 ;; esac
      case "$a" in *media*) echo "/nonexistent/navillera/${a##*/}.jpg" ;; esac
      ;;
  esac
done
if [ "$slow" = 1 ]; then exec sleep 30; fi
exit $status
"#;

const WRAPPER_SCRIPT: &str = r#"#!/bin/sh
echo started
sleep 8
echo done
"#;

/// Writes `body` as an executable file named `name` in `dir`.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, body).expect("write script");
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

struct Tools {
    _dir: TempDir,
    echo: PathBuf,
    wrapper: PathBuf,
}

/// Both scripts are written once per test binary before anything is spawned
/// (executing a file another thread still has open for writing fails with ETXTBSY).
fn tools() -> &'static Tools {
    static TOOLS: OnceLock<Tools> = OnceLock::new();
    TOOLS.get_or_init(|| {
        let dir = tempfile::tempdir().expect("tempdir");
        let echo = write_script(dir.path(), "gallery-dl", SCRIPT);
        let wrapper = write_script(dir.path(), "gallery-dl-wrapper", WRAPPER_SCRIPT);
        Tools { _dir: dir, echo, wrapper }
    })
}

/// The echo tool.
pub fn echo_tool() -> &'static Path {
    &tools().echo
}

/// A tool whose long-running child outlives it unless the whole process group is signalled.
pub fn wrapper_tool() -> &'static Path {
    &tools().wrapper
}
