use crate::config::Config;
use crate::error::Result;
use crate::process::ToolRunner;
use crate::utils::print_warning;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Remove every line containing `marker` from a shell rc file.
///
/// The file is only rewritten when something was removed. Returns whether
/// the file changed.
pub fn strip_marked_lines(path: &Path, marker: &str) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }

    let contents = std::fs::read_to_string(path)?;
    let kept: Vec<&str> = contents.lines().filter(|line| !line.contains(marker)).collect();

    if kept.len() == contents.lines().count() {
        return Ok(false);
    }

    let mut cleaned = kept.join("\n");
    cleaned.push('\n');
    std::fs::write(path, cleaned)?;
    debug!(path = %path.display(), "removed managed lines");
    Ok(true)
}

/// Undo the environment variables older releases exported for the CLI.
///
/// Best-effort: an rc file that cannot be read or rewritten is reported and
/// skipped. Returns the rc files that were cleaned.
pub fn clean_legacy_env(config: &Config, runner: &dyn ToolRunner) -> Vec<PathBuf> {
    if cfg!(windows) {
        clear_windows_user_env(runner);
        return Vec::new();
    }

    let mut cleaned = Vec::new();
    for rc in config.shell_rc_files() {
        match strip_marked_lines(&rc, &config.rc_marker) {
            Ok(true) => cleaned.push(rc),
            Ok(false) => {}
            Err(err) => {
                warn!(path = %rc.display(), error = %err, "skipping shell rc cleanup");
                print_warning(&format!("Could not clean {}: {}", rc.display(), err));
            }
        }
    }
    cleaned
}

fn clear_windows_user_env(runner: &dyn ToolRunner) {
    let Some(setx) = runner.which("setx") else {
        return;
    };

    for name in [crate::credentials::API_KEY_VAR, crate::credentials::BASE_URL_VAR] {
        if let Err(err) = runner.run(&setx, &[name, ""], None) {
            warn!(variable = name, error = %err, "could not clear user variable");
        }
    }
}
