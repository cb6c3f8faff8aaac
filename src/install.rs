use crate::config::Config;
use crate::error::{HabitatError, Result};
use crate::process::{display_command, CommandOutput, ToolRunner};
use crate::utils::{print_info, print_warning, spinner};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Drives npm through build, pack and global install of the source tree
pub struct Installer<'a> {
    config: &'a Config,
    runner: &'a dyn ToolRunner,
}

impl<'a> Installer<'a> {
    pub fn new(config: &'a Config, runner: &'a dyn ToolRunner) -> Self {
        Self { config, runner }
    }

    /// Locate the package manager; its absence is fatal.
    pub fn find_npm(&self) -> Result<PathBuf> {
        self.runner
            .which(&self.config.npm)
            .ok_or_else(|| HabitatError::MissingTool(self.config.npm.clone()))
    }

    pub fn resolve_binary(&self) -> Option<PathBuf> {
        self.runner.which(&self.config.bin_name)
    }

    /// Version declared in `package.json`, or "unknown"
    pub fn package_version(source: &Path) -> String {
        std::fs::read_to_string(source.join("package.json"))
            .ok()
            .and_then(|contents| serde_json::from_str::<serde_json::Value>(&contents).ok())
            .and_then(|pkg| pkg.get("version").and_then(|v| v.as_str()).map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Install dependencies, build, pack and install the tarball globally.
    pub fn build_and_install(&self, npm: &Path, source: &Path) -> Result<()> {
        self.step("Installing dependencies...", npm, &["install", "--ignore-scripts"], Some(source))?;
        self.step("Building...", npm, &["run", "build"], Some(source))?;

        let packed = self.step("Packing...", npm, &["pack", "--ignore-scripts"], Some(source))?;
        let tarball = packed
            .last_line()
            .map(|name| source.join(name))
            .ok_or_else(|| HabitatError::PackFailed("npm pack produced no output".to_string()))?;

        if !tarball.is_file() {
            return Err(HabitatError::PackFailed(format!("{} does not exist", tarball.display())));
        }

        let tarball_arg = tarball.to_string_lossy().into_owned();
        let installed = self.step("Installing globally...", npm, &["install", "-g", tarball_arg.as_str()], None);

        if let Err(err) = std::fs::remove_file(&tarball) {
            warn!(path = %tarball.display(), error = %err, "could not remove tarball");
        }

        installed.map(|_| ())
    }

    /// Remove the globally installed package.
    pub fn uninstall_package(&self, npm: &Path) -> Result<()> {
        self.step(
            "Removing global package...",
            npm,
            &["uninstall", "-g", self.config.package_name.as_str()],
            None,
        )
        .map(|_| ())
    }

    fn step(&self, label: &str, program: &Path, args: &[&str], cwd: Option<&Path>) -> Result<CommandOutput> {
        print_info(label);
        let pb = spinner(&display_command(program, args));
        let output = self.runner.run(program, args, cwd);
        pb.finish_and_clear();
        let output = output?;

        if output.success() {
            return Ok(output);
        }

        let command = display_command(program, args);
        if self.config.strict {
            let stderr = output.stderr.trim();
            if !stderr.is_empty() {
                eprintln!("{}", stderr);
            }
            return Err(HabitatError::CommandFailed {
                command,
                status: output.status_text(),
            });
        }

        warn!(command = %command, status = %output.status_text(), "continuing after failed step");
        print_warning(&format!("`{}` exited with status {}, continuing", command, output.status_text()));
        Ok(output)
    }
}
