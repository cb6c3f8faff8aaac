//! In-memory stand-ins for the external world, shared by unit tests.

use crate::credentials::ConsentProvider;
use crate::error::Result;
use crate::process::{display_command, CommandOutput, ToolRunner};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Pretends to be npm plus a PATH lookup, recording every command.
pub struct FakeRunner {
    bin_dir: PathBuf,
    tools: RefCell<HashMap<String, PathBuf>>,
    calls: RefCell<Vec<String>>,
    failing: RefCell<Vec<String>>,
    skip_tarball: Cell<bool>,
}

impl FakeRunner {
    pub const TARBALL: &'static str = "claude-habitat-0.4.1.tgz";

    pub fn new(root: &Path) -> Self {
        let bin_dir = root.join("bin");
        let mut tools = HashMap::new();
        tools.insert("npm".to_string(), bin_dir.join("npm"));
        Self {
            bin_dir,
            tools: RefCell::new(tools),
            calls: RefCell::new(Vec::new()),
            failing: RefCell::new(Vec::new()),
            skip_tarball: Cell::new(false),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn remove_tool(&self, name: &str) {
        self.tools.borrow_mut().remove(name);
    }

    pub fn add_tool(&self, name: &str) {
        self.tools.borrow_mut().insert(name.to_string(), self.bin_dir.join(name));
    }

    /// Make any command whose arguments contain `args` exit with status 1.
    pub fn fail_on(&self, args: &str) {
        self.failing.borrow_mut().push(args.to_string());
    }

    pub fn skip_tarball(&self) {
        self.skip_tarball.set(true);
    }

    fn ok(stdout: impl Into<String>) -> CommandOutput {
        CommandOutput {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }
}

impl ToolRunner for FakeRunner {
    fn run(&self, program: &Path, args: &[&str], cwd: Option<&Path>) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(display_command(program, args));

        let joined = args.join(" ");
        if self.failing.borrow().iter().any(|pattern| joined.contains(pattern.as_str())) {
            return Ok(CommandOutput {
                status: Some(1),
                stdout: String::new(),
                stderr: format!("{} failed", joined),
            });
        }

        match args {
            ["pack", ..] => {
                if !self.skip_tarball.get() {
                    let dir = cwd.unwrap_or(Path::new("."));
                    std::fs::write(dir.join(Self::TARBALL), b"tarball")?;
                }
                Ok(Self::ok(format!("npm notice packing\n{}\n", Self::TARBALL)))
            }
            ["install", "-g", ..] => {
                self.add_tool("claude-habitat");
                Ok(Self::ok(""))
            }
            ["uninstall", "-g", ..] => {
                self.remove_tool("claude-habitat");
                Ok(Self::ok(""))
            }
            ["--help"] => Ok(Self::ok("claude-habitat 0.4.1\n\nUsage: claude-habitat <command>\n")),
            _ => Ok(Self::ok("")),
        }
    }

    fn which(&self, name: &str) -> Option<PathBuf> {
        self.tools.borrow().get(name).cloned()
    }
}

/// Consent provider with a fixed answer
pub struct FixedConsent(pub bool);

impl ConsentProvider for FixedConsent {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
