//! Best-effort copy of replies to the system clipboard.
//!
//! There is no clipboard API in std, so the text is piped into whichever
//! platform tool is on PATH.

use anyhow::{anyhow, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::debug;

pub trait Clipboard {
    fn copy(&self, text: &str) -> Result<()>;
}

/// A clipboard tool and the arguments that make it read stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipboardTool {
    pub program: &'static str,
    pub args: &'static [&'static str],
}

/// Tried in order; the first one found on PATH wins.
pub const TOOLS: &[ClipboardTool] = &[
    ClipboardTool { program: "pbcopy", args: &[] },
    ClipboardTool { program: "wl-copy", args: &[] },
    ClipboardTool { program: "xclip", args: &["-selection", "clipboard"] },
    ClipboardTool { program: "xsel", args: &["--clipboard", "--input"] },
    ClipboardTool { program: "clip", args: &[] },
];

/// Finds and runs clipboard tools.
pub trait ToolRunner {
    fn program_exists(&self, program: &str) -> bool;

    /// Runs `program` with `stdin` piped in and waits for it.
    fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &str) -> Result<()>;
}

pub struct SystemToolRunner;

impl ToolRunner for SystemToolRunner {
    fn program_exists(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &str) -> Result<()> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        // dropping the handle closes the pipe so the tool sees EOF
        let written = match child.stdin.take() {
            Some(mut pipe) => pipe.write_all(stdin.as_bytes()).map_err(anyhow::Error::from),
            None => Err(anyhow!("{} has no stdin", program)),
        };

        // the child is always reaped, even when it stopped reading early
        if let Err(e) = written {
            let _ = child.kill();
            child.wait()?;
            return Err(e.context(format!("could not write to {}", program)));
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(anyhow!("{} exited with {}", program, status));
        }
        Ok(())
    }
}

pub struct SystemClipboard<R: ToolRunner = SystemToolRunner> {
    runner: R,
}

impl SystemClipboard<SystemToolRunner> {
    pub fn new() -> Self {
        Self::with_runner(SystemToolRunner)
    }
}

impl Default for SystemClipboard<SystemToolRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ToolRunner> SystemClipboard<R> {
    pub fn with_runner(runner: R) -> Self {
        Self { runner }
    }

    fn find_tool(&self) -> Option<&'static ClipboardTool> {
        TOOLS.iter().find(|t| self.runner.program_exists(t.program))
    }
}

impl<R: ToolRunner> Clipboard for SystemClipboard<R> {
    fn copy(&self, text: &str) -> Result<()> {
        let tool = self
            .find_tool()
            .ok_or_else(|| anyhow!("no clipboard tool found on PATH"))?;
        debug!("Copying {} bytes with {}", text.len(), tool.program);
        self.runner.run_with_stdin(tool.program, tool.args, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct MockRunner {
        installed: Vec<&'static str>,
        fail: bool,
        calls: RefCell<Vec<(String, Vec<String>, String)>>,
    }

    impl MockRunner {
        fn with(installed: Vec<&'static str>) -> Self {
            Self {
                installed,
                fail: false,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl ToolRunner for MockRunner {
        fn program_exists(&self, program: &str) -> bool {
            self.installed.contains(&program)
        }

        fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &str) -> Result<()> {
            self.calls.borrow_mut().push((
                program.to_string(),
                args.iter().map(|a| a.to_string()).collect(),
                stdin.to_string(),
            ));
            if self.fail {
                return Err(anyhow!("{} failed", program));
            }
            Ok(())
        }
    }

    #[test]
    fn test_copy_uses_first_installed_tool() {
        let clipboard = SystemClipboard::with_runner(MockRunner::with(vec!["xsel", "xclip"]));

        clipboard.copy("ls -la").unwrap();

        let calls = clipboard.runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "xclip");
        assert_eq!(calls[0].1, vec!["-selection", "clipboard"]);
        assert_eq!(calls[0].2, "ls -la");
    }

    #[test]
    fn test_copy_without_tool_is_an_error() {
        let clipboard = SystemClipboard::with_runner(MockRunner::with(vec![]));

        let err = clipboard.copy("text").unwrap_err();

        assert!(err.to_string().contains("no clipboard tool"));
    }

    #[test]
    fn test_copy_propagates_tool_failure() {
        let mut runner = MockRunner::with(vec!["wl-copy"]);
        runner.fail = true;
        let clipboard = SystemClipboard::with_runner(runner);

        assert!(clipboard.copy("text").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_pipes_text_to_tool() {
        let runner = SystemToolRunner;
        if !runner.program_exists("cat") {
            return;
        }

        runner.run_with_stdin("cat", &[], "hello").unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_reports_tool_that_stops_reading() {
        let runner = SystemToolRunner;
        if !runner.program_exists("true") {
            return;
        }
        // larger than a pipe buffer, so the write outlives the tool
        let text = "x".repeat(4 << 20);

        let err = runner.run_with_stdin("true", &[], &text).unwrap_err();

        assert!(err.to_string().contains("could not write to true"));
    }
}
