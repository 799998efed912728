//! Environment probes: multiplexer detection, OS window focus and tmux pane
//! activity.
//!
//! The environment reads are pure functions over a variable lookup so they
//! can be tested without touching the process environment. The command
//! probes block the caller, bounded by a timeout.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Name the host application puts in its terminal title.
pub const HOST_APP_NAME: &str = "WeeChat";

/// Default bound for a single probe command.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// `list-panes` format printing the quoted pid of the active pane only.
pub const PANE_PID_FORMAT: &str = "#{?pane_active,'#{pane_pid}',}";

/// Probe failures.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The probe tool is not installed where the settings say.
    #[error("probe tool not found at {}", path.display())]
    Unavailable { path: PathBuf },
    /// The tool could not be started or exited unsuccessfully.
    #[error("failed to run {program}: {reason}")]
    Execution { program: String, reason: String },
    /// The tool ran but its output could not be interpreted.
    #[error("unexpected output from {program}: {output:?}")]
    Malformed { program: String, output: String },
    /// The tool did not exit in time and was killed.
    #[error("{program} did not finish within {}ms", timeout.as_millis())]
    TimedOut { program: String, timeout: Duration },
}

/// The terminal multiplexer the host runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplexer {
    None,
    /// GNU screen; pane activity cannot be queried.
    Screen,
    Tmux,
}

impl fmt::Display for Multiplexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Screen => "screen",
            Self::Tmux => "tmux",
        };
        write!(f, "{s}")
    }
}

/// Detects the multiplexer from the variables it exports.
///
/// `TMUX` wins over `STY` (tmux nested inside screen reports tmux).
pub fn detect_multiplexer(is_set: impl Fn(&str) -> bool) -> Multiplexer {
    if is_set("TMUX") {
        Multiplexer::Tmux
    } else if is_set("STY") {
        Multiplexer::Screen
    } else {
        Multiplexer::None
    }
}

/// Whether an X display is reachable, judged by `DISPLAY`.
pub fn display_available(is_set: impl Fn(&str) -> bool) -> bool {
    is_set("DISPLAY")
}

/// Whether the focused window is the terminal running the host.
///
/// A non-empty `pattern` must equal the title exactly; any title containing
/// [`HOST_APP_NAME`] matches regardless.
pub fn window_title_matches(pattern: &str, observed: &str) -> bool {
    (!pattern.is_empty() && observed == pattern) || observed.contains(HOST_APP_NAME)
}

/// Parses the active pane pid out of `list-panes` output.
///
/// Inactive panes render as blank lines and are skipped. Exactly one
/// non-blank line is expected; its first and last characters are the quote
/// decoration and are stripped before parsing.
pub fn parse_pane_pid(program: &str, output: &str) -> Result<u32, ProbeError> {
    let malformed = || ProbeError::Malformed {
        program: program.to_string(),
        output: output.to_string(),
    };

    let mut lines = output.lines().filter(|l| !l.trim().is_empty());
    let line = lines.next().ok_or_else(malformed)?.trim();
    if lines.next().is_some() {
        return Err(malformed());
    }

    let mut chars = line.chars();
    chars.next().ok_or_else(malformed)?;
    chars.next_back().ok_or_else(malformed)?;
    chars.as_str().parse().map_err(|_| malformed())
}

/// Runs a probe command to completion and returns its stdout.
///
/// Output is drained while the child runs so a chatty tool cannot stall on a
/// full pipe. The child is killed if it outlives `timeout`.
pub fn run_probe(command: &mut Command, timeout: Duration) -> Result<String, ProbeError> {
    let program = command.get_program().to_string_lossy().into_owned();
    let execution = |reason: String| ProbeError::Execution {
        program: program.clone(),
        reason,
    };

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| execution(e.to_string()))?;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if started.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProbeError::TimedOut { program, timeout });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(execution(format!("failed to poll: {e}"))),
        }
    };

    let stdout = match stdout {
        Some(reader) => collect(reader)
            .map_err(|e| execution(format!("failed to read output: {e}")))?,
        None => Vec::new(),
    };

    if !status.success() {
        let stderr = stderr.and_then(|reader| collect(reader).ok()).unwrap_or_default();
        let stderr = String::from_utf8_lossy(&stderr);
        let stderr = stderr.trim();
        let reason = if stderr.is_empty() {
            format!("exited with {status}")
        } else {
            format!("exited with {status}: {stderr}")
        };
        return Err(execution(reason));
    }

    String::from_utf8(stdout).map_err(|e| execution(format!("output is not UTF-8: {e}")))
}

type PipeReader = thread::JoinHandle<std::io::Result<Vec<u8>>>;

fn drain(mut pipe: impl Read + Send + 'static) -> PipeReader {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn collect(reader: PipeReader) -> std::io::Result<Vec<u8>> {
    reader
        .join()
        .unwrap_or_else(|_| Err(std::io::Error::other("pipe reader panicked")))
}

/// Asks the window manager for the focused window's title.
pub fn query_focused_window_title(tool: &Path, timeout: Duration) -> Result<String, ProbeError> {
    if !tool.is_file() {
        return Err(ProbeError::Unavailable {
            path: tool.to_path_buf(),
        });
    }
    let output = run_probe(
        Command::new(tool).args(["getwindowfocus", "getwindowname"]),
        timeout,
    )?;
    Ok(output.trim().to_string())
}

/// Environment signals the decision engine consults.
pub trait Probes {
    /// The multiplexer the host runs under.
    fn multiplexer(&self) -> Multiplexer;

    /// Whether a notification daemon can be reached at all.
    fn display_available(&self) -> bool;

    /// Whether the focus query tool is installed at `tool`.
    fn focus_tool_exists(&self, tool: &Path) -> bool;

    /// Title of the OS-focused window.
    fn focused_window_title(&self, tool: &Path) -> Result<String, ProbeError>;

    /// Whether the active tmux pane is the one running the host.
    fn is_pane_active(&self) -> Result<bool, ProbeError>;
}

/// [`Probes`] backed by the process environment and real commands.
#[derive(Debug, Clone)]
pub struct SystemProbes {
    tmux_program: PathBuf,
    host_pid: u32,
    timeout: Duration,
}

impl Default for SystemProbes {
    fn default() -> Self {
        Self {
            tmux_program: PathBuf::from("tmux"),
            host_pid: std::process::id(),
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl SystemProbes {
    /// Probes comparing the active pane against this process.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares the active pane against `pid` instead of this process.
    ///
    /// Out-of-process adapters pass the host's pid here.
    #[must_use]
    pub fn with_host_pid(mut self, pid: u32) -> Self {
        self.host_pid = pid;
        self
    }

    #[must_use]
    pub fn with_tmux_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.tmux_program = program.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub const fn host_pid(&self) -> u32 {
        self.host_pid
    }
}

fn env_is_set(key: &str) -> bool {
    std::env::var_os(key).is_some()
}

impl Probes for SystemProbes {
    fn multiplexer(&self) -> Multiplexer {
        detect_multiplexer(env_is_set)
    }

    fn display_available(&self) -> bool {
        display_available(env_is_set)
    }

    fn focus_tool_exists(&self, tool: &Path) -> bool {
        tool.is_file()
    }

    fn focused_window_title(&self, tool: &Path) -> Result<String, ProbeError> {
        query_focused_window_title(tool, self.timeout)
    }

    fn is_pane_active(&self) -> Result<bool, ProbeError> {
        let output = run_probe(
            Command::new(&self.tmux_program).args([
                "list-panes",
                "-F",
                PANE_PID_FORMAT,
            ]),
            self.timeout,
        )?;
        let pane_pid = parse_pane_pid(&self.tmux_program.to_string_lossy(), &output)?;
        tracing::debug!(pane_pid, host_pid = self.host_pid, "queried active pane");
        Ok(pane_pid == self.host_pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(set: &'static [&'static str]) -> impl Fn(&str) -> bool {
        move |key| set.contains(&key)
    }

    #[test]
    fn test_detect_multiplexer_tmux_wins() {
        assert_eq!(detect_multiplexer(vars(&["TMUX", "STY"])), Multiplexer::Tmux);
        assert_eq!(detect_multiplexer(vars(&["TMUX"])), Multiplexer::Tmux);
    }

    #[test]
    fn test_detect_multiplexer_screen_and_none() {
        assert_eq!(detect_multiplexer(vars(&["STY"])), Multiplexer::Screen);
        assert_eq!(detect_multiplexer(vars(&["DISPLAY"])), Multiplexer::None);
        assert_eq!(detect_multiplexer(vars(&[])), Multiplexer::None);
    }

    #[test]
    fn test_display_available() {
        assert!(display_available(vars(&["DISPLAY"])));
        assert!(!display_available(vars(&["WAYLAND_DISPLAY"])));
    }

    #[test]
    fn test_window_title_exact_pattern() {
        assert!(window_title_matches("irssi@box", "irssi@box"));
        assert!(!window_title_matches("irssi@box", "irssi@box2"));
    }

    #[test]
    fn test_window_title_contains_host_name() {
        assert!(window_title_matches("", "WeeChat 4.1.2"));
        assert!(window_title_matches("custom", "me@box: WeeChat"));
        assert!(!window_title_matches("", "Firefox"));
        assert!(!window_title_matches("", ""));
    }

    #[test]
    fn test_parse_pane_pid() {
        assert_eq!(parse_pane_pid("tmux", "'4242'\n").unwrap(), 4242);
        assert_eq!(parse_pane_pid("tmux", "'7'").unwrap(), 7);
        assert_eq!(parse_pane_pid("tmux", "\n'4242'\n\n").unwrap(), 4242);
    }

    #[test]
    fn test_parse_pane_pid_malformed() {
        for output in ["", "\n", "'abc'\n", "'1'\n'2'\n", "'"] {
            let err = parse_pane_pid("tmux", output).unwrap_err();
            assert!(
                matches!(err, ProbeError::Malformed { .. }),
                "expected malformed for {output:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_missing_focus_tool_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err =
            query_focused_window_title(&dir.path().join("xdotool"), DEFAULT_PROBE_TIMEOUT)
                .unwrap_err();
        assert!(matches!(err, ProbeError::Unavailable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_probe_captures_stdout() {
        let out = run_probe(
            Command::new("sh").args(["-c", "echo 'WeeChat 4.0'"]),
            DEFAULT_PROBE_TIMEOUT,
        )
        .unwrap();
        assert_eq!(out, "WeeChat 4.0\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_probe_drains_large_output() {
        let out = run_probe(
            Command::new("sh").args(["-c", "head -c 200000 /dev/zero | tr '\\0' 'a'"]),
            Duration::from_secs(2),
        )
        .unwrap();
        assert_eq!(out.len(), 200_000);
        assert!(out.bytes().all(|b| b == b'a'));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_probe_nonzero_exit() {
        let err = run_probe(
            Command::new("sh").args(["-c", "echo boom >&2; exit 3"]),
            DEFAULT_PROBE_TIMEOUT,
        )
        .unwrap_err();
        match err {
            ProbeError::Execution { program, reason } => {
                assert_eq!(program, "sh");
                assert!(reason.contains("boom"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_run_probe_times_out() {
        let err = run_probe(
            Command::new("sh").args(["-c", "sleep 5"]),
            Duration::from_millis(100),
        )
        .unwrap_err();
        assert!(matches!(err, ProbeError::TimedOut { .. }));
    }

    #[test]
    fn test_run_probe_missing_program() {
        let err = run_probe(
            &mut Command::new("/nonexistent/muxnotify-probe"),
            DEFAULT_PROBE_TIMEOUT,
        )
        .unwrap_err();
        assert!(matches!(err, ProbeError::Execution { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_focused_window_title_trims_output() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("xdotool");
        std::fs::write(&tool, "#!/bin/sh\necho '  irc - WeeChat  '\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let title = query_focused_window_title(&tool, DEFAULT_PROBE_TIMEOUT).unwrap();
        assert_eq!(title, "irc - WeeChat");
    }
}
