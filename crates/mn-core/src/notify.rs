//! Desktop notification dispatch through `notify-send`.
//!
//! Dispatch is fire-and-forget from the engine's point of view: each
//! notification runs on its own tokio task with a timeout, and the task's
//! completion handler logs failures. Nothing is retried.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinSet;

/// Application name passed to the notification daemon.
pub const APP_NAME: &str = "WeeChat";

/// Default notification program.
pub const DEFAULT_NOTIFY_PROGRAM: &str = "notify-send";

/// How long a notification command may run before it is abandoned.
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(20);

/// Urgency level understood by `notify-send -u`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Urgency {
    Low,
    Normal,
    Critical,
}

impl Urgency {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = UnknownUrgency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "critical" => Ok(Self::Critical),
            _ => Err(UnknownUrgency(s.to_string())),
        }
    }
}

/// Error type for unknown urgency strings.
#[derive(Debug, Clone)]
pub struct UnknownUrgency(String);

impl fmt::Display for UnknownUrgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown urgency: {} (expected low, normal or critical)", self.0)
    }
}

impl std::error::Error for UnknownUrgency {}

/// Title and body of a desktop notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    /// A notification for a message on the buffer named `buffer_name`.
    pub fn for_buffer(buffer_name: &str, message: &str) -> Self {
        Self {
            title: format!("{buffer_name}:"),
            body: message.to_string(),
        }
    }
}

/// A notification command ready for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl NotifyCommand {
    /// Builds `<program> -i <icon> -a WeeChat -u <urgency> <title> <body>`.
    pub fn new(
        program: impl Into<PathBuf>,
        icon: &str,
        urgency: Urgency,
        notification: &Notification,
    ) -> Self {
        Self {
            program: program.into(),
            args: vec![
                "-i".to_string(),
                icon.to_string(),
                "-a".to_string(),
                APP_NAME.to_string(),
                "-u".to_string(),
                urgency.to_string(),
                notification.title.clone(),
                notification.body.clone(),
            ],
        }
    }
}

/// Notification delivery failures.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The program could not be started.
    #[error("failed to run {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The program exited unsuccessfully.
    #[error("{} exited with {}: {stderr}", program.display(), describe_exit(*code))]
    ExitStatus {
        program: PathBuf,
        code: Option<i32>,
        stderr: String,
    },
    /// The program did not exit in time and was killed.
    #[error("{} timed out after {}s", program.display(), timeout.as_secs())]
    TimedOut { program: PathBuf, timeout: Duration },
}

fn describe_exit(code: Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| format!("code {c}"))
}

/// Sends notification commands.
pub trait Dispatcher {
    /// Starts delivering `command` without waiting for it to finish.
    fn dispatch(&mut self, command: NotifyCommand);
}

/// Runs one notification command to completion.
pub async fn run_notify_command(
    command: &NotifyCommand,
    timeout: Duration,
) -> Result<(), DispatchError> {
    let output = tokio::process::Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(timeout, output)
        .await
        .map_err(|_| DispatchError::TimedOut {
            program: command.program.clone(),
            timeout,
        })?
        .map_err(|source| DispatchError::Spawn {
            program: command.program.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(DispatchError::ExitStatus {
            program: command.program.clone(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(())
}

/// [`Dispatcher`] that spawns each command on a tokio runtime.
pub struct CommandDispatcher {
    runtime: Handle,
    timeout: Duration,
    in_flight: JoinSet<Result<(), DispatchError>>,
}

impl fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("timeout", &self.timeout)
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl CommandDispatcher {
    /// Creates a dispatcher spawning onto `runtime`.
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            timeout: DEFAULT_NOTIFY_TIMEOUT,
            in_flight: JoinSet::new(),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of dispatches not yet collected.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Waits for every outstanding dispatch and returns their results.
    pub async fn wait_idle(&mut self) -> Vec<Result<(), DispatchError>> {
        let mut results = Vec::new();
        while let Some(joined) = self.in_flight.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => tracing::error!(error = %e, "notification task panicked"),
            }
        }
        results
    }

    fn reap_finished(&mut self) {
        while self.in_flight.try_join_next().is_some() {}
    }
}

impl Dispatcher for CommandDispatcher {
    fn dispatch(&mut self, command: NotifyCommand) {
        self.reap_finished();
        let timeout = self.timeout;
        tracing::debug!(program = %command.program.display(), args = ?command.args, "dispatching notification");
        self.in_flight.spawn_on(
            async move {
                let result = run_notify_command(&command, timeout).await;
                if let Err(e) = &result {
                    tracing::error!(error = %e, "notification failed");
                }
                result
            },
            &self.runtime,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_parse() {
        assert_eq!("low".parse::<Urgency>().unwrap(), Urgency::Low);
        assert_eq!("critical".parse::<Urgency>().unwrap(), Urgency::Critical);
        let err = "urgent".parse::<Urgency>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown urgency: urgent (expected low, normal or critical)"
        );
    }

    #[test]
    fn test_notify_command_argv() {
        let notification = Notification::for_buffer("#rust", "alice: ping");
        let cmd = NotifyCommand::new("notify-send", "weechat", Urgency::Normal, &notification);

        assert_eq!(cmd.program, PathBuf::from("notify-send"));
        assert_eq!(
            cmd.args,
            ["-i", "weechat", "-a", "WeeChat", "-u", "normal", "#rust:", "alice: ping"]
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let cmd = NotifyCommand::new(
            "/nonexistent/notify-send",
            "weechat",
            Urgency::Low,
            &Notification::for_buffer("bob", "hi"),
        );
        let err = run_notify_command(&cmd, DEFAULT_NOTIFY_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_reported() {
        let cmd = NotifyCommand {
            program: PathBuf::from("sh"),
            args: vec!["-c".to_string(), "echo 'no daemon' >&2; exit 1".to_string()],
        };
        let err = run_notify_command(&cmd, DEFAULT_NOTIFY_TIMEOUT)
            .await
            .unwrap_err();
        match err {
            DispatchError::ExitStatus { code, stderr, .. } => {
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "no daemon");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_program_times_out() {
        let cmd = NotifyCommand {
            program: PathBuf::from("sh"),
            args: vec!["-c".to_string(), "sleep 5".to_string()],
        };
        let err = run_notify_command(&cmd, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::TimedOut { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dispatcher_runs_in_background() {
        let mut dispatcher = CommandDispatcher::new(Handle::current());
        dispatcher.dispatch(NotifyCommand {
            program: PathBuf::from("true"),
            args: Vec::new(),
        });
        dispatcher.dispatch(NotifyCommand {
            program: PathBuf::from("false"),
            args: Vec::new(),
        });
        assert_eq!(dispatcher.in_flight(), 2);

        let results = dispatcher.wait_idle().await;
        assert_eq!(results.len(), 2);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(dispatcher.in_flight(), 0);
    }
}
