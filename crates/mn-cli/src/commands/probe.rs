//! Probe command for checking what the engine would see.

use std::io::Write;

use anyhow::Result;
use mn_core::{Multiplexer, Probes};

use crate::Config;
use crate::commands::util;

/// Runs the probe command.
pub fn run<W: Write>(writer: &mut W, config: &Config, host_pid: Option<u32>) -> Result<()> {
    let settings = util::load_settings(config)?;
    let probes = util::system_probes(config, host_pid);
    report(writer, &probes, &settings.xdotool_path, probes.host_pid())
}

fn report<W: Write, P: Probes>(
    writer: &mut W,
    probes: &P,
    xdotool_path: &std::path::Path,
    host_pid: u32,
) -> Result<()> {
    let multiplexer = probes.multiplexer();
    writeln!(writer, "multiplexer:    {multiplexer}")?;
    writeln!(
        writer,
        "display:        {}",
        if probes.display_available() { "available" } else { "missing" }
    )?;

    if probes.focus_tool_exists(xdotool_path) {
        match probes.focused_window_title(xdotool_path) {
            Ok(title) => writeln!(writer, "focused window: {title:?}")?,
            Err(e) => writeln!(writer, "focused window: error: {e}")?,
        }
    } else {
        writeln!(writer, "focused window: {} not installed", xdotool_path.display())?;
    }

    if multiplexer == Multiplexer::Tmux {
        match probes.is_pane_active() {
            Ok(active) => writeln!(
                writer,
                "pane active:    {} (host pid {host_pid})",
                if active { "yes" } else { "no" }
            )?,
            Err(e) => writeln!(writer, "pane active:    error: {e}")?,
        }
    } else {
        writeln!(writer, "pane active:    n/a")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use mn_core::ProbeError;

    use super::*;

    struct Scripted;

    impl Probes for Scripted {
        fn multiplexer(&self) -> Multiplexer {
            Multiplexer::Tmux
        }

        fn display_available(&self) -> bool {
            true
        }

        fn focus_tool_exists(&self, _tool: &Path) -> bool {
            true
        }

        fn focused_window_title(&self, _tool: &Path) -> Result<String, ProbeError> {
            Ok("me@box: WeeChat".to_string())
        }

        fn is_pane_active(&self) -> Result<bool, ProbeError> {
            Err(ProbeError::Malformed {
                program: "tmux".to_string(),
                output: String::new(),
            })
        }
    }

    #[test]
    fn test_report_lists_every_probe() {
        let mut output = Vec::new();
        report(&mut output, &Scripted, Path::new("/usr/bin/xdotool"), 42).unwrap();

        let output = String::from_utf8(output).unwrap();
        insta::assert_snapshot!(output, @r#"
        multiplexer:    tmux
        display:        available
        focused window: "me@box: WeeChat"
        pane active:    error: unexpected output from tmux: ""
        "#);
    }
}
