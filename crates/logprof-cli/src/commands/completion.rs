use anyhow::{Context, Result};
use clap::Command;
use clap_complete::{Shell, generate};
use std::io::{self, Write};

/// Print the completion script for `shell` to stdout
pub fn execute(shell: Shell, cmd: &mut Command) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_script(shell, cmd, &mut out)?;
    out.flush().context("Failed to write completion script")
}

/// Render the completion script into any writer. The binary name is taken
/// from the command so scripts stay correct if the binary is renamed.
pub fn write_script<W: Write>(shell: Shell, cmd: &mut Command, out: &mut W) -> Result<()> {
    let bin_name = cmd.get_name().to_string();
    tracing::debug!("Generating {} completions for {}", shell, bin_name);
    generate(shell, cmd, bin_name, out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::profile::ProfileArgs;
    use clap::Args;

    fn profiler_command() -> Command {
        let profile = ProfileArgs::augment_args(Command::new("ltsv"));
        Command::new("logprof")
            .subcommand(profile)
            .subcommand(ProfileArgs::augment_args(Command::new("json")))
    }

    fn script(shell: Shell) -> String {
        let mut buf = Vec::new();
        write_script(shell, &mut profiler_command(), &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_bash_script_offers_profile_flags() {
        let bash = script(Shell::Bash);
        assert!(bash.contains("_logprof()"));
        assert!(bash.contains("--matching-groups"));
        assert!(bash.contains("--percentiles"));
        assert!(bash.contains("--no-reverse"));
    }

    #[test]
    fn test_fish_script_lists_both_parsers() {
        let fish = script(Shell::Fish);
        assert!(fish.contains("complete -c logprof"));
        assert!(fish.contains("ltsv"));
        assert!(fish.contains("json"));
        assert!(fish.contains("-l show-footers"));
    }
}
