use super::EXIT_SUCCESS;
use clap::CommandFactory;
use clap_complete::Shell;
use std::io::Write;

/// Print the completion script for `shell`, named after the binary.
pub fn run<C: CommandFactory>(shell: Shell) -> Result<u8, String> {
    let script = render::<C>(shell);
    std::io::stdout()
        .write_all(&script)
        .map_err(|e| format!("failed to write {shell} completions: {e}"))?;
    Ok(EXIT_SUCCESS)
}

fn render<C: CommandFactory>(shell: Shell) -> Vec<u8> {
    let mut cmd = C::command();
    let bin = cmd.get_name().to_owned();
    let mut script = Vec::new();
    clap_complete::generate(shell, &mut cmd, bin, &mut script);
    script
}
