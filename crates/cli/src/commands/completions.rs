//! Shell completion generation
//!
//! `bk completions zsh > ~/.zfunc/_bk` and similar for bash, fish,
//! elvish and powershell.

use clap::CommandFactory;
use clap_complete::{Generator, Shell};

use super::Cli;
use crate::exit_code::ExitCode;

/// Arguments for the completions command
#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Print completions for the chosen shell to stdout
pub fn execute(args: CompletionsArgs) -> ExitCode {
    write_completions(args.shell, &mut std::io::stdout());
    ExitCode::Success
}

fn write_completions<G: Generator>(generator: G, out: &mut dyn std::io::Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(generator, &mut cmd, name, out);
}
