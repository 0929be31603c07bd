//! Shell completion generation shared by the CLI binaries.

use clap::{CommandFactory, ValueEnum};
use clap_complete::Shell;
use std::io;

/// Shells completions can be generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShellType {
    /// Bourne Again shell
    Bash,
    /// Z shell
    Zsh,
    /// Fish shell
    Fish,
    /// `PowerShell`
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl From<ShellType> for Shell {
    fn from(shell: ShellType) -> Self {
        match shell {
            ShellType::Bash => Self::Bash,
            ShellType::Zsh => Self::Zsh,
            ShellType::Fish => Self::Fish,
            ShellType::PowerShell => Self::PowerShell,
            ShellType::Elvish => Self::Elvish,
        }
    }
}

/// Write completions for the command `A` to stdout.
pub fn generate_completions<A: CommandFactory>(shell: ShellType, bin_name: &str) {
    let mut command = A::command();
    clap_complete::generate(Shell::from(shell), &mut command, bin_name, &mut io::stdout());
}
