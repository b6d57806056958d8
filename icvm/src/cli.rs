use clap::{Args, Parser, Subcommand};
use icvm::Word;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "icvm",
    about = "IntCode Virtual Machine - run, inspect and drive IntCode programs",
    long_about = "The IntCode Virtual Machine executes programs written as comma-separated\n\
                  integers. Programs can run to completion with preloaded input, or\n\
                  interactively with the VM on a background thread reading input from\n\
                  the terminal.",
    version
)]
pub struct Cli {
    /// Settings file (default: ~/.config/icvm/settings.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Show VM state and debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a program to completion with preloaded input
    Run(RunArgs),

    /// Run a program on a background thread, feeding it lines from stdin
    Interactive(RunArgs),

    /// Print a disassembly listing of a program
    Disasm {
        /// Program file to disassemble
        program: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Show the settings file, updating any values given
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Print output values 0..=127 as characters by default
    #[arg(long)]
    pub ascii_output: Option<bool>,

    /// Log every executed instruction by default
    #[arg(long)]
    pub trace: Option<bool>,

    /// Print the exit reason after a run
    #[arg(long)]
    pub show_exit_reason: Option<bool>,
}

impl ConfigArgs {
    pub fn has_updates(&self) -> bool {
        self.ascii_output.is_some() || self.trace.is_some() || self.show_exit_reason.is_some()
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Program file to execute
    pub program: PathBuf,

    /// Comma-separated input values to preload
    #[arg(short = 'i', long, default_value = "")]
    pub input: String,

    /// Text to preload as ASCII codes (supports \n escapes)
    #[arg(short = 't', long)]
    pub text: Option<String>,

    /// Overwrite a memory word before running, e.g. 0=2 (repeatable)
    #[arg(short = 'p', long = "patch", value_parser = parse_patch)]
    pub patches: Vec<(usize, Word)>,

    /// Print output values 0..=127 as characters
    #[arg(long)]
    pub ascii: bool,

    /// Log every executed instruction
    #[arg(long)]
    pub trace: bool,
}

/// Parse an `ADDRESS=VALUE` memory patch
pub fn parse_patch(s: &str) -> Result<(usize, Word), String> {
    let (address, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid patch '{s}': expected ADDRESS=VALUE"))?;
    let address = address
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("Invalid patch address: {address}"))?;
    let value = value
        .trim()
        .parse::<Word>()
        .map_err(|_| format!("Invalid patch value: {value}"))?;
    Ok((address, value))
}
