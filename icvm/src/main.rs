mod cli;

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;

use cli::{Cli, Commands, ConfigArgs, RunArgs};
use icvm::disasm;
use icvm::output::{render_values, unescape_text};
use icvm::program::{load_program, parse_values};
use icvm::settings::Settings;
use icvm::{Exit, Interpreter, VmError, Word};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run_cli(cli) {
        eprintln!("{}: {:#}", "Error".bright_red().bold(), e);
        process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    let settings_path = cli.config.clone().unwrap_or_else(Settings::settings_path);
    let settings = Settings::load_from(&settings_path);

    let trace = match &cli.command {
        Commands::Run(args) | Commands::Interactive(args) => args.trace || settings.trace,
        Commands::Disasm { .. } | Commands::Config(_) => false,
    };
    init_logging(trace, cli.verbose);

    match cli.command {
        Commands::Run(args) => run_command(&args, &settings, cli.verbose),
        Commands::Interactive(args) => interactive_command(&args, &settings, cli.verbose),
        Commands::Disasm { program, no_color } => disasm_command(&program, no_color),
        Commands::Config(args) => config_command(&args, settings, &settings_path),
    }
}

fn init_logging(trace: bool, verbose: bool) {
    let default_filter = if trace {
        "warn,icvm=trace"
    } else if verbose {
        "warn,icvm=debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

/// Load the program, apply patches and queue the preloaded input
fn build_interpreter(args: &RunArgs) -> Result<Interpreter> {
    let program = load_program(&args.program)
        .with_context(|| format!("failed to load {}", args.program.display()))?;

    let mut input = parse_values(&args.input).context("invalid --input")?;
    if let Some(ref text) = args.text {
        input.extend(unescape_text(text).bytes().map(Word::from));
    }

    let mut vm = Interpreter::with_input(&program, input);
    for (address, value) in &args.patches {
        log::debug!("Patching address {} with {}", address, value);
        vm.memory_mut().write(*address, value.clone());
    }

    Ok(vm)
}

fn run_command(args: &RunArgs, settings: &Settings, verbose: bool) -> Result<()> {
    let mut vm = build_interpreter(args)?;
    let ascii = args.ascii || settings.ascii_output;

    let outcome = vm.run();

    print_outputs(&vm.ports().output.drain(), ascii)?;
    report(&vm, outcome, settings, verbose)
}

fn interactive_command(args: &RunArgs, settings: &Settings, verbose: bool) -> Result<()> {
    let ascii = args.ascii || settings.ascii_output;
    let handle = build_interpreter(args)?.spawn()?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    // Sleeps until the VM asks for input or stops; everything it printed
    // before that is queued by the time we wake
    while handle.wait_for_input() {
        print_outputs(&handle.ports().output.drain(), ascii)?;

        if !ascii {
            eprint!("{} ", ">".bright_green().bold());
        }

        match lines.next() {
            Some(line) => {
                let line = line.context("failed to read stdin")?;
                if ascii {
                    handle.push_ascii(&line);
                    handle.push_input(b'\n');
                } else {
                    match parse_values(&line) {
                        Ok(values) => handle.extend_input(values),
                        Err(e) => eprintln!("{}: {}", "Invalid input".bright_yellow(), e),
                    }
                }
            }
            None => {
                log::debug!("stdin closed, closing VM input");
                handle.close_input();
            }
        }
    }

    let (vm, outcome) = handle.join()?;
    print_outputs(&vm.ports().output.drain(), ascii)?;

    let outcome = match outcome {
        // We closed input ourselves at end of stdin
        Err(VmError::InputClosed { .. }) => {
            eprintln!("{}", "Input closed".bright_black());
            return report_state(&vm, verbose);
        }
        other => other,
    };

    report(&vm, outcome, settings, verbose)
}

fn print_outputs(values: &[Word], ascii: bool) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(render_values(values, ascii).as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn disasm_command(program: &Path, no_color: bool) -> Result<()> {
    let program = load_program(program)
        .with_context(|| format!("failed to load {}", program.display()))?;
    let memory = icvm::vm::Memory::from_program(&program);

    let mut stdout = io::stdout().lock();
    for line in disasm::disassemble(&memory) {
        let row = if no_color {
            disasm::render_line(&line)
        } else {
            disasm::render_line_colored(&line)
        };
        writeln!(stdout, "{row}")?;
    }
    Ok(())
}

fn config_command(args: &ConfigArgs, mut settings: Settings, path: &Path) -> Result<()> {
    if args.has_updates() {
        if let Some(ascii_output) = args.ascii_output {
            settings.ascii_output = ascii_output;
        }
        if let Some(trace) = args.trace {
            settings.trace = trace;
        }
        if let Some(show_exit_reason) = args.show_exit_reason {
            settings.show_exit_reason = show_exit_reason;
        }
        settings
            .save_to(path)
            .with_context(|| format!("failed to save {}", path.display()))?;
        eprintln!("{} {}", "Saved".bright_green(), path.display());
    } else {
        eprintln!("{}", path.display().to_string().bright_black());
    }

    println!("{}", settings.to_json()?);
    Ok(())
}

fn report(
    vm: &Interpreter,
    outcome: Result<Exit, VmError>,
    settings: &Settings,
    verbose: bool,
) -> Result<()> {
    let exit = outcome.context("program failed")?;

    if settings.show_exit_reason || !exit.is_clean() {
        let message = match exit {
            Exit::Halted => "Program halted".bright_black(),
            Exit::UnknownOpcode { .. } => exit.to_string().bright_yellow().bold(),
        };
        eprintln!("{message}");
    }

    report_state(vm, verbose)
}

fn report_state(vm: &Interpreter, verbose: bool) -> Result<()> {
    if verbose {
        eprintln!("{}: {}", "State".bright_cyan().bold(), disasm::format_state(vm));
    }
    Ok(())
}
