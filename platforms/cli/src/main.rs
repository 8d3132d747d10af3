use clap::builder::RangedU64ValueParser;
use clap::Parser;
use ntm::{
    Machine, MachineLoader, MachineManager, Report, RunOptions, Simulator, Summary,
    TuringMachineError, DEFAULT_MAX_DEPTH,
};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Traces a nondeterministic Turing machine breadth-first over every computation branch.
#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
#[clap(after_help = "EXAMPLES:
  ntm --machine machines/equal-01s.csv --input 0011 --path
  ntm --builtin \"a plus\" -i aaa -i aab
  cat machines/abc-star.csv | ntm -i abcabc")]
struct Cli {
    /// The machine definition file (.csv) to trace.
    /// Without this or --builtin, the definition is read from stdin.
    #[clap(short, long, conflicts_with = "builtin")]
    machine: Option<PathBuf>,

    /// The name of a built-in machine
    #[clap(short, long)]
    builtin: Option<String>,

    /// List the built-in machines and exit
    #[clap(short, long)]
    list: bool,

    /// The input string; repeat to trace several inputs
    #[clap(short, long)]
    input: Vec<String>,

    /// Print the accepting path and the final tape
    #[clap(short, long)]
    path: bool,

    /// Stop exploring once the tree reaches this depth
    #[clap(
        short = 'd',
        long,
        default_value_t = DEFAULT_MAX_DEPTH,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    max_depth: usize,

    /// Print one JSON summary per input instead of the text report
    #[clap(long)]
    json: bool,

    /// Log more detail to stderr (-v for debug, -vv for trace)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.list {
        list_machines();
        return ExitCode::SUCCESS;
    }

    let machine = match load_machine(&cli) {
        Ok(machine) => machine,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let options = RunOptions {
        show_path: cli.path,
        max_depth: cli.max_depth,
    };
    let simulator = Simulator::new(&machine, options);

    // No input given: trace the empty string.
    let inputs = if cli.input.is_empty() {
        vec![String::new()]
    } else {
        cli.input.clone()
    };

    if !cli.json {
        println!("Machine: {}", machine.name);
    }

    for input in &inputs {
        if let Some(symbol) = input
            .chars()
            .find(|symbol| !machine.input_alphabet.contains(symbol))
        {
            warn!(%input, %symbol, "input contains a symbol outside the input alphabet");
        }

        let outcome = match simulator.run(input) {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        };

        if cli.json {
            match Summary::new(&machine.name, input, &outcome).to_json() {
                Ok(line) => println!("{}", line),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        } else {
            println!();
            println!("Input String: {}", input);
            print!("{}", Report::new(&outcome, cli.path));
        }
    }

    ExitCode::SUCCESS
}

/// Sends logs to stderr, filtered by `RUST_LOG` or else by the verbosity flag.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .init();
}

/// Loads the machine named on the command line, or piped in on stdin.
fn load_machine(cli: &Cli) -> Result<Machine, TuringMachineError> {
    if let Some(path) = &cli.machine {
        return MachineLoader::load_machine(path);
    }

    if let Some(name) = &cli.builtin {
        return MachineManager::get_machine_by_name(name);
    }

    if atty::is(atty::Stream::Stdin) {
        return Err(TuringMachineError::ValidationError(
            "No machine given: use --machine, --builtin, or pipe a definition on stdin".to_string(),
        ));
    }

    let mut content = String::new();
    io::stdin()
        .read_to_string(&mut content)
        .map_err(|e| TuringMachineError::FileError(format!("Failed to read stdin: {}", e)))?;

    MachineLoader::load_machine_from_string(&content)
}

fn list_machines() {
    for index in 0..MachineManager::get_machine_count() {
        if let Ok(info) = MachineManager::get_machine_info(index) {
            println!(
                "{:<24} {} states, {} transitions{}",
                info.name,
                info.state_count,
                info.transition_count,
                if info.deterministic {
                    ", deterministic"
                } else {
                    ""
                }
            );
        }
    }
}
