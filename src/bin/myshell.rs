use std::path::PathBuf;
use std::process;

use docopt::Docopt;
use log::{debug, error};
use nix::unistd::Pid;
use serde_derive::Deserialize;

use myshell::{Shell, ShellConfig, SHELL_NAME};

const COMMAND_HISTORY_CAPACITY: usize = 10;
const LOG_FILE_NAME: &str = ".myshell_log";
/// Exit code for a bad invocation or an unreadable batch file.
const INVOCATION_FAILURE_EXIT_CODE: i32 = -1;

const USAGE: &str = "
myshell.

Usage:
    myshell [options]
    myshell [options] <file>
    myshell [options] -c <command>
    myshell (-h | --help)
    myshell --version

Options:
    -h --help       Show this screen.
    --version       Show version.
    -c              Run the statements of <command>, then exit with the status
                        of its last statement.
    --detach        Do not wait for statements ending in '&'; report them when
                        they finish.
    --log=<path>    File to write log to, defaults to ~/.myshell_log
";

/// Docopts input arguments.
#[derive(Debug, Deserialize)]
struct Args {
    arg_command: Option<String>,
    arg_file: Option<String>,
    flag_version: bool,
    flag_c: bool,
    flag_detach: bool,
    flag_log: Option<String>,
}

fn main() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| {
            if e.fatal() {
                eprintln!("{}", e);
                process::exit(INVOCATION_FAILURE_EXIT_CODE);
            }
            e.exit()
        });

    init_logger(&args.flag_log);
    debug!("{:?}", args);

    if args.flag_version {
        println!("{} version {}", SHELL_NAME, env!("CARGO_PKG_VERSION"));
    } else if args.flag_c {
        // docopt only accepts -c together with <command>
        let command = args.arg_command.as_deref().unwrap_or_default();
        let mut shell = Shell::new(noninteractive_config(&args));
        let code = shell.execute_command_string(command);
        shell.exit(code);
    } else if let Some(ref file_path) = args.arg_file {
        let mut shell = Shell::new(noninteractive_config(&args));
        if let Err(e) = shell.execute_commands_from_file(file_path) {
            error!("batch run failed: {}", e);
            eprintln!("{}: {}", SHELL_NAME, e);
            shell.exit(INVOCATION_FAILURE_EXIT_CODE);
        }
        shell.exit(0);
    } else {
        let config =
            ShellConfig::interactive(COMMAND_HISTORY_CAPACITY).detach_background(args.flag_detach);
        let mut shell = Shell::new(config);
        shell.execute_from_stdin();
        shell.exit(0);
    }
}

fn noninteractive_config(args: &Args) -> ShellConfig {
    ShellConfig::noninteractive().detach_background(args.flag_detach)
}

fn init_logger(path: &Option<String>) {
    let log_path = match path.clone().map(PathBuf::from).or_else(default_log_path) {
        Some(log_path) => log_path,
        None => return,
    };

    let log_file = match fern::log_file(&log_path) {
        Ok(log_file) => log_file,
        Err(e) => {
            eprintln!(
                "{}: unable to open log file {}: {}",
                SHELL_NAME,
                log_path.display(),
                e
            );
            return;
        }
    };

    let pid = Pid::this();
    let result = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                pid,
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(log_file)
        .apply();
    if let Err(e) = result {
        eprintln!("{}: unable to initialize logging: {}", SHELL_NAME, e);
    }
}

fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(LOG_FILE_NAME))
}
