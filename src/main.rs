//! Meon Language Runtime entry point.
//!
//! - No arguments: start the interactive REPL.
//! - `-h`/`--help`: print usage and exit 0.
//! - `-v`/`--version`: print the runtime version and exit 0.
//! - `-r [-d|-dd] <file>`: compile and run `<file>`. `-d` disassembles the
//!   compiled chunk before running; `-dd` additionally traces every
//!   executed instruction and the operand stack.
//!
//! Exit codes: `0` on a clean run, `65` on a compile error, `70` on a
//! runtime error, `74` on an I/O failure reading the script file.

use std::env;
use std::fs;
use std::process::ExitCode;

use meon::error::InterpretResult;
use meon::repl;
use meon::vm::{TraceLevel, Vm};

const VERSION: &str = "0.1.0";

fn usage() -> String {
    format!(
        r#"Meon v{0}

Usage:
    meon                     Start the interactive REPL
    meon -r <script.meon>    Run a script
    meon -r -d <script.meon>  Run a script, disassembling it first
    meon -r -dd <script.meon> Run a script, tracing every instruction

Options:
    -h, --help       Show this help message and exit
    -v, --version    Show the runtime version"#,
        VERSION
    )
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.len() == 1 {
        repl::run();
        return ExitCode::SUCCESS;
    }

    match args[1].as_str() {
        "-h" | "--help" => {
            println!("{}", usage());
            ExitCode::SUCCESS
        }
        "-v" | "--version" => {
            println!("meon {}", VERSION);
            ExitCode::SUCCESS
        }
        "-r" => run_file(&args[2..]),
        other => {
            eprintln!("Unknown argument: {}", other);
            eprintln!("{}", usage());
            ExitCode::from(64)
        }
    }
}

fn run_file(rest: &[String]) -> ExitCode {
    let (trace, path) = match rest {
        [flag, path] if flag == "-d" => (TraceLevel::Disassemble, path),
        [flag, path] if flag == "-dd" => (TraceLevel::Execution, path),
        [path] => (TraceLevel::Off, path),
        _ => {
            eprintln!("Usage: meon -r [-d|-dd] <script.meon>");
            return ExitCode::from(64);
        }
    };

    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Can't read file '{}': {}", path, e);
            return ExitCode::from(74);
        }
    };

    let mut vm = Vm::new();
    vm.set_trace(trace);
    match vm.interpret(&source) {
        InterpretResult::Ok => ExitCode::SUCCESS,
        InterpretResult::CompileError => ExitCode::from(65),
        InterpretResult::RuntimeError => ExitCode::from(70),
    }
}
