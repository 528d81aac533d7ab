use std::env;
use std::process::ExitCode;

use asm20465::cli;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    ExitCode::from(cli::run(&args) as u8)
}
