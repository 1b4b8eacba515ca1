use clap::Parser;
use iac_explain::cli::Cli;
use std::process;

fn main() {
    let cli = Cli::parse();
    cli.init_logging();

    match iac_explain::run_command(cli) {
        Ok(0) => {}
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
