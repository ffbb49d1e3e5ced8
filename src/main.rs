use clap::Parser;
use trendquest::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
