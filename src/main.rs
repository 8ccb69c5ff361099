use clap::Parser;
use expander::{handle_command, ExpanderCli};
use std::process;

fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = ExpanderCli::parse();
    let result = handle_command(args.commands, args.snippets);

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
