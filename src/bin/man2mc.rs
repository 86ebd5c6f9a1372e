use anyhow::{Context, Result};
use clap::{Arg, Command, value_parser};
use indoc::indoc;
use log::LevelFilter;
use man2mc::{ManifestParser, convert};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::path::PathBuf;
use std::process::exit;

fn command() -> Command {
    Command::new("man2mc")
        .about("Convert a .man file to a .mc file.")
        .long_about(indoc!(r#"
            Convert a Windows Event Manifest (.man) to a Message Compiler source (.mc).

            Besides the message definitions, the output carries commented-out C scaffolding
            for the provider: event descriptors, the provider GUID, registration helpers
            and EventWrite macros.
        "#))
        .arg(
            Arg::new("input_file")
                .required(true)
                .value_name("INPUT")
                .value_parser(value_parser!(PathBuf))
                .help("Path to the input .man file"),
        )
        .arg(
            Arg::new("output_file")
                .required(true)
                .value_name("OUTPUT")
                .value_parser(value_parser!(PathBuf))
                .help("Path to the output .mc file"),
        )
}

fn try_to_initialize_logging() -> Result<()> {
    TermLogger::init(
        LevelFilter::Warn,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logging")
}

fn main() {
    let matches = command().get_matches();

    if let Err(e) = try_to_initialize_logging() {
        eprintln!("{:#}", e);
    }

    let input = matches
        .get_one::<PathBuf>("input_file")
        .expect("This is a required argument");
    let output = matches
        .get_one::<PathBuf>("output_file")
        .expect("This is a required argument");

    match convert(&ManifestParser::new(), input, output) {
        Ok(_) => println!("Successfully wrote to {}", output.display()),
        Err(e) => {
            eprintln!("Error: {}", e);
            exit(e.exit_code())
        }
    }
}
