use clap::{Arg, ArgAction, Command, ValueHint};
use clap_complete::{generate_to, shells::*};
use std::env;
use std::io::Error;

// Mirror of the views and formats from src/transforms.rs and the format registry
// We need to duplicate this here since build scripts can't access src/ modules
const AVAILABLE_VIEWS: &[&str] = &["preprocessed", "ast-json", "ast-treeviz"];
const AVAILABLE_FORMATS: &[&str] = &["json", "markdown", "storage", "treeviz"];

fn main() -> Result<(), Error> {
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };

    let mut cmd = Command::new("cfdoc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert wiki storage-format pages to and from Markdown")
        .arg(
            Arg::new("list-formats")
                .long("list-formats")
                .help("List available formats")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to a cfdoc.toml configuration file")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log debug output to stderr")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("inspect")
                .about("Inspect a stage of the conversion pipeline")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("view")
                        .index(2)
                        .value_parser(clap::builder::PossibleValuesParser::new(AVAILABLE_VIEWS)),
                ),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert between document formats")
                .arg(
                    Arg::new("input")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .value_parser(clap::builder::PossibleValuesParser::new(["storage", "markdown"])),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .value_parser(clap::builder::PossibleValuesParser::new(AVAILABLE_FORMATS)),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_hint(ValueHint::FilePath),
                ),
        );

    generate_to(Bash, &mut cmd, "cfdoc", &outdir)?;
    generate_to(Zsh, &mut cmd, "cfdoc", &outdir)?;
    generate_to(Fish, &mut cmd, "cfdoc", &outdir)?;

    println!("cargo:warning=Shell completions generated in {outdir:?}");

    Ok(())
}
