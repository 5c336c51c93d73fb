// Command-line interface for cfdoc
//
// This binary converts wiki pages between storage format, Markdown and the inspection dumps,
// using the cfdoc-babel library. It only touches local files.
//
// Converting:
//
// The conversion needs a to and from pair. The from is auto-detected from the file extension,
// while being overridable by an explicit --from flag.
// Usage:
//  cfdoc <input> --to <format> [--from <format>] [--output <file>]  - Convert between formats (default)
//  cfdoc convert <input> --to <format> [--from <format>] [--output <file>]  - Same as above (explicit)
//  cfdoc inspect <path> [<view>]          - Show a pipeline stage (defaults to the configured view)
//  cfdoc --list-formats                   - List available formats
//
// Extra Parameters:
//
// Parameters can be passed using --extra-<parameter-name> <value>.
// Names that match a configuration setting (ast-full, bullet-char, max-input-bytes, ...)
// override it; everything else is handed to the target format.
// Example:
//  cfdoc inspect page.xhtml --extra-ast-full
//  cfdoc page.xhtml --to markdown --extra-bullet-char '*'

use cfdoc_cli::transforms;

use cfdoc_babel::formats::treeviz::TreevizFormat;
use cfdoc_babel::{Format, FormatRegistry, ParserOptions};
use cfdoc_config::{CfdocConfig, InspectView, Loader, PROJECT_CONFIG_FILE};
use clap::{Arg, ArgAction, Command, ValueHint};
use std::collections::HashMap;
use std::fs;

/// `--extra-*` names that map onto configuration keys.
const CONFIG_OVERRIDES: &[(&str, &str)] = &[
    ("ast-full", "inspect.ast_full"),
    ("bullet-char", "markdown.bullet_char"),
    ("tight-lists", "markdown.tight_lists"),
    ("toc-placeholder", "markdown.toc_placeholder"),
    ("max-input-bytes", "parser.max_input_bytes"),
    ("strict-html", "parser.strict_html"),
    ("capture-source", "parser.capture_original_source"),
    ("max-nesting-depth", "parser.max_nesting_depth"),
];

/// Parse extra-* arguments from command line args
/// Returns (cleaned_args_without_extras, extra_params_map)
///
/// Supports both:
/// - `--extra-<key> <value>` (explicit value)
/// - `--extra-<key>` (boolean flag, defaults to "true")
/// - `--extras-<key>` (alias for `--extra-<key>`)
fn parse_extra_args(args: &[String]) -> (Vec<String>, HashMap<String, String>) {
    let mut cleaned_args = Vec::new();
    let mut extra_params = HashMap::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        let key_opt = if let Some(key) = arg.strip_prefix("--extra-") {
            Some(key)
        } else {
            arg.strip_prefix("--extras-")
        };

        if let Some(key) = key_opt {
            // A following value counts unless it looks like another flag. A lone "-"
            // or "*" is a value (bullet characters).
            let has_value = if i + 1 < args.len() {
                let next = &args[i + 1];
                next == "-" || !next.starts_with('-')
            } else {
                false
            };

            if has_value {
                extra_params.insert(key.to_string(), args[i + 1].clone());
                i += 2;
            } else {
                extra_params.insert(key.to_string(), "true".to_string());
                i += 1;
            }
            continue;
        }

        cleaned_args.push(arg.clone());
        i += 1;
    }

    (cleaned_args, extra_params)
}

fn build_cli() -> Command {
    Command::new("cfdoc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert wiki storage-format pages to and from Markdown")
        .long_about(
            "cfdoc converts wiki pages between the storage format (XHTML with ac:/ri: \
            elements) and Markdown, and exposes the document AST for inspection.\n\n\
            Commands:\n  \
            - convert: Transform between document formats (default)\n  \
            - inspect: View a stage of the conversion pipeline\n\n\
            Extra Parameters:\n  \
            Use --extra-<name> [value] to override settings or pass format options.\n  \
            Boolean flags can omit the value (defaults to 'true').\n\n\
            Examples:\n  \
            cfdoc page.xhtml --to markdown              # Convert to markdown (stdout)\n  \
            cfdoc notes.md --to storage -o page.xhtml   # Markdown to storage file\n  \
            cfdoc inspect page.xhtml                    # View AST tree visualization\n  \
            cfdoc inspect page.xhtml preprocessed       # View the preprocessed markup",
        )
        .arg_required_else_help(true)
        .subcommand_required(false)
        .arg(
            Arg::new("list-formats")
                .long("list-formats")
                .help("List available formats")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to a cfdoc.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log debug output to stderr (RUST_LOG takes precedence)")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("inspect")
                .about("Inspect a stage of the conversion pipeline")
                .long_about(
                    "View the document at different processing stages.\n\n\
                    Views:\n  \
                    - preprocessed: storage markup after the namespace rewrite\n  \
                    - ast-json:     AST as JSON\n  \
                    - ast-treeviz:  AST as tree visualization (default)\n\n\
                    Extra Parameters:\n  \
                    --extra-ast-full      Also list inline nodes, table rows and cells\n\n\
                    Examples:\n  \
                    cfdoc inspect page.xhtml                     # Tree visualization\n  \
                    cfdoc inspect page.xhtml ast-json            # JSON dump\n  \
                    cfdoc inspect notes.md --extra-ast-full      # Full tree of a markdown file",
                )
                .arg(
                    Arg::new("path")
                        .help("Path to the input file")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("view")
                        .help("View to show. Defaults to the configured view (ast-treeviz)")
                        .required(false)
                        .value_parser(clap::builder::PossibleValuesParser::new(
                            transforms::AVAILABLE_VIEWS,
                        ))
                        .index(2)
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("Source format (auto-detected from file extension if not specified)")
                        .value_hint(ValueHint::Other),
                ),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert between document formats (default command)")
                .long_about(
                    "Convert documents between different formats.\n\n\
                    Supported formats:\n  \
                    - storage:  Wiki storage format (.xhtml, .storage, .html)\n  \
                    - markdown: Markdown (.md, .markdown)\n  \
                    - json:     AST as JSON (output only)\n  \
                    - treeviz:  AST tree visualization (output only)\n\n\
                    The source format is auto-detected from the file extension.\n\
                    Output goes to stdout by default, or use -o to specify a file.\n\n\
                    Examples:\n  \
                    cfdoc convert page.xhtml --to markdown          # Markdown on stdout\n  \
                    cfdoc convert notes.md --to storage -o out.xhtml\n  \
                    cfdoc page.xhtml --to json                      # 'convert' is optional",
                )
                .arg(
                    Arg::new("input")
                        .help("Input file path")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("Source format (auto-detected from file extension if not specified)")
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Target format (required)")
                        .long_help(
                            "Target format to convert to.\n\n\
                            Available formats: storage, markdown, json, treeviz\n\
                            Use the format name, not the file extension.",
                        )
                        .required(true)
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Output file path (defaults to stdout)")
                        .value_hint(ValueHint::FilePath),
                ),
        )
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Parse extra-* arguments before clap processing
    let (cleaned_args, mut extra_params) = parse_extra_args(&args);

    let cli = build_cli();
    let matches = match cli.clone().try_get_matches_from(&cleaned_args) {
        Ok(m) => m,
        Err(e) => {
            // A leading file argument means the convert subcommand was left out
            if cleaned_args.len() > 1
                && !cleaned_args[1].starts_with('-')
                && cleaned_args[1] != "inspect"
                && cleaned_args[1] != "convert"
                && cleaned_args[1] != "help"
            {
                let mut new_args = vec![cleaned_args[0].clone(), "convert".to_string()];
                new_args.extend_from_slice(&cleaned_args[1..]);

                match cli.try_get_matches_from(&new_args) {
                    Ok(m) => m,
                    Err(e2) => e2.exit(),
                }
            } else {
                e.exit();
            }
        }
    };

    init_logging(matches.get_flag("verbose"));

    if matches.get_flag("list-formats") {
        handle_list_formats_command();
        return;
    }

    let config = load_cli_config(
        matches.get_one::<String>("config").map(|s| s.as_str()),
        &mut extra_params,
    );
    let registry = FormatRegistry::with_options(
        (&config.parser).into(),
        (&config.markdown).into(),
    );

    match matches.subcommand() {
        Some(("inspect", sub_matches)) => {
            let Some(path) = sub_matches.get_one::<String>("path") else {
                exit_with("path is required");
            };
            let view = match sub_matches.get_one::<String>("view") {
                Some(name) => InspectView::from_name(name)
                    .unwrap_or_else(|| exit_with(&format!("Unknown view: {name}"))),
                None => config.inspect.default_view,
            };
            let from = resolve_from(&registry, path, sub_matches.get_one::<String>("from"));
            handle_inspect_command(&registry, path, &from, view, &extra_params, &config);
        }
        Some(("convert", sub_matches)) => {
            let Some(input) = sub_matches.get_one::<String>("input") else {
                exit_with("input is required");
            };
            let Some(to) = sub_matches.get_one::<String>("to") else {
                exit_with("--to is required");
            };
            let from = resolve_from(&registry, input, sub_matches.get_one::<String>("from"));
            let output = sub_matches.get_one::<String>("output").map(|s| s.as_str());
            handle_convert_command(&registry, input, &from, to, output, &extra_params, &config);
        }
        _ => {
            eprintln!("Unknown subcommand. Use --help for usage information.");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter),
    )
    .format_timestamp(None)
    .try_init();
}

fn exit_with(message: &str) -> ! {
    eprintln!("Error: {message}");
    std::process::exit(1);
}

/// Use the explicit `--from` or detect the format from the file extension.
fn resolve_from(registry: &FormatRegistry, input: &str, explicit: Option<&String>) -> String {
    if let Some(f) = explicit {
        return f.to_string();
    }
    match registry.detect_format_from_filename(input) {
        Some(detected) => {
            log::debug!("detected format '{detected}' for {input}");
            detected
        }
        None => {
            eprintln!("Error: Could not detect format from filename '{input}'");
            eprintln!("Please specify --from explicitly");
            std::process::exit(1);
        }
    }
}

/// Handle the inspect command
fn handle_inspect_command(
    registry: &FormatRegistry,
    path: &str,
    from: &str,
    view: InspectView,
    extra_params: &HashMap<String, String>,
    config: &CfdocConfig,
) {
    let source = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{path}': {e}");
        std::process::exit(1);
    });

    let params = build_format_params(config, extra_params);

    let output = transforms::execute_view(
        registry,
        &source,
        from,
        view,
        &ParserOptions::from(&config.parser),
        &params,
    )
    .unwrap_or_else(|e| {
        eprintln!("Execution error: {e}");
        std::process::exit(1);
    });

    print!("{output}");
}

/// Handle the convert command
fn handle_convert_command(
    registry: &FormatRegistry,
    input: &str,
    from: &str,
    to: &str,
    output: Option<&str>,
    extra_params: &HashMap<String, String>,
    config: &CfdocConfig,
) {
    // Validate formats exist
    if let Err(e) = registry.get(from) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    if let Err(e) = registry.get(to) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let source = fs::read_to_string(input).unwrap_or_else(|e| {
        eprintln!("Error reading file '{input}': {e}");
        std::process::exit(1);
    });

    let doc = registry.parse(&source, from).unwrap_or_else(|e| {
        eprintln!("Parse error: {e}");
        std::process::exit(1);
    });
    log::debug!("parsed {} top-level nodes from {input} as {from}", doc.len());

    let format_options = if to == TreevizFormat.name() {
        build_format_params(config, extra_params)
    } else {
        extra_params.clone()
    };

    let mut result = registry
        .serialize_with_options(&doc, to, &format_options)
        .unwrap_or_else(|e| {
            eprintln!("Serialization error: {e}");
            std::process::exit(1);
        });
    if to == "json" {
        result.push('\n');
    }

    match output {
        Some(path) => {
            fs::write(path, result).unwrap_or_else(|e| {
                eprintln!("Error writing file '{path}': {e}");
                std::process::exit(1);
            });
            log::debug!("wrote {to} output to {path}");
        }
        None => print!("{result}"),
    }
}

/// Handle the list-formats command
fn handle_list_formats_command() {
    let registry = FormatRegistry::default();
    println!("Available formats:\n");
    for name in registry.list_formats() {
        let Ok(format) = registry.get(&name) else {
            continue;
        };
        let direction = match (format.supports_parsing(), format.supports_serialization()) {
            (true, true) => "read/write",
            (true, false) => "read",
            (false, true) => "write",
            (false, false) => "-",
        };
        let extensions = format
            .file_extensions()
            .iter()
            .map(|ext| format!(".{ext}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "  {name:<10} {direction:<11} {:<40} {extensions}",
            format.description()
        );
    }

    println!("\nInspect views:");
    for view in transforms::AVAILABLE_VIEWS {
        println!("  {view}");
    }
}

/// Layer defaults, `./cfdoc.toml`, `--config` and the `--extra-*` overrides.
///
/// Extras that name a setting are removed from `extra_params`.
fn load_cli_config(
    explicit_path: Option<&str>,
    extra_params: &mut HashMap<String, String>,
) -> CfdocConfig {
    let loader = Loader::new().with_optional_file(PROJECT_CONFIG_FILE);
    let mut loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };

    for (flag, key) in CONFIG_OVERRIDES {
        if let Some(raw) = extra_params.remove(*flag) {
            loader = loader.set_override(key, raw).unwrap_or_else(|err| {
                eprintln!("Invalid value for --extra-{flag}: {err}");
                std::process::exit(1);
            });
        }
    }

    loader.build().unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    })
}

/// Parameters for the tree views: configured defaults, then the remaining extras.
fn build_format_params(
    config: &CfdocConfig,
    overrides: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut params = HashMap::new();

    if config.inspect.ast_full {
        params.insert("ast-full".to_string(), "true".to_string());
    }

    for (key, value) in overrides {
        params.insert(key.clone(), value.clone());
    }

    params
}
