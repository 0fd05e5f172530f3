//! attrel CLI entry point.
//!
//! Usage:
//!   attrel                                  # Interactive REPL
//!   attrel -c '<template>' [-a name=value]  # Evaluate once and exit
//!   attrel -j attrs.json -c '<template>'    # Attributes from a JSON object

use std::env;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use attrel_kernel::EngineConfig;
use attrel_kernel::types::Zone;
use attrel_repl::Repl;
use attrel_repl::format;

fn main() -> ExitCode {
    // RUST_LOG wins; validator warnings show by default
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

/// Parsed command line.
#[derive(Debug, Default)]
struct Options {
    command: Option<String>,
    attributes: Vec<(String, String)>,
    json_files: Vec<String>,
    zone: Option<String>,
    help: bool,
    version: bool,
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .with_context(|| format!("{flag} requires an argument"))
        };

        match arg.as_str() {
            "-h" | "--help" => options.help = true,
            "-V" | "--version" => options.version = true,
            "-c" => options.command = Some(value("-c")?),
            "-a" | "--attr" => {
                let pair = value(arg.as_str())?;
                let (name, val) = pair
                    .split_once('=')
                    .with_context(|| format!("expected name=value, got {pair:?}"))?;
                options.attributes.push((name.to_string(), val.to_string()));
            }
            "-j" | "--json" => options.json_files.push(value(arg.as_str())?),
            "--tz" => options.zone = Some(value("--tz")?),
            other if other.starts_with("--tz=") => {
                options.zone = Some(other["--tz=".len()..].to_string());
            }
            other => bail!("Unknown option: {other}\nRun 'attrel --help' for usage."),
        }
    }
    Ok(options)
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().skip(1).collect();
    let options = parse_args(&args)?;

    if options.help {
        print_help();
        return Ok(ExitCode::SUCCESS);
    }
    if options.version {
        println!("attrel {}", env!("CARGO_PKG_VERSION"));
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = EngineConfig::from_env();
    if let Some(id) = &options.zone {
        let zone = Zone::parse(id).with_context(|| format!("Unknown time zone: {id}"))?;
        config = config.with_default_zone(zone);
    }

    let mut repl = Repl::with_config(config);
    for path in &options.json_files {
        repl.load_attributes(Path::new(path))?;
    }
    for (name, value) in options.attributes {
        repl.set_attribute(name, value);
    }

    match options.command {
        Some(text) => run_command(&repl, &text),
        None => {
            attrel_repl::run(repl)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Evaluate one template and print the result without a trailing newline
/// so the output can be captured verbatim.
fn run_command(repl: &Repl, text: &str) -> Result<ExitCode> {
    match repl.evaluate(text) {
        Ok(rendered) => {
            print!("{rendered}");
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            eprintln!("{}", format::format_error(text, &error));
            Ok(ExitCode::from(2))
        }
    }
}

fn print_help() {
    println!(
        r#"attrel v{}: attribute expression evaluator

Usage:
  attrel                          Interactive REPL
  attrel -c <template> [options]  Evaluate a template and exit

Options:
  -c <template>                   Template to evaluate
  -a, --attr <name=value>         Set an attribute (repeatable)
  -j, --json <file>               Load attributes from a JSON object (repeatable)
  --tz <zone>                     Default time zone (IANA name or GMT+8 style offset)
  -h, --help                      Show this help
  -V, --version                   Show version

Environment:
  ATTREL_TZ                       Default time zone when --tz is not given
  ATTREL_MAX_DEPTH                Maximum expression nesting depth (default 64)
  RUST_LOG                        Log filter, e.g. attrel_kernel=debug

Exit status:
  0 on success, 2 when the template is malformed.

Examples:
  attrel -a pi=3.14159 -c '${{pi:toBigDecimal():setScale(2, "HALF_UP")}}'
  attrel --tz Asia/Shanghai -a d=2019-02-10 -c '${{d:toDate("yyyy-MM-dd"):getDayOfWeek()}}'
"#,
        env!("CARGO_PKG_VERSION")
    );
}
