mod echo;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use owo_colors::OwoColorize;
use postscope_core::{FormatRegistry, ParseResult, RetrievedResource, SanitizeConfig, Sanitizer, strip_html};
use tracing_subscriber::EnvFilter;

use crate::echo::{Status, Steps, byte_count, print_banner, status};

pub(crate) const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Normalize retrieved feeds into canonical entries and sanitize untrusted HTML
#[derive(Parser, Debug)]
#[command(name = "postscope")]
#[command(author = "Postscope Contributors")]
#[command(version)]
#[command(about = "Normalize feeds and sanitize untrusted HTML", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a retrieved feed and print the result as JSON
    Parse(ParseArgs),
    /// Sanitize an HTML fragment
    Sanitize(SanitizeArgs),
}

/// Options shared by every subcommand
#[derive(Args, Debug)]
struct CommonArgs {
    /// Local file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Keep iframes from safelisted embed providers
    #[arg(long)]
    allow_embeds: bool,

    /// Embed provider prefix to safelist, replacing the defaults (repeatable)
    #[arg(long = "embed-provider", value_name = "PREFIX")]
    embed_providers: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct ParseArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// URL the input was retrieved from
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// HTTP status code of the retrieval
    #[arg(long, default_value = "200", value_name = "CODE")]
    status: u16,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args, Debug)]
struct SanitizeArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Resolve relative URLs against this base
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Strip images and other media from output
    #[arg(long)]
    no_images: bool,

    /// Print plain text instead of HTML
    #[arg(long)]
    text: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn sanitize_config(common: &CommonArgs) -> SanitizeConfig {
    common
        .embed_providers
        .iter()
        .fold(SanitizeConfig::builder().allow_embeds(common.allow_embeds), |builder, provider| {
            builder.embed_provider(provider.as_str())
        })
        .build()
}

/// Read the input into a resource, from stdin when the input is "-"
fn read_input(input: &str, url: Option<&str>, status: u16) -> anyhow::Result<RetrievedResource> {
    let resource = if input == "-" {
        RetrievedResource::from_reader(io::stdin().lock(), url.unwrap_or_default())
            .context("Failed to read from stdin")?
    } else {
        RetrievedResource::from_file(input, url).with_context(|| format!("Failed to read file: {}", input))?
    };

    Ok(RetrievedResource::new(resource.url(), status, resource.body()))
}

fn write_output(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            status(Status::Done, format!("Output written to {}", path.display().bright_white()));
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn run_parse(args: ParseArgs) -> anyhow::Result<()> {
    let mut steps = Steps::new(3, args.common.verbose);
    steps.next(format!("Reading {}", args.common.input.bright_white()));

    let resource = read_input(&args.common.input, args.url.as_deref(), args.status)?;

    steps.detail("Size", byte_count(resource.body().len()));
    if !resource.url().is_empty() {
        steps.detail("URL", resource.url());
    }
    steps.next("Parsing feed");

    let registry = FormatRegistry::builder()
        .sanitize_config(sanitize_config(&args.common))
        .build()
        .context("Invalid sanitize configuration")?;
    let result = registry.parse(&resource);

    match &result {
        ParseResult::Failed { error_description, .. } => steps.warn(error_description),
        ParseResult::Parsed { .. } => steps.detail("Items", result.items().len()),
    }
    steps.next("Writing output");

    let json = result.to_json(args.pretty).context("Failed to serialize result")?;
    write_output(args.common.output.as_deref(), &json)
}

fn run_sanitize(args: SanitizeArgs) -> anyhow::Result<()> {
    let mut steps = Steps::new(3, args.common.verbose);
    steps.next(format!("Reading {}", args.common.input.bright_white()));

    let html = if args.common.input == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).context("Failed to read from stdin")?;
        buffer
    } else {
        fs::read_to_string(&args.common.input)
            .with_context(|| format!("Failed to read file: {}", args.common.input))?
    };

    steps.detail("Size", byte_count(html.len()));
    steps.next(if args.text { "Stripping markup" } else { "Sanitizing HTML" });

    let output = if args.text {
        strip_html(&html)
    } else {
        let sanitizer = Sanitizer::new(sanitize_config(&args.common)).context("Invalid sanitize configuration")?;
        sanitizer.sanitize(&html, !args.no_images, args.base_url.as_deref())
    };

    steps.detail("Output", byte_count(output.len()));
    steps.next("Writing output");

    write_output(args.common.output.as_deref(), &output)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Command::Parse(args) => args.common.verbose,
        Command::Sanitize(args) => args.common.verbose,
    };

    init_tracing(verbose);

    if verbose {
        print_banner();
        status(Status::Note, "Debug logging enabled");
        eprintln!();
    }

    match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::Sanitize(args) => run_sanitize(args),
    }
}
