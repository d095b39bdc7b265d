//! Table Merge CLI
//!
//! Command-line tool for refreshing the first column of a hand-maintained
//! reference table from a freshly generated one.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tm_core::{
    build_latest_map, merge_lines, LatestMap, LatestSource, MergeConfig, MergeSummary, TracingSink,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tm-cli")]
#[command(about = "Merge a generated reference table into a published one", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Where the latest table comes from
#[derive(Args)]
#[group(id = "source", required = true, multiple = false)]
struct SourceArgs {
    /// Pre-generated latest table
    #[arg(short, long)]
    latest: Option<PathBuf>,

    /// Generator program whose stdout is the latest table
    #[arg(long)]
    command: Option<String>,

    /// JSON config file (see create-config)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the published table (stdin by default) and write it to stdout
    Merge {
        #[command(flatten)]
        source: SourceArgs,

        /// Argument passed to the generator program
        #[arg(long = "arg", requires = "command", allow_hyphen_values = true)]
        args: Vec<String>,

        /// Published table to read instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// File to write instead of stdout (may be the input file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the merge summary as JSON on stderr
        #[arg(long)]
        summary: bool,
    },

    /// Show the path map built from the latest table
    Tree {
        #[command(flatten)]
        source: SourceArgs,

        /// Argument passed to the generator program
        #[arg(long = "arg", requires = "command", allow_hyphen_values = true)]
        args: Vec<String>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create a config file template
    CreateConfig {
        /// Output path for the config file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(command: Commands) -> tm_core::Result<()> {
    match command {
        Commands::Merge {
            source,
            args,
            input,
            output,
            summary,
        } => cmd_merge(source, args, input, output, summary),
        Commands::Tree {
            source,
            args,
            format,
        } => cmd_tree(source, args, &format),
        Commands::CreateConfig { output } => cmd_create_config(&output),
    }
}

/// Turn the source flags into a config, loading the config file if given
fn resolve_config(source: SourceArgs, args: Vec<String>) -> tm_core::Result<MergeConfig> {
    if let Some(path) = source.config {
        return MergeConfig::load(path);
    }
    let latest = match (source.latest, source.command) {
        (Some(path), _) => LatestSource::file(path),
        (None, Some(program)) => LatestSource::command(program, args),
        // clap's required group rules this out
        (None, None) => unreachable!("no latest table source"),
    };
    Ok(MergeConfig::new(latest))
}

fn load_latest(source: &LatestSource) -> tm_core::Result<LatestMap> {
    let text = source.load()?;
    let mut sink = TracingSink::default();
    let latest = build_latest_map(&text, &mut sink);
    tracing::info!(
        paths = latest.len(),
        skipped = sink.reported,
        "loaded latest table"
    );
    Ok(latest)
}

fn cmd_merge(
    source: SourceArgs,
    args: Vec<String>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    print_summary: bool,
) -> tm_core::Result<()> {
    let config = resolve_config(source, args)?;
    let input = input.or(config.existing);
    let output = output.or(config.output);

    // A failing generator must stop the run before anything is written
    let latest = load_latest(&config.latest)?;

    let reader: Box<dyn BufRead> = match &input {
        Some(path) => {
            let file = File::open(path).map_err(|e| tm_core::Error::FileRead {
                path: path.clone(),
                source: e,
            })?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };

    let mut sink = TracingSink::default();
    let summary = match &output {
        Some(path) => {
            // Write next to the target and rename, so the input may be the output
            let tmp_path = temp_path_for(path);
            let writer = BufWriter::new(File::create(&tmp_path)?);
            let summary = merge_lines(reader, writer, &latest, &mut sink)?;
            fs::rename(&tmp_path, path)?;
            summary
        }
        None => {
            let writer = BufWriter::new(io::stdout().lock());
            merge_lines(reader, writer, &latest, &mut sink)?
        }
    };

    report_summary(&summary);
    if print_summary {
        let json = serde_json::to_string_pretty(&summary)?;
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "{}", json)?;
    }

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tm-tmp");
    path.with_file_name(name)
}

fn report_summary(summary: &MergeSummary) {
    tracing::info!(
        lines = summary.lines,
        replaced = summary.replaced,
        up_to_date = summary.up_to_date,
        unmatched = summary.unmatched,
        passthrough = summary.passthrough,
        "merge complete"
    );
    for path in &summary.unvisited {
        tracing::info!(%path, "latest path has no row in the published table");
    }
}

fn cmd_tree(source: SourceArgs, args: Vec<String>, format: &str) -> tm_core::Result<()> {
    let config = resolve_config(source, args)?;
    let latest = load_latest(&config.latest)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match format.to_lowercase().as_str() {
        "text" => {
            for (path, row) in latest.iter() {
                writeln!(out, "{}\t{}", path, row.first())?;
            }
        }
        "json" => {
            let json = serde_json::to_string_pretty(&latest)?;
            writeln!(out, "{}", json)?;
        }
        _ => {
            eprintln!("Unknown format: {}. Supported formats: text, json", format);
            std::process::exit(1);
        }
    }
    out.flush()?;

    Ok(())
}

fn cmd_create_config(output: &PathBuf) -> tm_core::Result<()> {
    let config = MergeConfig::template();
    config.save(output)?;

    println!("Created config file: {}", output.display());
    println!();
    println!("Edit the file to point at your generator and table, then run:");
    println!("  tm-cli merge --config {}", output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_source_is_required() {
        assert!(Cli::try_parse_from(["tm-cli", "merge"]).is_err());
        assert!(Cli::try_parse_from(["tm-cli", "merge", "--latest", "a.md", "--config", "c.json"]).is_err());
        assert!(Cli::try_parse_from(["tm-cli", "merge", "--latest", "a.md"]).is_ok());
    }

    #[test]
    fn test_generator_args() {
        let cli = Cli::try_parse_from([
            "tm-cli", "tree", "--command", "xslt3", "--arg", "-xsl:supported.xsl",
        ])
        .unwrap();
        match cli.command {
            Commands::Tree { source, args, .. } => {
                assert_eq!(source.command.as_deref(), Some("xslt3"));
                assert_eq!(args, ["-xsl:supported.xsl"]);
            }
            _ => panic!("expected tree"),
        }
        assert!(Cli::try_parse_from(["tm-cli", "tree", "--latest", "a.md", "--arg", "x"]).is_err());
    }

    #[test]
    fn test_temp_path_for() {
        assert_eq!(
            temp_path_for(Path::new("doc/supported.md")),
            PathBuf::from("doc/supported.md.tm-tmp")
        );
    }

    #[test]
    fn test_resolve_config_from_flags() {
        let source = SourceArgs {
            latest: Some(PathBuf::from("build/latest.md")),
            command: None,
            config: None,
        };
        let config = resolve_config(source, Vec::new()).unwrap();
        assert_eq!(config.latest, LatestSource::file("build/latest.md"));
        assert_eq!(config.existing, None);
    }
}
