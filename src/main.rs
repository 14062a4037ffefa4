use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dlltree::core::{Category, DirectoryAnalyzer, DllName, LibraryClassifier};
use dlltree::formatters::{
    BucketFormatter, JsonCompactFormatter, TreeFormatter, DEFAULT_ADAPTER_PATTERN,
};
use dlltree::reference::{self, sdk, ReferenceCache, DEFAULT_RUNTIME_VERSION};
use dlltree::tools::Dumpbin;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "dlltree",
    version,
    about = "Generate a DLL dependency report for a directory"
)]
struct Cli {
    /// Directory containing the DLLs and EXEs to analyze
    #[arg(value_name = "DIRECTORY")]
    directory: PathBuf,

    /// Do not list Windows system DLLs as dependencies
    #[arg(long)]
    hide_system: bool,

    /// Do not list Visual C++ runtime DLLs as dependencies
    #[arg(long, alias = "hide-vc140")]
    hide_runtime: bool,

    /// Group roots by the Micro-Manager device adapter convention (text only)
    #[arg(long, conflicts_with = "format")]
    mmreport: bool,

    /// Regex matching device adapter file names (with --mmreport)
    #[arg(long, value_name = "REGEX", default_value = DEFAULT_ADAPTER_PATTERN)]
    adapter_pattern: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Tree)]
    format: OutputFormat,

    /// Write the report to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Comma-separated file extensions to analyze
    #[arg(long, value_name = "EXTS", value_delimiter = ',', default_value = "dll,exe")]
    extensions: Vec<String>,

    /// Visual C++ runtime version whose DLLs are classified as compiler runtime
    #[arg(long, value_name = "VERSION", default_value_t = DEFAULT_RUNTIME_VERSION)]
    vc_version: u32,

    /// Path to dumpbin.exe (skips Visual Studio environment discovery)
    #[arg(long, value_name = "PATH")]
    dumpbin: Option<PathBuf>,

    /// Script printing the developer environment as NAME=VALUE lines
    #[arg(long, value_name = "PATH")]
    vsenv: Option<PathBuf>,

    /// File listing system DLL names, one per line (skips the Windows SDK scan)
    #[arg(long, value_name = "FILE")]
    system_dlls: Option<PathBuf>,

    /// Do not read or write the system DLL cache
    #[arg(long)]
    no_cache: bool,

    /// Number of parallel dumpbin workers (default: one per CPU)
    #[arg(short, long, value_name = "N", default_value_t = 0)]
    jobs: usize,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum OutputFormat {
    Tree,
    JsonCompact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dlltree={level}")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let start_time = Instant::now();

    let mut dumpbin = Dumpbin::new();
    if let Some(exe) = &cli.dumpbin {
        dumpbin = dumpbin.with_executable(exe);
    }
    if let Some(script) = &cli.vsenv {
        dumpbin = dumpbin.with_setup_script(script);
    }

    let classifier = build_classifier(&cli, &dumpbin)?;
    info!(
        "Reference data: {} system DLLs, {} runtime DLLs",
        classifier.system_count(),
        classifier.runtime_count()
    );

    let extensions: Vec<&str> = cli
        .extensions
        .iter()
        .map(|ext| ext.trim())
        .filter(|ext| !ext.is_empty())
        .collect();

    let forest = DirectoryAnalyzer::new(&dumpbin, &classifier)
        .with_threads(cli.jobs)
        .analyze(&cli.directory, &extensions)
        .with_context(|| format!("failed to analyze {}", cli.directory.display()))?;
    info!(
        "Analyzed {} files ({} roots) in {:.2}s",
        forest.bundled_count(),
        forest.root_count(),
        start_time.elapsed().as_secs_f64()
    );

    let mut hidden = Vec::new();
    if cli.hide_system {
        hidden.push(Category::System);
    }
    if cli.hide_runtime {
        hidden.push(Category::CompilerRuntime);
    }
    let tree = TreeFormatter::new().with_hidden(hidden);

    let report = match cli.format {
        OutputFormat::JsonCompact => JsonCompactFormatter::new().format_forest(&forest)?,
        OutputFormat::Tree if cli.mmreport => BucketFormatter::new(&cli.adapter_pattern)?
            .with_tree_formatter(tree)
            .format_forest(&forest)?,
        OutputFormat::Tree => tree.format_forest(&forest)?,
    };

    match &cli.output {
        Some(path) => std::fs::write(path, report + "\n")
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{report}"),
    }

    Ok(())
}

fn build_classifier(cli: &Cli, dumpbin: &Dumpbin) -> Result<LibraryClassifier> {
    let runtime = reference::runtime_libraries(cli.vc_version)?;

    let system: Vec<DllName> = match &cli.system_dlls {
        Some(list) => reference::read_library_list(list)?,
        None => {
            let sdk_libs = sdk::latest_windows_sdk_libs("10")?;
            let cache = if cli.no_cache {
                ReferenceCache::disabled()
            } else {
                ReferenceCache::new(None)
            };
            reference::cached_system_libraries(dumpbin, &sdk_libs, &cache, cli.jobs)
                .context("failed to collect system DLL names from the Windows SDK")?
                .into_iter()
                .collect()
        }
    };

    Ok(LibraryClassifier::new(system, runtime.iter().copied()))
}
