use clap::Parser;
use distpack::config::{archive_options, host_config, merge_configs, read_config_file, read_env};
use distpack::{ArchiveFormat, ArchivePlugin};
use distpack_lib::Config;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Archive a build output directory into a zip or tar file", long_about = None)]
pub struct Cli {
    /// Build output directory, relative to --root (default: dist)
    #[arg()]
    pub out_dir: Option<String>,

    /// Project root the output directory is resolved against
    #[arg(short, long)]
    pub root: Option<String>,

    /// Directory to archive (default: the resolved output directory)
    #[arg(short, long)]
    pub source_dir: Option<String>,

    /// Archive path (default: <out_dir name>.zip)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Archive format [zip|tar]
    #[arg(short, long)]
    pub format: Option<ArchiveFormat>,

    /// Compression level 0-9 (default: 9)
    #[arg(short, long)]
    pub level: Option<u32>,

    /// Gzip the tar stream
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub gzip: bool,

    /// Print progress while archiving
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    pub progress: bool,

    /// Print the merged configuration as YAML and exit
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub print_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Step 1: Read environment
    let env_config = read_env()?;

    // Step 2: Read config file (if exists)
    let mut file_config = Config::default();
    if let Some(path) = cli.config.clone().or(env_config.config.clone()) {
        file_config = read_config_file(&path)?;
    }

    // Step 3: Merge configs: env < file < CLI
    let merged = merge_configs(env_config, file_config, cli_to_config(&cli));
    tracing::debug!("merged config: {merged:?}");

    if cli.print_config {
        print!("{}", serde_yaml::to_string(&merged)?);
        return Ok(());
    }

    let mut options = archive_options(&merged);
    if merged.progress.unwrap_or(false) {
        options = options.on_progress(|snapshot| {
            eprintln!(
                "progress: {}% ({}/{} entries)",
                snapshot.percent, snapshot.data.entries.processed, snapshot.data.entries.total
            );
        });
    }

    let mut plugin = ArchivePlugin::new(options);
    plugin.config_resolved(&host_config(&merged));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all() // Enables both IO and time drivers
        .build()?;
    runtime.block_on(plugin.close_bundle())?;

    Ok(())
}

fn init_tracing(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Converts CLI struct into Config
fn cli_to_config(cli: &Cli) -> Config {
    Config {
        root: cli.root.clone(),
        out_dir: cli.out_dir.clone(),
        source_dir: cli.source_dir.clone(),
        output: cli.output.clone(),
        config: cli.config.clone(),
        format: cli.format,
        level: cli.level,
        // Flags only override lower layers when set.
        gzip: cli.gzip.then_some(true),
        progress: cli.progress.then_some(true),
    }
}
