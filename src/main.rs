use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use tempdrop::commands;
use tempdrop::telemetry::{LogFormat, init_tracing};

#[derive(Parser)]
#[command(name = "tempdrop")]
#[command(version, about = "Ephemeral file drop server", long_about = None)]
struct Cli {
    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CommonArgs {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to store uploaded files
    #[arg(short, long)]
    dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve uploads and downloads, sweeping expired files in the background
    Serve {
        #[command(flatten)]
        common: CommonArgs,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Delete expired files once and exit
    Sweep {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Commands::Serve { common, port } => {
            let config = commands::load_config(common.config.as_ref(), common.dir, port)?;
            commands::serve::execute(config).await
        },
        Commands::Sweep { common } => {
            let config = commands::load_config(common.config.as_ref(), common.dir, None)?;
            commands::sweep::execute(config).await
        },
    }
}
