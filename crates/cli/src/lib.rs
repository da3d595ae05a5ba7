mod extract;
mod inspect;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use extract::ExtractArgs;

#[derive(Parser)]
#[command(
    name = "apistub",
    version,
    about = "Builds a compile-only stub class archive from dex platform images",
    long_about = "apistub reads the dex images of a platform (standalone .dex files or jar/apk \
                  containers), keeps the accessible API surface plus the inaccessible types it \
                  references, and writes them as stub class files whose bodies only return zero \
                  values. The result can be put on a compiler classpath in place of the platform."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract a stub class archive from dex containers
    #[command(
        long_about = "Merges the given containers (earlier inputs win on duplicate class names), \
                      transforms the public surface into stubs and writes the archive. Inputs \
                      may also come from the BOOTCLASSPATH environment variable."
    )]
    Extract(ExtractArgs),
    /// List the dex images of a container and their class counts
    Inspect {
        /// Path to a .dex file or a jar/apk/zip container
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,
    },
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let component = match &cli.command {
        Commands::Extract(_) => "extract",
        Commands::Inspect { .. } => "inspect",
    };
    let _guard = apistub_core::logging::init_logging(component, true);

    match cli.command {
        Commands::Extract(args) => extract::run(args),
        Commands::Inspect { archive } => inspect::run(&archive),
    }
}
