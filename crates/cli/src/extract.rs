use std::path::PathBuf;

use anyhow::{bail, Context};
use apistub_core::config::{self, ExtractorConfig, BOOTCLASSPATH_VAR};
use apistub_core::Extractor;
use clap::Args;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Input containers, highest precedence first
    #[arg(value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Read the inputs from the BOOTCLASSPATH environment variable
    #[arg(long, conflicts_with = "inputs")]
    pub bootclasspath: bool,

    /// Destination archive
    #[arg(short, long, value_name = "OUTPUT", default_value = "android.jar")]
    pub output: PathBuf,

    /// JSON configuration file; flags below override its values
    #[arg(short, long, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Do not add the throwing static initializer to stub classes
    #[arg(long)]
    pub no_stub_initializer: bool,

    /// Do not annotate members with their hidden-API restrictions
    #[arg(long)]
    pub no_hidden_api: bool,

    /// Do not copy resource entries into the archive
    #[arg(long)]
    pub no_resources: bool,

    /// Archive the resource entries are copied from
    #[arg(long, value_name = "PATH")]
    pub resource_archive: Option<PathBuf>,
}

impl ExtractArgs {
    pub fn extractor_config(&self) -> anyhow::Result<ExtractorConfig> {
        let mut config = match &self.config {
            Some(path) => ExtractorConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ExtractorConfig::default(),
        };
        if self.no_stub_initializer {
            config.stub_initializer = false;
        }
        if self.no_hidden_api {
            config.hidden_api_annotations = false;
        }
        if self.no_resources {
            config.append_resource_blocks = false;
            config.append_resource_files = false;
        }
        if let Some(resource_archive) = &self.resource_archive {
            config.resource_archive = resource_archive.clone();
        }
        Ok(config)
    }

    /// Positional inputs, or the boot class path when asked for.
    pub fn resolve_inputs(&self, bootclasspath: Option<Vec<PathBuf>>) -> anyhow::Result<Vec<PathBuf>> {
        let inputs = if self.bootclasspath {
            match bootclasspath {
                Some(inputs) => inputs,
                None => bail!("{} is not set", BOOTCLASSPATH_VAR),
            }
        } else {
            self.inputs.clone()
        };
        if inputs.is_empty() {
            bail!("No input containers given");
        }
        Ok(inputs)
    }
}

pub fn run(args: ExtractArgs) -> anyhow::Result<()> {
    let config = args.extractor_config()?;
    let inputs = args.resolve_inputs(config::bootclasspath_from_env())?;

    info!("Extracting {} inputs to {}", inputs.len(), args.output.display());
    let summary = Extractor::new(config)
        .run(&inputs, &args.output)
        .with_context(|| format!("Failed to extract {}", args.output.display()))?;

    println!("Extraction complete!");
    println!("Classes:       {}", summary.classes);
    println!("Stubs:         {}", summary.package.stubs);
    println!("Skeletons:     {}", summary.package.skeletons);
    println!("Resources:     {}", summary.package.resources);
    println!("Entries:       {}", summary.package.entries());
    println!("Output:        {}", args.output.display());
    Ok(())
}
