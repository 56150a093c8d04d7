mod cli;

use clap::Parser;
use cli::{Cli, Commands, ProcessArgs};
use imgbatch::config::Config;
use imgbatch::observability;
use imgbatch::pipeline;
use std::process::ExitCode;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> ExitCode {
    observability::init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Run aborted");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AnyError> {
    // Validated per command, after CLI overrides; `validate` only needs the input path
    let mut config = Config::load_with(cli.config.as_deref())?;

    match cli.command {
        Commands::Process(args) => {
            apply_overrides(&mut config, args);
            config.validate()?;
            let summary = pipeline::run_batch(&config).await?;
            println!(
                "Output CSV saved as {} ({} of {} images processed)",
                config.output.manifest.display(),
                summary.succeeded,
                summary.images
            );
        }
        Commands::Validate(args) => {
            let input = args.input.unwrap_or(config.input.manifest);
            let rows = pipeline::check_manifest(&input)?;
            println!("{} is valid ({rows} rows)", input.display());
        }
        Commands::ShowConfig => {
            config.validate()?;
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, args: ProcessArgs) {
    if let Some(input) = args.input {
        config.input.manifest = input;
    }
    if let Some(output) = args.output {
        config.output.manifest = output;
    }
    if let Some(dir) = args.output_dir {
        config.output.dir = dir;
    }
    if let Some(quality) = args.quality {
        config.transcode.quality = quality;
    }
    if let Some(addr) = args.status_addr {
        config.status.bind_addr = Some(addr);
    }
}
