use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "imgbatch")]
#[command(about = "Download manifest images and re-encode them as JPEG", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $IMGBATCH_CONFIG or config/imgbatch.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process every row of the input manifest
    Process(ProcessArgs),
    /// Validate the input manifest without fetching images
    Validate(ValidateArgs),
    /// Print the effective configuration
    ShowConfig,
}

#[derive(clap::Args, Debug)]
pub struct ProcessArgs {
    /// Input manifest CSV
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Output manifest CSV
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Directory for re-encoded JPEGs
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// JPEG quality (1-95)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=95))]
    pub quality: Option<u8>,

    /// Serve batch progress on this address while running
    #[arg(long)]
    pub status_addr: Option<SocketAddr>,
}

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Input manifest CSV
    #[arg(long)]
    pub input: Option<PathBuf>,
}
