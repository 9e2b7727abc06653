use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "noscan",
    about = "Survey what pages put inside their noscript tags",
    version,
    long_about = None
)]
pub struct Args {
    /// Benchmark output directory containing benchmark.csv and noscript/
    pub output_dir: PathBuf,

    /// Number of labels to display per category
    #[arg(short, long)]
    pub top: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Number of worker threads
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Only apply the image size/alt heuristic to sources mentioning static or cdn
    #[arg(long)]
    pub strict_images: bool,
}
