use clap::{
    Parser,
    Subcommand,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score every point of an mzML file for isotope doublet evidence.
    Score(ScoreArgs),
    /// Write a template configuration file.
    WriteTemplate(WriteTemplateArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ScoreArgs {
    /// The mzML file to score.
    pub input: PathBuf,

    /// Where to write the scored mzML file.
    #[arg(short, long)]
    pub output: PathBuf,

    /// JSON configuration file, command line values take precedence.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Expected isotope / natural intensity ratio.
    #[arg(short = 'i', long)]
    pub intensity_ratio: Option<f64>,

    /// Retention time FWHM, in scans.
    #[arg(short = 'r', long)]
    pub rt_fwhm: Option<f64>,

    /// Retention time window half width, in standard deviations.
    #[arg(short = 'R', long)]
    pub rt_sigma_width: Option<f64>,

    /// m/z tolerance, in ppm.
    #[arg(short = 'p', long)]
    pub ppm: Option<f64>,

    /// m/z FWHM, in ppm.
    #[arg(short = 'm', long)]
    pub mz_fwhm: Option<f64>,

    /// m/z region half width, in standard deviations.
    #[arg(short = 'M', long)]
    pub mz_sigma_width: Option<f64>,

    /// m/z difference between the natural and the isotope peak.
    #[arg(short = 'D', long)]
    pub mz_delta: Option<f64>,

    /// Minimum number of data points required in each sample region.
    #[arg(short = 's', long)]
    pub min_sample: Option<f64>,

    /// Number of worker threads (defaults to the available parallelism).
    #[arg(short = 'n', long)]
    pub num_threads: Option<usize>,

    /// Number of spectra kept in the input cache.
    #[arg(long)]
    pub cache_capacity: Option<usize>,

    /// Zlib compress the binary arrays of the output.
    #[arg(long)]
    pub compress: bool,
}

#[derive(Parser, Debug)]
pub struct WriteTemplateArgs {
    /// The path to the output directory.
    #[arg(short, long)]
    pub output_path: PathBuf,
}
