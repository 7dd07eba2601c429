use crate::cli::{
    ScoreArgs,
    WriteTemplateArgs,
};
use crate::config::resolve_config;
use crate::error::CliError;
use crate::processing::ProgressSink;
use hitime::store::{
    MzMLSource,
    MzMLWriter,
    SpectrumSource,
};
use hitime::ScoringConfig;
use tracing::info;

/// Main function for the 'score' subcommand.
pub fn main_score(args: ScoreArgs) -> Result<(), CliError> {
    let config = resolve_config(&args)?;
    info!("Using configuration: {:#?}", config);

    let source = MzMLSource::open(&args.input)?;
    let num_spectra = source.len();
    let writer = MzMLWriter::create(&args.output, num_spectra, args.compress)?;
    let sink = ProgressSink::new(writer, num_spectra);

    let stats = hitime::score_doublets(&config, source, sink)?;
    info!("Run statistics: {}", serde_json::to_string(&stats)?);
    println!(
        "Scored {} spectra from {} into {} in {:?}",
        stats.spectra_scored,
        args.input.display(),
        args.output.display(),
        stats.elapsed
    );
    Ok(())
}

/// Main function for the 'write-template' subcommand.
pub fn main_write_template(args: WriteTemplateArgs) -> Result<(), CliError> {
    let target_dir = args.output_path;
    std::fs::create_dir_all(&target_dir)?;

    let config_path = target_dir.join("hitime_config_template.json");
    let template = serde_json::to_string_pretty(&ScoringConfig::default())?;
    std::fs::write(&config_path, template)?;
    println!("Wrote configuration template to: {}", config_path.display());
    Ok(())
}
