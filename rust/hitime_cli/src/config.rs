use crate::cli::ScoreArgs;
use crate::error::CliError;
use hitime::ScoringConfig;
use std::path::Path;

pub fn load_config(path: &Path) -> Result<ScoringConfig, CliError> {
    let file = std::fs::File::open(path)?;
    let config = serde_json::from_reader(std::io::BufReader::new(file))?;
    Ok(config)
}

/// Builds the effective configuration: defaults, then the config file, then
/// command line flags.
pub fn resolve_config(args: &ScoreArgs) -> Result<ScoringConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ScoringConfig::default(),
    };
    apply_overrides(&mut config, args);

    if config.num_threads == 0 {
        return Err(CliError::Config(
            "num_threads must be at least 1".to_string(),
        ));
    }
    Ok(config)
}

fn apply_overrides(config: &mut ScoringConfig, args: &ScoreArgs) {
    if let Some(x) = args.intensity_ratio {
        config.intensity_ratio = x;
    }
    if let Some(x) = args.rt_fwhm {
        config.rt_fwhm_scans = x;
    }
    if let Some(x) = args.rt_sigma_width {
        config.rt_sigma_width = x;
    }
    if let Some(x) = args.ppm {
        config.mz_tolerance_ppm = x;
    }
    if let Some(x) = args.mz_fwhm {
        config.mz_fwhm_ppm = x;
    }
    if let Some(x) = args.mz_sigma_width {
        config.mz_sigma_width = x;
    }
    if let Some(x) = args.mz_delta {
        config.mz_delta = x;
    }
    if let Some(x) = args.min_sample {
        config.min_sample = x;
    }
    if let Some(x) = args.num_threads {
        config.num_threads = x;
    }
    if let Some(x) = args.cache_capacity {
        config.cache_capacity = x;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: ScoreArgs,
    }

    fn parse(cmd: &[&str]) -> ScoreArgs {
        Wrapper::parse_from(cmd).args
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = parse(&[
            "hitime", "in.mzML", "-o", "out.mzML", "-D", "4.0", "-s", "3", "-n", "2",
        ]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.mz_delta, 4.0);
        assert_eq!(config.min_sample, 3.0);
        assert_eq!(config.num_threads, 2);
        assert_eq!(config.rt_fwhm_scans, ScoringConfig::default().rt_fwhm_scans);
    }

    #[test]
    fn test_config_file_then_flags() {
        let dir = std::env::temp_dir().join(format!("hitime_cli_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, r#"{"mz_delta": 3.0, "cache_capacity": 12}"#).unwrap();

        let path_str = path.to_string_lossy().to_string();
        let args = parse(&[
            "hitime", "in.mzML", "-o", "out.mzML", "-c", &path_str, "-D", "5.0",
        ]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.mz_delta, 5.0);
        assert_eq!(config.cache_capacity, 12);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_zero_threads_is_rejected() {
        let args = parse(&["hitime", "in.mzML", "-o", "out.mzML", "-n", "0"]);
        assert!(matches!(resolve_config(&args), Err(CliError::Config(_))));
    }
}
