/// Steiger's Z test for two correlations that share a variable.
///
/// Tests whether `r_full` (data vs the doublet model) is larger than `r_alt`
/// (data vs an alternative model), given `r_models`, the correlation between
/// the two models themselves, over `num_samples` points.
///
/// Positive values favour the doublet model. Inputs are expected to be
/// already clamped (see [`super::correlation::clamp_correlation`]); the
/// result may still be NaN for degenerate inputs such as `num_samples < 3`.
pub fn steiger_z(r_full: f64, r_alt: f64, r_models: f64, num_samples: usize) -> f64 {
    let rm2 = 0.5 * (r_full * r_full + r_alt * r_alt);
    let f = (1.0 - r_alt) / (2.0 * (1.0 - rm2));
    let h = (1.0 - f * rm2) / (1.0 - rm2);
    let scale = (num_samples as f64 - 3.0).sqrt();

    (r_full.atanh() - r_alt.atanh()) * scale / (2.0 * (1.0 - r_models) * h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_correlations_give_zero() {
        let z = steiger_z(0.6, 0.6, 0.3, 30);
        assert!(z.abs() < 1e-12);
    }

    #[test]
    fn test_sign_follows_the_better_model() {
        assert!(steiger_z(0.9, 0.4, 0.5, 30) > 0.0);
        assert!(steiger_z(0.4, 0.9, 0.5, 30) < 0.0);
    }

    #[test]
    fn test_grows_with_sample_count() {
        let small = steiger_z(0.9, 0.5, 0.5, 10);
        let large = steiger_z(0.9, 0.5, 0.5, 100);
        assert!(large > small);
        // Both scale with sqrt(n - 3).
        assert!((large / small - (97.0f64 / 7.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_known_value() {
        let (r_full, r_alt, r_models, n) = (0.8, 0.5, 0.4, 23);
        let rm2 = 0.5 * (0.64 + 0.25);
        let f = 0.5 / (2.0 * (1.0 - rm2));
        let h = (1.0 - f * rm2) / (1.0 - rm2);
        let expected = (0.8f64.atanh() - 0.5f64.atanh()) * 20f64.sqrt() / (2.0 * 0.6 * h);
        assert!((steiger_z(r_full, r_alt, r_models, n) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_samples_is_nan() {
        assert!(steiger_z(0.9, 0.5, 0.5, 2).is_nan());
    }
}
