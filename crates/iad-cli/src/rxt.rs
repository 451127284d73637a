//! Parser for the `.rxt` instrument descriptor format: a fixed header of
//! labeled floats (`key value` per line) followed by a tabular block of
//! per-wavelength measurement rows. Lines starting with `#` are comments;
//! blank lines are ignored.

use iad_core::error::IadError;
use std::collections::HashMap;
use std::path::Path;

/// Instrument geometry and defaults parsed from a `.rxt` header.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentHeader {
    /// Beam diameter (mm).
    pub beam_diameter: f64,
    /// Sample physical thickness (mm).
    pub d_sample: f64,
    /// Sample refractive index.
    pub n_sample: f64,
    /// Refractive index of the slide above the sample.
    pub n_above: f64,
    /// Refractive index of the slide below the sample.
    pub n_below: f64,
    /// Reflection sphere diameter, if present (0.0 = no reflection sphere).
    pub sphere_r_diameter: f64,
    /// Reflection sphere sample-port diameter.
    pub sphere_r_sample_port: f64,
    /// Reflection sphere third-port diameter.
    pub sphere_r_third_port: f64,
    /// Reflection sphere detector-port diameter.
    pub sphere_r_detector_port: f64,
    /// Reflection sphere wall reflectance.
    pub sphere_r_wall_r: f64,
    /// Reflection sphere detector reflectance.
    pub sphere_r_detector_r: f64,
    /// Transmission sphere diameter, if present (0.0 = no transmission sphere).
    pub sphere_t_diameter: f64,
    /// Transmission sphere sample-port diameter.
    pub sphere_t_sample_port: f64,
    /// Transmission sphere third-port diameter.
    pub sphere_t_third_port: f64,
    /// Transmission sphere detector-port diameter.
    pub sphere_t_detector_port: f64,
    /// Transmission sphere wall reflectance.
    pub sphere_t_wall_r: f64,
    /// Transmission sphere detector reflectance.
    pub sphere_t_detector_r: f64,
    /// Default calibration-standard reflectance.
    pub r_standard: f64,
    /// Default calibration-standard transmittance.
    pub t_standard: f64,
    /// Cosine of the incident angle.
    pub nu0: f64,
    /// Default quadrature order.
    pub n_quad: u32,
    /// Default inverse-search tolerance.
    pub tolerance: f64,
}

impl Default for InstrumentHeader {
    fn default() -> Self {
        Self {
            beam_diameter: 1.0,
            d_sample: 1.0,
            n_sample: 1.0,
            n_above: 1.0,
            n_below: 1.0,
            sphere_r_diameter: 0.0,
            sphere_r_sample_port: 0.0,
            sphere_r_third_port: 0.0,
            sphere_r_detector_port: 0.0,
            sphere_r_wall_r: 0.0,
            sphere_r_detector_r: 0.0,
            sphere_t_diameter: 0.0,
            sphere_t_sample_port: 0.0,
            sphere_t_third_port: 0.0,
            sphere_t_detector_port: 0.0,
            sphere_t_wall_r: 0.0,
            sphere_t_detector_r: 0.0,
            r_standard: 1.0,
            t_standard: 1.0,
            nu0: 1.0,
            n_quad: 8,
            tolerance: 1e-4,
        }
    }
}

/// A single measured row: wavelength plus the measurement triplet and the
/// calibration standards in effect for that row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementRow {
    /// Wavelength (nm, or whatever unit the instrument reports).
    pub wavelength: f64,
    /// Measured total reflectance, if present (`NA` in the file otherwise).
    pub m_r: Option<f64>,
    /// Measured total transmittance, if present.
    pub m_t: Option<f64>,
    /// Measured unscattered transmittance, if present.
    pub m_u: Option<f64>,
    /// Calibration-standard reflectance for this row.
    pub r_standard: f64,
    /// Calibration-standard transmittance for this row.
    pub t_standard: f64,
}

/// Parsed `.rxt` file: header plus the measurement table.
#[derive(Debug, Clone, PartialEq)]
pub struct RxtFile {
    /// Parsed instrument header.
    pub header: InstrumentHeader,
    /// Per-wavelength measurement rows, in file order.
    pub rows: Vec<MeasurementRow>,
}

fn parse_optional(token: &str) -> Option<f64> {
    if token.eq_ignore_ascii_case("na") {
        None
    } else {
        token.parse::<f64>().ok()
    }
}

/// Parses a `.rxt` file from `path`.
pub fn parse_rxt(path: &Path) -> Result<RxtFile, IadError> {
    let contents = std::fs::read_to_string(path).map_err(|e| IadError::IoError(e.to_string()))?;
    parse_rxt_str(&contents)
}

/// Parses `.rxt` content already read into memory (split out from
/// [`parse_rxt`] so tests don't need a temp file).
pub fn parse_rxt_str(contents: &str) -> Result<RxtFile, IadError> {
    let mut fields: HashMap<String, f64> = HashMap::new();
    let mut rows = Vec::new();
    let mut in_table = false;

    for (line_no, raw_line) in contents.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if !in_table && tokens.len() == 2 && tokens[1].parse::<f64>().is_ok() {
            let value: f64 = tokens[1].parse().unwrap();
            fields.insert(tokens[0].to_ascii_lowercase(), value);
            continue;
        }

        in_table = true;
        if tokens.len() < 6 {
            return Err(IadError::ParseError(format!(
                "line {}: expected 6 columns (wavelength M_R M_T M_U r_std t_std), found {}",
                line_no + 1,
                tokens.len()
            )));
        }

        let wavelength: f64 = tokens[0]
            .parse()
            .map_err(|_| IadError::ParseError(format!("line {}: bad wavelength '{}'", line_no + 1, tokens[0])))?;
        let m_r = parse_optional(tokens[1]);
        let m_t = parse_optional(tokens[2]);
        let m_u = parse_optional(tokens[3]);
        let r_standard: f64 = tokens[4]
            .parse()
            .map_err(|_| IadError::ParseError(format!("line {}: bad r_standard '{}'", line_no + 1, tokens[4])))?;
        let t_standard: f64 = tokens[5]
            .parse()
            .map_err(|_| IadError::ParseError(format!("line {}: bad t_standard '{}'", line_no + 1, tokens[5])))?;

        rows.push(MeasurementRow {
            wavelength,
            m_r,
            m_t,
            m_u,
            r_standard,
            t_standard,
        });
    }

    let get = |key: &str, default: f64| fields.get(key).copied().unwrap_or(default);
    let defaults = InstrumentHeader::default();
    let header = InstrumentHeader {
        beam_diameter: get("beam_diameter", defaults.beam_diameter),
        d_sample: get("d_sample", defaults.d_sample),
        n_sample: get("n_sample", defaults.n_sample),
        n_above: get("n_above", defaults.n_above),
        n_below: get("n_below", defaults.n_below),
        sphere_r_diameter: get("sphere_r_diameter", defaults.sphere_r_diameter),
        sphere_r_sample_port: get("sphere_r_sample_port", defaults.sphere_r_sample_port),
        sphere_r_third_port: get("sphere_r_third_port", defaults.sphere_r_third_port),
        sphere_r_detector_port: get("sphere_r_detector_port", defaults.sphere_r_detector_port),
        sphere_r_wall_r: get("sphere_r_wall_r", defaults.sphere_r_wall_r),
        sphere_r_detector_r: get("sphere_r_detector_r", defaults.sphere_r_detector_r),
        sphere_t_diameter: get("sphere_t_diameter", defaults.sphere_t_diameter),
        sphere_t_sample_port: get("sphere_t_sample_port", defaults.sphere_t_sample_port),
        sphere_t_third_port: get("sphere_t_third_port", defaults.sphere_t_third_port),
        sphere_t_detector_port: get("sphere_t_detector_port", defaults.sphere_t_detector_port),
        sphere_t_wall_r: get("sphere_t_wall_r", defaults.sphere_t_wall_r),
        sphere_t_detector_r: get("sphere_t_detector_r", defaults.sphere_t_detector_r),
        r_standard: get("r_standard", defaults.r_standard),
        t_standard: get("t_standard", defaults.t_standard),
        nu0: get("nu0", defaults.nu0),
        n_quad: get("n_quad", defaults.n_quad as f64) as u32,
        tolerance: get("tolerance", defaults.tolerance),
    };

    Ok(RxtFile { header, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RXT: &str = "\
# example instrument descriptor
beam_diameter 2.0
n_sample 1.4
n_above 1.5
n_below 1.5
n_quad 8
tolerance 1e-4

# wavelength M_R M_T M_U r_std t_std
500 0.30 0.45 0.01 0.98 1.0
600 0.31 NA NA 0.98 1.0
";

    #[test]
    fn parses_header_fields() {
        let file = parse_rxt_str(SAMPLE_RXT).unwrap();
        assert_eq!(file.header.n_sample, 1.4);
        assert_eq!(file.header.n_quad, 8);
        assert_eq!(file.header.tolerance, 1e-4);
    }

    #[test]
    fn parses_measurement_rows_with_missing_values() {
        let file = parse_rxt_str(SAMPLE_RXT).unwrap();
        assert_eq!(file.rows.len(), 2);
        assert_eq!(file.rows[0].m_r, Some(0.30));
        assert_eq!(file.rows[1].m_t, None);
        assert_eq!(file.rows[1].m_u, None);
    }

    #[test]
    fn rejects_short_rows() {
        let bad = "n_sample 1.4\n500 0.3 0.4\n";
        assert!(parse_rxt_str(bad).is_err());
    }
}
