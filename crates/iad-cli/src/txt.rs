//! Writer for the `.txt` result table: echoes the `.rxt` header as comments,
//! then one row per wavelength with the measured and fitted values plus the
//! recovered optical properties and a status character.

use crate::rxt::InstrumentHeader;
use iad_core::error::RunStatus;
use std::io::Write;
use std::path::Path;

/// One output row: the measured triplet, the forward-predicted fit at the
/// recovered parameters, the recovered optical properties, and the status
/// of that wavelength's search.
#[derive(Debug, Clone)]
pub struct OutputRow {
    /// Wavelength, copied from the input row.
    pub wavelength: f64,
    /// Measured total reflectance, if present.
    pub m_r: Option<f64>,
    /// Forward-model reflectance at the recovered parameters.
    pub m_r_fit: Option<f64>,
    /// Measured total transmittance, if present.
    pub m_t: Option<f64>,
    /// Forward-model transmittance at the recovered parameters.
    pub m_t_fit: Option<f64>,
    /// Measured unscattered transmittance, if present.
    pub m_u: Option<f64>,
    /// Forward-model unscattered transmittance at the recovered parameters.
    pub m_u_fit: Option<f64>,
    /// Recovered absorption coefficient.
    pub mu_a: f64,
    /// Recovered reduced scattering coefficient.
    pub mu_s_reduced: f64,
    /// Recovered (or fixed) anisotropy.
    pub g: f64,
    /// Outcome of this wavelength's search.
    pub status: RunStatus,
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.5}"),
        None => "NA".to_string(),
    }
}

/// Writes `rows` to `path`, preceded by `header` echoed back as `#`-prefixed
/// comment lines so the `.txt` file is self-describing.
pub fn write_txt(path: &Path, header: &InstrumentHeader, rows: &[OutputRow]) -> Result<(), iad_core::error::IadError> {
    let mut out = String::new();
    out.push_str("# iad result table\n");
    out.push_str(&format!("# n_sample     {}\n", header.n_sample));
    out.push_str(&format!("# n_above      {}\n", header.n_above));
    out.push_str(&format!("# n_below      {}\n", header.n_below));
    out.push_str(&format!("# d_sample     {}\n", header.d_sample));
    out.push_str(&format!("# n_quad       {}\n", header.n_quad));
    out.push_str(&format!("# tolerance    {}\n", header.tolerance));
    out.push_str("#\n");
    out.push_str("# wavelength  M_R      M_R_fit  M_T      M_T_fit  M_U      M_U_fit  mu_a     mu_s'    g        status\n");

    for row in rows {
        out.push_str(&format!(
            "{:<12.2} {:<8} {:<8} {:<8} {:<8} {:<8} {:<8} {:<8.5} {:<8.5} {:<8.5} {}\n",
            row.wavelength,
            fmt_opt(row.m_r),
            fmt_opt(row.m_r_fit),
            fmt_opt(row.m_t),
            fmt_opt(row.m_t_fit),
            fmt_opt(row.m_u),
            fmt_opt(row.m_u_fit),
            row.mu_a,
            row.mu_s_reduced,
            row.g,
            row.status.code(),
        ));
    }

    let mut file = std::fs::File::create(path).map_err(|e| iad_core::error::IadError::IoError(e.to_string()))?;
    file.write_all(out.as_bytes())
        .map_err(|e| iad_core::error::IadError::IoError(e.to_string()))
}
