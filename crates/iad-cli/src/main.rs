//! `iad`: reads a `.rxt` instrument descriptor, runs the forward or inverse
//! adding-doubling pipeline for each wavelength row, and writes a `.txt`
//! result table next to the input (or to `-o`'s path).

mod rxt;
mod txt;

use clap::Parser;
use iad_core::config::{InverseConfig, SearchMode, WarmStart};
use iad_core::error::{IadError, RunStatus};
use iad_core::sample::{Sample, ForwardOptions};
use iad_inverse::agrid::AGrid;
use iad_inverse::experiment::{invert_with_grid, Experiment, SphereConfig};
use iad_sphere::sphere::{Port, Sphere};
use rxt::{InstrumentHeader, MeasurementRow};
use std::path::PathBuf;
use std::process::ExitCode;
use txt::OutputRow;

/// Command-line arguments, mirroring the historical `iad` flag surface.
#[derive(Debug, Parser)]
#[command(name = "iad", about = "Adding-doubling inverse solver for integrating-sphere measurements")]
struct Args {
    /// Path to the `.rxt` instrument descriptor.
    input: PathBuf,

    /// Output path; defaults to the input path with a `.txt` extension.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Quadrature order (directions per hemisphere), overrides the header.
    #[arg(short = 'q', long = "quadrature")]
    quadrature: Option<u32>,

    /// Verbosity: 0 = warnings only, 1 = info, 2+ = debug.
    #[arg(short = 'V', long = "verbose", default_value_t = 0)]
    verbosity: u8,

    /// Convergence tolerance, overrides the header.
    #[arg(short = 'e', long = "tolerance")]
    tolerance: Option<f64>,

    /// Initial guess / fixed value for albedo.
    #[arg(short = 'a', long = "albedo")]
    a0: Option<f64>,

    /// Initial guess / fixed value for optical thickness.
    #[arg(short = 'b', long = "thickness")]
    b0: Option<f64>,

    /// Initial guess / fixed value for anisotropy.
    #[arg(short = 'g', long = "anisotropy")]
    g0: Option<f64>,

    /// Calibration-standard reflectance, overrides the header.
    #[arg(short = 'r', long = "r-standard")]
    r_standard: Option<f64>,

    /// Sample refractive index, overrides the header.
    #[arg(short = 'n', long = "n-slab")]
    n_slab: Option<f64>,

    /// Force reflection-only fitting (ignore M_T/M_U even if present).
    #[arg(short = 'R', long = "reflection-only")]
    reflection_only: bool,

    /// Exclude the direct specular beam from the reported reflectance.
    #[arg(short = 'X', long = "exclude-direct-beam")]
    exclude_direct_beam: bool,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new().filter_level(level).format_timestamp(None).init();
}

fn sphere_from_header(diameter: f64, sample_port: f64, third_port: f64, detector_port: f64, wall_r: f64, detector_r: f64, sample_r: f64) -> Option<Sphere> {
    if diameter <= 0.0 {
        return None;
    }
    Some(Sphere {
        diameter,
        sample: Port { diameter: sample_port, reflectance: sample_r },
        third: Port { diameter: third_port, reflectance: 0.0 },
        detector: Port { diameter: detector_port, reflectance: detector_r },
        empty: Port { diameter: 0.0, reflectance: 0.0 },
        r_wall: wall_r,
        baffle: false,
    })
}

fn search_mode_for(row: &MeasurementRow, reflection_only: bool) -> Option<SearchMode> {
    if reflection_only {
        return row.m_r.map(|_| SearchMode::A);
    }
    match (row.m_r.is_some(), row.m_t.is_some(), row.m_u.is_some()) {
        (true, true, true) => Some(SearchMode::Abg),
        (true, false, true) => Some(SearchMode::Ag),
        (true, true, false) => Some(SearchMode::Ab),
        (true, false, false) => Some(SearchMode::A),
        _ => None,
    }
}

fn process_row(
    row: &MeasurementRow,
    header: &InstrumentHeader,
    args: &Args,
    reflection: Option<Sphere>,
    transmission: Option<Sphere>,
    grid: Option<&AGrid>,
) -> OutputRow {
    let n_sample = args.n_slab.unwrap_or(header.n_sample);
    let a0 = args.a0.unwrap_or(0.5);
    let b0 = args.b0.unwrap_or(1.0);
    let g0 = args.g0.unwrap_or(0.0);
    let tolerance = args.tolerance.unwrap_or(header.tolerance);

    let sample = Sample {
        a: a0,
        b: b0,
        g: g0,
        d: header.d_sample,
        n_sample,
        n_above: header.n_above,
        n_below: header.n_below,
        nu0: header.nu0,
        n_quad: args.quadrature.unwrap_or(header.n_quad),
    };

    let (m_r, m_t, m_u) = if args.reflection_only {
        (row.m_r, None, None)
    } else {
        (row.m_r, row.m_t, row.m_u)
    };

    let experiment = Experiment {
        sample,
        spheres: SphereConfig {
            reflection,
            transmission,
            r_standard: args.r_standard.unwrap_or(row.r_standard),
            t_standard: row.t_standard,
        },
        includes_direct_beam: !args.exclude_direct_beam,
        m_r,
        m_t,
        m_u,
    };

    let opts = ForwardOptions::default();

    let Some(mode) = search_mode_for(row, args.reflection_only) else {
        return OutputRow {
            wavelength: row.wavelength,
            m_r,
            m_r_fit: None,
            m_t,
            m_t_fit: None,
            m_u,
            m_u_fit: None,
            mu_a: 0.0,
            mu_s_reduced: 0.0,
            g: g0,
            status: RunStatus::Failure(IadError::NonPhysical { detail: "no measurement present for this wavelength".into() }),
        };
    };

    let config = InverseConfig::default().with_search(mode).with_tolerance(tolerance);

    match invert_with_grid(&experiment, config, opts, grid) {
        Ok(result) => {
            let mut fitted_sample = sample;
            fitted_sample.a = result.a;
            fitted_sample.b = result.b;
            fitted_sample.g = result.g;
            let mut fitted_experiment = experiment;
            fitted_experiment.sample = fitted_sample;
            let fit = iad_inverse::experiment::measured_rt(&fitted_experiment, opts).ok();

            let status = if result.converged {
                RunStatus::Success
            } else {
                RunStatus::Warning(vec![format!(
                    "search did not converge after {} iterations (residual {:.3e})",
                    result.iterations, result.residual
                )])
            };

            OutputRow {
                wavelength: row.wavelength,
                m_r,
                m_r_fit: fit.as_ref().and_then(|f| f.m_r),
                m_t,
                m_t_fit: fit.as_ref().and_then(|f| f.m_t),
                m_u,
                m_u_fit: fit.as_ref().and_then(|f| f.m_u),
                mu_a: fitted_sample.mu_a(),
                mu_s_reduced: fitted_sample.mu_s_reduced(),
                g: fitted_sample.g,
                status,
            }
        }
        Err(e) => OutputRow {
            wavelength: row.wavelength,
            m_r,
            m_r_fit: None,
            m_t,
            m_t_fit: None,
            m_u,
            m_u_fit: None,
            mu_a: 0.0,
            mu_s_reduced: 0.0,
            g: g0,
            status: RunStatus::Failure(e),
        },
    }
}

fn run(args: Args) -> Result<(), IadError> {
    init_logging(args.verbosity);
    let file = rxt::parse_rxt(&args.input)?;
    let header = &file.header;

    let reflection = sphere_from_header(
        header.sphere_r_diameter,
        header.sphere_r_sample_port,
        header.sphere_r_third_port,
        header.sphere_r_detector_port,
        header.sphere_r_wall_r,
        header.sphere_r_detector_r,
        header.r_standard,
    );
    let transmission = if args.reflection_only {
        None
    } else {
        sphere_from_header(
            header.sphere_t_diameter,
            header.sphere_t_sample_port,
            header.sphere_t_third_port,
            header.sphere_t_detector_port,
            header.sphere_t_wall_r,
            header.sphere_t_detector_r,
            header.t_standard,
        )
    };

    let any_ab = file.rows.iter().any(|r| search_mode_for(r, args.reflection_only) == Some(SearchMode::Ab));
    let grid = if any_ab {
        let g0 = args.g0.unwrap_or(0.0);
        let n_quad = args.quadrature.unwrap_or(header.n_quad);
        let n_sample = args.n_slab.unwrap_or(header.n_sample);
        log::info!("building AGrid warm-start cache ({n_quad} quad points, g = {g0})");
        AGrid::build(32, 32, 1e-3, 1000.0, g0, n_quad, n_sample, header.n_above, header.n_below, header.nu0).ok()
    } else {
        None
    };

    let rows: Vec<OutputRow> = file
        .rows
        .iter()
        .map(|row| process_row(row, header, &args, reflection, transmission, grid.as_ref()))
        .collect();

    let output_path = args.output.clone().unwrap_or_else(|| args.input.with_extension("txt"));
    txt::write_txt(&output_path, header, &rows)?;

    let failures = rows.iter().filter(|r| matches!(r.status, RunStatus::Failure(_))).count();
    if failures > 0 {
        log::warn!("{failures} of {} wavelengths failed to converge", rows.len());
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("iad: {e}");
            ExitCode::FAILURE
        }
    }
}
