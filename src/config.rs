use crate::error::ConfigError;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

/// Run name used when none is given on the command line.
pub const DEFAULT_RUN_NAME: &str = "PL";

/// Mass-loss rate (msol/yr) that gives a hydrogen density of 1e7 in the shell.
const WIND_MDOT_AT_NH_1E7: f64 = 4.72694719429145e-20;

/// Simulation parameters for one sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
  /// Power-law index of the central source.
  pub alpha: f64,
  /// Number of sweep points, ten per decade of luminosity.
  pub npoints: u32,
  /// Simulator executable.
  pub python_ver: String,
  /// Atomic data set handed to the simulator.
  pub atomic: String,
  /// Extra options for the simulator, whitespace separated.
  pub python_opts: String,
  pub ncycles: u32,
  pub nphot: u64,
  /// Initial electron temperature of the shell.
  pub t_e: f64,
  /// Hydrogen density of the shell.
  pub nh: f64,
  /// Luminosity of the first sweep point (ergs/s).
  pub lum_start: f64,
  /// Processes for `mpirun`; zero runs the simulator directly.
  pub nprocs: u32,
}

impl Default for RunConfig {
  fn default() -> Self {
    Self {
      alpha: -0.9,
      npoints: 101,
      python_ver: "py83".to_string(),
      atomic: "data/standard80".to_string(),
      python_opts: " ".to_string(),
      ncycles: 20,
      nphot: 100_000,
      t_e: 100_000.0,
      nh: 1e7,
      lum_start: 1e25,
      nprocs: 4,
    }
  }
}

/// A parameter file line that did not hold exactly a name and a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
  pub line_no: usize,
  pub line: String,
}

/// Configuration resolved from the command line and the parameter file.
#[derive(Debug)]
pub struct Config {
  pub run_name: String,
  pub params: RunConfig,
  pub param_path: Option<PathBuf>,
}

impl RunConfig {
  /// Shell mass-loss rate giving the configured hydrogen density.
  pub fn wind_mdot(&self) -> f64 {
    WIND_MDOT_AT_NH_1E7 * (self.nh / 1e7)
  }

  /// Applies `name value` pairs on top of the current values.
  ///
  /// Lines without exactly two tokens are skipped and returned. Unknown
  /// names are ignored.
  pub fn apply_params(&mut self, text: &str) -> Result<Vec<MalformedLine>, ConfigError> {
    let mut malformed = Vec::new();

    for (idx, line) in text.lines().enumerate() {
      let line_no = idx + 1;
      let tokens: Vec<&str> = line.split_whitespace().collect();
      let [key, value] = tokens[..] else {
        tracing::warn!(
          line_no,
          ?line,
          "Improperly structured param file - each line should be a param name and value separated by a space"
        );
        malformed.push(MalformedLine {
          line_no,
          line: line.to_string(),
        });
        continue;
      };

      tracing::info!("{} {}", key, value);
      match key {
        "alpha" => self.alpha = parse_float(key, value, line_no)?,
        "nprocs" => self.nprocs = parse_int(key, value, line_no)?,
        "npoints" => self.npoints = parse_int(key, value, line_no)?,
        "t_e" => self.t_e = parse_float(key, value, line_no)?,
        "python_ver" => self.python_ver = value.to_string(),
        "atomic" => self.atomic = value.to_string(),
        "python_opts" => self.python_opts = value.to_string(),
        "ncycles" => self.ncycles = parse_int(key, value, line_no)?,
        "nphot" => self.nphot = parse_int(key, value, line_no)?,
        "nh" => self.nh = parse_float(key, value, line_no)?,
        "lum_start" => self.lum_start = parse_float(key, value, line_no)?,
        _ => tracing::debug!(key, "Ignoring unrecognised parameter"),
      }
    }

    Ok(malformed)
  }
}

fn parse_int<T>(key: &str, value: &str, line_no: usize) -> Result<T, ConfigError>
where
  T: FromStr<Err = std::num::ParseIntError>,
{
  value.parse().map_err(|source| ConfigError::InvalidInteger {
    key: key.to_string(),
    value: value.to_string(),
    line_no,
    source,
  })
}

fn parse_float(key: &str, value: &str, line_no: usize) -> Result<f64, ConfigError> {
  value.parse().map_err(|source| ConfigError::InvalidFloat {
    key: key.to_string(),
    value: value.to_string(),
    line_no,
    source,
  })
}

impl Config {
  /// Resolves the run name and parameters.
  ///
  /// Without a run name the defaults are used as-is. With one,
  /// `<dir>/<run_name>.param` must exist.
  pub fn load(run_name: Option<&str>, dir: &Path) -> Result<Self, ConfigError> {
    let mut params = RunConfig::default();

    let Some(run_name) = run_name else {
      return Ok(Config {
        run_name: DEFAULT_RUN_NAME.to_string(),
        params,
        param_path: None,
      });
    };

    let path = dir.join(format!("{}.param", run_name));
    let text = fs::read_to_string(&path).map_err(|source| ConfigError::ReadParamFile {
      path: path.clone(),
      source,
    })?;

    let malformed = params.apply_params(&text)?;
    if !malformed.is_empty() {
      tracing::warn!(
        count = malformed.len(),
        path = %path.display(),
        "Skipped malformed parameter lines"
      );
    }

    Ok(Config {
      run_name: run_name.to_string(),
      params,
      param_path: Some(path),
    })
  }
}
