use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Luminosity sweep driver for one-zone photoionization runs")]
pub struct Cli {
  /// Run name. Parameters are read from `<RUN_NAME>.param` and tables are
  /// written as `py_<category>_<RUN_NAME>.dat`. Defaults to `PL` with
  /// built-in parameters.
  pub run_name: Option<String>,

  /// Directory holding the parameter file, where the simulator runs and
  /// all outputs are written.
  #[arg(long, env = "LUMSWEEP_WORK_DIR", default_value = ".")]
  pub work_dir: PathBuf,

  /// Upper bound in seconds on a single simulator invocation.
  #[arg(long, env = "LUMSWEEP_TIMEOUT_SECS", default_value_t = 86_400)]
  pub timeout_secs: u64,
}
