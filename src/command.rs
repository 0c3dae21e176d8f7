// Copyright 2025 Chisomo Makombo Sakala
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use crate::config::RunConfig;
use std::fmt;
use std::path::PathBuf;

/// Multi-process launcher used when `nprocs` is non-zero.
pub const MPI_LAUNCHER: &str = "mpirun";

/// Root name of the input file the simulator reads (`input.pf`).
pub const INPUT_ROOT: &str = "input";

/// Holds the executable command and arguments for one simulator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimCommand {
  /// The command to execute (e.g., "py83" or "mpirun").
  pub command: PathBuf,

  /// Arguments passed to the command, ending with the input root name.
  pub args: Vec<String>,
}

impl SimCommand {
  /// Builds the simulator invocation, wrapped in `mpirun -n <nprocs>`
  /// unless `nprocs` is zero.
  pub fn from_config(config: &RunConfig) -> Self {
    let opts = config.python_opts.split_whitespace().map(str::to_string);

    if config.nprocs == 0 {
      let args = opts.chain([INPUT_ROOT.to_string()]).collect();
      return SimCommand {
        command: PathBuf::from(&config.python_ver),
        args,
      };
    }

    let args = ["-n".to_string(), config.nprocs.to_string(), config.python_ver.clone()]
      .into_iter()
      .chain(opts)
      .chain([INPUT_ROOT.to_string()])
      .collect();
    SimCommand {
      command: PathBuf::from(MPI_LAUNCHER),
      args,
    }
  }
}

impl fmt::Display for SimCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.command.display())?;
    for arg in &self.args {
      write!(f, " {}", arg)?;
    }
    Ok(())
  }
}
