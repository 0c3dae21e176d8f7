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
use std::path::PathBuf;
use thiserror::Error;

/// Error for a single sweep point. Configuration errors surface before the
/// sweep starts and reach `main` as `ConfigError` directly.
#[derive(Error, Debug)]
pub enum LumsweepError {
  #[error("Output table error")]
  Table(#[from] TableError),

  #[error("Simulation run failed")]
  Simulation(#[from] SimulationError),

  #[error("Failed to extract results from the simulation log")]
  Extract(#[from] ExtractError),
}

/// Errors related to loading the run configuration (src/config.rs).
#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Failed to read parameter file: {path}")]
  ReadParamFile {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Invalid integer for '{key}' on line {line_no}: '{value}'")]
  InvalidInteger {
    key: String,
    value: String,
    line_no: usize,
    #[source]
    source: std::num::ParseIntError,
  },

  #[error("Invalid number for '{key}' on line {line_no}: '{value}'")]
  InvalidFloat {
    key: String,
    value: String,
    line_no: usize,
    #[source]
    source: std::num::ParseFloatError,
  },
}

/// Errors related to the output tables (src/tables.rs).
#[derive(Error, Debug)]
pub enum TableError {
  #[error("Failed to create table file: {path}")]
  Create {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to write to the {table} table")]
  Write {
    table: &'static str,
    #[source]
    source: std::io::Error,
  },
}

/// Errors related to invoking the simulator (src/simulation.rs).
#[derive(Error, Debug)]
pub enum SimulationError {
  #[error("Failed to write simulation input file: {path}")]
  WriteInput {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to open simulation log for writing: {path}")]
  OpenLog {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to spawn simulator: {command}")]
  Spawn {
    command: String,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to take simulator stderr pipe")]
  PipeStderr,

  #[error("Failed to wait for simulator process")]
  Wait(#[source] std::io::Error),

  #[error("Failed to read simulator stderr")]
  ReadStderr(#[source] std::io::Error),

  #[error("Simulator stderr task failed")]
  StderrTask(#[source] tokio::task::JoinError),

  #[error("Simulator exited with status {code:?}: {command}")]
  NonZeroExit { command: String, code: Option<i32> },

  #[error("Simulator timed out after {secs}s: {command}")]
  Timeout { command: String, secs: u64 },
}

/// Errors related to reading results out of the simulation log (src/extract.rs).
#[derive(Error, Debug)]
pub enum ExtractError {
  #[error("Failed to read simulation log: {path}")]
  ReadLog {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to write marker lines to {path}")]
  WriteMarkers {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("{kind} line has no field '{field}' at token {index}: {line}")]
  MissingField {
    kind: &'static str,
    field: &'static str,
    index: usize,
    line: String,
  },

  #[error("{kind} line field '{field}' is not numeric ('{token}'): {line}")]
  NotNumeric {
    kind: &'static str,
    field: &'static str,
    token: String,
    line: String,
  },
}

pub type SimulationResult<T> = Result<T, SimulationError>;
pub type ExtractResult<T> = Result<T, ExtractError>;
