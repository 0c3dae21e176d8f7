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

//! # Lumsweep
//!
//! `lumsweep` drives a one-zone ("shell") photoionization simulator across a
//! range of source luminosities, ten points per decade, and collects the ion
//! densities, temperature, heating and cooling rates it reports into plain
//! text tables.
//!
//! This crate contains the library logic for the `lumsweep` CLI, but its
//! core modules (`config`, `input`, `simulation`, `extract`, `tables`) could be
//! used independently.
//!
//! ## Core Modules
//!
//! * [`config`]: Built-in run parameters and the `<run-name>.param` overrides.
//! * [`input`]: Renders the simulator's `input.pf` for one sweep point.
//! * [`command`]: Builds the simulator command line, optionally under `mpirun`.
//! * [`simulation`]: Runs the simulator with a timeout, capturing its log.
//! * [`extract`]: Pulls marker lines from the log tail and parses them.
//! * [`tables`]: Owns the output tables and assembles their rows.
//! * [`sweep`]: The `run_sweep` loop tying the above together.
//! * [`cli`]: Defines the `clap`-based command-line interface.
//! * [`error`]: Defines the custom error types for the library.
//! * [`logging`]: Provides the `setup_tracing` utility.

pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod extract;
pub mod input;
pub mod logging;
pub mod simulation;
pub mod sweep;
pub mod tables;
