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
use anyhow::Result;
use clap::Parser;
use lumsweep::cli::Cli;
use lumsweep::config::Config;
use lumsweep::logging::setup_tracing;
use lumsweep::sweep::run_sweep;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
  let _log_guard = setup_tracing()?;

  let Cli {
    run_name,
    work_dir,
    timeout_secs,
  } = Cli::parse();
  let main_span = tracing::info_span!("lumsweep");
  let _enter = main_span.enter();

  tracing::info!("Loading run configuration...");
  let config = Config::load(run_name.as_deref(), &work_dir)?;
  let params_json = serde_json::to_string(&config.params)?;
  tracing::info!(
    run = %config.run_name,
    param_file = ?config.param_path,
    params = %params_json,
    "Resolved run parameters"
  );

  let summaries = run_sweep(&config, &work_dir, Duration::from_secs(timeout_secs)).await?;

  tracing::info!(
    points = summaries.len(),
    run = %config.run_name,
    "Sweep Complete."
  );

  Ok(())
}
