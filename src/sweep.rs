use crate::command::SimCommand;
use crate::config::Config;
use crate::error::LumsweepError;
use crate::extract::collect_markers;
use crate::extract::parse_record;
use crate::input::write_input;
use crate::simulation::LOG_FILE;
use crate::simulation::run_simulation;
use crate::tables::RowState;
use crate::tables::TableSet;
use anyhow::Context;
use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::Instrument;

/// Summary of one completed sweep point, printed as a JSON line.
#[derive(Debug, Clone, Serialize)]
pub struct PointSummary {
  pub point: u32,
  pub npoints: u32,
  pub luminosity: f64,
  pub ionization_parameter: Option<String>,
  pub converged: Option<bool>,
  pub elapsed_ms: u64,
}

/// Luminosity of sweep point `index`, ten points per decade starting at
/// `lum_start`.
pub fn luminosity(lum_start: f64, index: u32) -> f64 {
  10f64.powf((f64::from(index) + lum_start.log10() * 10.0) / 10.0)
}

/// Runs every sweep point in turn, stopping at the first failure.
pub async fn run_sweep(config: &Config, dir: &Path, timeout: Duration) -> Result<Vec<PointSummary>> {
  let params = &config.params;
  let npoints = params.npoints;
  let span = tracing::info_span!("run_sweep", run = %config.run_name, npoints);

  async {
    tracing::info!("--- Starting Luminosity Sweep ---");
    let mut tables = TableSet::create(dir, &config.run_name).context("Failed to create output tables")?;
    let sim = SimCommand::from_config(params);
    let log_path = dir.join(LOG_FILE);
    let mut summaries = Vec::with_capacity(npoints as usize);

    for index in 0..npoints {
      let point = index + 1;
      let lum = luminosity(params.lum_start, index);
      let point_span = tracing::info_span!("sweep_point", point);

      let summary = async {
        tracing::info!("Starting cycle {} of {}", point, npoints);
        tracing::info!("Lum= {:e}", lum);

        write_input(dir, params, lum)?;
        let outcome = run_simulation(&sim, dir, &log_path, timeout).await?;

        let mut row = RowState::default();
        for line in collect_markers(dir, &outcome.log_path)? {
          if let Some(record) = parse_record(&line)? {
            tables.apply(&record, &mut row)?;
          }
        }
        tables.flush()?;

        let open = tables.open_rows();
        if !open.is_empty() {
          let names: Vec<String> = open.iter().map(ToString::to_string).collect();
          tracing::warn!(tables = ?names, "Log was missing marker lines, rows left unterminated");
        }

        tracing::info!("Finished cycle {} of {}", point, npoints);
        Ok::<_, LumsweepError>(PointSummary {
          point,
          npoints,
          luminosity: lum,
          ionization_parameter: row.ionization_parameter,
          converged: row.converged,
          elapsed_ms: outcome.elapsed.as_millis() as u64,
        })
      }
      .instrument(point_span)
      .await
      .with_context(|| format!("Sweep point {} of {} (lum {:e}) failed", point, npoints, lum))?;

      println!("{}", serde_json::to_string(&summary)?);
      summaries.push(summary);
    }

    tables.close().context("Failed to close output tables")?;
    tracing::info!("--- Sweep complete ---");
    Ok(summaries)
  }
  .instrument(span)
  .await
}
