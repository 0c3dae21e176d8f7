//! Reads results out of the simulator log.
//!
//! Only the tail of the log is consulted. Lines carrying the `Summary` or
//! `OUTPUT` markers are kept and each is parsed against a fixed schema that
//! names the token position of every field, so a change in the simulator's
//! output format surfaces as an [`ExtractError`] rather than shifted columns.

use crate::error::ExtractError;
use crate::error::ExtractResult;
use crate::tables::Species;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

/// Number of trailing log lines searched for marker lines.
pub const TAIL_LINES: usize = 80;

/// File the marker lines of the last run are written to.
pub const MARKER_FILE: &str = "temp";

const SUMMARY_MARKER: &str = "Summary";
const OUTPUT_MARKER: &str = "OUTPUT";

/// Label-to-position mapping for one kind of log line.
struct LineSchema<const N: usize> {
  kind: &'static str,
  fields: [(&'static str, usize); N],
}

const IONIZATION: LineSchema<5> = LineSchema {
  kind: "ionization",
  fields: [("lum", 2), ("t_e", 4), ("n_e", 8), ("u", 14), ("xi", 16)],
};

const HEATING: LineSchema<7> = LineSchema {
  kind: "heating",
  fields: [
    ("total", 2),
    ("photo", 4),
    ("ff", 6),
    ("compton", 8),
    ("ind_comp", 10),
    ("lines", 12),
    ("auger", 14),
  ],
};

const COOLING: LineSchema<8> = LineSchema {
  kind: "cooling",
  fields: [
    ("total", 2),
    ("recomb", 4),
    ("ff", 6),
    ("compton", 8),
    ("dr", 10),
    ("di", 12),
    ("adiabatic", 14),
    ("lines", 16),
  ],
};

/// First token index of the ion densities on a species line.
const SPECIES_FIRST_FIELD: usize = 2;

impl<const N: usize> LineSchema<N> {
  fn extract(&self, tokens: &[&str], line: &str) -> ExtractResult<[String; N]> {
    let mut values: [String; N] = std::array::from_fn(|_| String::new());
    for (slot, &(field, index)) in values.iter_mut().zip(self.fields.iter()) {
      *slot = numeric_token(self.kind, field, index, tokens, line)?;
    }
    Ok(values)
  }
}

fn numeric_token(
  kind: &'static str,
  field: &'static str,
  index: usize,
  tokens: &[&str],
  line: &str,
) -> ExtractResult<String> {
  let token = tokens.get(index).ok_or_else(|| ExtractError::MissingField {
    kind,
    field,
    index,
    line: line.to_string(),
  })?;
  if token.parse::<f64>().is_err() {
    return Err(ExtractError::NotNumeric {
      kind,
      field,
      token: token.to_string(),
      line: line.to_string(),
    });
  }
  Ok(token.to_string())
}

/// Luminosity, electron temperature and density, and ionization parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Ionization {
  pub lum: String,
  pub t_e: String,
  pub n_e: String,
  /// Ionization parameter `U`.
  pub u: String,
  pub xi: String,
}

/// Heating rates by mechanism.
#[derive(Debug, Clone, PartialEq)]
pub struct Heating {
  pub total: String,
  pub photo: String,
  pub ff: String,
  pub compton: String,
  pub ind_comp: String,
  pub lines: String,
  pub auger: String,
}

/// Cooling rates by mechanism.
#[derive(Debug, Clone, PartialEq)]
pub struct Cooling {
  pub total: String,
  pub recomb: String,
  pub ff: String,
  pub compton: String,
  pub dr: String,
  pub di: String,
  pub adiabatic: String,
  pub lines: String,
}

/// A recognised marker line. Values keep the simulator's formatting.
#[derive(Debug, Clone, PartialEq)]
pub enum LogRecord {
  Convergence { converged: bool },
  Ionization(Ionization),
  Heating(Heating),
  Cooling(Cooling),
  Species { species: Species, densities: Vec<String> },
}

/// Lines among the last `tail` lines of `log` that carry a marker:
/// all `Summary` lines first, then all `OUTPUT` lines.
pub fn marker_lines(log: &str, tail: usize) -> Vec<&str> {
  let lines: Vec<&str> = log.lines().collect();
  let tail = &lines[lines.len().saturating_sub(tail)..];

  let summary = tail.iter().filter(|l| l.contains(SUMMARY_MARKER));
  let output = tail.iter().filter(|l| l.contains(OUTPUT_MARKER));
  summary.chain(output).copied().collect()
}

/// Reads the simulator log, keeps its marker lines and writes them to
/// [`MARKER_FILE`] in `dir`.
pub fn collect_markers(dir: &Path, log_path: &Path) -> ExtractResult<Vec<String>> {
  let bytes = fs::read(log_path).map_err(|source| ExtractError::ReadLog {
    path: log_path.to_path_buf(),
    source,
  })?;
  let log = String::from_utf8_lossy(&bytes);
  let lines: Vec<String> = marker_lines(&log, TAIL_LINES)
    .into_iter()
    .map(str::to_string)
    .collect();

  let marker_path: PathBuf = dir.join(MARKER_FILE);
  let mut contents = lines.join("\n");
  if !contents.is_empty() {
    contents.push('\n');
  }
  fs::write(&marker_path, contents).map_err(|source| ExtractError::WriteMarkers {
    path: marker_path.clone(),
    source,
  })?;

  tracing::debug!(count = lines.len(), path = %marker_path.display(), "Collected marker lines");
  Ok(lines)
}

/// Parses one marker line. Lines of no interest yield `None`; a marker
/// line without a label token is a `MissingField` error.
pub fn parse_record(line: &str) -> ExtractResult<Option<LogRecord>> {
  let tokens: Vec<&str> = line.split_whitespace().collect();
  let Some(&label) = tokens.get(1) else {
    return Err(ExtractError::MissingField {
      kind: "marker",
      field: "label",
      index: 1,
      line: line.to_string(),
    });
  };

  if tokens[0] == SUMMARY_MARKER && label == "convergence" {
    let converged = tokens.get(2) == Some(&"1");
    return Ok(Some(LogRecord::Convergence { converged }));
  }

  let record = match label {
    "Lum_agn=" => {
      let [lum, t_e, n_e, u, xi] = IONIZATION.extract(&tokens, line)?;
      LogRecord::Ionization(Ionization {
        lum,
        t_e,
        n_e,
        u,
        xi,
      })
    }
    "Absorbed_flux(ergs-1cm-3)" => {
      let [total, photo, ff, compton, ind_comp, lines, auger] = HEATING.extract(&tokens, line)?;
      LogRecord::Heating(Heating {
        total,
        photo,
        ff,
        compton,
        ind_comp,
        lines,
        auger,
      })
    }
    "Wind_cooling(ergs-1cm-3)" => {
      let [total, recomb, ff, compton, dr, di, adiabatic, lines] = COOLING.extract(&tokens, line)?;
      LogRecord::Cooling(Cooling {
        total,
        recomb,
        ff,
        compton,
        dr,
        di,
        adiabatic,
        lines,
      })
    }
    symbol => {
      let Some(species) = Species::from_symbol(symbol) else {
        return Ok(None);
      };
      let densities = (0..species.ion_count())
        .map(|stage| {
          numeric_token(
            "species",
            species.symbol(),
            SPECIES_FIRST_FIELD + stage,
            &tokens,
            line,
          )
        })
        .collect::<ExtractResult<Vec<_>>>()?;
      LogRecord::Species { species, densities }
    }
  };
  Ok(Some(record))
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  const IONIZATION_LINE: &str = "OUTPUT Lum_agn= 1.000000e+25 T_e= 9.876543e+04 N_h= 1.000000e+07 N_e= 1.200000e+07 alpha= -0.900000 IP(sim_2010)= 2.345678e-09 Measured_IP(cloudy)= 3.100000e-05 Measured_Xi= 4.000000e-03 distance= 1.000000e+11";

  #[test]
  fn keeps_summary_lines_before_output_lines() {
    let log = "noise\nOUTPUT H 0.1 0.9\nSummary convergence 1 more\nOUTPUT He 1 0 0\n";

    assert_eq!(
      marker_lines(log, TAIL_LINES),
      vec![
        "Summary convergence 1 more",
        "OUTPUT H 0.1 0.9",
        "OUTPUT He 1 0 0",
      ]
    );
  }

  #[test]
  fn only_searches_the_tail() {
    let mut log = String::from("OUTPUT H 0.5 0.5\n");
    for _ in 0..TAIL_LINES {
      log.push_str("cycle chatter\n");
    }

    assert!(marker_lines(&log, TAIL_LINES).is_empty());
    assert_eq!(marker_lines(&log, TAIL_LINES + 1).len(), 1);
  }

  #[test]
  fn parses_ionization_fields_by_position() {
    let record = parse_record(IONIZATION_LINE).unwrap();

    assert_eq!(
      record,
      Some(LogRecord::Ionization(Ionization {
        lum: "1.000000e+25".into(),
        t_e: "9.876543e+04".into(),
        n_e: "1.200000e+07".into(),
        u: "3.100000e-05".into(),
        xi: "4.000000e-03".into(),
      }))
    );
  }

  #[test]
  fn parses_convergence_flag() {
    assert_eq!(
      parse_record("Summary convergence 1 20 1.0").unwrap(),
      Some(LogRecord::Convergence { converged: true })
    );
    assert_eq!(
      parse_record("Summary convergence 0 20 0.7").unwrap(),
      Some(LogRecord::Convergence { converged: false })
    );
  }

  #[test]
  fn parses_cooling_breakdown() {
    let line = "OUTPUT Wind_cooling(ergs-1cm-3) 20 recomb 1 ff 2 compton 3 DR 4 DI 5 Adiabatic 6 lines 7";

    let Some(LogRecord::Cooling(cool)) = parse_record(line).unwrap() else {
      panic!("expected a cooling record");
    };
    assert_eq!(cool.total, "20");
    assert_eq!(cool.adiabatic, "6");
    assert_eq!(cool.lines, "7");
  }

  #[test]
  fn parses_species_densities() {
    let line = "OUTPUT C 1e-3 2e-1 0.7 0.1 0 0 0 trailing";

    let Some(LogRecord::Species { species, densities }) = parse_record(line).unwrap() else {
      panic!("expected a species record");
    };
    assert_eq!(species, Species::Carbon);
    assert_eq!(densities.len(), 7);
    assert_eq!(densities[0], "1e-3");
  }

  #[test]
  fn short_species_line_is_a_structured_error() {
    let err = parse_record("OUTPUT N 0.1 0.2").unwrap_err();

    assert!(matches!(
      err,
      ExtractError::MissingField {
        kind: "species",
        field: "N",
        index: 4,
        ..
      }
    ));
  }

  #[test]
  fn shifted_heating_line_is_a_structured_error() {
    let line = "OUTPUT Absorbed_flux(ergs-1cm-3) total= 10 photo 1 ff 2 compton 3 ind_comp 4 lines 5 auger 6";

    let err = parse_record(line).unwrap_err();

    assert!(matches!(
      err,
      ExtractError::NotNumeric {
        kind: "heating",
        field: "total",
        ..
      }
    ));
  }

  #[test]
  fn unrelated_lines_are_ignored() {
    assert_eq!(parse_record("OUTPUT Si 0.1 0.2").unwrap(), None);
    assert_eq!(parse_record("Summary timing 12.5").unwrap(), None);
  }

  #[test]
  fn bare_marker_line_is_missing_its_label() {
    for line in ["OUTPUT", "  Summary  "] {
      let err = parse_record(line).unwrap_err();
      assert!(matches!(
        err,
        ExtractError::MissingField {
          kind: "marker",
          field: "label",
          index: 1,
          ..
        }
      ));
    }
  }

  #[test]
  fn collect_markers_writes_the_marker_file() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("output");
    fs::write(&log_path, "start\nSummary convergence 1\nOUTPUT H 0.2 0.8\n").unwrap();

    let lines = collect_markers(dir.path(), &log_path).unwrap();

    assert_eq!(lines.len(), 2);
    assert_eq!(
      fs::read_to_string(dir.path().join(MARKER_FILE)).unwrap(),
      "Summary convergence 1\nOUTPUT H 0.2 0.8\n"
    );
  }

  #[test]
  fn missing_log_is_an_error() {
    let dir = tempdir().unwrap();

    let err = collect_markers(dir.path(), &dir.path().join("output")).unwrap_err();

    assert!(matches!(err, ExtractError::ReadLog { .. }));
  }
}
