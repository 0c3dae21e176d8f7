use crate::error::TableError;
use crate::extract::LogRecord;
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

/// Elements whose ion densities are tabulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Species {
  Hydrogen,
  Helium,
  Carbon,
  Nitrogen,
  Oxygen,
  Iron,
}

impl Species {
  pub const ALL: [Species; 6] = [
    Species::Hydrogen,
    Species::Helium,
    Species::Carbon,
    Species::Nitrogen,
    Species::Oxygen,
    Species::Iron,
  ];

  /// Element symbol as printed by the simulator.
  pub fn symbol(self) -> &'static str {
    match self {
      Species::Hydrogen => "H",
      Species::Helium => "He",
      Species::Carbon => "C",
      Species::Nitrogen => "N",
      Species::Oxygen => "O",
      Species::Iron => "Fe",
    }
  }

  /// Number of ionization stages reported, neutral included.
  pub fn ion_count(self) -> usize {
    match self {
      Species::Hydrogen => 2,
      Species::Helium => 3,
      Species::Carbon => 7,
      Species::Nitrogen => 8,
      Species::Oxygen => 9,
      Species::Iron => 27,
    }
  }

  pub fn from_symbol(symbol: &str) -> Option<Species> {
    Species::ALL.into_iter().find(|s| s.symbol() == symbol)
  }

  fn name(self) -> &'static str {
    match self {
      Species::Hydrogen => "hydrogen",
      Species::Helium => "helium",
      Species::Carbon => "carbon",
      Species::Nitrogen => "nitrogen",
      Species::Oxygen => "oxygen",
      Species::Iron => "iron",
    }
  }
}

/// One output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
  Species(Species),
  Temperature,
  Heat,
  Cool,
}

impl Table {
  pub const ALL: [Table; 9] = [
    Table::Species(Species::Hydrogen),
    Table::Species(Species::Helium),
    Table::Species(Species::Carbon),
    Table::Species(Species::Nitrogen),
    Table::Species(Species::Oxygen),
    Table::Species(Species::Iron),
    Table::Temperature,
    Table::Heat,
    Table::Cool,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Table::Species(species) => species.name(),
      Table::Temperature => "temperature",
      Table::Heat => "heat",
      Table::Cool => "cool",
    }
  }

  /// Column names, space separated.
  pub fn header(self) -> String {
    const LEADING: &str = "U xi T_e";
    match self {
      Table::Species(species) => {
        let mut header = LEADING.to_string();
        for stage in 1..=species.ion_count() {
          header.push_str(&format!(" {}{}", species.symbol(), stage));
        }
        header
      }
      Table::Temperature => format!("{} Lum N_e heat cool convergence", LEADING),
      Table::Heat => format!("{} total photo ff compton ind_comp lines auger", LEADING),
      Table::Cool => format!("{} total recomb ff compton DR DI lines Adiabatic", LEADING),
    }
  }

  /// `py_<name>_<run_name>.dat` inside `dir`.
  pub fn path(self, dir: &Path, run_name: &str) -> PathBuf {
    dir.join(format!("py_{}_{}.dat", self.name(), run_name))
  }

  fn index(self) -> usize {
    match self {
      Table::Species(species) => species as usize,
      Table::Temperature => 6,
      Table::Heat => 7,
      Table::Cool => 8,
    }
  }
}

impl fmt::Display for Table {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

struct TableWriter {
  table: Table,
  out: BufWriter<File>,
  row_open: bool,
}

impl TableWriter {
  fn write(&mut self, text: &str) -> Result<(), TableError> {
    self
      .out
      .write_all(text.as_bytes())
      .map_err(|source| TableError::Write {
        table: self.table.name(),
        source,
      })
  }

  /// Writes the leading columns of a row. A row left open by the previous
  /// point is continued, not terminated.
  fn start_row(&mut self, fields: &[&str]) -> Result<(), TableError> {
    self.row_open = true;
    self.write(&fields.join(" "))
  }

  fn append(&mut self, fields: &[&str]) -> Result<(), TableError> {
    for field in fields {
      self.write(" ")?;
      self.write(field)?;
    }
    Ok(())
  }

  fn end_row(&mut self) -> Result<(), TableError> {
    self.row_open = false;
    self.write("\n")
  }

  fn flush(&mut self) -> Result<(), TableError> {
    self.out.flush().map_err(|source| TableError::Write {
      table: self.table.name(),
      source,
    })
  }
}

/// Per-point state carried between log records.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RowState {
  pub converged: Option<bool>,
  pub ionization_parameter: Option<String>,
}

/// The set of open output tables for one run.
///
/// Buffered contents are flushed when the set is dropped, so an aborted
/// sweep keeps whatever rows it produced.
pub struct TableSet {
  writers: Vec<TableWriter>,
}

impl TableSet {
  /// Creates (truncating) every table in `dir` and writes its header.
  pub fn create(dir: &Path, run_name: &str) -> Result<Self, TableError> {
    let mut writers = Vec::with_capacity(Table::ALL.len());
    for table in Table::ALL {
      let path = table.path(dir, run_name);
      let file = File::create(&path).map_err(|source| TableError::Create {
        path: path.clone(),
        source,
      })?;
      let mut writer = TableWriter {
        table,
        out: BufWriter::new(file),
        row_open: false,
      };
      writer.write(&table.header())?;
      writer.write("\n")?;
      writers.push(writer);
    }
    tracing::debug!(dir = %dir.display(), run_name, "Created output tables");
    Ok(TableSet { writers })
  }

  fn writer(&mut self, table: Table) -> &mut TableWriter {
    &mut self.writers[table.index()]
  }

  /// Writes one parsed log record into the tables it feeds.
  pub fn apply(&mut self, record: &LogRecord, state: &mut RowState) -> Result<(), TableError> {
    match record {
      LogRecord::Convergence { converged } => {
        if *converged {
          tracing::info!("Simulation converged");
        } else {
          tracing::info!("Simulation did not converge");
        }
        state.converged = Some(*converged);
      }
      LogRecord::Ionization(ion) => {
        let leading = [ion.u.as_str(), ion.xi.as_str(), ion.t_e.as_str()];
        for table in Table::ALL {
          self.writer(table).start_row(&leading)?;
        }
        self
          .writer(Table::Temperature)
          .append(&[ion.lum.as_str(), ion.n_e.as_str()])?;
        state.ionization_parameter = Some(ion.u.clone());
      }
      LogRecord::Heating(heat) => {
        let heat_table = self.writer(Table::Heat);
        heat_table.append(&[
          heat.total.as_str(),
          heat.photo.as_str(),
          heat.ff.as_str(),
          heat.compton.as_str(),
          heat.ind_comp.as_str(),
          heat.lines.as_str(),
          heat.auger.as_str(),
        ])?;
        heat_table.end_row()?;
        self.writer(Table::Temperature).append(&[heat.total.as_str()])?;
      }
      LogRecord::Cooling(cool) => {
        let cool_table = self.writer(Table::Cool);
        cool_table.append(&[
          cool.total.as_str(),
          cool.recomb.as_str(),
          cool.ff.as_str(),
          cool.compton.as_str(),
          cool.dr.as_str(),
          cool.di.as_str(),
          cool.lines.as_str(),
          cool.adiabatic.as_str(),
        ])?;
        cool_table.end_row()?;

        let flag = match state.converged {
          Some(true) => "1",
          Some(false) => "0",
          None => {
            tracing::warn!("No convergence summary before the cooling line, recording 0");
            "0"
          }
        };
        let temperature = self.writer(Table::Temperature);
        temperature.append(&[cool.total.as_str(), flag])?;
        temperature.end_row()?;
      }
      LogRecord::Species { species, densities } => {
        let table = self.writer(Table::Species(*species));
        let fields: Vec<&str> = densities.iter().map(String::as_str).collect();
        table.append(&fields)?;
        table.end_row()?;
      }
    }
    Ok(())
  }

  /// Tables whose current row was started but not terminated.
  pub fn open_rows(&self) -> Vec<Table> {
    self
      .writers
      .iter()
      .filter(|w| w.row_open)
      .map(|w| w.table)
      .collect()
  }

  pub fn flush(&mut self) -> Result<(), TableError> {
    for writer in &mut self.writers {
      writer.flush()?;
    }
    Ok(())
  }

  /// Flushes and releases every table.
  pub fn close(mut self) -> Result<(), TableError> {
    self.flush()
  }
}
