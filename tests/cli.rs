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
#![cfg(unix)]

use assert_cmd::cargo;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

use serde_json::Value;

const TABLES: [&str; 9] = [
  "hydrogen",
  "helium",
  "carbon",
  "nitrogen",
  "oxygen",
  "iron",
  "temperature",
  "heat",
  "cool",
];

const CONVERGENCE: &str = r#"echo "Summary convergence 1 20""#;
const IONIZATION: &str = r#"echo "OUTPUT Lum_agn= $lum T_e= 9.8e4 N_h= 1e6 N_e= 1.2e6 alpha= -0.9 IP(sim_2010)= 2e-9 Measured_IP(cloudy)= 3e-5 Measured_Xi= 4e-3""#;
const HEATING: &str = r#"echo "OUTPUT Absorbed_flux(ergs-1cm-3) 10 photo 1 ff 2 compton 3 ind_comp 4 lines 5 auger 6""#;
const COOLING: &str = r#"echo "OUTPUT Wind_cooling(ergs-1cm-3) 20 recomb 1 ff 2 compton 3 DR 4 DI 5 Adiabatic 6 lines 7""#;
const SPECIES: &str = r#"echo "OUTPUT H 0.1 0.9"
echo "OUTPUT He 0.1 0.2 0.7"
echo "OUTPUT C 0 0 0.1 0.2 0.3 0.4 0"
echo "OUTPUT N 0 0 0.1 0.2 0.3 0.4 0 0"
echo "OUTPUT O 0 0 0.1 0.2 0.3 0.4 0 0 0"
echo "OUTPUT Fe 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 1""#;

/// Writes a stand-in simulator that reads the luminosity from `input.pf`,
/// records the call and prints the given log lines after some chatter.
fn fake_simulator(dir: &Path, lines: &[&str]) {
  let mut script = String::from(
    r#"lum=$(awk '$1 == "BH.lum(ergs/s)" { print $2 }' input.pf)
echo "$lum $1" >> calls.txt
i=0
while [ $i -lt 100 ]; do echo "ionization cycle $i"; i=$((i+1)); done
"#,
  );
  for line in lines {
    script.push_str(line);
    script.push('\n');
  }
  fs::write(dir.join("fake_sim.sh"), script).unwrap();
}

fn param_file(dir: &Path, run_name: &str, npoints: u32) {
  let script = dir.join("fake_sim.sh");
  let params = format!(
    "npoints {}\nnh 1e6\nnprocs 0\npython_ver sh\npython_opts {}\n",
    npoints,
    script.display()
  );
  fs::write(dir.join(format!("{}.param", run_name)), params).unwrap();
}

fn table(dir: &Path, name: &str, run_name: &str) -> String {
  fs::read_to_string(dir.join(format!("py_{}_{}.dat", name, run_name))).unwrap()
}

fn lumsweep(dir: &Path) -> Command {
  let mut cmd = Command::new(cargo::cargo_bin!("lumsweep"));
  cmd
    .arg("--work-dir")
    .arg(dir)
    .env("CLICOLOR", "0")
    .env("NO_COLOR", "1")
    .env_remove("LUMSWEEP_LOG_FILE");
  cmd
}

#[test]
fn test_full_sweep_fills_every_table() {
  let temp = tempdir().unwrap();
  let dir = temp.path();
  fake_simulator(dir, &[CONVERGENCE, IONIZATION, HEATING, COOLING, SPECIES]);
  param_file(dir, "e2e", 3);

  let output = lumsweep(dir).arg("e2e").assert().success().get_output().clone();

  let calls = fs::read_to_string(dir.join("calls.txt")).unwrap();
  assert_eq!(calls.lines().count(), 3);
  assert!(calls.lines().all(|l| l.ends_with(" input")));
  assert!(calls.starts_with("1e25 "));

  for name in TABLES {
    let text = table(dir, name, "e2e");
    assert_eq!(text.lines().count(), 4, "table {}", name);
    assert!(text.ends_with('\n'), "table {}", name);
  }

  let iron = table(dir, "iron", "e2e");
  let iron_row = iron.lines().nth(1).unwrap();
  assert_eq!(iron_row.split(' ').count(), 30);
  assert!(iron.starts_with("U xi T_e Fe1 Fe2"));

  let temperature = table(dir, "temperature", "e2e");
  assert_eq!(
    temperature.lines().nth(1),
    Some("3e-5 4e-3 9.8e4 1e25 1.2e6 10 20 1")
  );

  let input = fs::read_to_string(dir.join("input.pf")).unwrap();
  let mdot: f64 = input
    .lines()
    .find_map(|l| l.strip_prefix("Shell.wind_mdot(msol/yr)"))
    .unwrap()
    .trim()
    .parse()
    .unwrap();
  assert!((mdot / 4.72694719429145e-21 - 1.0).abs() < 1e-9);
  assert!(dir.join("temp").exists());

  let stdout = String::from_utf8(output.stdout).unwrap();
  let points: Vec<Value> = stdout
    .lines()
    .map(|l| serde_json::from_str(l).unwrap())
    .collect();
  assert_eq!(points.len(), 3);
  assert_eq!(points[2]["point"], 3);
  assert_eq!(points[0]["converged"], true);
  assert_eq!(points[0]["ionization_parameter"], "3e-5");
}

#[test]
fn test_missing_cooling_line_leaves_row_open() {
  let temp = tempdir().unwrap();
  let dir = temp.path();
  fake_simulator(dir, &[CONVERGENCE, IONIZATION, HEATING, SPECIES]);
  param_file(dir, "nocool", 1);

  lumsweep(dir)
    .arg("nocool")
    .assert()
    .success()
    .stderr(predicate::str::contains("rows left unterminated"));

  let temperature = table(dir, "temperature", "nocool");
  assert!(temperature.ends_with("1e25 1.2e6 10"));
  assert_eq!(table(dir, "heat", "nocool").lines().count(), 2);
}

#[test]
fn test_simulator_failure_aborts_sweep() {
  let temp = tempdir().unwrap();
  let dir = temp.path();
  fake_simulator(dir, &["exit 3"]);
  param_file(dir, "broken", 5);

  lumsweep(dir)
    .arg("broken")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Simulator exited with status"));

  let calls = fs::read_to_string(dir.join("calls.txt")).unwrap();
  assert_eq!(calls.lines().count(), 1);
  assert_eq!(
    table(dir, "hydrogen", "broken"),
    "U xi T_e H1 H2\n"
  );
}

#[test]
fn test_missing_param_file_is_fatal() {
  let temp = tempdir().unwrap();

  lumsweep(temp.path())
    .arg("absent")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to read parameter file"));

  assert!(!temp.path().join("py_hydrogen_absent.dat").exists());
}

#[test]
fn test_hung_simulator_times_out() {
  let temp = tempdir().unwrap();
  let dir = temp.path();
  fake_simulator(dir, &["exec sleep 30"]);
  param_file(dir, "slow", 2);

  lumsweep(dir)
    .arg("slow")
    .arg("--timeout-secs")
    .arg("1")
    .assert()
    .failure()
    .stderr(predicate::str::contains("timed out"));
}

#[test]
fn test_malformed_log_line_is_reported() {
  let temp = tempdir().unwrap();
  let dir = temp.path();
  fake_simulator(dir, &[CONVERGENCE, IONIZATION, r#"echo "OUTPUT O 0.1 0.2""#]);
  param_file(dir, "drift", 1);

  lumsweep(dir)
    .arg("drift")
    .assert()
    .failure()
    .stderr(predicate::str::contains("species line has no field 'O'"));
}
