use crate::config::RunConfig;
use crate::error::SimulationError;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

/// File the simulator reads its parameters from.
pub const INPUT_FILE: &str = "input.pf";

/// Width keys are padded to before their value.
const KEY_WIDTH: usize = 42;

/// Renders the one-zone shell model for a single sweep point.
pub fn render_input(config: &RunConfig, lum: f64) -> String {
  let entries: Vec<(&str, String)> = vec![
    ("System_type(star,binary,agn,previous)", "agn".into()),
    ("### Parameters for the Central Object", String::new()),
    ("Central_object.mass(msol)", "0.8".into()),
    ("Central_object.radius(cm)", "1e10".into()),
    ("### Parameters for the Disk (if there is one)", String::new()),
    ("Disk.type(none,flat,vertically.extended)", "none".into()),
    ("### Parameters for BL or AGN", String::new()),
    ("BH.radiation(yes,no)", "yes".into()),
    (
      "BH.rad_type_to_make_wind(bb,models,power,cloudy,brems)",
      "cloudy".into(),
    ),
    ("BH.lum(ergs/s)", format!("{:e}", lum)),
    ("BH.power_law_index", config.alpha.to_string()),
    ("BH.geometry_for_pl_source(sphere,lamp_post)", "sphere".into()),
    ("low_energy_break(ev)", "0.136".into()),
    ("high_energy_break(ev)", "20000".into()),
    (
      "### Parameters descibing the various winds or coronae in the system",
      String::new(),
    ),
    ("Wind.radiation(yes,no)", "no".into()),
    ("Wind.number_of_components", "1".into()),
    (
      "Wind.type(SV,star,hydro,corona,kwd,homologous,yso,shell,imported)",
      "shell".into(),
    ),
    (
      "Wind.coord_system(spherical,cylindrical,polar,cyl_var)",
      "spherical".into(),
    ),
    ("Wind.dim.in.x_or_r.direction", "4".into()),
    (
      "### Parameters associated with photon number, cycles,ionization and radiative transfer options",
      String::new(),
    ),
    ("Photons_per_cycle", config.nphot.to_string()),
    ("Ionization_cycles", config.ncycles.to_string()),
    ("Spectrum_cycles", "0".into()),
    (
      "Wind.ionization(on.the.spot,ML93,LTE_tr,LTE_te,fixed,matrix_bb,matrix_pow)",
      "matrix_pow".into(),
    ),
    (
      "Line_transfer(pure_abs,pure_scat,sing_scat,escape_prob,thermal_trapping,macro_atoms,macro_atoms_thermal_trapping)",
      "thermal_trapping".into(),
    ),
    ("Atomic_data", config.atomic.clone()),
    (
      "Surface.reflection.or.absorption(reflect,absorb,thermalized.rerad)",
      "absorb".into(),
    ),
    (
      "Thermal_balance_options(0=everything.on,1=no.adiabatic)",
      "0".into(),
    ),
    ("### Parameters for Domain 0", String::new()),
    ("Shell.wind_mdot(msol/yr)", format!("{:e}", config.wind_mdot())),
    ("Shell.wind.radmin(cm)", "1e11".into()),
    ("Shell.wind.radmax(cm)", "1.00000000001e11".into()),
    ("Shell.wind_v_at_rmin(cm)", "1.00000".into()),
    ("Shell.wind.v_at_rmax(cm)", "1.000010".into()),
    ("Shell.wind.acceleration_exponent", "1".into()),
    ("Wind.t.init", config.t_e.to_string()),
    ("Wind.filling_factor(1=smooth,<1=clumped)", "1".into()),
    (
      "### Parameters for Reverberation Modeling (if needed)",
      String::new(),
    ),
    ("Reverb.type(none,photon,wind,matom)", "none".into()),
    ("### Other parameters", String::new()),
    (
      "Photon_sampling.approach(T_star,cv,yso,AGN,min_max_freq,user_bands,cloudy_test,wide,logarithmic)",
      "cloudy_test".into(),
    ),
    ("Photon_sampling.low_energy_limit(eV)", "0.0001".into()),
    ("Photon_sampling.high_energy_limit(eV)", "100000000".into()),
  ];

  entries
    .iter()
    .map(|(key, value)| {
      if value.is_empty() {
        format!("{}\n", key)
      } else {
        format!("{:<width$} {}\n", key, value, width = KEY_WIDTH)
      }
    })
    .collect()
}

/// Writes the input file for one sweep point into `dir`, replacing any
/// previous one.
pub fn write_input(dir: &Path, config: &RunConfig, lum: f64) -> Result<PathBuf, SimulationError> {
  let path = dir.join(INPUT_FILE);
  fs::write(&path, render_input(config, lum)).map_err(|source| SimulationError::WriteInput {
    path: path.clone(),
    source,
  })?;
  tracing::debug!(path = %path.display(), lum, "Wrote simulation input");
  Ok(path)
}
