//! YAML analysis configuration.
//!
//! ```yaml
//! name: gapped loop
//! data_dir: data/gapped-loop
//! frequency_scale: G
//! strategy:
//!   phasor_pair:
//!     antenna_power: 1.0
//!     phase_file: phase.csv
//!     magnitude_file: magnitude.csv
//!     phase_convention: inverted_port
//!     field:
//!       measured:
//!         file: efield.csv
//!         frequency_column: 1
//!         value_column: 2
//! report:
//!   display_impedance: 377.0
//! output:
//!   csv: output/gapped-loop.csv
//! ```
//!
//! `strategy` and `field` are written as a one-key map naming the variant.
//! Unknown keys are rejected at every level. A relative `data_dir` is
//! resolved against the directory of the configuration file. Output paths
//! are taken as given.

use crate::consts::PhysicalConstants;
use crate::report::ReportConfig;
use crate::scale::Scale;
use crate::series::PhaseConvention;
use serde::{Deserialize, Serialize};
use simple_error::bail;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_frequency_scale() -> Scale {
    Scale::Giga
}

fn default_skip_rows() -> usize {
    1
}

fn default_antenna_power() -> f64 {
    1.0
}

fn default_reference_impedance() -> f64 {
    50.0
}

fn default_frequency_column() -> usize {
    1
}

fn default_value_column() -> usize {
    2
}

fn default_component() -> usize {
    2
}

fn default_name_scale() -> Scale {
    Scale::Mega
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Antenna / run name, used for the report title
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Unit of the frequency columns in the exports
    #[serde(default = "default_frequency_scale")]
    pub frequency_scale: Scale,
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub constants: PhysicalConstants,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyConfig {
    PhasorPair(PhasorPairConfig),
    EquivalentCircuit(EquivalentCircuitConfig),
}

impl StrategyConfig {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyConfig::PhasorPair(_) => "phasor-pair",
            StrategyConfig::EquivalentCircuit(_) => "equivalent-circuit",
        }
    }
}

/// Two-port phasor model inputs. The phase export holds frequency and the
/// two port phases in columns 0-2, the magnitude export frequency and the
/// coupling in dB in columns 0-1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhasorPairConfig {
    /// Reference power the dB coupling is relative to [W]
    #[serde(default = "default_antenna_power")]
    pub antenna_power: f64,
    pub phase_file: PathBuf,
    pub magnitude_file: PathBuf,
    #[serde(default)]
    pub phase_in_degrees: bool,
    #[serde(default)]
    pub phase_convention: PhaseConventionConfig,
    pub field: FieldConfig,
    #[serde(default = "default_skip_rows")]
    pub skip_rows: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhasePreset {
    Direct,
    InvertedPort,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PhaseConventionConfig {
    Preset(PhasePreset),
    Custom(PhaseConvention),
}

impl Default for PhaseConventionConfig {
    fn default() -> Self {
        PhaseConventionConfig::Preset(PhasePreset::Direct)
    }
}

impl PhaseConventionConfig {
    pub fn convention(&self) -> PhaseConvention {
        match self {
            PhaseConventionConfig::Preset(PhasePreset::Direct) => PhaseConvention::direct(),
            PhaseConventionConfig::Preset(PhasePreset::InvertedPort) => {
                PhaseConvention::inverted_port()
            }
            PhaseConventionConfig::Custom(c) => *c,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum FieldConfig {
    /// Field samples in a column export, interpolated onto the phase grid
    Measured {
        file: PathBuf,
        #[serde(default = "default_frequency_column")]
        frequency_column: usize,
        #[serde(default = "default_value_column")]
        value_column: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        imag_column: Option<usize>,
    },
    /// A directory of field-calculator exports, one file per frequency
    Exported {
        dir: PathBuf,
        #[serde(default = "default_component")]
        component: usize,
        /// Scale of bare numbers in the file names
        #[serde(default = "default_name_scale")]
        name_scale: Scale,
        /// Exports hold RMS values; multiply by sqrt(2)
        #[serde(default)]
        rms_to_peak: bool,
    },
    FreeSpace {
        geometry_constant: f64,
    },
    Constant {
        re: f64,
        #[serde(default)]
        im: f64,
    },
}

/// One column of one export file
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnRef {
    pub file: PathBuf,
    pub column: usize,
}

/// Equivalent-circuit inputs. All columns must lie on the frequency grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EquivalentCircuitConfig {
    #[serde(default = "default_antenna_power")]
    pub antenna_power: f64,
    pub frequency: ColumnRef,
    pub magnitude_db: ColumnRef,
    pub impedance_magnitude: ColumnRef,
    pub impedance_phase_deg: ColumnRef,
    pub feed_voltage: ColumnRef,
    pub port1_phase: ColumnRef,
    pub port2_phase: ColumnRef,
    /// Phase both port phases are measured against, e.g. the feed voltage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_phase: Option<ColumnRef>,
    #[serde(default)]
    pub phase_in_degrees: bool,
    #[serde(default = "default_reference_impedance")]
    pub reference_impedance: f64,
    /// Calibration field reference [V/m]
    pub field_reference: f64,
    pub components: ComponentsConfig,
    #[serde(default = "default_skip_rows")]
    pub skip_rows: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentsConfig {
    pub tem_capacitance: ComponentSource,
    pub tem_inductance: ComponentSource,
    pub antenna_capacitance: ComponentSource,
    pub antenna_inductance: ComponentSource,
}

/// A fixed component value or a per-frequency column
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum ComponentSource {
    Value {
        value: f64,
        #[serde(default)]
        scale: Scale,
    },
    Column(ColumnRef),
}

impl AnalysisConfig {
    pub fn from_yaml_str(content: &str) -> Result<AnalysisConfig, Box<dyn Error>> {
        let config: AnalysisConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<AnalysisConfig, Box<dyn Error>> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => bail!("{}: cannot read configuration: {}", path.display(), e),
        };
        let mut config = AnalysisConfig::from_yaml_str(&content)
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        if config.data_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.data_dir = parent.join(&config.data_dir);
            }
        }
        debug!(
            config = %path.display(),
            name = %config.name,
            strategy = config.strategy.name(),
            data_dir = %config.data_dir.display(),
            "loaded analysis configuration"
        );
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, Box<dyn Error>> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Checks that need no data files
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.name.trim().is_empty() {
            bail!("`name` must not be empty");
        }
        match &self.strategy {
            StrategyConfig::PhasorPair(c) => {
                check_positive("antenna_power", c.antenna_power)?;
                if let FieldConfig::FreeSpace { geometry_constant } = c.field {
                    if !geometry_constant.is_finite() || geometry_constant == 0.0 {
                        bail!("`geometry_constant` must be finite and non-zero");
                    }
                }
            }
            StrategyConfig::EquivalentCircuit(c) => {
                check_positive("antenna_power", c.antenna_power)?;
                check_positive("reference_impedance", c.reference_impedance)?;
                if !c.field_reference.is_finite() || c.field_reference == 0.0 {
                    bail!("`field_reference` must be finite and non-zero");
                }
            }
        }
        check_positive("report.display_impedance", self.report.display_impedance)?;
        Ok(())
    }

    pub fn data_path<P: AsRef<Path>>(&self, file: P) -> PathBuf {
        self.data_dir.join(file)
    }
}

fn check_positive(name: &str, val: f64) -> Result<(), Box<dyn Error>> {
    if !val.is_finite() || val <= 0.0 {
        bail!("`{}` must be positive, got {}", name, val);
    }
    Ok(())
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::f64::consts::PI;

    const PHASOR_YAML: &str = r#"
name: gapped loop
data_dir: data/gapped-loop
strategy:
  phasor_pair:
    phase_file: phase.csv
    magnitude_file: magnitude.csv
    phase_convention: inverted_port
    field:
      measured:
        file: efield.csv
"#;

    const CIRCUIT_YAML: &str = r#"
name: monopole
frequency_scale: G
strategy:
  equivalent_circuit:
    frequency: { file: capacitance.csv, column: 1 }
    magnitude_db: { file: magnitude.csv, column: 1 }
    impedance_magnitude: { file: impedance.csv, column: 1 }
    impedance_phase_deg: { file: impedance.csv, column: 2 }
    feed_voltage: { file: feed-voltage.csv, column: 1 }
    port1_phase: { file: phase.csv, column: 1 }
    port2_phase: { file: phase.csv, column: 2 }
    reference_phase: { file: phase.csv, column: 3 }
    field_reference: 183.1858
    components:
      tem_capacitance: { value: 3.29, scale: p }
      tem_inductance: { value: 2.15, scale: n }
      antenna_capacitance: { file: capacitance.csv, column: 2 }
      antenna_inductance: { file: inductance.csv, column: 2 }
report:
  include_complex: true
output:
  csv: out.csv
"#;

    #[test]
    fn phasor_config_defaults() {
        let config = AnalysisConfig::from_yaml_str(PHASOR_YAML).unwrap();
        assert_eq!(config.name, "gapped loop");
        assert_eq!(config.frequency_scale, Scale::Giga);
        assert_eq!(config.constants, PhysicalConstants::default());
        assert_eq!(config.report, ReportConfig::default());
        let StrategyConfig::PhasorPair(c) = &config.strategy else {
            panic!("expected phasor pair");
        };
        assert_eq!(c.antenna_power, 1.0);
        assert_eq!(c.skip_rows, 1);
        assert_eq!(c.phase_convention.convention().offset, PI);
        assert_eq!(
            c.field,
            FieldConfig::Measured {
                file: PathBuf::from("efield.csv"),
                frequency_column: 1,
                value_column: 2,
                imag_column: None,
            }
        );
        assert_eq!(
            config.data_path("phase.csv"),
            PathBuf::from("data/gapped-loop/phase.csv")
        );
    }

    #[test]
    fn circuit_config_components() {
        let config = AnalysisConfig::from_yaml_str(CIRCUIT_YAML).unwrap();
        let StrategyConfig::EquivalentCircuit(c) = &config.strategy else {
            panic!("expected equivalent circuit");
        };
        assert_eq!(c.reference_impedance, 50.0);
        assert_eq!(
            c.components.tem_capacitance,
            ComponentSource::Value {
                value: 3.29,
                scale: Scale::Pico
            }
        );
        assert_eq!(
            c.components.antenna_capacitance,
            ComponentSource::Column(ColumnRef {
                file: PathBuf::from("capacitance.csv"),
                column: 2
            })
        );
        assert!(config.report.include_complex);
        assert_eq!(config.output.csv, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn yaml_round_trip() {
        let config = AnalysisConfig::from_yaml_str(CIRCUIT_YAML).unwrap();
        let yaml = config.to_yaml_string().unwrap();
        let back = AnalysisConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn custom_phase_convention() {
        let yaml = PHASOR_YAML.replace(
            "phase_convention: inverted_port",
            "phase_convention: { offset: 1.5, wrap_positive_port1: true }",
        );
        let config = AnalysisConfig::from_yaml_str(&yaml).unwrap();
        let StrategyConfig::PhasorPair(c) = &config.strategy else {
            panic!("expected phasor pair");
        };
        let conv = c.phase_convention.convention();
        assert_eq!(conv.offset, 1.5);
        assert!(conv.wrap_positive_port1);
    }

    #[test]
    fn misspelled_nested_keys_are_rejected() {
        let yaml = PHASOR_YAML.replace("phase_convention:", "phase_convnetion:");
        assert!(AnalysisConfig::from_yaml_str(&yaml).is_err());

        let yaml = PHASOR_YAML.replace(
            "phase_convention: inverted_port",
            "phase_convention: { offest: 3.14159 }",
        );
        assert!(AnalysisConfig::from_yaml_str(&yaml).is_err());

        let yaml = PHASOR_YAML.replace("        file: efield.csv", "        flie: efield.csv");
        assert!(AnalysisConfig::from_yaml_str(&yaml).is_err());

        let yaml = CIRCUIT_YAML.replace("{ value: 3.29, scale: p }", "{ value: 3.29, scael: p }");
        assert!(AnalysisConfig::from_yaml_str(&yaml).is_err());

        let yaml = CIRCUIT_YAML.replace("{ file: phase.csv, column: 3 }", "{ file: phase.csv, colum: 3 }");
        assert!(AnalysisConfig::from_yaml_str(&yaml).is_err());

        let yaml = CIRCUIT_YAML.replace("  csv: out.csv", "  cvs: out.csv");
        assert!(AnalysisConfig::from_yaml_str(&yaml).is_err());

        let yaml = CIRCUIT_YAML.replace("  include_complex: true", "  include_compelx: true");
        assert!(AnalysisConfig::from_yaml_str(&yaml).is_err());
    }

    #[test]
    fn strategy_variants_load_from_nested_maps() {
        let yaml = PHASOR_YAML.replace(
            "      measured:\n        file: efield.csv",
            "      free_space:\n        geometry_constant: 11.527",
        );
        let config = AnalysisConfig::from_yaml_str(&yaml).unwrap();
        let StrategyConfig::PhasorPair(c) = &config.strategy else {
            panic!("expected phasor pair");
        };
        assert_eq!(
            c.field,
            FieldConfig::FreeSpace {
                geometry_constant: 11.527
            }
        );

        let yaml = config.to_yaml_string().unwrap();
        assert!(yaml.contains("phasor_pair:"), "{}", yaml);
        assert!(yaml.contains("free_space:"), "{}", yaml);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let yaml = PHASOR_YAML.replace("phase_file", "antenna_power: -1.0\n    phase_file");
        assert!(AnalysisConfig::from_yaml_str(&yaml).is_err());

        let yaml = PHASOR_YAML.replace("name: gapped loop", "name: \"\"");
        assert!(AnalysisConfig::from_yaml_str(&yaml).is_err());

        let yaml = format!("{}\nunknown_key: 1\n", PHASOR_YAML);
        assert!(AnalysisConfig::from_yaml_str(&yaml).is_err());

        let yaml = CIRCUIT_YAML.replace("field_reference: 183.1858", "field_reference: 0.0");
        assert!(AnalysisConfig::from_yaml_str(&yaml).is_err());

        assert!(AnalysisConfig::from_yaml_file("/nonexistent/analysis.yaml").is_err());
    }
}
