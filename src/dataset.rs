use crate::config::{
    ColumnRef, ComponentSource, EquivalentCircuitConfig, FieldConfig, PhasorPairConfig,
    StrategyConfig,
};
use crate::engine::{
    CircuitComponentsBuilder, EquivalentCircuitBuilder, FieldReference, PerFrequency, PhasorPair,
    Strategy,
};
use crate::file::{read_columns, read_field_export_dir};
use crate::frequency::Frequency;
use crate::interp::{interp, interp_complex};
use crate::scale::Scale;
use crate::series::{impedance_from_polar, OutputPower, PhasePair};
use crate::unit::{Unit, UnitVal};
use ndarray::Array1;
use num_complex::Complex64;
use simple_error::bail;
use std::collections::HashMap;
use std::error::Error;
use std::f64::consts::SQRT_2;
use std::path::{Path, PathBuf};
use tracing::info;

/// Measurement series of one antenna configuration, aligned to one
/// frequency axis and bound to the strategy that consumes them.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasurementSet {
    frequency: Frequency,
    strategy: Strategy,
}

impl MeasurementSet {
    pub fn new(frequency: Frequency, strategy: Strategy) -> Self {
        MeasurementSet {
            frequency,
            strategy,
        }
    }

    /// Load the files named in `config` from `data_dir`. Frequency columns
    /// are expressed in `scale`.
    pub fn load(
        config: &StrategyConfig,
        data_dir: &Path,
        scale: Scale,
    ) -> Result<MeasurementSet, Box<dyn Error>> {
        let set = match config {
            StrategyConfig::PhasorPair(c) => load_phasor_pair(c, data_dir, scale)?,
            StrategyConfig::EquivalentCircuit(c) => load_equivalent_circuit(c, data_dir, scale)?,
        };
        info!(
            strategy = config.name(),
            npts = set.frequency.npts(),
            start_hz = set.frequency.start(),
            stop_hz = set.frequency.stop(),
            "loaded measurement set"
        );
        Ok(set)
    }

    pub fn frequency(&self) -> &Frequency {
        &self.frequency
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn into_parts(self) -> (Frequency, Strategy) {
        (self.frequency, self.strategy)
    }
}

fn column(columns: &[Array1<f64>], index: usize, path: &Path) -> Result<Array1<f64>, Box<dyn Error>> {
    match columns.get(index) {
        Some(c) => Ok(c.clone()),
        None => bail!(
            "{}: column {} requested, file has {} columns",
            path.display(),
            index,
            columns.len()
        ),
    }
}

fn load_phasor_pair(
    config: &PhasorPairConfig,
    data_dir: &Path,
    scale: Scale,
) -> Result<MeasurementSet, Box<dyn Error>> {
    let phase_path = data_dir.join(&config.phase_file);
    let phase = read_columns(&phase_path, config.skip_rows)?;
    let freq = Frequency::new(column(&phase, 0, &phase_path)?, scale)?;
    let port_1 = column(&phase, 1, &phase_path)?;
    let port_2 = column(&phase, 2, &phase_path)?;
    let pair = if config.phase_in_degrees {
        PhasePair::from_degrees(&port_1, &port_2)?
    } else {
        PhasePair::new(port_1, port_2)?
    };
    let phase_shift = pair.phase_shift(&config.phase_convention.convention());

    let magnitude_path = data_dir.join(&config.magnitude_file);
    let magnitude = read_columns(&magnitude_path, config.skip_rows)?;
    let magnitude_freq = scale.unscale_array(&column(&magnitude, 0, &magnitude_path)?);
    let magnitude_db = interp(
        freq.f(),
        &magnitude_freq,
        &column(&magnitude, 1, &magnitude_path)?,
    )?;
    let power = OutputPower::from_db(config.antenna_power, &magnitude_db);

    let field = match &config.field {
        FieldConfig::Measured {
            file,
            frequency_column,
            value_column,
            imag_column,
        } => {
            let path = data_dir.join(file);
            let columns = read_columns(&path, config.skip_rows)?;
            let field_freq = scale.unscale_array(&column(&columns, *frequency_column, &path)?);
            let re = column(&columns, *value_column, &path)?;
            let values = match imag_column {
                Some(im_col) => {
                    let im = column(&columns, *im_col, &path)?;
                    Array1::from_shape_fn(re.len(), |i| Complex64::new(re[i], im[i]))
                }
                None => re.map(|&x| Complex64::new(x, 0.0)),
            };
            FieldReference::Measured(interp_complex(freq.f(), &field_freq, &values)?)
        }
        FieldConfig::Exported {
            dir,
            component,
            name_scale,
            rms_to_peak,
        } => {
            let (field_freq, values) =
                read_field_export_dir(data_dir.join(dir), *component, *name_scale)?;
            let values = if *rms_to_peak {
                values.map(|v| *v * SQRT_2)
            } else {
                values
            };
            FieldReference::Measured(interp_complex(freq.f(), &field_freq, &values)?)
        }
        FieldConfig::FreeSpace { geometry_constant } => FieldReference::FreeSpace {
            geometry_constant: *geometry_constant,
        },
        FieldConfig::Constant { re, im } => FieldReference::Constant(Complex64::new(*re, *im)),
    };

    let strategy = PhasorPair::new(field, phase_shift, power.into_watts());
    Ok(MeasurementSet::new(freq, strategy.into()))
}

/// Column reader that parses each export once
struct ColumnCache<'a> {
    data_dir: &'a Path,
    skip_rows: usize,
    files: HashMap<PathBuf, Vec<Array1<f64>>>,
}

impl<'a> ColumnCache<'a> {
    fn new(data_dir: &'a Path, skip_rows: usize) -> Self {
        ColumnCache {
            data_dir,
            skip_rows,
            files: HashMap::new(),
        }
    }

    fn get(&mut self, col: &ColumnRef) -> Result<Array1<f64>, Box<dyn Error>> {
        let path = self.data_dir.join(&col.file);
        if !self.files.contains_key(&path) {
            let columns = read_columns(&path, self.skip_rows)?;
            self.files.insert(path.clone(), columns);
        }
        match self.files.get(&path) {
            Some(columns) => column(columns, col.column, &path),
            None => bail!("{}: file was not cached", path.display()),
        }
    }

    fn component(
        &mut self,
        source: &ComponentSource,
        unit: Unit,
    ) -> Result<PerFrequency<f64>, Box<dyn Error>> {
        match source {
            ComponentSource::Value { value, scale } => {
                Ok(UnitVal::new_scaled(*value, *scale, unit).into())
            }
            ComponentSource::Column(col) => Ok(self.get(col)?.into()),
        }
    }
}

fn load_equivalent_circuit(
    config: &EquivalentCircuitConfig,
    data_dir: &Path,
    scale: Scale,
) -> Result<MeasurementSet, Box<dyn Error>> {
    let mut cache = ColumnCache::new(data_dir, config.skip_rows);

    let freq = Frequency::new(cache.get(&config.frequency)?, scale)?;
    let power = OutputPower::from_db(config.antenna_power, &cache.get(&config.magnitude_db)?);
    let input_impedance = impedance_from_polar(
        &cache.get(&config.impedance_magnitude)?,
        &cache.get(&config.impedance_phase_deg)?,
    )?;
    let input_voltage = cache
        .get(&config.feed_voltage)?
        .map(|&v| Complex64::new(v, 0.0));

    let port_1 = cache.get(&config.port1_phase)?;
    let port_2 = cache.get(&config.port2_phase)?;
    let mut phases = if config.phase_in_degrees {
        PhasePair::from_degrees(&port_1, &port_2)?
    } else {
        PhasePair::new(port_1, port_2)?
    };
    if let Some(reference) = &config.reference_phase {
        let reference = cache.get(reference)?;
        let reference = if config.phase_in_degrees {
            reference.map(|d| d.to_radians())
        } else {
            reference
        };
        phases = phases.relative_to(&reference)?;
    }

    let c = &config.components;
    let components = CircuitComponentsBuilder::new()
        .tem_capacitance(cache.component(&c.tem_capacitance, Unit::Farad)?)
        .tem_inductance(cache.component(&c.tem_inductance, Unit::Henry)?)
        .antenna_capacitance(cache.component(&c.antenna_capacitance, Unit::Farad)?)
        .antenna_inductance(cache.component(&c.antenna_inductance, Unit::Henry)?)
        .build();

    let strategy = EquivalentCircuitBuilder::new()
        .input_impedance(input_impedance)
        .input_voltage(input_voltage)
        .phases(phases.port_1().clone(), phases.port_2().clone())
        .output_power(power.into_watts())
        .reference_impedance(config.reference_impedance)
        .field_reference(config.field_reference)
        .components(components)
        .build();
    Ok(MeasurementSet::new(freq, strategy.into()))
}

#[cfg(test)]
mod dataset_tests {
    use super::*;
    use crate::config::{AnalysisConfig, PhaseConventionConfig, PhasePreset};
    use crate::consts::PhysicalConstants;
    use crate::engine::MomentStrategy;
    use crate::util::{comp_array_f64, comp_f64, comp_rel, MARGIN};
    use ndarray::array;
    use std::fs;
    use tempfile::TempDir;

    fn phasor_config(field: FieldConfig) -> PhasorPairConfig {
        PhasorPairConfig {
            antenna_power: 1.0,
            phase_file: PathBuf::from("phase.csv"),
            magnitude_file: PathBuf::from("magnitude.csv"),
            phase_in_degrees: false,
            phase_convention: PhaseConventionConfig::Preset(PhasePreset::Direct),
            field,
            skip_rows: 1,
        }
    }

    fn write_phasor_data(dir: &Path) {
        fs::write(dir.join("phase.csv"), "f,p1,p2\n1.0,0.5,0.25\n2.0,0.75,0.25\n").unwrap();
        fs::write(dir.join("magnitude.csv"), "f,db\n1.0,0.0\n2.0,-10.0\n").unwrap();
        // field on a coarser grid covering the phase grid
        fs::write(dir.join("efield.csv"), "i,f,e\n0,0.0,100.0\n1,4.0,300.0\n").unwrap();
    }

    #[test]
    fn phasor_pair_is_aligned_to_phase_grid() {
        let dir = TempDir::new().unwrap();
        write_phasor_data(dir.path());
        let config = StrategyConfig::PhasorPair(phasor_config(FieldConfig::Measured {
            file: PathBuf::from("efield.csv"),
            frequency_column: 1,
            value_column: 2,
            imag_column: None,
        }));
        let set = MeasurementSet::load(&config, dir.path(), Scale::Giga).unwrap();
        comp_array_f64(&array![1.0e9, 2.0e9], set.frequency().f(), MARGIN, "grid");

        let Strategy::PhasorPair(pair) = set.strategy() else {
            panic!("expected phasor pair");
        };
        comp_array_f64(&array![1.0, 0.1], &pair.output_power().to_array(2), MARGIN, "power");
        comp_array_f64(&array![0.25, 0.5], &pair.phase_shift().to_array(2), MARGIN, "phase");
        let FieldReference::Measured(e) = pair.field() else {
            panic!("expected measured field");
        };
        comp_f64(&150.0, &e[0].re, MARGIN, "field interp", "0");
        comp_f64(&200.0, &e[1].re, MARGIN, "field interp", "1");

        let moments = set
            .strategy()
            .moments(set.frequency(), &PhysicalConstants::default())
            .unwrap();
        assert_eq!(moments.len(), 2);
    }

    #[test]
    fn exported_field_is_scaled_to_peak() {
        let dir = TempDir::new().unwrap();
        write_phasor_data(dir.path());
        let fields = dir.path().join("fields");
        fs::create_dir(&fields).unwrap();
        fs::write(fields.join("E_500MHz.fld"), "(0,1,0)\n(0,2,0)\n(0,10,0)\n").unwrap();
        fs::write(fields.join("E_3GHz.fld"), "(0,1,0)\n(0,2,0)\n(0,10,0)\n").unwrap();
        let config = StrategyConfig::PhasorPair(phasor_config(FieldConfig::Exported {
            dir: PathBuf::from("fields"),
            component: 2,
            name_scale: Scale::Mega,
            rms_to_peak: true,
        }));
        let set = MeasurementSet::load(&config, dir.path(), Scale::Giga).unwrap();
        let Strategy::PhasorPair(pair) = set.strategy() else {
            panic!("expected phasor pair");
        };
        let FieldReference::Measured(e) = pair.field() else {
            panic!("expected measured field");
        };
        comp_f64(&(10.0 * SQRT_2), &e[0].re, MARGIN, "rms to peak", "0");
    }

    #[test]
    fn missing_column_is_reported() {
        let dir = TempDir::new().unwrap();
        write_phasor_data(dir.path());
        let config = StrategyConfig::PhasorPair(phasor_config(FieldConfig::Measured {
            file: PathBuf::from("efield.csv"),
            frequency_column: 1,
            value_column: 5,
            imag_column: None,
        }));
        let err = MeasurementSet::load(&config, dir.path(), Scale::Giga).unwrap_err();
        assert!(err.to_string().contains("column 5"), "{}", err);
    }

    #[test]
    fn equivalent_circuit_from_columns() {
        let dir = TempDir::new().unwrap();
        let d = dir.path();
        fs::write(d.join("capacitance.csv"), "i,f,c\n0,1.0,38.36e-15\n1,1.5,38.36e-15\n").unwrap();
        fs::write(d.join("inductance.csv"), "i,f,l\n0,1.0,5.5e-9\n1,1.5,5.5e-9\n").unwrap();
        fs::write(d.join("magnitude.csv"), "f,db\n1.0,-48.3\n1.5,-47.0\n").unwrap();
        fs::write(d.join("impedance.csv"), "f,mag,deg\n1.0,13.91,8.2\n1.5,42.0,73.3\n").unwrap();
        fs::write(d.join("feed-voltage.csv"), "f,v\n1.0,3.66\n1.5,3.66\n").unwrap();
        fs::write(
            d.join("phase.csv"),
            "f,wp1,wp2,ant\n1.0,-56.86,-244.2,10.0\n1.5,-60.0,-250.0,12.0\n",
        )
        .unwrap();
        let yaml = r#"
name: monopole
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
    phase_in_degrees: true
    field_reference: 183.1858
    components:
      tem_capacitance: { value: 3.29, scale: p }
      tem_inductance: { value: 2.15, scale: n }
      antenna_capacitance: { file: capacitance.csv, column: 2 }
      antenna_inductance: { file: inductance.csv, column: 2 }
"#;
        let config = AnalysisConfig::from_yaml_str(yaml).unwrap();
        let set = MeasurementSet::load(&config.strategy, d, config.frequency_scale).unwrap();
        let Strategy::EquivalentCircuit(circuit) = set.strategy() else {
            panic!("expected equivalent circuit");
        };
        comp_f64(
            &3.29e-12,
            &circuit.components().tem_capacitance.at(0),
            MARGIN,
            "C_t",
            "",
        );
        assert!(!circuit.components().antenna_capacitance.is_constant());

        let solutions = circuit.solve(set.frequency()).unwrap();
        assert_eq!(solutions.len(), 2);
        // the antenna phase is subtracted from both ports
        let expected = (-56.86_f64 - 10.0).to_radians();
        comp_rel(&expected, &solutions[0].u_1.arg(), 1e-12, "relative phase", "");
    }
}
