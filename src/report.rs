//! Presentation-ready moment data.
//!
//! The electric moment is multiplied by a display impedance so both moments
//! share one axis in V·m; both traces use the same y-range starting at zero.

use crate::consts::DISPLAY_IMPEDANCE;
use crate::engine::{InputTraces, Moments};
use crate::error::InvalidInputError;
use crate::frequency::Frequency;
use crate::scale::Scale;
use crate::unit::Unit;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::Path;
use tracing::info;

/// Report settings passed explicitly to [`render`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub title: Option<String>,
    /// Impedance |m_e| is multiplied by for display [Ω]
    pub display_impedance: f64,
    /// Unit of the frequency axis in the report
    pub frequency_scale: Scale,
    /// Add real and imaginary parts of both moments
    pub include_complex: bool,
    /// Add the phase shift, output power and |E| the moments were computed from
    pub include_inputs: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            title: None,
            display_impedance: DISPLAY_IMPEDANCE,
            frequency_scale: Scale::Giga,
            include_complex: false,
            include_inputs: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComplexColumns {
    pub electric_re: Vec<f64>,
    pub electric_im: Vec<f64>,
    pub magnetic_re: Vec<f64>,
    pub magnetic_im: Vec<f64>,
}

/// Inputs of the moment computation, one entry per frequency
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputColumns {
    /// Δφ [rad]
    pub phase_shift: Vec<f64>,
    /// P_out [W]
    pub output_power: Vec<f64>,
    /// |E| of the field reference [V/m]
    pub field_reference: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MomentReport {
    pub title: String,
    pub frequency_unit: String,
    pub display_impedance: f64,
    pub frequency: Vec<f64>,
    /// |m_e| * display impedance [V·m]
    pub electric: Vec<f64>,
    /// |m_m| [V·m]
    pub magnetic: Vec<f64>,
    pub x_limits: (f64, f64),
    pub y_limits: (f64, f64),
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complex: Option<ComplexColumns>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<InputColumns>,
}

/// Scale and bound the moments for display
pub fn render(
    freq: &Frequency,
    moments: &Moments,
    config: &ReportConfig,
) -> Result<MomentReport, InvalidInputError> {
    if moments.len() != freq.npts() {
        return Err(InvalidInputError::shape("moments", freq.npts(), moments.len()));
    }
    if !config.display_impedance.is_finite() || config.display_impedance <= 0.0 {
        return Err(InvalidInputError::domain(
            "display_impedance",
            0,
            format!("must be positive, got {}", config.display_impedance),
        ));
    }

    let frequency = config.frequency_scale.scale_array(freq.f()).to_vec();
    let electric = (moments.electric() * config.display_impedance).to_vec();
    let magnetic = moments.magnetic().to_vec();

    let y_max = electric
        .iter()
        .chain(magnetic.iter())
        .fold(0.0_f64, |acc, &m| acc.max(m));
    let x_min = frequency.iter().fold(f64::INFINITY, |acc, &f| acc.min(f));
    let x_max = frequency.iter().fold(f64::NEG_INFINITY, |acc, &f| acc.max(f));

    let complex = if config.include_complex {
        let e = moments.electric_complex();
        let m = moments.magnetic_complex();
        Some(ComplexColumns {
            electric_re: e.iter().map(|c| c.re).collect(),
            electric_im: e.iter().map(|c| c.im).collect(),
            magnetic_re: m.iter().map(|c| c.re).collect(),
            magnetic_im: m.iter().map(|c| c.im).collect(),
        })
    } else {
        None
    };

    Ok(MomentReport {
        title: config
            .title
            .clone()
            .unwrap_or_else(|| "Dipole Moments".to_string()),
        frequency_unit: format!("{}{}", config.frequency_scale, Unit::Hz),
        display_impedance: config.display_impedance,
        frequency,
        electric,
        magnetic,
        x_limits: (x_min, x_max),
        y_limits: (0.0, y_max),
        complex,
        inputs: None,
    })
}

impl MomentReport {
    pub fn len(&self) -> usize {
        self.frequency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequency.is_empty()
    }

    /// Attach the traces the moments were computed from
    pub fn with_inputs(mut self, traces: &InputTraces) -> Result<Self, InvalidInputError> {
        if traces.len() != self.len() {
            return Err(InvalidInputError::shape("inputs", self.len(), traces.len()));
        }
        self.inputs = Some(InputColumns {
            phase_shift: traces.phase_shift.to_vec(),
            output_power: traces.output_power.to_vec(),
            field_reference: traces.field_reference.iter().map(|e| e.norm()).collect(),
        });
        Ok(self)
    }

    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec![
            format!("Frequency [{}]", self.frequency_unit),
            format!(
                "Electric Dipole Moment |m_e|*{} {} [{}]",
                self.display_impedance,
                Unit::Ohm,
                Unit::VoltMeter
            ),
            format!("Magnetic Dipole Moment |m_m| [{}]", Unit::VoltMeter),
        ];
        if self.complex.is_some() {
            headers.extend([
                format!("Re(m_e) [{}]", Unit::AmpereMeter),
                format!("Im(m_e) [{}]", Unit::AmpereMeter),
                format!("Re(m_m) [{}]", Unit::VoltMeter),
                format!("Im(m_m) [{}]", Unit::VoltMeter),
            ]);
        }
        if self.inputs.is_some() {
            headers.extend([
                format!("Phase Shift [{}]", Unit::Radian),
                format!("Output Power [{}]", Unit::Watt),
                format!("|E| [{}]", Unit::VoltPerMeter),
            ]);
        }
        headers
    }

    /// CSV rendition of the report, header row first
    pub fn to_csv_string(&self) -> Result<String, Box<dyn Error>> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(self.headers())?;
        for i in 0..self.len() {
            let mut record = vec![
                self.frequency[i].to_string(),
                self.electric[i].to_string(),
                self.magnetic[i].to_string(),
            ];
            if let Some(c) = &self.complex {
                record.push(c.electric_re[i].to_string());
                record.push(c.electric_im[i].to_string());
                record.push(c.magnetic_re[i].to_string());
                record.push(c.magnetic_im[i].to_string());
            }
            if let Some(inputs) = &self.inputs {
                record.push(inputs.phase_shift[i].to_string());
                record.push(inputs.output_power[i].to_string());
                record.push(inputs.field_reference[i].to_string());
            }
            wtr.write_record(&record)?;
        }
        Ok(String::from_utf8(wtr.into_inner()?)?)
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
        let path = path.as_ref();
        fs::write(path, self.to_csv_string()?)?;
        info!(path = %path.display(), rows = self.len(), "wrote moment report");
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
