use crate::config::AnalysisConfig;
use crate::dataset::MeasurementSet;
use crate::engine::{MomentStrategy, Moments};
use crate::frequency::Frequency;
use crate::report::{render, MomentReport};
use std::error::Error;
use simple_error::bail;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Result of one analysis run
#[derive(Clone, Debug, PartialEq)]
pub struct Analysis {
    pub name: String,
    pub strategy: &'static str,
    pub frequency: Frequency,
    pub moments: Moments,
    pub report: MomentReport,
}

/// Load the inputs and run the strategy's checks without writing anything.
/// Catches per-frequency series that do not match the frequency grid.
pub fn check(config: &AnalysisConfig) -> Result<MeasurementSet, Box<dyn Error>> {
    config.validate()?;
    let set = MeasurementSet::load(&config.strategy, &config.data_dir, config.frequency_scale)?;
    let moments = set.strategy().moments(set.frequency(), &config.constants)?;
    debug!(
        name = %config.name,
        strategy = set.strategy().name(),
        npts = moments.len(),
        "inputs are consistent"
    );
    Ok(set)
}

/// Load, compute and render. Writes the outputs named in `config.output`,
/// either all of them or none.
pub fn run(config: &AnalysisConfig) -> Result<Analysis, Box<dyn Error>> {
    config.validate()?;
    let set = MeasurementSet::load(&config.strategy, &config.data_dir, config.frequency_scale)?;
    let (frequency, strategy) = set.into_parts();
    let moments = strategy.moments(&frequency, &config.constants)?;

    let mut report_config = config.report.clone();
    if report_config.title.is_none() {
        report_config.title = Some(format!(
            "Dipole Moments of {} Antenna in TEM Cell",
            config.name
        ));
    }
    let mut report = render(&frequency, &moments, &report_config)?;
    if report_config.include_inputs {
        report = report.with_inputs(&strategy.inputs(&frequency)?)?;
    }

    let mut outputs = Vec::new();
    if let Some(path) = &config.output.csv {
        outputs.push((path, report.to_csv_string()?));
    }
    if let Some(path) = &config.output.json {
        outputs.push((path, report.to_json()?));
    }
    write_all(&outputs)?;
    for (path, _) in &outputs {
        info!(path = %path.display(), rows = report.len(), "wrote moment report");
    }

    info!(
        name = %config.name,
        strategy = strategy.name(),
        npts = frequency.npts(),
        "analysis complete"
    );
    Ok(Analysis {
        name: config.name.clone(),
        strategy: strategy.name(),
        frequency,
        moments,
        report,
    })
}

/// Write every output or, on the first failure, remove those already written
fn write_all(outputs: &[(&PathBuf, String)]) -> Result<(), Box<dyn Error>> {
    for (n, (path, content)) in outputs.iter().enumerate() {
        let written = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| fs::write(path, content));
        if let Err(e) = written {
            for (done, _) in &outputs[..n] {
                let _ = fs::remove_file(done);
            }
            bail!("{}: {}", path.display(), e);
        }
    }
    Ok(())
}
