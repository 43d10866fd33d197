use crate::scale::Scale;
use ndarray::Array1;
use num_complex::Complex64;
use regex::Regex;
use simple_error::bail;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

macro_rules! unwrap_or_bail {
    ($opt: expr, $($msg: tt)+) => {
        match $opt {
            Some(v) => v,
            None => {
                bail!($($msg)+);
            }
        }
    };
}

/// Read a comma-separated column export into one array per column.
///
/// The first `skip_rows` records are dropped (HFSS exports carry one header
/// line). Every remaining field must parse as a float and every record must
/// have the same number of fields.
pub fn read_columns<P: AsRef<Path>>(
    path: P,
    skip_rows: usize,
) -> Result<Vec<Array1<f64>>, Box<dyn Error>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut columns: Vec<Vec<f64>> = vec![];
    for (n, record) in reader.records().enumerate() {
        let record = record?;
        if n < skip_rows {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(n as u64 + 1);
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        if columns.is_empty() {
            columns = vec![vec![]; record.len()];
        } else if record.len() != columns.len() {
            bail!(
                "{}:{}: expected {} columns, found {}",
                path.display(),
                line,
                columns.len(),
                record.len()
            );
        }
        for (col, field) in record.iter().enumerate() {
            match field.parse::<f64>() {
                Ok(v) => columns[col].push(v),
                Err(_) => bail!(
                    "{}:{} column {}: cannot parse `{}` as a number",
                    path.display(),
                    line,
                    col,
                    field
                ),
            }
        }
    }

    if columns.is_empty() {
        bail!("{}: no data rows", path.display());
    }
    debug!(
        file = %path.display(),
        columns = columns.len(),
        rows = columns[0].len(),
        "read column export"
    );
    Ok(columns.into_iter().map(Array1::from).collect())
}

/// Read one column of a column export
pub fn read_column<P: AsRef<Path>>(
    path: P,
    skip_rows: usize,
    column: usize,
) -> Result<Array1<f64>, Box<dyn Error>> {
    let path = path.as_ref();
    let mut columns = read_columns(path, skip_rows)?;
    if column >= columns.len() {
        bail!(
            "{}: column {} requested, file has {} columns",
            path.display(),
            column,
            columns.len()
        );
    }
    Ok(columns.swap_remove(column))
}

/// Read an HFSS field-calculator export.
///
/// Each sample is a parenthesised tuple `( ..., re, im )`; the last two values
/// of every tuple form one complex sample. Tuples with fewer than two values
/// are ignored.
pub fn read_field_export<P: AsRef<Path>>(path: P) -> Result<Vec<Complex64>, Box<dyn Error>> {
    let path = path.as_ref();
    let re_tuple = Regex::new(r"\(([^)]+)\)")?;
    let content = fs::read_to_string(path)?;

    let mut samples = vec![];
    for caps in re_tuple.captures_iter(&content) {
        let values: Vec<&str> = caps[1].split(',').map(|v| v.trim()).collect();
        if values.len() < 2 {
            continue;
        }
        let re_str = values[values.len() - 2];
        let im_str = values[values.len() - 1];
        let (Ok(re), Ok(im)) = (re_str.parse::<f64>(), im_str.parse::<f64>()) else {
            bail!(
                "{}: cannot parse `({})` as a complex sample",
                path.display(),
                &caps[1]
            );
        };
        samples.push(Complex64::new(re, im));
    }

    if samples.is_empty() {
        bail!("{}: no field samples found", path.display());
    }
    Ok(samples)
}

/// Frequency embedded in a field-export file name, in Hz.
///
/// A number followed by a unit (`E_1.25GHz.fld`) uses the unit's prefix;
/// a bare number (`efield_850.fld`) is read in `scale`.
pub fn frequency_from_file_name(name: &str, scale: Scale) -> Result<f64, Box<dyn Error>> {
    let re_with_unit = Regex::new(r"(?<val>\d+(?:\.\d+)?)\s*(?<prefix>[kMGT]?)(?i:hz)")?;
    let re_number = Regex::new(r"\d+(?:\.\d+)?")?;

    if let Some(caps) = re_with_unit.captures(name) {
        let val: f64 = caps["val"].parse()?;
        let prefix = Scale::from_str(&caps["prefix"])?;
        return Ok(prefix.unscale(val));
    }
    let number = unwrap_or_bail!(
        re_number.find(name),
        "no frequency found in file name `{}`",
        name
    );
    let val: f64 = number.as_str().parse()?;
    Ok(scale.unscale(val))
}

/// Read every field export in `dir`, keeping tuple `component` of each file
/// (0, 1, 2 for the x, y, z components of a vector export). Samples are
/// returned sorted by the frequency in their file names.
pub fn read_field_export_dir<P: AsRef<Path>>(
    dir: P,
    component: usize,
    scale: Scale,
) -> Result<(Array1<f64>, Array1<Complex64>), Box<dyn Error>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        bail!("{}: field export directory does not exist", dir.display());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    paths.sort();

    let mut samples: Vec<(f64, Complex64)> = Vec::with_capacity(paths.len());
    for path in paths {
        let name = unwrap_or_bail!(
            path.file_name().and_then(|n| n.to_str()),
            "{}: file name is not valid UTF-8",
            path.display()
        );
        let freq = frequency_from_file_name(name, scale)?;
        let values = read_field_export(&path)?;
        let value = unwrap_or_bail!(
            values.get(component),
            "{}: component {} requested, file has {} samples",
            path.display(),
            component,
            values.len()
        );
        samples.push((freq, *value));
    }

    if samples.is_empty() {
        bail!("{}: no field exports found", dir.display());
    }
    samples.sort_by(|a, b| a.0.total_cmp(&b.0));
    for w in samples.windows(2) {
        if w[0].0 == w[1].0 {
            bail!(
                "{}: two field exports at the same frequency {} Hz",
                dir.display(),
                w[0].0
            );
        }
    }

    debug!(dir = %dir.display(), samples = samples.len(), "read field exports");
    let freq = samples.iter().map(|s| s.0).collect::<Array1<f64>>();
    let values = samples.iter().map(|s| s.1).collect::<Array1<Complex64>>();
    Ok((freq, values))
}
