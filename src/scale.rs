use ndarray::Array1;
use serde::{Deserialize, Serialize};
use simple_error::bail;
use std::{fmt, str::FromStr};

/// Descriptor of scaling
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scale {
    #[serde(alias = "f", alias = "femto")]
    Femto,
    #[serde(alias = "p", alias = "pico")]
    Pico,
    #[serde(alias = "n", alias = "nano")]
    Nano,
    #[serde(alias = "u", alias = "micro")]
    Micro,
    #[serde(alias = "m", alias = "milli")]
    Milli,
    #[default]
    #[serde(alias = "", alias = "base", alias = "Hz")]
    Base,
    #[serde(alias = "k", alias = "kilo", alias = "kHz")]
    Kilo,
    #[serde(alias = "M", alias = "mega", alias = "MHz")]
    Mega,
    #[serde(alias = "G", alias = "giga", alias = "GHz")]
    Giga,
    #[serde(alias = "T", alias = "tera", alias = "THz")]
    Tera,
}

impl Scale {
    pub fn to_str(&self) -> &str {
        match self {
            Scale::Femto => "f",
            Scale::Pico => "p",
            Scale::Nano => "n",
            Scale::Micro => "u",
            Scale::Milli => "m",
            Scale::Base => "",
            Scale::Kilo => "k",
            Scale::Mega => "M",
            Scale::Giga => "G",
            Scale::Tera => "T",
        }
    }

    /// Provides multiplier for scale
    /// Scale::Pico = 1e-12
    pub fn multiplier(&self) -> f64 {
        match self {
            Scale::Femto => 1e-15,
            Scale::Pico => 1e-12,
            Scale::Nano => 1e-9,
            Scale::Micro => 1e-6,
            Scale::Milli => 1e-3,
            Scale::Base => 1.0,
            Scale::Kilo => 1e3,
            Scale::Mega => 1e6,
            Scale::Giga => 1e9,
            Scale::Tera => 1e12,
        }
    }

    /// Express a base-unit value in this scale (1e9 Hz -> 1.0 for Giga)
    pub fn scale(&self, val: f64) -> f64 {
        val / self.multiplier()
    }

    pub fn scale_array(&self, val: &Array1<f64>) -> Array1<f64> {
        val.map(|&x| x / self.multiplier())
    }

    /// Convert a value given in this scale back to the base unit
    pub fn unscale(&self, val: f64) -> f64 {
        val * self.multiplier()
    }

    pub fn unscale_array(&self, val: &Array1<f64>) -> Array1<f64> {
        val.map(|&x| x * self.multiplier())
    }
}

/// Parses an SI prefix, optionally followed by `Hz` as in export headers
/// (`"G"`, `"GHz"`, `"mhz"`). An empty prefix is the base unit.
impl FromStr for Scale {
    type Err = Box<dyn std::error::Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let prefix = s
            .strip_suffix("Hz")
            .or_else(|| s.strip_suffix("hz"))
            .or_else(|| s.strip_suffix("HZ"))
            .unwrap_or(s);
        match prefix {
            "f" | "femto" => Ok(Scale::Femto),
            "p" | "pico" => Ok(Scale::Pico),
            "n" | "nano" => Ok(Scale::Nano),
            "u" | "μ" | "micro" => Ok(Scale::Micro),
            "m" | "milli" => Ok(Scale::Milli),
            "" => Ok(Scale::Base),
            "k" | "K" | "kilo" => Ok(Scale::Kilo),
            "M" | "mega" => Ok(Scale::Mega),
            "G" | "g" | "giga" => Ok(Scale::Giga),
            "T" | "t" | "tera" => Ok(Scale::Tera),
            _ => bail!("unknown scale prefix `{}`", s),
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}
