use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use log::{info, warn};
use thiserror::Error;

const TIMESTEP_PREFIX: &str = "TIMESTEP;";
const UNITS_PREFIX: &str = "UNITS;";
const DATA_MARKER: &str = "DATA;";

#[derive(Debug, Error)]
pub enum WaveformError {
    #[error("cannot read waveform source {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: malformed {field} value {value:?}, field left unset")]
    MalformedField {
        line: usize,
        field: &'static str,
        value: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeUnit {
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl TimeUnit {
    /// Unknown labels fall back to milliseconds.
    pub fn from_label(label: &str) -> Self {
        match label {
            "ns" => TimeUnit::Nanoseconds,
            "us" | "μs" | "µs" => TimeUnit::Microseconds,
            _ => TimeUnit::Milliseconds,
        }
    }

    pub fn per_millisecond(&self) -> u64 {
        match self {
            TimeUnit::Milliseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Nanoseconds => 1_000_000,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Duration of one sample in `units`. `None` when absent or not a positive integer.
    pub timestep: Option<u64>,
    pub units: String,
    pub name: String,
}

impl Metadata {
    pub fn time_unit(&self) -> TimeUnit {
        TimeUnit::from_label(&self.units)
    }
}

/// Parsed binary waveform. Samples are immutable once loaded.
#[derive(Debug, Default)]
pub struct Waveform {
    samples: Vec<u8>,
    metadata: Metadata,
    diagnostics: Vec<WaveformError>,
}

impl Waveform {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            metadata: Metadata {
                name: name.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, WaveformError> {
        let path = path.as_ref();
        let unavailable = |source| WaveformError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(unavailable)?;
        let mut waveform = Self::parse(BufReader::new(file)).map_err(unavailable)?;
        waveform.metadata.name = display_name(path);
        Ok(waveform)
    }

    /// Loads `path`, degrading to an empty waveform when the source cannot be read.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(waveform) => {
                info!(
                    "loaded {} samples from {} (timestep={:?}, units={:?})",
                    waveform.len(),
                    path.display(),
                    waveform.metadata.timestep,
                    waveform.metadata.units
                );
                for issue in waveform.diagnostics() {
                    warn!("{}: {issue}", path.display());
                }
                if waveform.is_empty() {
                    warn!("{} holds no samples after DATA;", path.display());
                }
                waveform
            }
            Err(err) => {
                warn!("{err}; showing an empty view");
                Self::empty(display_name(path))
            }
        }
    }

    pub fn parse(reader: impl BufRead) -> io::Result<Self> {
        let mut waveform = Self::default();
        let mut in_data = false;

        for (index, line) in reader.split(b'\n').enumerate() {
            let line = line?;
            let line = String::from_utf8_lossy(&line);
            let line = line.trim();

            if let Some(value) = line.strip_prefix(TIMESTEP_PREFIX) {
                let value = value.replace(';', "");
                waveform.metadata.timestep = parse_timestep(&value);
                if waveform.metadata.timestep.is_none() {
                    waveform.diagnostics.push(WaveformError::MalformedField {
                        line: index + 1,
                        field: "TIMESTEP",
                        value,
                    });
                }
            } else if let Some(value) = line.strip_prefix(UNITS_PREFIX) {
                waveform.metadata.units = value.replace(';', "");
            } else if line == DATA_MARKER {
                in_data = true;
            } else if in_data {
                match line.chars().next() {
                    Some('0') => waveform.samples.push(0),
                    Some('1') => waveform.samples.push(1),
                    _ => {}
                }
            }
        }

        Ok(waveform)
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn diagnostics(&self) -> &[WaveformError] {
        &self.diagnostics
    }
}

fn parse_timestep(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|step| *step > 0)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
