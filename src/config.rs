//! Configuration system for the sequence filter

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub io: IoConfig,
    pub thresholds: ThresholdConfig,
    pub ranges: PitchRangeConfig,
    pub output: OutputConfig,
    pub batch: BatchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            io: IoConfig::default(),
            thresholds: ThresholdConfig::default(),
            ranges: PitchRangeConfig::default(),
            output: OutputConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

/// Corpus locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// File extensions treated as sequence files, compared case-insensitively
    pub extensions: Vec<String>,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/input_dataset"),
            output_dir: PathBuf::from("data/processed_dataset"),
            extensions: vec!["mid".to_string(), "midi".to_string()],
        }
    }
}

impl IoConfig {
    /// Whether `path` carries one of the configured extensions
    pub fn matches_extension(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

/// Acceptance thresholds, in percent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Maximum rest time per track as a share of song duration
    pub rest_percent: f64,
    /// Maximum share of melody notes outside the melody range
    pub out_of_range_percent: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            rest_percent: 25.0,
            out_of_range_percent: 0.0,
        }
    }
}

/// Pitch limits (MIDI note numbers, inclusive)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchRangeConfig {
    pub chord_pitch_min: u8,
    pub chord_pitch_max: u8,
    pub melody_pitch_min: u8,
    pub melody_pitch_max: u8,
    /// Largest allowed jump between consecutive melody notes, in semitones
    pub max_melodic_interval: u8,
}

impl Default for PitchRangeConfig {
    fn default() -> Self {
        Self {
            // A0..C8, the 88-key piano
            chord_pitch_min: 21,
            chord_pitch_max: 108,
            // Four octaves from C1
            melody_pitch_min: 24,
            melody_pitch_max: 72,
            max_melodic_interval: 12,
        }
    }
}

/// Encoding parameters for accepted sequences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub ticks_per_quarter: u16,
    pub tempo_bpm: f64,
    pub velocity: u8,
    /// General MIDI program for both tracks (0 = Acoustic Grand Piano)
    pub program: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            ticks_per_quarter: 480,
            tempo_bpm: 120.0,
            velocity: 127,
            program: 0,
        }
    }
}

/// Batch execution settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker threads; `None` picks available CPUs minus one
    pub jobs: Option<usize>,
    /// Where to write the JSON run report, if anywhere
    pub report_path: Option<PathBuf>,
}

impl BatchConfig {
    /// Effective worker count
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(default_jobs)
    }
}

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

/// Validate configuration parameters
pub fn validate_config(config: &Config) -> anyhow::Result<()> {
    let t = &config.thresholds;
    if !(0.0..=100.0).contains(&t.rest_percent) {
        anyhow::bail!("rest_percent must be within [0, 100], got {}", t.rest_percent);
    }
    if !(0.0..=100.0).contains(&t.out_of_range_percent) {
        anyhow::bail!(
            "out_of_range_percent must be within [0, 100], got {}",
            t.out_of_range_percent
        );
    }

    let r = &config.ranges;
    if r.chord_pitch_min > r.chord_pitch_max {
        anyhow::bail!("chord_pitch_min must be <= chord_pitch_max");
    }
    if r.melody_pitch_min > r.melody_pitch_max {
        anyhow::bail!("melody_pitch_min must be <= melody_pitch_max");
    }
    if r.chord_pitch_max > 127 || r.melody_pitch_max > 127 {
        anyhow::bail!("pitch limits must be valid MIDI notes (0-127)");
    }

    let o = &config.output;
    if o.ticks_per_quarter == 0 || o.ticks_per_quarter > 0x7FFF {
        anyhow::bail!("ticks_per_quarter must be within [1, 32767]");
    }
    if !(o.tempo_bpm > 0.0 && o.tempo_bpm.is_finite()) {
        anyhow::bail!("tempo_bpm must be positive");
    }
    if o.velocity == 0 || o.velocity > 127 {
        anyhow::bail!("velocity must be within [1, 127]");
    }
    if o.program > 127 {
        anyhow::bail!("program must be within [0, 127]");
    }

    if config.batch.jobs == Some(0) {
        anyhow::bail!("jobs must be at least 1");
    }
    if config.io.extensions.is_empty() {
        anyhow::bail!("at least one input extension is required");
    }

    Ok(())
}

/// Load configuration from JSON file
pub fn load_config<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Save configuration to JSON file
pub fn save_config<P: AsRef<std::path::Path>>(config: &Config, path: P) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
