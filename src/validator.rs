//! Acceptance rules for aligned sequences
//!
//! Rules run in a fixed order and the first failure decides the verdict:
//!
//! 1. exactly two tracks (checked by the caller before alignment)
//! 2. every chord pitch inside the piano range
//! 3. no melodic jump wider than an octave between consecutive onsets
//! 4. share of out-of-range melody notes within threshold
//! 5. melody rest share within threshold
//! 6. chord rest share within threshold

use crate::config::{Config, PitchRangeConfig, ThresholdConfig};
use crate::error::FilterError;
use crate::sequence::{NoteEvent, Sequence, Track};
use serde::{Deserialize, Serialize};

/// Why a sequence was discarded, declared in rule order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    DecodeError,
    WrongTrackCount,
    EmptyTrack,
    ChordOutOfRange,
    MelodicIntervalExceeded,
    MelodyOutOfRange,
    MelodyRestExceeded,
    ChordRestExceeded,
}

impl RejectReason {
    pub const ALL: [RejectReason; 8] = [
        RejectReason::DecodeError,
        RejectReason::WrongTrackCount,
        RejectReason::EmptyTrack,
        RejectReason::ChordOutOfRange,
        RejectReason::MelodicIntervalExceeded,
        RejectReason::MelodyOutOfRange,
        RejectReason::MelodyRestExceeded,
        RejectReason::ChordRestExceeded,
    ];

    /// Human-readable description for logs and the summary table
    pub fn describe(&self) -> &'static str {
        match self {
            RejectReason::DecodeError => "file could not be decoded",
            RejectReason::WrongTrackCount => "number of tracks is not 2",
            RejectReason::EmptyTrack => "a track has no notes",
            RejectReason::ChordOutOfRange => "chord pitch outside the piano range",
            RejectReason::MelodicIntervalExceeded => "consecutive melody pitches above an octave",
            RejectReason::MelodyOutOfRange => "melody pitches out of range",
            RejectReason::MelodyRestExceeded => "melody rest above threshold",
            RejectReason::ChordRestExceeded => "chord rest above threshold",
        }
    }

    /// Reason tallied for a per-file pipeline error, if it is one
    pub fn from_error(err: &FilterError) -> Option<Self> {
        match err {
            FilterError::DecodeError(_) | FilterError::IoError(_) => Some(RejectReason::DecodeError),
            FilterError::WrongTrackCount(_) => Some(RejectReason::WrongTrackCount),
            FilterError::EmptyTrack(_) => Some(RejectReason::EmptyTrack),
            _ => None,
        }
    }
}

/// Diagnostic measurements; `None` where a rejection stopped the scan first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerdictMetrics {
    pub max_pitch: Option<u8>,
    pub min_pitch: Option<u8>,
    /// Fraction of melody notes outside the melody range
    pub out_of_range_ratio: Option<f64>,
    /// Melody rest time over song duration
    pub rest_ratio_melody: Option<f64>,
    /// Chord rest time over song duration
    pub rest_ratio_chords: Option<f64>,
}

/// Accept/reject decision for one sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictRecord {
    pub accepted: bool,
    pub reason: Option<RejectReason>,
    pub metrics: VerdictMetrics,
}

impl VerdictRecord {
    pub fn accept(metrics: VerdictMetrics) -> Self {
        Self {
            accepted: true,
            reason: None,
            metrics,
        }
    }

    pub fn reject(reason: RejectReason, metrics: VerdictMetrics) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
            metrics,
        }
    }
}

/// Previous-note state for sequential scans.
///
/// Starts at time zero. A step "advances" when the onset moves strictly
/// forward; rest accrues only when the release moves forward too.
#[derive(Debug, Default)]
struct ScanCursor {
    prev_start: f64,
    prev_end: f64,
    rest: f64,
}

impl ScanCursor {
    /// Consume one event and report whether its onset advanced
    fn step(&mut self, event: &NoteEvent) -> bool {
        let advanced = event.start > self.prev_start;
        if advanced && event.end > self.prev_end {
            // Overlaps would give a negative gap; they are not rest.
            self.rest += (event.start - self.prev_end).max(0.0);
        }
        self.prev_start = event.start;
        self.prev_end = event.end;
        advanced
    }
}

/// Rest time of a whole track under the scan rules
pub fn rest_time(track: &Track) -> f64 {
    let mut cursor = ScanCursor::default();
    for event in track.events() {
        cursor.step(event);
    }
    cursor.rest
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Applies rules 2-6 to an aligned sequence
#[derive(Debug, Clone)]
pub struct Validator {
    ranges: PitchRangeConfig,
    thresholds: ThresholdConfig,
}

impl Validator {
    pub fn new(ranges: PitchRangeConfig, thresholds: ThresholdConfig) -> Self {
        Self { ranges, thresholds }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.ranges.clone(), config.thresholds.clone())
    }

    /// Classify an aligned sequence
    pub fn validate(&self, sequence: &Sequence) -> VerdictRecord {
        let r = &self.ranges;
        let mut metrics = VerdictMetrics::default();
        let duration = sequence.duration();

        // Rule 2: chord range, with chord rest gathered on the same pass
        let mut chord_cursor = ScanCursor::default();
        for event in sequence.chords.events() {
            if event.pitch < r.chord_pitch_min || event.pitch > r.chord_pitch_max {
                return VerdictRecord::reject(RejectReason::ChordOutOfRange, metrics);
            }
            chord_cursor.step(event);
        }
        metrics.rest_ratio_chords = Some(ratio(chord_cursor.rest, duration));

        // Rule 3: melodic interval, with range and rest gathered on the same pass
        let mut cursor = ScanCursor::default();
        let mut prev_pitch: Option<u8> = None;
        let mut out_of_range = 0usize;
        for event in sequence.melody.events() {
            if event.pitch < r.melody_pitch_min || event.pitch > r.melody_pitch_max {
                out_of_range += 1;
            }
            if cursor.step(event) {
                if let Some(prev) = prev_pitch {
                    if prev.abs_diff(event.pitch) > r.max_melodic_interval {
                        return VerdictRecord::reject(RejectReason::MelodicIntervalExceeded, metrics);
                    }
                }
            }
            prev_pitch = Some(event.pitch);
        }

        metrics.max_pitch = sequence.melody.pitches().max();
        metrics.min_pitch = sequence.melody.pitches().min();
        let out_of_range_ratio = ratio(out_of_range as f64, sequence.melody.len() as f64);
        let melody_rest_ratio = ratio(cursor.rest, duration);
        metrics.out_of_range_ratio = Some(out_of_range_ratio);
        metrics.rest_ratio_melody = Some(melody_rest_ratio);

        let t = &self.thresholds;
        // Rule 4
        if out_of_range_ratio * 100.0 > t.out_of_range_percent {
            return VerdictRecord::reject(RejectReason::MelodyOutOfRange, metrics);
        }
        // Rule 5
        if melody_rest_ratio * 100.0 > t.rest_percent {
            return VerdictRecord::reject(RejectReason::MelodyRestExceeded, metrics);
        }
        // Rule 6
        if ratio(chord_cursor.rest, duration) * 100.0 > t.rest_percent {
            return VerdictRecord::reject(RejectReason::ChordRestExceeded, metrics);
        }

        VerdictRecord::accept(metrics)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(PitchRangeConfig::default(), ThresholdConfig::default())
    }
}
