//! Standard MIDI File decoding and encoding
//!
//! Decoding flattens an SMF into logical tracks, one per (file track,
//! channel) pair that carries notes, with times in seconds resolved through
//! the file's tempo map. Encoding writes an aligned sequence back as a
//! format 1 file: a conductor track, then melody and chords.

use crate::config::OutputConfig;
use crate::error::{FilterError, Result as FilterResult};
use crate::sequence::{NoteEvent, Sequence, Track, TrackRole};
use midly::num::{u15, u24, u28, u4, u7};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind,
};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Tempo assumed until the first tempo event (120 BPM)
const DEFAULT_TEMPO_US: u32 = 500_000;

/// Read and decode a sequence file into its note-bearing tracks
pub fn read_tracks<P: AsRef<Path>>(path: P) -> FilterResult<Vec<Track>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| FilterError::DecodeError(format!("{}: {}", path.display(), e)))?;
    decode_tracks(&bytes)
}

/// Read a file and build a two-track sequence named after it
pub fn read_sequence<P: AsRef<Path>>(path: P) -> FilterResult<Sequence> {
    let path = path.as_ref();
    let tracks = read_tracks(path)?;
    Sequence::from_tracks(file_name(path), tracks)
}

/// Base file name of `path`, lossily converted
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Decode SMF bytes into logical tracks
pub fn decode_tracks(bytes: &[u8]) -> FilterResult<Vec<Track>> {
    let smf = Smf::parse(bytes)?;
    let ticks_per_quarter = match smf.header.timing {
        Timing::Metrical(tpq) if tpq.as_int() > 0 => tpq.as_int(),
        Timing::Metrical(_) => {
            return Err(FilterError::DecodeError("zero ticks per quarter".into()));
        }
        Timing::Timecode(..) => {
            return Err(FilterError::DecodeError(
                "SMPTE timecode files are not supported".into(),
            ));
        }
    };

    let tempo_map = TempoMap::from_smf(&smf, ticks_per_quarter);

    let mut tracks = Vec::new();
    for events in &smf.tracks {
        // BTreeMap keeps channels in ascending order
        let mut by_channel: BTreeMap<u8, Vec<NoteEvent>> = BTreeMap::new();
        for note in pair_notes(events) {
            by_channel.entry(note.channel).or_default().push(NoteEvent::new(
                tempo_map.seconds(note.start_tick),
                tempo_map.seconds(note.end_tick),
                note.key,
            ));
        }
        tracks.extend(by_channel.into_values().map(Track::new));
    }

    Ok(tracks)
}

/// A note in ticks, before tempo resolution
#[derive(Debug, Clone, Copy)]
struct TickNote {
    channel: u8,
    key: u8,
    start_tick: u64,
    end_tick: u64,
}

/// Match note-ons with note-offs per (channel, key), first in first out.
/// Notes left sounding are closed at the track's final tick.
fn pair_notes(events: &[TrackEvent]) -> Vec<TickNote> {
    let mut open: HashMap<(u8, u8), VecDeque<u64>> = HashMap::new();
    let mut notes = Vec::new();
    let mut tick: u64 = 0;

    for event in events {
        tick += u64::from(event.delta.as_int());
        let TrackEventKind::Midi { channel, message } = event.kind else {
            continue;
        };
        let channel = channel.as_int();
        match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                open.entry((channel, key.as_int())).or_default().push_back(tick);
            }
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                let key = key.as_int();
                if let Some(start_tick) = open.get_mut(&(channel, key)).and_then(|q| q.pop_front()) {
                    notes.push(TickNote {
                        channel,
                        key,
                        start_tick,
                        end_tick: tick,
                    });
                }
            }
            _ => {}
        }
    }

    for ((channel, key), starts) in open {
        for start_tick in starts {
            notes.push(TickNote {
                channel,
                key,
                start_tick,
                end_tick: tick,
            });
        }
    }

    notes
}

/// Piecewise tick-to-seconds conversion
#[derive(Debug)]
struct TempoMap {
    ticks_per_quarter: f64,
    /// (tick, seconds at tick, microseconds per quarter from tick on)
    segments: Vec<(u64, f64, u32)>,
}

impl TempoMap {
    fn from_smf(smf: &Smf, ticks_per_quarter: u16) -> Self {
        let mut changes: Vec<(u64, u32)> = Vec::new();
        for events in &smf.tracks {
            let mut tick: u64 = 0;
            for event in events {
                tick += u64::from(event.delta.as_int());
                if let TrackEventKind::Meta(MetaMessage::Tempo(us)) = event.kind {
                    changes.push((tick, us.as_int()));
                }
            }
        }
        // Stable sort: a later event at the same tick wins
        changes.sort_by_key(|&(tick, _)| tick);
        Self::new(ticks_per_quarter, &changes)
    }

    fn new(ticks_per_quarter: u16, changes: &[(u64, u32)]) -> Self {
        let tpq = f64::from(ticks_per_quarter);
        let mut segments = vec![(0u64, 0.0f64, DEFAULT_TEMPO_US)];
        for &(tick, us) in changes {
            let (seg_tick, seg_secs, seg_us) = *segments.last().unwrap_or(&(0, 0.0, DEFAULT_TEMPO_US));
            let secs = seg_secs + (tick - seg_tick) as f64 * f64::from(seg_us) / 1e6 / tpq;
            if seg_tick == tick {
                segments.pop();
            }
            segments.push((tick, secs, us));
        }
        Self {
            ticks_per_quarter: tpq,
            segments,
        }
    }

    fn seconds(&self, tick: u64) -> f64 {
        let idx = self.segments.partition_point(|&(t, _, _)| t <= tick);
        let (seg_tick, seg_secs, seg_us) = self.segments[idx.saturating_sub(1)];
        seg_secs + (tick - seg_tick) as f64 * f64::from(seg_us) / 1e6 / self.ticks_per_quarter
    }
}

/// Encode a sequence and write it to `path`.
///
/// The file handle is scoped to this call; any failure is a `WriteError`.
pub fn write_sequence<P: AsRef<Path>>(
    sequence: &Sequence,
    path: P,
    output: &OutputConfig,
) -> FilterResult<()> {
    let path = path.as_ref();
    let smf = sequence_to_smf(sequence, output)?;
    let write = || -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        smf.write_std(&mut writer)?;
        writer.flush()
    };
    write().map_err(|e| FilterError::WriteError(format!("{}: {}", path.display(), e)))
}

/// Encode a sequence to SMF bytes
pub fn encode_sequence(sequence: &Sequence, output: &OutputConfig) -> FilterResult<Vec<u8>> {
    let smf = sequence_to_smf(sequence, output)?;
    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)
        .map_err(|e| FilterError::WriteError(format!("SMF encode failed: {}", e)))?;
    Ok(bytes)
}

/// Build an in-memory SMF for a sequence
fn sequence_to_smf(sequence: &Sequence, output: &OutputConfig) -> FilterResult<Smf<'static>> {
    let tempo_us = (60_000_000.0 / output.tempo_bpm).round();
    if !(1.0..=f64::from(0x00FF_FFFFu32)).contains(&tempo_us) {
        return Err(FilterError::WriteError(format!(
            "tempo {} BPM cannot be encoded",
            output.tempo_bpm
        )));
    }
    let ticks_per_second = f64::from(output.ticks_per_quarter) * 1e6 / tempo_us;

    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(output.ticks_per_quarter)),
    ));

    // Track 0: tempo track
    smf.tracks.push(vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_us as u32))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ]);

    for role in TrackRole::ALL {
        let channel = u4::new(role.index() as u8);
        let name: &'static [u8] = match role {
            TrackRole::Melody => b"Melody",
            TrackRole::Chords => b"Chords",
        };
        smf.tracks.push(encode_track(
            sequence.track(role),
            name,
            channel,
            ticks_per_second,
            output,
        ));
    }

    Ok(smf)
}

/// Event ordering at equal ticks: releases first, then onsets, then the
/// releases of zero-length notes that began on that same tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    Release,
    Onset,
    ZeroLengthRelease,
}

fn encode_track(
    track: &Track,
    name: &'static [u8],
    channel: u4,
    ticks_per_second: f64,
    output: &OutputConfig,
) -> Vec<TrackEvent<'static>> {
    let to_tick = |secs: f64| (secs * ticks_per_second).round().max(0.0) as u32;

    let mut timeline: Vec<(u32, Phase, u8)> = Vec::with_capacity(track.len() * 2);
    for note in track.events() {
        let key = note.pitch.min(127);
        let on = to_tick(note.start);
        let off = to_tick(note.end).max(on);
        let release = if off == on {
            Phase::ZeroLengthRelease
        } else {
            Phase::Release
        };
        timeline.push((on, Phase::Onset, key));
        timeline.push((off, release, key));
    }
    timeline.sort();

    let mut events = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(name)),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(output.program),
                },
            },
        },
    ];

    let mut last_tick = 0u32;
    for (tick, phase, key) in timeline {
        let message = match phase {
            Phase::Onset => MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(output.velocity),
            },
            Phase::Release | Phase::ZeroLengthRelease => MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            },
        };
        events.push(TrackEvent {
            delta: u28::new(tick - last_tick),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = tick;
    }

    events.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    events
}
