//! Tests for the acceptance rules

use melody_filter::aligner::align;
use melody_filter::config::{PitchRangeConfig, ThresholdConfig};
use melody_filter::validator::{rest_time, VerdictMetrics};
use melody_filter::{NoteEvent, RejectReason, Sequence, Track, Validator};

fn track(notes: &[(f64, f64, u8)]) -> Track {
    notes.iter().map(|&(s, e, p)| NoteEvent::new(s, e, p)).collect()
}

fn aligned(melody: &[(f64, f64, u8)], chords: &[(f64, f64, u8)]) -> Sequence {
    let mut seq = Sequence::new("test.mid", track(melody), track(chords));
    align(&mut seq).unwrap();
    seq
}

fn validator_with(thresholds: ThresholdConfig) -> Validator {
    Validator::new(PitchRangeConfig::default(), thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_sequence_accepted() {
        let seq = aligned(
            &[(0.0, 1.0, 60), (1.0, 2.0, 64), (2.0, 3.0, 67), (3.0, 4.0, 72)],
            &[(0.0, 2.0, 48), (0.0, 2.0, 52), (2.0, 4.0, 53), (2.0, 4.0, 57)],
        );
        let verdict = Validator::default().validate(&seq);

        assert!(verdict.accepted);
        assert_eq!(verdict.reason, None);
        assert_eq!(verdict.metrics.max_pitch, Some(72));
        assert_eq!(verdict.metrics.min_pitch, Some(60));
        assert_eq!(verdict.metrics.out_of_range_ratio, Some(0.0));
        assert_eq!(verdict.metrics.rest_ratio_melody, Some(0.0));
        assert_eq!(verdict.metrics.rest_ratio_chords, Some(0.0));
    }

    #[test]
    fn test_chord_below_piano_range_rejected() {
        let seq = aligned(&[(0.0, 2.0, 60)], &[(0.0, 2.0, 15)]);
        let verdict = Validator::default().validate(&seq);

        assert!(!verdict.accepted);
        assert_eq!(verdict.reason, Some(RejectReason::ChordOutOfRange));
        assert_eq!(verdict.metrics, VerdictMetrics::default());
    }

    #[test]
    fn test_chord_above_piano_range_rejected() {
        let seq = aligned(&[(0.0, 2.0, 60)], &[(0.0, 2.0, 109)]);
        let verdict = Validator::default().validate(&seq);
        assert_eq!(verdict.reason, Some(RejectReason::ChordOutOfRange));
    }

    #[test]
    fn test_chord_range_wins_over_rest_rule() {
        // Melody is mostly silence and the chords are out of range
        let seq = aligned(&[(0.0, 1.0, 60), (9.0, 10.0, 62)], &[(0.0, 10.0, 15)]);
        let verdict = Validator::default().validate(&seq);
        assert_eq!(verdict.reason, Some(RejectReason::ChordOutOfRange));
    }

    #[test]
    fn test_interval_above_octave_rejected() {
        let seq = aligned(&[(0.0, 1.0, 40), (1.0, 2.0, 55)], &[(0.0, 2.0, 48)]);
        let verdict = Validator::default().validate(&seq);

        assert_eq!(verdict.reason, Some(RejectReason::MelodicIntervalExceeded));
        // Chords were fully scanned, melody was not
        assert_eq!(verdict.metrics.rest_ratio_chords, Some(0.0));
        assert_eq!(verdict.metrics.rest_ratio_melody, None);
        assert_eq!(verdict.metrics.max_pitch, None);
    }

    #[test]
    fn test_interval_of_exactly_an_octave_allowed() {
        let seq = aligned(&[(0.0, 1.0, 60), (1.0, 2.0, 72)], &[(0.0, 2.0, 48)]);
        let verdict = Validator::default().validate(&seq);
        assert!(verdict.accepted);
    }

    #[test]
    fn test_melody_out_of_range_rejected_by_default() {
        let seq = aligned(
            &[(0.0, 1.0, 64), (1.0, 2.0, 68), (2.0, 3.0, 72), (3.0, 4.0, 76)],
            &[(0.0, 4.0, 48)],
        );
        let verdict = Validator::default().validate(&seq);

        assert_eq!(verdict.reason, Some(RejectReason::MelodyOutOfRange));
        assert_eq!(verdict.metrics.out_of_range_ratio, Some(0.25));
    }

    #[test]
    fn test_melody_out_of_range_within_threshold_accepted() {
        let seq = aligned(
            &[(0.0, 1.0, 64), (1.0, 2.0, 68), (2.0, 3.0, 72), (3.0, 4.0, 76)],
            &[(0.0, 4.0, 48)],
        );
        let validator = validator_with(ThresholdConfig {
            out_of_range_percent: 30.0,
            ..ThresholdConfig::default()
        });
        assert!(validator.validate(&seq).accepted);
    }

    #[test]
    fn test_melody_rest_above_threshold_rejected() {
        // 3s of a 10s song is silent: 30%
        let seq = aligned(&[(0.0, 3.0, 60), (6.0, 10.0, 62)], &[(0.0, 10.0, 48)]);
        let verdict = Validator::default().validate(&seq);

        assert_eq!(verdict.reason, Some(RejectReason::MelodyRestExceeded));
        let ratio = verdict.metrics.rest_ratio_melody.unwrap();
        assert!((ratio - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_melody_rest_exactly_at_threshold_accepted() {
        // 1s of a 4s song is silent: exactly 25%
        let seq = aligned(&[(0.0, 1.0, 60), (2.0, 4.0, 62)], &[(0.0, 4.0, 48)]);
        let verdict = Validator::default().validate(&seq);

        assert!(verdict.accepted, "25% must pass a 25% threshold: {:?}", verdict);
        assert_eq!(verdict.metrics.rest_ratio_melody, Some(0.25));
    }

    #[test]
    fn test_rest_threshold_is_configurable() {
        let seq = aligned(&[(0.0, 3.0, 60), (6.0, 10.0, 62)], &[(0.0, 10.0, 48)]);
        let validator = validator_with(ThresholdConfig {
            rest_percent: 35.0,
            ..ThresholdConfig::default()
        });
        assert!(validator.validate(&seq).accepted);
    }

    #[test]
    fn test_chord_rest_above_threshold_rejected() {
        let seq = aligned(&[(0.0, 4.0, 60)], &[(0.0, 1.0, 48), (3.0, 4.0, 50)]);
        let verdict = Validator::default().validate(&seq);

        assert_eq!(verdict.reason, Some(RejectReason::ChordRestExceeded));
        assert_eq!(verdict.metrics.rest_ratio_chords, Some(0.5));
        assert_eq!(verdict.metrics.rest_ratio_melody, Some(0.0));
    }

    #[test]
    fn test_melody_rest_reported_before_chord_rest() {
        let seq = aligned(&[(0.0, 1.0, 60), (3.0, 4.0, 62)], &[(0.0, 1.0, 48), (3.0, 4.0, 50)]);
        let verdict = Validator::default().validate(&seq);
        assert_eq!(verdict.reason, Some(RejectReason::MelodyRestExceeded));
    }

    #[test]
    fn test_duration_uses_trimmed_melody_end() {
        // Melody runs to 12s but chords stop at 8s; after trimming the
        // 2s melody gap is 25% of 8s, not 1/6 of 12s.
        let seq = aligned(
            &[(0.0, 2.0, 60), (4.0, 12.0, 62)],
            &[(0.0, 8.0, 48)],
        );
        assert_eq!(seq.duration(), 8.0);
        let verdict = Validator::default().validate(&seq);
        assert_eq!(verdict.metrics.rest_ratio_melody, Some(0.25));
        assert!(verdict.accepted);
    }

    #[test]
    fn test_rest_time_skips_repeated_onsets() {
        let chords = track(&[
            (0.0, 1.0, 48),
            (0.0, 1.0, 52),
            (0.0, 1.0, 55),
            (2.0, 3.0, 50),
            (2.0, 3.0, 53),
        ]);
        assert!((rest_time(&chords) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rest_time_follows_last_note_not_longest() {
        // The short note inside the long one sets the release the next
        // gap is measured from.
        let melody = track(&[(0.0, 10.0, 60), (2.0, 3.0, 62), (5.0, 6.0, 64)]);
        assert!((rest_time(&melody) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_nested_note_does_not_hide_following_gap() {
        // Alignment cuts the long note to 6s; the 3s..5s gap is 1/3 of the song
        let seq = aligned(
            &[(0.0, 10.0, 60), (2.0, 3.0, 62), (5.0, 6.0, 64)],
            &[(0.0, 6.0, 48)],
        );
        let verdict = Validator::default().validate(&seq);

        assert_eq!(verdict.reason, Some(RejectReason::MelodyRestExceeded));
        let ratio = verdict.metrics.rest_ratio_melody.unwrap();
        assert!((ratio - 2.0 / 6.0).abs() < 1e-9);
    }
}
