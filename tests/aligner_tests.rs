//! Tests for track alignment

use melody_filter::aligner::align;
use melody_filter::{FilterError, NoteEvent, Sequence, Track, TrackRole};

fn track(notes: &[(f64, f64, u8)]) -> Track {
    notes.iter().map(|&(s, e, p)| NoteEvent::new(s, e, p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longer_melody_trimmed_to_chords_end() {
        // Melody spans [0, 10], chords span [0, 8]
        let chords = track(&[(0.0, 4.0, 48), (4.0, 8.0, 50)]);
        let mut seq = Sequence::new(
            "a.mid",
            track(&[(0.0, 3.0, 60), (3.0, 7.0, 62), (7.0, 9.0, 64), (9.0, 10.0, 65)]),
            chords.clone(),
        );

        let alignment = align(&mut seq).unwrap();

        assert_eq!(alignment.cutoff, 8.0);
        assert_eq!(alignment.trimmed, TrackRole::Melody);
        assert_eq!(alignment.removed, 1);
        assert_eq!(alignment.truncated, 1);
        assert_eq!(seq.chords, chords, "shorter track must be untouched");
        assert_eq!(seq.melody.len(), 3);
        assert_eq!(seq.melody.end_time(), Some(8.0));
        assert_eq!(seq.chords.end_time(), Some(8.0));
    }

    #[test]
    fn test_longer_chords_trimmed_melody_untouched() {
        let melody = track(&[(0.0, 2.0, 60), (2.0, 5.0, 62)]);
        let mut seq = Sequence::new(
            "b.mid",
            melody.clone(),
            track(&[(0.0, 4.0, 48), (4.0, 8.0, 50), (6.0, 9.0, 53)]),
        );

        let alignment = align(&mut seq).unwrap();

        assert_eq!(alignment.trimmed, TrackRole::Chords);
        assert_eq!(alignment.cutoff, 5.0);
        assert_eq!(seq.melody, melody);
        assert_eq!(seq.chords.len(), 2);
        assert_eq!(seq.chords.events()[1], NoteEvent::new(4.0, 5.0, 50));
    }

    #[test]
    fn test_common_end_equals_min_of_original_ends() {
        let mut seq = Sequence::new(
            "c.mid",
            track(&[(0.0, 1.5, 60), (1.5, 6.25, 62)]),
            track(&[(0.0, 3.0, 48), (3.0, 4.75, 50)]),
        );
        align(&mut seq).unwrap();

        let expected = 6.25f64.min(4.75);
        assert_eq!(seq.melody.end_time(), Some(expected));
        assert_eq!(seq.chords.end_time(), Some(expected));
    }

    #[test]
    fn test_alignment_is_idempotent() {
        let mut seq = Sequence::new(
            "d.mid",
            track(&[(0.0, 3.0, 60), (3.0, 9.0, 62)]),
            track(&[(0.0, 4.0, 48), (4.0, 7.0, 50)]),
        );
        align(&mut seq).unwrap();
        let aligned = seq.clone();

        let second = align(&mut seq).unwrap();

        assert!(second.is_noop());
        assert_eq!(seq, aligned);
    }

    #[test]
    fn test_note_starting_exactly_at_cutoff_is_removed() {
        let mut seq = Sequence::new(
            "e.mid",
            track(&[(0.0, 4.0, 60), (4.0, 6.0, 62)]),
            track(&[(0.0, 4.0, 48)]),
        );
        let alignment = align(&mut seq).unwrap();
        assert_eq!(alignment.removed, 1);
        assert_eq!(alignment.truncated, 0);
        assert_eq!(seq.melody.len(), 1);
    }

    #[test]
    fn test_empty_track_fails() {
        let mut seq = Sequence::new("f.mid", Track::default(), track(&[(0.0, 1.0, 48)]));
        match align(&mut seq) {
            Err(FilterError::EmptyTrack(role)) => assert_eq!(role, "melody"),
            other => panic!("expected EmptyTrack, got {:?}", other),
        }

        let mut seq = Sequence::new("g.mid", track(&[(0.0, 1.0, 60)]), Track::default());
        assert!(matches!(align(&mut seq), Err(FilterError::EmptyTrack(_))));
    }

    #[test]
    fn test_trimming_everything_is_an_empty_track() {
        // Chords end at 1.0 while every melody note starts later
        let mut seq = Sequence::new(
            "h.mid",
            track(&[(2.0, 3.0, 60), (3.0, 4.0, 62)]),
            track(&[(0.0, 1.0, 48)]),
        );
        assert!(matches!(align(&mut seq), Err(FilterError::EmptyTrack(_))));
    }
}
