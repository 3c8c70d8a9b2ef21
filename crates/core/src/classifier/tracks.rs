//! Audio and subtitle track selection.

use crate::probe::{MediaStreamRecord, StreamKind};

use super::types::{TrackRole, TrackSelection};

const COMMENTARY_MARKER: &str = "commentary";
const SDH_MARKERS: [&str; 2] = ["sdh", "hearing impaired"];
const FORCED_MARKER: &str = "forced";

fn normalized_priority(priority: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for lang in priority {
        let lang = lang.trim().to_lowercase();
        if !lang.is_empty() && !seen.contains(&lang) {
            seen.push(lang);
        }
    }
    seen
}

fn of_kind<'a>(
    streams: &'a [MediaStreamRecord],
    kind: StreamKind,
) -> impl Iterator<Item = &'a MediaStreamRecord> {
    streams.iter().filter(move |s| s.kind == kind)
}

fn is_commentary(stream: &MediaStreamRecord) -> bool {
    stream.title_contains(COMMENTARY_MARKER)
}

fn is_sdh(stream: &MediaStreamRecord) -> bool {
    stream.hearing_impaired || SDH_MARKERS.iter().any(|m| stream.title_contains(m))
}

fn is_forced(stream: &MediaStreamRecord) -> bool {
    stream.forced || stream.title_contains(FORCED_MARKER)
}

/// Pick one audio track per priority language.
///
/// Regular tracks beat commentary tracks and the lowest index breaks ties.
/// The first language with a match becomes `Primary`, later ones
/// `Alternate`. Languages without a match are skipped.
pub fn select_audio(streams: &[MediaStreamRecord], priority: &[String]) -> Vec<TrackSelection> {
    let mut selections = Vec::new();

    for lang in normalized_priority(priority) {
        let best = of_kind(streams, StreamKind::Audio)
            .filter(|s| s.language_code() == lang)
            .min_by_key(|s| (is_commentary(s), s.index));

        if let Some(stream) = best {
            let role = if selections.is_empty() {
                TrackRole::Primary
            } else {
                TrackRole::Alternate
            };
            selections.push(TrackSelection::from_stream(stream, role));
        }
    }

    selections
}

/// Pick subtitle tracks per priority language.
///
/// One full subtitle is kept per language, regular over SDH unless
/// `prefer_sdh` flips it. The primary slot goes to the first language whose
/// pick is of the preferred kind, otherwise to the first pick at all. The
/// first forced track of each language is appended with role `Forced`.
pub fn select_subtitles(
    streams: &[MediaStreamRecord],
    priority: &[String],
    prefer_sdh: bool,
) -> Vec<TrackSelection> {
    let languages = normalized_priority(priority);

    let picks: Vec<&MediaStreamRecord> = languages
        .iter()
        .filter_map(|lang| {
            of_kind(streams, StreamKind::Subtitle)
                .filter(|s| s.language_code() == *lang && !is_forced(s))
                .min_by_key(|s| (is_sdh(s) != prefer_sdh, s.index))
        })
        .collect();

    let primary = picks
        .iter()
        .position(|s| is_sdh(s) == prefer_sdh)
        .or(if picks.is_empty() { None } else { Some(0) });

    let mut selections = Vec::with_capacity(picks.len());
    if let Some(pos) = primary {
        selections.push(TrackSelection::from_stream(picks[pos], TrackRole::Primary));
    }
    for (pos, stream) in picks.iter().enumerate() {
        if Some(pos) == primary {
            continue;
        }
        let role = if is_sdh(stream) {
            TrackRole::Sdh
        } else {
            TrackRole::Alternate
        };
        selections.push(TrackSelection::from_stream(stream, role));
    }

    for lang in &languages {
        let forced = of_kind(streams, StreamKind::Subtitle)
            .filter(|s| s.language_code() == *lang && is_forced(s))
            .min_by_key(|s| s.index);
        if let Some(stream) = forced {
            selections.push(TrackSelection::from_stream(stream, TrackRole::Forced));
        }
    }

    selections
}

/// Streams of `kind` whose language is not in `priority`, by index.
pub fn unmatched_streams<'a>(
    streams: &'a [MediaStreamRecord],
    kind: StreamKind,
    priority: &[String],
) -> Vec<&'a MediaStreamRecord> {
    let languages = normalized_priority(priority);
    let mut unmatched: Vec<_> = of_kind(streams, kind)
        .filter(|s| !languages.contains(&s.language_code()))
        .collect();
    unmatched.sort_by_key(|s| s.index);
    unmatched
}

/// Append every unmatched stream of `kind` as an `Alternate` selection.
pub fn append_unmatched(
    selections: &mut Vec<TrackSelection>,
    streams: &[MediaStreamRecord],
    kind: StreamKind,
    priority: &[String],
) {
    for stream in unmatched_streams(streams, kind, priority) {
        if selections.iter().any(|s| s.stream_index == stream.index) {
            continue;
        }
        selections.push(TrackSelection::from_stream(stream, TrackRole::Alternate));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::sample_streams;

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    fn summary(selections: &[TrackSelection]) -> Vec<(u32, &str, TrackRole)> {
        selections
            .iter()
            .map(|s| (s.stream_index, s.language.as_str(), s.role))
            .collect()
    }

    #[test]
    fn test_sample_audio_selection() {
        let audio = select_audio(&sample_streams(), &langs(&["eng", "spa"]));
        assert_eq!(
            summary(&audio),
            vec![(1, "eng", TrackRole::Primary), (2, "spa", TrackRole::Alternate)]
        );
        assert_eq!(audio[0].codec, "eac3");
    }

    #[test]
    fn test_sample_subtitles_without_sdh_preference() {
        let subs = select_subtitles(&sample_streams(), &langs(&["eng", "spa"]), false);
        assert_eq!(
            summary(&subs),
            vec![(4, "spa", TrackRole::Primary), (3, "eng", TrackRole::Sdh)]
        );
    }

    #[test]
    fn test_sample_subtitles_with_sdh_preference() {
        let subs = select_subtitles(&sample_streams(), &langs(&["eng", "spa"]), true);
        assert_eq!(
            summary(&subs),
            vec![(3, "eng", TrackRole::Primary), (4, "spa", TrackRole::Alternate)]
        );
    }

    #[test]
    fn test_audio_prefers_regular_over_commentary() {
        let streams = vec![
            MediaStreamRecord::new(1, StreamKind::Audio, "ac3")
                .with_language("eng")
                .with_title("Director's Commentary"),
            MediaStreamRecord::new(2, StreamKind::Audio, "truehd").with_language("eng"),
            MediaStreamRecord::new(3, StreamKind::Audio, "eac3").with_language("eng"),
        ];
        let audio = select_audio(&streams, &langs(&["eng"]));
        assert_eq!(summary(&audio), vec![(2, "eng", TrackRole::Primary)]);
    }

    #[test]
    fn test_audio_commentary_used_when_only_option() {
        let streams = vec![MediaStreamRecord::new(5, StreamKind::Audio, "ac3")
            .with_language("ENG")
            .with_title("Commentary")];
        let audio = select_audio(&streams, &langs(&["eng"]));
        assert_eq!(summary(&audio), vec![(5, "eng", TrackRole::Primary)]);
    }

    #[test]
    fn test_audio_missing_language_skipped() {
        let audio = select_audio(&sample_streams(), &langs(&["fre", "spa"]));
        assert_eq!(summary(&audio), vec![(2, "spa", TrackRole::Primary)]);
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(select_audio(&sample_streams(), &langs(&["jpn"])).is_empty());
        assert!(select_subtitles(&sample_streams(), &langs(&["jpn"]), false).is_empty());
        assert!(select_audio(&sample_streams(), &[]).is_empty());
    }

    #[test]
    fn test_untagged_streams_match_und() {
        let streams = vec![MediaStreamRecord::new(1, StreamKind::Audio, "aac")];
        let audio = select_audio(&streams, &langs(&["und"]));
        assert_eq!(summary(&audio), vec![(1, "und", TrackRole::Primary)]);
    }

    #[test]
    fn test_forced_subtitles_appended() {
        let streams = vec![
            MediaStreamRecord::new(2, StreamKind::Subtitle, "subrip").with_language("eng"),
            MediaStreamRecord::new(3, StreamKind::Subtitle, "subrip")
                .with_language("eng")
                .with_forced(true),
            MediaStreamRecord::new(4, StreamKind::Subtitle, "subrip")
                .with_language("eng")
                .with_title("Forced"),
        ];
        let subs = select_subtitles(&streams, &langs(&["eng"]), false);
        assert_eq!(
            summary(&subs),
            vec![(2, "eng", TrackRole::Primary), (3, "eng", TrackRole::Forced)]
        );
    }

    #[test]
    fn test_primary_appears_once() {
        let streams = vec![
            MediaStreamRecord::new(1, StreamKind::Subtitle, "subrip").with_language("eng"),
            MediaStreamRecord::new(2, StreamKind::Subtitle, "subrip").with_language("spa"),
            MediaStreamRecord::new(3, StreamKind::Subtitle, "subrip").with_language("fre"),
        ];
        let subs = select_subtitles(&streams, &langs(&["eng", "spa", "fre"]), false);
        let primaries = subs.iter().filter(|s| s.role == TrackRole::Primary).count();
        assert_eq!(primaries, 1);
        assert_eq!(subs[0].stream_index, 1);
    }

    #[test]
    fn test_all_sdh_falls_back_to_first_language() {
        let streams = vec![
            MediaStreamRecord::new(1, StreamKind::Subtitle, "subrip")
                .with_language("eng")
                .with_title("SDH"),
            MediaStreamRecord::new(2, StreamKind::Subtitle, "subrip")
                .with_language("spa")
                .with_title("Hearing Impaired"),
        ];
        let subs = select_subtitles(&streams, &langs(&["eng", "spa"]), false);
        assert_eq!(
            summary(&subs),
            vec![(1, "eng", TrackRole::Primary), (2, "spa", TrackRole::Sdh)]
        );
    }

    #[test]
    fn test_unmatched_streams() {
        let mut streams = sample_streams();
        streams.push(MediaStreamRecord::new(5, StreamKind::Audio, "aac").with_language("jpn"));
        streams.push(MediaStreamRecord::new(6, StreamKind::Audio, "aac"));

        let unmatched = unmatched_streams(&streams, StreamKind::Audio, &langs(&["eng", "spa"]));
        let indices: Vec<u32> = unmatched.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![5, 6]);

        let mut audio = select_audio(&streams, &langs(&["eng", "spa"]));
        append_unmatched(&mut audio, &streams, StreamKind::Audio, &langs(&["eng", "spa"]));
        assert_eq!(
            summary(&audio),
            vec![
                (1, "eng", TrackRole::Primary),
                (2, "spa", TrackRole::Alternate),
                (5, "jpn", TrackRole::Alternate),
                (6, "und", TrackRole::Alternate),
            ]
        );
    }

    #[test]
    fn test_selection_is_order_independent() {
        let mut reversed = sample_streams();
        reversed.reverse();
        let priority = langs(&["eng", "spa"]);
        assert_eq!(
            select_audio(&reversed, &priority),
            select_audio(&sample_streams(), &priority)
        );
        assert_eq!(
            select_subtitles(&reversed, &priority, false),
            select_subtitles(&sample_streams(), &priority, false)
        );
    }
}
