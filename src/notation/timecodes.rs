// Timecode references in free-text notes
// `1:23`, `1:02:03`, `1:02:03:12` (frames) and `1:23.450` / `1:23,450` are recognized.

use regex::Regex;
use serde::Serialize;

use super::Note;
use crate::bareme::Bareme;
use crate::constants::{
    DEFAULT_TIMECODE_FPS, MARKER_COLOR_CATEGORY, MARKER_COLOR_CRITERION, MARKER_COLOR_GLOBAL,
    MARKER_PREVIEW_WORDS,
};

const TIMECODE_PATTERN: &str = r"\b(?:\d{1,2}:){1,3}\d{1,2}(?:[.,]\d{1,3})?\b";

/// A timecode found in a text, with its byte offset
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTimecode {
    pub raw: String,
    pub seconds: f64,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerSource {
    Global,
    Category,
    Criterion,
}

impl MarkerSource {
    fn as_str(&self) -> &'static str {
        match self {
            MarkerSource::Global => "global",
            MarkerSource::Category => "category",
            MarkerSource::Criterion => "criterion",
        }
    }
}

/// Seek marker derived from a timecode in a clip's notes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteTimecodeMarker {
    pub key: String,
    pub raw: String,
    pub label: String,
    pub seconds: f64,
    pub color: String,
    pub preview_text: String,
    pub source: MarkerSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criterion_id: Option<String>,
}

fn parse_part(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

/// Seconds for one timecode, `None` when a field is out of range
pub fn parse_timecode(raw: &str, fps: Option<f64>) -> Option<f64> {
    let normalized = raw.replace(',', ".");
    let segments: Vec<&str> = normalized.split(':').collect();

    match segments.as_slice() {
        [hours, minutes, seconds, frames] => {
            let fps = fps.filter(|f| f.is_finite() && *f > 0.0).unwrap_or(DEFAULT_TIMECODE_FPS);
            let (h, m, s, f) = (parse_part(hours)?, parse_part(minutes)?, parse_part(seconds)?, parse_part(frames)?);
            if m > 59.0 || s > 59.0 {
                return None;
            }
            Some(h * 3600.0 + m * 60.0 + s + f / fps)
        }
        [hours, minutes, seconds] => {
            let (h, m, s) = (parse_part(hours)?, parse_part(minutes)?, parse_part(seconds)?);
            if m > 59.0 || s >= 60.0 {
                return None;
            }
            Some(h * 3600.0 + m * 60.0 + s)
        }
        [minutes, seconds] => {
            let (m, s) = (parse_part(minutes)?, parse_part(seconds)?);
            if s >= 60.0 {
                return None;
            }
            Some(m * 60.0 + s)
        }
        _ => None,
    }
}

/// Every valid timecode in `text`, in order of appearance.
/// Timecodes beyond `max_seconds` (when positive) are dropped.
pub fn extract_timecodes(text: &str, max_seconds: Option<f64>, fps: Option<f64>) -> Vec<ParsedTimecode> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let Ok(re) = Regex::new(TIMECODE_PATTERN) else {
        return Vec::new();
    };
    let limit = max_seconds.filter(|m| m.is_finite() && *m > 0.0);

    re.find_iter(text)
        .filter_map(|m| {
            let seconds = parse_timecode(m.as_str(), fps)?;
            if limit.map(|max| seconds > max).unwrap_or(false) {
                return None;
            }
            Some(ParsedTimecode { raw: m.as_str().to_string(), seconds, index: m.start() })
        })
        .collect()
}

/// `m:ss.mmm`, or `h:mm:ss.mmm` past one hour
pub fn format_precise_timecode(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00.000".to_string();
    }
    let total_ms = (seconds * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    if hours > 0 {
        format!("{}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
    } else {
        format!("{}:{:02}.{:03}", minutes, secs, millis)
    }
}

struct MarkerContext<'a> {
    source: MarkerSource,
    color: String,
    category: Option<&'a str>,
    criterion_id: Option<&'a str>,
}

fn push_markers(
    out: &mut Vec<NoteTimecodeMarker>,
    text: &str,
    ctx: MarkerContext<'_>,
    max_seconds: Option<f64>,
    fps: Option<f64>,
) {
    let parsed = extract_timecodes(text, max_seconds, fps);
    for (i, item) in parsed.iter().enumerate() {
        let next_start = parsed.get(i + 1).map(|n| n.index).unwrap_or(text.len());
        let preview_text = text[item.index + item.raw.len()..next_start]
            .split_whitespace()
            .take(MARKER_PREVIEW_WORDS)
            .collect::<Vec<_>>()
            .join(" ");

        out.push(NoteTimecodeMarker {
            key: format!(
                "{}:{}:{}:{}:{}",
                ctx.source.as_str(),
                ctx.category.unwrap_or(""),
                ctx.criterion_id.unwrap_or(""),
                (item.seconds * 1000.0).round() as u64,
                item.index
            ),
            raw: item.raw.clone(),
            label: format_precise_timecode(item.seconds),
            seconds: item.seconds,
            color: ctx.color.clone(),
            preview_text,
            source: ctx.source,
            category: ctx.category.map(str::to_string),
            criterion_id: ctx.criterion_id.map(str::to_string),
        });
    }
}

/// Markers from a note's general, category and criterion texts, sorted by time
pub fn note_timecode_markers(
    note: &Note,
    bareme: Option<&Bareme>,
    max_seconds: Option<f64>,
    fps: Option<f64>,
) -> Vec<NoteTimecodeMarker> {
    let categories = bareme.map(Bareme::categories).unwrap_or_default();
    let category_color = |category: &str| -> Option<String> {
        let bareme = bareme?;
        let index = categories.iter().position(|c| c == category)?;
        Some(bareme.category_color(category, index))
    };

    let mut markers = Vec::new();
    push_markers(
        &mut markers,
        note.text_notes(),
        MarkerContext {
            source: MarkerSource::Global,
            color: MARKER_COLOR_GLOBAL.to_string(),
            category: None,
            criterion_id: None,
        },
        max_seconds,
        fps,
    );

    for (category, text) in note.category_notes() {
        let ctx = MarkerContext {
            source: MarkerSource::Category,
            color: category_color(category).unwrap_or_else(|| MARKER_COLOR_CATEGORY.to_string()),
            category: Some(category.as_str()),
            criterion_id: None,
        };
        push_markers(&mut markers, text, ctx, max_seconds, fps);
    }

    for (criterion_id, text) in note.criterion_notes() {
        let category = bareme
            .and_then(|b| b.criterion(criterion_id))
            .map(|c| c.category_label());
        let ctx = MarkerContext {
            source: MarkerSource::Criterion,
            color: category
                .and_then(|c| category_color(c))
                .unwrap_or_else(|| MARKER_COLOR_CRITERION.to_string()),
            category,
            criterion_id: Some(criterion_id.as_str()),
        };
        push_markers(&mut markers, text, ctx, max_seconds, fps);
    }

    markers.sort_by(|a, b| a.seconds.total_cmp(&b.seconds));
    markers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::NotationStore;

    #[test]
    fn test_parse_timecode_forms() {
        assert_eq!(parse_timecode("1:23", None), Some(83.0));
        assert_eq!(parse_timecode("1:02:03", None), Some(3723.0));
        assert_eq!(parse_timecode("0:00:01:15", None), Some(1.5));
        assert_eq!(parse_timecode("0:00:01:12", Some(24.0)), Some(1.5));
        assert_eq!(parse_timecode("0:12,5", None), Some(12.5));
        assert_eq!(parse_timecode("1:60", None), None);
        assert_eq!(parse_timecode("1:61:00", None), None);
    }

    #[test]
    fn test_extract_skips_invalid_and_out_of_clip() {
        let text = "intro 0:05 good sync, 1:75 nope, drop at 3:10 and 0:45.5";
        let found = extract_timecodes(text, Some(120.0), None);
        let raws: Vec<&str> = found.iter().map(|t| t.raw.as_str()).collect();
        assert_eq!(raws, vec!["0:05", "0:45.5"]);
        assert_eq!(found[1].seconds, 45.5);
        assert!(extract_timecodes("   ", None, None).is_empty());
    }

    #[test]
    fn test_format_precise_timecode() {
        assert_eq!(format_precise_timecode(83.25), "1:23.250");
        assert_eq!(format_precise_timecode(3723.0), "1:02:03.000");
        assert_eq!(format_precise_timecode(f64::NAN), "0:00.000");
    }

    #[test]
    fn test_markers_sorted_with_preview_and_colors() {
        let mut store = NotationStore::new();
        let bareme = store.current_bareme().unwrap().clone();
        let criterion = bareme.criteria()[0].clone();

        store.set_text_notes("clip", "1:00 nice drop but the ending drags on and on and on for too long 0:10 cut");
        store.set_criterion_note("clip", &criterion.id, "0:30 flash");
        store.set_category_note("clip", "Unknown", "0:20 misc");

        let note = store.get_note_for_clip("clip").unwrap();
        let markers = note_timecode_markers(note, Some(&bareme), None, None);
        let seconds: Vec<f64> = markers.iter().map(|m| m.seconds).collect();
        assert_eq!(seconds, vec![10.0, 20.0, 30.0, 60.0]);

        assert_eq!(markers[0].preview_text, "cut");
        assert_eq!(markers[3].preview_text.split(' ').count(), MARKER_PREVIEW_WORDS);
        assert_eq!(markers[1].color, MARKER_COLOR_CATEGORY);
        assert_eq!(markers[2].source, MarkerSource::Criterion);
        assert_eq!(markers[2].color, bareme.category_color(criterion.category_label(), 0));
        assert_eq!(markers[3].label, "1:00.000");
    }
}
