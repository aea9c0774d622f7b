use serde::{Deserialize, Serialize};

/// Object-storage scheme the pipeline writes video references with.
const GCS_SCHEME: &str = "gs://";

/// Public HTTPS endpoint serving the same objects.
const GCS_PUBLIC_BASE: &str = "https://storage.googleapis.com/";

/// One detected shot, as emitted by the upstream pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Free-form shot label (normalized later against the shot taxonomy).
    pub label: String,
    /// Stable per-player identifier.
    pub track_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t0: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Reference to the rendered overlay video.
///
/// The pipeline writes either `{"gcs_uri": "gs://..."}` or a bare string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VideoRef {
    Gcs { gcs_uri: String },
    Url(String),
}

impl VideoRef {
    fn raw(&self) -> &str {
        match self {
            Self::Gcs { gcs_uri } => gcs_uri,
            Self::Url(url) => url,
        }
    }

    /// Playable URL for this reference, or `None` when it is blank.
    pub fn playable_url(&self) -> Option<String> {
        let raw = self.raw().trim();
        if raw.is_empty() {
            return None;
        }
        match raw.strip_prefix(GCS_SCHEME) {
            Some(rest) => Some(format!("{GCS_PUBLIC_BASE}{rest}")),
            None => Some(raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default, alias = "video", skip_serializing_if = "Option::is_none")]
    pub overlay_video: Option<VideoRef>,
}

/// The pre-computed analysis result for one match.
///
/// Loaded once per session and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(rename = "aiSummary", default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(rename = "aiVerified", default, skip_serializing_if = "Option::is_none")]
    pub ai_verified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Outputs>,
}

impl MatchResult {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Playable overlay video URL, if the result carries one.
    pub fn video_url(&self) -> Option<String> {
        self.outputs
            .as_ref()
            .and_then(|o| o.overlay_video.as_ref())
            .and_then(VideoRef::playable_url)
    }

    /// AI summary text, treating blank strings as absent.
    pub fn summary_text(&self) -> Option<&str> {
        non_blank(self.ai_summary.as_deref())
    }

    pub fn verified_text(&self) -> Option<&str> {
        non_blank(self.ai_verified.as_deref())
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_result() {
        let json = r#"{
            "events": [
                {"label": "smash", "track_id": 2, "t0": 150, "t1": 160, "score": 0.9},
                {"label": "net_shot", "track_id": 1, "t0": 210}
            ],
            "aiSummary": "**Player 1** dominated the net.",
            "outputs": {"overlay_video": {"gcs_uri": "gs://bucket/match/overlay.mp4"}}
        }"#;
        let result = MatchResult::from_json(json).unwrap();
        assert_eq!(result.events.len(), 2);
        assert_eq!(result.events[0].t1, Some(160.0));
        assert_eq!(result.events[1].score, None);
        assert_eq!(result.summary_text(), Some("**Player 1** dominated the net."));
        assert_eq!(
            result.video_url().as_deref(),
            Some("https://storage.googleapis.com/bucket/match/overlay.mp4")
        );
    }

    #[test]
    fn missing_events_is_empty() {
        let result = MatchResult::from_json(r#"{"aiSummary": "hi"}"#).unwrap();
        assert!(result.events.is_empty());
        assert_eq!(result.video_url(), None);
    }

    #[test]
    fn bare_string_video_ref() {
        let json = r#"{"events": [], "outputs": {"overlay_video": "gs://b/v.mp4"}}"#;
        let result = MatchResult::from_json(json).unwrap();
        assert_eq!(
            result.video_url().as_deref(),
            Some("https://storage.googleapis.com/b/v.mp4")
        );
    }

    #[test]
    fn https_video_ref_passes_through() {
        let r = VideoRef::Url("https://cdn.example.com/v.mp4".into());
        assert_eq!(r.playable_url().as_deref(), Some("https://cdn.example.com/v.mp4"));
    }

    #[test]
    fn blank_video_ref_is_no_video() {
        assert_eq!(VideoRef::Url("  ".into()).playable_url(), None);
        assert_eq!(VideoRef::Gcs { gcs_uri: String::new() }.playable_url(), None);
    }

    #[test]
    fn blank_summary_is_absent() {
        let result = MatchResult {
            ai_summary: Some("   \n".into()),
            ..Default::default()
        };
        assert_eq!(result.summary_text(), None);
    }

    #[test]
    fn shapeless_json_is_error() {
        assert!(MatchResult::from_json("[1, 2, 3]").is_err());
        assert!(MatchResult::from_json("{not json").is_err());
    }
}
