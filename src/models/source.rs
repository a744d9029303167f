use super::{ContentRecord, QualityVariant};
use serde::{Deserialize, Serialize};

/// Which of the three mutually exclusive video backends a content item uses.
///
/// Constructed once per content item via [`VideoSource::resolve`] and
/// immutable thereafter. The two embedded providers render as opaque iframes
/// with no inbound control channel; only `SelfHosted` is fully controllable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VideoSource {
    EmbeddedProviderA {
        reference_id: String,
    },
    EmbeddedProviderB {
        reference_id: String,
    },
    SelfHosted {
        primary_url: String,
        quality_variants: Vec<QualityVariant>,
    },
}

impl VideoSource {
    /// Decide which backend applies to a content record.
    ///
    /// Pure and total. Reference fields are checked in fixed priority order:
    /// provider A id, then provider B id, then the direct URL. Returns `None`
    /// when no reference field is present, which the orchestrator treats as a
    /// terminal "no playable source" state.
    pub fn resolve(content: &ContentRecord) -> Option<VideoSource> {
        if let Some(id) = non_empty(&content.provider_a_id) {
            return Some(VideoSource::EmbeddedProviderA { reference_id: id });
        }
        if let Some(id) = non_empty(&content.provider_b_id) {
            return Some(VideoSource::EmbeddedProviderB { reference_id: id });
        }
        if let Some(url) = non_empty(&content.direct_url) {
            return Some(VideoSource::SelfHosted {
                primary_url: url,
                quality_variants: content.quality_variants.clone(),
            });
        }
        None
    }

    /// Whether the backend accepts seek / volume / quality commands.
    pub fn is_controllable(&self) -> bool {
        matches!(self, VideoSource::SelfHosted { .. })
    }
}

fn non_empty(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ContentRecord {
        ContentRecord {
            id: "c1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn provider_a_takes_priority() {
        let mut content = record();
        content.provider_a_id = Some("a-123".to_string());
        content.provider_b_id = Some("b-456".to_string());
        content.direct_url = Some("https://cdn.example/video.mp4".to_string());

        assert_eq!(
            VideoSource::resolve(&content),
            Some(VideoSource::EmbeddedProviderA {
                reference_id: "a-123".to_string()
            })
        );
    }

    #[test]
    fn provider_b_beats_direct_url() {
        let mut content = record();
        content.provider_b_id = Some("b-456".to_string());
        content.direct_url = Some("https://cdn.example/video.mp4".to_string());

        assert_eq!(
            VideoSource::resolve(&content),
            Some(VideoSource::EmbeddedProviderB {
                reference_id: "b-456".to_string()
            })
        );
    }

    #[test]
    fn direct_url_carries_quality_variants() {
        let mut content = record();
        content.direct_url = Some("https://cdn.example/video.mp4".to_string());
        content.quality_variants = vec![QualityVariant {
            label: "720p".to_string(),
            url: "https://cdn.example/video-720.mp4".to_string(),
        }];

        match VideoSource::resolve(&content) {
            Some(VideoSource::SelfHosted {
                primary_url,
                quality_variants,
            }) => {
                assert_eq!(primary_url, "https://cdn.example/video.mp4");
                assert_eq!(quality_variants.len(), 1);
            }
            other => panic!("expected self-hosted source, got {:?}", other),
        }
    }

    #[test]
    fn no_reference_fields_resolves_to_none() {
        assert_eq!(VideoSource::resolve(&record()), None);
    }

    #[test]
    fn blank_reference_fields_are_ignored() {
        let mut content = record();
        content.provider_a_id = Some("   ".to_string());
        content.direct_url = Some("https://cdn.example/video.mp4".to_string());

        assert!(matches!(
            VideoSource::resolve(&content),
            Some(VideoSource::SelfHosted { .. })
        ));
    }

    #[test]
    fn only_self_hosted_is_controllable() {
        let a = VideoSource::EmbeddedProviderA {
            reference_id: "a".to_string(),
        };
        let hosted = VideoSource::SelfHosted {
            primary_url: "https://cdn.example/v.mp4".to_string(),
            quality_variants: vec![],
        };
        assert!(!a.is_controllable());
        assert!(hosted.is_controllable());
    }
}
