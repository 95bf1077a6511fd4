//! Content negotiation between the JSON and HTML representations.

use std::fmt;

use crate::error::{Error, Result};

/// A response representation this service can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Representation {
    /// Structured data (`application/json`).
    Json,
    /// Human-readable page (`text/html`).
    Html,
}

impl Representation {
    /// Supported representations in server preference order.
    pub const SUPPORTED: [Self; 2] = [Self::Json, Self::Html];

    /// The media type of this representation.
    #[must_use]
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Html => "text/html",
        }
    }

    /// The `Content-Type` header value to send.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Html => "text/html; charset=utf-8",
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.media_type())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct MediaRange {
    kind: String,
    subtype: String,
    quality: f32,
}

impl MediaRange {
    fn parse(item: &str) -> Option<Self> {
        let mut parts = item.split(';');
        let (kind, subtype) = parts.next()?.trim().split_once('/')?;
        let (kind, subtype) = (kind.trim(), subtype.trim());
        if kind.is_empty() || subtype.is_empty() {
            return None;
        }

        let mut quality = 1.0;
        for param in parts {
            if let Some((name, value)) = param.split_once('=') {
                if name.trim().eq_ignore_ascii_case("q") {
                    quality = value
                        .trim()
                        .parse::<f32>()
                        .ok()
                        .filter(|q| q.is_finite())
                        .map_or(0.0, |q| q.clamp(0.0, 1.0));
                }
            }
        }

        Some(Self {
            kind: kind.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            quality,
        })
    }

    /// 0 for `*/*`, 1 for `type/*`, 2 for `type/subtype`.
    fn specificity(&self) -> u8 {
        u8::from(self.kind != "*") + u8::from(self.subtype != "*")
    }

    fn matches(&self, media_type: &str) -> bool {
        let Some((kind, subtype)) = media_type.split_once('/') else {
            return false;
        };
        (self.kind == "*" || self.kind == kind) && (self.subtype == "*" || self.subtype == subtype)
    }
}

/// A parsed `Accept` header.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptHeader {
    /// Most specific first, then highest quality.
    ranges: Vec<MediaRange>,
}

impl AcceptHeader {
    /// Parse an `Accept` header value. Unparseable entries are ignored.
    #[must_use]
    pub fn parse(header: &str) -> Self {
        let mut ranges: Vec<MediaRange> = header.split(',').filter_map(MediaRange::parse).collect();
        ranges.sort_by(|a, b| {
            b.specificity()
                .cmp(&a.specificity())
                .then(b.quality.total_cmp(&a.quality))
        });
        Self { ranges }
    }

    /// The header a client implicitly sends when it sends none.
    #[must_use]
    pub fn any() -> Self {
        Self::parse("*/*")
    }

    fn best_range(&self, media_type: &str) -> Option<&MediaRange> {
        self.ranges.iter().find(|range| range.matches(media_type))
    }

    /// The client's weight for `media_type`; 0 when nothing matches.
    #[must_use]
    pub fn quality(&self, media_type: &str) -> f32 {
        self.best_range(media_type).map_or(0.0, |range| range.quality)
    }

    /// The candidate the client prefers: highest weight, then the most
    /// specific matching range, then the candidate listed first.
    #[must_use]
    pub fn best_match(&self, candidates: &[Representation]) -> Option<Representation> {
        let mut best: Option<(Representation, f32, u8)> = None;
        for &candidate in candidates {
            let Some(range) = self.best_range(candidate.media_type()) else {
                continue;
            };
            if range.quality <= 0.0 {
                continue;
            }
            let better = best.map_or(true, |(_, quality, specificity)| {
                range
                    .quality
                    .total_cmp(&quality)
                    .then(range.specificity().cmp(&specificity))
                    .is_gt()
            });
            if better {
                best = Some((candidate, range.quality, range.specificity()));
            }
        }
        best.map(|(candidate, _, _)| candidate)
    }
}

/// Pick the representation for a response.
///
/// The preferred candidate is only used if its weight is at least the
/// other candidate's weight; otherwise nothing is acceptable. A missing or
/// blank header accepts anything.
///
/// # Errors
///
/// Returns [`Error::NotAcceptable`] if neither representation qualifies.
pub fn negotiate(accept: Option<&str>) -> Result<Representation> {
    let accept = match accept.map(str::trim) {
        Some(value) if !value.is_empty() => AcceptHeader::parse(value),
        _ => AcceptHeader::any(),
    };

    let json = accept.quality(Representation::Json.media_type());
    let html = accept.quality(Representation::Html.media_type());

    match accept.best_match(&Representation::SUPPORTED) {
        Some(Representation::Html) if html >= json => Ok(Representation::Html),
        Some(Representation::Json) if json >= html => Ok(Representation::Json),
        _ => Err(Error::NotAcceptable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_header_prefers_json() {
        assert_eq!(negotiate(None).unwrap(), Representation::Json);
        assert_eq!(negotiate(Some("  ")).unwrap(), Representation::Json);
    }

    #[test]
    fn test_wildcard_prefers_json() {
        assert_eq!(negotiate(Some("*/*")).unwrap(), Representation::Json);
    }

    #[test]
    fn test_html_only() {
        assert_eq!(negotiate(Some("text/html")).unwrap(), Representation::Html);
    }

    #[test]
    fn test_json_only() {
        assert_eq!(
            negotiate(Some("application/json")).unwrap(),
            Representation::Json
        );
    }

    #[test]
    fn test_browser_accept_header() {
        let accept = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
        assert_eq!(negotiate(Some(accept)).unwrap(), Representation::Html);
    }

    #[test]
    fn test_weights_decide() {
        assert_eq!(
            negotiate(Some("application/json;q=0.4, text/html;q=0.5")).unwrap(),
            Representation::Html
        );
        assert_eq!(
            negotiate(Some("application/json;q=0.6, text/html;q=0.5")).unwrap(),
            Representation::Json
        );
    }

    #[test]
    fn test_tie_goes_to_server_order() {
        assert_eq!(
            negotiate(Some("text/html, application/json")).unwrap(),
            Representation::Json
        );
    }

    #[test]
    fn test_neither_accepted() {
        assert!(matches!(
            negotiate(Some("image/png")),
            Err(Error::NotAcceptable)
        ));
        assert!(matches!(
            negotiate(Some("application/xml, text/plain")),
            Err(Error::NotAcceptable)
        ));
    }

    #[test]
    fn test_zero_quality_excludes() {
        assert!(matches!(
            negotiate(Some("application/json;q=0, text/html;q=0")),
            Err(Error::NotAcceptable)
        ));
        assert_eq!(
            negotiate(Some("*/*, application/json;q=0")).unwrap(),
            Representation::Html
        );
    }

    #[test]
    fn test_type_wildcard() {
        assert_eq!(negotiate(Some("text/*")).unwrap(), Representation::Html);
        assert_eq!(
            negotiate(Some("application/*")).unwrap(),
            Representation::Json
        );
    }

    #[test]
    fn test_specific_range_overrides_wildcard() {
        let accept = AcceptHeader::parse("*/*;q=0.1, text/html;q=0.7");
        assert!((accept.quality("text/html") - 0.7).abs() < f32::EPSILON);
        assert!((accept.quality("application/json") - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_invalid_quality_is_zero() {
        let accept = AcceptHeader::parse("text/html;q=abc");
        assert!(accept.quality("text/html").abs() < f32::EPSILON);
    }

    #[test]
    fn test_quality_is_clamped() {
        let accept = AcceptHeader::parse("text/html;q=7");
        assert!((accept.quality("text/html") - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_garbage_entries_ignored() {
        let accept = AcceptHeader::parse("garbage, /, text/html");
        assert_eq!(
            accept.best_match(&Representation::SUPPORTED),
            Some(Representation::Html)
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(negotiate(Some("TEXT/HTML")).unwrap(), Representation::Html);
    }

    #[test]
    fn test_representation_display() {
        assert_eq!(Representation::Json.to_string(), "application/json");
        assert_eq!(
            Representation::Html.content_type(),
            "text/html; charset=utf-8"
        );
    }
}
