//! The card page rendered for each tap.

use askama::Template;
use chrono::{DateTime, Utc};
use tapcard_core::config::ProfileConfig;
use tapcard_llm::Fact;

/// Everything the card template shows for one tap. Lives for one response.
#[derive(Debug, Clone, Template)]
#[template(path = "card.html")]
pub struct DisplayContext {
    /// Tap number; the counter value after this tap.
    pub session_id: u64,
    /// Render time, `YYYY-MM-DD HH:MM:SS UTC`.
    pub timestamp: String,
    /// Generated fact text.
    pub fact: String,
    /// Label of the tier that produced `fact`.
    pub source: String,
    pub name: String,
    pub title: String,
    pub email: String,
    pub linkedin: String,
    pub github: String,
    /// Link to the downloadable vCard.
    pub vcard_href: String,
}

impl DisplayContext {
    #[must_use]
    pub fn new(session_id: u64, at: DateTime<Utc>, fact: &Fact, profile: &ProfileConfig) -> Self {
        Self {
            session_id,
            timestamp: at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            fact: fact.text.clone(),
            source: fact.source.label().to_string(),
            name: profile.name.clone(),
            title: profile.title.clone(),
            email: profile.email.clone(),
            linkedin: profile.linkedin.clone(),
            github: profile.github.clone(),
            vcard_href: format!("/static/{}", profile.vcard_file),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tapcard_llm::{FactSource, ModelTier};

    use super::*;

    fn fact(text: &str) -> Fact {
        Fact {
            text: text.into(),
            source: FactSource::Model {
                tier: ModelTier::Primary,
                label: "Gemini 2.5 Flash".into(),
            },
            failures: Vec::new(),
        }
    }

    #[test]
    fn timestamp_format() {
        let at = Utc.with_ymd_and_hms(2025, 11, 8, 9, 5, 3).single().expect("valid time");
        let ctx = DisplayContext::new(7, at, &fact("Fact A"), &ProfileConfig::default());
        assert_eq!(ctx.timestamp, "2025-11-08 09:05:03 UTC");
        assert_eq!(ctx.vcard_href, "/static/victor_loza.vcf");
    }

    #[test]
    fn renders_every_field() {
        let ctx = DisplayContext::new(42, Utc::now(), &fact("Fact A"), &ProfileConfig::default());
        let html = ctx.render().expect("render");
        assert!(html.contains(r#"data-session-id="42""#));
        assert!(html.contains("Fact A"));
        assert!(html.contains("Gemini 2.5 Flash"));
        assert!(html.contains("Victor Loza"));
        assert!(html.contains(r#"href="&#x2f;static&#x2f;victor_loza.vcf""#));
        assert!(html.contains("mailto:Loza.Victor@outlook.com"));
    }

    #[test]
    fn profile_links_stay_inside_attributes() {
        let profile = ProfileConfig {
            linkedin: r#"https://example.com/"onmouseover="alert(1)"#.into(),
            ..ProfileConfig::default()
        };
        let html = DisplayContext::new(1, Utc::now(), &fact("Fact A"), &profile)
            .render()
            .expect("render");
        assert!(html.contains("&quot;onmouseover=&quot;alert(1)"));
        assert!(!html.contains(r#""onmouseover=""#));
    }

    #[test]
    fn fact_text_is_escaped() {
        let ctx = DisplayContext::new(
            1,
            Utc::now(),
            &fact("<script>alert(1)</script>"),
            &ProfileConfig::default(),
        );
        let html = ctx.render().expect("render");
        assert!(html.contains("&lt;script&gt;alert(1)"));
        assert!(!html.contains("<script>alert"));
    }
}
