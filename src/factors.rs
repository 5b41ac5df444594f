//! Heuristic document-quality factors. Each factor contributes a score in
//! `[0, points]` plus a breakdown entry carrying its inputs, so the
//! composite `factors_raw` is auditable after the fact.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::model::{FactorDetail, FactorsBreakdown, ScrapedDocument};
use crate::stats::normalize_range;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum ScalingMode {
    /// Score grows with the input: 0 at `min`, `points` at `max`.
    Range,
    /// Score shrinks with the input: `points` at `min`, 0 at `max`.
    PreferShort,
    /// Score grows with the input; identical shape to `Range`, kept as its
    /// own variant because the two are configured independently in
    /// practice (a corpus might prefer short URLs but long articles).
    PreferLong,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BoundedFactorConfig {
    pub enabled: bool,
    pub points: f64,
    pub min: f64,
    pub max: f64,
    pub mode: ScalingMode,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TldFactorConfig {
    pub enabled: bool,
    pub points: f64,
    pub suffixes: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthorityFactorConfig {
    pub enabled: bool,
    pub points: f64,
    pub min_hits: usize,
    pub domains: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LanguageFactorConfig {
    pub enabled: bool,
    pub points: f64,
    pub targets: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FactorsConfig {
    pub url_length: BoundedFactorConfig,
    pub content_length: BoundedFactorConfig,
    pub tld: TldFactorConfig,
    pub authority_outlinks: AuthorityFactorConfig,
    pub language: LanguageFactorConfig,
}

impl Default for FactorsConfig {
    fn default() -> Self {
        Self {
            url_length: BoundedFactorConfig {
                enabled: true,
                points: 10.0,
                min: 20.0,
                max: 150.0,
                mode: ScalingMode::PreferShort,
            },
            content_length: BoundedFactorConfig {
                enabled: true,
                points: 15.0,
                min: 50.0,
                max: 2000.0,
                mode: ScalingMode::PreferLong,
            },
            tld: TldFactorConfig {
                enabled: true,
                points: 10.0,
                suffixes: vec![".gov".into(), ".edu".into(), ".org".into()],
            },
            authority_outlinks: AuthorityFactorConfig {
                enabled: true,
                points: 10.0,
                min_hits: 2,
                domains: vec!["wikipedia.org".into(), ".gov".into(), ".edu".into()],
            },
            language: LanguageFactorConfig {
                enabled: true,
                points: 15.0,
                targets: vec!["pt".into(), "en".into()],
            },
        }
    }
}

fn bounded_score(value: f64, cfg: &BoundedFactorConfig) -> f64 {
    let norm = normalize_range(value, cfg.min, cfg.max);
    match cfg.mode {
        ScalingMode::Range | ScalingMode::PreferLong => cfg.points * norm,
        ScalingMode::PreferShort => {
            if value <= cfg.min {
                cfg.points
            } else if value >= cfg.max {
                0.0
            } else {
                cfg.points * (1.0 - norm)
            }
        }
    }
}

/// Sums the enabled factor scores into `factors_raw` for one document and
/// returns the accompanying audit breakdown.
pub fn compute_factors(doc: &ScrapedDocument, cfg: &FactorsConfig) -> (f64, FactorsBreakdown) {
    let mut raw = 0.0;
    let mut breakdown = FactorsBreakdown::new();

    let url_len = doc.url.chars().count() as f64;
    let score = if cfg.url_length.enabled { bounded_score(url_len, &cfg.url_length) } else { 0.0 };
    raw += score;
    breakdown.insert(
        "url_length".to_string(),
        FactorDetail {
            score,
            enabled: cfg.url_length.enabled,
            details: json!({
                "value": url_len,
                "min": cfg.url_length.min,
                "max": cfg.url_length.max,
            }),
        },
    );

    let content_len = doc.text_content.chars().count() as f64;
    let score = if cfg.content_length.enabled {
        bounded_score(content_len, &cfg.content_length)
    } else {
        0.0
    };
    raw += score;
    breakdown.insert(
        "content_length".to_string(),
        FactorDetail {
            score,
            enabled: cfg.content_length.enabled,
            details: json!({
                "value": content_len,
                "min": cfg.content_length.min,
                "max": cfg.content_length.max,
            }),
        },
    );

    let host = reqwest::Url::parse(&doc.url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_default();
    let matched_suffix = cfg.tld.suffixes.iter().find(|suffix| host.ends_with(suffix.as_str())).cloned();
    let score = if cfg.tld.enabled && matched_suffix.is_some() { cfg.tld.points } else { 0.0 };
    raw += score;
    breakdown.insert(
        "tld".to_string(),
        FactorDetail {
            score,
            enabled: cfg.tld.enabled,
            details: json!({ "host": host, "matched_suffix": matched_suffix }),
        },
    );

    let hits = doc
        .links_found
        .iter()
        .filter(|link| {
            reqwest::Url::parse(link)
                .ok()
                .and_then(|u| u.host_str().map(str::to_owned))
                .map(|h| cfg.authority_outlinks.domains.iter().any(|domain| h.contains(domain.as_str())))
                .unwrap_or(false)
        })
        .count();
    let score = if cfg.authority_outlinks.enabled && hits >= cfg.authority_outlinks.min_hits {
        cfg.authority_outlinks.points
    } else {
        0.0
    };
    raw += score;
    breakdown.insert(
        "authority_outlinks".to_string(),
        FactorDetail {
            score,
            enabled: cfg.authority_outlinks.enabled,
            details: json!({ "hits": hits, "min_hits": cfg.authority_outlinks.min_hits }),
        },
    );

    let url_lower = doc.url.to_lowercase();
    let url_signal = cfg.language.targets.iter().any(|target| {
        url_lower.contains(&format!("/{target}/"))
            || url_lower.contains(&format!("lang={target}"))
            || url_lower.contains(&format!("hl={target}"))
    });
    let doc_signal = cfg
        .language
        .targets
        .iter()
        .any(|target| doc.language == *target || doc.language.starts_with(target.as_str()));
    let matched = url_signal || doc_signal;
    let score = if cfg.language.enabled && matched { cfg.language.points } else { 0.0 };
    raw += score;
    breakdown.insert(
        "language".to_string(),
        FactorDetail {
            score,
            enabled: cfg.language.enabled,
            details: json!({ "matched": matched, "document_language": doc.language }),
        },
    );

    (raw, breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(url: &str, text_content: &str, language: &str, links: &[&str]) -> ScrapedDocument {
        ScrapedDocument {
            url: url.to_string(),
            title: "t".to_string(),
            text_content: text_content.to_string(),
            publish_date: None,
            language: language.to_string(),
            links_found: links.iter().map(|s| s.to_string()).collect(),
            links_count: links.len(),
            scraped_at: String::new(),
        }
    }

    #[test]
    fn short_url_scores_full_points_under_prefer_short() {
        let cfg = FactorsConfig::default();
        let short = doc("https://a.io", "", "unknown", &[]);
        let long = doc(
            "https://a.io/some/very/long/path/that/keeps/going/and/going/and/going/forever/more",
            "",
            "unknown",
            &[],
        );
        let (raw_short, _) = compute_factors(&short, &cfg);
        let (raw_long, _) = compute_factors(&long, &cfg);
        assert!(raw_short >= raw_long);
    }

    #[test]
    fn authority_requires_min_hits() {
        let cfg = FactorsConfig::default();
        let one_hit = doc("https://a.example", "", "unknown", &["https://en.wikipedia.org/x"]);
        let (_, breakdown) = compute_factors(&one_hit, &cfg);
        assert_eq!(breakdown["authority_outlinks"].score, 0.0);

        let two_hits = doc(
            "https://a.example",
            "",
            "unknown",
            &["https://en.wikipedia.org/x", "https://site.gov/y"],
        );
        let (_, breakdown) = compute_factors(&two_hits, &cfg);
        assert_eq!(breakdown["authority_outlinks"].score, cfg.authority_outlinks.points);
    }

    #[test]
    fn final_scores_are_clamped_into_0_100() {
        let cfg = FactorsConfig::default();
        let docs = [
            doc("https://a.example", &"x".repeat(3000), "pt", &[]),
            doc("https://b.example", "", "unknown", &[]),
        ];
        for d in &docs {
            let (raw, _) = compute_factors(d, &cfg);
            assert!(raw >= 0.0);
        }
    }
}
