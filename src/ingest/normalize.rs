// src/ingest/normalize.rs
//! Entry normalizer: raw proxy item -> `NormalizedPost`.
//!
//! Every derivation is total. Missing or odd fields fall back to fixed
//! defaults instead of surfacing errors.

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::feed::{is_absolute_http_url, FeedConfig};
use crate::ingest::types::{NormalizedPost, Origin, RawFeedItem};

pub const UNTITLED: &str = "Untitled";
pub const FALLBACK_SLUG: &str = "untitled";
pub const MISSING_SOURCE_URL: &str = "#";

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static RE_SLUG_DROP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s-]").expect("slug drop regex"));
static RE_HYPHENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("hyphen regex"));

/// Named pattern whose first capture group is an image URL.
#[derive(Debug, Clone)]
pub struct ImageMatcher {
    pub name: &'static str,
    pub regex: Regex,
}

impl ImageMatcher {
    pub fn new(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            regex: Regex::new(pattern)?,
        })
    }

    fn find(&self, content: &str) -> Option<String> {
        self.regex
            .captures(content)
            .and_then(|c| c.get(1).or_else(|| c.get(0)))
            .map(|m| m.as_str().to_string())
    }
}

/// Ordered image heuristics; earlier entries win.
pub const DEFAULT_IMAGE_PATTERNS: &[(&str, &str)] = &[
    ("img", r#"(?i)<img[^>]+src=["']([^"']+)["']"#),
    // Shadowed by `img` in this list; only wins in lists that drop it.
    (
        "figure",
        r#"(?is)<figure[^>]*>.*?<img[^>]+src=["']([^"']+)["']"#,
    ),
    (
        "picture",
        r#"(?is)<picture[^>]*>.*?<source[^>]+srcset=["']([^"'\s,]+)"#,
    ),
    (
        "bare_url",
        r#"(?i)(https?://[^/\s"'<>()]+/[^\s"'<>()]*?\.(?:png|jpe?g|gif|webp|avif)(?:\?[^\s"'<>()]*)?)(?:$|[\s"'<>()])"#,
    ),
];

pub fn default_image_matchers() -> Vec<ImageMatcher> {
    DEFAULT_IMAGE_PATTERNS
        .iter()
        .map(|&(name, pat)| ImageMatcher::new(name, pat).expect("built-in image pattern"))
        .collect()
}

/// Host-specific rewrite that asks a CDN for a larger rendition.
#[derive(Debug, Clone)]
pub struct CdnRewrite {
    pub host: &'static str,
    pub regex: Regex,
    pub replacement: &'static str,
}

pub fn default_cdn_rewrites() -> Vec<CdnRewrite> {
    let max_seg = Regex::new(r"/max/\d+/").expect("cdn max regex");
    let fit_seg = Regex::new(r"resize:fit:\d+").expect("cdn fit regex");
    vec![
        CdnRewrite {
            host: "cdn-images-1.medium.com",
            regex: max_seg.clone(),
            replacement: "/max/1200/",
        },
        CdnRewrite {
            host: "miro.medium.com",
            regex: max_seg,
            replacement: "/max/1200/",
        },
        CdnRewrite {
            host: "miro.medium.com",
            regex: fit_seg,
            replacement: "resize:fit:1200",
        },
    ]
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    fallback_image: String,
    vocabulary: Vec<String>,
    words_per_minute: usize,
    excerpt_max_chars: usize,
    max_tags: usize,
    category_tag_limit: usize,
    image_matchers: Vec<ImageMatcher>,
    cdn_rewrites: Vec<CdnRewrite>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_config(&FeedConfig::default())
    }
}

impl Normalizer {
    pub fn from_config(cfg: &FeedConfig) -> Self {
        Self {
            fallback_image: cfg.fallback_image.clone(),
            vocabulary: cfg.tag_vocabulary.clone(),
            words_per_minute: cfg.words_per_minute.max(1),
            excerpt_max_chars: cfg.excerpt_max_chars,
            max_tags: cfg.max_tags,
            category_tag_limit: cfg.category_tag_limit,
            image_matchers: default_image_matchers(),
            cdn_rewrites: default_cdn_rewrites(),
        }
    }

    /// Replace the image heuristics (order is priority).
    pub fn with_image_matchers(mut self, matchers: Vec<ImageMatcher>) -> Self {
        self.image_matchers = matchers;
        self
    }

    pub fn fallback_image(&self) -> &str {
        &self.fallback_image
    }

    /// `now_ms` only fills `publishedAt` when the item has no date.
    pub fn normalize(&self, item: &RawFeedItem, now_ms: i64) -> NormalizedPost {
        let body = item.body();
        let title = item.title.clone().unwrap_or_else(|| UNTITLED.to_string());

        NormalizedPost {
            slug: slugify(&title),
            title,
            description: excerpt(body, self.excerpt_max_chars),
            published_at: item
                .pub_date
                .clone()
                .unwrap_or_else(|| iso_timestamp(now_ms)),
            read_time: read_time(body, self.words_per_minute),
            tags: extract_tags(
                body,
                &item.categories,
                &self.vocabulary,
                self.category_tag_limit,
                self.max_tags,
            ),
            image_url: self.image_url(item),
            source_url: item
                .link
                .clone()
                .unwrap_or_else(|| MISSING_SOURCE_URL.to_string()),
            origin: Origin::Syndicated,
            metrics: None,
        }
    }

    /// thumbnail -> enclosure -> content matchers -> fallback.
    pub fn image_url(&self, item: &RawFeedItem) -> String {
        let body = item.body();
        let explicit = [item.thumbnail.clone(), item.enclosure_url.clone()];
        let from_content = self.image_matchers.iter().map(|m| m.find(body));

        explicit
            .into_iter()
            .chain(from_content)
            .flatten()
            .find_map(|candidate| clean_image_candidate(&candidate))
            .map(|url| self.rewrite_cdn(url))
            .unwrap_or_else(|| self.fallback_image.clone())
    }

    fn rewrite_cdn(&self, url: String) -> String {
        let host = reqwest::Url::parse(&url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase));
        let Some(host) = host else {
            return url;
        };
        self.cdn_rewrites
            .iter()
            .filter(|r| r.host == host)
            .fold(url, |acc, r| {
                r.regex.replace_all(&acc, r.replacement).into_owned()
            })
    }
}

fn clean_image_candidate(raw: &str) -> Option<String> {
    let decoded = html_escape::decode_html_entities(raw.trim()).to_string();
    let url = match decoded.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => decoded,
    };
    is_absolute_http_url(&url).then_some(url)
}

/// Tags replaced by spaces, entities decoded, whitespace collapsed.
pub fn strip_markup(content: &str) -> String {
    let no_tags = RE_TAGS.replace_all(content, " ");
    let decoded = html_escape::decode_html_entities(&no_tags);
    RE_WS.replace_all(&decoded, " ").trim().to_string()
}

/// Leading sentence of the plain text, or the first `max_chars` characters
/// plus `...` when that sentence is longer.
pub fn excerpt(content: &str, max_chars: usize) -> String {
    let clean = strip_markup(content);
    let first = clean.split('.').next().unwrap_or_default();

    if first.chars().count() > max_chars {
        let mut out: String = clean.chars().take(max_chars).collect();
        out.push_str("...");
        return out;
    }
    if clean.contains('.') {
        format!("{first}.")
    } else {
        first.to_string()
    }
}

/// Whitespace-separated runs in the raw content, markup included.
pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

pub fn read_time(content: &str, words_per_minute: usize) -> String {
    let minutes = word_count(content)
        .div_ceil(words_per_minute.max(1))
        .max(1);
    format!("{minutes} min read")
}

/// Up to `category_limit` distinct categories, then vocabulary hits in order,
/// never more than `max_tags`.
pub fn extract_tags(
    content: &str,
    categories: &[String],
    vocabulary: &[String],
    category_limit: usize,
    max_tags: usize,
) -> Vec<String> {
    let mut tags: Vec<String> = Vec::with_capacity(max_tags);

    for cat in categories.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
        if tags.len() >= category_limit.min(max_tags) {
            break;
        }
        if !tags.iter().any(|t| t == cat) {
            tags.push(cat.to_string());
        }
    }

    let lower = content.to_lowercase();
    for term in vocabulary {
        if tags.len() >= max_tags {
            break;
        }
        if lower.contains(&term.to_lowercase()) && !tags.contains(term) {
            tags.push(term.clone());
        }
    }

    tags.truncate(max_tags);
    tags
}

pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let kept = RE_SLUG_DROP.replace_all(&lower, "");
    let dashed = RE_WS.replace_all(&kept, "-");
    let collapsed = RE_HYPHENS.replace_all(&dashed, "-");
    let slug = collapsed.trim_matches('-');
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

pub fn iso_timestamp(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
