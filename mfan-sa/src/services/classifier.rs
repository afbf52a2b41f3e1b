//! Content type classifier
//!
//! Maps a [`RawResultItem`] to a [`ClassifiedResult`] through a fixed chain
//! of rules; the first rule that yields a classification wins:
//!
//! 1. Upstream type tag naming a known [`ContentType`] (confidence 1.0, api)
//! 2. Reserved live / short-drama source key (0.9)
//! 3. `type_name` keyword table (0.9 or 0.8, first row matched)
//! 4. Title keyword table (0.7), only when step 3 gave less than 0.8
//! 5. Episode count (0.3), only when confidence is still below 0.5
//! 6. Fallback to `tv` (0.1, fallback)
//!
//! Keyword tables are ordered `(keywords, type, weight)` rows evaluated top
//! to bottom with case-insensitive substring matching.

use mfan_common::config::ClassifierConfig;
use mfan_common::models::{ClassifiedResult, ConfidenceOrigin, ContentType, RawResultItem};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::error;

/// Confidence for an upstream-supplied type
pub const API_CONFIDENCE: f64 = 1.0;
/// Confidence for a reserved source key
pub const RESERVED_SOURCE_CONFIDENCE: f64 = 0.9;
/// Title table rows only run below this confidence
pub const TITLE_SCAN_THRESHOLD: f64 = 0.8;
/// Episode heuristic only runs below this confidence
pub const EPISODE_SCAN_THRESHOLD: f64 = 0.5;
/// Confidence for the episode heuristic
pub const EPISODE_CONFIDENCE: f64 = 0.3;
/// Confidence for the final fallback
pub const FALLBACK_CONFIDENCE: f64 = 0.1;

/// One row of a keyword table
///
/// A row matches when the text contains any of `keywords` and none of
/// `excludes`.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub keywords: &'static [&'static str],
    pub excludes: &'static [&'static str],
    pub content_type: ContentType,
    pub weight: f64,
}

impl KeywordRule {
    fn matches(&self, haystack_lower: &str) -> bool {
        self.keywords.iter().any(|k| haystack_lower.contains(k))
            && !self.excludes.iter().any(|k| haystack_lower.contains(k))
    }
}

/// Made-for-TV film categories; kept out of the main movie row so they
/// land on the lower-weight row
const TV_MOVIE_KEYWORDS: &[&str] = &["电视电影", "tv movie", "tv-movie", "telefilm"];

/// Rules scanned against `type_name`. Order matters: the first matching
/// row wins, so specific categories precede the broad series row.
pub const TYPE_NAME_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["综艺", "真人秀", "脱口秀", "选秀", "晚会", "variety", "reality show", "talk show"],
        excludes: &[],
        content_type: ContentType::Variety,
        weight: 0.9,
    },
    KeywordRule {
        keywords: &[
            "电影", "影片", "动作片", "喜剧片", "爱情片", "科幻片", "恐怖片", "剧情片", "战争片",
            "惊悚片", "悬疑片", "犯罪片", "动画电影", "微电影", "movie", "film",
        ],
        excludes: TV_MOVIE_KEYWORDS,
        content_type: ContentType::Movie,
        weight: 0.9,
    },
    KeywordRule {
        keywords: &["动漫", "动画", "番剧", "国漫", "日漫", "剧场版", "anime", "animation"],
        excludes: &[],
        content_type: ContentType::Anime,
        weight: 0.9,
    },
    KeywordRule {
        keywords: &["纪录片", "记录片", "纪实", "documentary"],
        excludes: &[],
        content_type: ContentType::Documentary,
        weight: 0.9,
    },
    KeywordRule {
        keywords: &["短剧", "微短剧", "short drama"],
        excludes: &[],
        content_type: ContentType::Shortdrama,
        weight: 0.9,
    },
    KeywordRule {
        keywords: &[
            "剧", "连续剧", "电视剧", "国产剧", "美剧", "韩剧", "日剧", "港剧", "台剧", "泰剧",
            "英剧", "tv series", "tv show",
        ],
        excludes: &[],
        content_type: ContentType::Tv,
        weight: 0.8,
    },
    KeywordRule {
        keywords: TV_MOVIE_KEYWORDS,
        excludes: &[],
        content_type: ContentType::Movie,
        weight: 0.8,
    },
];

/// Lower-weight rules scanned against the title
pub const TITLE_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["综艺", "真人秀", "脱口秀", "晚会"],
        excludes: &[],
        content_type: ContentType::Variety,
        weight: 0.7,
    },
    KeywordRule {
        keywords: &["短剧", "微短剧"],
        excludes: &[],
        content_type: ContentType::Shortdrama,
        weight: 0.7,
    },
    KeywordRule {
        keywords: &["纪录片", "纪实"],
        excludes: &[],
        content_type: ContentType::Documentary,
        weight: 0.7,
    },
    KeywordRule {
        keywords: &["动漫", "动画", "番剧", "剧场版"],
        excludes: &[],
        content_type: ContentType::Anime,
        weight: 0.7,
    },
    KeywordRule {
        keywords: &["电影", "大电影", "movie"],
        excludes: &[],
        content_type: ContentType::Movie,
        weight: 0.7,
    },
    KeywordRule {
        keywords: &[
            "第一季", "第二季", "第三季", "第四季", "第五季", "第六季", "第七季", "第八季",
            "第九季", "第十季", "season",
        ],
        excludes: &[],
        content_type: ContentType::Tv,
        weight: 0.7,
    },
];

/// First row in `rules` matching `text`, case-insensitively.
pub fn scan(rules: &[KeywordRule], text: &str) -> Option<KeywordRule> {
    let lower = text.to_lowercase();
    rules.iter().find(|rule| rule.matches(&lower)).copied()
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Inference {
    content_type: ContentType,
    confidence: f64,
    origin: ConfidenceOrigin,
}

/// Stateless classifier; reserved source identifiers come from config
#[derive(Debug, Clone)]
pub struct Classifier {
    live_keys: Vec<String>,
    short_drama_keys: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

impl Classifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        let normalise = |keys: &[String]| -> Vec<String> {
            keys.iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect()
        };

        Self {
            live_keys: normalise(&config.live_source_keys),
            short_drama_keys: normalise(&config.short_drama_source_keys),
        }
    }

    /// Classify one item. Never fails: a panic inside the rule chain is
    /// logged and the item becomes `tv` with confidence 0.
    pub fn classify(&self, item: RawResultItem) -> ClassifiedResult {
        let inference = match catch_unwind(AssertUnwindSafe(|| self.infer(&item))) {
            Ok(inference) => inference,
            Err(_) => {
                error!(
                    source = %item.source,
                    title = %item.title,
                    "Classifier panicked; using zero-confidence fallback"
                );
                Inference {
                    content_type: ContentType::Tv,
                    confidence: 0.0,
                    origin: ConfidenceOrigin::Fallback,
                }
            }
        };

        ClassifiedResult::from_raw(
            item,
            inference.content_type,
            inference.confidence,
            inference.origin,
        )
    }

    pub fn classify_all(&self, items: Vec<RawResultItem>) -> Vec<ClassifiedResult> {
        items.into_iter().map(|item| self.classify(item)).collect()
    }

    fn infer(&self, item: &RawResultItem) -> Inference {
        // 1. Upstream type tag
        if let Some(content_type) = item
            .type_tag
            .as_deref()
            .and_then(|tag| tag.parse::<ContentType>().ok())
        {
            return Inference {
                content_type,
                confidence: API_CONFIDENCE,
                origin: ConfidenceOrigin::Api,
            };
        }

        // 2. Reserved source identifiers
        if let Some(content_type) = self.reserved_source_type(&item.source) {
            return Inference {
                content_type,
                confidence: RESERVED_SOURCE_CONFIDENCE,
                origin: ConfidenceOrigin::Inferred,
            };
        }

        let mut best: Option<(ContentType, f64)> = None;

        // 3. type_name table
        if let Some(rule) = item.type_name.as_deref().and_then(|t| scan(TYPE_NAME_RULES, t)) {
            best = Some((rule.content_type, rule.weight));
        }

        // 4. Title table, only overriding a strictly weaker match
        let current = best.map_or(0.0, |(_, c)| c);
        if current < TITLE_SCAN_THRESHOLD {
            if let Some(rule) = scan(TITLE_RULES, &item.title) {
                if rule.weight > current {
                    best = Some((rule.content_type, rule.weight));
                }
            }
        }

        // 5. Episode count
        let current = best.map_or(0.0, |(_, c)| c);
        if current < EPISODE_SCAN_THRESHOLD {
            if let Some(count) = item.derived_episode_count() {
                let content_type = if count == 1 {
                    ContentType::Movie
                } else {
                    ContentType::Tv
                };
                best = Some((content_type, EPISODE_CONFIDENCE));
            }
        }

        // 6. Fallback
        match best {
            Some((content_type, confidence)) if confidence >= EPISODE_CONFIDENCE => Inference {
                content_type,
                confidence,
                origin: ConfidenceOrigin::Inferred,
            },
            _ => Inference {
                content_type: ContentType::Tv,
                confidence: FALLBACK_CONFIDENCE,
                origin: ConfidenceOrigin::Fallback,
            },
        }
    }

    fn reserved_source_type(&self, source_key: &str) -> Option<ContentType> {
        let key = source_key.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }

        let is_reserved = |reserved: &[String]| {
            reserved
                .iter()
                .any(|r| key == *r || key.starts_with(&format!("{}_", r)))
        };

        if is_reserved(&self.live_keys) {
            Some(ContentType::Live)
        } else if is_reserved(&self.short_drama_keys) {
            Some(ContentType::Shortdrama)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(item: RawResultItem) -> ClassifiedResult {
        Classifier::default().classify(item)
    }

    #[test]
    fn test_api_type_wins_over_heuristics() {
        let result = classify(
            RawResultItem::new("动漫 番剧 动画 剧场版")
                .with_type_tag("movie")
                .with_type_name("日漫"),
        );
        assert_eq!(result.content_type, ContentType::Movie);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.origin, ConfidenceOrigin::Api);
    }

    #[test]
    fn test_unknown_type_tag_is_ignored() {
        let result = classify(RawResultItem::new("x").with_type_tag("电影").with_type_name("电影"));
        assert_eq!(result.content_type, ContentType::Movie);
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.origin, ConfidenceOrigin::Inferred);
    }

    #[test]
    fn test_reserved_source_keys() {
        let live = classify(RawResultItem::new("频道").with_source("live"));
        assert_eq!(live.content_type, ContentType::Live);
        assert_eq!(live.confidence, 0.9);

        let prefixed = classify(RawResultItem::new("x").with_source("shortdrama_hub"));
        assert_eq!(prefixed.content_type, ContentType::Shortdrama);

        let ordinary = classify(RawResultItem::new("x").with_source("lively"));
        assert_eq!(ordinary.origin, ConfidenceOrigin::Fallback);
    }

    #[test]
    fn test_configured_reserved_keys() {
        let classifier = Classifier::new(&ClassifierConfig {
            live_source_keys: vec!["IPTV".to_string()],
            short_drama_source_keys: vec![],
        });
        let result = classifier.classify(RawResultItem::new("x").with_source("iptv"));
        assert_eq!(result.content_type, ContentType::Live);

        let default_key = classifier.classify(RawResultItem::new("x").with_source("live"));
        assert_ne!(default_key.content_type, ContentType::Live);
    }

    #[test]
    fn test_type_name_first_row_wins() {
        // "剧情片" is in the movie row, which precedes the series row
        let result = classify(RawResultItem::new("x").with_type_name("剧情片"));
        assert_eq!(result.content_type, ContentType::Movie);
        assert_eq!(result.confidence, 0.9);

        let series = classify(RawResultItem::new("x").with_type_name("国产剧"));
        assert_eq!(series.content_type, ContentType::Tv);
        assert_eq!(series.confidence, 0.8);

        let variety = classify(RawResultItem::new("x").with_type_name("大陆综艺"));
        assert_eq!(variety.content_type, ContentType::Variety);
    }

    #[test]
    fn test_tv_movie_type_name_is_lower_weight_movie() {
        for type_name in ["电视电影", "tv movie", "tv-movie", "Telefilm", "TV-Movie"] {
            let result = classify(RawResultItem::new("x").with_type_name(type_name));
            assert_eq!(result.content_type, ContentType::Movie, "{}", type_name);
            assert_eq!(result.confidence, 0.8, "{}", type_name);
        }

        // Plain film categories keep the main movie row
        let film = classify(RawResultItem::new("x").with_type_name("Film"));
        assert_eq!(film.confidence, 0.9);
    }

    #[test]
    fn test_type_name_match_is_case_insensitive() {
        let result = classify(RawResultItem::new("x").with_type_name("Documentary"));
        assert_eq!(result.content_type, ContentType::Documentary);
        assert_eq!(result.confidence, 0.9);
    }

    #[test]
    fn test_title_scan_only_below_threshold() {
        // type_name gave tv/0.8, title scan must not run
        let kept = classify(RawResultItem::new("某某 第二季 动画").with_type_name("韩剧"));
        assert_eq!(kept.content_type, ContentType::Tv);
        assert_eq!(kept.confidence, 0.8);

        // No type_name: title table applies
        let titled = classify(RawResultItem::new("某某 大电影"));
        assert_eq!(titled.content_type, ContentType::Movie);
        assert_eq!(titled.confidence, 0.7);
        assert_eq!(titled.origin, ConfidenceOrigin::Inferred);

        let season = classify(RawResultItem::new("Something Season 2"));
        assert_eq!(season.content_type, ContentType::Tv);
        assert_eq!(season.confidence, 0.7);
    }

    #[test]
    fn test_episode_count_heuristic() {
        let single = classify(RawResultItem::new("untitled").with_episodes(["正片$http://x"]));
        assert_eq!(single.content_type, ContentType::Movie);
        assert_eq!(single.confidence, 0.3);
        assert_eq!(single.origin, ConfidenceOrigin::Inferred);

        let many = classify(RawResultItem::new("untitled").with_episode_count(24));
        assert_eq!(many.content_type, ContentType::Tv);
        assert_eq!(many.confidence, 0.3);
    }

    #[test]
    fn test_episode_count_skipped_for_confident_match() {
        let result = classify(RawResultItem::new("某某大电影").with_episode_count(40));
        assert_eq!(result.content_type, ContentType::Movie);
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn test_empty_item_falls_back() {
        let result = classify(RawResultItem::new(""));
        assert_eq!(result.content_type, ContentType::Tv);
        assert_eq!(result.confidence, 0.1);
        assert_eq!(result.origin, ConfidenceOrigin::Fallback);
    }

    #[test]
    fn test_confidence_always_in_range() {
        let samples = vec![
            RawResultItem::new(""),
            RawResultItem::new("a").with_type_tag(""),
            RawResultItem::new("a").with_type_tag("LIVE"),
            RawResultItem::new("🎬").with_type_name("   "),
            RawResultItem::new("x").with_episode_count(0),
            RawResultItem::new("x").with_source("live_1").with_type_name("电影"),
            RawResultItem::new("第一季").with_type_name("tv movie"),
        ];

        for item in samples {
            let result = classify(item);
            assert!((0.0..=1.0).contains(&result.confidence));
            assert!(ContentType::ALL.contains(&result.content_type));
        }
    }

    #[test]
    fn test_scenario_movie_type_name() {
        let result = classify(
            RawResultItem::new("电影A 高清版")
                .with_type_name("电影")
                .with_source("s2"),
        );
        assert_eq!(result.title, "电影A 高清版");
        assert_eq!(result.content_type, ContentType::Movie);
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.source, "s2");
    }
}
