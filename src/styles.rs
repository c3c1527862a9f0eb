//! Static tattoo-style metadata used by suggestion and facet generation
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Subjective difficulty of executing a style well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(Difficulty::Beginner),
            "intermediate" => Some(Difficulty::Intermediate),
            "advanced" => Some(Difficulty::Advanced),
            _ => None,
        }
    }
}

/// Metadata for one tattoo style.
#[derive(Debug, Clone)]
pub struct StyleMeta {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub difficulty: Difficulty,
}

lazy_static! {
    static ref STYLE_REGISTRY: HashMap<&'static str, StyleMeta> = {
        let styles = [
            StyleMeta {
                name: "traditional",
                aliases: &["old school", "american traditional", "sailor", "classic"],
                difficulty: Difficulty::Beginner,
            },
            StyleMeta {
                name: "neo-traditional",
                aliases: &["neo trad", "new school traditional"],
                difficulty: Difficulty::Intermediate,
            },
            StyleMeta {
                name: "realism",
                aliases: &["realistic", "photo realism", "portrait"],
                difficulty: Difficulty::Advanced,
            },
            StyleMeta {
                name: "blackwork",
                aliases: &["black work", "heavy black", "tribal blackwork"],
                difficulty: Difficulty::Intermediate,
            },
            StyleMeta {
                name: "watercolour",
                aliases: &["watercolor", "water colour", "paint splash"],
                difficulty: Difficulty::Advanced,
            },
            StyleMeta {
                name: "japanese",
                aliases: &["irezumi", "oriental", "dragon", "koi"],
                difficulty: Difficulty::Advanced,
            },
            StyleMeta {
                name: "geometric",
                aliases: &["sacred geometry", "dotwork geometric", "pattern"],
                difficulty: Difficulty::Intermediate,
            },
            StyleMeta {
                name: "dotwork",
                aliases: &["stippling", "pointillism"],
                difficulty: Difficulty::Intermediate,
            },
            StyleMeta {
                name: "fineline",
                aliases: &["fine line", "single needle", "minimalist"],
                difficulty: Difficulty::Intermediate,
            },
            StyleMeta {
                name: "lettering",
                aliases: &["script", "calligraphy", "typography"],
                difficulty: Difficulty::Beginner,
            },
            StyleMeta {
                name: "tribal",
                aliases: &["polynesian", "maori", "samoan"],
                difficulty: Difficulty::Intermediate,
            },
            StyleMeta {
                name: "biomechanical",
                aliases: &["biomech", "cyber", "mechanical"],
                difficulty: Difficulty::Advanced,
            },
        ];

        styles.into_iter().map(|s| (s.name, s)).collect()
    };
}

/// Look up metadata for a canonical style name.
pub fn style_meta(name: &str) -> Option<&'static StyleMeta> {
    STYLE_REGISTRY.get(name)
}

/// Difficulty for a style, if it is a known style.
pub fn style_difficulty(name: &str) -> Option<Difficulty> {
    style_meta(name).map(|m| m.difficulty)
}

/// Styles whose name or aliases contain the given free-text term.
///
/// Matching is case-insensitive and substring-based in both directions, so
/// "dragon" finds "japanese" (via its alias) and "japan" finds it too.
pub fn styles_matching_term(term: &str) -> Vec<&'static str> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<&'static str> = STYLE_REGISTRY
        .values()
        .filter(|meta| {
            meta.name.contains(&term)
                || meta
                    .aliases
                    .iter()
                    .any(|a| a.contains(&term) || term.contains(a))
        })
        .map(|meta| meta.name)
        .collect();

    matches.sort_unstable();
    matches
}

/// All canonical style names, sorted.
pub fn all_styles() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = STYLE_REGISTRY.keys().copied().collect();
    names.sort_unstable();
    names
}
