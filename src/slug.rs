// Listing URL resolution: override table first, then name transliteration

use std::collections::HashMap;

const LEADING_WORDS: [&str; 5] = ["A ", "The ", "At ", "On ", "Up The "];

// Order matters: longer phrases must be replaced before their sub-phrases
const SEPARATOR_PHRASES: [&str; 18] = [
    " - ", " is on ", " of the ", " on the ", " at the ", " by the ", " of a ", " off the ",
    " in the ", " to ", " the ", " of ", " on ", " in ", " at ", " from ", " up ", " by ",
];

const STRIPPED: [&str; 8] = ["....", "'", ",", "!", "#", "(", ")", "."];

/// Derive a listing slug from a cabin's display name.
///
/// Drops one leading article, turns filler words and ampersands into
/// hyphens, strips punctuation, lowercases and hyphenates spaces.
pub fn name_to_slug(name: &str) -> String {
    let trimmed = LEADING_WORDS
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .unwrap_or(name);

    let mut slug = trimmed.to_lowercase();

    for phrase in SEPARATOR_PHRASES {
        slug = slug.replace(phrase, "-");
    }

    slug = if slug.contains(" & ") {
        slug.replace(" & ", "-")
    } else {
        slug.replace('&', "-")
    };

    for fragment in STRIPPED {
        slug = slug.replace(fragment, "");
    }

    slug.replace(' ', "-")
}

/// Maps cabin names to canonical listing URLs.
#[derive(Debug, Clone)]
pub struct SlugResolver {
    base_url: String,
    overrides: HashMap<String, String>,
}

impl SlugResolver {
    pub fn new(base_url: &str, overrides: HashMap<String, String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            overrides,
        }
    }

    pub fn slug(&self, name: &str) -> String {
        match self.overrides.get(name) {
            Some(slug) => slug.clone(),
            None => name_to_slug(name),
        }
    }

    pub fn listing_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, self.slug(name))
    }
}
