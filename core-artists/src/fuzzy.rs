//! # Fuzzy Name Matching
//!
//! Builds tolerant regular expressions from free-text queries so that
//! romanization variants, diacritics and decorative punctuation found in
//! artist, song and anime names still match:
//!
//! - `"maya sakamoto"` matches `"Maaya Sakamoto"` (long vowels),
//! - `"fine rein"` matches `"Fine★Rein"` (separator symbols),
//! - `"zool"` matches `"ŹOOĻ"` (stylized letters),
//! - `"hanazawa kana"` matches `"Kana Hanazawa"` (two-word swap).
//!
//! The query is lower-cased, regex metacharacters other than the space and
//! `*` are escaped, then an ordered table of substitutions rewrites each
//! character into the class of its look-alikes. Multi-character rules run
//! before the single-character rule of the same letter, and every rule is
//! applied to the output of the previous ones.

use regex::{Regex, RegexBuilder};
use tracing::trace;

use crate::error::{ArtistError, Result};

/// Ordered rewrite table applied to the escaped query.
const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("ļ", "[ļĻ]"),
    ("l", "[l˥ļĻ]"),
    ("ź", "[źŹ]"),
    ("z", "[zźŹ]"),
    ("ou", "(ou|ō|o)"),
    ("oo", "(oo|ō|o)"),
    ("oh", "(oh|ō|o)"),
    ("wo", "(wo|o)"),
    ("o", "([oōóòöôøӨΦο]|ou|oo|oh|wo)"),
    ("uu", "(uu|u|ū)"),
    ("u", "([uūûúùüǖμ]|uu)"),
    ("aa", "(aa|a)"),
    ("ae", "(ae|æ)"),
    ("a", "([aäãά@âàáạåæā∀Λ]|aa)"),
    ("c", "[cςč℃]"),
    ("e", "[eəéêёëèæē]"),
    ("'", "['’ˈ]"),
    ("n", "[nñ]"),
    ("0", "[0Ө]"),
    ("2", "[2²]"),
    ("3", "[3³]"),
    ("5", "[5⁵]"),
    ("*", "[*✻＊✳︎]"),
    (
        " ",
        r"( ?[²³⁵★☆♥♡/*✻✳︎＊'ˈ\-∽\~〜・·.,;:!?@_⇔→≒=+†×±◎Ө♪♣␣∞] ?| )",
    ),
    ("i", "([iíίɪ]|ii)"),
    ("x", "[x×]"),
    ("b", "[bßβ]"),
    ("r", "[rЯ]"),
    ("s", "[sς]"),
];

/// Characters escaped before substitution. `*` is left as is so that the
/// substitution table can turn it into its look-alike class.
const META: &str = r"\.+?()|[]{}^$#&-~";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzyOptions {
    /// Match anywhere in the candidate instead of the whole candidate.
    pub partial_match: bool,
    /// For two-word queries, also accept the words in reverse order.
    pub swap_words: bool,
}

impl Default for FuzzyOptions {
    fn default() -> Self {
        Self {
            partial_match: true,
            swap_words: true,
        }
    }
}

/// Compiled, case-insensitive search pattern.
#[derive(Debug, Clone)]
pub struct FuzzyPattern {
    query: String,
    regex: Regex,
}

impl FuzzyPattern {
    /// The query the pattern was built from.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Source of the generated expression.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

    pub fn matches_any<I, S>(&self, candidates: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        candidates
            .into_iter()
            .any(|candidate| self.is_match(candidate.as_ref()))
    }
}

pub struct FuzzyNameMatcher;

impl FuzzyNameMatcher {
    pub fn build(query: &str, options: FuzzyOptions) -> Result<FuzzyPattern> {
        let escaped = escape(&query.to_lowercase());
        let mut source = anchor(&substitute(&escaped), options.partial_match);

        let words: Vec<&str> = escaped.split(' ').collect();
        if options.swap_words {
            if let [first, second] = words.as_slice() {
                let swapped = format!("{second} {first}");
                let alternate = anchor(&substitute(&swapped), options.partial_match);
                source = format!("({source})|({alternate})");
            }
        }

        trace!(query, pattern = %source, "Built fuzzy pattern");

        let regex = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|e| ArtistError::InvalidPattern {
                query: query.to_string(),
                message: e.to_string(),
            })?;

        Ok(FuzzyPattern {
            query: query.to_string(),
            regex,
        })
    }
}

fn escape(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if META.contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn substitute(escaped: &str) -> String {
    SUBSTITUTIONS
        .iter()
        .fold(escaped.to_string(), |pattern, (from, to)| pattern.replace(from, to))
}

fn anchor(pattern: &str, partial_match: bool) -> String {
    if partial_match {
        format!(".*{pattern}.*")
    } else {
        format!("^{pattern}$")
    }
}
