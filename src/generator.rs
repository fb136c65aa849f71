//! Candidate domain generator
//!
//! Combines prefix and suffix word lists with public suffixes. The output is
//! deduplicated, filtered and sorted, so the same inputs always produce the
//! same sequence.

use std::collections::BTreeSet;

use crate::error::{DomaineratorError, Result};
use crate::suffix;
use crate::wordlist;

/// Largest number of overlapping characters elided by fusion
const MAX_FUSE_OVERLAP: usize = 2;

/// Options controlling which candidates are generated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Also combine each word alone with the public suffixes
    pub include_single_words: bool,
    /// Also emit `prefix-suffix`
    pub hyphenate: bool,
    /// Allow a word to be combined with itself
    pub include_self_pairing: bool,
    /// Emit hacks like `ind.ex` when a label ends with the public suffix
    pub domain_hacks: bool,
    /// Emit fused labels where the prefix tail overlaps the suffix head
    pub fuse: bool,
    /// Minimum rune length of combined labels (single words are exempt)
    pub min_label_length: usize,
    /// Maximum rune length of a whole candidate
    pub max_domain_length: usize,
    /// Keep candidates with multi-byte characters
    pub allow_utf8: bool,
    /// Drop candidates whose label is itself a public suffix
    pub strict: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            include_single_words: false,
            hyphenate: false,
            include_self_pairing: false,
            domain_hacks: false,
            fuse: false,
            min_label_length: 3,
            max_domain_length: 64,
            allow_utf8: false,
            strict: true,
        }
    }
}

/// Generator bound to a public suffix list and a set of options
#[derive(Debug, Clone)]
pub struct DomainGenerator {
    public_suffixes: Vec<String>,
    options: GenerateOptions,
}

impl DomainGenerator {
    /// Create a generator for the given public suffixes
    pub fn new(public_suffixes: Vec<String>, options: GenerateOptions) -> Self {
        let public_suffixes = if options.allow_utf8 {
            public_suffixes
        } else {
            wordlist::filter_utf8(public_suffixes)
        };
        Self {
            public_suffixes,
            options,
        }
    }

    pub fn public_suffixes(&self) -> &[String] {
        &self.public_suffixes
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Generate the sorted candidate list, enforcing the run preconditions
    pub fn generate(&self, prefixes: &[String], suffixes: &[String]) -> Result<Vec<String>> {
        if prefixes.is_empty() && suffixes.is_empty() {
            return Err(DomaineratorError::config("Both word lists are empty"));
        }
        if self.public_suffixes.is_empty() {
            return Err(DomaineratorError::EmptySuffixList);
        }

        let domains = combine(prefixes, suffixes, &self.public_suffixes, &self.options);
        if domains.is_empty() {
            return Err(DomaineratorError::NoCandidates);
        }

        tracing::info!(
            prefixes = prefixes.len(),
            suffixes = suffixes.len(),
            public_suffixes = self.public_suffixes.len(),
            candidates = domains.len(),
            "Domain list created"
        );
        Ok(domains)
    }
}

/// Combine words and public suffixes into the ordered candidate list
pub fn combine(
    prefixes: &[String],
    suffixes: &[String],
    public_suffixes: &[String],
    options: &GenerateOptions,
) -> Vec<String> {
    let mut domains = BTreeSet::new();

    if options.include_single_words {
        for word in prefixes.iter().chain(suffixes) {
            domains.extend(combine_phrase_and_suffixes(word, public_suffixes, options.domain_hacks));
        }
    }

    for prefix in prefixes {
        for suffix in suffixes {
            for label in combine_prefix_and_suffix(prefix, suffix, options) {
                // Hacks shorten the label, so the minimum applies to each candidate
                domains.extend(
                    combine_phrase_and_suffixes(&label, public_suffixes, options.domain_hacks)
                        .into_iter()
                        .filter(|d| label_of(d).chars().count() >= options.min_label_length),
                );
            }
        }
    }

    domains
        .into_iter()
        .filter(|d| d.chars().count() <= options.max_domain_length)
        .filter(|d| options.allow_utf8 || wordlist::is_ascii_word(d))
        .filter(|d| !options.strict || !is_prohibited(d))
        .collect()
}

/// Combine one label with every public suffix, with optional domain hacks
pub fn combine_phrase_and_suffixes(label: &str, public_suffixes: &[String], hacks: bool) -> Vec<String> {
    let mut domains = Vec::with_capacity(public_suffixes.len());
    for ps in public_suffixes {
        domains.push(format!("{}.{}", label, ps));
        if hacks {
            if let Some(hack) = domain_hack(label, ps) {
                domains.push(hack);
            }
        }
    }
    domains
}

/// Truncate `label` where it ends with `ps`, e.g. `index` + `ex` -> `ind.ex`.
///
/// Only a true suffix match qualifies, and the remaining label must be
/// non-empty and must not end with a hyphen.
pub fn domain_hack(label: &str, ps: &str) -> Option<String> {
    let head = label.strip_suffix(ps)?;
    if head.is_empty() || head.ends_with('-') {
        return None;
    }
    Some(format!("{}.{}", head, ps))
}

/// All labels built from one prefix/suffix pair. A suffix never comes before the prefix.
pub fn combine_prefix_and_suffix(prefix: &str, suffix: &str, options: &GenerateOptions) -> Vec<String> {
    if prefix == suffix && !options.include_self_pairing {
        return Vec::new();
    }

    let mut labels = vec![format!("{}{}", prefix, suffix)];
    if options.hyphenate {
        labels.push(format!("{}-{}", prefix, suffix));
    }
    if options.fuse {
        labels.extend(fuse_words(prefix, suffix));
    }
    labels
}

/// Fuse two words eliding 1 or 2 overlapping characters, e.g. `data` + `taxi` -> `dataxi`
pub fn fuse_words(prefix: &str, suffix: &str) -> Vec<String> {
    let head: Vec<char> = prefix.chars().collect();
    let tail: Vec<char> = suffix.chars().collect();

    (1..=MAX_FUSE_OVERLAP)
        .filter(|&k| head.len() > k && tail.len() > k && head[head.len() - k..] == tail[..k])
        .map(|k| head.iter().chain(&tail[k..]).collect())
        .collect()
}

/// Registrars refuse names whose label is itself a public suffix (e.g. `com.net`)
pub fn is_prohibited(domain: &str) -> bool {
    suffix::is_public_suffix(label_of(domain))
}

/// Text before the first dot
fn label_of(domain: &str) -> &str {
    domain.split('.').next().unwrap_or(domain)
}
