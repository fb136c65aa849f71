//! Public suffix handling
//!
//! The known-suffix table is the ground truth every requested suffix is
//! validated against. It is bundled from `data/public_suffix_list.dat` and
//! refreshed offline by the `update-suffixes` binary.

use std::collections::HashSet;
use std::time::Duration;

use once_cell::sync::Lazy;

use crate::error::{DomaineratorError, Result};
use crate::wordlist;

/// Public suffixes combined with words when none are given
pub const DEFAULT_PUBLIC_SUFFIXES: &str =
    "com,net,org,info,biz,in,us,me,co,ca,mobi,de,eu,ws,tk,es,it,nl,be";

const BUNDLED_LIST: &str = include_str!("../data/public_suffix_list.dat");

static KNOWN_SUFFIXES: Lazy<HashSet<String>> = Lazy::new(|| parse_suffix_list(BUNDLED_LIST));

/// The bundled set of known public suffixes
pub fn known_suffixes() -> &'static HashSet<String> {
    &KNOWN_SUFFIXES
}

/// True when `name` is itself a known public suffix
pub fn is_public_suffix(name: &str) -> bool {
    KNOWN_SUFFIXES.contains(name)
}

/// Parse a list in the publicsuffix.org format.
///
/// Blank lines, `//` comments and `!` exception rules are skipped; a leading
/// `*.` wildcard is stripped so the parent suffix is accepted.
pub fn parse_suffix_list(content: &str) -> HashSet<String> {
    content.lines().filter_map(parse_suffix_line).collect()
}

/// Parse one line of a public suffix list
pub fn parse_suffix_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("//") || line.starts_with('!') {
        return None;
    }
    let line = line.strip_prefix("*.").unwrap_or(line);
    // Rules end at the first whitespace
    line.split_whitespace().next().map(|s| s.to_lowercase())
}

/// Parse the user's suffix CSV, validating each entry against `accepted`.
///
/// With `include_tlds` every accepted suffix without a dot is added. The
/// result is deduplicated and sorted.
pub fn parse_public_suffix_csv(
    csv: &str,
    accepted: &HashSet<String>,
    include_tlds: bool,
) -> Result<Vec<String>> {
    let mut psl = wordlist::from_csv(csv);
    if psl.is_empty() && !include_tlds {
        return Err(DomaineratorError::EmptySuffixList);
    }

    if let Some(unknown) = psl.iter().find(|ps| !accepted.contains(ps.as_str())) {
        return Err(DomaineratorError::unknown_suffix(unknown.as_str()));
    }

    if include_tlds {
        psl.extend(accepted.iter().filter(|ps| !ps.contains('.')).cloned());
    }

    let mut psl = wordlist::remove_duplicates(psl);
    psl.sort();
    Ok(psl)
}

/// Download a list in the publicsuffix.org format
pub async fn download_suffix_list(url: &str, timeout: Duration) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(format!("domainerator/{}", crate::VERSION))
        .build()?;

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DomaineratorError::network(
            format!("unexpected status {}", status),
            Some(status.as_u16()),
            Some(url.to_string()),
        ));
    }

    let body = response.text().await?;
    tracing::debug!(url = %url, bytes = body.len(), "Public suffix list downloaded");
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted() -> HashSet<String> {
        [
            "com", "net", "org", "us", "im", "io", "ca", "co", "in", "com.br", "org.br", "co.uk",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn test_parse_csv_with_tlds() {
        let csv = "us, im, in, io, ,, ca,co,co ,,ca , com";
        let psl = parse_public_suffix_csv(csv, &accepted(), true).unwrap();
        let mut expected = vec!["com", "net", "org", "us", "im", "in", "io", "ca", "co"];
        expected.sort();
        assert_eq!(psl, expected);
    }

    #[test]
    fn test_parse_csv_without_tlds() {
        let psl = parse_public_suffix_csv("org, co.uk,com", &accepted(), false).unwrap();
        assert_eq!(psl, vec!["co.uk", "com", "org"]);
    }

    #[test]
    fn test_parse_csv_unknown_suffix() {
        let err = parse_public_suffix_csv("com,net,org,unk", &accepted(), false).unwrap_err();
        assert!(matches!(err, DomaineratorError::UnknownSuffix { ref suffix } if suffix == "unk"));
    }

    #[test]
    fn test_parse_csv_empty() {
        let err = parse_public_suffix_csv(" , ,", &accepted(), false).unwrap_err();
        assert_eq!(err.exit_code(), 20);
    }

    #[test]
    fn test_parse_suffix_list_format() {
        let list = "// comment\n\ncom\n*.ck\n!www.ck\nco.uk  trailing\n";
        let parsed = parse_suffix_list(list);
        assert_eq!(parsed.len(), 3);
        assert!(parsed.contains("com"));
        assert!(parsed.contains("ck"));
        assert!(parsed.contains("co.uk"));
    }

    #[test]
    fn test_bundled_list_covers_defaults() {
        let psl = parse_public_suffix_csv(DEFAULT_PUBLIC_SUFFIXES, known_suffixes(), false).unwrap();
        assert_eq!(psl.len(), 19);
        assert!(is_public_suffix("co.uk"));
        assert!(!is_public_suffix("golang"));
    }

    #[test]
    fn test_bundled_list_is_complete() {
        let tlds = known_suffixes().iter().filter(|s| !s.contains('.')).count();
        assert!(tlds > 1000, "only {} top level domains bundled", tlds);

        // Private section entries are kept
        let psl = parse_public_suffix_csv("de.com,com.br", known_suffixes(), false).unwrap();
        assert_eq!(psl, vec!["com.br", "de.com"]);
        assert!(is_public_suffix("taxi"));
        assert!(is_public_suffix("ck"));
        assert!(!is_public_suffix("www.ck"));
    }
}
