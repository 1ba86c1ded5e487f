//! Small text and domain helpers shared by the stages.

/// Lowercase word tokens. Hyphens inside a word are kept (`gpt-5`,
/// `fine-tuning`); every other non-alphanumeric character separates.
pub fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .map(|t| t.trim_matches('-').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Tokens joined with single spaces and padded on both ends, so that phrase
/// containment only matches on word boundaries.
pub fn padded(text: &str) -> String {
    format!(" {} ", tokens(text).join(" "))
}

/// Whether `phrase` occurs as whole words inside an already padded text.
pub fn contains_phrase(padded_text: &str, phrase: &str) -> bool {
    let needle = padded(phrase);
    if needle.trim().is_empty() {
        return false;
    }
    padded_text.contains(&needle)
}

/// Host equals `domain` or is one of its subdomains.
pub fn domain_matches(host: &str, domain: &str) -> bool {
    let host = host.trim_start_matches("www.");
    let domain = domain.trim_start_matches("www.");
    host.eq_ignore_ascii_case(domain)
        || host
            .to_ascii_lowercase()
            .ends_with(&format!(".{}", domain.to_ascii_lowercase()))
}

/// Lowercased host without a leading `www.`.
pub fn source_of(url: &url::Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}
