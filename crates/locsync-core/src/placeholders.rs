use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Collect placeholder tokens from a string: `{identifier}`-style brace
/// tokens and printf-style `%s`/`%1$d` tokens. Translations must carry the
/// same token set as their source (order may differ).
pub fn extract_placeholders(s: &str) -> BTreeSet<String> {
    let mut set = BTreeSet::new();

    static RE_BRACE: OnceLock<Regex> = OnceLock::new();
    let re_brace = RE_BRACE.get_or_init(|| Regex::new(r"\{[A-Za-z_][A-Za-z0-9_]*\}").unwrap());
    for m in re_brace.find_iter(s) {
        set.insert(m.as_str().to_string());
    }

    static RE_PCT: OnceLock<Regex> = OnceLock::new();
    let re_pct = RE_PCT.get_or_init(|| Regex::new(r"%(\d+\$)?0?\d*[sdif]").unwrap());
    for m in re_pct.find_iter(s) {
        set.insert(m.as_str().to_string());
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brace_tokens_are_collected() {
        let set = extract_placeholders("Hello {name}, you have {count} messages");
        assert!(set.contains("{name}"));
        assert!(set.contains("{count}"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn printf_tokens_are_collected() {
        let set = extract_placeholders("%s of %1$d items");
        assert!(set.contains("%s"));
        assert!(set.contains("%1$d"));
    }

    #[test]
    fn braces_without_identifier_are_ignored() {
        let set = extract_placeholders("literal {} and {1+2} stay plain text");
        assert!(set.is_empty());
    }
}
