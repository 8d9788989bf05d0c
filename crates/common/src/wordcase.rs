// Flag name conversion for outgoing command payloads: `--foo-bar` -> `fooBar`.

use std::collections::BTreeMap;

/// Convert a `--kebab-case` flag name into `camelCase`.
///
/// The leading `--` is stripped and the rest is split on `-`. Empty segments
/// are skipped. The segment at index 0 is kept as written; every later
/// segment has its first character upper-cased.
pub fn kebab_to_camel(flag: &str) -> String {
    let word = flag.strip_prefix("--").unwrap_or(flag);

    let mut result = String::with_capacity(word.len());
    for (index, part) in word.split('-').enumerate() {
        if part.is_empty() {
            continue;
        }
        if index == 0 {
            result.push_str(part);
            continue;
        }
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.push_str(chars.as_str());
        }
    }
    result
}

/// Re-key a parameter map with [`kebab_to_camel`].
pub fn kebab_to_camel_keys(params: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    params.iter().map(|(key, value)| (kebab_to_camel(key), value.clone())).collect()
}
