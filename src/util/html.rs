use regex::Regex;
use std::sync::LazyLock;

static LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<li>(.*?)</li>").expect("LIST_ITEM_RE regex should compile"));

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("TAG_RE regex should compile"));

/// Remove every tag. Entities such as `&amp;` are left encoded.
pub fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, "").into_owned()
}

/// Turn rich-text notes into a flat list of instructions.
///
/// Each `<li>` becomes one entry with nested markup removed. Notes without
/// any list item become a single entry, or none if only markup remains.
pub fn extract_list_items(html: &str) -> Vec<String> {
    let items: Vec<&str> = LIST_ITEM_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();

    if items.is_empty() {
        let text = strip_tags(html);
        let text = text.trim();
        return if text.is_empty() {
            Vec::new()
        } else {
            vec![text.to_string()]
        };
    }

    items
        .into_iter()
        .map(|item| strip_tags(item).trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
