use serde_json::Value;

/// Canonical shape of one feed item, before persistence.
///
/// Every field except `raw` is optional; `raw` always carries the item as
/// parsed, for audit and debugging.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub external_id: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub raw: Value,
}

const EXTERNAL_ID_MAX_LEN: usize = 50;

/// Map one raw feed item into a `FeedItem`. Never fails; fields that cannot
/// be derived surface as `None`.
pub fn normalize(raw: &Value) -> FeedItem {
    FeedItem {
        external_id: derive_external_id(raw),
        title: node_text(raw.get("title")),
        company: first_text(raw, &["company", "author", "dc:creator"]),
        location: first_text(raw, &["location", "job_location"]),
        description: first_text(raw, &["description", "content", "summary"]),
        url: link_target(raw.get("link")),
        raw: raw.clone(),
    }
}

/// Dedupe key, first non-empty wins: guid, id, link, title, then a
/// truncated serialization of the whole item.
fn derive_external_id(raw: &Value) -> Option<String> {
    node_text(raw.get("guid"))
        .or_else(|| node_text(raw.get("id")))
        .or_else(|| link_target(raw.get("link")))
        .or_else(|| node_text(raw.get("title")))
        .or_else(|| fallback_id(raw))
}

/// Last resort: the serialized item itself, capped at 50 chars. Only
/// structured items and non-empty text items can produce one; an item with
/// no content at all has no derivable id.
fn fallback_id(raw: &Value) -> Option<String> {
    let serialized = match raw {
        Value::Object(_) => serde_json::to_string(raw).ok()?,
        Value::String(s) => s.clone(),
        _ => return None,
    };

    let truncated: String = serialized.chars().take(EXTERNAL_ID_MAX_LEN).collect();
    if truncated.trim().is_empty() {
        None
    } else {
        Some(truncated)
    }
}

fn first_text(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| node_text(raw.get(*key)))
}

/// Unwrap an element that is either plain text or a structured node with
/// its text under `"_"` (attribute-bearing or CDATA-wrapped elements).
fn node_text(node: Option<&Value>) -> Option<String> {
    let text = match node? {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("_").and_then(Value::as_str)?,
        _ => return None,
    };

    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Links are either plain text or Atom-style nodes carrying an `href`
/// attribute; entries with several links use the first.
fn link_target(node: Option<&Value>) -> Option<String> {
    match node? {
        Value::Array(links) => link_target(links.first()),
        Value::Object(map) => map
            .get("href")
            .or_else(|| map.get("_"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        other => node_text(Some(other)),
    }
}
