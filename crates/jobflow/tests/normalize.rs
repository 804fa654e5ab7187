use serde_json::{json, Value};

use jobflow::feed::normalize;

#[test]
fn guid_wins_over_every_other_candidate() {
    let item = json!({
        "guid": "guid-1",
        "id": "id-1",
        "link": "http://x/1",
        "title": "A title",
    });

    assert_eq!(normalize(&item).external_id.as_deref(), Some("guid-1"));
}

#[test]
fn link_is_used_when_guid_and_id_are_missing() {
    let item = json!({ "link": "http://x/1", "title": "A title" });

    assert_eq!(normalize(&item).external_id.as_deref(), Some("http://x/1"));
}

#[test]
fn title_is_the_last_field_candidate() {
    let item = json!({ "title": "Backend Engineer" });

    assert_eq!(
        normalize(&item).external_id.as_deref(),
        Some("Backend Engineer")
    );
}

#[test]
fn structured_nodes_unwrap_uniformly() {
    // attribute-bearing guid and title, Atom-style link
    let item = json!({
        "guid": { "isPermaLink": "false", "_": "abc-123" },
        "title": { "lang": "en", "_": "Senior Engineer" },
        "link": { "rel": "alternate", "href": "https://x/3" },
    });

    let normalized = normalize(&item);
    assert_eq!(normalized.external_id.as_deref(), Some("abc-123"));
    assert_eq!(normalized.title.as_deref(), Some("Senior Engineer"));
    assert_eq!(normalized.url.as_deref(), Some("https://x/3"));
}

#[test]
fn first_of_several_links_is_the_url() {
    let item = json!({
        "id": "atom-1",
        "link": [
            { "rel": "alternate", "href": "https://x/post" },
            { "rel": "self", "href": "https://x/self" },
        ],
    });

    assert_eq!(normalize(&item).url.as_deref(), Some("https://x/post"));
}

#[test]
fn fallback_id_is_deterministic_and_capped() {
    let item = json!({
        "description": "A role with no guid, id, link or title, \
                        described at considerable length so the serialized \
                        form is well past fifty characters.",
    });

    let first = normalize(&item).external_id.expect("fallback id");
    let second = normalize(&item).external_id.expect("fallback id");

    assert_eq!(first, second);
    assert!(!first.is_empty());
    assert!(first.chars().count() <= 50);
}

#[test]
fn empty_item_has_no_derivable_id() {
    // an empty <item/> parses to an empty string
    let item = Value::String(String::new());

    let normalized = normalize(&item);
    assert!(normalized.external_id.is_none());
    assert!(normalized.title.is_none());
    assert_eq!(normalized.raw, item);
}

#[test]
fn company_falls_back_to_author_then_creator() {
    let by_author = json!({ "guid": "1", "author": "Acme Inc" });
    assert_eq!(
        normalize(&by_author).company.as_deref(),
        Some("Acme Inc")
    );

    let by_creator = json!({ "guid": "2", "dc:creator": "Globex" });
    assert_eq!(normalize(&by_creator).company.as_deref(), Some("Globex"));

    let explicit = json!({ "guid": "3", "company": "Initech", "author": "ignored" });
    assert_eq!(normalize(&explicit).company.as_deref(), Some("Initech"));
}

#[test]
fn location_and_description_mappings() {
    let item = json!({
        "guid": "1",
        "job_location": "Remote - EU",
        "summary": "Short summary",
    });

    let normalized = normalize(&item);
    assert_eq!(normalized.location.as_deref(), Some("Remote - EU"));
    assert_eq!(normalized.description.as_deref(), Some("Short summary"));

    let preferred = json!({
        "guid": "2",
        "location": "Berlin",
        "description": "Long form",
        "summary": "ignored",
    });
    let normalized = normalize(&preferred);
    assert_eq!(normalized.location.as_deref(), Some("Berlin"));
    assert_eq!(normalized.description.as_deref(), Some("Long form"));
}

#[test]
fn raw_is_retained_verbatim() {
    let item = json!({
        "guid": "1",
        "title": "Role",
        "nonsense_field": { "deeply": ["nested", 42] },
    });

    assert_eq!(normalize(&item).raw, item);
}

#[test]
fn whitespace_only_fields_count_as_absent() {
    let item = json!({ "guid": "  ", "id": "real-id", "title": "   " });

    let normalized = normalize(&item);
    assert_eq!(normalized.external_id.as_deref(), Some("real-id"));
    assert!(normalized.title.is_none());
}
