// references.rs — Alias reference edges in a token tree.
//
// A token value that points at another token instead of holding a literal
// looks like `{color.brand.primary}`. Every such occurrence is an edge from
// the owning token to the referenced dotted path. Edges are extracted by a
// recursive descent over each token's `$value` (strings, arrays, and the
// fields of composite values such as typography objects), producing an
// explicit edge list the validator then checks in one pass.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::tree::FlatToken;

/// One alias edge: `from` token's value references the `to` path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceEdge {
    /// Dotted path of the token that holds the alias.
    pub from: String,
    /// Dotted path the alias points at.
    pub to: String,
    /// The alias text as written, braces included.
    pub raw: String,
}

/// Find the alias bodies inside a string value.
///
/// `"{spacing.sm} {spacing.md}"` yields `["spacing.sm", "spacing.md"]`.
/// Braces whose contents are not a dotted path (empty segments, whitespace)
/// are ignored, so CSS-like text such as `"{ }"` produces nothing.
pub fn extract_aliases(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            break;
        };
        let body = &after[..close];
        // `{a{b.c}` — the inner brace starts the real candidate.
        if let Some(inner) = body.rfind('{') {
            rest = &after[inner..];
            continue;
        }
        if is_alias_body(body) {
            found.push(body);
        }
        rest = &after[close + 1..];
    }

    found
}

fn is_alias_body(body: &str) -> bool {
    !body.is_empty()
        && body
            .split('.')
            .all(|segment| !segment.is_empty() && !segment.chars().any(char::is_whitespace))
}

/// Collect every edge out of one token value into `out`.
pub fn collect_edges(from: &str, value: &Value, out: &mut Vec<ReferenceEdge>) {
    match value {
        Value::String(text) => {
            for target in extract_aliases(text) {
                out.push(ReferenceEdge {
                    from: from.to_string(),
                    to: target.to_string(),
                    raw: format!("{{{}}}", target),
                });
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_edges(from, item, out);
            }
        }
        Value::Object(fields) => {
            for field in fields.values() {
                collect_edges(from, field, out);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Build the full edge list for a flattened token set, in token path order.
pub fn build_edges(tokens: &BTreeMap<String, FlatToken<'_>>) -> Vec<ReferenceEdge> {
    let mut edges = Vec::new();
    for (path, token) in tokens {
        collect_edges(path, token.value(), &mut edges);
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::flatten;
    use serde_json::json;

    #[test]
    fn whole_string_alias() {
        assert_eq!(extract_aliases("{color.brand.primary}"), vec!["color.brand.primary"]);
    }

    #[test]
    fn multiple_embedded_aliases() {
        assert_eq!(
            extract_aliases("{spacing.sm} {spacing.md} solid"),
            vec!["spacing.sm", "spacing.md"]
        );
    }

    #[test]
    fn literals_and_malformed_braces_are_not_aliases() {
        assert!(extract_aliases("#111111").is_empty());
        assert!(extract_aliases("{}").is_empty());
        assert!(extract_aliases("{ color.brand }").is_empty());
        assert!(extract_aliases("{color..brand}").is_empty());
        assert!(extract_aliases("{color.brand").is_empty());
    }

    #[test]
    fn nested_open_brace_restarts_candidate() {
        assert_eq!(extract_aliases("{a{color.brand}"), vec!["color.brand"]);
    }

    #[test]
    fn composite_values_are_walked() {
        let value = json!({
            "fontFamily": "{font.family.body}",
            "fontSize": "16px",
            "shadows": ["{shadow.sm}", { "color": "{color.shadow}" }]
        });
        let mut edges = Vec::new();
        collect_edges("typography.body", &value, &mut edges);
        let targets: Vec<&str> = edges.iter().map(|e| e.to.as_str()).collect();
        assert_eq!(targets, vec!["font.family.body", "shadow.sm", "color.shadow"]);
        assert!(edges.iter().all(|e| e.from == "typography.body"));
        assert_eq!(edges[0].raw, "{font.family.body}");
    }

    #[test]
    fn build_edges_only_reads_token_values() {
        let tree = json!({
            "color": {
                "brand": { "$value": "#111", "$description": "see {not.an.edge}" },
                "text": { "$value": "{color.brand}" }
            }
        });
        let flat = flatten(&tree);
        let edges = build_edges(&flat);
        assert_eq!(
            edges,
            vec![ReferenceEdge {
                from: "color.text".to_string(),
                to: "color.brand".to_string(),
                raw: "{color.brand}".to_string(),
            }]
        );
    }
}
