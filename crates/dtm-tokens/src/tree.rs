// tree.rs — Editing and walking token trees by dotted path.
//
// A token document is a JSON object. Any object carrying `$value` is a
// token; every other object is a group. Keys starting with `$` on a group
// (`$type`, `$description`) are group metadata and never children.
//
//   { "color": { "$type": "color", "brand": { "$value": "#111111" } } }
//
// holds one token at `color.brand` with an inherited `$type` of "color".

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::TokenError;

/// Key holding a token's value.
pub const VALUE_KEY: &str = "$value";
/// Key holding a token's (or group's) type.
pub const TYPE_KEY: &str = "$type";

/// True if `node` is a token (an object with `$value`).
pub fn is_token(node: &Value) -> bool {
    node.as_object()
        .is_some_and(|map| map.contains_key(VALUE_KEY))
}

/// Split a dotted token path into its segments.
///
/// Segments must be non-empty and may not start with `$`, which is reserved
/// for token and group metadata.
pub fn split_token_path(dotted: &str) -> Result<Vec<&str>, TokenError> {
    let invalid = |reason: &str| TokenError::InvalidTokenPath {
        path: dotted.to_string(),
        reason: reason.to_string(),
    };

    if dotted.is_empty() {
        return Err(invalid("token path is empty"));
    }
    let segments: Vec<&str> = dotted.split('.').collect();
    for segment in &segments {
        if segment.is_empty() {
            return Err(invalid("token path contains an empty segment"));
        }
        if segment.starts_with('$') {
            return Err(invalid("segments starting with '$' are reserved"));
        }
    }
    Ok(segments)
}

/// Look up the node at a dotted path.
pub fn get<'a>(tree: &'a Value, dotted: &str) -> Option<&'a Value> {
    let segments = split_token_path(dotted).ok()?;
    segments
        .into_iter()
        .try_fold(tree, |node, segment| node.as_object()?.get(segment))
}

/// Write a value at a dotted path, creating intermediate groups.
///
/// An object `value` replaces the node outright. Any other value becomes the
/// `$value` of the token at that path (a bare `{ "$value": ... }` token is
/// created if nothing is there yet).
pub fn set(tree: &mut Value, dotted: &str, value: Value) -> Result<(), TokenError> {
    let segments = split_token_path(dotted)?;
    if !tree.is_object() {
        *tree = Value::Object(Map::new());
    }

    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| TokenError::InvalidTokenPath {
            path: dotted.to_string(),
            reason: "token path is empty".to_string(),
        })?;

    let mut node = tree;
    for (depth, segment) in parents.iter().enumerate() {
        let blocked_by = || TokenError::NotAGroup {
            path: dotted.to_string(),
            blocked_by: segments[..=depth].join("."),
        };
        let map = node.as_object_mut().ok_or_else(blocked_by)?;
        let child = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !child.is_object() || is_token(child) {
            return Err(blocked_by());
        }
        node = child;
    }

    let map = node.as_object_mut().ok_or_else(|| TokenError::NotAGroup {
        path: dotted.to_string(),
        blocked_by: parents.join("."),
    })?;

    if value.is_object() {
        map.insert(last.to_string(), value);
        return Ok(());
    }

    let existing = map.get(*last).map(|node| (is_token(node), node.is_object()));
    match existing {
        Some((true, _)) => {
            if let Some(token) = map.get_mut(*last).and_then(Value::as_object_mut) {
                token.insert(VALUE_KEY.to_string(), value);
            }
        }
        Some((false, true)) => {
            return Err(TokenError::NotAToken {
                path: dotted.to_string(),
            });
        }
        _ => {
            let mut token = Map::new();
            token.insert(VALUE_KEY.to_string(), value);
            map.insert(last.to_string(), Value::Object(token));
        }
    }
    Ok(())
}

/// Remove the node at a dotted path and return it.
///
/// Parent groups left empty by the removal are kept.
pub fn remove(tree: &mut Value, dotted: &str) -> Result<Value, TokenError> {
    let segments = split_token_path(dotted)?;
    let not_found = || TokenError::TokenNotFound {
        path: dotted.to_string(),
    };

    let (last, parents) = segments.split_last().ok_or_else(not_found)?;
    let mut node = tree;
    for segment in parents {
        node = node
            .as_object_mut()
            .and_then(|map| map.get_mut(*segment))
            .ok_or_else(not_found)?;
    }
    node.as_object_mut()
        .and_then(|map| map.shift_remove(*last))
        .ok_or_else(not_found)
}

/// Deep-merge `overlay` into `base`.
///
/// Groups merge key by key. A token (or any non-object) in the overlay
/// replaces whatever the base held at that position.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    if is_token(&overlay) || is_token(base) || !base.is_object() || !overlay.is_object() {
        *base = overlay;
        return;
    }
    if let (Value::Object(base_map), Value::Object(overlay_map)) = (base, overlay) {
        for (key, value) in overlay_map {
            match base_map.get_mut(&key) {
                Some(existing) => deep_merge(existing, value),
                None => {
                    base_map.insert(key, value);
                }
            }
        }
    }
}

static NULL: Value = Value::Null;

/// A token found while flattening a tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatToken<'a> {
    /// The token object itself (`$value`, `$type`, ...).
    pub node: &'a Value,
    /// The token's own `$type`, or the closest ancestor group's.
    pub token_type: Option<&'a str>,
}

impl<'a> FlatToken<'a> {
    /// The token's `$value`.
    pub fn value(&self) -> &'a Value {
        self.node.get(VALUE_KEY).unwrap_or(&NULL)
    }
}

/// Flatten a tree into dotted path → token, in sorted path order.
pub fn flatten(tree: &Value) -> BTreeMap<String, FlatToken<'_>> {
    let mut out = BTreeMap::new();
    let mut prefix = Vec::new();
    walk(tree, &mut prefix, None, &mut out);
    out
}

fn walk<'a>(
    node: &'a Value,
    prefix: &mut Vec<&'a str>,
    inherited_type: Option<&'a str>,
    out: &mut BTreeMap<String, FlatToken<'a>>,
) {
    let Some(map) = node.as_object() else {
        return;
    };
    let own_type = map.get(TYPE_KEY).and_then(Value::as_str);

    if map.contains_key(VALUE_KEY) {
        if !prefix.is_empty() {
            out.insert(
                prefix.join("."),
                FlatToken {
                    node,
                    token_type: own_type.or(inherited_type),
                },
            );
        }
        return;
    }

    let group_type = own_type.or(inherited_type);
    for (key, child) in map {
        if key.starts_with('$') {
            continue;
        }
        prefix.push(key);
        walk(child, prefix, group_type, out);
        prefix.pop();
    }
}
