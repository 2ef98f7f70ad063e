// validator.rs — Reference integrity check before export.
//
// The validator loads every token file in scope, deep-merges them tier by
// tier (global, then client, then project), flattens the result into one
// namespace keyed by dotted path, extracts the alias edge list, and checks:
//
// 1. Every edge target resolves to a token → else FIGMA_REFERENCE_NOT_FOUND
// 2. No token sits on an alias cycle       → else FIGMA_REFERENCE_CIRCULAR
//    (every member of a strongly connected component, plus self-aliases)
// 3. Every token has an own or inherited $type → else FIGMA_MISSING_TYPE (warning)
//
// Resolution is a map lookup per edge, so the whole check runs in time
// proportional to tokens + edges. Files that fail to parse are reported as
// FIGMA_INVALID_JSON warnings and skipped rather than aborting the run.
// Integrity findings are data, not failures: `validate()` only returns Err
// for I/O problems.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::TokenError;
use crate::io;
use crate::path::{is_safe_segment, CLIENTS_DIR, GLOBAL_DIR, PROJECTS_DIR};
use crate::references::{build_edges, ReferenceEdge};
use crate::tree::{deep_merge, flatten, FlatToken};

/// A dangling alias: the referenced path has no token.
pub const REFERENCE_NOT_FOUND: &str = "FIGMA_REFERENCE_NOT_FOUND";
/// The token participates in an alias cycle.
pub const REFERENCE_CIRCULAR: &str = "FIGMA_REFERENCE_CIRCULAR";
/// The token has no `$type`, own or inherited.
pub const MISSING_TYPE: &str = "FIGMA_MISSING_TYPE";
/// A token file could not be parsed and was skipped.
pub const INVALID_JSON: &str = "FIGMA_INVALID_JSON";

/// One finding (error or warning) from a validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Stable machine-readable code.
    pub code: String,
    /// Dotted token path (or file path for file-level findings).
    pub path: String,
    /// The offending alias text, when the finding concerns a reference.
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Human-readable description.
    pub message: String,
}

/// Counts describing a validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub files_scanned: usize,
    pub total_tokens: usize,
    pub alias_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
}

/// Full result of a validation run.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// True iff `errors` is empty. Warnings never affect validity.
    pub valid: bool,
    /// The merged token tree that was validated.
    pub tokens: Value,
    pub summary: ValidationSummary,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// Which tiers to merge before validating.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidationScope {
    /// The global tier alone.
    #[default]
    Global,
    /// Global overlaid with one client's tier.
    Client { client_id: String },
    /// Global, then the client tier, then one of its projects.
    Project {
        client_id: String,
        project_id: String,
    },
}

/// Checks alias reference integrity across a tokens root.
pub struct ReferenceValidator {
    tokens_root: PathBuf,
}

impl ReferenceValidator {
    pub fn new(tokens_root: impl AsRef<Path>) -> Self {
        Self {
            tokens_root: tokens_root.as_ref().to_path_buf(),
        }
    }

    /// Validate the global tier.
    pub fn validate(&self) -> Result<ValidationReport, TokenError> {
        self.validate_scope(&ValidationScope::Global)
    }

    /// Validate the merged tree for a scope.
    pub fn validate_scope(&self, scope: &ValidationScope) -> Result<ValidationReport, TokenError> {
        let mut warnings = Vec::new();
        let mut merged = Value::Object(Map::new());
        let mut files_scanned = 0;

        for dir in self.tier_dirs(scope)? {
            for file in io::list_tier_files(&dir)? {
                files_scanned += 1;
                match io::read_document(&file) {
                    Ok(Some(doc)) => deep_merge(&mut merged, doc),
                    Ok(None) => {}
                    Err(TokenError::InvalidJson { source, .. }) => {
                        tracing::warn!(file = %file.display(), "skipping unparseable token file");
                        warnings.push(ValidationIssue {
                            code: INVALID_JSON.to_string(),
                            path: self.display_relative(&file),
                            reference: None,
                            message: format!("file is not valid JSON: {}", source),
                        });
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        let report = validate_tree(merged, files_scanned, warnings);
        tracing::debug!(
            valid = report.valid,
            tokens = report.summary.total_tokens,
            errors = report.summary.error_count,
            "validated token references"
        );
        Ok(report)
    }

    /// Tier directories for a scope, lowest precedence first.
    fn tier_dirs(&self, scope: &ValidationScope) -> Result<Vec<PathBuf>, TokenError> {
        let global = self.tokens_root.join(GLOBAL_DIR);
        let client_dir = |client_id: &str| -> Result<PathBuf, TokenError> {
            check_segment(client_id)?;
            Ok(self.tokens_root.join(CLIENTS_DIR).join(client_id))
        };

        Ok(match scope {
            ValidationScope::Global => vec![global],
            ValidationScope::Client { client_id } => vec![global, client_dir(client_id)?],
            ValidationScope::Project {
                client_id,
                project_id,
            } => {
                check_segment(project_id)?;
                let client = client_dir(client_id)?;
                let project = client.join(PROJECTS_DIR).join(project_id);
                vec![global, client, project]
            }
        })
    }

    fn display_relative(&self, file: &Path) -> String {
        file.strip_prefix(&self.tokens_root)
            .unwrap_or(file)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn check_segment(segment: &str) -> Result<(), TokenError> {
    if is_safe_segment(segment) {
        Ok(())
    } else {
        Err(TokenError::InvalidPath {
            path: segment.to_string(),
            reason: "not a valid client or project id".to_string(),
        })
    }
}

/// Validate an already-merged token tree.
///
/// `warnings` carries file-level findings gathered while loading.
pub fn validate_tree(
    tokens: Value,
    files_scanned: usize,
    mut warnings: Vec<ValidationIssue>,
) -> ValidationReport {
    let mut errors = Vec::new();

    let (total_tokens, alias_count) = {
        let flat = flatten(&tokens);
        let edges = build_edges(&flat);

        for edge in &edges {
            if !flat.contains_key(&edge.to) {
                errors.push(ValidationIssue {
                    code: REFERENCE_NOT_FOUND.to_string(),
                    path: edge.from.clone(),
                    reference: Some(edge.raw.clone()),
                    message: format!(
                        "token '{}' references '{}', which does not exist",
                        edge.from, edge.to
                    ),
                });
            }
        }

        for (path, edge) in find_cycles(&flat, &edges) {
            errors.push(ValidationIssue {
                code: REFERENCE_CIRCULAR.to_string(),
                path: path.to_string(),
                reference: Some(edge.raw.clone()),
                message: format!("token '{}' is part of an alias cycle", path),
            });
        }

        for (path, token) in &flat {
            if token.token_type.is_none() {
                warnings.push(ValidationIssue {
                    code: MISSING_TYPE.to_string(),
                    path: path.clone(),
                    reference: None,
                    message: format!("token '{}' has no $type", path),
                });
            }
        }

        (flat.len(), edges.len())
    };

    let summary = ValidationSummary {
        files_scanned,
        total_tokens,
        alias_count,
        error_count: errors.len(),
        warning_count: warnings.len(),
    };

    ValidationReport {
        valid: errors.is_empty(),
        tokens,
        summary,
        errors,
        warnings,
    }
}

const UNVISITED: usize = usize::MAX;

/// Tokens on an alias cycle, each paired with the edge it follows around
/// the cycle.
///
/// Iterative Tarjan SCC pass over resolved edges: a token is cyclic when its
/// strongly connected component has more than one member, or when it aliases
/// itself.
fn find_cycles<'e>(
    flat: &BTreeMap<String, FlatToken<'_>>,
    edges: &'e [ReferenceEdge],
) -> BTreeMap<&'e str, &'e ReferenceEdge> {
    let index: HashMap<&str, usize> = flat
        .keys()
        .enumerate()
        .map(|(i, path)| (path.as_str(), i))
        .collect();

    let mut adjacency: Vec<Vec<(usize, usize)>> = vec![Vec::new(); index.len()];
    for (edge_idx, edge) in edges.iter().enumerate() {
        if let (Some(&from), Some(&to)) = (index.get(edge.from.as_str()), index.get(edge.to.as_str()))
        {
            adjacency[from].push((to, edge_idx));
        }
    }

    let count = adjacency.len();
    let mut order = vec![UNVISITED; count];
    let mut low = vec![0usize; count];
    let mut on_stack = vec![false; count];
    let mut component = vec![0usize; count];
    let mut component_sizes: Vec<usize> = Vec::new();
    let mut pending: Vec<usize> = Vec::new();
    let mut next_order = 0;

    for start in 0..count {
        if order[start] != UNVISITED {
            continue;
        }
        order[start] = next_order;
        low[start] = next_order;
        next_order += 1;
        pending.push(start);
        on_stack[start] = true;

        // (node, index of the next outgoing edge to follow)
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        while let Some(top) = stack.last_mut() {
            let node = top.0;
            if let Some(&(target, _)) = adjacency[node].get(top.1) {
                top.1 += 1;
                if order[target] == UNVISITED {
                    order[target] = next_order;
                    low[target] = next_order;
                    next_order += 1;
                    pending.push(target);
                    on_stack[target] = true;
                    stack.push((target, 0));
                } else if on_stack[target] {
                    low[node] = low[node].min(order[target]);
                }
                continue;
            }

            stack.pop();
            if let Some(&(parent, _)) = stack.last() {
                low[parent] = low[parent].min(low[node]);
            }
            if low[node] == order[node] {
                let id = component_sizes.len();
                let mut size = 0;
                while let Some(member) = pending.pop() {
                    on_stack[member] = false;
                    component[member] = id;
                    size += 1;
                    if member == node {
                        break;
                    }
                }
                component_sizes.push(size);
            }
        }
    }

    let mut members: BTreeMap<&str, &ReferenceEdge> = BTreeMap::new();
    for (node, outgoing) in adjacency.iter().enumerate() {
        let cyclic_edge = outgoing.iter().find(|&&(target, _)| {
            component[target] == component[node]
                && (target == node || component_sizes[component[node]] > 1)
        });
        if let Some(&(_, edge_idx)) = cyclic_edge {
            let edge = &edges[edge_idx];
            members.insert(edge.from.as_str(), edge);
        }
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dangling_reference_is_an_error() {
        let tree = json!({
            "color": {
                "$type": "color",
                "text": { "$value": "{missing.reference.token}" }
            }
        });
        let report = validate_tree(tree, 1, Vec::new());
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, REFERENCE_NOT_FOUND);
        assert_eq!(report.errors[0].path, "color.text");
        assert_eq!(
            report.errors[0].reference.as_deref(),
            Some("{missing.reference.token}")
        );
    }

    #[test]
    fn resolved_references_are_valid() {
        let tree = json!({
            "color": {
                "$type": "color",
                "brand": { "$value": "#111111" },
                "text": { "$value": "{color.brand}" }
            }
        });
        let report = validate_tree(tree, 1, Vec::new());
        assert!(report.valid);
        assert!(report.errors.is_empty());
        assert_eq!(report.summary.total_tokens, 2);
        assert_eq!(report.summary.alias_count, 1);
    }

    #[test]
    fn reference_to_a_group_is_dangling() {
        let tree = json!({
            "color": { "$type": "color", "brand": { "primary": { "$value": "#111" } },
                       "text": { "$value": "{color.brand}" } }
        });
        let report = validate_tree(tree, 1, Vec::new());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, REFERENCE_NOT_FOUND);
    }

    #[test]
    fn cycles_are_reported_per_member() {
        let tree = json!({
            "$type": "color",
            "a": { "$value": "{b}" },
            "b": { "$value": "{c}" },
            "c": { "$value": "{a}" },
            "d": { "$value": "{a}" },
            "self": { "$value": "{self}" }
        });
        let report = validate_tree(tree, 1, Vec::new());
        let mut cyclic: Vec<&str> = report
            .errors
            .iter()
            .filter(|e| e.code == REFERENCE_CIRCULAR)
            .map(|e| e.path.as_str())
            .collect();
        cyclic.sort();
        assert_eq!(cyclic, vec!["a", "b", "c", "self"]);
        assert!(!report.valid);
    }

    #[test]
    fn cycle_member_reached_through_finished_token_is_reported() {
        // a -> b -> c -> a, and a -> d -> c closes a second loop through d
        // after c has already been fully explored.
        let tree = json!({
            "$type": "dimension",
            "a": { "$value": { "x": "{b}", "y": "{d}" } },
            "b": { "$value": "{c}" },
            "c": { "$value": "{a}" },
            "d": { "$value": "{c}" },
            "e": { "$value": "{d}" }
        });
        let report = validate_tree(tree, 1, Vec::new());
        let mut cyclic: Vec<&str> = report
            .errors
            .iter()
            .filter(|e| e.code == REFERENCE_CIRCULAR)
            .map(|e| e.path.as_str())
            .collect();
        cyclic.sort();
        assert_eq!(cyclic, vec!["a", "b", "c", "d"]);

        let d = report.errors.iter().find(|e| e.path == "d").unwrap();
        assert_eq!(d.reference.as_deref(), Some("{c}"));
    }

    #[test]
    fn missing_type_is_only_a_warning() {
        let tree = json!({ "spacing": { "sm": { "$value": "4px" } } });
        let report = validate_tree(tree, 1, Vec::new());
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].code, MISSING_TYPE);
        assert_eq!(report.summary.warning_count, 1);
    }

    #[test]
    fn issue_serializes_reference_as_ref() {
        let issue = ValidationIssue {
            code: REFERENCE_NOT_FOUND.to_string(),
            path: "color.text".to_string(),
            reference: Some("{x.y}".to_string()),
            message: String::new(),
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["ref"], "{x.y}");
    }
}
