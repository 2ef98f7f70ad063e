// policy.rs — Protection policy for token files.
//
// Every save and delete request is evaluated here before anything touches
// disk:
//
// 1. Is the target covered by a protected pattern? → No → Allow, no backup
// 2. Is the mutation a delete?                      → No → Allow, backup
// 3. Did the caller confirm the delete?             → Yes → Allow, backup
// 4. Otherwise                                       → Deny GLOBAL_DELETE_PROTECTED
//
// Protected patterns are globs over tier paths (`global/**` by default).
// `*` stays inside one directory; `**` crosses directories.

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use dtm_backup::BackupAction;
use dtm_tokens::TierPath;

use crate::error::GuardError;

/// Pattern protecting the whole global tier.
pub const DEFAULT_PROTECTED_PATTERN: &str = "global/**";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// The edit requested on one token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenMutation {
    /// Write a token that is expected to be new.
    Create { value: Value },
    /// Overwrite an existing token.
    Update { value: Value },
    /// Remove a token (or group) from its file.
    Delete,
}

impl TokenMutation {
    pub fn action(&self) -> BackupAction {
        match self {
            Self::Create { .. } => BackupAction::Create,
            Self::Update { .. } => BackupAction::Update,
            Self::Delete => BackupAction::Delete,
        }
    }
}

/// A mutation submitted to the guard.
#[derive(Debug, Clone)]
pub struct MutationRequest {
    /// The token file being edited.
    pub target: TierPath,
    /// Dotted path of the token inside the file.
    pub token_path: String,
    pub mutation: TokenMutation,
    /// Caller acknowledged a destructive change to a protected file.
    pub confirm: bool,
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyCode {
    GlobalDeleteProtected,
}

impl DenyCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GlobalDeleteProtected => "GLOBAL_DELETE_PROTECTED",
        }
    }
}

/// The result of a guard evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    /// Proceed. `backup_required` is set for protected targets.
    Allow { backup_required: bool },
    /// Do not proceed. Nothing may be written.
    Deny { code: DenyCode, reason: String },
}

/// A step in the guard evaluation chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardStep {
    /// Which check was performed (e.g. "protected_path", "delete_confirmation").
    pub check: String,
    /// The outcome of this check.
    pub outcome: String,
    /// Whether this step was the terminal decision point.
    pub terminal: bool,
}

/// Decision plus the ordered steps that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardTrace {
    pub decision: GuardDecision,
    pub steps: Vec<GuardStep>,
    /// The protected pattern that matched the target, if any.
    pub matched_pattern: Option<String>,
}

/// Glob-based protection policy.
#[derive(Debug, Clone)]
pub struct GuardPolicy {
    protected: Vec<Pattern>,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self::new([DEFAULT_PROTECTED_PATTERN]).unwrap_or(Self {
            protected: Vec::new(),
        })
    }
}

impl GuardPolicy {
    /// Build a policy from protected glob patterns.
    pub fn new<I, S>(patterns: I) -> Result<Self, GuardError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let protected = patterns
            .into_iter()
            .map(|raw| {
                let raw = raw.as_ref();
                Pattern::new(raw).map_err(|e| GuardError::InvalidPattern {
                    pattern: raw.to_string(),
                    reason: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { protected })
    }

    /// The configured patterns, as written.
    pub fn patterns(&self) -> Vec<&str> {
        self.protected.iter().map(Pattern::as_str).collect()
    }

    /// True if `path` falls under a protected pattern.
    pub fn is_protected(&self, path: &TierPath) -> bool {
        self.matching_pattern(path).is_some()
    }

    fn matching_pattern(&self, path: &TierPath) -> Option<&Pattern> {
        self.protected
            .iter()
            .find(|p| p.matches_with(path.as_str(), MATCH_OPTIONS))
    }

    /// Evaluate a request and return only the decision.
    pub fn authorize(&self, request: &MutationRequest) -> GuardDecision {
        self.authorize_with_trace(request).decision
    }

    /// Evaluate a request and record every check performed.
    pub fn authorize_with_trace(&self, request: &MutationRequest) -> GuardTrace {
        let mut steps = Vec::new();

        // Step 1: protection lookup
        let Some(pattern) = self.matching_pattern(&request.target) else {
            steps.push(GuardStep {
                check: "protected_path".to_string(),
                outcome: format!("unprotected: '{}'", request.target),
                terminal: true,
            });
            return GuardTrace {
                decision: GuardDecision::Allow {
                    backup_required: false,
                },
                steps,
                matched_pattern: None,
            };
        };
        let matched_pattern = Some(pattern.as_str().to_string());
        steps.push(GuardStep {
            check: "protected_path".to_string(),
            outcome: format!("protected by '{}'", pattern.as_str()),
            terminal: false,
        });

        // Step 2: deletes of protected files need explicit confirmation
        if request.mutation == TokenMutation::Delete && !request.confirm {
            steps.push(GuardStep {
                check: "delete_confirmation".to_string(),
                outcome: "failed: delete not confirmed".to_string(),
                terminal: true,
            });
            return GuardTrace {
                decision: GuardDecision::Deny {
                    code: DenyCode::GlobalDeleteProtected,
                    reason: format!(
                        "deleting '{}' from protected file '{}' requires confirmation",
                        request.token_path, request.target
                    ),
                },
                steps,
                matched_pattern,
            };
        }
        steps.push(GuardStep {
            check: "delete_confirmation".to_string(),
            outcome: if request.mutation == TokenMutation::Delete {
                "confirmed".to_string()
            } else {
                "not a delete".to_string()
            },
            terminal: true,
        });

        GuardTrace {
            decision: GuardDecision::Allow {
                backup_required: true,
            },
            steps,
            matched_pattern,
        }
    }
}
