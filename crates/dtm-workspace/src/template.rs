// template.rs — Starter token sets for new workspaces.
//
// Every template produces the same three files (color, typography, spacing)
// with literal values, so a freshly provisioned project validates cleanly
// on its own and only picks up aliases once someone edits it.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value};

use crate::error::WorkspaceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    ProductUi,
    MarketingSite,
    Minimal,
}

impl Template {
    pub const ALL: [Template; 3] = [Self::ProductUi, Self::MarketingSite, Self::Minimal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductUi => "product-ui",
            Self::MarketingSite => "marketing-site",
            Self::Minimal => "minimal",
        }
    }

    /// `(file name, document)` pairs to write into the project directory.
    pub fn files(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("color.json", self.color()),
            ("typography.json", self.typography()),
            ("spacing.json", self.spacing()),
        ]
    }

    fn color(&self) -> Value {
        match self {
            Self::ProductUi => json!({
                "color": {
                    "$type": "color",
                    "brand": {
                        "primary": { "$value": "#2563eb" },
                        "secondary": { "$value": "#7c3aed" }
                    },
                    "surface": {
                        "default": { "$value": "#ffffff" },
                        "muted": { "$value": "#f3f4f6" }
                    },
                    "text": {
                        "default": { "$value": "#111827" },
                        "muted": { "$value": "#6b7280" }
                    },
                    "feedback": {
                        "danger": { "$value": "#dc2626" },
                        "success": { "$value": "#16a34a" }
                    }
                }
            }),
            Self::MarketingSite => json!({
                "color": {
                    "$type": "color",
                    "brand": {
                        "primary": { "$value": "#e11d48" },
                        "accent": { "$value": "#f59e0b" }
                    },
                    "background": {
                        "hero": { "$value": "#0f172a" },
                        "section": { "$value": "#f8fafc" }
                    },
                    "text": {
                        "default": { "$value": "#0f172a" },
                        "inverse": { "$value": "#ffffff" }
                    }
                }
            }),
            Self::Minimal => json!({
                "color": {
                    "$type": "color",
                    "brand": { "primary": { "$value": "#111111" } },
                    "text": { "default": { "$value": "#111111" } },
                    "surface": { "default": { "$value": "#ffffff" } }
                }
            }),
        }
    }

    fn typography(&self) -> Value {
        let (family, base, scale): (&str, u32, &[(&str, f64)]) = match self {
            Self::ProductUi => (
                "Inter, system-ui, sans-serif",
                16,
                &[("sm", 0.875), ("md", 1.0), ("lg", 1.25), ("xl", 1.5)],
            ),
            Self::MarketingSite => (
                "\"Playfair Display\", Georgia, serif",
                18,
                &[("sm", 0.889), ("md", 1.0), ("lg", 1.333), ("xl", 2.0), ("display", 3.0)],
            ),
            Self::Minimal => ("system-ui, sans-serif", 16, &[("md", 1.0)]),
        };

        let mut sizes = serde_json::Map::new();
        sizes.insert("$type".to_string(), json!("dimension"));
        for (name, ratio) in scale {
            let px = (f64::from(base) * ratio).round();
            sizes.insert(name.to_string(), json!({ "$value": format!("{}px", px) }));
        }

        json!({
            "font": {
                "family": {
                    "$type": "fontFamily",
                    "body": { "$value": family }
                },
                "size": sizes,
                "weight": {
                    "$type": "fontWeight",
                    "regular": { "$value": 400 },
                    "bold": { "$value": 700 }
                }
            }
        })
    }

    fn spacing(&self) -> Value {
        let steps: &[(&str, u32)] = match self {
            Self::ProductUi => &[("xs", 4), ("sm", 8), ("md", 16), ("lg", 24), ("xl", 32)],
            Self::MarketingSite => &[("sm", 8), ("md", 24), ("lg", 48), ("xl", 96)],
            Self::Minimal => &[("sm", 8), ("md", 16)],
        };

        let mut spacing = serde_json::Map::new();
        spacing.insert("$type".to_string(), json!("dimension"));
        for (name, px) in steps {
            spacing.insert(name.to_string(), json!({ "$value": format!("{}px", px) }));
        }
        json!({ "spacing": spacing })
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Template {
    type Err = WorkspaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| WorkspaceError::UnknownTemplate {
                name: s.to_string(),
                expected: Self::ALL
                    .iter()
                    .map(Template::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}
