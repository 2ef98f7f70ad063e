//! # dtm-tokens
//!
//! Design-token trees for the token governance core.
//!
//! Tokens live in a three-tier directory tree under a tokens root:
//!
//! ```text
//! tokens/global/*.json
//! tokens/clients/<client>/*.json
//! tokens/clients/<client>/projects/<project>/*.json
//! ```
//!
//! This crate owns everything that touches those files without governance
//! concerns: validating boundary paths ([`TierPath`]), reading and atomically
//! writing token documents ([`io`]), editing token trees by dotted path
//! ([`tree`]), extracting alias edges ([`references`]), and checking reference
//! integrity before export ([`ReferenceValidator`]).
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use dtm_tokens::ReferenceValidator;
//!
//! let report = ReferenceValidator::new("tokens").validate().unwrap();
//! if !report.valid {
//!     for error in &report.errors {
//!         eprintln!("{} at {}", error.code, error.path);
//!     }
//! }
//! ```

pub mod error;
pub mod io;
pub mod path;
pub mod references;
pub mod tree;
pub mod validator;

pub use error::TokenError;
pub use path::{is_safe_segment, Tier, TierPath};
pub use references::ReferenceEdge;
pub use validator::{
    ReferenceValidator, ValidationIssue, ValidationReport, ValidationScope, ValidationSummary,
};
