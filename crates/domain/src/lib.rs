//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access_level;
mod decision;
mod error;
mod role;
mod scope;
mod scope_rule;

pub use access_level::{AccessLevel, at_least};
pub use decision::AccessDecision;
pub use error::{RbacError, RbacResult};
pub use role::Role;
pub use scope::Scope;
pub use scope_rule::{FieldRule, RuleSet, ScopeRule};
