//! Errors that abort a production

use thiserror::Error;

use crate::data::CallbackError;
use crate::diagnostics::OriginTrail;
use crate::error::{trail_suffix, ExpressionError};
use crate::template::SnippetKey;

/// Which directive referenced a callable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableRole {
    CallFunction,
    Postproduction,
}

impl std::fmt::Display for CallableRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallableRole::CallFunction => write!(f, "call-function"),
            CallableRole::Postproduction => write!(f, "postproduction"),
        }
    }
}

/// Errors that can occur while producing a snippet
#[derive(Debug, Error)]
pub enum ProduceError {
    /// Snippet key not in the registry
    #[error("unknown snippet \"{key}\"{}", trail_suffix(.origin))]
    NotFound { key: SnippetKey, origin: OriginTrail },

    /// Snippet inserts itself, directly or through other snippets
    #[error("recursive snippet nesting: {}{}", .chain.join(" -> "), trail_suffix(.origin))]
    Recursion {
        key: SnippetKey,
        /// Call chain tokens, ending with the repeated one
        chain: Vec<String>,
        origin: OriginTrail,
    },

    /// `list` attribute does not name a list
    #[error("\"{path}\" is {found}, expected a list{}", trail_suffix(.origin))]
    NotAList {
        path: String,
        found: &'static str,
        origin: OriginTrail,
    },

    /// Reference that must name a callable does not
    #[error("{role} reference \"{path}\" is not callable{}", trail_suffix(.origin))]
    NotCallable {
        role: CallableRole,
        path: String,
        origin: OriginTrail,
    },

    /// Malformed test expression
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// A host callable failed
    #[error("callable \"{path}\" failed: {error}{}", trail_suffix(.origin))]
    Callback {
        path: String,
        #[source]
        error: CallbackError,
        origin: OriginTrail,
    },
}

impl ProduceError {
    /// Trail of source elements leading to the failure
    pub fn origin(&self) -> &OriginTrail {
        match self {
            ProduceError::NotFound { origin, .. }
            | ProduceError::Recursion { origin, .. }
            | ProduceError::NotAList { origin, .. }
            | ProduceError::NotCallable { origin, .. }
            | ProduceError::Callback { origin, .. } => origin,
            ProduceError::Expression(err) => &err.origin,
        }
    }
}
