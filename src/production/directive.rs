//! The production-time directive vocabulary

/// Directive elements interpreted while producing a snippet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Text,
    CallFunction,
    If,
    Else,
    Choose,
    ForEach,
    ForEmpty,
    InsertSnippet,
}

impl Directive {
    pub fn from_local_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(Directive::Text),
            "call-function" => Some(Directive::CallFunction),
            "if" => Some(Directive::If),
            "else" => Some(Directive::Else),
            "choose" => Some(Directive::Choose),
            "for-each" => Some(Directive::ForEach),
            "for-empty" => Some(Directive::ForEmpty),
            "insert-snippet" => Some(Directive::InsertSnippet),
            _ => None,
        }
    }

    pub fn local_name(self) -> &'static str {
        match self {
            Directive::Text => "text",
            Directive::CallFunction => "call-function",
            Directive::If => "if",
            Directive::Else => "else",
            Directive::Choose => "choose",
            Directive::ForEach => "for-each",
            Directive::ForEmpty => "for-empty",
            Directive::InsertSnippet => "insert-snippet",
        }
    }
}

/// How a `choose` treats `if` branches after the first match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChooseMode {
    /// Only the first matching branch is produced
    #[default]
    Strict,
    /// Every matching branch is produced
    Lax,
}

impl ChooseMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "strict" => Some(ChooseMode::Strict),
            "lax" => Some(ChooseMode::Lax),
            _ => None,
        }
    }
}
