//! Reserved symbols recognized by the evaluator.

use std::fmt;

/// Group tag attached to reserved symbols at interning time.
///
/// The evaluator asks the interner for a symbol's keyword instead of
/// comparing strings, so recognizing a special form is a single hash lookup.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Keyword {
    /// `(list a b ...)`: quoted literal list.
    List,
    If,
    Let,
    Define,
    Lambda,
    Begin,
    /// `(apply1 f a ...)`: explicit application.
    Apply1,
    /// `(applyTo f a ... lst)`: application spreading a trailing list.
    ApplyTo,
    CallCc,
    /// `_`: the blank placeholder for partial application.
    Blank,
}

impl Keyword {
    /// Every keyword, in pre-interning order.
    pub const ALL: [Keyword; 10] = [
        Keyword::List,
        Keyword::If,
        Keyword::Let,
        Keyword::Define,
        Keyword::Lambda,
        Keyword::Begin,
        Keyword::Apply1,
        Keyword::ApplyTo,
        Keyword::CallCc,
        Keyword::Blank,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Keyword::List => "list",
            Keyword::If => "if",
            Keyword::Let => "let",
            Keyword::Define => "define",
            Keyword::Lambda => "lambda",
            Keyword::Begin => "begin",
            Keyword::Apply1 => "apply1",
            Keyword::ApplyTo => "applyTo",
            Keyword::CallCc => "callcc",
            Keyword::Blank => "_",
        }
    }

    /// Whether this keyword introduces a special form (as opposed to `_`).
    pub const fn is_special_form(self) -> bool {
        !matches!(self, Keyword::Blank)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
