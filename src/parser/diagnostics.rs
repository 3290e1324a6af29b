use thiserror::Error;

/// Everything the parser can hold against a program. Syntax and semantic
/// findings share one collection; any entry makes the final verdict REJECT,
/// none of them stops the pass.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Diagnostic {
    #[error("expected {expected}, found {found} in {production}")]
    Syntax {
        expected: String,
        found: String,
        production: &'static str,
    },

    #[error("Symbol already exists in scope: {0}")]
    DuplicateSymbol(String),

    #[error("Unknown symbol encountered: '{0}'")]
    UndeclaredIdentifier(String),

    #[error("variables with type void are not permitted: {0}")]
    VoidVariable(String),

    #[error("Void parameter cannot be named: {0}")]
    NamedVoidParameter(String),

    #[error("integer literal out of range: {0}")]
    IntegerOutOfRange(String),

    #[error("operand type mismatch in {production}: {left} vs {right}")]
    OperandTypeMismatch {
        production: &'static str,
        left: String,
        right: String,
    },

    #[error("attempted to assign a {found} to {expected} var")]
    AssignmentTypeMismatch { expected: String, found: String },

    #[error("Mismatched number of arguments for '{callee}'. Found {found}, Expected {expected}")]
    ArgumentCountMismatch {
        callee: String,
        found: usize,
        expected: usize,
    },

    #[error(
        "Mismatched type of argument index {index} for '{callee}'. Found {found}, Expected {expected}"
    )]
    ArgumentTypeMismatch {
        callee: String,
        index: usize,
        found: String,
        expected: String,
    },

    #[error("{0} is not a function")]
    NotAFunction(String),

    #[error("{0} is a function, not a variable")]
    NotAVariable(String),

    #[error("Void function should not have a return value")]
    VoidFunctionReturnsValue,

    #[error("return value is invalid type: found {found}, expected {expected}")]
    ReturnTypeMismatch { expected: String, found: String },

    #[error("array index type was not int, was {0} instead")]
    ArrayIndexNotInt(String),

    #[error("{0} is not an array")]
    IndexedScalar(String),

    #[error("Main function undefined")]
    MainUndefined,
}

impl Diagnostic {
    pub fn is_syntax(&self) -> bool {
        matches!(self, Diagnostic::Syntax { .. })
    }
}
