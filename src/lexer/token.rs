use std::fmt;

use phf::phf_set;

/// The fixed C- keyword set.
pub static KEYWORDS: phf::Set<&'static str> = phf_set! {
    "else",
    "if",
    "int",
    "return",
    "void",
    "while",
    "float",
    "break",
    "continue",
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenClass {
    Keyword,
    Identifier,
    Number,
    Float,
    Operator,
    Error,
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            TokenClass::Keyword => "KEYWORD",
            TokenClass::Identifier => "IDENTIFIER",
            TokenClass::Number => "NUMBER",
            TokenClass::Float => "FLOAT",
            TokenClass::Operator => "OPERATOR",
            TokenClass::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// One classified lexeme. Comments and whitespace never make it this far.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub lexeme: String,
    pub class: TokenClass,
}

impl Token {
    pub fn new(lexeme: impl Into<String>, class: TokenClass) -> Self {
        Self {
            lexeme: lexeme.into(),
            class,
        }
    }

    pub fn is(&self, class: TokenClass, lexeme: &str) -> bool {
        self.class == class && self.lexeme == lexeme
    }

    pub fn is_operator(&self, lexeme: &str) -> bool {
        self.is(TokenClass::Operator, lexeme)
    }

    pub fn is_keyword(&self, lexeme: &str) -> bool {
        self.is(TokenClass::Keyword, lexeme)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] {}", self.class, self.lexeme)
    }
}
