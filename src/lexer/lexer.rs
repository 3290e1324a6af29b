use log::trace;

use super::{Token, TokenClass, KEYWORDS};

/// Non-extendable single-character operators.
const SIMPLE_OPERATORS: &[char] = &[
    '+', '-', '*', '/', ';', ',', '(', ')', '[', ']', '{', '}',
];

/// Character-level tokenizer for C-.
///
/// Lines are scanned one at a time; the only state that survives a line
/// boundary is the block-comment nesting depth. A `Lexer` value is scoped to
/// a single source file, nothing leaks between files.
#[derive(Debug)]
pub struct Lexer {
    tokens: Vec<Token>,
    comment_depth: usize,
}

impl Lexer {
    pub fn new() -> Self {
        Self {
            tokens: vec![],
            comment_depth: 0,
        }
    }

    pub fn tokenize(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new();
        for line in source.lines() {
            lexer.push_line(line);
        }
        lexer.into_tokens()
    }

    /// Current block-comment nesting depth.
    pub fn comment_depth(&self) -> usize {
        self.comment_depth
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    /// Scans one source line. The line is right-padded with a space so a
    /// trailing token is always flushed.
    pub fn push_line(&mut self, line: &str) {
        let line = line.replace('\t', " ");
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        let mut chars: Vec<char> = line.chars().collect();
        chars.push(' ');
        self.scan_line(&chars);
    }

    fn scan_line(&mut self, chars: &[char]) {
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            match c {
                ' ' => i += 1,
                '/' => match chars.get(i + 1) {
                    Some('*') => {
                        self.comment_depth += 1;
                        i += 2;
                    }
                    // line comment, the rest of the line is discarded
                    Some('/') => return,
                    _ => {
                        self.complete("/", TokenClass::Operator);
                        i += 1;
                    }
                },
                '*' => {
                    if self.comment_depth > 0 && chars.get(i + 1) == Some(&'/') {
                        self.comment_depth -= 1;
                        i += 2;
                    } else {
                        self.complete("*", TokenClass::Operator);
                        i += 1;
                    }
                }
                '<' | '>' | '!' | '=' => {
                    if chars.get(i + 1) == Some(&'=') {
                        let lexeme: String = [c, '='].iter().collect();
                        self.complete(&lexeme, TokenClass::Operator);
                        i += 2;
                    } else if c == '!' {
                        // a lone bang is not a valid C- operator
                        self.complete("!", TokenClass::Error);
                        i += 1;
                    } else {
                        self.complete(&c.to_string(), TokenClass::Operator);
                        i += 1;
                    }
                }
                c if c.is_ascii_alphabetic() => i = self.scan_word(chars, i),
                c if c.is_ascii_digit() => i = self.scan_number(chars, i),
                c if SIMPLE_OPERATORS.contains(&c) => {
                    self.complete(&c.to_string(), TokenClass::Operator);
                    i += 1;
                }
                _ => i = self.scan_garbage(chars, i),
            }
        }
    }

    /// keyword-or-identifier: accumulate while alphabetic, then classify
    /// against the keyword set.
    fn scan_word(&mut self, chars: &[char], mut i: usize) -> usize {
        let start = i;
        while chars[i].is_ascii_alphabetic() {
            i += 1;
        }
        let word: String = chars[start..i].iter().collect();

        let class = if KEYWORDS.contains(&word) {
            TokenClass::Keyword
        } else {
            TokenClass::Identifier
        };
        self.complete(&word, class);
        i
    }

    /// number-or-float: a first `.` or `E` upgrades the token to a float; a
    /// second of either degrades it to an error token that then accumulates
    /// until whitespace. A sign joins the token only right after the `E`.
    fn scan_number(&mut self, chars: &[char], mut i: usize) -> usize {
        let start = i;
        let mut class = TokenClass::Number;
        let mut has_dot = false;
        let mut has_exp = false;
        let mut has_sign = false;
        let mut prev = chars[i];
        i += 1;

        loop {
            let c = chars[i];
            if class == TokenClass::Error {
                if c == ' ' {
                    break;
                }
            } else {
                match c {
                    d if d.is_ascii_digit() => {}
                    '.' => {
                        if has_dot {
                            class = TokenClass::Error;
                        } else {
                            has_dot = true;
                            class = TokenClass::Float;
                        }
                    }
                    'E' => {
                        if has_exp {
                            class = TokenClass::Error;
                        } else {
                            has_exp = true;
                            class = TokenClass::Float;
                        }
                    }
                    '+' | '-' => {
                        if prev != 'E' {
                            // not an exponent sign, ends the number
                            break;
                        }
                        if has_sign {
                            class = TokenClass::Error;
                        }
                        has_sign = true;
                    }
                    _ => break,
                }
            }
            prev = c;
            i += 1;
        }

        let lexeme: String = chars[start..i].iter().collect();
        self.complete(&lexeme, class);
        i
    }

    /// error state: unknown characters accumulate until whitespace.
    fn scan_garbage(&mut self, chars: &[char], mut i: usize) -> usize {
        let start = i;
        while chars[i] != ' ' {
            i += 1;
        }
        let lexeme: String = chars[start..i].iter().collect();
        self.complete(&lexeme, TokenClass::Error);
        i
    }

    /// Flushes a completed token. Anything inside a block comment is
    /// discarded; error tokens are kept so the parser can reject them.
    fn complete(&mut self, lexeme: &str, class: TokenClass) {
        if lexeme.is_empty() || self.comment_depth > 0 {
            return;
        }
        trace!("token [{}] {}", class, lexeme);
        self.tokens.push(Token::new(lexeme, class));
    }
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}
