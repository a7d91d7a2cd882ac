//! Jack tokenizer.
//!
//! An external collaborator per spec's §1 ("The lexer that yields a flat
//! sequence of typed tokens"), but implemented here since the crate has no
//! other source of tokens. Strips `//` line comments and `/* ... */` /
//! `/** ... */` block comments, then splits the remainder into
//! [`Token`](crate::token::Token)s.

use crate::token::{Token, TokenKind, KEYWORDS, SYMBOLS};

/// A lexical error: the input could not be split into tokens at all
/// (unterminated string or block comment). Distinct from [`crate::error::CompileError`]
/// — this is a syntax-level failure, not a core semantic one.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub line: usize,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for LexError {}

/// Tokenize a full Jack source file.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut line = 1;

    while i < chars.len() {
        let c = chars[i];

        if c == '\n' {
            line += 1;
            i += 1;
            continue;
        }

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // Line comment.
        if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }

        // Block comment (covers both `/* */` and `/** */`).
        if c == '/' && chars.get(i + 1) == Some(&'*') {
            let start_line = line;
            i += 2;
            let mut closed = false;
            while i < chars.len() {
                if chars[i] == '\n' {
                    line += 1;
                }
                if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                    i += 2;
                    closed = true;
                    break;
                }
                i += 1;
            }
            if !closed {
                return Err(LexError {
                    message: "unterminated block comment".to_string(),
                    line: start_line,
                });
            }
            continue;
        }

        if c == '"' {
            let start_line = line;
            i += 1;
            let mut s = String::new();
            let mut closed = false;
            while i < chars.len() {
                if chars[i] == '"' {
                    i += 1;
                    closed = true;
                    break;
                }
                if chars[i] == '\n' {
                    break;
                }
                s.push(chars[i]);
                i += 1;
            }
            if !closed {
                return Err(LexError {
                    message: "unterminated string literal".to_string(),
                    line: start_line,
                });
            }
            tokens.push(Token::new(TokenKind::StringConstant, s, start_line));
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let lexeme: String = chars[start..i].iter().collect();
            tokens.push(Token::new(TokenKind::IntegerConstant, lexeme, line));
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let lexeme: String = chars[start..i].iter().collect();
            let kind = if KEYWORDS.contains(&lexeme.as_str()) {
                TokenKind::Keyword
            } else {
                TokenKind::Identifier
            };
            tokens.push(Token::new(kind, lexeme, line));
            continue;
        }

        if SYMBOLS.contains(c) {
            tokens.push(Token::new(TokenKind::Symbol, c.to_string(), line));
            i += 1;
            continue;
        }

        return Err(LexError {
            message: format!("unexpected character '{}'", c),
            line,
        });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_class_skeleton() {
        let tokens = tokenize("class Main {\n}\n").unwrap();
        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["class", "Main", "{", "}"]);
    }

    #[test]
    fn strips_line_and_block_comments() {
        let src = "// leading\nclass /* inline */ Main {\n/** doc\n * block\n */\n}\n";
        let tokens = tokenize(src).unwrap();
        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["class", "Main", "{", "}"]);
    }

    #[test]
    fn recognizes_integer_and_string_constants() {
        let tokens = tokenize("42 \"hi\"").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::IntegerConstant);
        assert_eq!(tokens[0].lexeme, "42");
        assert_eq!(tokens[1].kind, TokenKind::StringConstant);
        assert_eq!(tokens[1].lexeme, "hi");
    }

    #[test]
    fn distinguishes_keywords_from_identifiers() {
        let tokens = tokenize("let x").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = tokenize("\"oops").unwrap_err();
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn unterminated_block_comment_is_an_error() {
        let err = tokenize("/* never closes").unwrap_err();
        assert!(err.message.contains("unterminated block comment"));
    }

    #[test]
    fn line_numbers_advance_across_newlines() {
        let tokens = tokenize("class\nMain").unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
    }
}
