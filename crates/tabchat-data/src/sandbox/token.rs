//! Tokenizer for analysis snippets.

use super::SandboxError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Dot,
    Newline,
    Assign,
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
    Plus,
    Minus,
    Star,
    Slash,
    Amp,
    Pipe,
    Tilde,
}

pub fn tokenize(src: &str) -> Result<Vec<Token>, SandboxError> {
    let mut tokens = Vec::new();
    let mut chars = src.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            ' ' | '\t' | '\r' => {
                chars.next();
            }
            '\n' | ';' => {
                chars.next();
                tokens.push(Token::Newline);
            }
            '#' => {
                // comment to end of line
                for c in chars.by_ref() {
                    if c == '\n' {
                        tokens.push(Token::Newline);
                        break;
                    }
                }
            }
            '\'' | '"' => {
                let quote = ch;
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == quote {
                        closed = true;
                        break;
                    }
                    text.push(c);
                }
                if !closed {
                    return Err(SandboxError::Syntax("unterminated string literal".into()));
                }
                tokens.push(Token::Str(text));
            }
            '0'..='9' => {
                let mut text = String::new();
                let mut is_float = false;
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        chars.next();
                    } else if c == '.' && !is_float {
                        is_float = true;
                        text.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if is_float {
                    let value: f64 = text
                        .parse()
                        .map_err(|_| SandboxError::Syntax(format!("bad number literal '{text}'")))?;
                    tokens.push(Token::Float(value));
                } else {
                    let value: i64 = text
                        .parse()
                        .map_err(|_| SandboxError::Syntax(format!("bad number literal '{text}'")))?;
                    tokens.push(Token::Int(value));
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(name));
            }
            '[' => {
                chars.next();
                tokens.push(Token::LBracket);
            }
            ']' => {
                chars.next();
                tokens.push(Token::RBracket);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '.' => {
                chars.next();
                tokens.push(Token::Dot);
            }
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Eq);
                } else {
                    tokens.push(Token::Assign);
                }
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Ne);
                } else {
                    return Err(SandboxError::Syntax("unexpected character '!'".into()));
                }
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Le);
                } else {
                    tokens.push(Token::Lt);
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Ge);
                } else {
                    tokens.push(Token::Gt);
                }
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '&' => {
                chars.next();
                tokens.push(Token::Amp);
            }
            '|' => {
                chars.next();
                tokens.push(Token::Pipe);
            }
            '~' => {
                chars.next();
                tokens.push(Token::Tilde);
            }
            other => {
                return Err(SandboxError::Syntax(format!(
                    "unexpected character '{other}'"
                )));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_assignment_and_index() {
        let tokens = tokenize("result = df['a']").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("result".into()),
                Token::Assign,
                Token::Ident("df".into()),
                Token::LBracket,
                Token::Str("a".into()),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn distinguishes_assign_from_eq() {
        let tokens = tokenize("x == 1").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Ident("x".into()), Token::Eq, Token::Int(1)]
        );
    }

    #[test]
    fn numbers_and_floats() {
        let tokens = tokenize("1 2.5").unwrap();
        assert_eq!(tokens, vec![Token::Int(1), Token::Float(2.5)]);
    }

    #[test]
    fn rejects_unterminated_string() {
        let err = tokenize("df['a").unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn rejects_unknown_character() {
        assert!(tokenize("df @ 1").is_err());
    }

    #[test]
    fn comments_are_skipped() {
        let tokens = tokenize("# note\nx").unwrap();
        assert_eq!(tokens, vec![Token::Newline, Token::Ident("x".into())]);
    }
}
