//! Recursive-descent parser for the restricted analysis grammar.
//!
//! The grammar is a small pandas-flavored expression language:
//! assignments, column indexing, boolean-mask filtering, method calls with
//! positional and keyword arguments, list literals, comparisons, arithmetic
//! and mask algebra (`&`, `|`, `~`). There are no loops, definitions, or
//! imports — evaluation always terminates.

use super::token::Token;
use super::SandboxError;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign { name: String, value: Expr },
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name(String),
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    List(Vec<Expr>),
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Attr {
        target: Box<Expr>,
        name: String,
    },
    Call {
        target: Box<Expr>,
        method: String,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

pub fn parse(tokens: Vec<Token>) -> Result<Vec<Stmt>, SandboxError> {
    let mut parser = Parser { tokens, pos: 0 };
    parser.parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn parse_program(&mut self) -> Result<Vec<Stmt>, SandboxError> {
        let mut stmts = Vec::new();
        loop {
            while self.peek() == Some(&Token::Newline) {
                self.advance();
            }
            if self.peek().is_none() {
                break;
            }
            stmts.push(self.parse_stmt()?);
            match self.peek() {
                None | Some(Token::Newline) => {}
                Some(other) => {
                    return Err(SandboxError::Syntax(format!(
                        "unexpected token {other:?} after statement"
                    )));
                }
            }
        }
        if stmts.is_empty() {
            return Err(SandboxError::Syntax("empty code".into()));
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, SandboxError> {
        if let Some(Token::Ident(name)) = self.peek() {
            if self.peek_at(1) == Some(&Token::Assign) {
                let name = name.clone();
                self.advance();
                self.advance();
                let value = self.parse_expr()?;
                return Ok(Stmt::Assign { name, value });
            }
        }
        Ok(Stmt::Expr(self.parse_expr()?))
    }

    fn parse_expr(&mut self) -> Result<Expr, SandboxError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, SandboxError> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Token::Pipe) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::Binary {
                op: BinOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, SandboxError> {
        let mut lhs = self.parse_cmp()?;
        while self.peek() == Some(&Token::Amp) {
            self.advance();
            let rhs = self.parse_cmp()?;
            lhs = Expr::Binary {
                op: BinOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<Expr, SandboxError> {
        let lhs = self.parse_add()?;
        let op = match self.peek() {
            Some(Token::Eq) => BinOp::Eq,
            Some(Token::Ne) => BinOp::Ne,
            Some(Token::Lt) => BinOp::Lt,
            Some(Token::Le) => BinOp::Le,
            Some(Token::Gt) => BinOp::Gt,
            Some(Token::Ge) => BinOp::Ge,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_add()?;
        Ok(Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_add(&mut self) -> Result<Expr, SandboxError> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_mul()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<Expr, SandboxError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, SandboxError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnOp::Neg,
                    operand: Box::new(operand),
                })
            }
            Some(Token::Tilde) => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnOp::Not,
                    operand: Box::new(operand),
                })
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, SandboxError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.advance();
                    let name = match self.advance() {
                        Some(Token::Ident(name)) => name,
                        other => {
                            return Err(SandboxError::Syntax(format!(
                                "expected attribute name after '.', got {other:?}"
                            )));
                        }
                    };
                    if self.peek() == Some(&Token::LParen) {
                        self.advance();
                        let (args, kwargs) = self.parse_call_args()?;
                        expr = Expr::Call {
                            target: Box::new(expr),
                            method: name,
                            args,
                            kwargs,
                        };
                    } else {
                        expr = Expr::Attr {
                            target: Box::new(expr),
                            name,
                        };
                    }
                }
                Some(Token::LBracket) => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(Token::RBracket)?;
                    expr = Expr::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_call_args(&mut self) -> Result<(Vec<Expr>, Vec<(String, Expr)>), SandboxError> {
        let mut args = Vec::new();
        let mut kwargs = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.advance();
            return Ok((args, kwargs));
        }
        loop {
            // keyword argument: ident '=' expr
            if let Some(Token::Ident(name)) = self.peek() {
                if self.peek_at(1) == Some(&Token::Assign) {
                    let name = name.clone();
                    self.advance();
                    self.advance();
                    kwargs.push((name, self.parse_expr()?));
                } else {
                    args.push(self.parse_expr()?);
                }
            } else {
                args.push(self.parse_expr()?);
            }
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => break,
                other => {
                    return Err(SandboxError::Syntax(format!(
                        "expected ',' or ')' in call arguments, got {other:?}"
                    )));
                }
            }
        }
        Ok((args, kwargs))
    }

    fn parse_primary(&mut self) -> Result<Expr, SandboxError> {
        match self.advance() {
            Some(Token::Ident(name)) => match name.as_str() {
                "True" => Ok(Expr::Bool(true)),
                "False" => Ok(Expr::Bool(false)),
                _ => Ok(Expr::Name(name)),
            },
            Some(Token::Int(v)) => Ok(Expr::Int(v)),
            Some(Token::Float(v)) => Ok(Expr::Float(v)),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::LBracket) => {
                let mut items = Vec::new();
                if self.peek() == Some(&Token::RBracket) {
                    self.advance();
                    return Ok(Expr::List(items));
                }
                loop {
                    items.push(self.parse_expr()?);
                    match self.advance() {
                        Some(Token::Comma) => continue,
                        Some(Token::RBracket) => break,
                        other => {
                            return Err(SandboxError::Syntax(format!(
                                "expected ',' or ']' in list, got {other:?}"
                            )));
                        }
                    }
                }
                Ok(Expr::List(items))
            }
            Some(Token::LParen) => {
                let expr = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            other => Err(SandboxError::Syntax(format!(
                "unexpected token {other:?}"
            ))),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), SandboxError> {
        match self.advance() {
            Some(ref token) if *token == expected => Ok(()),
            other => Err(SandboxError::Syntax(format!(
                "expected {expected:?}, got {other:?}"
            ))),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::token::tokenize;

    fn parse_src(src: &str) -> Result<Vec<Stmt>, SandboxError> {
        parse(tokenize(src).unwrap())
    }

    #[test]
    fn parses_assignment() {
        let stmts = parse_src("result = df['a'].sum()").unwrap();
        assert_eq!(stmts.len(), 1);
        match &stmts[0] {
            Stmt::Assign { name, value } => {
                assert_eq!(name, "result");
                assert!(matches!(value, Expr::Call { method, .. } if method == "sum"));
            }
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn parses_mask_filter() {
        let stmts = parse_src("df[df['a'] > 2]").unwrap();
        match &stmts[0] {
            Stmt::Expr(Expr::Index { index, .. }) => {
                assert!(matches!(**index, Expr::Binary { op: BinOp::Gt, .. }));
            }
            other => panic!("expected index expression, got {other:?}"),
        }
    }

    #[test]
    fn parses_kwargs_and_bools() {
        let stmts = parse_src("df.sort_values('a', ascending=False)").unwrap();
        match &stmts[0] {
            Stmt::Expr(Expr::Call { kwargs, .. }) => {
                assert_eq!(kwargs.len(), 1);
                assert_eq!(kwargs[0].0, "ascending");
                assert_eq!(kwargs[0].1, Expr::Bool(false));
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn parses_multiple_statements() {
        let stmts = parse_src("tmp = df[df['a'] > 1]\nresult = tmp['b'].mean()").unwrap();
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn mask_algebra_binds_looser_than_comparison() {
        let stmts = parse_src("(df['a'] > 1) & (df['b'] < 2)").unwrap();
        match &stmts[0] {
            Stmt::Expr(Expr::Binary { op, .. }) => assert_eq!(*op, BinOp::And),
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse_src("df['a'] df").is_err());
        assert!(parse_src("df[").is_err());
        assert!(parse_src("= 3").is_err());
    }
}
