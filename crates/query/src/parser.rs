/// Recursive-descent parser for the Karp-s query DSL.
///
/// ```text
/// query    ::= boolop "(" subquery ("||" subquery)* ")" | subquery
/// boolop   ::= "and" | "or"
/// subquery ::= op "|" field "|" value
/// op       ::= "equals" | "startswith" | "endswith" | "contains"
///            | "regexp" | "lt" | "lte" | "gt" | "gte"
/// ```
use std::fmt;

use crate::ast::{BoolOp, PredicateOp, Query, SubQuery};
use crate::lexer::{Lexer, LexerError, Token};

pub struct Parser {
    lexer: Lexer,
}

impl Parser {
    pub fn new(input: &str) -> Self {
        Self {
            lexer: Lexer::new(input),
        }
    }

    /// Parses `input`. A missing/empty input yields an empty predicate tree;
    /// any other malformed input raises a [`ParseError`] (a user error).
    pub fn parse(input: &str) -> Result<Query, ParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Query::empty());
        }
        let mut parser = Parser::new(trimmed);
        parser.parse_query()
    }

    fn parse_query(&mut self) -> Result<Query, ParseError> {
        let first = self.next_token()?;
        match first {
            Token::Identifier(ident) if is_boolop(&ident) => {
                let op = boolop_from_name(&ident).expect("checked by is_boolop");
                self.expect(Token::LParen)?;
                let mut clauses = vec![self.parse_subquery()?];
                loop {
                    match self.next_token()? {
                        Token::DoublePipe => clauses.push(self.parse_subquery()?),
                        Token::RParen => break,
                        other => return Err(ParseError::new(format!("expected '||' or ')', found '{}'", other))),
                    }
                }
                Ok(Query { op, clauses })
            }
            Token::Identifier(op_name) => {
                let clause = self.parse_subquery_from_op(op_name)?;
                Ok(Query {
                    op: BoolOp::And,
                    clauses: vec![clause],
                })
            }
            other => Err(ParseError::new(format!("expected query, found '{}'", other))),
        }
    }

    fn parse_subquery(&mut self) -> Result<SubQuery, ParseError> {
        let op_name = self.expect_identifier()?;
        self.parse_subquery_from_op(op_name)
    }

    fn parse_subquery_from_op(&mut self, op_name: String) -> Result<SubQuery, ParseError> {
        let op = PredicateOp::from_name(&op_name)
            .ok_or_else(|| ParseError::new(format!("unknown operator '{}'", op_name)))?;
        self.expect(Token::Pipe)?;
        let field = self.expect_identifier()?;
        self.expect(Token::Pipe)?;
        let value = self.lexer.read_value();
        Ok(SubQuery { op, field, value })
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.lexer.next_token().map_err(ParseError::from)
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        let found = self.next_token()?;
        if found == expected {
            Ok(())
        } else {
            Err(ParseError::new(format!("expected '{}', found '{}'", expected, found)))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match self.next_token()? {
            Token::Identifier(s) => Ok(s),
            other => Err(ParseError::new(format!("expected identifier, found '{}'", other))),
        }
    }
}

fn is_boolop(s: &str) -> bool {
    matches!(s, "and" | "or")
}

fn boolop_from_name(s: &str) -> Option<BoolOp> {
    match s {
        "and" => Some(BoolOp::And),
        "or" => Some(BoolOp::Or),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    fn new(message: String) -> Self {
        ParseError { message }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<LexerError> for ParseError {
    fn from(e: LexerError) -> Self {
        ParseError::new(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::PredicateOp;

    #[test]
    fn test_empty_query() {
        let q = Parser::parse("").unwrap();
        assert!(q.is_empty());
    }

    #[test]
    fn test_single_subquery() {
        let q = Parser::parse("equals|entryWord|eventuell").unwrap();
        assert_eq!(q.op, BoolOp::And);
        assert_eq!(q.clauses.len(), 1);
        assert_eq!(q.clauses[0].op, PredicateOp::Equals);
        assert_eq!(q.clauses[0].field, "entryWord");
        assert_eq!(q.clauses[0].value, "eventuell");
    }

    #[test]
    fn test_and_group() {
        let q = Parser::parse("and(equals|pos|nn||contains|senses|water)").unwrap();
        assert_eq!(q.op, BoolOp::And);
        assert_eq!(q.clauses.len(), 2);
        assert_eq!(q.clauses[1].op, PredicateOp::Contains);
        assert_eq!(q.clauses[1].field, "senses");
        assert_eq!(q.clauses[1].value, "water");
    }

    #[test]
    fn test_or_group() {
        let q = Parser::parse("or(equals|pos|nn||equals|pos|vb)").unwrap();
        assert_eq!(q.op, BoolOp::Or);
        assert_eq!(q.clauses.len(), 2);
    }

    #[test]
    fn test_doubled_single_quote_is_not_a_pipe_escape() {
        let q = Parser::parse("equals|form|o''clock").unwrap();
        assert_eq!(q.clauses[0].value, "o''clock");
    }

    #[test]
    fn test_bare_subquery_value_stops_at_doubled_pipe() {
        // `||` is always the group separator, never an escaped literal pipe,
        // so a bare (ungrouped) subquery's value ends there too.
        let q = Parser::parse("equals|form|a||b").unwrap();
        assert_eq!(q.clauses[0].value, "a");
    }

    #[test]
    fn test_unknown_operator_is_parse_error() {
        let err = Parser::parse("bogus|field|value").unwrap_err();
        assert!(err.message.contains("bogus"));
    }

    #[test]
    fn test_malformed_missing_pipe() {
        assert!(Parser::parse("equalsfield value").is_err());
    }
}
