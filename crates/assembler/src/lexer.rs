//! Tokenization for program assembly.
//!
//! Uses the logos crate for fast lexical analysis.

use logos::Logos;

/// Where a jump goes: a named label or an absolute byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Label(String),
    Offset(u32),
}

/// Token types for assembly source
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")] // Skip whitespace
#[logos(skip r";[^\n]*")] // Skip comments
pub enum Token {
    /// `JUMP:$label`, `JUMPIF:$label` or the same with a numeric offset.
    #[regex(r"(op_)?jump(if)?:(\$[A-Za-z_][A-Za-z0-9_]*|[0-9]+)", parse_jump, ignore(ascii_case))]
    Jump((bool, Target)),

    /// `$name` on its own defines a label at the current offset.
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Label(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Number(i64),

    #[regex(r"0x[0-9a-fA-F]*", parse_hex, priority = 10)]
    Data(Vec<u8>),

    #[regex(r"'[^']*'", |lex| { let s = lex.slice(); s[1..s.len() - 1].as_bytes().to_vec() })]
    Text(Vec<u8>),

    /// Opcode names. Some start with a digit (`2DUP`, `0NOTEQUAL`).
    #[regex(r"[0-9]*[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Word(String),
}

fn parse_jump(lex: &mut logos::Lexer<Token>) -> Option<(bool, Target)> {
    let (op, target) = lex.slice().split_once(':')?;
    let conditional = op.to_ascii_uppercase().ends_with("IF");
    let target = match target.strip_prefix('$') {
        Some(label) => Target::Label(label.to_string()),
        None => Target::Offset(target.parse().ok()?),
    };
    Some((conditional, target))
}

/// Parse `0x` hex data. Odd digit counts are rejected.
fn parse_hex(lex: &mut logos::Lexer<Token>) -> Option<Vec<u8>> {
    hex::decode(&lex.slice()[2..]).ok()
}

/// Lexer wrapper that tracks line numbers
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
    source: &'source str,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
            source,
        }
    }

    fn line_at_pos(&self, pos: usize) -> usize {
        1 + self.source[..pos].chars().filter(|c| *c == '\n').count()
    }
}

/// A token, or the text that failed to lex.
pub type Lexed = Result<Token, String>;

impl<'source> Iterator for Lexer<'source> {
    type Item = (Lexed, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.inner.next()?;
        let line = self.line_at_pos(self.inner.span().start);
        let token = token.map_err(|_| self.inner.slice().to_string());
        Some((token, line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        Lexer::new(source).map(|(t, _)| t.unwrap()).collect()
    }

    #[test]
    fn test_tokenize_simple() {
        assert_eq!(
            tokens("DUP 5 ADD"),
            vec![
                Token::Word("DUP".to_string()),
                Token::Number(5),
                Token::Word("ADD".to_string()),
            ]
        );
    }

    #[test]
    fn test_digit_leading_names() {
        assert_eq!(
            tokens("2DUP 0NOTEQUAL -1 1NEGATE"),
            vec![
                Token::Word("2DUP".to_string()),
                Token::Word("0NOTEQUAL".to_string()),
                Token::Number(-1),
                Token::Word("1NEGATE".to_string()),
            ]
        );
    }

    #[test]
    fn test_data_literals() {
        assert_eq!(
            tokens("0xdeadBEEF 0x 'hi there'"),
            vec![
                Token::Data(vec![0xde, 0xad, 0xbe, 0xef]),
                Token::Data(Vec::new()),
                Token::Text(b"hi there".to_vec()),
            ]
        );
    }

    #[test]
    fn test_odd_hex_is_an_error() {
        let items: Vec<_> = Lexer::new("0xabc").collect();
        assert!(items[0].0.is_err());
    }

    #[test]
    fn test_labels_and_jumps() {
        assert_eq!(
            tokens("$loop jumpif:$loop JUMP:12 op_jump:$end"),
            vec![
                Token::Label("loop".to_string()),
                Token::Jump((true, Target::Label("loop".to_string()))),
                Token::Jump((false, Target::Offset(12))),
                Token::Jump((false, Target::Label("end".to_string()))),
            ]
        );
    }

    #[test]
    fn test_skip_comments() {
        assert_eq!(
            tokens("1 ; push one\n2 ; push two"),
            vec![Token::Number(1), Token::Number(2)]
        );
    }

    #[test]
    fn test_line_tracking() {
        let items: Vec<_> = Lexer::new("1 2\nADD\n\nVERIFY").collect();
        let lines: Vec<_> = items.iter().map(|(_, l)| *l).collect();
        assert_eq!(lines, vec![1, 1, 2, 4]);
    }
}
