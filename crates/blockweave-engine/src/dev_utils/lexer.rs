//! Tokens of the model notation.
//!
//! Like any good markup lexer this one is context-free: it does not know
//! whether `=` is part of an attribute or of a paragraph's text. The parser
//! decides that, and re-joins token slices into text where needed, so no
//! byte of the input is ever dropped.

use logos::Logos;

/// Token kinds produced by the Logos lexer.
///
/// `#[logos(skip r"")]` skips nothing; whitespace is a token because it is
/// significant inside text blocks.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"")]
pub enum TokenKind {
    /// `</` opening a closing tag
    #[token("</")]
    LtSlash,

    /// `<` opening a tag
    #[token("<")]
    Lt,

    /// `/>` closing an empty element
    #[token("/>")]
    SlashGt,

    #[token(">")]
    Gt,

    #[token("=")]
    Eq,

    /// `[` selection start (or a collapsed selection with `]`)
    #[token("[")]
    LBracket,

    /// `]` selection end
    #[token("]")]
    RBracket,

    /// Double-quoted attribute value, quotes included
    #[regex(r#""[^"]*""#)]
    Quoted,

    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    /// Element or attribute name
    #[regex(r"[A-Za-z$_][A-Za-z0-9$_-]*")]
    Name,

    /// Anything else
    #[regex(r#"[^<>=\[\]"\s/A-Za-z$_]+"#)]
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub offset: usize,
}

/// Lex the input into a sequence of tokens.
///
/// Every byte of the input appears in exactly one token.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        // Unrecognised input (a lone `/` or `"`) is plain text
        let kind = result.unwrap_or(TokenKind::Text);
        tokens.push(Token {
            kind,
            text: lexer.slice(),
            offset: lexer.span().start,
        });
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<(TokenKind, &str)> {
        lex(input).into_iter().map(|t| (t.kind, t.text)).collect()
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(lex(""), vec![]);
    }

    #[test]
    fn lex_element_with_attribute() {
        assert_eq!(
            kinds(r#"<paragraph listIndent="0">a</paragraph>"#),
            vec![
                (TokenKind::Lt, "<"),
                (TokenKind::Name, "paragraph"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Name, "listIndent"),
                (TokenKind::Eq, "="),
                (TokenKind::Quoted, "\"0\""),
                (TokenKind::Gt, ">"),
                (TokenKind::Name, "a"),
                (TokenKind::LtSlash, "</"),
                (TokenKind::Name, "paragraph"),
                (TokenKind::Gt, ">"),
            ]
        );
    }

    #[test]
    fn lex_selection_and_empty_element() {
        assert_eq!(
            kinds("[]<$root/>"),
            vec![
                (TokenKind::LBracket, "["),
                (TokenKind::RBracket, "]"),
                (TokenKind::Lt, "<"),
                (TokenKind::Name, "$root"),
                (TokenKind::SlashGt, "/>"),
            ]
        );
    }

    #[test]
    fn all_bytes_preserved() {
        let input = r#"<blockQuote><paragraph a="1">x = y / z[]</paragraph></blockQuote>"#;
        let reconstructed: String = lex(input).iter().map(|t| t.text).collect();
        assert_eq!(input, reconstructed);
    }
}
