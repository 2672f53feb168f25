//! Lexical analysis of an expanded command line.
//!
//! The language has no quoting: words are separated by runs of whitespace and exactly three
//! words carry meaning of their own.

/// Represents a token resulting from lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Any word that is not one of the operators below.
    Word(String),
    /// Input redirection symbol, `<`.
    RedirectLeft,
    /// Output redirection symbol, `>`.
    RedirectRight,
    /// Background marker, `&`. Only meaningful as the last token of a line.
    Ampersand,
}

impl Token {
    fn classify(word: &str) -> Token {
        match word {
            "<" => Token::RedirectLeft,
            ">" => Token::RedirectRight,
            "&" => Token::Ampersand,
            _ => Token::Word(word.to_owned()),
        }
    }

    /// The text this token was produced from.
    pub fn as_str(&self) -> &str {
        match self {
            Token::Word(w) => w,
            Token::RedirectLeft => "<",
            Token::RedirectRight => ">",
            Token::Ampersand => "&",
        }
    }
}

/// Split `line` into tokens, in order.
///
/// Operators are only recognized as whole words: `a>b` is a single word.
pub fn split_into_tokens(line: &str) -> Vec<Token> {
    line.split_whitespace().map(Token::classify).collect()
}

/// The first whitespace-separated word of `line`, if any.
pub fn first_word(line: &str) -> Option<&str> {
    line.split_whitespace().next()
}
