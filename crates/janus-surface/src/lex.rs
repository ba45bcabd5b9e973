use logos::Logos;
use std::fmt;

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub enum LexicalError {
    #[default]
    InvalidToken,
}

impl fmt::Display for LexicalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexicalError::InvalidToken => f.write_str("invalid token"),
        }
    }
}

/// Surface tokens. Every operator has an ASCII and a Unicode face; reserved
/// words lex as their own tokens and so can never be mistaken for
/// identifiers.
#[derive(Logos, Clone, Debug, PartialEq, Eq)]
#[logos(error = LexicalError)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"--[^\n]*")]
#[logos(skip r"\{-[^-]*-+(?:[^}-][^-]*-+)*\}")]
pub enum Token {
    #[token("assume", priority = 4)]
    Assume,
    #[token("let", priority = 4)]
    Let,
    #[token("in", priority = 4)]
    In,
    #[token("forall", priority = 4)]
    #[token("∀", priority = 4)]
    Forall,
    #[token("fst", priority = 4)]
    Fst,
    #[token("snd", priority = 4)]
    Snd,
    #[token("putStrLn", priority = 4)]
    PutStrLn,
    #[token("out", priority = 4)]
    Out,
    #[token("U", priority = 4)]
    #[token("𝘜", priority = 4)]
    Universe,
    #[token("I", priority = 4)]
    #[token("𝟭ₘ", priority = 4)]
    TensorUnitTy,
    #[token("T", priority = 4)]
    #[token("⊤", priority = 4)]
    WithUnitTy,
    #[token("0", priority = 4)]
    UsageZero,
    #[token("1", priority = 4)]
    UsageOne,
    #[token("w", priority = 4)]
    #[token("ω", priority = 4)]
    UsageMany,
    #[token("->", priority = 5)]
    #[token("→", priority = 5)]
    Arrow,
    #[token("\\", priority = 5)]
    #[token("λ", priority = 5)]
    Lambda,
    #[token("*", priority = 5)]
    #[token("⊗", priority = 5)]
    Star,
    #[token("&", priority = 5)]
    Amp,
    #[token("<>", priority = 6)]
    #[token("⟨⟩", priority = 6)]
    WithUnit,
    #[token("<", priority = 5)]
    #[token("⟨", priority = 5)]
    LAngle,
    #[token(">", priority = 5)]
    #[token("⟩", priority = 5)]
    RAngle,
    #[token("(", priority = 5)]
    LParen,
    #[token(")", priority = 5)]
    RParen,
    #[token(",", priority = 5)]
    Comma,
    #[token(":", priority = 5)]
    Colon,
    #[token(".", priority = 5)]
    Dot,
    #[token("=", priority = 5)]
    Equals,
    #[token("@", priority = 5)]
    At,
    #[regex(r"[A-Za-z_][A-Za-z0-9_']*", |lex| lex.slice().to_string(), priority = 2)]
    Ident(String),
    #[regex(r#""[^"]*""#, |lex| {
        let slice = lex.slice();
        slice[1..slice.len() - 1].to_string()
    })]
    Str(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "identifier {}", name),
            Token::Str(_) => f.write_str("string literal"),
            token => write!(f, "{:?}", token),
        }
    }
}

pub type Span = std::ops::Range<usize>;

/// Lex a whole input buffer, reporting the offset of the first bad token.
pub fn tokenize(input: &str) -> Result<Vec<(Token, Span)>, Span> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(input).spanned() {
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(LexicalError::InvalidToken) => return Err(span),
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input)
            .expect("lexing failed")
            .into_iter()
            .map(|(token, _)| token)
            .collect()
    }

    #[test]
    fn ascii_and_unicode_faces_lex_alike() {
        assert_eq!(kinds("->"), kinds("→"));
        assert_eq!(kinds("\\"), kinds("λ"));
        assert_eq!(kinds("*"), kinds("⊗"));
        assert_eq!(kinds("U"), kinds("𝘜"));
        assert_eq!(kinds("I"), kinds("𝟭ₘ"));
        assert_eq!(kinds("T"), kinds("⊤"));
        assert_eq!(kinds("w"), kinds("ω"));
        assert_eq!(kinds("<>"), kinds("⟨⟩"));
    }

    #[test]
    fn keywords_never_lex_as_identifiers() {
        for (input, expected) in [
            ("assume", Token::Assume),
            ("let", Token::Let),
            ("in", Token::In),
            ("forall", Token::Forall),
            ("fst", Token::Fst),
            ("snd", Token::Snd),
            ("U", Token::Universe),
            ("I", Token::TensorUnitTy),
            ("T", Token::WithUnitTy),
        ] {
            assert_eq!(kinds(input), vec![expected]);
        }
    }

    #[test]
    fn longer_identifiers_win_over_keyword_prefixes() {
        assert_eq!(kinds("lettuce"), vec![Token::Ident("lettuce".into())]);
        assert_eq!(kinds("Unit"), vec![Token::Ident("Unit".into())]);
        assert_eq!(kinds("water"), vec![Token::Ident("water".into())]);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(kinds("a -- trailing words\nb"), kinds("a b"));
        assert_eq!(kinds("a {- a block\n comment -} b"), kinds("a b"));
        assert_eq!(kinds("a {- dashes -- inside -} b"), kinds("a b"));
    }

    #[test]
    fn statements_lex_to_the_expected_shapes() {
        assert_eq!(
            kinds("assume (0 a : U) (1 x : a)"),
            vec![
                Token::Assume,
                Token::LParen,
                Token::UsageZero,
                Token::Ident("a".into()),
                Token::Colon,
                Token::Universe,
                Token::RParen,
                Token::LParen,
                Token::UsageOne,
                Token::Ident("x".into()),
                Token::Colon,
                Token::Ident("a".into()),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn string_literals_keep_their_contents() {
        assert_eq!(
            kinds(r#"putStrLn "hello""#),
            vec![Token::PutStrLn, Token::Str("hello".into())]
        );
    }

    #[test]
    fn angle_pairs_lex_as_brackets() {
        assert_eq!(
            kinds("<a, b>"),
            vec![
                Token::LAngle,
                Token::Ident("a".into()),
                Token::Comma,
                Token::Ident("b".into()),
                Token::RAngle,
            ]
        );
    }
}
