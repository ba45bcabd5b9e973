use crate::lex::{tokenize, Span, Token};
use janus_core::syntax::{Checkable, Inferable, RcCheckable, RcInferable};
use janus_core::{Index, Multiplicity, Name, Symbol};
use std::fmt;
use std::rc::Rc;
use std::sync::OnceLock;

/// A parse failure, with the byte offset it occurred at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub message: String,
    pub offset: usize,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assume(Vec<AssumeBinding>),
    Let(Multiplicity, Symbol, RcInferable),
    Eval(Multiplicity, RcInferable),
    PutStrLn(String),
    Out(String),
}

/// One `(q x : τ)` group of an `assume` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct AssumeBinding {
    pub multiplicity: Multiplicity,
    pub name: Symbol,
    pub ty: RcCheckable,
}

/// Parse a whole buffer of statements.
pub fn parse_statements(input: &str) -> Result<Vec<Stmt>> {
    let mut parser = Parser::new(input)?;
    let mut statements = Vec::new();
    while !parser.at_end() {
        statements.push(parser.p_stmt()?);
    }
    Ok(statements)
}

/// Parse a single inferable term, e.g. for `:type`.
pub fn parse_inferable(input: &str) -> Result<RcInferable> {
    let mut parser = Parser::new(input)?;
    let term = parser.p_iterm()?;
    if !parser.at_end() {
        return Err(parser.err("unexpected input after the term"));
    }
    Ok(term)
}

/// Names in scope during term parsing; occurrences resolve to de Bruijn
/// indices by reverse search, so inner binders shadow outer ones.
struct BindingEnv {
    names: Vec<String>,
}

impl BindingEnv {
    fn new() -> BindingEnv {
        BindingEnv { names: Vec::new() }
    }

    fn push(&mut self, name: String) {
        self.names.push(name);
    }

    fn find(&self, name: &str) -> Option<Index> {
        for (i, n) in self.names.iter().rev().enumerate() {
            if name == n.as_str() {
                return Some(Index::new(i));
            }
        }
        None
    }

    fn depth(&self) -> usize {
        self.names.len()
    }

    fn reset(&mut self, depth: usize) {
        self.names.truncate(depth);
    }
}

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    end: usize,
    scope: BindingEnv,
}

impl Parser {
    fn new(input: &str) -> Result<Parser> {
        let tokens = tokenize(input).map_err(|span| Error {
            message: "invalid token".to_string(),
            offset: span.start,
        })?;
        Ok(Parser {
            tokens,
            pos: 0,
            end: input.len(),
            scope: BindingEnv::new(),
        })
    }

    fn trace(&self, rule: &str) {
        static ENABLED: OnceLock<bool> = OnceLock::new();
        if *ENABLED.get_or_init(|| std::env::var_os("JANUS_TRACE").is_some()) {
            eprintln!("parse: {} at offset {}", rule, self.offset());
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn offset(&self) -> usize {
        match self.tokens.get(self.pos) {
            Some((_, span)) => span.start,
            None => self.end,
        }
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn at(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.at(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, message: &str) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.err(message))
        }
    }

    fn eat_ident(&mut self) -> Option<String> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        }
    }

    fn expect_ident(&mut self, message: &str) -> Result<String> {
        self.eat_ident().ok_or_else(|| self.err(message))
    }

    fn err(&self, message: &str) -> Error {
        Error {
            message: message.to_string(),
            offset: self.offset(),
        }
    }

    /// Save point for backtracking: token position and scope depth.
    fn save(&self) -> (usize, usize) {
        (self.pos, self.scope.depth())
    }

    fn restore(&mut self, (pos, depth): (usize, usize)) {
        self.pos = pos;
        self.scope.reset(depth);
    }

    ////////////////////////////
    // Statements

    fn p_stmt(&mut self) -> Result<Stmt> {
        self.trace("p_stmt");
        match self.peek() {
            Some(Token::Assume) => self.p_assume(),
            Some(Token::Let) => {
                // `let q x = e` is a statement; `let z @ (x, y) = e in …` is
                // a term. Try the statement shape first and fall back.
                let save = self.save();
                self.advance();
                let q = self.p_usage_opt();
                if let Some(name) = self.eat_ident() {
                    if self.eat(&Token::Equals) {
                        let body = self.p_iterm()?;
                        return Ok(Stmt::Let(
                            q.unwrap_or(Multiplicity::One),
                            Symbol::from(name),
                            body,
                        ));
                    }
                }
                self.restore(save);
                self.p_eval()
            }
            Some(Token::PutStrLn) => {
                self.advance();
                let text = self.expect_str("expected a string literal")?;
                Ok(Stmt::PutStrLn(text))
            }
            Some(Token::Out) => {
                self.advance();
                let text = self.expect_str("expected a file name string")?;
                Ok(Stmt::Out(text))
            }
            _ => self.p_eval(),
        }
    }

    fn p_assume(&mut self) -> Result<Stmt> {
        self.expect(&Token::Assume, "expected assume")?;
        let mut bindings = Vec::new();
        while self.at(&Token::LParen) {
            self.advance();
            let q = self.p_usage_opt().unwrap_or(Multiplicity::Many);
            let name = self.expect_ident("expected an assumption name")?;
            self.expect(&Token::Colon, "expected ':' after the assumption name")?;
            let ty = self.p_cterm()?;
            self.expect(&Token::RParen, "expected ')' to close the assumption")?;
            bindings.push(AssumeBinding {
                multiplicity: q,
                name: Symbol::from(name),
                ty,
            });
        }
        if bindings.is_empty() {
            return Err(self.err("expected at least one (q x : τ) assumption"));
        }
        Ok(Stmt::Assume(bindings))
    }

    fn p_eval(&mut self) -> Result<Stmt> {
        let q = self.p_usage_opt().unwrap_or(Multiplicity::One);
        let term = self.p_iterm()?;
        Ok(Stmt::Eval(q, term))
    }

    fn expect_str(&mut self, message: &str) -> Result<String> {
        match self.peek() {
            Some(Token::Str(text)) => {
                let text = text.clone();
                self.advance();
                Ok(text)
            }
            _ => Err(self.err(message)),
        }
    }

    fn p_usage_opt(&mut self) -> Option<Multiplicity> {
        let q = match self.peek() {
            Some(Token::UsageZero) => Multiplicity::Zero,
            Some(Token::UsageOne) => Multiplicity::One,
            Some(Token::UsageMany) => Multiplicity::Many,
            _ => return None,
        };
        self.advance();
        Some(q)
    }

    ////////////////////////////
    // Terms

    /// Inferable terms: eliminators, applications, and `e : τ` annotations.
    fn p_iterm(&mut self) -> Result<RcInferable> {
        self.trace("p_iterm");
        if self.at(&Token::Let) {
            return self.p_elim();
        }
        let term = self.p_cterm()?;
        if self.eat(&Token::Colon) {
            let ty = self.p_cterm()?;
            return Ok(Inferable::ann_rc(term, ty));
        }
        self.as_inferable(term)
    }

    /// `let z @ (x, y) = e in b : t` and `let z @ () = e in b : t`.
    fn p_elim(&mut self) -> Result<RcInferable> {
        self.trace("p_elim");
        self.expect(&Token::Let, "expected let")?;
        let scrutinee_name = self.expect_ident("expected a name for the scrutinee")?;
        self.expect(&Token::At, "expected '@' after the scrutinee name")?;
        self.expect(&Token::LParen, "expected a '(x, y)' or '()' pattern")?;
        let pattern = if self.eat(&Token::RParen) {
            None
        } else {
            let first = self.expect_ident("expected a component name")?;
            self.expect(&Token::Comma, "expected ',' between the component names")?;
            let second = self.expect_ident("expected a component name")?;
            self.expect(&Token::RParen, "expected ')' to close the pattern")?;
            Some((first, second))
        };
        self.expect(&Token::Equals, "expected '=' before the scrutinee")?;
        let scrutinee = self.p_iterm()?;
        self.expect(&Token::In, "expected 'in' before the body")?;

        let depth = self.scope.depth();
        if let Some((first, second)) = &pattern {
            self.scope.push(first.clone());
            self.scope.push(second.clone());
        }
        let body = self.p_cterm();
        self.scope.reset(depth);
        let body = body?;

        self.expect(&Token::Colon, "expected ':' before the result type")?;
        self.scope.push(scrutinee_name);
        let motive = self.p_cterm();
        self.scope.reset(depth);
        let motive = motive?;

        Ok(match pattern {
            Some(_) => Inferable::tensor_elim_rc(scrutinee, body, motive),
            None => Inferable::tensor_unit_elim_rc(scrutinee, body, motive),
        })
    }

    /// Checkable terms: λ-abstractions, quantifiers, and arrow-level types.
    fn p_cterm(&mut self) -> Result<RcCheckable> {
        self.trace("p_cterm");
        match self.peek() {
            Some(Token::Lambda) => self.p_lambda(),
            Some(Token::Forall) => self.p_forall(),
            _ => self.p_arrow(),
        }
    }

    fn p_lambda(&mut self) -> Result<RcCheckable> {
        self.expect(&Token::Lambda, "expected a λ")?;
        let mut binders = Vec::new();
        while let Some(name) = self.eat_ident() {
            binders.push(name);
        }
        if binders.is_empty() {
            return Err(self.err("expected at least one binder after λ"));
        }
        self.expect(&Token::Dot, "expected '.' after the λ binders")?;

        let depth = self.scope.depth();
        for name in &binders {
            self.scope.push(name.clone());
        }
        let body = self.p_cterm();
        self.scope.reset(depth);
        let mut term = body?;

        for _ in 0..binders.len() {
            term = Checkable::lam_rc(term);
        }
        Ok(term)
    }

    fn p_forall(&mut self) -> Result<RcCheckable> {
        self.expect(&Token::Forall, "expected forall")?;
        let depth = self.scope.depth();
        let mut binders = Vec::new();
        while self.at(&Token::LParen) {
            self.advance();
            let q = self.p_usage_opt().unwrap_or(Multiplicity::Many);
            let name = self.expect_ident("expected a binder name")?;
            self.expect(&Token::Colon, "expected ':' after the binder name")?;
            let source = self.p_cterm();
            let source = match source {
                Ok(source) => source,
                Err(err) => {
                    self.scope.reset(depth);
                    return Err(err);
                }
            };
            if let Err(err) = self.expect(&Token::RParen, "expected ')' to close the binder") {
                self.scope.reset(depth);
                return Err(err);
            }
            self.scope.push(name);
            binders.push((q, source));
        }
        if binders.is_empty() {
            self.scope.reset(depth);
            return Err(self.err("expected at least one (q x : τ) binder"));
        }
        if let Err(err) = self.expect(&Token::Dot, "expected '.' after the binders") {
            self.scope.reset(depth);
            return Err(err);
        }
        let body = self.p_cterm();
        self.scope.reset(depth);
        let mut term = body?;

        for (q, source) in binders.into_iter().rev() {
            term = Checkable::pi_rc(q, source, term);
        }
        Ok(term)
    }

    /// Arrow-level types: an explicit binder group `(q x : A) → B`,
    /// `(q x : A) ⊗ B`, `(x : A) & B`, the non-dependent sugar `A → B`,
    /// or a bare application.
    fn p_arrow(&mut self) -> Result<RcCheckable> {
        if let Some(result) = self.p_binder_ty_opt() {
            return result;
        }
        let left = self.p_app()?;
        if self.eat(&Token::Arrow) {
            // Non-dependent sugar still introduces a binder, so references
            // to outer variables on the right shift by one.
            let depth = self.scope.depth();
            self.scope.push("_".to_string());
            let rest = self.p_cterm();
            self.scope.reset(depth);
            return Ok(Checkable::pi_rc(Multiplicity::Many, left, rest?));
        }
        Ok(left)
    }

    /// Speculatively parse `(q x : A)` followed by one of `→ ⊗ &`. Anything
    /// else backtracks: the parens may still be a pair, a grouping, or an
    /// annotation.
    fn p_binder_ty_opt(&mut self) -> Option<Result<RcCheckable>> {
        if !self.at(&Token::LParen) {
            return None;
        }
        let save = self.save();
        self.advance();
        let q = self.p_usage_opt();
        let Some(name) = self.eat_ident() else {
            self.restore(save);
            return None;
        };
        if !self.eat(&Token::Colon) {
            self.restore(save);
            return None;
        }
        let source = match self.p_cterm() {
            Ok(source) => source,
            Err(_) => {
                self.restore(save);
                return None;
            }
        };
        if !self.eat(&Token::RParen) {
            self.restore(save);
            return None;
        }
        let op = match self.peek() {
            Some(Token::Arrow) => Token::Arrow,
            Some(Token::Star) => Token::Star,
            Some(Token::Amp) => Token::Amp,
            _ => {
                self.restore(save);
                return None;
            }
        };
        if op == Token::Amp && q.is_some() {
            return Some(Err(self.err("additive pair types take no usage annotation")));
        }
        self.advance();
        let depth = self.scope.depth();
        self.scope.push(name);
        let rest = self.p_cterm();
        self.scope.reset(depth);
        let rest = match rest {
            Ok(rest) => rest,
            Err(err) => return Some(Err(err)),
        };
        let q = q.unwrap_or(Multiplicity::Many);
        Some(Ok(match op {
            Token::Arrow => Checkable::pi_rc(q, source, rest),
            Token::Star => Checkable::tensor_ty_rc(q, source, rest),
            _ => Checkable::with_ty_rc(source, rest),
        }))
    }

    /// An application chain of atoms, folded to the left.
    fn p_app(&mut self) -> Result<RcCheckable> {
        let mut head = self.p_atom()?;
        while self.at_atom_start() {
            let offset = self.offset();
            let function = self.as_inferable_at(head, offset)?;
            let argument = self.p_atom()?;
            head = Checkable::inf_rc(Inferable::app_rc(function, argument));
        }
        Ok(head)
    }

    fn at_atom_start(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Ident(_)
                    | Token::Universe
                    | Token::TensorUnitTy
                    | Token::WithUnitTy
                    | Token::WithUnit
                    | Token::LParen
                    | Token::LAngle
                    | Token::Fst
                    | Token::Snd
            )
        )
    }

    fn p_atom(&mut self) -> Result<RcCheckable> {
        self.trace("p_atom");
        match self.peek().cloned() {
            Some(Token::Ident(name)) => {
                self.advance();
                Ok(match self.scope.find(&name) {
                    Some(index) => Checkable::bound_rc(index),
                    None => Checkable::free_rc(Name::Global(Symbol::from(name))),
                })
            }
            Some(Token::Universe) => {
                self.advance();
                Ok(Checkable::universe_rc())
            }
            Some(Token::TensorUnitTy) => {
                self.advance();
                Ok(Rc::new(Checkable::TensorUnitTy))
            }
            Some(Token::WithUnitTy) => {
                self.advance();
                Ok(Rc::new(Checkable::WithUnitTy))
            }
            Some(Token::WithUnit) => {
                self.advance();
                Ok(Rc::new(Checkable::WithUnit))
            }
            Some(Token::LAngle) => {
                self.advance();
                let first = self.p_cterm()?;
                self.expect(&Token::Comma, "expected ',' in the pair")?;
                let second = self.p_cterm()?;
                self.expect(&Token::RAngle, "expected '⟩' to close the pair")?;
                Ok(Checkable::with_pair_rc(first, second))
            }
            Some(Token::LParen) => {
                self.advance();
                if self.eat(&Token::RParen) {
                    return Ok(Rc::new(Checkable::TensorUnit));
                }
                let first = self.p_cterm()?;
                if self.eat(&Token::Comma) {
                    let second = self.p_cterm()?;
                    self.expect(&Token::RParen, "expected ')' to close the pair")?;
                    return Ok(Checkable::tensor_pair_rc(first, second));
                }
                if self.eat(&Token::Colon) {
                    let ty = self.p_cterm()?;
                    self.expect(&Token::RParen, "expected ')' to close the annotation")?;
                    return Ok(Checkable::inf_rc(Inferable::ann_rc(first, ty)));
                }
                self.expect(&Token::RParen, "expected ')'")?;
                Ok(first)
            }
            Some(Token::Fst) => {
                self.advance();
                let offset = self.offset();
                let pair = self.p_atom()?;
                let pair = self.as_inferable_at(pair, offset)?;
                Ok(Checkable::inf_rc(Inferable::first_rc(pair)))
            }
            Some(Token::Snd) => {
                self.advance();
                let offset = self.offset();
                let pair = self.p_atom()?;
                let pair = self.as_inferable_at(pair, offset)?;
                Ok(Checkable::inf_rc(Inferable::second_rc(pair)))
            }
            _ => Err(self.err("expected a term")),
        }
    }

    fn as_inferable(&self, term: RcCheckable) -> Result<RcInferable> {
        self.as_inferable_at(term, self.offset())
    }

    fn as_inferable_at(&self, term: RcCheckable, offset: usize) -> Result<RcInferable> {
        match &*term {
            Checkable::Inf(inner) => Ok(inner.clone()),
            _ => Err(Error {
                message: "this term needs a type annotation".to_string(),
                offset,
            }),
        }
    }
}
