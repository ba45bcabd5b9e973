use crate::common::Index;
use crate::eval;
use crate::name::Name;
use crate::quote::quote0;
use crate::resource::Multiplicity;
use crate::syntax::{Checkable, Inferable};
use crate::value::{Definitions, Value};
use elegance::{Printer, Render};
use janus_support::pp::{binder_name, render, State, PP};

const INDENT: isize = 2;

// Binding powers, loosest first: terms and binders, arrows, application,
// atoms. A node parenthesizes itself when the ambient power exceeds its own.
const PREC_TERM: u8 = 0;
const PREC_ARROW: u8 = 1;
const PREC_APP: u8 = 2;
const PREC_ATOM: u8 = 3;

fn grouped<R, F>(p: &mut Printer<R>, parens: bool, f: F) -> Result<(), R::Error>
where
    R: Render,
    F: FnOnce(&mut Printer<R>) -> Result<(), R::Error>,
{
    p.cgroup(INDENT, |p| {
        if parens {
            p.text("(")?;
            f(p)?;
            p.text(")")
        } else {
            f(p)
        }
    })
}

/// The display name of a bound variable, given the ambient binder depth.
fn bound_name(st: State, index: Index) -> String {
    match st.depth().checked_sub(index.to_usize() + 1) {
        Some(level) => binder_name(level),
        // Out-of-scope indices only arise in debugging output.
        None => format!("{}", index),
    }
}

/// Print a dependent binder head `(q x : A)` followed by `op B`.
fn print_binder_ty<R: Render>(
    st: State,
    p: &mut Printer<R>,
    q: Option<Multiplicity>,
    source: &Checkable,
    op: &str,
    rest: &Checkable,
) -> Result<(), R::Error> {
    grouped(p, st.prec() > PREC_ARROW, |p| {
        p.text("(")?;
        if let Some(q) = q {
            q.print(st, p)?;
            p.space()?;
        }
        p.text(binder_name(st.depth()))?;
        p.text(" : ")?;
        source.print(st.at(PREC_TERM), p)?;
        p.text(")")?;
        p.text(format!(" {} ", op))?;
        rest.print(st.deeper().at(PREC_ARROW), p)
    })
}

impl PP for Multiplicity {
    fn print<R: Render>(&self, _st: State, p: &mut Printer<R>) -> Result<(), R::Error> {
        p.text(self.to_string())
    }
}

impl PP for Name {
    fn print<R: Render>(&self, _st: State, p: &mut Printer<R>) -> Result<(), R::Error> {
        p.text(self.to_string())
    }
}

impl PP for Checkable {
    fn print<R: Render>(&self, st: State, p: &mut Printer<R>) -> Result<(), R::Error> {
        match self {
            Checkable::Inf(term) => term.print(st, p),
            Checkable::Lam(body) => grouped(p, st.prec() > PREC_TERM, |p| {
                p.text("λ")?;
                p.text(binder_name(st.depth()))?;
                p.text(". ")?;
                body.print(st.deeper().at(PREC_TERM), p)
            }),
            Checkable::Universe => p.text("𝘜"),
            Checkable::Pi(q, source, target) => print_binder_ty(st, p, Some(*q), source, "→", target),
            Checkable::TensorTy(q, source, rest) => {
                print_binder_ty(st, p, Some(*q), source, "⊗", rest)
            }
            Checkable::WithTy(source, rest) => print_binder_ty(st, p, None, source, "&", rest),
            Checkable::TensorPair(first, second) => p.cgroup(INDENT, |p| {
                p.text("(")?;
                first.print(st.at(PREC_TERM), p)?;
                p.text(",")?;
                p.space()?;
                second.print(st.at(PREC_TERM), p)?;
                p.text(")")
            }),
            Checkable::TensorUnitTy => p.text("𝟭ₘ"),
            Checkable::TensorUnit => p.text("()"),
            Checkable::WithPair(first, second) => p.cgroup(INDENT, |p| {
                p.text("⟨")?;
                first.print(st.at(PREC_TERM), p)?;
                p.text(",")?;
                p.space()?;
                second.print(st.at(PREC_TERM), p)?;
                p.text("⟩")
            }),
            Checkable::WithUnitTy => p.text("⊤"),
            Checkable::WithUnit => p.text("⟨⟩"),
        }
    }
}

impl PP for Inferable {
    fn print<R: Render>(&self, st: State, p: &mut Printer<R>) -> Result<(), R::Error> {
        match self {
            Inferable::Ann(term, ty) => grouped(p, st.prec() > PREC_TERM, |p| {
                term.print(st.at(PREC_ARROW), p)?;
                p.text(" :")?;
                p.space()?;
                ty.print(st.at(PREC_TERM), p)
            }),
            Inferable::Bound(index) => p.text(bound_name(st, *index)),
            Inferable::Free(name) => name.print(st, p),
            Inferable::App(function, argument) => grouped(p, st.prec() > PREC_APP, |p| {
                function.print(st.at(PREC_APP), p)?;
                p.space()?;
                argument.print(st.at(PREC_ATOM), p)
            }),
            Inferable::TensorElim(scrutinee, body, motive) => {
                print_elim(st, p, scrutinee, true, body, motive)
            }
            Inferable::TensorUnitElim(scrutinee, body, motive) => {
                print_elim(st, p, scrutinee, false, body, motive)
            }
            Inferable::First(pair) => grouped(p, st.prec() > PREC_APP, |p| {
                p.text("fst ")?;
                pair.print(st.at(PREC_ATOM), p)
            }),
            Inferable::Second(pair) => grouped(p, st.prec() > PREC_APP, |p| {
                p.text("snd ")?;
                pair.print(st.at(PREC_ATOM), p)
            }),
        }
    }
}

/// Print a tensor eliminator `let z @ (x, y) = e in b : t`, or the unit
/// form `let z @ () = e in b : t`.
fn print_elim<R: Render>(
    st: State,
    p: &mut Printer<R>,
    scrutinee: &Inferable,
    is_pair: bool,
    body: &Checkable,
    motive: &Checkable,
) -> Result<(), R::Error> {
    grouped(p, st.prec() > PREC_TERM, |p| {
        p.text("let ")?;
        p.text(binder_name(st.depth()))?;
        p.text(" @ ")?;
        if is_pair {
            p.text("(")?;
            p.text(binder_name(st.depth()))?;
            p.text(", ")?;
            p.text(binder_name(st.depth() + 1))?;
            p.text(")")?;
        } else {
            p.text("()")?;
        }
        p.text(" = ")?;
        scrutinee.print(st.at(PREC_TERM), p)?;
        p.text(" in")?;
        p.space()?;
        let body_st = if is_pair { st.deeper().deeper() } else { st };
        body.print(body_st.at(PREC_TERM), p)?;
        p.text(" :")?;
        p.space()?;
        motive.print(st.deeper().at(PREC_TERM), p)
    })
}

pub fn render_checkable(term: &Checkable) -> String {
    render(term)
}

pub fn render_inferable(term: &Inferable) -> String {
    render(term)
}

/// Render a value by reading it back to syntax first.
pub fn render_value(definitions: &Definitions, value: &Value) -> eval::Result<String> {
    Ok(render(&*quote0(definitions, value)?))
}
