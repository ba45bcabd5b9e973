use crate::common::Level;
use crate::eval::{run_closure, Result};
use crate::name::Name;
use crate::syntax::{Checkable, Inferable, RcCheckable, RcInferable};
use crate::value::{Closure, Definitions, Neutral, Value};
use std::rc::Rc;

/// Read a value back into β-normal syntax. Two values are definitionally
/// equal exactly when their `quote0` images are structurally equal.
pub fn quote0(definitions: &Definitions, value: &Value) -> Result<RcCheckable> {
    quote(definitions, 0, value)
}

/// Read a value back into syntax at the given binder depth. Closures are
/// forced by applying them to fresh `Quote` markers, which turn back into
/// bound variables on the way out.
pub fn quote(definitions: &Definitions, depth: usize, value: &Value) -> Result<RcCheckable> {
    match value {
        Value::Lam(body) => Ok(Checkable::lam_rc(quote_closure(definitions, depth, body)?)),
        Value::Universe => Ok(Checkable::universe_rc()),
        Value::Pi(q, source, target) => Ok(Checkable::pi_rc(
            *q,
            quote(definitions, depth, source)?,
            quote_closure(definitions, depth, target)?,
        )),
        Value::TensorTy(q, source, rest) => Ok(Checkable::tensor_ty_rc(
            *q,
            quote(definitions, depth, source)?,
            quote_closure(definitions, depth, rest)?,
        )),
        Value::TensorPair(first, second) => Ok(Checkable::tensor_pair_rc(
            quote(definitions, depth, first)?,
            quote(definitions, depth, second)?,
        )),
        Value::TensorUnitTy => Ok(Rc::new(Checkable::TensorUnitTy)),
        Value::TensorUnit => Ok(Rc::new(Checkable::TensorUnit)),
        Value::WithTy(source, rest) => Ok(Checkable::with_ty_rc(
            quote(definitions, depth, source)?,
            quote_closure(definitions, depth, rest)?,
        )),
        Value::WithPair(first, second) => Ok(Checkable::with_pair_rc(
            quote(definitions, depth, first)?,
            quote(definitions, depth, second)?,
        )),
        Value::WithUnitTy => Ok(Rc::new(Checkable::WithUnitTy)),
        Value::WithUnit => Ok(Rc::new(Checkable::WithUnit)),
        Value::Neutral(neutral) => Ok(Checkable::inf_rc(quote_neutral(
            definitions,
            depth,
            neutral,
        )?)),
    }
}

/// Force a one-binder closure with a fresh marker and read the body back.
fn quote_closure(definitions: &Definitions, depth: usize, closure: &Closure) -> Result<RcCheckable> {
    let marker = Value::free_rc(Name::Quote(Level::new(depth)));
    let body = run_closure(definitions, closure, [marker])?;
    quote(definitions, depth + 1, &body)
}

/// Read a stuck elimination back into inferable syntax.
fn quote_neutral(definitions: &Definitions, depth: usize, neutral: &Neutral) -> Result<RcInferable> {
    match neutral {
        Neutral::Free(name) => Ok(Rc::new(boundfree(depth, name))),
        Neutral::App(function, argument) => Ok(Inferable::app_rc(
            quote_neutral(definitions, depth, function)?,
            quote(definitions, depth, argument)?,
        )),
        Neutral::TensorElim(scrutinee, body, motive) => {
            let scrutinee = quote_neutral(definitions, depth, scrutinee)?;
            let first = Value::free_rc(Name::Quote(Level::new(depth)));
            let second = Value::free_rc(Name::Quote(Level::new(depth + 1)));
            let body = run_closure(definitions, body, [first, second])?;
            let body = quote(definitions, depth + 2, &body)?;
            let motive = quote_closure(definitions, depth, motive)?;
            Ok(Inferable::tensor_elim_rc(scrutinee, body, motive))
        }
        Neutral::TensorUnitElim(scrutinee, body, motive) => {
            let scrutinee = quote_neutral(definitions, depth, scrutinee)?;
            let body = run_closure(definitions, body, [])?;
            let body = quote(definitions, depth, &body)?;
            let motive = quote_closure(definitions, depth, motive)?;
            Ok(Inferable::tensor_unit_elim_rc(scrutinee, body, motive))
        }
        Neutral::First(pair) => Ok(Inferable::first_rc(quote_neutral(
            definitions,
            depth,
            pair,
        )?)),
        Neutral::Second(pair) => Ok(Inferable::second_rc(quote_neutral(
            definitions,
            depth,
            pair,
        )?)),
    }
}

/// Quotation markers become bound variables; every other name stays free.
fn boundfree(depth: usize, name: &Name) -> Inferable {
    match name {
        Name::Quote(level) => Inferable::Bound(level.to_index(depth)),
        name => Inferable::Free(name.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Index;
    use crate::eval::{eval_checkable, eval_inferable, Environment};
    use crate::resource::Multiplicity;

    fn normalize(defs: &Definitions, term: &Checkable) -> RcCheckable {
        let mut env = Environment::new(defs);
        let value = eval_checkable(&mut env, term).expect("evaluation failed");
        quote0(defs, &value).expect("quotation failed")
    }

    #[test]
    fn lambdas_round_trip() {
        let defs = Definitions::new();
        // λx. λy. x
        let term = Checkable::lam_rc(Checkable::lam_rc(Checkable::bound_rc(Index(1))));
        assert_eq!(*normalize(&defs, &term), *term);
    }

    #[test]
    fn redexes_normalize_away() {
        let defs = Definitions::new();
        // (λx. x : (1 x : 𝘜) → 𝘜) ⊤ ~> ⊤
        let identity = Inferable::ann_rc(
            Checkable::lam_rc(Checkable::bound_rc(Index(0))),
            Checkable::pi_rc(
                Multiplicity::One,
                Checkable::universe_rc(),
                Checkable::universe_rc(),
            ),
        );
        let term = Checkable::Inf(Inferable::app_rc(
            identity,
            Rc::new(Checkable::WithUnitTy),
        ));
        assert_eq!(*normalize(&defs, &term), Checkable::WithUnitTy);
    }

    #[test]
    fn stuck_applications_requote_with_their_spine() {
        let defs = Definitions::new();
        // f a, with both free.
        let term = Checkable::Inf(Inferable::app_rc(
            Inferable::free_rc(Name::global("f")),
            Checkable::free_rc(Name::global("a")),
        ));
        assert_eq!(*normalize(&defs, &term), term);
    }

    #[test]
    fn pi_closures_reopen_as_bound_variables() {
        let defs = Definitions::new();
        // (1 x : a) → x
        let term = Checkable::pi_rc(
            Multiplicity::One,
            Checkable::free_rc(Name::global("a")),
            Checkable::bound_rc(Index(0)),
        );
        assert_eq!(*normalize(&defs, &term), *term);
    }

    #[test]
    fn normalization_is_idempotent() {
        let defs = Definitions::new();
        let terms = [
            Checkable::lam_rc(Checkable::bound_rc(Index(0))),
            Checkable::pi_rc(
                Multiplicity::Many,
                Checkable::universe_rc(),
                Checkable::bound_rc(Index(0)),
            ),
            Checkable::tensor_pair_rc(
                Checkable::free_rc(Name::global("a")),
                Rc::new(Checkable::TensorUnit),
            ),
        ];
        for term in terms {
            let once = normalize(&defs, &term);
            let twice = normalize(&defs, &once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn stuck_tensor_elim_round_trips() {
        let defs = Definitions::new();
        // let z @ (x, y) = p in x : u, with p and u free.
        let term = Inferable::tensor_elim_rc(
            Inferable::free_rc(Name::global("p")),
            Checkable::bound_rc(Index(1)),
            Checkable::free_rc(Name::global("u")),
        );
        let mut env = Environment::new(&defs);
        let value = eval_inferable(&mut env, &term).expect("evaluation failed");
        let quoted = quote0(&defs, &value).expect("quotation failed");
        assert_eq!(quoted, Checkable::inf_rc(term));
    }
}
