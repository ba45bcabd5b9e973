use crate::common::Index;
use crate::name::Name;
use crate::resource::Multiplicity;
use std::rc::Rc;

pub type RcInferable = Rc<Inferable>;
pub type RcCheckable = Rc<Checkable>;

/// Terms whose type can be synthesized: variables, eliminations, and
/// annotated terms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inferable {
    /// A checkable term with a type annotation.
    Ann(RcCheckable, RcCheckable),
    /// A bound variable. The checker never sees one of these: it opens every
    /// binder with a fresh free local before descending.
    Bound(Index),
    /// A free variable.
    Free(Name),
    /// Function application.
    App(RcInferable, RcCheckable),
    /// Eliminate a tensor pair: `let z @ (x, y) = e in b : t`. The body has
    /// two pending binders (1 for the first component, 0 for the second);
    /// the motive has one for the scrutinee.
    TensorElim(RcInferable, RcCheckable, RcCheckable),
    /// Eliminate the tensor unit: `let z @ () = e in b : t`.
    TensorUnitElim(RcInferable, RcCheckable, RcCheckable),
    /// First projection from an additive pair.
    First(RcInferable),
    /// Second projection from an additive pair.
    Second(RcInferable),
}

/// Terms that are checked against a type: introductions and type formers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Checkable {
    /// An embedded inferable term.
    Inf(RcInferable),
    Lam(RcCheckable),
    /// The type of types.
    Universe,
    /// The dependent function type `(q x : A) → B`.
    Pi(Multiplicity, RcCheckable, RcCheckable),
    /// The tensor pair type `(q x : A) ⊗ B`: both components are consumed
    /// when the pair is.
    TensorTy(Multiplicity, RcCheckable, RcCheckable),
    TensorPair(RcCheckable, RcCheckable),
    /// The tensor unit type `𝟭ₘ`.
    TensorUnitTy,
    TensorUnit,
    /// The additive pair type `(x : A) & B`: the pair offers a choice of
    /// projection, so the components share one resource budget.
    WithTy(RcCheckable, RcCheckable),
    WithPair(RcCheckable, RcCheckable),
    /// The additive unit type `⊤`.
    WithUnitTy,
    WithUnit,
}

impl Inferable {
    pub fn ann_rc(term: RcCheckable, ty: RcCheckable) -> RcInferable {
        Rc::new(Inferable::Ann(term, ty))
    }

    pub fn bound_rc(index: Index) -> RcInferable {
        Rc::new(Inferable::Bound(index))
    }

    pub fn free_rc(name: Name) -> RcInferable {
        Rc::new(Inferable::Free(name))
    }

    pub fn app_rc(function: RcInferable, argument: RcCheckable) -> RcInferable {
        Rc::new(Inferable::App(function, argument))
    }

    pub fn tensor_elim_rc(
        scrutinee: RcInferable,
        body: RcCheckable,
        motive: RcCheckable,
    ) -> RcInferable {
        Rc::new(Inferable::TensorElim(scrutinee, body, motive))
    }

    pub fn tensor_unit_elim_rc(
        scrutinee: RcInferable,
        body: RcCheckable,
        motive: RcCheckable,
    ) -> RcInferable {
        Rc::new(Inferable::TensorUnitElim(scrutinee, body, motive))
    }

    pub fn first_rc(pair: RcInferable) -> RcInferable {
        Rc::new(Inferable::First(pair))
    }

    pub fn second_rc(pair: RcInferable) -> RcInferable {
        Rc::new(Inferable::Second(pair))
    }

    /// Replace `Bound(depth)` with `replacement`, adjusting the target index
    /// when descending under binders. The checker only ever substitutes
    /// closed terms, so no shifting of the replacement is needed.
    pub fn subst(&self, depth: usize, replacement: &Inferable) -> Inferable {
        match self {
            Inferable::Ann(term, ty) => Inferable::Ann(
                Rc::new(term.subst(depth, replacement)),
                Rc::new(ty.subst(depth, replacement)),
            ),
            Inferable::Bound(index) if index.to_usize() == depth => replacement.clone(),
            Inferable::Bound(index) => Inferable::Bound(*index),
            Inferable::Free(name) => Inferable::Free(name.clone()),
            Inferable::App(function, argument) => Inferable::App(
                Rc::new(function.subst(depth, replacement)),
                Rc::new(argument.subst(depth, replacement)),
            ),
            Inferable::TensorElim(scrutinee, body, motive) => Inferable::TensorElim(
                Rc::new(scrutinee.subst(depth, replacement)),
                Rc::new(body.subst(depth + 2, replacement)),
                Rc::new(motive.subst(depth + 1, replacement)),
            ),
            Inferable::TensorUnitElim(scrutinee, body, motive) => Inferable::TensorUnitElim(
                Rc::new(scrutinee.subst(depth, replacement)),
                Rc::new(body.subst(depth, replacement)),
                Rc::new(motive.subst(depth + 1, replacement)),
            ),
            Inferable::First(pair) => Inferable::First(Rc::new(pair.subst(depth, replacement))),
            Inferable::Second(pair) => Inferable::Second(Rc::new(pair.subst(depth, replacement))),
        }
    }
}

impl Checkable {
    pub fn inf_rc(term: RcInferable) -> RcCheckable {
        Rc::new(Checkable::Inf(term))
    }

    pub fn free_rc(name: Name) -> RcCheckable {
        Checkable::inf_rc(Inferable::free_rc(name))
    }

    pub fn bound_rc(index: Index) -> RcCheckable {
        Checkable::inf_rc(Inferable::bound_rc(index))
    }

    pub fn lam_rc(body: RcCheckable) -> RcCheckable {
        Rc::new(Checkable::Lam(body))
    }

    pub fn universe_rc() -> RcCheckable {
        Rc::new(Checkable::Universe)
    }

    pub fn pi_rc(q: Multiplicity, source: RcCheckable, target: RcCheckable) -> RcCheckable {
        Rc::new(Checkable::Pi(q, source, target))
    }

    pub fn tensor_ty_rc(q: Multiplicity, source: RcCheckable, rest: RcCheckable) -> RcCheckable {
        Rc::new(Checkable::TensorTy(q, source, rest))
    }

    pub fn tensor_pair_rc(first: RcCheckable, second: RcCheckable) -> RcCheckable {
        Rc::new(Checkable::TensorPair(first, second))
    }

    pub fn with_ty_rc(source: RcCheckable, rest: RcCheckable) -> RcCheckable {
        Rc::new(Checkable::WithTy(source, rest))
    }

    pub fn with_pair_rc(first: RcCheckable, second: RcCheckable) -> RcCheckable {
        Rc::new(Checkable::WithPair(first, second))
    }

    /// See [`Inferable::subst`].
    pub fn subst(&self, depth: usize, replacement: &Inferable) -> Checkable {
        match self {
            Checkable::Inf(term) => Checkable::Inf(Rc::new(term.subst(depth, replacement))),
            Checkable::Lam(body) => Checkable::Lam(Rc::new(body.subst(depth + 1, replacement))),
            Checkable::Universe => Checkable::Universe,
            Checkable::Pi(q, source, target) => Checkable::Pi(
                *q,
                Rc::new(source.subst(depth, replacement)),
                Rc::new(target.subst(depth + 1, replacement)),
            ),
            Checkable::TensorTy(q, source, rest) => Checkable::TensorTy(
                *q,
                Rc::new(source.subst(depth, replacement)),
                Rc::new(rest.subst(depth + 1, replacement)),
            ),
            Checkable::TensorPair(first, second) => Checkable::TensorPair(
                Rc::new(first.subst(depth, replacement)),
                Rc::new(second.subst(depth, replacement)),
            ),
            Checkable::TensorUnitTy => Checkable::TensorUnitTy,
            Checkable::TensorUnit => Checkable::TensorUnit,
            Checkable::WithTy(source, rest) => Checkable::WithTy(
                Rc::new(source.subst(depth, replacement)),
                Rc::new(rest.subst(depth + 1, replacement)),
            ),
            Checkable::WithPair(first, second) => Checkable::WithPair(
                Rc::new(first.subst(depth, replacement)),
                Rc::new(second.subst(depth, replacement)),
            ),
            Checkable::WithUnitTy => Checkable::WithUnitTy,
            Checkable::WithUnit => Checkable::WithUnit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Index;

    fn bound(i: usize) -> RcCheckable {
        Checkable::bound_rc(Index(i))
    }

    #[test]
    fn subst_hits_the_target_index_only() {
        let replacement = Inferable::Free(Name::global("a"));
        let term = Checkable::Inf(Inferable::app_rc(
            Inferable::bound_rc(Index(0)),
            bound(1),
        ));
        let expected = Checkable::Inf(Inferable::app_rc(
            Inferable::free_rc(Name::global("a")),
            bound(1),
        ));
        assert_eq!(term.subst(0, &replacement), expected);
    }

    #[test]
    fn subst_shifts_under_a_lambda() {
        let replacement = Inferable::Free(Name::global("a"));
        // λ. $1, where the occurrence refers to the binder outside the lambda.
        let term = Checkable::Lam(bound(1));
        let expected = Checkable::Lam(Checkable::free_rc(Name::global("a")));
        assert_eq!(term.subst(0, &replacement), expected);
        // λ. $0 is untouched.
        let identity = Checkable::Lam(bound(0));
        assert_eq!(identity.subst(0, &replacement), identity);
    }

    #[test]
    fn subst_shifts_by_binder_counts_in_eliminators() {
        let replacement = Inferable::Free(Name::global("a"));
        // let z @ (x, y) = $0 in $2 : $1, where every occurrence refers to
        // the same outer binder.
        let term = Inferable::TensorElim(
            Inferable::bound_rc(Index(0)),
            bound(2),
            bound(1),
        );
        let expected = Inferable::TensorElim(
            Inferable::free_rc(Name::global("a")),
            Checkable::free_rc(Name::global("a")),
            Checkable::free_rc(Name::global("a")),
        );
        assert_eq!(term.subst(0, &replacement), expected);
    }

    #[test]
    fn structural_equality_is_alpha_invariant() {
        // Two identity functions built independently compare equal.
        let id1 = Checkable::lam_rc(bound(0));
        let id2 = Checkable::lam_rc(bound(0));
        assert_eq!(id1, id2);
        assert_ne!(id1, Checkable::lam_rc(bound(1)));
    }
}
