use crate::common::Level;
use crate::context::{Binding, Context};
use crate::eval;
use crate::name::Name;
use crate::print;
use crate::quote::quote0;
use crate::resource::{Multiplicity, Relevance};
use crate::syntax::{Checkable, Inferable, RcCheckable, RcInferable};
use crate::usage::Usage;
use crate::value::{Closure, LocalEnv, RcValue, Value};
use itertools::Itertools;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

/// The shape a synthesized type was required to have.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expectation {
    /// A concrete type, in quoted form.
    Type(RcCheckable),
    Function,
    TensorPairTy,
    TensorUnitTy,
    WithPairTy,
}

impl Display for Expectation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Type(ty) => f.write_str(&print::render_checkable(ty)),
            Expectation::Function => f.write_str("a function type"),
            Expectation::TensorPairTy => f.write_str("a tensor pair type"),
            Expectation::TensorUnitTy => f.write_str("the tensor unit type"),
            Expectation::WithPairTy => f.write_str("an additive pair type"),
        }
    }
}

/// A variable whose measured usage does not fit its declared allowance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub name: Name,
    pub ty: RcCheckable,
    pub used: Multiplicity,
    pub available: Multiplicity,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// One or more variables were consumed outside their declared allowance.
    /// `binder` names the binder form when the violation was caught while
    /// discharging a local, and is `None` for the top-level verification.
    Multiplicity {
        binder: Option<&'static str>,
        violations: Vec<Violation>,
    },
    /// A term that may only appear at the type level was used at runtime.
    Erasure {
        term: RcCheckable,
        usage: Multiplicity,
    },
    /// A synthesized type did not have the required shape.
    Inference {
        expected: Expectation,
        actual: RcCheckable,
        term: RcInferable,
    },
    /// No checking rule applies to the term at this type.
    Check {
        expected: RcCheckable,
        term: RcCheckable,
    },
    UnknownVariable { name: Name },
    /// The evaluator rejected a term. Unreachable on terms that passed the
    /// checker; surfaced rather than unwrapped so the kernel never panics on
    /// user input.
    Evaluation(eval::Error),
}

impl From<eval::Error> for Error {
    fn from(error: eval::Error) -> Error {
        Error::Evaluation(error)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Multiplicity { binder, violations } => {
                match binder {
                    Some(binder) => write!(f, "multiplicity violation at {}:", binder)?,
                    None => f.write_str("multiplicity violation:")?,
                }
                for v in violations {
                    write!(
                        f,
                        "\n  {} : {} used {}, allowed {}",
                        v.name,
                        print::render_checkable(&v.ty),
                        v.used,
                        v.available
                    )?;
                }
                Ok(())
            }
            Error::Erasure { term, usage } => write!(
                f,
                "type-level term {} used with multiplicity {}",
                print::render_checkable(term),
                usage
            ),
            Error::Inference {
                expected,
                actual,
                term,
            } => write!(
                f,
                "type mismatch: {} has type {}, expected {}",
                print::render_inferable(term),
                print::render_checkable(actual),
                expected
            ),
            Error::Check { expected, term } => write!(
                f,
                "{} does not check against {}",
                print::render_checkable(term),
                print::render_checkable(expected)
            ),
            Error::UnknownVariable { name } => write!(f, "variable not in scope: {}", name),
            Error::Evaluation(error) => write!(f, "evaluation failure: {}", error),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Synthesize the type of a term consumed `q` times, then verify that every
/// variable it touches fits the allowance declared in the context. This is
/// the only entry point that enforces resources end to end.
pub fn type_synth_top(ctx: &Context, q: Multiplicity, term: &Inferable) -> Result<RcValue> {
    let (usage, ty) = type_synth(ctx, q.relevance(), term)?;
    let usage = usage.scale(q);
    verify_usage(ctx, &usage)?;
    Ok(ty)
}

/// The type of a term, with no resource verification: the judgment runs in
/// the erased shadow, where every usage is zero by construction.
pub fn type_query(ctx: &Context, term: &Inferable) -> Result<RcValue> {
    let (usage, ty) = type_synth(&ctx.erased(), Relevance::Erased, term)?;
    debug_assert!(
        usage.is_all_zero(),
        "erased synthesis returned a non-zero usage"
    );
    Ok(ty)
}

/// Check that a term is a well-formed type. Runs in the erased shadow.
pub fn check_type_erased(ctx: &Context, term: &Checkable) -> Result<()> {
    check_erased(ctx, term, &Value::Universe)
}

fn verify_usage(ctx: &Context, usage: &Usage) -> Result<()> {
    let mut violations = Vec::new();
    for (name, used) in usage.iter() {
        let Some(binding) = ctx.lookup(name) else {
            debug_assert!(false, "usage entry for a name outside the context");
            continue;
        };
        if !used.fits_in(binding.multiplicity) {
            violations.push(Violation {
                name: name.clone(),
                ty: quoted(ctx, &binding.ty)?,
                used,
                available: binding.multiplicity,
            });
        }
    }
    if violations.is_empty() {
        Ok(())
    } else {
        let violations = violations
            .into_iter()
            .sorted_by_key(|v| v.name.to_string())
            .collect();
        Err(Error::Multiplicity {
            binder: None,
            violations,
        })
    }
}

/// Synthesize a usage and a type for an inferable term.
fn type_synth(ctx: &Context, r: Relevance, term: &Inferable) -> Result<(Usage, RcValue)> {
    match term {
        Inferable::Ann(inner, ty) => type_synth_ann(ctx, r, inner, ty),
        Inferable::Bound(index) => {
            unreachable!("bound variable {} escaped its binder", index)
        }
        Inferable::Free(name) => type_synth_free(ctx, r, name),
        Inferable::App(function, argument) => {
            type_synth_application(ctx, r, term, function, argument)
        }
        Inferable::TensorElim(scrutinee, body, motive) => {
            type_synth_tensor_elim(ctx, r, term, scrutinee, body, motive)
        }
        Inferable::TensorUnitElim(scrutinee, body, motive) => {
            type_synth_tensor_unit_elim(ctx, r, term, scrutinee, body, motive)
        }
        Inferable::First(pair) => type_synth_first(ctx, r, term, pair),
        Inferable::Second(pair) => type_synth_second(ctx, r, term, pair),
    }
}

/// The annotation rule: the type is checked as a type in the erased shadow,
/// then the term is checked against its evaluation.
fn type_synth_ann(
    ctx: &Context,
    r: Relevance,
    term: &RcCheckable,
    ty: &RcCheckable,
) -> Result<(Usage, RcValue)> {
    check_type_erased(ctx, ty)?;
    let ty = eval_checkable(ctx, ty)?;
    let usage = type_check(ctx, r, term, &ty)?;
    Ok((usage, ty))
}

/// A variable occurrence is charged once per the ambient relevance.
fn type_synth_free(ctx: &Context, r: Relevance, name: &Name) -> Result<(Usage, RcValue)> {
    match ctx.lookup(name) {
        Some(binding) => Ok((
            Usage::singleton(name.clone(), r.multiplicity()),
            binding.ty.clone(),
        )),
        None => Err(Error::UnknownVariable { name: name.clone() }),
    }
}

/// The application rule. The argument is consumed `p ⊗ r` times; when that
/// product is zero the argument is checked in the erased shadow and
/// contributes nothing.
fn type_synth_application(
    ctx: &Context,
    r: Relevance,
    term: &Inferable,
    function: &RcInferable,
    argument: &RcCheckable,
) -> Result<(Usage, RcValue)> {
    let (function_usage, function_ty) = type_synth(ctx, r, function)?;
    let Value::Pi(p, source, target) = &*function_ty else {
        return Err(Error::Inference {
            expected: Expectation::Function,
            actual: quoted(ctx, &function_ty)?,
            term: Rc::new(term.clone()),
        });
    };
    let s = *p * r.multiplicity();
    let usage = if s.is_zero() {
        check_erased(ctx, argument, source)?;
        function_usage
    } else {
        let argument_usage = type_check(ctx, Relevance::Present, argument, source)?;
        function_usage.join(argument_usage.scale(s))
    };
    let argument = eval_checkable(ctx, argument)?;
    let ty = eval::run_closure(&ctx.definitions, target, [argument])?;
    Ok((usage, ty))
}

/// The tensor pair eliminator. The first component enters scope at `p ⊗ r`,
/// the second at `r`; both are discharged when the body returns.
fn type_synth_tensor_elim(
    ctx: &Context,
    r: Relevance,
    term: &Inferable,
    scrutinee: &RcInferable,
    body: &RcCheckable,
    motive: &RcCheckable,
) -> Result<(Usage, RcValue)> {
    let (scrutinee_usage, pair_ty) = type_synth(ctx, r, scrutinee)?;
    let Value::TensorTy(p, source, rest) = &*pair_ty else {
        return Err(Error::Inference {
            expected: Expectation::TensorPairTy,
            actual: quoted(ctx, &pair_ty)?,
            term: Rc::new(term.clone()),
        });
    };

    check_motive(ctx, motive, pair_ty.clone())?;

    let (body_usage, ()) = with_local(
        ctx,
        *p * r.multiplicity(),
        source.clone(),
        "the pair eliminator",
        |ctx, first| {
            let first_val = Value::free_rc(first.clone());
            let second_ty = eval::run_closure(&ctx.definitions, rest, [first_val.clone()])?;
            with_local(
                ctx,
                r.multiplicity(),
                second_ty,
                "the pair eliminator",
                |ctx, second| {
                    let opened = body
                        .subst(1, &Inferable::Free(first.clone()))
                        .subst(0, &Inferable::Free(second.clone()));
                    let pair = Rc::new(Value::TensorPair(
                        first_val.clone(),
                        Value::free_rc(second.clone()),
                    ));
                    let body_ty = eval_motive(ctx, motive, pair)?;
                    let usage = type_check(ctx, r, &opened, &body_ty)?;
                    Ok((usage, ()))
                },
            )
        },
    )?;

    let usage = scrutinee_usage.join(body_usage);
    let scrutinee_val = eval_inferable(ctx, scrutinee)?;
    let ty = eval_motive(ctx, motive, scrutinee_val)?;
    Ok((usage, ty))
}

/// The tensor unit eliminator.
fn type_synth_tensor_unit_elim(
    ctx: &Context,
    r: Relevance,
    term: &Inferable,
    scrutinee: &RcInferable,
    body: &RcCheckable,
    motive: &RcCheckable,
) -> Result<(Usage, RcValue)> {
    let (scrutinee_usage, unit_ty) = type_synth(ctx, r, scrutinee)?;
    let Value::TensorUnitTy = &*unit_ty else {
        return Err(Error::Inference {
            expected: Expectation::TensorUnitTy,
            actual: quoted(ctx, &unit_ty)?,
            term: Rc::new(term.clone()),
        });
    };

    check_motive(ctx, motive, Rc::new(Value::TensorUnitTy))?;

    let body_ty = eval_motive(ctx, motive, Rc::new(Value::TensorUnit))?;
    let body_usage = type_check(ctx, r, body, &body_ty)?;

    let usage = scrutinee_usage.join(body_usage);
    let scrutinee_val = eval_inferable(ctx, scrutinee)?;
    let ty = eval_motive(ctx, motive, scrutinee_val)?;
    Ok((usage, ty))
}

fn type_synth_first(
    ctx: &Context,
    r: Relevance,
    term: &Inferable,
    pair: &RcInferable,
) -> Result<(Usage, RcValue)> {
    let (usage, pair_ty) = type_synth(ctx, r, pair)?;
    let Value::WithTy(source, _) = &*pair_ty else {
        return Err(Error::Inference {
            expected: Expectation::WithPairTy,
            actual: quoted(ctx, &pair_ty)?,
            term: Rc::new(term.clone()),
        });
    };
    Ok((usage, source.clone()))
}

fn type_synth_second(
    ctx: &Context,
    r: Relevance,
    term: &Inferable,
    pair: &RcInferable,
) -> Result<(Usage, RcValue)> {
    let (usage, pair_ty) = type_synth(ctx, r, pair)?;
    let Value::WithTy(_, rest) = &*pair_ty else {
        return Err(Error::Inference {
            expected: Expectation::WithPairTy,
            actual: quoted(ctx, &pair_ty)?,
            term: Rc::new(term.clone()),
        });
    };
    let first = eval::run_first(&*eval_inferable(ctx, pair)?)?;
    let ty = eval::run_closure(&ctx.definitions, rest, [first])?;
    Ok((usage, ty))
}

/// Check a checkable term against an expected type, returning its usage.
fn type_check(ctx: &Context, r: Relevance, term: &Checkable, ty: &Value) -> Result<Usage> {
    match (term, ty) {
        (Checkable::Inf(inner), _) => type_check_inf(ctx, r, inner, ty),
        (Checkable::Lam(body), Value::Pi(p, source, target)) => {
            type_check_lambda(ctx, r, body, *p, source, target)
        }
        (Checkable::TensorPair(first, second), Value::TensorTy(p, source, rest)) => {
            type_check_tensor_pair(ctx, r, first, second, *p, source, rest)
        }
        (Checkable::WithPair(first, second), Value::WithTy(source, rest)) => {
            type_check_with_pair(ctx, r, first, second, source, rest)
        }
        (Checkable::Pi(_, source, target), Value::Universe) => {
            type_check_dependent_ty(ctx, r, term, source, target)
        }
        (Checkable::TensorTy(_, source, rest), Value::Universe) => {
            type_check_dependent_ty(ctx, r, term, source, rest)
        }
        (Checkable::WithTy(source, rest), Value::Universe) => {
            type_check_dependent_ty(ctx, r, term, source, rest)
        }
        (Checkable::Universe, Value::Universe)
        | (Checkable::TensorUnitTy, Value::Universe)
        | (Checkable::WithUnitTy, Value::Universe) => {
            require_erased(r, term)?;
            Ok(Usage::new())
        }
        (Checkable::TensorUnit, Value::TensorUnitTy) => Ok(Usage::new()),
        (Checkable::WithUnit, Value::WithUnitTy) => Ok(Usage::new()),
        (term, ty) => Err(Error::Check {
            expected: quoted(ctx, ty)?,
            term: Rc::new(term.clone()),
        }),
    }
}

/// Check an embedded inferable term: synthesize, then compare normal forms.
fn type_check_inf(ctx: &Context, r: Relevance, term: &RcInferable, ty: &Value) -> Result<Usage> {
    let (usage, actual) = type_synth(ctx, r, term)?;
    let expected = quoted(ctx, ty)?;
    let actual = quoted(ctx, &actual)?;
    if expected != actual {
        return Err(Error::Inference {
            expected: Expectation::Type(expected),
            actual,
            term: term.clone(),
        });
    }
    Ok(usage)
}

fn type_check_lambda(
    ctx: &Context,
    r: Relevance,
    body: &Checkable,
    p: Multiplicity,
    source: &RcValue,
    target: &Closure,
) -> Result<Usage> {
    let (usage, ()) = with_local(
        ctx,
        p * r.multiplicity(),
        source.clone(),
        "the λ-abstraction",
        |ctx, name| {
            let opened = body.subst(0, &Inferable::Free(name.clone()));
            let body_ty =
                eval::run_closure(&ctx.definitions, target, [Value::free_rc(name.clone())])?;
            let usage = type_check(ctx, r, &opened, &body_ty)?;
            Ok((usage, ()))
        },
    )?;
    Ok(usage)
}

/// Check a tensor pair introduction. The first component is consumed
/// `p ⊗ r` times; at zero it is checked erased and contributes nothing.
fn type_check_tensor_pair(
    ctx: &Context,
    r: Relevance,
    first: &RcCheckable,
    second: &RcCheckable,
    p: Multiplicity,
    source: &RcValue,
    rest: &Closure,
) -> Result<Usage> {
    let s = p * r.multiplicity();
    let first_val = eval_checkable(ctx, first)?;
    let second_ty = eval::run_closure(&ctx.definitions, rest, [first_val])?;
    if s.is_zero() {
        check_erased(ctx, first, source)?;
        type_check(ctx, r, second, &second_ty)
    } else {
        let first_usage = type_check(ctx, Relevance::Present, first, source)?;
        let second_usage = type_check(ctx, r, second, &second_ty)?;
        Ok(second_usage.join(first_usage.scale(s)))
    }
}

/// Check an additive pair introduction. The components share one resource
/// budget: the pair offers a choice of projection, so the combined usage is
/// the pointwise least upper bound.
fn type_check_with_pair(
    ctx: &Context,
    r: Relevance,
    first: &RcCheckable,
    second: &RcCheckable,
    source: &RcValue,
    rest: &Closure,
) -> Result<Usage> {
    let first_usage = type_check(ctx, r, first, source)?;
    let first_val = eval_checkable(ctx, first)?;
    let second_ty = eval::run_closure(&ctx.definitions, rest, [first_val])?;
    let second_usage = type_check(ctx, r, second, &second_ty)?;
    Ok(first_usage.lub(second_usage))
}

/// Check a dependent type former (Π, ⊗, &) against the universe. Formers
/// live in erased positions only, and their components are types.
fn type_check_dependent_ty(
    ctx: &Context,
    r: Relevance,
    term: &Checkable,
    source: &Checkable,
    rest: &Checkable,
) -> Result<Usage> {
    require_erased(r, term)?;
    let erased = ctx.erased();
    let source_usage = type_check(&erased, Relevance::Erased, source, &Value::Universe)?;
    let source_ty = eval_checkable(&erased, source)?;
    let (rest_usage, ()) = with_local(
        &erased,
        Multiplicity::Zero,
        source_ty,
        "the type former",
        |ctx, name| {
            let opened = rest.subst(0, &Inferable::Free(name.clone()));
            let usage = type_check(ctx, Relevance::Erased, &opened, &Value::Universe)?;
            Ok((usage, ()))
        },
    )?;
    Ok(source_usage.join(rest_usage))
}

/// An eliminator motive must be a type for an arbitrary scrutinee; checked
/// in the erased shadow with a zero-allowance local standing for it.
fn check_motive(ctx: &Context, motive: &Checkable, scrutinee_ty: RcValue) -> Result<()> {
    let erased = ctx.erased();
    let (usage, ()) = with_local(
        &erased,
        Multiplicity::Zero,
        scrutinee_ty,
        "the eliminator motive",
        |ctx, name| {
            let opened = motive.subst(0, &Inferable::Free(name.clone()));
            let usage = type_check(ctx, Relevance::Erased, &opened, &Value::Universe)?;
            Ok((usage, ()))
        },
    )?;
    debug_assert!(usage.is_all_zero(), "erased check returned a non-zero usage");
    Ok(())
}

/// Check a term in the erased shadow, discarding its usage. Every
/// contribution in erased mode is zero; a non-zero entry is a kernel bug.
fn check_erased(ctx: &Context, term: &Checkable, ty: &Value) -> Result<()> {
    let usage = type_check(&ctx.erased(), Relevance::Erased, term, ty)?;
    debug_assert!(usage.is_all_zero(), "erased check returned a non-zero usage");
    Ok(())
}

/// Type formers and atomic types live in erased positions only.
fn require_erased(r: Relevance, term: &Checkable) -> Result<()> {
    match r {
        Relevance::Erased => Ok(()),
        Relevance::Present => Err(Error::Erasure {
            term: Rc::new(term.clone()),
            usage: r.multiplicity(),
        }),
    }
}

/// Run `f` with a fresh local of the given multiplicity and type in scope,
/// then discharge the local: its accumulated usage must fit the declared
/// allowance, and its entry is removed from the usage that flows outward.
fn with_local<T>(
    ctx: &Context,
    multiplicity: Multiplicity,
    ty: RcValue,
    binder: &'static str,
    f: impl FnOnce(&Context, &Name) -> Result<(Usage, T)>,
) -> Result<(Usage, T)> {
    let name = Name::Local(Level::new(ctx.depth()));
    let inner = ctx.extended(Binding::new(name.clone(), multiplicity, ty.clone()));
    let (mut usage, result) = f(&inner, &name)?;
    let used = usage.take(&name);
    if !used.fits_in(multiplicity) {
        return Err(Error::Multiplicity {
            binder: Some(binder),
            violations: vec![Violation {
                name,
                ty: quoted(ctx, &ty)?,
                used,
                available: multiplicity,
            }],
        });
    }
    Ok((usage, result))
}

fn quoted(ctx: &Context, value: &Value) -> Result<RcCheckable> {
    Ok(quote0(&ctx.definitions, value)?)
}

fn eval_checkable(ctx: &Context, term: &Checkable) -> Result<RcValue> {
    let mut env = eval::Environment::new(&ctx.definitions);
    Ok(eval::eval_checkable(&mut env, term)?)
}

fn eval_inferable(ctx: &Context, term: &Inferable) -> Result<RcValue> {
    let mut env = eval::Environment::new(&ctx.definitions);
    Ok(eval::eval_inferable(&mut env, term)?)
}

/// Evaluate a motive with the scrutinee value standing for its binder.
fn eval_motive(ctx: &Context, motive: &Checkable, scrutinee: RcValue) -> Result<RcValue> {
    let mut env =
        eval::Environment::with_locals(&ctx.definitions, LocalEnv::from(vec![scrutinee]));
    Ok(eval::eval_checkable(&mut env, motive)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Index;
    use crate::resource::Multiplicity::{Many, One, Zero};

    fn global(name: &str) -> Name {
        Name::global(name)
    }

    /// assume (0 a : 𝘜) (1 x : a)
    fn ctx0() -> Context {
        let mut ctx = Context::new();
        ctx.assume(Binding::new(global("a"), Zero, Value::universe_rc()));
        ctx.assume(Binding::new(global("x"), One, Value::free_rc(global("a"))));
        ctx
    }

    /// (λx. λy. y : (0 x : 𝘜) → (1 y : x) → x)
    fn annotated_identity() -> RcInferable {
        let body = Checkable::lam_rc(Checkable::lam_rc(Checkable::bound_rc(Index(0))));
        let ty = Checkable::pi_rc(
            Zero,
            Checkable::universe_rc(),
            Checkable::pi_rc(
                One,
                Checkable::bound_rc(Index(0)),
                Checkable::bound_rc(Index(1)),
            ),
        );
        Inferable::ann_rc(body, ty)
    }

    fn normal_form(ctx: &Context, value: &Value) -> RcCheckable {
        quoted(ctx, value).expect("quotation failed")
    }

    #[test]
    fn the_identity_applied_to_a_linear_variable_checks() {
        let ctx = ctx0();
        let term = Inferable::App(
            Inferable::app_rc(annotated_identity(), Checkable::free_rc(global("a"))),
            Checkable::free_rc(global("x")),
        );
        let ty = type_synth_top(&ctx, One, &term).expect("checking failed");
        assert_eq!(normal_form(&ctx, &ty), Checkable::free_rc(global("a")));
    }

    #[test]
    fn synthesis_reports_usages_before_scaling() {
        let ctx = ctx0();
        let term = Inferable::App(
            Inferable::app_rc(annotated_identity(), Checkable::free_rc(global("a"))),
            Checkable::free_rc(global("x")),
        );
        let (usage, _) = type_synth(&ctx, Relevance::Present, &term).expect("checking failed");
        assert_eq!(usage.get(&global("x")), One);
        // `a` only appears in erased positions.
        assert_eq!(usage.get(&global("a")), Zero);
    }

    #[test]
    fn checking_at_q_is_the_one_usage_scaled_by_q() {
        let ctx = ctx0();
        let term = Inferable::App(
            Inferable::app_rc(annotated_identity(), Checkable::free_rc(global("a"))),
            Checkable::free_rc(global("x")),
        );
        let (at_one, _) = type_synth(&ctx, Relevance::Present, &term).expect("checking failed");
        for q in [Zero, One, Many] {
            let (at_r, _) = type_synth(&ctx, q.relevance(), &term).expect("checking failed");
            let scaled_r = at_r.scale(q);
            let scaled_one = at_one.clone().scale(q);
            for name in [global("a"), global("x")] {
                assert_eq!(scaled_r.get(&name), scaled_one.get(&name));
            }
        }
    }

    #[test]
    fn unknown_variables_are_reported() {
        let ctx = ctx0();
        let err = type_synth_top(&ctx, One, &Inferable::Free(global("b"))).unwrap_err();
        assert_eq!(
            err,
            Error::UnknownVariable { name: global("b") }
        );
    }

    #[test]
    fn an_unused_linear_variable_fails_top_level_verification() {
        // let 0 add = ⟨x, y⟩ : (x : a) & b, with 1 x : a and 1 y : b in
        // scope: scaling by zero leaves x and y consumed zero times, which
        // does not fit their linear allowance.
        let mut ctx = Context::new();
        ctx.assume(Binding::new(global("a"), Zero, Value::universe_rc()));
        ctx.assume(Binding::new(global("b"), Zero, Value::universe_rc()));
        ctx.assume(Binding::new(global("x"), One, Value::free_rc(global("a"))));
        ctx.assume(Binding::new(global("y"), One, Value::free_rc(global("b"))));
        let term = Inferable::Ann(
            Checkable::with_pair_rc(
                Checkable::free_rc(global("x")),
                Checkable::free_rc(global("y")),
            ),
            Checkable::with_ty_rc(
                Checkable::free_rc(global("a")),
                Checkable::free_rc(global("b")),
            ),
        );
        let err = type_synth_top(&ctx, Zero, &term).unwrap_err();
        let Error::Multiplicity {
            binder: None,
            violations,
        } = err
        else {
            panic!("expected a multiplicity violation, got {:?}", err);
        };
        let summary: Vec<_> = violations
            .iter()
            .map(|v| (v.name.clone(), v.used, v.available))
            .collect();
        assert_eq!(
            summary,
            vec![(global("x"), Zero, One), (global("y"), Zero, One)]
        );
    }

    #[test]
    fn consuming_a_linear_variable_twice_fails() {
        // (x, x) : (1 t : a) ⊗ a
        let ctx = ctx0();
        let term = Inferable::Ann(
            Checkable::tensor_pair_rc(
                Checkable::free_rc(global("x")),
                Checkable::free_rc(global("x")),
            ),
            Checkable::tensor_ty_rc(
                One,
                Checkable::free_rc(global("a")),
                Checkable::free_rc(global("a")),
            ),
        );
        let err = type_synth_top(&ctx, One, &term).unwrap_err();
        let Error::Multiplicity {
            binder: None,
            violations,
        } = err
        else {
            panic!("expected a multiplicity violation, got {:?}", err);
        };
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].name, global("x"));
        assert_eq!(violations[0].used, Many);
        assert_eq!(violations[0].available, One);
    }

    #[test]
    fn an_additive_pair_shares_one_budget() {
        // ⟨x, x⟩ : (x : a) & a consumes x once, not twice.
        let ctx = ctx0();
        let term = Inferable::Ann(
            Checkable::with_pair_rc(
                Checkable::free_rc(global("x")),
                Checkable::free_rc(global("x")),
            ),
            Checkable::with_ty_rc(
                Checkable::free_rc(global("a")),
                Checkable::free_rc(global("a")),
            ),
        );
        type_synth_top(&ctx, One, &term).expect("checking failed");
        let (usage, _) = type_synth(&ctx, Relevance::Present, &term).expect("checking failed");
        assert_eq!(usage.get(&global("x")), One);
    }

    #[test]
    fn additive_pair_usage_is_an_upper_bound_of_both_components() {
        // ⟨x, ⟨⟩⟩ : (x : a) & ⊤ uses x in one component only; the combined
        // usage bounds both sides, so it lands at ω.
        let ctx = ctx0();
        let term = Inferable::Ann(
            Checkable::with_pair_rc(
                Checkable::free_rc(global("x")),
                Rc::new(Checkable::WithUnit),
            ),
            Checkable::with_ty_rc(
                Checkable::free_rc(global("a")),
                Rc::new(Checkable::WithUnitTy),
            ),
        );
        let (usage, _) = type_synth(&ctx, Relevance::Present, &term).expect("checking failed");
        assert_eq!(usage.get(&global("x")), Many);
    }

    #[test]
    fn an_unused_linear_lambda_binder_fails_at_discharge() {
        // λx. () : (1 x : 𝟭ₘ) → 𝟭ₘ never consumes x.
        let ctx = Context::new();
        let term = Inferable::Ann(
            Checkable::lam_rc(Rc::new(Checkable::TensorUnit)),
            Checkable::pi_rc(
                One,
                Rc::new(Checkable::TensorUnitTy),
                Rc::new(Checkable::TensorUnitTy),
            ),
        );
        let err = type_synth_top(&ctx, One, &term).unwrap_err();
        let Error::Multiplicity {
            binder: Some(_),
            violations,
        } = err
        else {
            panic!("expected a binder discharge violation, got {:?}", err);
        };
        assert_eq!(violations[0].used, Zero);
        assert_eq!(violations[0].available, One);
    }

    #[test]
    fn type_formers_demand_erasure() {
        // A Π-type in a runtime position is an erasure error.
        let ctx = ctx0();
        let pi = Checkable::pi_rc(
            One,
            Checkable::free_rc(global("a")),
            Checkable::free_rc(global("a")),
        );
        let err = type_check(&ctx, Relevance::Present, &pi, &Value::Universe).unwrap_err();
        assert!(matches!(err, Error::Erasure { .. }));
    }

    #[test]
    fn erased_checking_of_types_uses_nothing() {
        let ctx = ctx0();
        let pi = Checkable::pi_rc(
            Many,
            Checkable::free_rc(global("a")),
            Checkable::free_rc(global("a")),
        );
        let usage = type_check(&ctx.erased(), Relevance::Erased, &pi, &Value::Universe)
            .expect("checking failed");
        assert!(usage.is_all_zero());
    }

    #[test]
    fn lambdas_against_non_functions_are_check_errors() {
        let ctx = Context::new();
        let term = Inferable::Ann(
            Checkable::lam_rc(Checkable::bound_rc(Index(0))),
            Checkable::universe_rc(),
        );
        let err = type_synth_top(&ctx, Zero, &term).unwrap_err();
        assert!(matches!(err, Error::Check { .. }));
    }

    #[test]
    fn inference_mismatches_report_both_types() {
        // x : a annotated as 𝘜.
        let ctx = ctx0();
        let term = Inferable::Ann(
            Checkable::free_rc(global("x")),
            Checkable::universe_rc(),
        );
        let err = type_synth_top(&ctx, Zero, &term).unwrap_err();
        let Error::Inference {
            expected: Expectation::Type(expected),
            actual,
            ..
        } = err
        else {
            panic!("expected an inference mismatch, got {:?}", err);
        };
        assert_eq!(*expected, Checkable::Universe);
        assert_eq!(actual, Checkable::free_rc(global("a")));
    }

    #[test]
    fn tensor_elim_consumes_both_components() {
        // assume (0 a : 𝘜) (1 p : (1 t : a) ⊗ a); the eliminator swaps the
        // components, consuming each exactly once.
        let mut ctx = Context::new();
        ctx.assume(Binding::new(global("a"), Zero, Value::universe_rc()));
        let pair_ty = Checkable::tensor_ty_rc(
            One,
            Checkable::free_rc(global("a")),
            Checkable::free_rc(global("a")),
        );
        let pair_ty_val = eval_checkable(&ctx, &pair_ty).unwrap();
        ctx.assume(Binding::new(global("p"), One, pair_ty_val));

        // let z @ (x, y) = p in (y, x) : (1 t : a) ⊗ a
        let term = Inferable::TensorElim(
            Inferable::free_rc(global("p")),
            Checkable::tensor_pair_rc(Checkable::bound_rc(Index(0)), Checkable::bound_rc(Index(1))),
            pair_ty.clone(),
        );
        let ty = type_synth_top(&ctx, One, &term).expect("checking failed");
        assert_eq!(normal_form(&ctx, &ty), pair_ty);
    }

    #[test]
    fn tensor_unit_elim_checks_against_its_motive() {
        // assume (1 u : 𝟭ₘ); let z @ () = u in () : 𝟭ₘ
        let mut ctx = Context::new();
        ctx.assume(Binding::new(
            global("u"),
            One,
            Rc::new(Value::TensorUnitTy),
        ));
        let term = Inferable::TensorUnitElim(
            Inferable::free_rc(global("u")),
            Rc::new(Checkable::TensorUnit),
            Rc::new(Checkable::TensorUnitTy),
        );
        let ty = type_synth_top(&ctx, One, &term).expect("checking failed");
        assert!(matches!(&*ty, Value::TensorUnitTy));
    }

    #[test]
    fn projections_type_through_with_pairs() {
        // assume (0 a : 𝘜) (0 b : 𝘜) (w p : a & b)
        let mut ctx = Context::new();
        ctx.assume(Binding::new(global("a"), Zero, Value::universe_rc()));
        ctx.assume(Binding::new(global("b"), Zero, Value::universe_rc()));
        let with_ty = Checkable::with_ty_rc(
            Checkable::free_rc(global("a")),
            Checkable::free_rc(global("b")),
        );
        let with_ty_val = eval_checkable(&ctx, &with_ty).unwrap();
        ctx.assume(Binding::new(global("p"), Many, with_ty_val));

        let first = Inferable::First(Inferable::free_rc(global("p")));
        let ty = type_synth_top(&ctx, One, &first).expect("checking failed");
        assert_eq!(normal_form(&ctx, &ty), Checkable::free_rc(global("a")));

        let second = Inferable::Second(Inferable::free_rc(global("p")));
        let ty = type_synth_top(&ctx, One, &second).expect("checking failed");
        assert_eq!(normal_form(&ctx, &ty), Checkable::free_rc(global("b")));
    }

    #[test]
    fn weakening_preserves_judgments() {
        let ctx = ctx0();
        let term = Inferable::App(
            Inferable::app_rc(annotated_identity(), Checkable::free_rc(global("a"))),
            Checkable::free_rc(global("x")),
        );
        let (usage, ty) = type_synth(&ctx, Relevance::Present, &term).expect("checking failed");

        let mut wider = ctx.clone();
        wider.assume(Binding::new(global("unused"), Many, Value::universe_rc()));
        let (usage_w, ty_w) =
            type_synth(&wider, Relevance::Present, &term).expect("checking failed");

        assert_eq!(usage, usage_w);
        assert_eq!(normal_form(&ctx, &ty), normal_form(&wider, &ty_w));
    }

    #[test]
    fn erased_applications_discard_argument_usage() {
        // Applying the annotated identity to `a` erases the first argument,
        // so `a` is only ever used at multiplicity zero even though it
        // occurs in term position.
        let ctx = ctx0();
        let term = Inferable::App(annotated_identity(), Checkable::free_rc(global("a")));
        let (usage, _) = type_synth(&ctx, Relevance::Present, &term).expect("checking failed");
        assert_eq!(usage.get(&global("a")), Zero);
    }

    #[test]
    fn round_trip_normal_forms_recheck() {
        let ctx = ctx0();
        let term = Inferable::App(
            Inferable::app_rc(annotated_identity(), Checkable::free_rc(global("a"))),
            Checkable::free_rc(global("x")),
        );
        let ty = type_synth_top(&ctx, One, &term).expect("checking failed");
        let value = eval_inferable(&ctx, &term).expect("evaluation failed");
        let normal = quoted(&ctx, &value).expect("quotation failed");
        // The normal form still checks against the synthesized type.
        let usage =
            type_check(&ctx, Relevance::Present, &normal, &ty).expect("recheck failed");
        assert_eq!(usage.get(&global("x")), One);
        // And normalization is idempotent from here.
        let again = quoted(&ctx, &eval_checkable(&ctx, &normal).unwrap()).unwrap();
        assert_eq!(normal, again);
    }

    #[test]
    fn type_query_ignores_resources() {
        // Querying the type of a linear variable must not consume it.
        let ctx = ctx0();
        let ty = type_query(&ctx, &Inferable::Free(global("x"))).expect("query failed");
        assert_eq!(normal_form(&ctx, &ty), Checkable::free_rc(global("a")));
    }
}
