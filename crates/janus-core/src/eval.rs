use crate::syntax::{Checkable, Inferable, RcCheckable};
use crate::value::{Closure, Definitions, LocalEnv, Neutral, RcValue, Value};
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

/// An attempt to reduce an elimination whose head has the wrong shape. The
/// type checker never hands such a term to the evaluator; these exist so the
/// evaluator is total as a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    BadApplication,
    BadTensorElim,
    BadTensorUnitElim,
    BadProjection,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadApplication => f.write_str("applied a value that is not a function"),
            Error::BadTensorElim => f.write_str("eliminated a value that is not a tensor pair"),
            Error::BadTensorUnitElim => f.write_str("eliminated a value that is not the tensor unit"),
            Error::BadProjection => f.write_str("projected from a value that is not an additive pair"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// The evaluation environment: global definitions plus the local value stack.
pub struct Environment<'g> {
    pub definitions: &'g Definitions,
    pub locals: LocalEnv,
}

impl<'g> Environment<'g> {
    pub fn new(definitions: &'g Definitions) -> Environment<'g> {
        Environment {
            definitions,
            locals: LocalEnv::new(),
        }
    }

    pub fn with_locals(definitions: &'g Definitions, locals: LocalEnv) -> Environment<'g> {
        Environment {
            definitions,
            locals,
        }
    }

    fn capture(&self, term: &RcCheckable) -> Closure {
        Closure::new(self.locals.clone(), term.clone())
    }
}

/// Evaluate an inferable term to a weak-head value.
pub fn eval_inferable(env: &mut Environment, term: &Inferable) -> Result<RcValue> {
    match term {
        Inferable::Ann(term, _) => eval_checkable(env, term),
        Inferable::Bound(index) => Ok(env.locals.get(*index).clone()),
        Inferable::Free(name) => Ok(match env.definitions.get(name) {
            Some(value) => value.clone(),
            None => Value::free_rc(name.clone()),
        }),
        Inferable::App(function, argument) => {
            let function = eval_inferable(env, function)?;
            let argument = eval_checkable(env, argument)?;
            run_application(env.definitions, &function, argument)
        }
        Inferable::TensorElim(scrutinee, body, motive) => {
            let scrutinee = eval_inferable(env, scrutinee)?;
            let body = env.capture(body);
            let motive = env.capture(motive);
            run_tensor_elim(env.definitions, &scrutinee, body, motive)
        }
        Inferable::TensorUnitElim(scrutinee, body, motive) => {
            let scrutinee = eval_inferable(env, scrutinee)?;
            let body = env.capture(body);
            let motive = env.capture(motive);
            run_tensor_unit_elim(env.definitions, &scrutinee, body, motive)
        }
        Inferable::First(pair) => {
            let pair = eval_inferable(env, pair)?;
            run_first(&pair)
        }
        Inferable::Second(pair) => {
            let pair = eval_inferable(env, pair)?;
            run_second(&pair)
        }
    }
}

/// Evaluate a checkable term to a weak-head value. Binder bodies are not
/// entered; they are captured as closures over the current locals.
pub fn eval_checkable(env: &mut Environment, term: &Checkable) -> Result<RcValue> {
    match term {
        Checkable::Inf(term) => eval_inferable(env, term),
        Checkable::Lam(body) => Ok(Rc::new(Value::Lam(env.capture(body)))),
        Checkable::Universe => Ok(Rc::new(Value::Universe)),
        Checkable::Pi(q, source, target) => {
            let source = eval_checkable(env, source)?;
            Ok(Rc::new(Value::Pi(*q, source, env.capture(target))))
        }
        Checkable::TensorTy(q, source, rest) => {
            let source = eval_checkable(env, source)?;
            Ok(Rc::new(Value::TensorTy(*q, source, env.capture(rest))))
        }
        Checkable::TensorPair(first, second) => {
            let first = eval_checkable(env, first)?;
            let second = eval_checkable(env, second)?;
            Ok(Rc::new(Value::TensorPair(first, second)))
        }
        Checkable::TensorUnitTy => Ok(Rc::new(Value::TensorUnitTy)),
        Checkable::TensorUnit => Ok(Rc::new(Value::TensorUnit)),
        Checkable::WithTy(source, rest) => {
            let source = eval_checkable(env, source)?;
            Ok(Rc::new(Value::WithTy(source, env.capture(rest))))
        }
        Checkable::WithPair(first, second) => {
            let first = eval_checkable(env, first)?;
            let second = eval_checkable(env, second)?;
            Ok(Rc::new(Value::WithPair(first, second)))
        }
        Checkable::WithUnitTy => Ok(Rc::new(Value::WithUnitTy)),
        Checkable::WithUnit => Ok(Rc::new(Value::WithUnit)),
    }
}

/// Perform a delayed substitution: extend the closure's captured locals with
/// the arguments and evaluate the body.
pub fn run_closure<T>(definitions: &Definitions, closure: &Closure, args: T) -> Result<RcValue>
where
    T: IntoIterator<Item = RcValue>,
{
    let mut locals = closure.locals.clone();
    locals.extend(args);
    let mut env = Environment::with_locals(definitions, locals);
    eval_checkable(&mut env, &closure.term)
}

/// Apply a function value to an argument.
pub fn run_application(
    definitions: &Definitions,
    function: &Value,
    argument: RcValue,
) -> Result<RcValue> {
    match function {
        Value::Lam(body) => run_closure(definitions, body, [argument]),
        Value::Neutral(neutral) => Ok(Value::neutral_rc(Neutral::App(neutral.clone(), argument))),
        _ => Err(Error::BadApplication),
    }
}

/// Eliminate a tensor pair: reduce on a pair, go stuck on a neutral.
pub fn run_tensor_elim(
    definitions: &Definitions,
    scrutinee: &Value,
    body: Closure,
    motive: Closure,
) -> Result<RcValue> {
    match scrutinee {
        Value::TensorPair(first, second) => {
            run_closure(definitions, &body, [first.clone(), second.clone()])
        }
        Value::Neutral(neutral) => Ok(Value::neutral_rc(Neutral::TensorElim(
            neutral.clone(),
            body,
            motive,
        ))),
        _ => Err(Error::BadTensorElim),
    }
}

/// Eliminate the tensor unit.
pub fn run_tensor_unit_elim(
    definitions: &Definitions,
    scrutinee: &Value,
    body: Closure,
    motive: Closure,
) -> Result<RcValue> {
    match scrutinee {
        Value::TensorUnit => run_closure(definitions, &body, []),
        Value::Neutral(neutral) => Ok(Value::neutral_rc(Neutral::TensorUnitElim(
            neutral.clone(),
            body,
            motive,
        ))),
        _ => Err(Error::BadTensorUnitElim),
    }
}

pub fn run_first(pair: &Value) -> Result<RcValue> {
    match pair {
        Value::WithPair(first, _) => Ok(first.clone()),
        Value::Neutral(neutral) => Ok(Value::neutral_rc(Neutral::First(neutral.clone()))),
        _ => Err(Error::BadProjection),
    }
}

pub fn run_second(pair: &Value) -> Result<RcValue> {
    match pair {
        Value::WithPair(_, second) => Ok(second.clone()),
        Value::Neutral(neutral) => Ok(Value::neutral_rc(Neutral::Second(neutral.clone()))),
        _ => Err(Error::BadProjection),
    }
}
