use crate::common::Index;
use crate::name::Name;
use crate::resource::Multiplicity;
use crate::syntax::RcCheckable;
use indexmap::IndexMap;
use std::rc::Rc;

pub type RcValue = Rc<Value>;
pub type RcNeutral = Rc<Neutral>;

/// A pending evaluation: the term to reduce together with the local
/// environment it closes over. Substitution is performed by extending the
/// captured environment at application time.
#[derive(Clone, Debug)]
pub struct Closure {
    pub locals: LocalEnv,
    pub term: RcCheckable,
}

impl Closure {
    pub fn new(locals: LocalEnv, term: RcCheckable) -> Closure {
        Closure { locals, term }
    }
}

/// Weak-head values. β-redexes never appear; stuck eliminations are
/// represented by [`Neutral`].
#[derive(Clone, Debug)]
pub enum Value {
    Lam(Closure),
    Universe,
    Pi(Multiplicity, RcValue, Closure),
    TensorTy(Multiplicity, RcValue, Closure),
    TensorPair(RcValue, RcValue),
    TensorUnitTy,
    TensorUnit,
    WithTy(RcValue, Closure),
    WithPair(RcValue, RcValue),
    WithUnitTy,
    WithUnit,
    Neutral(RcNeutral),
}

/// An elimination stuck on a free variable.
#[derive(Clone, Debug)]
pub enum Neutral {
    Free(Name),
    App(RcNeutral, RcValue),
    /// A pair eliminator stuck on its scrutinee; the body closure has two
    /// pending binders, the motive closure one.
    TensorElim(RcNeutral, Closure, Closure),
    TensorUnitElim(RcNeutral, Closure, Closure),
    First(RcNeutral),
    Second(RcNeutral),
}

impl Value {
    /// The value of a variable that reduces no further.
    pub fn free(name: Name) -> Value {
        Value::Neutral(Rc::new(Neutral::Free(name)))
    }

    pub fn free_rc(name: Name) -> RcValue {
        Rc::new(Value::free(name))
    }

    pub fn universe_rc() -> RcValue {
        Rc::new(Value::Universe)
    }

    pub fn neutral_rc(neutral: Neutral) -> RcValue {
        Rc::new(Value::Neutral(Rc::new(neutral)))
    }
}

/// The local value stack: `Bound(i)` resolves to the value pushed `i`
/// frames ago.
#[derive(Clone, Debug, Default)]
pub struct LocalEnv(Vec<RcValue>);

impl LocalEnv {
    pub fn new() -> LocalEnv {
        LocalEnv(Vec::new())
    }

    pub fn get(&self, index: Index) -> &RcValue {
        &self.0[self.0.len() - 1 - index.to_usize()]
    }

    pub fn push(&mut self, value: RcValue) {
        self.0.push(value);
    }

    pub fn extend<T>(&mut self, values: T)
    where
        T: IntoIterator<Item = RcValue>,
    {
        self.0.extend(values);
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<RcValue>> for LocalEnv {
    fn from(values: Vec<RcValue>) -> LocalEnv {
        LocalEnv(values)
    }
}

/// Top-level definitions, in introduction order. Evaluation resolves global
/// names through this table; names without a definition (assumptions) stay
/// neutral.
#[derive(Clone, Debug, Default)]
pub struct Definitions(IndexMap<Name, RcValue>);

impl Definitions {
    pub fn new() -> Definitions {
        Definitions(IndexMap::new())
    }

    pub fn get(&self, name: &Name) -> Option<&RcValue> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: Name, value: RcValue) {
        self.0.insert(name, value);
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &Name> {
        self.0.keys()
    }
}
