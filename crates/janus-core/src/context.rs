use crate::name::Name;
use crate::resource::Multiplicity;
use crate::value::{Definitions, RcValue};

/// A variable together with its declared multiplicity and type.
#[derive(Clone, Debug)]
pub struct Binding {
    pub name: Name,
    pub multiplicity: Multiplicity,
    pub ty: RcValue,
}

impl Binding {
    pub fn new(name: Name, multiplicity: Multiplicity, ty: RcValue) -> Binding {
        Binding {
            name,
            multiplicity,
            ty,
        }
    }
}

/// The typing context: global definitions for evaluation, and the ordered
/// typing environment. Bindings are innermost-last so that lookup realizes
/// shadowing by scanning from the back.
///
/// The judgment never mutates a context it was handed; descent into a binder
/// works on an extended copy.
#[derive(Clone, Debug, Default)]
pub struct Context {
    pub definitions: Definitions,
    pub bindings: Vec<Binding>,
}

impl Context {
    pub fn new() -> Context {
        Context {
            definitions: Definitions::new(),
            bindings: Vec::new(),
        }
    }

    /// The number of bindings in scope; also the next fresh local level.
    pub fn depth(&self) -> usize {
        self.bindings.len()
    }

    pub fn lookup(&self, name: &Name) -> Option<&Binding> {
        self.bindings.iter().rev().find(|b| &b.name == name)
    }

    /// A copy of this context with one more binding in scope.
    pub fn extended(&self, binding: Binding) -> Context {
        let mut extended = self.clone();
        extended.bindings.push(binding);
        extended
    }

    /// The erased shadow: every declared multiplicity forgotten to zero.
    /// Type-level checking runs against this, so that mentioning a variable
    /// in a type never consumes it.
    pub fn erased(&self) -> Context {
        let mut erased = self.clone();
        for binding in erased.bindings.iter_mut() {
            binding.multiplicity = Multiplicity::Zero;
        }
        erased
    }

    /// Record a top-level definition for evaluation.
    pub fn define(&mut self, name: Name, value: RcValue) {
        self.definitions.insert(name, value);
    }

    /// Push a top-level binding (an assumption or a checked definition).
    pub fn assume(&mut self, binding: Binding) {
        self.bindings.push(binding);
    }
}
