use crate::common::Level;
use janus_support::pp::binder_name;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

/// A cheaply clonable piece of source text.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn new(text: &str) -> Symbol {
        Symbol(Rc::from(text))
    }

    pub fn str(&self) -> &str {
        let Symbol(str) = self;
        str
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.str().fmt(f)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Symbol {
        Symbol(Rc::from(s))
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Symbol {
        Symbol(Rc::from(s))
    }
}

/// A variable name.
///
/// `Global` names are introduced by the user and live for the whole session.
/// `Local` names are minted by the type checker when it opens a binder; the
/// level is the environment depth at the point of creation, which makes each
/// one fresh. `Quote` names are the markers quotation substitutes for closure
/// arguments; they never escape a quoted term.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Name {
    Global(Symbol),
    Local(Level),
    Quote(Level),
}

impl Name {
    pub fn global(text: &str) -> Name {
        Name::Global(Symbol::new(text))
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Name::Global(symbol) => symbol.fmt(f),
            // Locals display under the same pool that names binders in
            // printed types, so diagnostics and types agree.
            Name::Local(level) => f.write_str(&binder_name(level.to_usize())),
            Name::Quote(level) => write!(f, "'{}", level),
        }
    }
}
