use elegance::{Io, Printer, Render};

const COLUMNS: usize = 80;

/// Ambient printing state, threaded by copy through the printers.
#[derive(Clone, Copy)]
pub struct State {
    /// Ambient binder depth.
    depth: usize,
    /// Ambient operator binding power. A node whose own binding power is
    /// below the ambient one must parenthesize itself.
    prec: u8,
}

impl State {
    pub fn new() -> Self {
        Self { depth: 0, prec: 0 }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn prec(&self) -> u8 {
        self.prec
    }

    /// Enter a binder: one more variable is in scope.
    pub fn deeper(&self) -> Self {
        Self {
            depth: self.depth + 1,
            ..*self
        }
    }

    pub fn at(&self, prec: u8) -> Self {
        Self { prec, ..*self }
    }
}

impl Default for State {
    fn default() -> Self {
        State::new()
    }
}

pub trait PP {
    fn print<R: Render>(&self, st: State, p: &mut Printer<R>) -> Result<(), R::Error>;
}

impl<T: PP> PP for std::rc::Rc<T> {
    fn print<R: Render>(&self, st: State, p: &mut Printer<R>) -> Result<(), R::Error> {
        self.as_ref().print(st, p)
    }
}

/// Binder display names by depth. The same pool names binders in printed
/// types and local variables in diagnostics, so the two always agree.
pub fn binder_name(depth: usize) -> String {
    const POOL: [&str; 3] = ["x", "y", "z"];
    match POOL.get(depth) {
        Some(name) => (*name).to_string(),
        None => format!("x{}", depth),
    }
}

pub fn dump<T: PP>(x: &T) {
    let mut p = Printer::new(Io(std::io::stdout()), COLUMNS);
    let st = State::new();
    let _ = x.print(st, &mut p);
    let _ = p.hard_break();
    let _ = p.finish();
}

pub fn render<T: PP>(x: &T) -> String {
    let mut p = Printer::new(String::new(), COLUMNS);
    let st = State::new();
    let _ = x.print(st, &mut p);
    p.finish().unwrap_or_default()
}
