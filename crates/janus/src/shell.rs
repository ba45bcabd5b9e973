use anyhow::Context as _;
use janus_core::check::{check_type_erased, type_query, type_synth_top};
use janus_core::eval;
use janus_core::print::render_value;
use janus_core::value::RcValue;
use janus_core::{Binding, Context, Name};
use janus_surface::parse::{parse_inferable, parse_statements, Stmt};
use janus_support::LineInfo;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const HELP: &str = "\
:type <expr>    show the type of an expression
:browse         list the names in scope
:load <file>    run every statement in a file
:help           show this text
:quit           leave the session";

/// What the driver should do after a submitted line.
pub enum Outcome {
    Continue,
    Quit,
}

/// The interactive session state: the typing context, and the pending
/// output redirection set by an `out "file"` statement.
pub struct Shell {
    out_file: Option<PathBuf>,
    context: Context,
}

impl Shell {
    pub fn new() -> Shell {
        Shell {
            out_file: None,
            context: Context::new(),
        }
    }

    /// Handle one line of input: a `:command`, or a buffer of statements.
    pub fn submit(&mut self, line: &str, out: &mut dyn Write) -> io::Result<Outcome> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Outcome::Continue);
        }
        if let Some(command) = line.strip_prefix(':') {
            return self.run_command(command, out);
        }
        self.run_source(line, out)?;
        Ok(Outcome::Continue)
    }

    fn run_command(&mut self, command: &str, out: &mut dyn Write) -> io::Result<Outcome> {
        let (name, rest) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };
        match name {
            "type" => {
                self.cmd_type(rest, out)?;
                Ok(Outcome::Continue)
            }
            "browse" => {
                self.cmd_browse(out)?;
                Ok(Outcome::Continue)
            }
            "load" => {
                if rest.is_empty() {
                    writeln!(out, "usage: :load <file>")?;
                } else if let Err(err) = self.load_path(Path::new(rest), out) {
                    writeln!(out, "error: {:#}", err)?;
                }
                Ok(Outcome::Continue)
            }
            "help" => {
                writeln!(out, "{}", HELP)?;
                Ok(Outcome::Continue)
            }
            "quit" => Ok(Outcome::Quit),
            _ => {
                writeln!(out, "unknown command :{}; try :help", name)?;
                Ok(Outcome::Continue)
            }
        }
    }

    fn cmd_type(&mut self, input: &str, out: &mut dyn Write) -> io::Result<()> {
        let term = match parse_inferable(input) {
            Ok(term) => term,
            Err(err) => return writeln!(out, "parse error: {}", err),
        };
        match type_query(&self.context, &term) {
            Ok(ty) => writeln!(out, "{}", self.show_value(&ty)),
            Err(err) => writeln!(out, "error: {}", err),
        }
    }

    fn cmd_browse(&mut self, out: &mut dyn Write) -> io::Result<()> {
        for binding in &self.context.bindings {
            if let Name::Global(name) = &binding.name {
                let ty = match render_value(&self.context.definitions, &binding.ty) {
                    Ok(ty) => ty,
                    Err(err) => format!("<{}>", err),
                };
                writeln!(out, "{} {} : {}", binding.multiplicity, name, ty)?;
            }
        }
        Ok(())
    }

    /// Read a file and run its statements. I/O failures are the caller's to
    /// report; statement failures have already been rendered to `out`.
    pub fn load_path(&mut self, path: &Path, out: &mut dyn Write) -> anyhow::Result<bool> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Ok(self.run_source(&source, out)?)
    }

    /// Parse and run every statement in the buffer, stopping at the first
    /// failure. Returns whether everything succeeded.
    pub fn run_source(&mut self, source: &str, out: &mut dyn Write) -> io::Result<bool> {
        let statements = match parse_statements(source) {
            Ok(statements) => statements,
            Err(err) => {
                let (line, column) = LineInfo::from_str(source).loc(err.offset);
                writeln!(out, "parse error at {}:{}: {}", line, column, err)?;
                return Ok(false);
            }
        };
        for statement in statements {
            if !self.run_statement(&statement, out)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn run_statement(&mut self, statement: &Stmt, out: &mut dyn Write) -> io::Result<bool> {
        match statement {
            Stmt::Assume(bindings) => {
                for binding in bindings {
                    if let Err(err) = check_type_erased(&self.context, &binding.ty) {
                        writeln!(out, "error: {}", err)?;
                        return Ok(false);
                    }
                    let ty = match self.eval_checkable(&binding.ty) {
                        Ok(ty) => ty,
                        Err(err) => {
                            writeln!(out, "error: {}", err)?;
                            return Ok(false);
                        }
                    };
                    self.context.assume(Binding::new(
                        Name::Global(binding.name.clone()),
                        binding.multiplicity,
                        ty,
                    ));
                }
                Ok(true)
            }
            Stmt::Let(q, name, term) => {
                let ty = match type_synth_top(&self.context, *q, term) {
                    Ok(ty) => ty,
                    Err(err) => {
                        writeln!(out, "error: {}", err)?;
                        return Ok(false);
                    }
                };
                let value = match self.eval_inferable(term) {
                    Ok(value) => value,
                    Err(err) => {
                        writeln!(out, "error: {}", err)?;
                        return Ok(false);
                    }
                };
                let name = Name::Global(name.clone());
                self.context.define(name.clone(), value.clone());
                self.context.assume(Binding::new(name.clone(), *q, ty.clone()));
                let text = format!(
                    "{} {} = {} : {}",
                    q,
                    name,
                    self.show_value(&value),
                    self.show_value(&ty)
                );
                self.emit(out, &text)?;
                Ok(true)
            }
            Stmt::Eval(q, term) => {
                let ty = match type_synth_top(&self.context, *q, term) {
                    Ok(ty) => ty,
                    Err(err) => {
                        writeln!(out, "error: {}", err)?;
                        return Ok(false);
                    }
                };
                let value = match self.eval_inferable(term) {
                    Ok(value) => value,
                    Err(err) => {
                        writeln!(out, "error: {}", err)?;
                        return Ok(false);
                    }
                };
                let text = format!("{} {} : {}", q, self.show_value(&value), self.show_value(&ty));
                self.emit(out, &text)?;
                Ok(true)
            }
            Stmt::PutStrLn(text) => {
                writeln!(out, "{}", text)?;
                Ok(true)
            }
            Stmt::Out(file) => {
                self.out_file = Some(PathBuf::from(file));
                Ok(true)
            }
        }
    }

    /// Print a result line, honouring a pending `out "file"` redirection.
    fn emit(&mut self, out: &mut dyn Write, text: &str) -> io::Result<()> {
        match self.out_file.take() {
            Some(path) => match std::fs::write(&path, format!("{}\n", text)) {
                Ok(()) => Ok(()),
                Err(err) => writeln!(out, "cannot write {}: {}", path.display(), err),
            },
            None => writeln!(out, "{}", text),
        }
    }

    fn eval_checkable(
        &self,
        term: &janus_core::Checkable,
    ) -> eval::Result<RcValue> {
        let mut env = eval::Environment::new(&self.context.definitions);
        eval::eval_checkable(&mut env, term)
    }

    fn eval_inferable(
        &self,
        term: &janus_core::Inferable,
    ) -> eval::Result<RcValue> {
        let mut env = eval::Environment::new(&self.context.definitions);
        eval::eval_inferable(&mut env, term)
    }

    fn show_value(&self, value: &janus_core::Value) -> String {
        render_value(&self.context.definitions, value)
            .unwrap_or_else(|err| format!("<{}>", err))
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new()
    }
}
