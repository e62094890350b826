//! Per-procedure symbol tables mapping identifiers to frame-pointer offsets,
//! and the scope stack the emitter threads through a translation.
//!
//! Offsets are byte displacements from the frame pointer: locals occupy
//! `0, -4, -8, …` in declaration order, parameters `4, 8, …` until
//! [`SymbolTable::invert_param_offsets`] flips them so the leftmost parameter
//! ends up deepest in the caller-built frame.

use derive_more::{Deref, DerefMut};
use std::collections::HashMap;
use thiserror::Error;

/// Word size of the target, in bytes.
pub const WORD: i32 = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("undeclared identifier {0}")]
    Unbound(String),
    #[error("no open scope")]
    NoScope,
}

/// What an identifier is bound to within one frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Binding<T> {
    pub ty: T,
    pub offset: i32,
}

/// One procedure's bindings. Dereferences to the underlying map for
/// iteration and introspection; mutation goes through the insert methods so
/// the offset counters stay consistent.
#[derive(Debug, Deref, DerefMut)]
pub struct SymbolTable<T> {
    #[deref]
    #[deref_mut]
    vars: HashMap<String, Binding<T>>,
    local_ctr: i32,
    param_ctr: i32,
}

impl<T> Default for SymbolTable<T> {
    fn default() -> Self {
        Self {
            vars: HashMap::new(),
            local_ctr: 0,
            param_ctr: WORD,
        }
    }
}

impl<T: Copy> SymbolTable<T> {
    pub fn insert_local(&mut self, id: &str, ty: T) {
        self.vars.insert(
            id.into(),
            Binding {
                ty,
                offset: self.local_ctr,
            },
        );
        self.local_ctr -= WORD;
    }

    pub fn insert_param(&mut self, id: &str, ty: T) {
        self.vars.insert(
            id.into(),
            Binding {
                ty,
                offset: self.param_ctr,
            },
        );
        self.param_ctr += WORD;
    }

    pub fn binding(&self, id: &str) -> Result<Binding<T>, Error> {
        self.vars
            .get(id)
            .copied()
            .ok_or_else(|| Error::Unbound(id.into()))
    }

    /// Replace each positive offset `k` with `4 + 4N - k`, where `N` is the
    /// number of parameters. Called once, after the whole parameter list has
    /// been inserted left to right; afterwards the leftmost parameter holds
    /// the largest offset and the rightmost holds offset 4, matching the
    /// order in which the caller pushes arguments.
    pub fn invert_param_offsets(&mut self) {
        let max = WORD * self.vars.values().filter(|b| b.offset > 0).count() as i32;
        for binding in self.vars.values_mut() {
            if binding.offset > 0 {
                binding.offset = WORD + max - binding.offset;
            }
        }
    }
}

/// Stack of scopes, one per procedure being translated. Only the topmost
/// scope is ever consulted or mutated.
#[derive(Debug)]
pub struct SymbolTableStack<T>(Vec<SymbolTable<T>>);

impl<T> Default for SymbolTableStack<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T: Copy> SymbolTableStack<T> {
    pub fn push(&mut self) {
        self.0.push(SymbolTable::default());
    }

    pub fn pop(&mut self) -> Result<(), Error> {
        self.0.pop().map(|_| ()).ok_or(Error::NoScope)
    }

    pub fn current(&self) -> Result<&SymbolTable<T>, Error> {
        self.0.last().ok_or(Error::NoScope)
    }

    pub fn current_mut(&mut self) -> Result<&mut SymbolTable<T>, Error> {
        self.0.last_mut().ok_or(Error::NoScope)
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn insert_local(&mut self, id: &str, ty: T) -> Result<(), Error> {
        self.current_mut()?.insert_local(id, ty);
        Ok(())
    }

    pub fn insert_param(&mut self, id: &str, ty: T) -> Result<(), Error> {
        self.current_mut()?.insert_param(id, ty);
        Ok(())
    }

    pub fn binding(&self, id: &str) -> Result<Binding<T>, Error> {
        self.current()?.binding(id)
    }

    pub fn invert_param_offsets(&mut self) -> Result<(), Error> {
        self.current_mut()?.invert_param_offsets();
        Ok(())
    }
}
