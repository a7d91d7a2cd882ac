//! Two-level scoped symbol table (spec's §3 "Symbol Table", §9).
//!
//! Class scope (`static`/`field`) persists for the lifetime of a class;
//! subroutine scope (`argument`/`local`) is pushed fresh for each subroutine
//! and discarded when compilation of that subroutine ends. A sentinel
//! `Class` entry records the enclosing class's own name so the codegen can
//! recover it without threading a separate parameter everywhere — mirrors
//! `original_source/compiler/compiler.go`'s `Symbol{Kind: "class"}` marker.

use crate::error::CompileError;
use crate::types::Type;
use std::collections::HashMap;

/// The kind of a symbol table entry. `Class` is a bookkeeping sentinel, not
/// a variable — it never occupies a VM segment slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Static,
    Field,
    Argument,
    Local,
    Class,
}

impl SymbolKind {
    /// The VM memory segment a variable of this kind lives in.
    ///
    /// Panics on `Class`, which is never a real variable — callers only
    /// reach this after already branching on `SymbolKind::Class` elsewhere
    /// (see `Symbol::segment`'s doc).
    pub fn segment(self) -> &'static str {
        match self {
            SymbolKind::Static => "static",
            SymbolKind::Field => "this",
            SymbolKind::Argument => "argument",
            SymbolKind::Local => "local",
            SymbolKind::Class => unreachable!("SymbolKind::Class has no VM segment"),
        }
    }

    fn is_class_level(self) -> bool {
        matches!(self, SymbolKind::Static | SymbolKind::Field)
    }
}

/// One entry in the table: a name's type, kind, and index within its
/// (scope, kind) bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub type_name: Type,
    pub kind: SymbolKind,
    pub index: usize,
}

/// A single lexical scope: the class scope, or one subroutine's scope.
#[derive(Debug, Default, Clone)]
struct Scope {
    entries: HashMap<String, Symbol>,
    counts: [usize; 4], // indexed by SymbolKind::Static/Field/Argument/Local as 0..4
}

fn count_slot(kind: SymbolKind) -> usize {
    match kind {
        SymbolKind::Static => 0,
        SymbolKind::Field => 1,
        SymbolKind::Argument => 2,
        SymbolKind::Local => 3,
        SymbolKind::Class => unreachable!("SymbolKind::Class is not counted"),
    }
}

/// The ordered stack of scopes: index 0 is always the class scope; index 1,
/// when present, is the current subroutine's scope.
#[derive(Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    /// Begin a new class: resets the table to a single, empty class scope
    /// and records the class's own name under `SymbolKind::Class`.
    pub fn start_class(class_name: &str) -> Self {
        let mut class_scope = Scope::default();
        class_scope.entries.insert(
            class_name.to_string(),
            Symbol {
                type_name: Type::Class(class_name.to_string()),
                kind: SymbolKind::Class,
                index: 0,
            },
        );
        SymbolTable {
            scopes: vec![class_scope],
        }
    }

    /// Begin a new subroutine: pushes a fresh scope on top of the class
    /// scope, discarding any previous subroutine scope.
    pub fn start_subroutine(&mut self) {
        self.scopes.truncate(1);
        self.scopes.push(Scope::default());
    }

    /// Define a new variable in the innermost scope. Redefinition of the
    /// same name within the same scope overwrites the previous entry, per
    /// the single-pass construction in spec's §4.2 (the parser never emits
    /// the same name twice in one declaration block).
    pub fn define(&mut self, name: &str, type_name: Type, kind: SymbolKind) {
        let scope = self.scopes.last_mut().expect("symbol table has no active scope");
        let slot = count_slot(kind);
        let index = scope.counts[slot];
        scope.counts[slot] += 1;
        scope.entries.insert(
            name.to_string(),
            Symbol {
                type_name,
                kind,
                index,
            },
        );
    }

    /// Look up a name, innermost scope first — subroutine-scope entries
    /// shadow class-scope entries of the same name.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|s| s.entries.get(name))
    }

    /// Look up a name and fail with [`CompileError::UnresolvedIdentifier`]
    /// if it is not in scope — the form most call sites in codegen want.
    pub fn resolve(&self, name: &str) -> Result<&Symbol, CompileError> {
        self.lookup(name)
            .ok_or_else(|| CompileError::UnresolvedIdentifier(name.to_string()))
    }

    /// How many variables of `kind` have been defined in the scope that
    /// currently owns that kind (class scope for `Static`/`Field`,
    /// subroutine scope for `Argument`/`Local`).
    pub fn count(&self, kind: SymbolKind) -> usize {
        let slot = count_slot(kind);
        if kind.is_class_level() {
            self.scopes[0].counts[slot]
        } else {
            self.scopes.last().map(|s| s.counts[slot]).unwrap_or(0)
        }
    }

    /// The name of the class currently being compiled, via the `Class`
    /// sentinel planted by [`SymbolTable::start_class`].
    pub fn find_class(&self) -> &str {
        self.scopes[0]
            .entries
            .values()
            .find(|s| s.kind == SymbolKind::Class)
            .map(|s| match &s.type_name {
                Type::Class(name) => name.as_str(),
                _ => unreachable!("Class sentinel always carries a Type::Class"),
            })
            .expect("start_class always plants the Class sentinel")
    }
}
