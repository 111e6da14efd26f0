//! Document linter.
//!
//! Walks a parsed document and reports every finding instead of stopping at
//! the first. Parse-time advisories share the [`Diagnostic`] type but are
//! collected by the parser, see [`Document::warnings`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use num_bigint::BigInt;
use num_traits::One;
use tracing::debug;

use crate::datatype::DataType;
use crate::document::{
    DerivedStructure, Document, PrimitiveData, PrimitiveStructure, Structure,
};
use crate::error::Position;
use crate::value::{NameKind, Reference};

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// What a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// `\'` in a string, `\"` in a character literal, or `\?` anywhere.
    NeedlessEscape,
    /// A `//` comment that runs into the end of input.
    CommentWithoutNewline,
    /// Leading, trailing, or doubled `_` in a number.
    DigitSeparators,
    DuplicateGlobalName,
    /// A value that is not of its structure's data type.
    TypeMismatch,
    /// An integer that does not fit its structure's width.
    OutOfRange,
    /// An array group whose length differs from the declared size.
    ArrayArity,
    DuplicateProperty,
    UnresolvedReference,
    DuplicateLocalName,
}

/// A located finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl Diagnostic {
    pub fn new(severity: Severity, kind: DiagnosticKind, message: String, pos: Position) -> Self {
        Self {
            severity,
            kind,
            message,
            line: pos.line,
            column: pos.column,
        }
    }

    pub fn warning(kind: DiagnosticKind, message: String, pos: Position) -> Self {
        Self::new(Severity::Warning, kind, message, pos)
    }

    pub fn error(kind: DiagnosticKind, message: String, pos: Position) -> Self {
        Self::new(Severity::Error, kind, message, pos)
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.position(), self.severity, self.message)
    }
}

/// Check a document, returning findings ordered by position.
pub fn check(doc: &Document) -> Vec<Diagnostic> {
    let mut linter = Linter {
        doc,
        findings: Vec::new(),
    };
    linter.duplicate_globals();
    linter.level(doc.structures(), None);

    let mut findings = linter.findings;
    findings.sort_by_key(|d| (d.line, d.column));
    debug!(
        findings = findings.len(),
        errors = findings.iter().filter(|d| d.is_error()).count(),
        "checked document"
    );
    findings
}

/// The structures visible to a local name lookup, innermost first.
struct Scope<'s> {
    siblings: &'s [Structure],
    parent: Option<&'s Scope<'s>>,
}

impl<'s> Scope<'s> {
    /// The nearest structure carrying local name `$id`.
    fn find_local(&self, id: &str) -> Option<&'s Structure> {
        let mut scope = Some(self);
        while let Some(s) = scope {
            let found = s.siblings.iter().find(|child| {
                child
                    .name()
                    .is_some_and(|n| n.kind == NameKind::Local && n.id == id)
            });
            if found.is_some() {
                return found;
            }
            scope = s.parent;
        }
        None
    }
}

struct Linter<'a> {
    doc: &'a Document,
    findings: Vec<Diagnostic>,
}

impl<'a> Linter<'a> {
    fn error(&mut self, kind: DiagnosticKind, message: String, pos: Position) {
        self.findings.push(Diagnostic::error(kind, message, pos));
    }

    fn warning(&mut self, kind: DiagnosticKind, message: String, pos: Position) {
        self.findings.push(Diagnostic::warning(kind, message, pos));
    }

    fn duplicate_globals(&mut self) {
        let doc = self.doc;
        for (id, paths) in doc.globals() {
            let Some(first) = paths.first().and_then(|p| doc.get(p)) else {
                continue;
            };
            let first = first.position();
            for path in &paths[1..] {
                if let Some(repeat) = doc.get(path) {
                    self.error(
                        DiagnosticKind::DuplicateGlobalName,
                        format!("duplicate global name %{} (first declared at {})", id, first),
                        repeat.position(),
                    );
                }
            }
        }
    }

    /// Check one list of sibling structures and everything below it.
    fn level(&mut self, siblings: &[Structure], parent: Option<&Scope<'_>>) {
        let here = Scope { siblings, parent };
        self.duplicate_locals(siblings);
        for structure in siblings {
            match structure {
                Structure::Primitive(p) => self.primitive(p, &here),
                Structure::Derived(d) => {
                    let inner = Scope {
                        siblings: &d.children,
                        parent: Some(&here),
                    };
                    self.properties(d, &inner);
                    self.level(&d.children, Some(&here));
                }
            }
        }
    }

    fn duplicate_locals(&mut self, siblings: &[Structure]) {
        let mut seen: HashMap<&str, Position> = HashMap::new();
        for structure in siblings {
            let Some(name) = structure.name().filter(|n| n.kind == NameKind::Local) else {
                continue;
            };
            match seen.get(name.id.as_str()) {
                Some(first) => self.warning(
                    DiagnosticKind::DuplicateLocalName,
                    format!("duplicate local name ${} (first declared at {})", name.id, first),
                    structure.position(),
                ),
                None => {
                    seen.insert(&name.id, structure.position());
                }
            }
        }
    }

    fn properties(&mut self, d: &DerivedStructure, scope: &Scope<'_>) {
        let mut seen = HashSet::new();
        for property in &d.properties {
            if !seen.insert(property.key.as_str()) {
                self.error(
                    DiagnosticKind::DuplicateProperty,
                    format!("duplicate property \"{}\" in {}", property.key, d.identifier),
                    property.position,
                );
            }
            if let Some(r) = property.value.as_reference() {
                self.reference(r, scope, property.position);
            }
        }
    }

    fn primitive(&mut self, p: &PrimitiveStructure, scope: &Scope<'_>) {
        for (i, value) in p.data.literals().enumerate() {
            let pos = p.value_position(i);
            if !value.conforms_to(p.data_type) {
                self.error(
                    DiagnosticKind::TypeMismatch,
                    format!("{} value in {} structure", value.kind_name(), p.data_type),
                    pos,
                );
                continue;
            }
            if let Some(n) = value.as_integer() {
                self.range(n, p.data_type, pos);
            }
            if let Some(r) = value.as_reference() {
                self.reference(r, scope, pos);
            }
        }
        if let PrimitiveData::Array { size, groups, .. } = &p.data {
            for (i, group) in groups.iter().enumerate() {
                if group.len() != *size {
                    self.error(
                        DiagnosticKind::ArrayArity,
                        format!(
                            "array element {} has {} values, expected {}",
                            i,
                            group.len(),
                            size
                        ),
                        p.group_position(i),
                    );
                }
            }
        }
    }

    /// Signed widths also accept the unsigned bit pattern of the same width,
    /// so `0xFF` is a valid `i8`.
    fn range(&mut self, n: &BigInt, data_type: DataType, pos: Position) {
        let Some((bits, signed)) = data_type.integer_bits() else {
            return;
        };
        let max = (BigInt::one() << bits) - 1;
        let min = if signed {
            -(BigInt::one() << (bits - 1))
        } else {
            BigInt::from(0)
        };
        if *n < min || *n > max {
            self.error(
                DiagnosticKind::OutOfRange,
                format!("{} out of range for {}", n, data_type),
                pos,
            );
        }
    }

    fn reference(&mut self, r: &Reference, scope: &Scope<'_>, pos: Position) {
        let Reference::Path { root, members } = r else {
            return;
        };
        match root.kind {
            NameKind::Global => {
                if self.doc.resolve(r).is_none() {
                    self.error(
                        DiagnosticKind::UnresolvedReference,
                        format!("unresolved reference {}", r),
                        pos,
                    );
                }
            }
            NameKind::Local => {
                let resolved = scope.find_local(&root.id).and_then(|start| {
                    members
                        .iter()
                        .try_fold(start, |node, member| node.member(member))
                });
                if resolved.is_none() {
                    self.warning(
                        DiagnosticKind::UnresolvedReference,
                        format!("unresolved local reference {}", r),
                        pos,
                    );
                }
            }
        }
    }
}
