//! The structure tree produced by the parser.

use std::collections::HashMap;

use crate::datatype::DataType;
use crate::encode::{encode, Format};
use crate::error::Position;
use crate::lint::{self, Diagnostic};
use crate::value::{Literal, Name, NameKind, Reference};

/// Child indices leading from the document's top level to a structure.
pub type NodePath = Vec<usize>;

/// A node in the document tree.
///
/// Equality is structural: source positions are ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum Structure {
    Primitive(PrimitiveStructure),
    Derived(DerivedStructure),
}

impl Structure {
    pub fn name(&self) -> Option<&Name> {
        match self {
            Structure::Primitive(p) => p.name.as_ref(),
            Structure::Derived(d) => d.name.as_ref(),
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Structure::Primitive(p) => p.position,
            Structure::Derived(d) => d.position,
        }
    }

    /// Substructures; always empty for primitive structures.
    pub fn children(&self) -> &[Structure] {
        match self {
            Structure::Primitive(_) => &[],
            Structure::Derived(d) => &d.children,
        }
    }

    /// The data type keyword or derived identifier that opens the structure.
    pub fn head(&self) -> &str {
        match self {
            Structure::Primitive(p) => p.data_type.canonical(),
            Structure::Derived(d) => &d.identifier,
        }
    }

    pub fn as_primitive(&self) -> Option<&PrimitiveStructure> {
        match self {
            Structure::Primitive(p) => Some(p),
            Structure::Derived(_) => None,
        }
    }

    pub fn as_derived(&self) -> Option<&DerivedStructure> {
        match self {
            Structure::Derived(d) => Some(d),
            Structure::Primitive(_) => None,
        }
    }

    /// The direct substructure carrying local name `$id`.
    pub fn member(&self, id: &str) -> Option<&Structure> {
        self.children().iter().find(|child| {
            child
                .name()
                .is_some_and(|n| n.kind == NameKind::Local && n.id == id)
        })
    }
}

impl From<PrimitiveStructure> for Structure {
    fn from(p: PrimitiveStructure) -> Self {
        Structure::Primitive(p)
    }
}

impl From<DerivedStructure> for Structure {
    fn from(d: DerivedStructure) -> Self {
        Structure::Derived(d)
    }
}

/// A structure holding literal values of one data type.
#[derive(Debug, Clone)]
pub struct PrimitiveStructure {
    pub data_type: DataType,
    pub name: Option<Name>,
    pub data: PrimitiveData,
    pub position: Position,
    /// Where each value starts, in the order of [`PrimitiveData::literals`].
    /// Empty for structures built in code.
    pub value_positions: Vec<Position>,
    /// Where each `{` of an array group starts.
    pub group_positions: Vec<Position>,
}

impl PrimitiveStructure {
    pub fn flat(data_type: DataType, values: Vec<Literal>) -> Self {
        Self {
            data_type,
            name: None,
            data: PrimitiveData::Flat(values),
            position: Position::default(),
            value_positions: Vec::new(),
            group_positions: Vec::new(),
        }
    }

    pub fn array(data_type: DataType, size: usize, groups: Vec<Vec<Literal>>) -> Self {
        Self {
            data_type,
            name: None,
            data: PrimitiveData::Array {
                size,
                star: false,
                groups,
            },
            position: Position::default(),
            value_positions: Vec::new(),
            group_positions: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: Name) -> Self {
        self.name = Some(name);
        self
    }

    /// Position of the `index`th value, or of the structure when unknown.
    pub fn value_position(&self, index: usize) -> Position {
        self.value_positions
            .get(index)
            .copied()
            .unwrap_or(self.position)
    }

    /// Position of the `index`th array group, or of the structure when unknown.
    pub fn group_position(&self, index: usize) -> Position {
        self.group_positions
            .get(index)
            .copied()
            .unwrap_or(self.position)
    }
}

impl PartialEq for PrimitiveStructure {
    fn eq(&self, other: &Self) -> bool {
        self.data_type == other.data_type && self.name == other.name && self.data == other.data
    }
}

/// The values of a primitive structure.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveData {
    /// `type { v, v, ... }`
    Flat(Vec<Literal>),
    /// `type[size] { {v, ...}, {v, ...} }`; `star` records a `*` after the
    /// size, which is kept and written back but not interpreted.
    Array {
        size: usize,
        star: bool,
        groups: Vec<Vec<Literal>>,
    },
}

impl PrimitiveData {
    pub fn array_size(&self) -> Option<usize> {
        match self {
            PrimitiveData::Flat(_) => None,
            PrimitiveData::Array { size, .. } => Some(*size),
        }
    }

    /// Every literal, in order, regardless of grouping.
    pub fn literals(&self) -> Box<dyn Iterator<Item = &Literal> + '_> {
        match self {
            PrimitiveData::Flat(values) => Box::new(values.iter()),
            PrimitiveData::Array { groups, .. } => Box::new(groups.iter().flatten()),
        }
    }
}

/// A structure with a user-defined identifier, properties, and children.
#[derive(Debug, Clone)]
pub struct DerivedStructure {
    pub identifier: String,
    pub name: Option<Name>,
    /// In declaration order; duplicates are kept for the linter to report.
    pub properties: Vec<Property>,
    pub children: Vec<Structure>,
    pub position: Position,
}

impl DerivedStructure {
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            name: None,
            properties: Vec::new(),
            children: Vec::new(),
            position: Position::default(),
        }
    }

    pub fn with_name(mut self, name: Name) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Literal>) -> Self {
        self.properties.push(Property::new(key, value.into()));
        self
    }

    pub fn with_child(mut self, child: impl Into<Structure>) -> Self {
        self.children.push(child.into());
        self
    }

    /// The first property called `key`.
    pub fn property(&self, key: &str) -> Option<&Literal> {
        self.properties
            .iter()
            .find(|p| p.key == key)
            .map(|p| &p.value)
    }
}

impl PartialEq for DerivedStructure {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
            && self.name == other.name
            && self.properties == other.properties
            && self.children == other.children
    }
}

/// A `key = value` entry in a property list.
#[derive(Debug, Clone)]
pub struct Property {
    pub key: String,
    pub value: Literal,
    pub position: Position,
}

impl Property {
    pub fn new(key: &str, value: Literal) -> Self {
        Self {
            key: key.to_string(),
            value,
            position: Position::default(),
        }
    }
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}

/// A parsed OpenDDL document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    structures: Vec<Structure>,
    /// Global name to every structure declaring it, in document order.
    globals: HashMap<String, Vec<NodePath>>,
    warnings: Vec<Diagnostic>,
}

impl Document {
    /// An empty document.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(structures: Vec<Structure>, warnings: Vec<Diagnostic>) -> Self {
        let mut doc = Self {
            structures: Vec::with_capacity(structures.len()),
            globals: HashMap::new(),
            warnings,
        };
        for structure in structures {
            doc.push(structure);
        }
        doc
    }

    /// Append a top-level structure, registering its global names.
    pub fn push(&mut self, structure: impl Into<Structure>) {
        let structure = structure.into();
        let mut path = vec![self.structures.len()];
        register(&structure, &mut path, &mut self.globals);
        self.structures.push(structure);
    }

    /// Top-level structures in document order.
    pub fn structures(&self) -> &[Structure] {
        &self.structures
    }

    pub fn into_structures(self) -> Vec<Structure> {
        self.structures
    }

    /// Advisories collected while parsing.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    /// The structure at `path`.
    pub fn get(&self, path: &[usize]) -> Option<&Structure> {
        let (first, rest) = path.split_first()?;
        let mut node = self.structures.get(*first)?;
        for &index in rest {
            node = node.children().get(index)?;
        }
        Some(node)
    }

    /// Global names and the paths of the structures declaring them.
    pub fn globals(&self) -> impl Iterator<Item = (&str, &[NodePath])> {
        self.globals
            .iter()
            .map(|(id, paths)| (id.as_str(), paths.as_slice()))
    }

    /// The first structure declaring global name `%id`.
    pub fn global(&self, id: &str) -> Option<&Structure> {
        let path = self.globals.get(id)?.first()?;
        self.get(path)
    }

    /// Resolve a reference that starts at a global name.
    ///
    /// Local references depend on where they appear, so they are only
    /// resolved by the linter, which knows the enclosing scopes.
    pub fn resolve(&self, reference: &Reference) -> Option<&Structure> {
        match reference {
            Reference::Path { root, members } if root.is_global() => {
                let mut node = self.global(&root.id)?;
                for member in members {
                    node = node.member(member)?;
                }
                Some(node)
            }
            _ => None,
        }
    }

    /// Serialize in the given format.
    pub fn write(&self, format: Format) -> String {
        encode(self, format)
    }

    /// Run the linter and return every finding.
    pub fn check(&self) -> Vec<Diagnostic> {
        lint::check(self)
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.structures == other.structures
    }
}

fn register(
    structure: &Structure,
    path: &mut NodePath,
    globals: &mut HashMap<String, Vec<NodePath>>,
) {
    if let Some(name) = structure.name() {
        if name.is_global() {
            globals.entry(name.id.clone()).or_default().push(path.clone());
        }
    }
    for (i, child) in structure.children().iter().enumerate() {
        path.push(i);
        register(child, path, globals);
        path.pop();
    }
}
