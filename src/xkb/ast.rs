//! Parsed statement tree for a symbols file.
//!
//! This is the input boundary of the compiler: a lexer/parser (not part of this crate)
//! produces these nodes. Every node derives serde so statement trees can also be
//! written by hand as YAML or JSON.
//!
//! ```text
//! XkbFile
//!   └── Statement
//!         ├── Include   include "pc+us(intl):2"
//!         ├── Symbols   key <AC01> { [ a, A ] };
//!         ├── Var       key.type = "ALPHABETIC";  name[Group1] = "US";
//!         ├── VMod      virtual_modifiers NumLock;
//!         └── ModMap    modifier_map Lock { Caps_Lock };
//! ```

use serde::{Deserialize, Serialize};

/// Precedence policy applied when two definitions target the same entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Inherit the mode of the enclosing statement or entry.
    #[default]
    Default,
    Augment,
    Override,
    Replace,
}

impl MergeMode {
    /// Whether the incoming side wins conflicts.
    pub fn clobbers(self) -> bool {
        self != MergeMode::Augment
    }
}

/// One map of a source file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct XkbFile {
    /// Assigned when the file is loaded; used to tune diagnostic verbosity.
    #[serde(skip)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    /// Marks the map used when an include names the file but no map.
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub statements: Vec<Statement>,
}

impl XkbFile {
    pub fn new(name: impl Into<String>, statements: Vec<Statement>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            default: false,
            statements,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statement {
    Include(IncludeStmt),
    Symbols(SymbolsDef),
    Var(VarDef),
    #[serde(rename = "vmod")]
    VMod(VModDef),
    #[serde(rename = "modmap")]
    ModMap(ModMapDef),
}

/// A chain of include directives, e.g. `include "pc+us(intl):2|extra"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawInclude", into = "RawInclude")]
pub struct IncludeStmt {
    pub merge: MergeMode,
    /// The include string as written.
    pub text: String,
    pub directives: Vec<IncludeDirective>,
}

/// One element of an include chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    pub merge: MergeMode,
    pub file: String,
    pub map: Option<String>,
    /// Explicit group number given after `:`.
    pub modifier: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawInclude {
    #[serde(default)]
    merge: MergeMode,
    include: String,
}

impl TryFrom<RawInclude> for IncludeStmt {
    type Error = String;

    fn try_from(raw: RawInclude) -> Result<Self, Self::Error> {
        IncludeStmt::parse(raw.merge, &raw.include)
    }
}

impl From<IncludeStmt> for RawInclude {
    fn from(stmt: IncludeStmt) -> Self {
        RawInclude {
            merge: stmt.merge,
            include: stmt.text,
        }
    }
}

/// `key <NAME> { ... };`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolsDef {
    #[serde(default)]
    pub merge: MergeMode,
    pub key: String,
    #[serde(default)]
    pub body: Vec<VarDef>,
}

/// A field assignment, either global or inside a key body.
///
/// A body entry without a name is a bare `[ ... ]` list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VarDef {
    #[serde(default)]
    pub merge: MergeMode,
    #[serde(default)]
    pub name: Option<Expr>,
    #[serde(default)]
    pub value: Option<Expr>,
}

impl VarDef {
    /// `field = value`
    pub fn field(field: &str, value: Expr) -> Self {
        Self {
            merge: MergeMode::Default,
            name: Some(Expr::Ident(field.to_string())),
            value: Some(value),
        }
    }

    /// `field[index] = value`
    pub fn indexed(field: &str, index: i64, value: Expr) -> Self {
        Self {
            merge: MergeMode::Default,
            name: Some(Expr::ArrayRef {
                element: None,
                field: field.to_string(),
                index: Box::new(Expr::Integer(index)),
            }),
            value: Some(value),
        }
    }

    /// `element.field = value`
    pub fn element(element: &str, field: &str, value: Expr) -> Self {
        Self {
            merge: MergeMode::Default,
            name: Some(Expr::FieldRef {
                element: element.to_string(),
                field: field.to_string(),
            }),
            value: Some(value),
        }
    }

    /// A nameless body entry such as `[ a, A ]`.
    pub fn bare(value: Expr) -> Self {
        Self {
            merge: MergeMode::Default,
            name: None,
            value: Some(value),
        }
    }
}

/// `virtual_modifiers NAME [= value];`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VModDef {
    #[serde(default)]
    pub merge: MergeMode,
    pub name: String,
    #[serde(default)]
    pub value: Option<Expr>,
}

/// `modifier_map MOD { <KEY>, keysym, ... };`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModMapDef {
    #[serde(default)]
    pub merge: MergeMode,
    pub modifier: String,
    pub keys: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Ident(String),
    String(String),
    Integer(i64),
    KeyName(String),
    FieldRef {
        element: String,
        field: String,
    },
    ArrayRef {
        #[serde(default)]
        element: Option<String>,
        field: String,
        index: Box<Expr>,
    },
    /// One inner list per level; a level may hold several keysym names.
    KeysymList(Vec<Vec<String>>),
    ActionList(Vec<Expr>),
    Action {
        name: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
    Assign {
        lhs: Box<Expr>,
        value: Box<Expr>,
    },
    Not(Box<Expr>),
    Negate(Box<Expr>),
    UnaryPlus(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn ident(name: &str) -> Self {
        Expr::Ident(name.to_string())
    }

    pub fn string(text: &str) -> Self {
        Expr::String(text.to_string())
    }

    pub fn key_name(name: &str) -> Self {
        Expr::KeyName(name.to_string())
    }

    /// Keysym list with exactly one symbol per level.
    pub fn keysyms(levels: &[&str]) -> Self {
        Expr::KeysymList(levels.iter().map(|s| vec![s.to_string()]).collect())
    }

    pub fn action(name: &str, args: Vec<Expr>) -> Self {
        Expr::Action {
            name: name.to_string(),
            args,
        }
    }

    pub fn assign(field: &str, value: Expr) -> Self {
        Expr::Assign {
            lhs: Box::new(Expr::ident(field)),
            value: Box::new(value),
        }
    }

    /// Name of the expression kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Ident(_) => "identifier",
            Expr::String(_) => "string",
            Expr::Integer(_) => "integer",
            Expr::KeyName(_) => "key name",
            Expr::FieldRef { .. } => "field reference",
            Expr::ArrayRef { .. } => "array reference",
            Expr::KeysymList(_) => "keysym list",
            Expr::ActionList(_) => "action list",
            Expr::Action { .. } => "action declaration",
            Expr::Assign { .. } => "assignment",
            Expr::Not(_) => "logical not",
            Expr::Negate(_) => "negation",
            Expr::UnaryPlus(_) => "unary plus",
            Expr::Add(_, _) => "addition",
        }
    }
}
