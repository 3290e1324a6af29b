use std::fmt;

/// A C- type. Arrays carry no length; the declared length only matters for
/// the `alloc` quadruple emitted at the declaration site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type {
    Int,
    Float,
    Void,
    Array(Box<Type>),
}

impl Type {
    /// Maps a `type-specifier` keyword lexeme.
    pub fn from_keyword(lexeme: &str) -> Option<Type> {
        match lexeme {
            "int" => Some(Type::Int),
            "float" => Some(Type::Float),
            "void" => Some(Type::Void),
            _ => None,
        }
    }

    pub fn array_of(self) -> Type {
        Type::Array(Box::new(self))
    }

    /// Strips one `[]` suffix, the decay performed by an element access.
    /// Returns `None` when indexing a scalar.
    pub fn element(&self) -> Option<Type> {
        match self {
            Type::Array(inner) => Some((**inner).clone()),
            _ => None,
        }
    }

    /// Size in bytes of one value of this type; an array's total allocation
    /// is `size_of() * length`, computed at the declaration site.
    pub fn size_of(&self) -> u32 {
        match self {
            Type::Void => 0,
            Type::Int | Type::Float => 4,
            Type::Array(inner) => inner.size_of(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Int => f.write_str("int"),
            Type::Float => f.write_str("float"),
            Type::Void => f.write_str("void"),
            Type::Array(inner) => write!(f, "{}[]", inner),
        }
    }
}
