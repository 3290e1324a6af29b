use super::Type;

/// One declared identifier. `parent` is set only on parameters and names the
/// owning function together with the scope it was declared in.
#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub identifier: String,
    pub ty: Type,
    pub scope: u32,
    pub is_function: bool,
    pub parent: Option<(String, u32)>,
    pub params: Vec<Symbol>,
}

impl Symbol {
    pub fn new(identifier: impl Into<String>, ty: Type, scope: u32) -> Self {
        Self {
            identifier: identifier.into(),
            ty,
            scope,
            is_function: false,
            parent: None,
            params: vec![],
        }
    }

    pub fn function(identifier: impl Into<String>, ty: Type, scope: u32) -> Self {
        Self {
            is_function: true,
            ..Self::new(identifier, ty, scope)
        }
    }

    pub fn parameter(
        identifier: impl Into<String>,
        ty: Type,
        scope: u32,
        owner: impl Into<String>,
        owner_scope: u32,
    ) -> Self {
        Self {
            parent: Some((owner.into(), owner_scope)),
            ..Self::new(identifier, ty, scope)
        }
    }
}

/// Scoped symbol table. Entries live in insertion order; lookups scan from
/// the most recently inserted entry backward so the nearest enclosing
/// declaration shadows outer ones.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self { symbols: vec![] }
    }

    /// Inserts a symbol, refusing a duplicate at the exact same scope. A
    /// parameter is additionally recorded on its owning function's symbol.
    pub fn add_symbol(&mut self, symbol: Symbol) -> bool {
        let duplicate = self
            .symbols
            .iter()
            .any(|s| s.identifier == symbol.identifier && s.scope == symbol.scope);
        if duplicate {
            return false;
        }

        if let Some((owner, owner_scope)) = symbol.parent.clone() {
            if let Some(func) = self
                .symbols
                .iter_mut()
                .rev()
                .find(|s| s.is_function && s.identifier == owner && s.scope <= owner_scope)
            {
                func.params.push(symbol.clone());
            }
        }

        self.symbols.push(symbol);
        true
    }

    /// Nearest enclosing declaration of `identifier` visible from `scope`.
    pub fn lookup(&self, identifier: &str, scope: u32) -> Option<&Symbol> {
        self.symbols
            .iter()
            .rev()
            .find(|s| s.identifier == identifier && s.scope <= scope)
    }

    pub fn exists(&self, identifier: &str, scope: u32) -> bool {
        self.lookup(identifier, scope).is_some()
    }

    /// True when the nearest match is a function. A shadowing variable makes
    /// this false, the scan never falls back to an outer function.
    pub fn function_exists(&self, identifier: &str, scope: u32) -> bool {
        self.lookup(identifier, scope)
            .map(|s| s.is_function)
            .unwrap_or(false)
    }

    pub fn var_exists(&self, identifier: &str, scope: u32) -> bool {
        self.lookup(identifier, scope)
            .map(|s| !s.is_function)
            .unwrap_or(false)
    }

    pub fn load_type(&self, identifier: &str, scope: u32) -> Option<Type> {
        self.lookup(identifier, scope).map(|s| s.ty.clone())
    }

    /// Ordered parameter list of the nearest match, empty if none found.
    pub fn load_params(&self, identifier: &str, scope: u32) -> Vec<Symbol> {
        self.lookup(identifier, scope)
            .map(|s| s.params.clone())
            .unwrap_or_default()
    }

    /// Removes every symbol declared at exactly `scope`, called once per
    /// closing compound statement.
    pub fn destroy_scope(&mut self, scope: u32) {
        self.symbols.retain(|s| s.scope != scope);
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
}
