use log::{debug, warn};

use crate::analyzer::{Symbol, SymbolTable, Type};
use crate::codegen::{Opcode, QuadTable, Quadruple};
use crate::lexer::{Token, TokenClass};

use super::Diagnostic;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Verdict::Accept => f.write_str("ACCEPT"),
            Verdict::Reject => f.write_str("REJECT"),
        }
    }
}

/// Result of one parse: the verdict, every emitted quadruple in order, and
/// every diagnostic collected along the way.
#[derive(Debug)]
pub struct ParseOutcome {
    pub verdict: Verdict,
    pub quadruples: Vec<Quadruple>,
    pub diagnostics: Vec<Diagnostic>,
}

/// An expression's value during code generation: its type, when known, and
/// the operand text naming it (a literal, an identifier, or a temporary).
/// A `None` type means an earlier diagnostic already fired; downstream
/// mismatch checks stay quiet about it.
type Value = (Option<Type>, String);

/// Recursive-descent parser performing syntax checking, type checking and
/// quadruple emission in a single pass over the token stream.
///
/// The policy on errors is tolerant: a mismatch or semantic violation is
/// recorded and parsing continues with whatever token is current, so one run
/// can surface several diagnostics.
#[derive(Debug)]
pub struct Parser {
    /// Reversed token list, consumed by popping from the end.
    tokens: Vec<Token>,
    current: Option<Token>,
    scope: u32,
    symbol_table: SymbolTable,
    quads: QuadTable,
    diagnostics: Vec<Diagnostic>,
    accepted: bool,
    /// Name and declared return type of the function being parsed.
    current_function: Option<(String, Type)>,
    main_exists: bool,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        tokens.reverse();
        let current = tokens.pop();
        Self {
            tokens,
            current,
            scope: 0,
            symbol_table: SymbolTable::new(),
            quads: QuadTable::new(),
            diagnostics: vec![],
            accepted: true,
            current_function: None,
            main_exists: false,
        }
    }

    pub fn parse(mut self) -> ParseOutcome {
        self.program();

        self.symbol_table.destroy_scope(0);

        if !self.main_exists {
            self.reject_semantic(Diagnostic::MainUndefined);
        }

        let consumed = self.tokens.is_empty() && self.current.is_none();
        let verdict = if self.accepted && consumed {
            Verdict::Accept
        } else {
            Verdict::Reject
        };

        ParseOutcome {
            verdict,
            quadruples: self.quads.into_quads(),
            diagnostics: self.diagnostics,
        }
    }

    // ------------------------------------------------------------------
    // token plumbing

    fn advance(&mut self) {
        self.current = self.tokens.pop();
    }

    /// Tokens left including the current one; used to detect a production
    /// that consumed nothing.
    fn remaining(&self) -> usize {
        self.tokens.len() + self.current.is_some() as usize
    }

    fn current_is(&self, class: TokenClass, lexeme: &str) -> bool {
        self.current
            .as_ref()
            .map(|t| t.is(class, lexeme))
            .unwrap_or(false)
    }

    fn current_is_operator(&self, lexeme: &str) -> bool {
        self.current_is(TokenClass::Operator, lexeme)
    }

    fn current_is_keyword(&self, lexeme: &str) -> bool {
        self.current_is(TokenClass::Keyword, lexeme)
    }

    fn current_class(&self) -> Option<TokenClass> {
        self.current.as_ref().map(|t| t.class)
    }

    fn found(&self) -> String {
        match &self.current {
            Some(t) => format!("[{}] '{}'", t.class, t.lexeme),
            None => "end of input".to_string(),
        }
    }

    /// Consumes the current token if it has the wanted class, returning its
    /// lexeme. On a mismatch the token stays put and the reject flag is set.
    fn match_class(&mut self, class: TokenClass, production: &'static str) -> Option<String> {
        match &self.current {
            Some(t) if t.class == class => {
                let lexeme = t.lexeme.clone();
                self.advance();
                Some(lexeme)
            }
            _ => {
                self.reject_syntax(class.to_string(), production);
                None
            }
        }
    }

    fn match_operator(&mut self, lexeme: &str, production: &'static str) -> bool {
        if self.current_is_operator(lexeme) {
            self.advance();
            true
        } else {
            self.reject_syntax(format!("'{}'", lexeme), production);
            false
        }
    }

    fn match_keyword(&mut self, lexeme: &str, production: &'static str) -> bool {
        if self.current_is_keyword(lexeme) {
            self.advance();
            true
        } else {
            self.reject_syntax(format!("'{}'", lexeme), production);
            false
        }
    }

    fn reject_syntax(&mut self, expected: String, production: &'static str) {
        let d = Diagnostic::Syntax {
            expected,
            found: self.found(),
            production,
        };
        warn!("syntax: {}", d);
        self.accepted = false;
        self.diagnostics.push(d);
    }

    fn reject_semantic(&mut self, diagnostic: Diagnostic) {
        warn!("semantic: {}", diagnostic);
        self.accepted = false;
        self.diagnostics.push(diagnostic);
    }

    // ------------------------------------------------------------------
    // declarations

    /// program -> declaration-list
    fn program(&mut self) {
        debug!("program");
        while self.current.is_some() {
            let before = self.remaining();
            self.declaration();
            if self.remaining() == before {
                // poisoned token, skip it so the pass always terminates
                self.advance();
            }
        }
    }

    /// declaration -> ';'
    ///              | type-specifier ID '(' params ')' compound-stmt
    ///              | type-specifier ID [ '[' NUM ']' ] ';'
    fn declaration(&mut self) {
        debug!("declaration at {}", self.found());
        if self.current_is_operator(";") {
            self.advance();
            return;
        }

        let ty = self.type_specifier("declaration");
        let Some(name) = self.match_class(TokenClass::Identifier, "declaration") else {
            return;
        };
        let ty = ty.unwrap_or(Type::Int);

        if self.current_is_operator("(") {
            self.function_declaration(name, ty);
        } else {
            self.var_declaration(name, ty, "declaration");
        }
    }

    /// type-specifier -> 'int' | 'float' | 'void'
    fn type_specifier(&mut self, production: &'static str) -> Option<Type> {
        let ty = self
            .current
            .as_ref()
            .filter(|t| t.class == TokenClass::Keyword)
            .and_then(|t| Type::from_keyword(&t.lexeme));
        match ty {
            Some(ty) => {
                self.advance();
                Some(ty)
            }
            None => {
                self.reject_syntax("type-specifier".to_string(), production);
                None
            }
        }
    }

    /// Variable tail of a declaration: optional `[ NUM ]`, then `;`. Emits
    /// the `alloc` quadruple and records the symbol.
    fn var_declaration(&mut self, name: String, ty: Type, production: &'static str) {
        if ty == Type::Void {
            self.reject_semantic(Diagnostic::VoidVariable(name.clone()));
        }

        let (ty, size) = if self.current_is_operator("[") {
            self.advance();
            let length = self.integer();
            self.match_operator("]", production);
            let ty = ty.array_of();
            // the bound is never validated, so the size must not wrap
            let size = u64::from(ty.size_of()).saturating_mul(length);
            (ty, size)
        } else {
            let size = u64::from(ty.size_of());
            (ty, size)
        };

        self.match_operator(";", production);

        let symbol = Symbol::new(name.clone(), ty, self.scope);
        if !self.symbol_table.add_symbol(symbol) {
            self.reject_semantic(Diagnostic::DuplicateSymbol(name.clone()));
        }

        self.quads.emit(Opcode::Alloc, size.to_string(), "", name);
    }

    /// integer -> NUM
    fn integer(&mut self) -> u64 {
        let Some(lexeme) = self.match_class(TokenClass::Number, "integer") else {
            return 0;
        };
        match lexeme.parse() {
            Ok(value) => value,
            Err(_) => {
                self.reject_semantic(Diagnostic::IntegerOutOfRange(lexeme));
                0
            }
        }
    }

    /// function-declaration -> '(' params ')' compound-stmt
    fn function_declaration(&mut self, name: String, ty: Type) {
        debug!("function-declaration '{}'", name);

        let symbol = Symbol::function(name.clone(), ty.clone(), self.scope);
        if !self.symbol_table.add_symbol(symbol) {
            self.reject_semantic(Diagnostic::DuplicateSymbol(name.clone()));
        }

        // the parameter count is not known yet, backpatched at ')'
        let func_quad = self
            .quads
            .emit(Opcode::Func, name.clone(), ty.to_string(), "0");

        self.current_function = Some((name.clone(), ty));

        self.match_operator("(", "function-declaration");
        let param_count = self.params(&name);
        self.quads.set_result(func_quad, param_count.to_string());
        self.match_operator(")", "function-declaration");

        self.compound_statement(true);
        self.quads.emit(Opcode::EndFunc, "", "", "");

        if name == "main" && param_count == 0 {
            self.main_exists = true;
        }
        self.current_function = None;
    }

    /// params -> param (',' param)*
    fn params(&mut self, owner: &str) -> usize {
        let mut count = self.param(owner);
        while self.current_is_operator(",") {
            self.advance();
            count += self.param(owner);
        }
        count
    }

    /// param -> type-specifier [ ID [ '[' ']' ] ]
    ///
    /// A bare `void` contributes no parameter; a named `void` parameter is a
    /// semantic error but is still recorded so parsing can continue.
    fn param(&mut self, owner: &str) -> usize {
        let is_void = self.current_is_keyword("void");
        let ty = self.type_specifier("param").unwrap_or(Type::Int);

        if is_void && self.current_class() != Some(TokenClass::Identifier) {
            return 0;
        }
        if is_void {
            let lexeme = self.current.as_ref().map(|t| t.lexeme.clone());
            self.reject_semantic(Diagnostic::NamedVoidParameter(lexeme.unwrap_or_default()));
        }

        let Some(name) = self.match_class(TokenClass::Identifier, "param") else {
            return 0;
        };

        let ty = if self.current_is_operator("[") {
            self.advance();
            self.match_operator("]", "param");
            ty.array_of()
        } else {
            ty
        };
        let size = ty.size_of();

        let symbol = Symbol::parameter(name.clone(), ty, self.scope + 1, owner, self.scope);
        if !self.symbol_table.add_symbol(symbol) {
            self.reject_semantic(Diagnostic::DuplicateSymbol(name.clone()));
        }

        self.quads.emit(Opcode::Param, "", "", name.clone());
        self.quads.emit(Opcode::Alloc, size.to_string(), "", name);
        1
    }

    // ------------------------------------------------------------------
    // statements

    /// compound-stmt -> '{' { local-decl } { statement } '}'
    ///
    /// Nested, non-function compounds are bracketed by `block`/`end block`
    /// markers; a function body is not.
    fn compound_statement(&mut self, function_body: bool) {
        debug!("compound-statement (scope {})", self.scope + 1);
        if !function_body {
            self.quads.emit(Opcode::Block, "", "", "");
        }

        self.match_operator("{", "compound-stmt");
        self.scope += 1;
        self.local_declarations();
        self.statement_list();
        self.match_operator("}", "compound-stmt");
        self.symbol_table.destroy_scope(self.scope);
        self.scope -= 1;

        if !function_body {
            self.quads.emit(Opcode::EndBlock, "", "", "");
        }
    }

    /// local-decl -> type-specifier ID [ '[' NUM ']' ] ';'
    fn local_declarations(&mut self) {
        while self.current_is_keyword("int")
            || self.current_is_keyword("float")
            || self.current_is_keyword("void")
        {
            let ty = self.type_specifier("local-decl").unwrap_or(Type::Int);

            let Some(name) = self.match_class(TokenClass::Identifier, "local-decl") else {
                break;
            };
            self.var_declaration(name, ty, "local-decl");
        }
    }

    fn statement_list(&mut self) {
        while self.current.is_some() && !self.current_is_operator("}") {
            let before = self.remaining();
            self.statement();
            if self.remaining() == before {
                self.advance();
            }
        }
    }

    /// statement -> if-stmt | while-stmt | return-stmt | compound-stmt
    ///            | ';' | expr ';'
    fn statement(&mut self) {
        debug!("statement at {}", self.found());
        let depth = self.quads.backpatch_depth();

        if self.current_is_keyword("if") {
            self.selection_statement();
        } else if self.current_is_keyword("while") {
            self.iteration_statement();
        } else if self.current_is_keyword("return") {
            self.return_statement();
        } else if self.current_is_operator("{") {
            self.compound_statement(false);
        } else if self.current_is_operator(";") {
            self.advance();
        } else {
            self.expression();
            self.match_operator(";", "expression-stmt");
        }

        // a comparison outside a conditional still pushed its branch; it
        // jumps just past this statement. The if/while handlers have already
        // restored the depth, so this pops nothing for them.
        let target = self.quads.next_index();
        self.quads.patch_to_depth(depth, target);
    }

    /// if-stmt -> 'if' '(' expr ')' statement [ 'else' statement ]
    ///
    /// Branches pushed while parsing the condition are patched to the index
    /// one past the controlled statement, which is where an `else` body
    /// begins when present.
    fn selection_statement(&mut self) {
        self.match_keyword("if", "if-stmt");
        self.match_operator("(", "if-stmt");
        let depth = self.quads.backpatch_depth();
        self.expression();
        self.match_operator(")", "if-stmt");

        self.statement();
        let target = self.quads.next_index();
        self.quads.patch_to_depth(depth, target);

        if self.current_is_keyword("else") {
            self.advance();
            self.statement();
        }
    }

    /// while-stmt -> 'while' '(' expr ')' statement
    fn iteration_statement(&mut self) {
        self.match_keyword("while", "while-stmt");
        self.match_operator("(", "while-stmt");
        let depth = self.quads.backpatch_depth();
        self.expression();
        self.match_operator(")", "while-stmt");

        self.statement();
        let target = self.quads.next_index();
        self.quads.patch_to_depth(depth, target);
    }

    /// return-stmt -> 'return' [ expr ] ';'
    fn return_statement(&mut self) {
        self.match_keyword("return", "return-stmt");

        if self.current_is_operator(";") {
            self.quads.emit(Opcode::Return, "", "", "");
        } else {
            let (ty, place) = self.expression();
            match self.current_function.clone() {
                Some((_, Type::Void)) => {
                    self.reject_semantic(Diagnostic::VoidFunctionReturnsValue);
                }
                Some((_, expected)) => {
                    if let Some(found) = ty {
                        if found != expected {
                            self.reject_semantic(Diagnostic::ReturnTypeMismatch {
                                expected: expected.to_string(),
                                found: found.to_string(),
                            });
                        }
                    }
                }
                None => {}
            }
            self.quads.emit(Opcode::Return, "", "", place);
        }

        self.match_operator(";", "return-stmt");
    }

    // ------------------------------------------------------------------
    // expressions

    /// expr -> [ ID var ] ( '=' expr | simple-expr )
    fn expression(&mut self) -> Value {
        if self.current_class() != Some(TokenClass::Identifier) {
            return self.simple_expression(None);
        }

        // the identifier is consumed here; whatever follows decides whether
        // this was an assignment target, a call, or a plain operand
        let name = self.current.as_ref().unwrap().lexeme.clone();
        let symbol = self.symbol_table.lookup(&name, self.scope).cloned();
        if symbol.is_none() {
            self.reject_semantic(Diagnostic::UndeclaredIdentifier(name.clone()));
        }
        self.advance();

        if self.current_is_operator("(") {
            let seed = self.call(&name, symbol.as_ref());
            return self.simple_expression(Some(seed));
        }

        if let Some(s) = &symbol {
            if s.is_function {
                self.reject_semantic(Diagnostic::NotAVariable(name.clone()));
            }
        }

        let (ty, place) = self.var_suffix(&name, symbol.map(|s| s.ty));

        if self.current_is_operator("=") {
            self.assignment(ty, place)
        } else {
            self.simple_expression(Some((ty, place)))
        }
    }

    /// '=' expr. Emits `assign(source, "", target)` after checking that the
    /// right-hand type equals the target's.
    fn assignment(&mut self, target_ty: Option<Type>, target: String) -> Value {
        self.match_operator("=", "assignment");
        let (ty, place) = self.expression();

        if let (Some(expected), Some(found)) = (&target_ty, &ty) {
            if expected != found {
                self.reject_semantic(Diagnostic::AssignmentTypeMismatch {
                    expected: expected.to_string(),
                    found: found.to_string(),
                });
            }
        }

        self.quads.emit(Opcode::Assign, place, "", target.clone());
        (target_ty, target)
    }

    /// simple-expr -> additive-expr { rel-op additive-expr }
    ///
    /// Every comparison emits a `comp` and the inverse branch-if-false, and
    /// pushes the branch for backpatching by the enclosing conditional.
    fn simple_expression(&mut self, seed: Option<Value>) -> Value {
        let (ty, mut place) = self.additive_expression(seed);

        while let Some(op) = self.relational_operator() {
            self.advance();
            let (right_ty, _right_place) = self.additive_expression(None);
            self.check_operands("simple-expr", &ty, &right_ty);

            let temp = self.quads.new_temp();
            self.quads
                .emit(Opcode::Comp, place, op.clone(), temp.clone());

            // branch past the block when the comparison fails; the target is
            // unknown until the enclosing conditional completes
            let branch = Opcode::inverse_branch(&op).unwrap();
            let index = self.quads.emit(branch, temp.clone(), "", "0");
            self.quads.push_backpatch(index);

            place = temp;
        }

        (ty, place)
    }

    fn relational_operator(&self) -> Option<String> {
        const RELATIONAL: &[&str] = &["<=", "<", ">", ">=", "==", "!="];
        self.current
            .as_ref()
            .filter(|t| t.class == TokenClass::Operator && RELATIONAL.contains(&t.lexeme.as_str()))
            .map(|t| t.lexeme.clone())
    }

    /// additive-expr -> term { ('+'|'-') term }
    fn additive_expression(&mut self, seed: Option<Value>) -> Value {
        let (mut ty, mut place) = self.term(seed);

        loop {
            let opcode = if self.current_is_operator("+") {
                Opcode::Add
            } else if self.current_is_operator("-") {
                Opcode::Sub
            } else {
                break;
            };
            self.advance();

            let (right_ty, right_place) = self.term(None);
            self.check_operands("additive-expr", &ty, &right_ty);

            let temp = self.quads.new_temp();
            self.quads.emit(opcode, place, right_place, temp.clone());
            place = temp;
            ty = ty.or(right_ty);
        }

        (ty, place)
    }

    /// term -> factor { ('*'|'/') factor }
    fn term(&mut self, seed: Option<Value>) -> Value {
        let (mut ty, mut place) = match seed {
            Some(value) => value,
            None => self.factor(),
        };

        loop {
            let opcode = if self.current_is_operator("*") {
                Opcode::Mult
            } else if self.current_is_operator("/") {
                Opcode::Div
            } else {
                break;
            };
            self.advance();

            let (right_ty, right_place) = self.factor();
            self.check_operands("term", &ty, &right_ty);

            let temp = self.quads.new_temp();
            self.quads.emit(opcode, place, right_place, temp.clone());
            place = temp;
            ty = ty.or(right_ty);
        }

        (ty, place)
    }

    /// factor -> '(' expr ')' | call | ID var | NUMBER | FLOAT
    fn factor(&mut self) -> Value {
        if self.current_is_operator("(") {
            self.advance();
            let value = self.expression();
            self.match_operator(")", "factor");
            return value;
        }

        match self.current_class() {
            Some(TokenClass::Number) => {
                let lexeme = self.current.as_ref().unwrap().lexeme.clone();
                self.advance();
                (Some(Type::Int), lexeme)
            }
            Some(TokenClass::Float) => {
                let lexeme = self.current.as_ref().unwrap().lexeme.clone();
                self.advance();
                (Some(Type::Float), lexeme)
            }
            Some(TokenClass::Identifier) => {
                let name = self.current.as_ref().unwrap().lexeme.clone();
                let symbol = self.symbol_table.lookup(&name, self.scope).cloned();
                if symbol.is_none() {
                    self.reject_semantic(Diagnostic::UndeclaredIdentifier(name.clone()));
                }
                self.advance();

                if self.current_is_operator("(") {
                    self.call(&name, symbol.as_ref())
                } else {
                    if let Some(s) = &symbol {
                        if s.is_function {
                            self.reject_semantic(Diagnostic::NotAVariable(name.clone()));
                        }
                    }
                    self.var_suffix(&name, symbol.map(|s| s.ty))
                }
            }
            _ => {
                self.reject_syntax("a factor".to_string(), "factor");
                (None, String::new())
            }
        }
    }

    /// var -> [ '[' expr ']' ]
    ///
    /// An element access emits `disp(base, 4, temp)`; the temporary holding
    /// the displacement becomes the operand of the enclosing expression.
    fn var_suffix(&mut self, name: &str, ty: Option<Type>) -> Value {
        if !self.current_is_operator("[") {
            return (ty, name.to_string());
        }
        self.advance();

        let element = match &ty {
            Some(t) => {
                let element = t.element();
                if element.is_none() {
                    self.reject_semantic(Diagnostic::IndexedScalar(name.to_string()));
                }
                element
            }
            None => None,
        };

        let (index_ty, _index_place) = self.expression();
        if let Some(found) = index_ty {
            if found != Type::Int {
                self.reject_semantic(Diagnostic::ArrayIndexNotInt(found.to_string()));
            }
        }
        self.match_operator("]", "var");

        let temp = self.quads.new_temp();
        self.quads.emit(Opcode::Disp, name, "4", temp.clone());
        (element, temp)
    }

    /// call -> '(' args ')'
    ///
    /// Arity or type mismatches are recorded but the `arg`/`call` quadruples
    /// are still emitted for the attempted call.
    fn call(&mut self, name: &str, symbol: Option<&Symbol>) -> Value {
        if let Some(s) = symbol {
            if !s.is_function {
                self.reject_semantic(Diagnostic::NotAFunction(name.to_string()));
            }
        }

        let params = self.symbol_table.load_params(name, self.scope);
        let return_ty = symbol.filter(|s| s.is_function).map(|s| s.ty.clone());

        self.match_operator("(", "call");
        let args = self.arguments();
        self.match_operator(")", "call");

        if args.len() != params.len() {
            self.reject_semantic(Diagnostic::ArgumentCountMismatch {
                callee: name.to_string(),
                found: args.len(),
                expected: params.len(),
            });
        } else {
            for (i, ((arg_ty, _), param)) in args.iter().zip(&params).enumerate() {
                if let Some(found) = arg_ty {
                    if *found != param.ty {
                        self.reject_semantic(Diagnostic::ArgumentTypeMismatch {
                            callee: name.to_string(),
                            index: i,
                            found: found.to_string(),
                            expected: param.ty.to_string(),
                        });
                    }
                }
            }
        }

        for (_, place) in &args {
            self.quads.emit(Opcode::Arg, "", "", place.clone());
        }
        let temp = self.quads.new_temp();
        self.quads
            .emit(Opcode::Call, name, args.len().to_string(), temp.clone());

        (return_ty, temp)
    }

    /// args -> [ expr (',' expr)* ]
    fn arguments(&mut self) -> Vec<Value> {
        let mut args = vec![];
        if self.current_is_operator(")") || self.current.is_none() {
            return args;
        }

        args.push(self.expression());
        while self.current_is_operator(",") {
            self.advance();
            args.push(self.expression());
        }
        args
    }

    /// Binary operands must have identical types; unknown types stay quiet.
    fn check_operands(&mut self, production: &'static str, left: &Option<Type>, right: &Option<Type>) {
        if let (Some(l), Some(r)) = (left, right) {
            if l != r {
                self.reject_semantic(Diagnostic::OperandTypeMismatch {
                    production,
                    left: l.to_string(),
                    right: r.to_string(),
                });
            }
        }
    }
}
