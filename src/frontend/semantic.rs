//! Semantic analysis for Ember
//!
//! Walks the AST with lexically nested scopes, resolves identifiers,
//! tracks function signatures, infers expression types, and checks
//! pattern-match exhaustiveness. The walk never aborts: every problem is
//! accumulated as a [`SemanticError`] and analysis continues with a
//! best-guess type, so one bad expression does not hide its siblings.

use std::collections::{HashMap, HashSet};

use crate::frontend::ast::{
    ActorDecl, Decorator, Expr, FunctionDecl, PatternCase, Stmt,
};
use crate::frontend::token::{Literal, Token, TokenKind};
use crate::types::{pattern_domain, FunctionType, Type};
use crate::utils::{SemanticError, SemanticErrorKind};

// ==================== Symbol Table ====================

/// Index of a scope in the analyzer's scope arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScopeId(usize);

/// A lexical binding environment
#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    variables: HashMap<String, Type>,
    functions: HashMap<String, FunctionType>,
    type_params: HashMap<String, Type>,
    in_actor: bool,
    in_async: bool,
    in_vectorized: bool,
    /// Loop nesting depth; nothing consumes it yet (Ember has no
    /// break/continue)
    loop_depth: u32,
}

/// Scope arena with a parent chain.
///
/// Scopes are allocated per `analyze` call and indexed by [`ScopeId`];
/// lookups walk from the current scope toward the root.
struct SymbolTable {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl SymbolTable {
    fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            current: ScopeId(0),
        }
    }

    /// Enter a new child scope. Context flags travel down the chain.
    fn enter_scope(&mut self) {
        let id = ScopeId(self.scopes.len());
        let parent = &self.scopes[self.current.0];
        self.scopes.push(Scope {
            parent: Some(self.current),
            in_actor: parent.in_actor,
            in_async: parent.in_async,
            in_vectorized: parent.in_vectorized,
            loop_depth: parent.loop_depth,
            ..Scope::default()
        });
        self.current = id;
    }

    /// Return to the parent scope
    fn exit_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current.0].parent {
            self.current = parent;
        }
    }

    fn current(&self) -> &Scope {
        &self.scopes[self.current.0]
    }

    fn current_mut(&mut self) -> &mut Scope {
        &mut self.scopes[self.current.0]
    }

    fn define_variable(&mut self, name: &str, ty: Type) {
        self.current_mut().variables.insert(name.to_string(), ty);
    }

    fn lookup_variable(&self, name: &str) -> Option<&Type> {
        let mut scope_id = Some(self.current);
        while let Some(id) = scope_id {
            if let Some(ty) = self.scopes[id.0].variables.get(name) {
                return Some(ty);
            }
            scope_id = self.scopes[id.0].parent;
        }
        None
    }

    fn declare_function(&mut self, name: &str, signature: FunctionType) {
        self.current_mut()
            .functions
            .insert(name.to_string(), signature);
    }

    /// Check for a declaration in the current scope only
    fn function_declared_locally(&self, name: &str) -> bool {
        self.current().functions.contains_key(name)
    }

    fn lookup_function(&self, name: &str) -> Option<&FunctionType> {
        let mut scope_id = Some(self.current);
        while let Some(id) = scope_id {
            if let Some(signature) = self.scopes[id.0].functions.get(name) {
                return Some(signature);
            }
            scope_id = self.scopes[id.0].parent;
        }
        None
    }

    fn define_type_param(&mut self, name: &str) {
        self.current_mut()
            .type_params
            .insert(name.to_string(), Type::simple(name));
    }

    fn lookup_type_param(&self, name: &str) -> Option<&Type> {
        let mut scope_id = Some(self.current);
        while let Some(id) = scope_id {
            if let Some(ty) = self.scopes[id.0].type_params.get(name) {
                return Some(ty);
            }
            scope_id = self.scopes[id.0].parent;
        }
        None
    }
}

// ==================== Semantic Analyzer ====================

/// Analyzer policy switches
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzerOptions {
    /// Permit re-declaring a function name in the same scope (last one
    /// wins). Off by default: re-declaration is reported.
    pub allow_function_redeclaration: bool,
}

/// Semantic analyzer
pub struct SemanticAnalyzer {
    symbols: SymbolTable,
    errors: Vec<SemanticError>,
    options: AnalyzerOptions,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self::with_options(AnalyzerOptions::default())
    }

    pub fn with_options(options: AnalyzerOptions) -> Self {
        Self {
            symbols: SymbolTable::new(),
            errors: Vec::new(),
            options,
        }
    }

    /// Analyze a program.
    ///
    /// Pure per call: internal state is rebuilt on entry and the full
    /// accumulated error list is returned. Never fails.
    pub fn analyze(&mut self, statements: &[Stmt]) -> Vec<SemanticError> {
        self.symbols = SymbolTable::new();
        self.errors = Vec::new();

        log::debug!("analyzing {} top-level statements", statements.len());
        for stmt in statements {
            self.analyze_statement(stmt);
        }

        std::mem::take(&mut self.errors)
    }

    fn error(&mut self, token: Token, kind: SemanticErrorKind) {
        self.errors.push(SemanticError::new(token, kind));
    }

    // ==================== Statements ====================

    fn analyze_statement(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression { expression } => {
                self.analyze_expression(expression);
            }
            Stmt::Function(func) => self.analyze_function(func),
            Stmt::Return { keyword, value } => self.analyze_return(keyword, value.as_ref()),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.analyze_expression(condition);

                self.symbols.enter_scope();
                self.analyze_statement(then_branch);
                self.symbols.exit_scope();

                if let Some(else_branch) = else_branch {
                    self.symbols.enter_scope();
                    self.analyze_statement(else_branch);
                    self.symbols.exit_scope();
                }
            }
            Stmt::With { resource, body } => {
                self.analyze_expression(resource);

                self.symbols.enter_scope();
                for stmt in body {
                    self.analyze_statement(stmt);
                }
                self.symbols.exit_scope();
            }
            Stmt::For {
                target,
                iterator,
                filter,
                body,
            } => self.analyze_for(target, iterator, filter.as_ref(), body),
            Stmt::PatternMatch { scrutinee, cases } => self.analyze_match(scrutinee, cases),
            Stmt::Actor(actor) => self.analyze_actor(actor),
        }
    }

    fn analyze_function(&mut self, func: &FunctionDecl) {
        let name = func.name.lexeme.clone();
        let signature = self.function_signature(func);

        if !self.options.allow_function_redeclaration
            && self.symbols.function_declared_locally(&name)
        {
            self.error(
                func.name.clone(),
                SemanticErrorKind::DuplicateFunction(name.clone()),
            );
        }
        self.symbols.declare_function(&name, signature.clone());

        self.symbols.enter_scope();
        {
            let scope = self.symbols.current_mut();
            scope.in_async = func.is_async;
            scope.in_vectorized = false;
        }

        for generic in &func.generic_params {
            self.symbols.define_type_param(&generic.lexeme);
        }
        for (param, ty) in func.params.iter().zip(&signature.params) {
            self.symbols.define_variable(&param.name.lexeme, ty.clone());
        }

        self.apply_decorators(&func.decorators);

        for stmt in &func.body {
            self.analyze_statement(stmt);
        }
        self.symbols.exit_scope();
    }

    /// Build a function's static signature. Hints are threaded into the
    /// parameter types; anything unannotated is `Any`.
    fn function_signature(&self, func: &FunctionDecl) -> FunctionType {
        let params = func
            .params
            .iter()
            .map(|p| match &p.type_hint {
                Some(hint) => self.resolve_type(hint),
                None => Type::any(),
            })
            .collect();
        let ret = func
            .return_type
            .as_ref()
            .map(|t| self.resolve_type(t))
            .unwrap_or_else(Type::any);

        FunctionType {
            params,
            ret,
            is_async: func.is_async,
            generic_params: func
                .generic_params
                .iter()
                .map(|t| t.lexeme.clone())
                .collect(),
        }
    }

    fn apply_decorators(&mut self, decorators: &[Decorator]) {
        for decorator in decorators {
            match decorator.name.lexeme.as_str() {
                "vectorize" => self.symbols.current_mut().in_vectorized = true,
                "parallel" => {
                    if self.symbols.current().in_vectorized {
                        self.error(
                            decorator.name.clone(),
                            SemanticErrorKind::ConflictingDecorators,
                        );
                    }
                }
                _ => {}
            }
        }
    }

    fn analyze_return(&mut self, keyword: &Token, value: Option<&Expr>) {
        let value_ty = value.map(|v| self.analyze_expression(v));

        let scope = self.symbols.current();
        let needs_future = scope.in_async && !scope.in_actor;
        if needs_future {
            if let Some(ty) = value_ty {
                if !ty.is_future() && !ty.is_any() {
                    self.error(keyword.clone(), SemanticErrorKind::AsyncReturnNotFuture);
                }
            }
        }
    }

    fn analyze_for(
        &mut self,
        target: &Token,
        iterator: &Expr,
        filter: Option<&Expr>,
        body: &[Stmt],
    ) {
        let iter_ty = self.analyze_expression(iterator);
        if !iter_ty.is_any() && !iter_ty.is_iterable() {
            self.error(
                iterator.token(),
                SemanticErrorKind::NotIterable(iter_ty.to_string()),
            );
        }
        let element_ty = if iter_ty.is_any() {
            Type::any()
        } else {
            iter_ty.element_type()
        };

        self.symbols.enter_scope();
        self.symbols.current_mut().loop_depth += 1;
        self.symbols.define_variable(&target.lexeme, element_ty);

        if let Some(filter) = filter {
            let filter_ty = self.analyze_expression(filter);
            if !filter_ty.is_any() && filter_ty != Type::bool_() {
                self.error(
                    filter.token(),
                    SemanticErrorKind::NonBoolFilter(filter_ty.to_string()),
                );
            }
        }

        for stmt in body {
            self.analyze_statement(stmt);
        }
        self.symbols.exit_scope();
    }

    fn analyze_match(&mut self, scrutinee: &Expr, cases: &[PatternCase]) {
        let scrutinee_ty = self.analyze_expression(scrutinee);

        let mut seen: HashSet<String> = HashSet::new();
        let mut saw_wildcard = false;

        for case in cases {
            let key = pattern_key(&case.pattern);
            if key == "wildcard" {
                saw_wildcard = true;
            }
            if !seen.insert(key.clone()) {
                self.error(
                    case.pattern.token(),
                    SemanticErrorKind::DuplicatePattern(key),
                );
            }

            self.symbols.enter_scope();
            if let Some(binding) = &case.binding {
                let binding_ty = binding_type(&case.pattern, &scrutinee_ty);
                self.symbols.define_variable(&binding.lexeme, binding_ty);
            }
            if let Some(guard) = &case.guard {
                self.analyze_expression(guard);
            }
            for stmt in &case.body {
                self.analyze_statement(stmt);
            }
            self.symbols.exit_scope();
        }

        if !saw_wildcard {
            if let Some(domain) = pattern_domain(&scrutinee_ty) {
                let missing: Vec<&str> = domain
                    .iter()
                    .filter(|key| !seen.contains(**key))
                    .copied()
                    .collect();
                if !missing.is_empty() {
                    self.error(
                        scrutinee.token(),
                        SemanticErrorKind::NonExhaustiveMatch(missing.join(", ")),
                    );
                }
            }
        }
    }

    fn analyze_actor(&mut self, actor: &ActorDecl) {
        self.symbols.enter_scope();
        self.symbols.current_mut().in_actor = true;

        for stmt in &actor.state_vars {
            self.analyze_statement(stmt);
        }
        for method in &actor.methods {
            self.analyze_function(method);
        }

        self.symbols.exit_scope();
    }

    // ==================== Expressions ====================

    /// Analyze an expression and return its inferred type
    fn analyze_expression(&mut self, expr: &Expr) -> Type {
        match expr {
            Expr::Literal { value } => match value {
                Some(Literal::Int(_)) => Type::int(),
                Some(Literal::Float(_)) => Type::float(),
                Some(Literal::Str(_)) => Type::str_(),
                None => Type::any(),
            },
            Expr::Grouping { expression } => self.analyze_expression(expression),
            Expr::Variable { name } => self.analyze_variable(name),
            Expr::Unary { operator, right } => self.analyze_unary(operator, right),
            Expr::Binary {
                left,
                operator,
                right,
            } => self.analyze_binary(left, operator, right),
            Expr::Assign { name, value } => {
                // RHS first: the target is not visible to its own
                // initializer
                let value_ty = self.analyze_expression(value);
                self.symbols.define_variable(&name.lexeme, value_ty.clone());
                value_ty
            }
            Expr::MultiAssign { targets, values } => self.analyze_multi_assign(targets, values),
            Expr::TypeHint { name, ty, value } => self.analyze_type_hint(name, ty, value),
            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.analyze_call(callee, paren, arguments),
            Expr::GenericType { base, params } => self.analyze_bracket(base, params),
        }
    }

    fn analyze_variable(&mut self, name: &Token) -> Type {
        if let Some(ty) = self.symbols.lookup_variable(&name.lexeme) {
            return ty.clone();
        }
        // A function name used as a value; no first-class function type
        // exists yet
        if self.symbols.lookup_function(&name.lexeme).is_some() {
            return Type::any();
        }
        // Booleans are spelled True/False
        if matches!(name.lexeme.as_str(), "True" | "False") {
            return Type::bool_();
        }

        self.error(
            name.clone(),
            SemanticErrorKind::UndefinedVariable(name.lexeme.clone()),
        );
        Type::any()
    }

    fn analyze_unary(&mut self, operator: &Token, right: &Expr) -> Type {
        let right_ty = self.analyze_expression(right);

        if operator.kind == TokenKind::Not {
            return Type::bool_();
        }

        // Unary minus keeps the operand's type even when it is rejected
        if !right_ty.is_any() && !right_ty.is_numeric() {
            self.error(operator.clone(), SemanticErrorKind::NegationRequiresNumeric);
        }
        right_ty
    }

    fn analyze_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Type {
        let left_ty = self.analyze_expression(left);
        let right_ty = self.analyze_expression(right);

        match operator.kind {
            TokenKind::Plus | TokenKind::Minus | TokenKind::Star | TokenKind::Slash => {
                // `+` doubles as string concatenation
                if operator.kind == TokenKind::Plus
                    && (left_ty.name == "str" || right_ty.name == "str")
                {
                    return Type::str_();
                }

                let numeric_ok = |ty: &Type| ty.is_any() || ty.is_numeric();
                if !numeric_ok(&left_ty) || !numeric_ok(&right_ty) {
                    self.error(operator.clone(), SemanticErrorKind::NonNumericOperands);
                }

                if left_ty.name == "float" || right_ty.name == "float" {
                    Type::float()
                } else {
                    Type::int()
                }
            }
            TokenKind::And | TokenKind::Or | TokenKind::Xor => {
                // Rejection still yields int so enclosing expressions keep
                // a usable type
                let int_ok = |ty: &Type| ty.is_any() || ty.is_int();
                if !int_ok(&left_ty) || !int_ok(&right_ty) {
                    self.error(operator.clone(), SemanticErrorKind::BitwiseRequiresIntegers);
                }
                Type::int()
            }
            TokenKind::EqEq | TokenKind::Less | TokenKind::Greater => Type::bool_(),
            _ => Type::any(),
        }
    }

    fn analyze_multi_assign(&mut self, targets: &[Token], values: &[Expr]) -> Type {
        let value_types: Vec<Type> = values.iter().map(|v| self.analyze_expression(v)).collect();

        if targets.len() != values.len() {
            let anchor = targets.first().cloned().unwrap_or_else(Token::sentinel);
            self.error(
                anchor,
                SemanticErrorKind::MultiAssignMismatch {
                    targets: targets.len(),
                    values: values.len(),
                },
            );
        }

        for (i, target) in targets.iter().enumerate() {
            let ty = value_types.get(i).cloned().unwrap_or_else(Type::any);
            self.symbols.define_variable(&target.lexeme, ty);
        }

        Type::none()
    }

    fn analyze_type_hint(&mut self, name: &Token, ty: &Expr, value: &Expr) -> Type {
        let declared = self.resolve_type(ty);
        let value_ty = self.analyze_expression(value);

        if !declared.is_any() && !value_ty.is_any() && !value_ty.is_subtype_of(&declared) {
            self.error(
                name.clone(),
                SemanticErrorKind::TypeMismatch {
                    expected: declared.to_string(),
                    got: value_ty.to_string(),
                },
            );
        }

        // The declared type wins over the inferred one
        self.symbols.define_variable(&name.lexeme, declared.clone());
        declared
    }

    fn analyze_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Type {
        let arg_types: Vec<Type> = arguments
            .iter()
            .map(|a| self.analyze_expression(a))
            .collect();

        let Expr::Variable { name } = callee else {
            // The grammar only builds calls on bare identifiers; anything
            // else is rejected here rather than unwound
            let token = callee.token();
            let described = token.describe();
            self.error(token, SemanticErrorKind::NotCallable(described));
            return Type::none();
        };

        let Some(signature) = self.symbols.lookup_function(&name.lexeme).cloned() else {
            self.error(
                name.clone(),
                SemanticErrorKind::UndefinedFunction(name.lexeme.clone()),
            );
            return Type::none();
        };

        if signature.params.len() != arg_types.len() {
            self.error(
                paren.clone(),
                SemanticErrorKind::ArgCountMismatch {
                    expected: signature.params.len(),
                    got: arg_types.len(),
                },
            );
        }

        for (i, (expected, got)) in signature.params.iter().zip(&arg_types).enumerate() {
            if expected.is_any() || got.is_any() {
                continue;
            }
            // Generic parameters are constrained by substitution below,
            // not by the direct subtype check
            if signature
                .generic_params
                .iter()
                .any(|g| type_mentions(expected, g))
            {
                continue;
            }
            if !got.is_subtype_of(expected) {
                self.error(
                    arguments[i].token(),
                    SemanticErrorKind::ArgTypeMismatch {
                        name: name.lexeme.clone(),
                        index: i + 1,
                        expected: expected.to_string(),
                        got: got.to_string(),
                    },
                );
            }
        }

        if signature.is_async && !self.symbols.current().in_async {
            self.error(
                name.clone(),
                SemanticErrorKind::AsyncNotAwaited(name.lexeme.clone()),
            );
        }

        if signature.generic_params.is_empty() {
            signature.ret
        } else {
            let mut bindings = HashMap::new();
            for (param, arg) in signature.params.iter().zip(&arg_types) {
                unify_generic(param, arg, &signature.generic_params, &mut bindings);
            }
            substitute(&signature.ret, &bindings)
        }
    }

    /// Bracket application in value position: `items[0]` subscripts a
    /// container value, everything else reads as a type application
    fn analyze_bracket(&mut self, base: &Expr, params: &[Expr]) -> Type {
        if let Expr::Variable { name } = base {
            if let Some(var_ty) = self.symbols.lookup_variable(&name.lexeme).cloned() {
                for param in params {
                    self.analyze_expression(param);
                }
                return if var_ty.is_iterable() {
                    var_ty.element_type()
                } else {
                    Type::any()
                };
            }
        }

        let base_ty = self.resolve_type(base);
        Type::with_params(
            base_ty.name,
            params.iter().map(|p| self.resolve_type(p)).collect(),
        )
    }

    /// Resolve a type annotation expression. Unresolvable shapes degrade
    /// to `Any`.
    fn resolve_type(&self, expr: &Expr) -> Type {
        match expr {
            Expr::Variable { name } => {
                if let Some(ty) = self.symbols.lookup_type_param(&name.lexeme) {
                    ty.clone()
                } else {
                    Type::simple(name.lexeme.as_str())
                }
            }
            Expr::GenericType { base, params } => {
                let base_ty = self.resolve_type(base);
                Type::with_params(
                    base_ty.name,
                    params.iter().map(|p| self.resolve_type(p)).collect(),
                )
            }
            Expr::Grouping { expression } => self.resolve_type(expression),
            _ => Type::any(),
        }
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== Pattern Helpers ====================

/// Reduce a pattern to its exhaustiveness key.
///
/// Literals key as `literal:<value>`, identifier and call patterns as
/// `type:<name>`, and catch-alls as `wildcard`. `True`/`False` spell the
/// boolean literals, so they key into the `bool` domain.
fn pattern_key(pattern: &Expr) -> String {
    match pattern {
        Expr::Literal { value } => match value {
            Some(Literal::Int(v)) => format!("literal:{v}"),
            Some(Literal::Float(v)) => format!("literal:{v}"),
            Some(Literal::Str(v)) => format!("literal:{v}"),
            None => "wildcard".to_string(),
        },
        Expr::Variable { name } => match name.lexeme.as_str() {
            "_" => "wildcard".to_string(),
            "True" | "False" => format!("literal:{}", name.lexeme),
            other => format!("type:{other}"),
        },
        Expr::Call { callee, .. } => match callee.as_ref() {
            Expr::Variable { name } => format!("type:{}", name.lexeme),
            _ => "wildcard".to_string(),
        },
        _ => "wildcard".to_string(),
    }
}

/// Type given to a `case pattern as binding` name
fn binding_type(pattern: &Expr, scrutinee_ty: &Type) -> Type {
    match pattern {
        Expr::Call { callee, .. } => match callee.as_ref() {
            Expr::Variable { name } => Type::simple(name.lexeme.as_str()),
            _ => scrutinee_ty.clone(),
        },
        Expr::Variable { name } => match name.lexeme.as_str() {
            "True" | "False" => Type::bool_(),
            "_" => scrutinee_ty.clone(),
            other => Type::simple(other),
        },
        _ => scrutinee_ty.clone(),
    }
}

// ==================== Generic Substitution ====================

/// Record bindings for generic parameter names by structurally walking a
/// declared parameter type against the matching argument type
fn unify_generic(
    param: &Type,
    arg: &Type,
    generics: &[String],
    bindings: &mut HashMap<String, Type>,
) {
    if param.params.is_empty() && generics.contains(&param.name) {
        bindings
            .entry(param.name.clone())
            .or_insert_with(|| arg.clone());
        return;
    }
    for (p, a) in param.params.iter().zip(&arg.params) {
        unify_generic(p, a, generics, bindings);
    }
}

/// Replace bound generic parameter names in a type
fn substitute(ty: &Type, bindings: &HashMap<String, Type>) -> Type {
    if ty.params.is_empty() {
        if let Some(bound) = bindings.get(&ty.name) {
            return bound.clone();
        }
    }
    Type {
        name: ty.name.clone(),
        params: ty.params.iter().map(|p| substitute(p, bindings)).collect(),
    }
}

fn type_mentions(ty: &Type, name: &str) -> bool {
    ty.name == name || ty.params.iter().any(|p| type_mentions(p, name))
}
