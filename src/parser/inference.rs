/// Best-effort type inference from function and method bodies.
///
/// Nothing here is sound.  It recognises the handful of shapes that carry
/// most of the value for member completion:
///
/// | Source                              | Inferred type      |
/// |-------------------------------------|--------------------|
/// | `return $this;`                     | enclosing class    |
/// | `return new Foo(...);`              | `Foo`              |
/// | `return new self;` / `new static`   | enclosing class    |
/// | `$this->prop = new Foo(...);`       | `Foo` for `$prop`  |
///
/// Closures, arrow functions and nested declarations are not entered.
use std::collections::HashMap;

use mago_syntax::ast::*;

use super::normalize_type;

/// Infer a function's return type from its `return` statements.
///
/// Every `return` must agree on one type; a bare `return;` or any
/// unrecognised value gives up.
pub(crate) fn infer_return_type<'a>(
    statements: impl Iterator<Item = &'a Statement<'a>>,
    class_name: Option<&str>,
) -> Option<String> {
    let mut values: Vec<Option<&'a Expression<'a>>> = Vec::new();
    walk_statements(statements, &mut |stmt| {
        if let Statement::Return(ret) = stmt {
            values.push(ret.value);
        }
    });

    let mut inferred: Option<String> = None;
    for value in values {
        let ty = returned_type(value?, class_name)?;
        match &inferred {
            Some(prev) if *prev != ty => return None,
            Some(_) => {}
            None => inferred = Some(ty),
        }
    }
    inferred
}

/// Collect `$this->prop = new Foo()` assignments into `prop → Foo`.
///
/// The first assignment seen for a property wins.
pub(crate) fn collect_property_instantiations<'a>(
    statements: impl Iterator<Item = &'a Statement<'a>>,
    class_name: &str,
    out: &mut HashMap<String, String>,
) {
    walk_statements(statements, &mut |stmt| {
        let Statement::Expression(expr_stmt) = stmt else {
            return;
        };
        let Expression::Assignment(assignment) = expr_stmt.expression else {
            return;
        };
        let Expression::Access(Access::Property(pa)) = assignment.lhs else {
            return;
        };
        let Expression::Variable(Variable::Direct(dv)) = pa.object else {
            return;
        };
        if dv.name != "$this" {
            return;
        }
        if let ClassLikeMemberSelector::Identifier(ident) = &pa.property
            && let Some(ty) = instantiated_class(assignment.rhs, Some(class_name))
        {
            out.entry(ident.value.to_string()).or_insert(ty);
        }
    });
}

/// The class created by a `new` expression, if `expr` is one.
pub(crate) fn instantiated_class(expr: &Expression<'_>, class_name: Option<&str>) -> Option<String> {
    match expr {
        Expression::Instantiation(inst) => match inst.class {
            Expression::Identifier(ident) => Some(normalize_type(ident.value(), class_name)),
            Expression::Self_(_) | Expression::Static(_) => class_name.map(str::to_string),
            _ => None,
        },
        Expression::Parenthesized(p) => instantiated_class(p.expression, class_name),
        _ => None,
    }
}

fn returned_type(expr: &Expression<'_>, class_name: Option<&str>) -> Option<String> {
    match expr {
        Expression::Variable(Variable::Direct(dv)) if dv.name == "$this" => {
            class_name.map(str::to_string)
        }
        Expression::Parenthesized(p) => returned_type(p.expression, class_name),
        _ => instantiated_class(expr, class_name),
    }
}

/// Visit every statement reachable from `statements` without crossing into
/// a new function scope.
fn walk_statements<'a, F>(statements: impl Iterator<Item = &'a Statement<'a>>, visit: &mut F)
where
    F: FnMut(&'a Statement<'a>),
{
    for stmt in statements {
        visit(stmt);

        match stmt {
            Statement::Block(block) => {
                walk_statements(block.statements.iter(), visit);
            }
            Statement::If(if_stmt) => match &if_stmt.body {
                IfBody::Statement(body) => {
                    walk_statement(body.statement, visit);
                    for else_if in body.else_if_clauses.iter() {
                        walk_statement(else_if.statement, visit);
                    }
                    if let Some(else_clause) = &body.else_clause {
                        walk_statement(else_clause.statement, visit);
                    }
                }
                IfBody::ColonDelimited(body) => {
                    walk_statements(body.statements.iter(), visit);
                    for else_if in body.else_if_clauses.iter() {
                        walk_statements(else_if.statements.iter(), visit);
                    }
                    if let Some(else_clause) = &body.else_clause {
                        walk_statements(else_clause.statements.iter(), visit);
                    }
                }
            },
            Statement::Foreach(foreach) => {
                for inner in foreach.body.statements() {
                    walk_statement(inner, visit);
                }
            }
            Statement::For(for_stmt) => match &for_stmt.body {
                ForBody::Statement(inner) => {
                    walk_statement(inner, visit);
                }
                ForBody::ColonDelimited(body) => {
                    walk_statements(body.statements.iter(), visit);
                }
            },
            Statement::While(while_stmt) => match &while_stmt.body {
                WhileBody::Statement(inner) => {
                    walk_statement(inner, visit);
                }
                WhileBody::ColonDelimited(body) => {
                    walk_statements(body.statements.iter(), visit);
                }
            },
            Statement::DoWhile(dw) => {
                walk_statement(dw.statement, visit);
            }
            Statement::Try(try_stmt) => {
                walk_statements(try_stmt.block.statements.iter(), visit);
                for catch in try_stmt.catch_clauses.iter() {
                    walk_statements(catch.block.statements.iter(), visit);
                }
                if let Some(finally) = &try_stmt.finally_clause {
                    walk_statements(finally.block.statements.iter(), visit);
                }
            }
            Statement::Switch(switch) => match &switch.body {
                SwitchBody::BraceDelimited(body) => {
                    for case in body.cases.iter() {
                        walk_statements(case.statements().iter(), visit);
                    }
                }
                SwitchBody::ColonDelimited(body) => {
                    for case in body.cases.iter() {
                        walk_statements(case.statements().iter(), visit);
                    }
                }
            },
            _ => {}
        }
    }
}

fn walk_statement<'a, F>(stmt: &'a Statement<'a>, visit: &mut F)
where
    F: FnMut(&'a Statement<'a>),
{
    walk_statements(std::iter::once(stmt), visit);
}
