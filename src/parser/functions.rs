/// Top-level function and global variable extraction.
///
/// Standalone `function` declarations become `function` declarations in
/// the [`GLOBAL_SCOPE`]; plain assignments at the top level
/// (`$db = new Connection();`) become `variable` declarations there.
use std::collections::HashMap;

use mago_syntax::ast::*;

use crate::docblock;
use crate::types::*;

use super::inference;
use super::{ScanCtx, extract_hint_string, extract_parameters, normalize_type};

/// Global variables already emitted for the current file, mapped to their
/// position in the output so a later typed assignment can fill in the type.
#[derive(Default)]
pub(crate) struct GlobalVariables {
    positions: HashMap<String, usize>,
}

/// Build the declaration for a standalone function.
pub(crate) fn extract_function(func: &Function<'_>, ctx: &ScanCtx<'_>) -> Declaration {
    let doc = ctx.docblock_for(func);
    let native = func
        .return_type_hint
        .as_ref()
        .map(|rth| extract_hint_string(&rth.hint));
    let returns = native
        .or_else(|| doc.and_then(docblock::extract_return_type))
        .or_else(|| inference::infer_return_type(func.body.statements.iter(), None))
        .map(|ty| normalize_type(&ty, None))
        .unwrap_or_default();

    Declaration {
        class: GLOBAL_SCOPE.to_string(),
        name: func.name.value.to_string(),
        kind: Kind::Function,
        visibility: Visibility::Public,
        is_static: false,
        args: extract_parameters(&func.parameter_list, doc),
        returns,
        path: ctx.path.to_string(),
    }
}

/// Record a top-level `$name = ...;` assignment as a global variable.
///
/// The type comes from an inline `/** @var Type */` docblock on the
/// statement, else from a `new ClassName()` right-hand side.  Each name is
/// emitted once, at its first assignment.
pub(crate) fn extract_global_assignment(
    statement: &Statement<'_>,
    expression: &Expression<'_>,
    ctx: &ScanCtx<'_>,
    out: &mut Vec<Declaration>,
    globals: &mut GlobalVariables,
) {
    let Expression::Assignment(assignment) = expression else {
        return;
    };
    let Expression::Variable(Variable::Direct(dv)) = assignment.lhs else {
        return;
    };
    if dv.name == "$this" {
        return;
    }

    let returns = ctx
        .docblock_for(statement)
        .and_then(docblock::extract_var_type)
        .map(|ty| normalize_type(&ty, None))
        .or_else(|| inference::instantiated_class(assignment.rhs, None))
        .unwrap_or_default();

    if let Some(&idx) = globals.positions.get(dv.name) {
        if let Some(existing) = out.get_mut(idx)
            && existing.returns.is_empty()
        {
            existing.returns = returns;
        }
        return;
    }

    globals.positions.insert(dv.name.to_string(), out.len());
    out.push(Declaration {
        returns,
        path: ctx.path.to_string(),
        ..Declaration::new(GLOBAL_SCOPE, dv.name, Kind::Variable)
    });
}
