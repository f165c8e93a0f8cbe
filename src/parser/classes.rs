/// Class, interface, trait, and enum member extraction.
///
/// Every class-like is flattened into member declarations keyed by the
/// class-like's short name:
///
/// - methods become `function` declarations,
/// - properties become `variable` declarations named `$prop`,
/// - constructor-promoted parameters become `variable` declarations
///   emitted right before the `__construct` declaration.
///
/// Class constants and enum cases are not indexed.
use std::collections::HashMap;

use mago_syntax::ast::*;

use crate::docblock;
use crate::types::*;

use super::inference;
use super::{ScanCtx, extract_hint_string, extract_parameters, extract_visibility, normalize_type};

/// Extract the members of one class-like declaration into `out`.
pub(crate) fn extract_class_like<'a>(
    class_name: &str,
    members: impl Iterator<Item = &'a ClassLikeMember<'a>>,
    ctx: &ScanCtx<'_>,
    out: &mut Vec<Declaration>,
) {
    let members: Vec<&ClassLikeMember> = members.collect();

    // Untyped properties can pick up a type from `$this->prop = new Foo()`
    // anywhere in the class, so look at every method body up front.
    let mut instantiations = HashMap::new();
    for &member in &members {
        if let ClassLikeMember::Method(method) = member
            && let MethodBody::Concrete(block) = &method.body
        {
            inference::collect_property_instantiations(
                block.statements.iter(),
                class_name,
                &mut instantiations,
            );
        }
    }

    for &member in &members {
        match member {
            ClassLikeMember::Property(property) => {
                let is_static = property.modifiers().iter().any(|m| m.is_static());
                let visibility = extract_visibility(property.modifiers().iter());
                let native = property.hint().map(|h| extract_hint_string(h));
                let doc_type = ctx.docblock_for(member).and_then(docblock::extract_var_type);

                for var in property.variables().iter() {
                    let name = var.name.to_string();
                    let bare = name.strip_prefix('$').unwrap_or(&name);
                    let returns = native
                        .clone()
                        .or_else(|| doc_type.clone())
                        .or_else(|| instantiations.get(bare).cloned())
                        .map(|ty| normalize_type(&ty, Some(class_name)))
                        .unwrap_or_default();

                    out.push(Declaration {
                        class: class_name.to_string(),
                        name,
                        kind: Kind::Variable,
                        visibility,
                        is_static,
                        args: Vec::new(),
                        returns,
                        path: ctx.path.to_string(),
                    });
                }
            }
            ClassLikeMember::Method(method) => {
                let name = method.name.value.to_string();
                let doc = ctx.docblock_for(method);

                if name.eq_ignore_ascii_case("__construct") {
                    extract_promoted_properties(method, doc, class_name, ctx, out);
                }

                let native = method
                    .return_type_hint
                    .as_ref()
                    .map(|rth| extract_hint_string(&rth.hint));
                let returns = native
                    .or_else(|| doc.and_then(docblock::extract_return_type))
                    .or_else(|| match &method.body {
                        MethodBody::Concrete(block) => {
                            inference::infer_return_type(block.statements.iter(), Some(class_name))
                        }
                        _ => None,
                    })
                    .map(|ty| normalize_type(&ty, Some(class_name)))
                    .unwrap_or_default();

                out.push(Declaration {
                    class: class_name.to_string(),
                    name,
                    kind: Kind::Function,
                    visibility: extract_visibility(method.modifiers.iter()),
                    is_static: method.modifiers.iter().any(|m| m.is_static()),
                    args: extract_parameters(&method.parameter_list, doc),
                    returns,
                    path: ctx.path.to_string(),
                });
            }
            _ => {}
        }
    }
}

/// A promoted property is a constructor parameter with a visibility
/// modifier (e.g. `public function __construct(private Logger $logger)`).
fn extract_promoted_properties(
    method: &Method<'_>,
    doc: Option<&str>,
    class_name: &str,
    ctx: &ScanCtx<'_>,
    out: &mut Vec<Declaration>,
) {
    for param in method.parameter_list.parameters.iter() {
        if !param.is_promoted_property() {
            continue;
        }
        let name = param.variable.name.to_string();
        let returns = param
            .hint
            .as_ref()
            .map(|h| extract_hint_string(h))
            .or_else(|| doc.and_then(|d| docblock::extract_param_type(d, &name)))
            .map(|ty| normalize_type(&ty, Some(class_name)))
            .unwrap_or_default();

        out.push(Declaration {
            class: class_name.to_string(),
            name,
            kind: Kind::Variable,
            visibility: extract_visibility(param.modifiers.iter()),
            is_static: false,
            args: Vec::new(),
            returns,
            path: ctx.path.to_string(),
        });
    }
}
