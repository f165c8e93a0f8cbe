/// PHP parsing and declaration extraction.
///
/// This module parses PHP source text with the mago_syntax parser and
/// flattens the resulting AST into an ordered list of [`Declaration`]s.
///
/// Sub-modules:
/// - [`classes`]: Class, interface, trait, and enum member extraction
/// - [`functions`]: Top-level function and global variable extraction
/// - [`inference`]: Best-effort return/property type inference from bodies
mod classes;
mod functions;
mod inference;

use std::path::Path;

use mago_syntax::ast::*;

use crate::types::*;

/// Everything the extraction functions need besides the AST node itself.
///
/// Bundles the program's trivia (comments/whitespace) and the raw source
/// text so that docblocks can be looked up, plus the path stamped on every
/// declaration.
pub(crate) struct ScanCtx<'a> {
    pub trivias: &'a [Trivia<'a>],
    pub content: &'a str,
    pub path: &'a str,
}

impl ScanCtx<'_> {
    /// Look up the docblock directly in front of `node`.
    pub(crate) fn docblock_for(&self, node: &impl mago_span::HasSpan) -> Option<&str> {
        crate::docblock::get_docblock_text_for_node(self.trivias, self.content, node)
    }
}

/// Scan one file's source text into declarations, in source order.
///
/// Never fails: malformed source yields whatever the error-tolerant parser
/// could recover, and a parser panic yields an empty list.
pub fn scan(source: &str, path: &Path) -> Vec<Declaration> {
    let path_str = path.to_string_lossy();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let arena = bumpalo::Bump::new();
        let file_id = mago_database::file::FileId::new("input.php");
        let program = mago_syntax::parser::parse_file_content(&arena, file_id, source);

        let ctx = ScanCtx {
            trivias: program.trivia.as_slice(),
            content: source,
            path: &path_str,
        };

        let mut declarations = Vec::new();
        let mut globals = functions::GlobalVariables::default();
        extract_from_statements(program.statements.iter(), &ctx, &mut declarations, &mut globals);
        declarations
    }));

    match result {
        Ok(declarations) => declarations,
        Err(_) => {
            tracing::error!("phpintel: parser panicked while scanning {}", path_str);
            Vec::new()
        }
    }
}

/// Find the name of the class-like whose braces contain `offset`.
///
/// Used by the query path to give `$this`, `self` and `static` a concrete
/// class.  Returns `None` at top level or if the parser panics.
///
/// The buffer is usually mid-edit, so when the parser's recovery loses the
/// class body a brace-counting scan of the text is used instead.
pub fn enclosing_class(source: &str, offset: usize) -> Option<String> {
    let offset = crate::util::clamp_to_char_boundary(source, offset);
    let ast_offset = u32::try_from(offset).ok()?;
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let arena = bumpalo::Bump::new();
        let file_id = mago_database::file::FileId::new("input.php");
        let program = mago_syntax::parser::parse_file_content(&arena, file_id, source);
        find_enclosing_class(program.statements.iter(), ast_offset)
    }))
    .unwrap_or_else(|_| {
        tracing::error!("phpintel: parser panicked while locating the enclosing class");
        None
    })
    .or_else(|| enclosing_class_by_braces(&source[..offset]))
}

/// Track `{`/`}` nesting over `prefix`, remembering which braces open a
/// class-like body.  Strings and comments are not special-cased.
fn enclosing_class_by_braces(prefix: &str) -> Option<String> {
    let mut stack: Vec<Option<String>> = Vec::new();
    let mut pending: Option<String> = None;
    let mut expect_name = false;
    // `$this->class`, `Foo::class`, `$class` are not declarations.
    let mut after_access = false;

    let mut chars = prefix.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        if c.is_alphabetic() || c == '_' {
            let mut end = start + c.len_utf8();
            while let Some(&(i, n)) = chars.peek() {
                if !(n.is_alphanumeric() || n == '_') {
                    break;
                }
                end = i + n.len_utf8();
                chars.next();
            }
            let word = &prefix[start..end];
            if expect_name {
                pending = Some(word.to_string());
                expect_name = false;
            } else if !after_access && matches!(word, "class" | "interface" | "trait" | "enum") {
                expect_name = true;
            }
            after_access = false;
            continue;
        }
        if !c.is_whitespace() {
            after_access = matches!(c, '>' | ':' | '$');
        }
        match c {
            '{' => {
                stack.push(pending.take());
                expect_name = false;
            }
            '}' => {
                stack.pop();
            }
            // `Foo::class`, `new class(...)`: no name follows.
            ';' | '(' | ')' | ',' | ':' => {
                expect_name = false;
            }
            _ => {}
        }
    }

    stack.into_iter().rev().flatten().next()
}

fn find_enclosing_class<'a>(
    statements: impl Iterator<Item = &'a Statement<'a>>,
    offset: u32,
) -> Option<String> {
    for statement in statements {
        let (name, start, end) = match statement {
            Statement::Class(class) => (
                class.name.value,
                class.left_brace.start.offset,
                class.right_brace.end.offset,
            ),
            Statement::Interface(iface) => (
                iface.name.value,
                iface.left_brace.start.offset,
                iface.right_brace.end.offset,
            ),
            Statement::Trait(trait_def) => (
                trait_def.name.value,
                trait_def.left_brace.start.offset,
                trait_def.right_brace.end.offset,
            ),
            Statement::Enum(enum_def) => (
                enum_def.name.value,
                enum_def.left_brace.start.offset,
                enum_def.right_brace.end.offset,
            ),
            Statement::Namespace(namespace) => {
                if let Some(name) = find_enclosing_class(namespace.statements().iter(), offset) {
                    return Some(name);
                }
                continue;
            }
            _ => continue,
        };
        if offset >= start && offset <= end {
            return Some(name.to_string());
        }
    }
    None
}

/// Walk statements in order, dispatching class-likes to [`classes`] and
/// everything else to [`functions`].
///
/// Recurses into namespaces, `{ ... }` blocks and `if` bodies (the common
/// `if (!function_exists('x')) { function x() {} }` guard).
pub(crate) fn extract_from_statements<'a>(
    statements: impl Iterator<Item = &'a Statement<'a>>,
    ctx: &ScanCtx<'_>,
    out: &mut Vec<Declaration>,
    globals: &mut functions::GlobalVariables,
) {
    for statement in statements {
        match statement {
            Statement::Class(class) => {
                classes::extract_class_like(
                    class.name.value,
                    class.members.iter(),
                    ctx,
                    out,
                );
            }
            Statement::Interface(iface) => {
                classes::extract_class_like(iface.name.value, iface.members.iter(), ctx, out);
            }
            Statement::Trait(trait_def) => {
                classes::extract_class_like(
                    trait_def.name.value,
                    trait_def.members.iter(),
                    ctx,
                    out,
                );
            }
            Statement::Enum(enum_def) => {
                classes::extract_class_like(
                    enum_def.name.value,
                    enum_def.members.iter(),
                    ctx,
                    out,
                );
            }
            Statement::Function(func) => {
                out.push(functions::extract_function(func, ctx));
            }
            Statement::Expression(expr_stmt) => {
                functions::extract_global_assignment(statement, expr_stmt.expression, ctx, out, globals);
            }
            Statement::Namespace(namespace) => {
                extract_from_statements(namespace.statements().iter(), ctx, out, globals);
            }
            Statement::Block(block) => {
                extract_from_statements(block.statements.iter(), ctx, out, globals);
            }
            Statement::If(if_stmt) => match &if_stmt.body {
                IfBody::Statement(body) => {
                    extract_from_statements(std::iter::once(body.statement), ctx, out, globals);
                    for else_if in body.else_if_clauses.iter() {
                        extract_from_statements(
                            std::iter::once(else_if.statement),
                            ctx,
                            out,
                            globals,
                        );
                    }
                    if let Some(else_clause) = &body.else_clause {
                        extract_from_statements(
                            std::iter::once(else_clause.statement),
                            ctx,
                            out,
                            globals,
                        );
                    }
                }
                IfBody::ColonDelimited(body) => {
                    extract_from_statements(body.statements.iter(), ctx, out, globals);
                    for else_if in body.else_if_clauses.iter() {
                        extract_from_statements(else_if.statements.iter(), ctx, out, globals);
                    }
                    if let Some(else_clause) = &body.else_clause {
                        extract_from_statements(else_clause.statements.iter(), ctx, out, globals);
                    }
                }
            },
            _ => {}
        }
    }
}

/// Extract a string representation of a type hint from the AST.
pub(crate) fn extract_hint_string(hint: &Hint) -> String {
    match hint {
        Hint::Identifier(ident) => ident.value().to_string(),
        Hint::Nullable(nullable) => {
            format!("?{}", extract_hint_string(nullable.hint))
        }
        Hint::Union(union) => {
            let left = extract_hint_string(union.left);
            let right = extract_hint_string(union.right);
            format!("{}|{}", left, right)
        }
        Hint::Intersection(intersection) => {
            let left = extract_hint_string(intersection.left);
            let right = extract_hint_string(intersection.right);
            format!("{}&{}", left, right)
        }
        Hint::Void(ident)
        | Hint::Never(ident)
        | Hint::Float(ident)
        | Hint::Bool(ident)
        | Hint::Integer(ident)
        | Hint::String(ident)
        | Hint::Object(ident)
        | Hint::Mixed(ident)
        | Hint::Iterable(ident) => ident.value.to_string(),
        Hint::Null(keyword)
        | Hint::True(keyword)
        | Hint::False(keyword)
        | Hint::Array(keyword)
        | Hint::Callable(keyword)
        | Hint::Static(keyword)
        | Hint::Self_(keyword)
        | Hint::Parent(keyword) => keyword.value.to_string(),
        Hint::Parenthesized(paren) => {
            format!("({})", extract_hint_string(paren.hint))
        }
    }
}

/// Extract visibility from a set of modifiers.
/// Defaults to `Public` if no visibility modifier is present.
pub(crate) fn extract_visibility<'a>(
    modifiers: impl Iterator<Item = &'a Modifier<'a>>,
) -> Visibility {
    for m in modifiers {
        if m.is_private() {
            return Visibility::Private;
        }
        if m.is_protected() {
            return Visibility::Protected;
        }
        if m.is_public() {
            return Visibility::Public;
        }
    }
    Visibility::Public
}

/// Extract `(name, type)` pairs from a parameter list.
///
/// A parameter without a native hint takes its type from the `@param` tag
/// of `docblock`, if any.
pub(crate) fn extract_parameters(
    parameter_list: &FunctionLikeParameterList,
    docblock: Option<&str>,
) -> Vec<Parameter> {
    parameter_list
        .parameters
        .iter()
        .map(|param| {
            let name = param.variable.name.to_string();
            let type_hint = match param.hint.as_ref() {
                Some(hint) => extract_hint_string(hint),
                None => docblock
                    .and_then(|doc| crate::docblock::extract_param_type(doc, &name))
                    .unwrap_or_default(),
            };
            Parameter { name, type_hint }
        })
        .collect()
}

/// Normalise a type string so it can be compared against indexed class
/// names.
///
/// - `?Foo` → `Foo`
/// - `\App\Models\User` → `User`
/// - `self`, `static`, `$this` → `class_name` (when one is given)
///
/// Union and intersection types are returned unchanged.
pub(crate) fn normalize_type(raw: &str, class_name: Option<&str>) -> String {
    let trimmed = raw.trim();
    if trimmed.contains(['|', '&', '(']) {
        return trimmed.to_string();
    }
    let stripped = trimmed.strip_prefix('?').unwrap_or(trimmed);
    let stripped = stripped.strip_prefix('\\').unwrap_or(stripped);

    if let Some(class_name) = class_name
        && (stripped.eq_ignore_ascii_case("self")
            || stripped.eq_ignore_ascii_case("static")
            || stripped == "$this")
    {
        return class_name.to_string();
    }

    stripped.rsplit('\\').next().unwrap_or(stripped).to_string()
}
