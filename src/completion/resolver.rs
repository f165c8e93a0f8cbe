/// Context chain resolution.
///
/// Turns a context chain such as `["$this", "repo", "find", "na"]` into the
/// class whose members should be offered plus the partial name being typed,
/// by looking each intermediate segment up in the [`SymbolIndex`] and
/// continuing from its `returns` type.
///
/// Resolution is an explicit loop bounded by [`MAX_RESOLUTION_DEPTH`]; the
/// last chain element is the partial and is never looked up.
use crate::index::SymbolIndex;
use crate::types::{GLOBAL_SCOPE, ResolvedTarget};

/// Upper bound on member lookups for one chain.
pub const MAX_RESOLUTION_DEPTH: usize = 16;

/// Resolve `chain` against `index`.
///
/// - `[]` → `None`
/// - `[x]` → `(x, "")` when `x` is an indexed class, else `(GLOBAL, x)`
/// - `[head, next, ...]` → follow `next`'s `returns` while members are
///   found; on the first miss stop with `(current class, next)`
///
/// On a miss the literal head stays the class, so an untracked `$var->par`
/// resolves to `("$var", "par")`.
pub fn resolve(chain: &[String], index: &SymbolIndex) -> Option<ResolvedTarget> {
    let (head, mut rest) = chain.split_first()?;

    if rest.is_empty() {
        return Some(if index.has_class(head) {
            ResolvedTarget::new(head.as_str(), "")
        } else {
            ResolvedTarget::new(GLOBAL_SCOPE, head.as_str())
        });
    }

    let mut class = head.clone();

    // `$db->` where `$db = new Connection()` at the top level.
    if class.starts_with('$')
        && !index.has_class(&class)
        && let Some(ty) = index.global_variable_type(&class)
    {
        class = ty.to_string();
    }

    for _ in 0..MAX_RESOLUTION_DEPTH {
        let (next, tail) = rest.split_first()?;
        if tail.is_empty() {
            return Some(ResolvedTarget::new(class, next.as_str()));
        }

        match index.find_member(&class, next) {
            Some(member) if !member.returns.is_empty() => {
                class = member.returns.clone();
                rest = tail;
            }
            // The member exists but its type is unknown: nothing to offer.
            Some(_) => return None,
            None => return Some(ResolvedTarget::new(class, next.as_str())),
        }
    }

    tracing::debug!(
        "phpintel: chain of {} segments exceeds resolution depth",
        chain.len()
    );
    None
}
