/// Completion-related modules.
///
/// This sub-module groups all completion logic:
/// - **resolver**: Walking a context chain through the index to a class and partial name
/// - **builder**: Filtering declarations into candidates and LSP `CompletionItem`s
/// - **handler**: The query entry point tying context, resolver, and builder together
pub mod builder;
pub mod handler;
pub mod resolver;
