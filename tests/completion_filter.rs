use phpintel::completion::builder::filter;
use phpintel::{
    AccessOperator, Candidate, Declaration, GLOBAL_SCOPE, Kind, Parameter, SymbolIndex, Visibility,
    complete,
};

fn decl(class: &str, name: &str, kind: Kind, visibility: Visibility, is_static: bool) -> Declaration {
    Declaration {
        visibility,
        is_static,
        path: "/p/Foo.php".to_string(),
        ..Declaration::new(class, name, kind)
    }
}

fn names(candidates: &[Candidate]) -> Vec<&str> {
    candidates.iter().map(|c| c.name.as_str()).collect()
}

// ─── Visibility / static policy ─────────────────────────────────────────────

#[test]
fn test_filter_arrow_outside_class_shows_public_only() {
    let index = SymbolIndex::new(vec![
        decl("Foo", "getName", Kind::Function, Visibility::Public, false),
        decl("Foo", "getSecret", Kind::Function, Visibility::Private, false),
    ]);
    let result = filter(&index, "Foo", "get", AccessOperator::Arrow, false);
    assert_eq!(names(&result), vec!["getName"]);
}

#[test]
fn test_filter_double_colon_shows_public_static_only() {
    let index = SymbolIndex::new(vec![
        decl("Foo", "create", Kind::Function, Visibility::Public, true),
        decl("Foo", "createInstance", Kind::Function, Visibility::Public, false),
        decl("Foo", "createHidden", Kind::Function, Visibility::Protected, true),
    ]);
    let result = filter(&index, "Foo", "create", AccessOperator::DoubleColon, false);
    assert_eq!(names(&result), vec!["create"]);
}

#[test]
fn test_filter_self_context_shows_every_instance_member() {
    let index = SymbolIndex::new(vec![
        decl("Foo", "$a", Kind::Variable, Visibility::Public, false),
        decl("Foo", "$b", Kind::Variable, Visibility::Protected, false),
        decl("Foo", "$c", Kind::Variable, Visibility::Private, false),
        decl("Foo", "$d", Kind::Variable, Visibility::Private, true),
    ]);
    let result = filter(&index, "Foo", "", AccessOperator::Arrow, true);
    assert_eq!(names(&result), vec!["a", "b", "c"]);
}

#[test]
fn test_filter_other_class_members_are_excluded() {
    let index = SymbolIndex::new(vec![
        decl("Foo", "run", Kind::Function, Visibility::Public, false),
        decl("Bar", "run", Kind::Function, Visibility::Public, false),
        decl("Bar", "rerun", Kind::Function, Visibility::Public, false),
    ]);
    let result = filter(&index, "Foo", "", AccessOperator::Arrow, false);
    assert_eq!(result.len(), 1);
}

// ─── Name matching ──────────────────────────────────────────────────────────

#[test]
fn test_filter_prefix_is_case_sensitive() {
    let index = SymbolIndex::new(vec![decl("Foo", "getName", Kind::Function, Visibility::Public, false)]);
    assert!(filter(&index, "Foo", "Get", AccessOperator::Arrow, false).is_empty());
    assert_eq!(filter(&index, "Foo", "getN", AccessOperator::Arrow, false).len(), 1);
}

#[test]
fn test_filter_sigil_partial_matches_variables_only() {
    let index = SymbolIndex::new(vec![
        decl(GLOBAL_SCOPE, "$config", Kind::Variable, Visibility::Public, false),
        decl(GLOBAL_SCOPE, "config", Kind::Function, Visibility::Public, false),
    ]);
    let with_sigil = filter(&index, GLOBAL_SCOPE, "$con", AccessOperator::Other, false);
    assert_eq!(with_sigil.len(), 1);
    assert_eq!(with_sigil[0].kind, Kind::Variable);

    let without = filter(&index, GLOBAL_SCOPE, "con", AccessOperator::Other, false);
    assert_eq!(without.len(), 2);
}

// ─── Candidate shape ────────────────────────────────────────────────────────

#[test]
fn test_candidate_variable_label_and_snippet() {
    let mut d = decl("Foo", "$profile", Kind::Variable, Visibility::Public, false);
    d.returns = "Profile".to_string();
    let index = SymbolIndex::new(vec![d]);

    let result = filter(&index, "Foo", "pro", AccessOperator::Arrow, false);
    assert_eq!(result[0].label(), "profile\tProfile");
    assert_eq!(result[0].snippet, "profile");
}

#[test]
fn test_candidate_function_snippet_has_numbered_placeholders() {
    let mut d = decl("Foo", "updateText", Kind::Function, Visibility::Public, false);
    d.args = vec![Parameter::new("$text", "string"), Parameter::new("$frogs", "")];
    d.returns = "void".to_string();
    let index = SymbolIndex::new(vec![d]);

    let result = filter(&index, "Foo", "up", AccessOperator::Arrow, false);
    assert_eq!(result[0].label(), "updateText\tvoid");
    assert_eq!(result[0].snippet, "updateText(${1:\\$text}, ${2:\\$frogs})");
}

#[test]
fn test_candidate_function_without_args() {
    let index = SymbolIndex::new(vec![decl("Foo", "save", Kind::Function, Visibility::Public, false)]);
    let result = filter(&index, "Foo", "", AccessOperator::Arrow, false);
    assert_eq!(result[0].snippet, "save()");
    assert_eq!(result[0].label(), "save\t");
}

#[test]
fn test_filter_deduplicates_and_sorts_by_label() {
    let mut dup_a = decl("Foo", "zeta", Kind::Function, Visibility::Public, false);
    dup_a.path = "/p/a.php".to_string();
    let mut dup_b = dup_a.clone();
    dup_b.path = "/p/b.php".to_string();
    let index = SymbolIndex::new(vec![
        dup_a,
        decl("Foo", "beta", Kind::Function, Visibility::Public, false),
        dup_b,
        decl("Foo", "alpha", Kind::Function, Visibility::Public, false),
    ]);

    let result = filter(&index, "Foo", "", AccessOperator::Arrow, false);
    assert_eq!(names(&result), vec!["alpha", "beta", "zeta"]);
}

#[test]
fn test_filter_empty_index_returns_nothing() {
    let index = SymbolIndex::default();
    assert!(filter(&index, "Foo", "", AccessOperator::Arrow, false).is_empty());
}

// ─── Context + resolution + filter ──────────────────────────────────────────

fn project_index() -> SymbolIndex {
    let php = concat!(
        "<?php\n",
        "class User {\n",
        "    public Profile $profile;\n",
        "    private $password;\n",
        "    public function getName(): string {}\n",
        "    private function hash() {}\n",
        "    public static function find(int $id): User {}\n",
        "}\n",
        "class Profile {\n",
        "    public function avatarUrl(): string {}\n",
        "}\n",
        "$currentUser = new User();\n",
        "function user_path(string $p): string {}\n",
    );
    SymbolIndex::new(phpintel::parser::scan(php, std::path::Path::new("/p/User.php")))
}

#[test]
fn test_complete_this_inside_class_sees_private_members() {
    let buffer = "<?php\nclass User {\n    public function check() {\n        $this->\n    }\n}\n";
    let offset = buffer.find("$this->").unwrap() + 7;
    let result = complete(buffer, offset, &project_index());

    let got = names(&result);
    assert!(got.contains(&"password"), "got {:?}", got);
    assert!(got.contains(&"hash"), "got {:?}", got);
    assert!(!got.contains(&"find"), "static method must not appear after ->");
}

#[test]
fn test_complete_static_access() {
    let buffer = "<?php\nUser::f";
    let result = complete(buffer, buffer.len(), &project_index());
    assert_eq!(names(&result), vec!["find"]);
    assert_eq!(result[0].snippet, "find(${1:\\$id})");
}

#[test]
fn test_complete_through_static_call_chain() {
    let buffer = "<?php\nUser::find(1)->profile->av";
    let result = complete(buffer, buffer.len(), &project_index());
    assert_eq!(names(&result), vec!["avatarUrl"]);
}

#[test]
fn test_complete_typed_global_variable() {
    let buffer = "<?php\n$currentUser->get";
    let result = complete(buffer, buffer.len(), &project_index());
    assert_eq!(names(&result), vec!["getName"]);
}

#[test]
fn test_complete_global_functions_and_variables() {
    let buffer = "<?php\necho user_";
    let result = complete(buffer, buffer.len(), &project_index());
    assert_eq!(names(&result), vec!["user_path"]);

    let buffer = "<?php\necho $curr";
    let result = complete(buffer, buffer.len(), &project_index());
    assert_eq!(names(&result), vec!["currentUser"]);
}

#[test]
fn test_complete_untracked_variable_offers_nothing() {
    let buffer = "<?php\n$unknown->get";
    assert!(complete(buffer, buffer.len(), &project_index()).is_empty());
}

#[test]
fn test_complete_empty_index_offers_nothing() {
    let buffer = "<?php\nUser::";
    assert!(complete(buffer, buffer.len(), &SymbolIndex::default()).is_empty());
}
