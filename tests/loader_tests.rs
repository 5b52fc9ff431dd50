//! Integration tests for importing snippet documents

use pretty_assertions::assert_eq;
use snippet_press::{
    EngineConfig, LoadError, ResourceKind, ResourceRef, SnippetEngine, SnippetKey, WarningKind,
};

const MENU: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- site menu -->
<ps:pagesnippets xmlns:ps="https://github.com/suppenhuhn79/pagesnippets">
    <ps:stylesheet src="css/menu.css"/>
    <ps:script src="js/menu.js"/>
    <ps:snippet-group name="menu">
        <ps:snippet name="bar"><nav/></ps:snippet>
        <ps:snippet name="item"><a/></ps:snippet>
        <ps:snippet-group name="sub">
            <ps:snippet name="entry"><li/></ps:snippet>
        </ps:snippet-group>
    </ps:snippet-group>
    <ps:snippet name="page"><main/></ps:snippet>
</ps:pagesnippets>"#;

#[test]
fn test_import_reports_snippets_and_resources() {
    let mut engine = SnippetEngine::new();
    let mut host: Vec<ResourceRef> = Vec::new();
    let report = engine
        .import_str("site/templates/menu.xml", MENU, &mut host)
        .expect("Should import");

    assert!(!report.skipped);
    assert!(report.warnings.is_empty());
    assert_eq!(
        report.snippets,
        vec![
            SnippetKey::new("/menu/bar"),
            SnippetKey::new("/menu/item"),
            SnippetKey::new("/menu/sub/entry"),
            SnippetKey::new("/page"),
        ]
    );
    assert_eq!(
        host,
        vec![
            ResourceRef {
                kind: ResourceKind::Stylesheet,
                path: "site/templates/css/menu.css".to_string(),
            },
            ResourceRef {
                kind: ResourceKind::Script,
                path: "site/templates/js/menu.js".to_string(),
            },
        ]
    );
}

#[test]
fn test_lookup_surface() {
    let mut engine = SnippetEngine::new();
    engine.import_str("menu.xml", MENU, &mut ()).expect("Should import");

    assert!(engine.has_snippet("menu//item"));
    assert!(engine.has_snippet(["menu", "sub", "entry"]));
    assert!(!engine.has_snippet("/menu"));

    let record = engine.get_snippet("/menu/bar").expect("Should exist");
    assert_eq!(record.source, "menu.xml");
    assert_eq!(record.template.name, "nav");
    assert!(engine.get_snippet("/menu/none").is_err());

    let keys: Vec<String> = engine
        .list_snippets("menu", false)
        .iter()
        .map(|k| k.to_string())
        .collect();
    assert_eq!(keys, vec!["/menu/bar", "/menu/item"]);

    let all: Vec<String> = engine
        .list_snippets("/", true)
        .iter()
        .map(|k| k.to_string())
        .collect();
    assert_eq!(all, vec!["/page", "/menu/bar", "/menu/item", "/menu/sub/entry"]);

    assert_eq!(engine.list_groups("/", false), vec!["/menu/"]);
    assert_eq!(engine.list_groups("/", true), vec!["/menu/", "/menu/sub/"]);
}

#[test]
fn test_later_import_overwrites_keys() {
    let mut engine = SnippetEngine::new();
    engine.import_str("menu.xml", MENU, &mut ()).expect("Should import");
    let patch = r#"<ps:pagesnippets xmlns:ps="https://github.com/suppenhuhn79/pagesnippets">
        <ps:snippet name="page"><article/></ps:snippet>
    </ps:pagesnippets>"#;
    engine.import_str("patch.xml", patch, &mut ()).expect("Should import");

    let record = engine.get_snippet("/page").expect("Should exist");
    assert_eq!(record.source, "patch.xml");
    assert_eq!(record.template.name, "article");
    assert_eq!(engine.registry().len(), 4);
}

#[test]
fn test_reimport_of_known_source_is_a_no_op() {
    let mut engine = SnippetEngine::new();
    engine.import_str("menu.xml", MENU, &mut ()).expect("Should import");
    let changed = MENU.replace(r#"name="page""#, r#"name="other""#);
    let mut host: Vec<ResourceRef> = Vec::new();
    let report = engine
        .import_str("menu.xml", &changed, &mut host)
        .expect("Should import");

    assert!(report.skipped);
    assert!(host.is_empty());
    assert!(!engine.has_snippet("/other"));
}

#[test]
fn test_non_snippet_document_is_rejected() {
    let mut engine = SnippetEngine::new();
    let err = engine
        .import_str("page.html", r#"<html xmlns="http://www.w3.org/1999/xhtml"/>"#, &mut ())
        .expect_err("Should fail");
    assert!(matches!(err, LoadError::NotATemplateDocument { .. }));

    let wrong_ns = r#"<ps:pagesnippets xmlns:ps="urn:elsewhere"/>"#;
    let err = engine
        .import_str("other.xml", wrong_ns, &mut ())
        .expect_err("Should fail");
    assert!(err.to_string().contains("\"other.xml\" is not a snippet document"));
}

#[test]
fn test_scripts_in_groups_are_not_allowed() {
    let text = r#"<ps:pagesnippets xmlns:ps="https://github.com/suppenhuhn79/pagesnippets">
        <ps:snippet-group name="g"><ps:script src="x.js"/></ps:snippet-group>
        <ps:stylesheet/>
    </ps:pagesnippets>"#;
    let mut engine = SnippetEngine::new();
    let report = engine.import_str("a.xml", text, &mut ()).expect("Should import");

    let kinds: Vec<WarningKind> = report.warnings.iter().map(|w| w.kind).collect();
    assert_eq!(kinds, vec![WarningKind::ElementNotAllowed, WarningKind::MissingAttribute]);
    assert!(report.resources.is_empty());
}

#[test]
fn test_default_namespace_from_config() {
    let config = EngineConfig::default().with_default_namespace("urn:plain");
    let mut engine = SnippetEngine::with_config(config);
    engine.import_str("menu.xml", MENU, &mut ()).expect("Should import");
    let output = engine
        .produce("/page", &Default::default())
        .expect("Should produce");
    assert_eq!(output.namespace, "urn:plain");
}
