// Test helper functions - each integration test binary only uses some of
// them, so dead code analysis complains about the rest.
use blockweave_engine::dev_utils::{parse, set_data, stringify};
use blockweave_engine::lists::SequentialIds;
use blockweave_engine::lists::invariants::assert_valid;
use blockweave_engine::lists::postfixer::repair;
use blockweave_engine::lists::trigger::TouchedSet;
use blockweave_engine::model::ElementDef;
use blockweave_engine::{Editor, Feature, ListType, Range};

/// Editor with every block feature, deterministic ids, a `foo` attribute on
/// paragraphs and a `nonListable` block that may not join lists.
#[allow(dead_code)]
pub fn editor() -> Editor {
    Editor::builder()
        .features([
            Feature::DocumentList,
            Feature::BlockQuote,
            Feature::Table,
            Feature::Heading,
        ])
        .register(ElementDef::text_block("nonListable").allow("foo"))
        .allow_attribute("paragraph", "foo")
        .ids(Box::new(SequentialIds::new("e")))
        .build()
        .unwrap()
}

/// Editor loaded with `markup`, plus the selection it marks.
#[allow(dead_code)]
pub fn editor_with(markup: &str) -> (Editor, Option<Range>) {
    let mut editor = editor();
    let selection = set_data(editor.model_mut(), markup).unwrap();
    (editor, selection)
}

/// `markup` as the notation writes it: whitespace between elements dropped,
/// attributes sorted.
#[allow(dead_code)]
pub fn canonical(markup: &str) -> String {
    let (document, selection) = parse(markup).unwrap();
    stringify(&document, selection.as_ref())
}

/// Document content without selection.
#[allow(dead_code)]
pub fn data(editor: &Editor) -> String {
    stringify(editor.model().document(), None)
}

/// The document breaks no list invariant and a full repair pass over it
/// finds nothing to change.
#[allow(dead_code)]
pub fn assert_settled(editor: &Editor) {
    let document = editor.model().document();
    let schema = editor.model().schema();
    assert_valid(document, schema);

    let everything = TouchedSet::everything(document, schema);
    let operations = repair(
        document,
        schema,
        &everything,
        &ListType::default(),
        &mut SequentialIds::new("unused"),
    );
    assert!(
        operations.is_empty(),
        "settled document still repaired: {operations:?}"
    );
}
