// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use blockweave_engine::lists::{LIST_INDENT, LIST_ITEM_ID, LIST_TYPE};
use blockweave_engine::model::ROOT_NAME;
use blockweave_engine::{Document, Element};

/// `runs` lists of `items` items each, separated by plain paragraphs. Indents
/// climb and fall in a sawtooth so most items are nested.
#[allow(dead_code)]
pub fn generate_list_document(runs: usize, items: usize) -> Document {
    let mut children = Vec::with_capacity(runs * (items + 1));
    for run in 0..runs {
        for item in 0..items {
            let id = format!("r{run}i{item}");
            let list_type = if item % 2 == 0 { "bulleted" } else { "numbered" };
            children.push(
                Element::block("paragraph", id.clone())
                    .with_attribute(LIST_ITEM_ID, id)
                    .with_attribute(LIST_INDENT, (item % 5) as i64)
                    .with_attribute(LIST_TYPE, list_type),
            );
        }
        children.push(Element::block("paragraph", format!("separator {run}")));
    }
    Document::from_root(Element::container(ROOT_NAME, children))
}

/// Like [`generate_list_document`] but every indent is off by `excess`.
#[allow(dead_code)]
pub fn generate_broken_document(runs: usize, items: usize, excess: i64) -> Document {
    let mut children = Vec::with_capacity(runs * (items + 1));
    for run in 0..runs {
        for item in 0..items {
            let id = format!("r{run}i{item}");
            children.push(
                Element::block("paragraph", id.clone())
                    .with_attribute(LIST_ITEM_ID, id)
                    .with_attribute(LIST_INDENT, (item % 5) as i64 + excess)
                    .with_attribute(LIST_TYPE, "bulleted"),
            );
        }
        children.push(Element::block("paragraph", format!("separator {run}")));
    }
    Document::from_root(Element::container(ROOT_NAME, children))
}
