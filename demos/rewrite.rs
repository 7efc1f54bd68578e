//! Rewriting a document: insertion, wrapping, attributes and styles.
//!
//! Run with: `cargo run --example rewrite`
#![allow(clippy::expect_used)]

use quarry::{Content, Dom, LoadOptions};

fn main() {
    let dom = Dom::load_with_options(
        r#"<article><h1>Release notes</h1><p>Faster parser.</p><p>New <code>wrap_all</code>.</p></article>"#,
        LoadOptions::default().document(false),
    )
    .expect("failed to load markup");

    let paragraphs = dom.select("article > p").expect("valid selector");

    // The same markup goes to every paragraph; all but the last get copies.
    paragraphs
        .prepend_with(|i, _| Content::from(format!("<b>{}.</b> ", i + 1)))
        .expect("prepend failed");
    paragraphs
        .wrap_all(r#"<section class="changes"></section>"#)
        .expect("wrap_all failed");

    let _ = dom
        .select("h1")
        .expect("valid selector")
        .set_attr("id", "notes")
        .expect("valid attribute")
        .set_css("color", "navy")
        .add_class("title");

    let code = dom.select("code").expect("valid selector");
    code.replace_with("<kbd>wrap_all</kbd>")
        .expect("replace failed");

    dom.select("article")
        .expect("valid selector")
        .append(r#"<footer>Thanks to all contributors.</footer>"#)
        .expect("append failed");

    println!("{}", dom.html());
}
