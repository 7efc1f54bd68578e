//! # quarry
//!
//! jQuery-style querying, traversal and mutation of HTML and XML
//! documents. Markup is parsed into an arena of nodes; a [`Selection`] is an
//! ordered set of node ids into that arena with the familiar chainable
//! API on top.
//!
//! ## Quick Start
//!
//! ```
//! use quarry::Dom;
//!
//! let dom = Dom::load(r#"<ul id="fruits"><li class="apple">Apple</li><li class="pear">Pear</li></ul>"#).unwrap();
//! let apple = dom.select(".apple").unwrap();
//! assert_eq!(apple.next_all().text(), "Pear");
//!
//! dom.select("ul").unwrap().append(r#"<li class="plum">Plum</li>"#).unwrap();
//! assert_eq!(dom.select("li").unwrap().len(), 3);
//! assert_eq!(dom.select(".plum").unwrap().attr("class").as_deref(), Some("plum"));
//! ```
//!
//! ## Modes
//!
//! HTML mode (the default) parses tolerantly, matches tag and attribute
//! names case-insensitively and treats boolean attributes specially. XML
//! mode ([`LoadOptions::xml`]) keeps everything literal.

pub mod dom;
pub mod encoding;
pub mod error;
pub mod parser;
pub mod select;
pub mod selection;
pub mod serial;
pub mod tree;
pub mod util;

// Re-export primary types at the crate root for convenience.
pub use dom::{Dom, LoadOptions};
pub use error::{Error, ParseError, Result};
pub use select::Selector;
pub use selection::{Content, Filter, Selection};
pub use tree::{Attribute, Document, NodeId, NodeKind};
