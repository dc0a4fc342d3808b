//! # tether-dom - UI Trees for tether Views
//!
//! The render-target side of tether. Views never touch a concrete UI toolkit:
//! they talk to a [`Surface`], which knows how to parse markup into a detached
//! subtree, query it with selectors, attach event listeners and splice the
//! finished subtree into the visible tree.
//!
//! ## What Lives Here
//!
//! - [`Surface`]: the capability trait views are written against
//! - [`Document`] / [`NodeRef`]: an in-memory tree implementing `Surface`,
//!   used as the default backend and in every test
//! - [`parse_fragment`]: a lenient parser for the HTML subset templates emit
//! - [`Selector`]: type, id, class and attribute selectors with descendant
//!   and child combinators
//! - [`Templates`] / [`render_template`]: minijinja rendering with HTML
//!   auto-escaping, for producing view markup from records
//!
//! ## Quick Example
//!
//! ```rust
//! use tether_dom::{Document, Surface};
//!
//! let document = Document::new();
//! let root = document.create_element("div");
//!
//! let fragment = document.parse("<h2>User: Ada</h2><button class=\"save\">Save</button>").unwrap();
//! let buttons = document.query_all(&fragment, "button.save").unwrap();
//! assert_eq!(buttons.len(), 1);
//!
//! document.append(&root, fragment);
//! assert_eq!(root.text_content(), "User: AdaSave");
//! ```
//!
//! ## Ownership
//!
//! Nodes are `Rc` handles, single-threaded by construction. A parent owns its
//! children; children point back weakly. Listeners are plain `Rc<dyn Fn>`
//! closures and live as long as the node they are attached to.

mod error;
mod node;
mod parse;
mod selector;
mod surface;
mod template;

pub use error::DomError;
pub use node::{Listener, NodeKind, NodeRef, UiEvent};
pub use parse::{decode_entities, parse_fragment};
pub use selector::Selector;
pub use surface::{Document, Surface};
pub use template::{render_template, Templates};
