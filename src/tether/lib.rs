//! # Tether Architecture
//!
//! Tether is a **small reactive data-binding library**: models that hold a
//! record and announce changes, collections that fill themselves from a
//! server, and views that redraw whenever their model changes.
//!
//! Everything is built by composition. A model is not a base class to extend,
//! it is three capabilities plugged together at construction, and each one
//! can be swapped for a test double.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  View Layer (view/)                                         │
//! │  - ViewComponent: one model, re-renders on 'change'         │
//! │  - CollectionViewComponent: one container per item          │
//! │  - Declarative event bindings, nested child views           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Model Layer (model.rs, collection.rs)                      │
//! │  - get / set / fetch / save with change notification        │
//! │  - Failures become 'error' events, never panics             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Capabilities (attributes.rs, events.rs, sync/)             │
//! │  - Data: state container with shallow-merge set             │
//! │  - Eventing: ordered synchronous pub/sub                    │
//! │  - SyncPort: ApiSync (HTTP), InMemorySync (testing)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Views draw through the [`tether_dom::Surface`] trait, never through a
//! concrete UI toolkit. [`tether_dom::Document`] is the in-memory surface
//! used by default and in tests.
//!
//! ## Key Principle: Single-Threaded, Explicit Lifetimes
//!
//! Models, collections and views are `Rc`-shared and `!Send`. Network calls
//! are the only suspension points and are driven by whatever local executor
//! the application runs. Nothing is cancelled: keep a model alive until its
//! `fetch` or `save` settles.
//!
//! A view's subscription to its model lasts until the view is disposed or
//! dropped. Nested views live until their parent renders again.
//!
//! ## Testing Strategy
//!
//! 1. **Capabilities**: unit tests next to each implementation.
//! 2. **Models and collections**: driven against [`sync::memory::InMemorySync`],
//!    which can be scripted to fail. No network anywhere in the test suite.
//! 3. **Views**: rendered into [`tether_dom::Document`] nodes and asserted on
//!    the resulting markup and listeners.
//!
//! Diagnostics are asserted through captured `tracing` output.
//!
//! ## Module Overview
//!
//! - [`model`]: `Model<T>`, the single-record lifecycle
//! - [`collection`]: `Collection<T, M>`, append-only bulk fetch
//! - [`view`]: `View`, `ViewComponent`, `CollectionViewComponent`
//! - [`events`]: `Eventing` trait and the `Events` bus
//! - [`attributes`]: `Record`, `Data` trait and `Attributes`
//! - [`sync`]: `SyncPort` trait, HTTP and in-memory ports
//! - [`diagnostics`]: the injectable table of logged messages
//! - [`config`]: resource URLs and message overrides from `tether.json`
//! - [`error`]: Error types

pub mod attributes;
pub mod collection;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod model;
pub mod sync;
pub mod view;

pub use tether_dom;
