//! List rendering for collections.
//!
//! A [`CollectionViewComponent`] does not listen to its collection. Call
//! [`render`](CollectionViewComponent::render) again when new data arrives,
//! typically from a `fetch` handler on the collection.

use super::{dispose_all, Dispose, RenderContext};
use crate::attributes::Record;
use crate::collection::Collection;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use std::cell::RefCell;
use std::rc::Rc;
use tether_dom::Surface;

/// Tag of the container each item renders into.
pub const ITEM_CONTAINER: &str = "div";

/// What a concrete list view supplies.
pub trait CollectionView<T: Record, M, S: Surface> {
    /// Fills `container` for one item, usually by rendering a
    /// [`ViewComponent`](super::ViewComponent) into it and keeping it with
    /// [`RenderContext::keep`].
    fn render_item(
        &self,
        container: &S::Node,
        model: &M,
        ctx: &mut RenderContext<'_, S>,
    ) -> Result<()>;
}

/// A [`CollectionView`] bound to a collection and a render target.
pub struct CollectionViewComponent<T: Record, M, S: Surface, V> {
    view: V,
    collection: Rc<Collection<T, M>>,
    surface: S,
    target: S::Node,
    diagnostics: Rc<Diagnostics>,
    children: RefCell<Vec<Box<dyn Dispose>>>,
}

impl<T, M, S, V> CollectionViewComponent<T, M, S, V>
where
    T: Record,
    M: Clone,
    S: Surface,
    V: CollectionView<T, M, S>,
{
    pub fn new(surface: S, target: S::Node, collection: Rc<Collection<T, M>>, view: V) -> Self {
        Self {
            view,
            collection,
            surface,
            target,
            diagnostics: Rc::new(Diagnostics::default()),
            children: RefCell::new(Vec::new()),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Rc<Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Renders one container per item held right now, then swaps them into
    /// the target in one operation.
    pub fn render(&self) -> Result<()> {
        let items = self.collection.snapshot();
        let fragment = self.surface.create_fragment();
        let mut ctx = RenderContext::new(&self.surface, self.diagnostics.clone());

        for item in &items {
            let container = self.surface.create_element(ITEM_CONTAINER);
            self.view.render_item(&container, item, &mut ctx)?;
            self.surface.append(&fragment, container);
        }

        let previous = self.children.replace(ctx.into_kept());
        dispose_all(previous);

        self.surface.clear_children(&self.target);
        self.surface.append(&self.target, fragment);
        Ok(())
    }

    pub fn collection(&self) -> &Rc<Collection<T, M>> {
        &self.collection
    }

    pub fn target(&self) -> &S::Node {
        &self.target
    }
}

impl<T: Record, M, S: Surface, V> Dispose for CollectionViewComponent<T, M, S, V> {
    /// Disposes the item views kept by the last render.
    fn dispose(&self) {
        let children = self.children.take();
        dispose_all(children);
    }
}

impl<T: Record, M, S: Surface, V> Drop for CollectionViewComponent<T, M, S, V> {
    fn drop(&mut self) {
        self.dispose();
    }
}
