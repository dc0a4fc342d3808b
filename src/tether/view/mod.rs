//! # Views
//!
//! A view turns one model into UI and keeps it current. Concrete views
//! implement [`View`] (markup, event bindings, nested children); a
//! [`ViewComponent`] binds one of them to a model and a render target on a
//! [`Surface`] and drives rendering.
//!
//! ## Rendering
//!
//! [`ViewComponent::render`] always replaces everything the view showed before:
//!
//! 1. Parses [`View::template`] into a detached subtree
//! 2. Binds [`View::events`]: each distinct selector is queried once, and
//!    every binding gets attached to every node its selector matched. A
//!    selector matching nothing is logged and skipped.
//! 3. Runs [`View::on_render`], where nested views render into placeholders
//!    of the detached subtree
//! 4. Disposes the nested children kept by the previous render
//! 5. Clears the target and attaches the subtree in one operation
//!
//! The target is only touched in the last step, so a render that fails
//! earlier leaves the previous output and its children in place.
//!
//! ## Lifetime
//!
//! Construction subscribes to the model's `change` event and every `set` on
//! the model re-renders. The subscription holds the component weakly and is
//! removed by [`ViewComponent::dispose`] or by dropping the component.
//! Children kept through [`RenderContext::keep`] live until the parent's next
//! render or disposal.

use crate::attributes::Record;
use crate::diagnostics::Diagnostics;
use crate::error::{Result, TetherError};
use crate::events::{ListenerId, CHANGE};
use crate::model::Model;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use tether_dom::{Listener, Surface, UiEvent};
use tracing::warn;

pub mod collection;

/// Attaches `handler` for UI event `event` to every node matching `selector`.
#[derive(Clone)]
pub struct EventBinding {
    pub event: String,
    pub selector: String,
    pub handler: Listener,
}

impl EventBinding {
    pub fn new(event: &str, selector: &str, handler: impl Fn(&UiEvent) + 'static) -> Self {
        Self {
            event: event.to_string(),
            selector: selector.to_string(),
            handler: Rc::new(handler),
        }
    }
}

impl std::fmt::Debug for EventBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBinding")
            .field("event", &self.event)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

/// Something that holds subscriptions and can release them.
pub trait Dispose {
    fn dispose(&self);
}

/// What a concrete view supplies.
pub trait View<T: Record, S: Surface> {
    /// Markup for the current state of `model`.
    fn template(&self, model: &Model<T>) -> Result<String>;

    fn events(&self, _model: &Rc<Model<T>>) -> Vec<EventBinding> {
        Vec::new()
    }

    /// Runs after events are bound and before `fragment` is attached.
    fn on_render(
        &self,
        _model: &Rc<Model<T>>,
        _fragment: &S::Node,
        _ctx: &mut RenderContext<'_, S>,
    ) -> Result<()> {
        Ok(())
    }
}

/// Handed to hooks that build nested views during a render.
pub struct RenderContext<'a, S: Surface> {
    surface: &'a S,
    diagnostics: Rc<Diagnostics>,
    kept: Vec<Box<dyn Dispose>>,
}

impl<'a, S: Surface> RenderContext<'a, S> {
    pub(crate) fn new(surface: &'a S, diagnostics: Rc<Diagnostics>) -> Self {
        Self {
            surface,
            diagnostics,
            kept: Vec::new(),
        }
    }

    pub fn surface(&self) -> &'a S {
        self.surface
    }

    pub fn diagnostics(&self) -> &Rc<Diagnostics> {
        &self.diagnostics
    }

    /// Retains `child` until the next render or disposal of the parent.
    pub fn keep(&mut self, child: impl Dispose + 'static) {
        self.kept.push(Box::new(child));
    }

    /// First node under `scope` matching `selector`. Logs
    /// `element_not_found` when there is none.
    pub fn region(&self, scope: &S::Node, selector: &str) -> Option<S::Node> {
        let found = match self.surface.query_all(scope, selector) {
            Ok(nodes) => nodes.into_iter().next(),
            Err(err) => {
                warn!(selector, error = %err, "{}", self.diagnostics.invalid_selector);
                None
            }
        };
        if found.is_none() {
            warn!(selector, "{}", self.diagnostics.element_not_found);
        }
        found
    }

    pub(crate) fn into_kept(self) -> Vec<Box<dyn Dispose>> {
        self.kept
    }
}

/// Locates the mount point for a top-level view.
pub fn find_root<S: Surface>(
    surface: &S,
    scope: &S::Node,
    selector: &str,
    diagnostics: &Diagnostics,
) -> Result<S::Node> {
    match surface.query_all(scope, selector)?.into_iter().next() {
        Some(root) => Ok(root),
        None => {
            warn!(selector, "{}", diagnostics.root_element_not_found);
            Err(TetherError::RootNotFound(
                diagnostics.root_element_not_found.clone(),
            ))
        }
    }
}

pub(crate) fn dispose_all(children: Vec<Box<dyn Dispose>>) {
    for child in children {
        child.dispose();
    }
}

/// Queries each distinct selector once and attaches every binding to the
/// nodes its selector matched.
pub(crate) fn bind_events<S: Surface>(
    surface: &S,
    fragment: &S::Node,
    bindings: &[EventBinding],
    diagnostics: &Diagnostics,
) {
    let mut matched: HashMap<&str, Vec<S::Node>> = HashMap::new();

    for binding in bindings {
        let selector = binding.selector.as_str();
        if matched.contains_key(selector) {
            continue;
        }
        let nodes = surface.query_all(fragment, selector).unwrap_or_else(|err| {
            warn!(selector, error = %err, "{}", diagnostics.invalid_selector);
            Vec::new()
        });
        if nodes.is_empty() {
            warn!(selector, "{}", diagnostics.element_not_found);
        }
        matched.insert(selector, nodes);
    }

    for binding in bindings {
        let Some(nodes) = matched.get(binding.selector.as_str()) else {
            continue;
        };
        for node in nodes {
            surface.listen(node, &binding.event, binding.handler.clone());
        }
    }
}

struct Inner<T: Record, S: Surface, V> {
    view: V,
    model: Rc<Model<T>>,
    surface: S,
    target: S::Node,
    diagnostics: RefCell<Rc<Diagnostics>>,
    subscription: Cell<Option<ListenerId>>,
    children: RefCell<Vec<Box<dyn Dispose>>>,
}

impl<T: Record, S: Surface, V: View<T, S>> Inner<T, S, V> {
    fn render(&self) -> Result<()> {
        let diagnostics = self.diagnostics.borrow().clone();
        let markup = self.view.template(&self.model)?;
        let fragment = self.surface.parse(&markup)?;

        let bindings = self.view.events(&self.model);
        bind_events(&self.surface, &fragment, &bindings, &diagnostics);

        let mut ctx = RenderContext::new(&self.surface, diagnostics);
        self.view.on_render(&self.model, &fragment, &mut ctx)?;

        let previous = self.children.replace(ctx.into_kept());
        dispose_all(previous);

        self.surface.clear_children(&self.target);
        self.surface.append(&self.target, fragment);
        Ok(())
    }

    fn dispose(&self) {
        if let Some(id) = self.subscription.take() {
            self.model.off(CHANGE, id);
        }
        let children = self.children.take();
        dispose_all(children);
    }
}

/// A [`View`] bound to a model and a render target.
pub struct ViewComponent<T: Record, S: Surface + 'static, V: View<T, S> + 'static> {
    inner: Rc<Inner<T, S, V>>,
}

impl<T: Record, S: Surface + 'static, V: View<T, S> + 'static> ViewComponent<T, S, V> {
    /// Binds `view` and subscribes to `model`'s `change` event. Nothing is
    /// drawn until the first [`render`](Self::render).
    ///
    /// Messages default to the model's diagnostics.
    pub fn new(surface: S, target: S::Node, model: Rc<Model<T>>, view: V) -> Self {
        let diagnostics = model.diagnostics().clone();
        let inner = Rc::new(Inner {
            view,
            model,
            surface,
            target,
            diagnostics: RefCell::new(diagnostics),
            subscription: Cell::new(None),
            children: RefCell::new(Vec::new()),
        });

        let weak: Weak<Inner<T, S, V>> = Rc::downgrade(&inner);
        let id = inner.model.on(
            CHANGE,
            Rc::new(move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if let Err(err) = inner.render() {
                    let diagnostics = inner.diagnostics.borrow().clone();
                    warn!(error = %err, "{}", diagnostics.render_failed);
                }
            }),
        );
        inner.subscription.set(Some(id));

        Self { inner }
    }

    pub fn with_diagnostics(self, diagnostics: Rc<Diagnostics>) -> Self {
        self.inner.diagnostics.replace(diagnostics);
        self
    }

    /// Redraws the view into its target.
    ///
    /// The target is cleared right before the new subtree is attached, not
    /// first. On error the previous output and nested views are left as
    /// they were.
    pub fn render(&self) -> Result<()> {
        self.inner.render()
    }

    pub fn model(&self) -> &Rc<Model<T>> {
        &self.inner.model
    }

    pub fn target(&self) -> &S::Node {
        &self.inner.target
    }

    pub fn view(&self) -> &V {
        &self.inner.view
    }

    pub fn is_subscribed(&self) -> bool {
        self.inner.subscription.get().is_some()
    }
}

impl<T: Record, S: Surface + 'static, V: View<T, S> + 'static> Dispose for ViewComponent<T, S, V> {
    /// Unsubscribes from the model and disposes kept children. The rendered
    /// output stays where it is.
    fn dispose(&self) {
        self.inner.dispose();
    }
}

impl<T: Record, S: Surface + 'static, V: View<T, S> + 'static> Drop for ViewComponent<T, S, V> {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Eventing;
    use crate::sync::memory::fixtures::User;
    use crate::sync::memory::InMemorySync;
    use tether_dom::{render_template, Document, NodeRef};
    use tracing_test::traced_test;

    fn user(name: &str) -> Rc<Model<User>> {
        Rc::new(Model::with_sync(
            User::named(name),
            Rc::new(InMemorySync::<User>::new()),
        ))
    }

    fn rename(model: &Model<User>, name: &str) {
        model.set(User {
            name: Some(name.to_string()),
            ..User::default()
        });
    }

    struct UserShow;

    impl View<User, Document> for UserShow {
        fn template(&self, model: &Model<User>) -> Result<String> {
            Ok(render_template(
                "<div><h1>User Detail</h1><p class=\"name\">{{ name }}</p></div>",
                &*model.get_all(),
            )?)
        }
    }

    struct UserForm {
        missing_selector: bool,
    }

    impl View<User, Document> for UserForm {
        fn template(&self, _model: &Model<User>) -> Result<String> {
            Ok("<div><input value=\"Grace\"><button class=\"set-name\">Set</button></div>"
                .to_string())
        }

        fn events(&self, model: &Rc<Model<User>>) -> Vec<EventBinding> {
            let on_click = Rc::downgrade(model);
            let mut bindings = vec![
                EventBinding::new("click", ".set-name", move |_| {
                    if let Some(model) = on_click.upgrade() {
                        rename(&model, "Clicked");
                    }
                }),
                EventBinding::new("mouseenter", ".set-name", |_| {}),
            ];
            if self.missing_selector {
                bindings.push(EventBinding::new("click", ".nowhere", |_| {}));
            }
            bindings
        }
    }

    struct UserEdit;

    impl View<User, Document> for UserEdit {
        fn template(&self, _model: &Model<User>) -> Result<String> {
            Ok("<div><div class=\"user-show\"></div><div class=\"user-form\"></div></div>"
                .to_string())
        }

        fn on_render(
            &self,
            model: &Rc<Model<User>>,
            fragment: &NodeRef,
            ctx: &mut RenderContext<'_, Document>,
        ) -> Result<()> {
            let (Some(show), Some(form)) = (
                ctx.region(fragment, ".user-show"),
                ctx.region(fragment, ".user-form"),
            ) else {
                return Ok(());
            };

            let show = ViewComponent::new(*ctx.surface(), show, model.clone(), UserShow);
            show.render()?;
            ctx.keep(show);

            let form = ViewComponent::new(
                *ctx.surface(),
                form,
                model.clone(),
                UserForm {
                    missing_selector: false,
                },
            );
            form.render()?;
            ctx.keep(form);
            Ok(())
        }
    }

    fn name_text(root: &NodeRef) -> String {
        root.select(".name").unwrap()[0].text_content()
    }

    #[test]
    fn render_draws_template_into_target() {
        let target = NodeRef::element("main");
        let view = ViewComponent::new(Document, target.clone(), user("Ada"), UserShow);

        view.render().unwrap();

        assert_eq!(
            target.inner_markup(),
            "<div><h1>User Detail</h1><p class=\"name\">Ada</p></div>"
        );
    }

    #[test]
    fn nothing_is_drawn_before_first_render() {
        let target = NodeRef::element("main");
        let _view = ViewComponent::new(Document, target.clone(), user("Ada"), UserShow);
        assert_eq!(target.child_count(), 0);
    }

    #[test]
    fn second_render_replaces_first() {
        let target = NodeRef::element("main");
        let model = user("Ada");
        let view = ViewComponent::new(Document, target.clone(), model.clone(), UserShow);

        view.render().unwrap();
        rename(&model, "Grace");
        view.render().unwrap();

        assert_eq!(target.child_count(), 1);
        assert_eq!(name_text(&target), "Grace");
        assert!(!target.text_content().contains("Ada"));
    }

    #[test]
    fn model_change_rerenders() {
        let target = NodeRef::element("main");
        let model = user("Ada");
        let view = ViewComponent::new(Document, target.clone(), model.clone(), UserShow);
        view.render().unwrap();

        rename(&model, "Grace");

        assert_eq!(name_text(&target), "Grace");
        assert_eq!(target.child_count(), 1);
    }

    #[test]
    fn ui_events_reach_bound_handlers() {
        let target = NodeRef::element("main");
        let model = user("Ada");
        let view = ViewComponent::new(
            Document,
            target.clone(),
            model.clone(),
            UserForm {
                missing_selector: false,
            },
        );
        view.render().unwrap();

        let button = target.select(".set-name").unwrap().remove(0);
        assert_eq!(button.listener_count("click"), 1);
        assert_eq!(button.listener_count("mouseenter"), 1);

        button.dispatch("click");

        assert_eq!(model.get(|u| &u.name).as_deref(), Some("Clicked"));
    }

    #[test]
    #[traced_test]
    fn unmatched_selector_is_logged_and_render_completes() {
        let target = NodeRef::element("main");
        let view = ViewComponent::new(
            Document,
            target.clone(),
            user("Ada"),
            UserForm {
                missing_selector: true,
            },
        );

        view.render().unwrap();

        assert!(logs_contain("The specified DOM element could not be found!"));
        let button = target.select(".set-name").unwrap().remove(0);
        assert_eq!(button.listener_count("click"), 1);
    }

    #[test]
    fn shared_selector_is_queried_once_per_render() {
        struct Counting<'a> {
            queries: &'a Cell<usize>,
        }

        impl Surface for Counting<'_> {
            type Node = NodeRef;

            fn parse(&self, markup: &str) -> std::result::Result<NodeRef, tether_dom::DomError> {
                Document.parse(markup)
            }
            fn create_fragment(&self) -> NodeRef {
                Document.create_fragment()
            }
            fn create_element(&self, tag: &str) -> NodeRef {
                Document.create_element(tag)
            }
            fn clear_children(&self, node: &NodeRef) {
                Document.clear_children(node)
            }
            fn append(&self, parent: &NodeRef, child: NodeRef) {
                Document.append(parent, child)
            }
            fn query_all(
                &self,
                root: &NodeRef,
                selector: &str,
            ) -> std::result::Result<Vec<NodeRef>, tether_dom::DomError> {
                self.queries.set(self.queries.get() + 1);
                Document.query_all(root, selector)
            }
            fn listen(&self, node: &NodeRef, event: &str, listener: Listener) {
                Document.listen(node, event, listener)
            }
        }

        let queries = Cell::new(0);
        let surface = Counting { queries: &queries };
        let fragment = surface
            .parse("<button class=\"go\">Go</button>")
            .unwrap();
        let bindings = vec![
            EventBinding::new("click", ".go", |_| {}),
            EventBinding::new("focus", ".go", |_| {}),
            EventBinding::new("blur", ".go", |_| {}),
        ];

        bind_events(&surface, &fragment, &bindings, &Diagnostics::default());

        assert_eq!(queries.get(), 1);
        let button = fragment.children()[0].clone();
        assert_eq!(button.listener_count("click"), 1);
        assert_eq!(button.listener_count("focus"), 1);
        assert_eq!(button.listener_count("blur"), 1);
    }

    #[test]
    fn malformed_template_keeps_previous_output() {
        struct Flaky {
            broken: Cell<bool>,
        }

        impl View<User, Document> for Flaky {
            fn template(&self, model: &Model<User>) -> Result<String> {
                if self.broken.get() {
                    return Ok("<div><p".to_string());
                }
                Ok(format!("<p>{}</p>", model.get(|u| &u.name).unwrap_or_default()))
            }
        }

        let target = NodeRef::element("main");
        let view = ViewComponent::new(
            Document,
            target.clone(),
            user("Ada"),
            Flaky {
                broken: Cell::new(false),
            },
        );
        view.render().unwrap();
        view.view().broken.set(true);

        let result = view.render();

        assert!(matches!(result, Err(TetherError::Markup(_))));
        assert_eq!(target.inner_markup(), "<p>Ada</p>");
    }

    #[test]
    fn nested_views_render_into_placeholders() {
        let target = NodeRef::element("main");
        let model = user("Ada");
        let view = ViewComponent::new(Document, target.clone(), model.clone(), UserEdit);

        view.render().unwrap();

        assert_eq!(name_text(&target), "Ada");
        assert_eq!(target.select(".set-name").unwrap().len(), 1);
    }

    #[test]
    fn nested_subscriptions_do_not_accumulate() {
        let target = NodeRef::element("main");
        let model = user("Ada");
        let view = ViewComponent::new(Document, target.clone(), model.clone(), UserEdit);
        view.render().unwrap();
        let after_first = model.events().handler_count(CHANGE);

        rename(&model, "Grace");
        rename(&model, "Linus");
        view.render().unwrap();

        assert_eq!(after_first, 3);
        assert_eq!(model.events().handler_count(CHANGE), 3);
        assert_eq!(name_text(&target), "Linus");
        assert_eq!(target.select(".user-show").unwrap().len(), 1);
    }

    #[test]
    fn click_in_nested_form_rerenders_whole_tree() {
        let target = NodeRef::element("main");
        let model = user("Ada");
        let view = ViewComponent::new(Document, target.clone(), model.clone(), UserEdit);
        view.render().unwrap();

        target.select(".set-name").unwrap()[0].dispatch("click");

        assert_eq!(name_text(&target), "Clicked");
        assert_eq!(target.select(".user-show").unwrap().len(), 1);
        assert_eq!(target.select(".set-name").unwrap().len(), 1);
    }

    #[test]
    fn dispose_stops_rerendering() {
        let target = NodeRef::element("main");
        let model = user("Ada");
        let view = ViewComponent::new(Document, target.clone(), model.clone(), UserEdit);
        view.render().unwrap();

        view.dispose();
        rename(&model, "Grace");

        assert!(!view.is_subscribed());
        assert_eq!(model.events().handler_count(CHANGE), 0);
        assert_eq!(name_text(&target), "Ada");
    }

    #[test]
    fn drop_unsubscribes() {
        let target = NodeRef::element("main");
        let model = user("Ada");
        {
            let view = ViewComponent::new(Document, target.clone(), model.clone(), UserShow);
            view.render().unwrap();
            assert_eq!(model.events().handler_count(CHANGE), 1);
        }

        assert_eq!(model.events().handler_count(CHANGE), 0);
        rename(&model, "Grace");
        assert_eq!(name_text(&target), "Ada");
    }

    #[test]
    #[traced_test]
    fn selector_and_redraw_failures_use_injected_messages() {
        struct Fragile {
            broken: Cell<bool>,
        }

        impl View<User, Document> for Fragile {
            fn template(&self, _model: &Model<User>) -> Result<String> {
                if self.broken.get() {
                    return Ok("<p".to_string());
                }
                Ok("<button>Go</button>".to_string())
            }

            fn events(&self, _model: &Rc<Model<User>>) -> Vec<EventBinding> {
                vec![EventBinding::new("click", "button[", |_| {})]
            }
        }

        let target = NodeRef::element("main");
        let model = user("Ada");
        let view = ViewComponent::new(
            Document,
            target.clone(),
            model.clone(),
            Fragile {
                broken: Cell::new(false),
            },
        )
        .with_diagnostics(Rc::new(Diagnostics {
            invalid_selector: "bad selector in view".to_string(),
            render_failed: "view redraw failed".to_string(),
            ..Diagnostics::default()
        }));

        view.render().unwrap();
        assert!(logs_contain("bad selector in view"));

        view.view().broken.set(true);
        rename(&model, "Grace");

        assert!(logs_contain("view redraw failed"));
        assert_eq!(target.inner_markup(), "<button>Go</button>");
    }

    #[test]
    fn find_root_returns_first_match() {
        let page = tether_dom::parse_fragment("<div id=\"root\"></div><div id=\"other\"></div>")
            .unwrap();
        let root = find_root(&Document, &page, "#root", &Diagnostics::default()).unwrap();
        assert_eq!(root.attr("id").as_deref(), Some("root"));
    }

    #[test]
    #[traced_test]
    fn find_root_reports_missing_mount_point() {
        let page = tether_dom::parse_fragment("<div></div>").unwrap();

        let err = find_root(&Document, &page, "#root", &Diagnostics::default()).unwrap_err();

        assert!(matches!(err, TetherError::RootNotFound(_)));
        assert_eq!(
            err.to_string(),
            "The specified root element could not be found!"
        );
        assert!(logs_contain("The specified root element could not be found!"));
    }

    #[test]
    #[traced_test]
    fn missing_placeholder_degrades_gracefully() {
        struct Hollow;

        impl View<User, Document> for Hollow {
            fn template(&self, _model: &Model<User>) -> Result<String> {
                Ok("<div></div>".to_string())
            }

            fn on_render(
                &self,
                model: &Rc<Model<User>>,
                fragment: &NodeRef,
                ctx: &mut RenderContext<'_, Document>,
            ) -> Result<()> {
                if let Some(slot) = ctx.region(fragment, ".user-show") {
                    let child = ViewComponent::new(*ctx.surface(), slot, model.clone(), UserShow);
                    child.render()?;
                    ctx.keep(child);
                }
                Ok(())
            }
        }

        let target = NodeRef::element("main");
        let view = ViewComponent::new(Document, target.clone(), user("Ada"), Hollow);

        view.render().unwrap();

        assert_eq!(target.inner_markup(), "<div></div>");
        assert!(logs_contain("The specified DOM element could not be found!"));
    }
}
