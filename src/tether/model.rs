//! # Models
//!
//! A [`Model`] is one record plus the three capabilities it is composed from:
//!
//! ```text
//! ┌─────────────── Model<T> ───────────────┐
//! │  Box<dyn Data<T>>     state container  │
//! │  Rc<dyn Eventing>     notifications    │
//! │  Rc<dyn SyncPort<T>>  remote CRUD      │
//! └────────────────────────────────────────┘
//! ```
//!
//! Each capability is injected at construction and never reconfigured. Tests
//! swap in [`InMemorySync`](crate::sync::memory::InMemorySync) without
//! touching model logic.
//!
//! ## Events
//!
//! - `change`: after every [`Model::set`], unconditionally. Nothing else fires it.
//! - `fetch`: after a successful [`Model::fetch`] (following its `change`) or
//!   [`Model::fetch_all`].
//! - `save`: after a successful [`Model::save`].
//! - `error`: missing identifier or a non-2xx response.
//!
//! ## Failure Policy
//!
//! Failing statuses and a missing id are logged, turned into `error` and
//! returned normally. Only transport failures and undecodable success bodies
//! come back as `Err`. State changes only on the success path.
//!
//! Async operations borrow nothing across the await; the caller keeps the
//! model alive until they settle.

use crate::attributes::{Attributes, Data, Record};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::events::{Callback, Eventing, Events, ListenerId, CHANGE, ERROR, FETCH, SAVE};
use crate::sync::api::ApiSync;
use crate::sync::{RawResponse, SyncPort};
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::warn;

pub struct Model<T: Record> {
    attributes: RefCell<Box<dyn Data<T>>>,
    events: Rc<dyn Eventing>,
    sync: Rc<dyn SyncPort<T>>,
    diagnostics: Rc<Diagnostics>,
}

impl<T: Record> Model<T> {
    pub fn new(
        attributes: Box<dyn Data<T>>,
        events: Rc<dyn Eventing>,
        sync: Rc<dyn SyncPort<T>>,
    ) -> Self {
        Self {
            attributes: RefCell::new(attributes),
            events,
            sync,
            diagnostics: Rc::new(Diagnostics::default()),
        }
    }

    /// A model over HTTP, synced with the resource collection at `base_url`.
    pub fn from_api(data: T, base_url: &str) -> Self {
        Self::with_sync(data, Rc::new(ApiSync::<T>::new(base_url)))
    }

    /// Default attributes and events with a custom sync port.
    pub fn with_sync(data: T, sync: Rc<dyn SyncPort<T>>) -> Self {
        Self::new(
            Box::new(Attributes::new(data)),
            Rc::new(Events::new()),
            sync,
        )
    }

    /// Replaces the messages this model logs. The event bus keeps its own.
    pub fn with_diagnostics(mut self, diagnostics: Rc<Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Reads one attribute.
    ///
    /// ```rust
    /// # use tether::model::Model;
    /// # use tether::sync::memory::InMemorySync;
    /// # use serde_json::{json, Map, Value};
    /// # use std::rc::Rc;
    /// type Untyped = Map<String, Value>;
    /// let data = json!({ "name": "Ada" }).as_object().cloned().unwrap();
    /// let user = Model::with_sync(data, Rc::new(InMemorySync::<Untyped>::new()));
    /// assert_eq!(user.get(|r| &r["name"]), json!("Ada"));
    /// ```
    pub fn get<V: Clone>(&self, field: impl FnOnce(&T) -> &V) -> V {
        field(self.attributes.borrow().get_all()).clone()
    }

    /// The live record, borrowed.
    ///
    /// Release the borrow before calling [`set`](Self::set) or anything that
    /// may call it, such as a `change` handler.
    pub fn get_all(&self) -> Ref<'_, T> {
        Ref::map(self.attributes.borrow(), |attributes| attributes.get_all())
    }

    /// Merges `update` into the record, then triggers `change`.
    ///
    /// `None` fields of `update` are skipped, so `set` cannot clear a field.
    /// While a [`get_all`](Self::get_all) borrow is alive the update is
    /// logged and dropped and no `change` fires.
    pub fn set(&self, update: T) {
        let Ok(mut attributes) = self.attributes.try_borrow_mut() else {
            warn!("{}", self.diagnostics.model_busy);
            return;
        };
        let merged = attributes.set(update);
        drop(attributes);

        if let Err(err) = merged {
            warn!(error = %err, "{}", self.diagnostics.merge_failed);
        }
        self.events.trigger(CHANGE);
    }

    pub fn on(&self, event: &str, callback: Callback) -> ListenerId {
        self.events.on(event, callback)
    }

    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        self.events.off(event, id)
    }

    pub fn trigger(&self, event: &str) {
        self.events.trigger(event);
    }

    pub fn events(&self) -> &Rc<dyn Eventing> {
        &self.events
    }

    pub fn diagnostics(&self) -> &Rc<Diagnostics> {
        &self.diagnostics
    }

    /// Reloads the record from the server by id.
    ///
    /// Returns `Ok(None)` without any request when the record has no id.
    pub async fn fetch(&self) -> Result<Option<RawResponse>> {
        let id = self.attributes.borrow().get_all().id();
        let Some(id) = id else {
            warn!("{}", self.diagnostics.id_not_found);
            self.events.trigger(ERROR);
            return Ok(None);
        };

        let response = self.sync.fetch(id).await?;
        if response.is_ok() {
            let data: T = response.json()?;
            self.set(data);
            self.events.trigger(FETCH);
        } else {
            warn!(id, status = response.status, "{}", self.diagnostics.fetch_failed);
            self.events.trigger(ERROR);
        }
        Ok(Some(response))
    }

    /// Requests the whole resource collection and reports the outcome as
    /// `fetch` or `error`. This model's attributes are never touched.
    pub async fn fetch_all(&self) -> Result<RawResponse> {
        let response = self.sync.fetch_all().await?;
        if response.is_ok() {
            self.events.trigger(FETCH);
        } else {
            warn!(status = response.status, "{}", self.diagnostics.fetch_failed);
            self.events.trigger(ERROR);
        }
        Ok(response)
    }

    /// Sends the current record to the server. The response body is not
    /// merged back.
    pub async fn save(&self) -> Result<RawResponse> {
        let data = self.attributes.borrow().get_all().clone();

        let response = self.sync.save(&data).await?;
        if response.is_ok() {
            self.events.trigger(SAVE);
        } else {
            warn!(status = response.status, "{}", self.diagnostics.save_failed);
            self.events.trigger(ERROR);
        }
        Ok(response)
    }
}

impl<T: Record + fmt::Debug> fmt::Debug for Model<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("attributes", &*self.get_all())
            .finish_non_exhaustive()
    }
}
