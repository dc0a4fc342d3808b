//! # Collections
//!
//! An ordered, growing list of models fed by bulk fetches. Raw records come
//! back from [`SyncPort::fetch_all`] and go through an injected deserializer,
//! usually a function wrapping each record in an `Rc<Model<T>>`.
//!
//! [`Collection::fetch`] appends. It never replaces or de-duplicates, so
//! fetching the same resource twice holds every record twice.

use crate::attributes::Record;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::events::{Callback, Eventing, Events, ListenerId, ERROR, FETCH};
use crate::sync::api::ApiSync;
use crate::sync::{RawResponse, SyncPort};
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use tracing::warn;

pub struct Collection<T: Record, M> {
    models: RefCell<Vec<M>>,
    events: Rc<dyn Eventing>,
    sync: Rc<dyn SyncPort<T>>,
    deserialize: Box<dyn Fn(T) -> M>,
    diagnostics: Rc<Diagnostics>,
}

impl<T: Record, M> Collection<T, M> {
    pub fn new(
        events: Rc<dyn Eventing>,
        sync: Rc<dyn SyncPort<T>>,
        deserialize: impl Fn(T) -> M + 'static,
    ) -> Self {
        Self {
            models: RefCell::new(Vec::new()),
            events,
            sync,
            deserialize: Box::new(deserialize),
            diagnostics: Rc::new(Diagnostics::default()),
        }
    }

    /// A collection over HTTP for the resource collection at `base_url`.
    ///
    /// ```rust,no_run
    /// # use tether::collection::Collection;
    /// # use tether::model::Model;
    /// # use serde_json::{Map, Value};
    /// # use std::rc::Rc;
    /// let users = Collection::from_api(
    ///     |user: Map<String, Value>| Rc::new(Model::from_api(user, "http://localhost:3000/users")),
    ///     "http://localhost:3000/users",
    /// );
    /// assert!(users.is_empty());
    /// ```
    pub fn from_api(deserialize: impl Fn(T) -> M + 'static, base_url: &str) -> Self {
        Self::with_sync(deserialize, Rc::new(ApiSync::<T>::new(base_url)))
    }

    pub fn with_sync(deserialize: impl Fn(T) -> M + 'static, sync: Rc<dyn SyncPort<T>>) -> Self {
        Self::new(Rc::new(Events::new()), sync, deserialize)
    }

    pub fn with_diagnostics(mut self, diagnostics: Rc<Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// The held models, borrowed. Do not hold across a [`fetch`](Self::fetch).
    pub fn models(&self) -> Ref<'_, [M]> {
        Ref::map(self.models.borrow(), Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.models.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.borrow().is_empty()
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

    /// Fetches every record and appends them, in response order, then
    /// triggers `fetch`. A failing status leaves the list unchanged and
    /// triggers `error`.
    pub async fn fetch(&self) -> Result<RawResponse> {
        let response = self.sync.fetch_all().await?;
        if !response.is_ok() {
            warn!(status = response.status, "{}", self.diagnostics.fetch_failed);
            self.events.trigger(ERROR);
            return Ok(response);
        }

        let records: Vec<T> = response.json()?;
        let fetched: Vec<M> = records
            .into_iter()
            .map(|record| (self.deserialize)(record))
            .collect();
        self.models.borrow_mut().extend(fetched);

        self.events.trigger(FETCH);
        Ok(response)
    }
}

impl<T: Record, M: Clone> Collection<T, M> {
    /// A copy of the current list, unaffected by later fetches.
    pub fn snapshot(&self) -> Vec<M> {
        self.models.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TetherError;
    use crate::model::Model;
    use crate::sync::memory::fixtures::{SyncFixture, User};
    use crate::sync::memory::InMemorySync;
    use tracing_test::traced_test;

    type Users = Collection<User, Rc<Model<User>>>;

    fn users_over(sync: &Rc<InMemorySync<User>>) -> Users {
        let port = sync.clone();
        Collection::with_sync(
            move |user: User| Rc::new(Model::with_sync(user, port.clone())),
            sync.clone(),
        )
    }

    fn names(users: &Users) -> Vec<String> {
        users
            .models()
            .iter()
            .filter_map(|model| model.get(|u| &u.name))
            .collect()
    }

    fn one_user(name: &str) -> RawResponse {
        RawResponse::new(200, format!(r#"[{{"name":"{}"}}]"#, name))
    }

    #[tokio::test]
    async fn fetch_deserializes_in_response_order() {
        let fixture = SyncFixture::new().with_users(3);
        let users = users_over(&fixture.sync);
        let fetched = Rc::new(RefCell::new(0));
        let sink = fetched.clone();
        users.on(FETCH, Rc::new(move || *sink.borrow_mut() += 1));

        users.fetch().await.unwrap();

        assert_eq!(names(&users), vec!["User1", "User2", "User3"]);
        assert_eq!(*fetched.borrow(), 1);
    }

    #[tokio::test]
    async fn repeated_fetches_append() {
        let sync = Rc::new(InMemorySync::new());
        sync.respond_next(one_user("First"));
        sync.respond_next(one_user("Second"));
        let users = users_over(&sync);

        users.fetch().await.unwrap();
        users.fetch().await.unwrap();

        assert_eq!(names(&users), vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn same_records_twice_are_held_twice() {
        let fixture = SyncFixture::new().with_user("Ada");
        let users = users_over(&fixture.sync);

        users.fetch().await.unwrap();
        users.fetch().await.unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users.models()[0].get(|u| &u.id), Some(1));
        assert_eq!(users.models()[1].get(|u| &u.id), Some(1));
    }

    #[tokio::test]
    #[traced_test]
    async fn failed_fetch_keeps_list_and_fires_error() {
        let fixture = SyncFixture::new().with_users(2);
        let users = users_over(&fixture.sync);
        users.fetch().await.unwrap();

        let errors = Rc::new(RefCell::new(0));
        let sink = errors.clone();
        users.on(ERROR, Rc::new(move || *sink.borrow_mut() += 1));
        fixture.sync.fail_next(500);

        let response = users.fetch().await.unwrap();

        assert_eq!(response.status, 500);
        assert_eq!(users.len(), 2);
        assert_eq!(*errors.borrow(), 1);
        assert!(logs_contain("Data could not be fetched!"));
    }

    #[tokio::test]
    async fn undecodable_body_leaves_list_unchanged() {
        let sync = Rc::new(InMemorySync::new());
        sync.respond_next(RawResponse::new(200, r#"{"not":"a list"}"#));
        let users = users_over(&sync);

        let result = users.fetch().await;

        assert!(matches!(result, Err(TetherError::Serialization(_))));
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn snapshot_is_detached_from_later_fetches() {
        let fixture = SyncFixture::new().with_user("Ada");
        let users = users_over(&fixture.sync);
        users.fetch().await.unwrap();

        let snapshot = users.snapshot();
        users.fetch().await.unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(users.len(), 2);
        assert!(Rc::ptr_eq(&snapshot[0], &users.models()[0]));
    }

    #[tokio::test]
    async fn deserialized_models_share_the_port() {
        let fixture = SyncFixture::new().with_user("Ada");
        let users = users_over(&fixture.sync);
        users.fetch().await.unwrap();

        let ada = users.snapshot().remove(0);
        ada.set(User {
            name: Some("Countess".to_string()),
            ..User::default()
        });
        ada.save().await.unwrap();

        assert_eq!(
            fixture.sync.get(1).unwrap().name.as_deref(),
            Some("Countess")
        );
    }
}
