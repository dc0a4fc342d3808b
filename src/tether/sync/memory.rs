use super::{RawResponse, SyncPort};
use crate::attributes::Record;
use crate::error::{Result, TetherError};
use async_trait::async_trait;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::marker::PhantomData;

/// One request as the in-memory server received it.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncCall {
    Fetch(u64),
    FetchAll,
    Create(Value),
    Update(u64, Value),
}

#[derive(Debug)]
enum Scripted {
    Respond(RawResponse),
    Disconnect,
}

/// In-memory [`SyncPort`] for testing and development.
/// Does NOT persist data.
///
/// Behaves like a small REST server: creates get the next id, updates replace
/// the stored record, unknown ids answer 404. Every call is recorded, and the
/// next call's outcome can be scripted with [`respond_next`](Self::respond_next),
/// [`fail_next`](Self::fail_next) or [`disconnect_next`](Self::disconnect_next).
pub struct InMemorySync<T> {
    records: RefCell<BTreeMap<u64, Value>>,
    next_id: Cell<u64>,
    calls: RefCell<Vec<SyncCall>>,
    script: RefCell<VecDeque<Scripted>>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Default for InMemorySync<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> InMemorySync<T> {
    pub fn new() -> Self {
        Self {
            records: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(1),
            calls: RefCell::new(Vec::new()),
            script: RefCell::new(VecDeque::new()),
            _record: PhantomData,
        }
    }

    /// Stores `record` directly, bypassing the call log. Returns its id.
    pub fn insert(&self, record: &T) -> Result<u64> {
        let value = serde_json::to_value(record)?;
        Ok(self.store(record.id(), value))
    }

    /// Stored records, in id order.
    pub fn records(&self) -> Vec<T> {
        self.records
            .borrow()
            .values()
            .filter_map(|value| serde_json::from_value(value.clone()).ok())
            .collect()
    }

    pub fn get(&self, id: u64) -> Option<T> {
        let records = self.records.borrow();
        let value = records.get(&id)?;
        serde_json::from_value(value.clone()).ok()
    }

    pub fn calls(&self) -> Vec<SyncCall> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Answers the next call with `response` instead of serving it.
    pub fn respond_next(&self, response: RawResponse) {
        self.script
            .borrow_mut()
            .push_back(Scripted::Respond(response));
    }

    /// Answers the next call with `status` and an empty body.
    pub fn fail_next(&self, status: u16) {
        self.respond_next(RawResponse::new(status, ""));
    }

    /// Makes the next call fail at the transport level.
    pub fn disconnect_next(&self) {
        self.script.borrow_mut().push_back(Scripted::Disconnect);
    }

    fn store(&self, id: Option<u64>, mut value: Value) -> u64 {
        let id = id.unwrap_or_else(|| self.next_id.get());
        self.next_id.set(self.next_id.get().max(id + 1));
        if let Value::Object(map) = &mut value {
            map.insert("id".to_string(), Value::from(id));
        }
        self.records.borrow_mut().insert(id, value);
        id
    }

    fn serve(&self, call: SyncCall) -> Result<RawResponse> {
        self.calls.borrow_mut().push(call.clone());

        let scripted = self.script.borrow_mut().pop_front();
        match scripted {
            Some(Scripted::Respond(response)) => return Ok(response),
            Some(Scripted::Disconnect) => {
                return Err(TetherError::Transport("connection refused".to_string()))
            }
            None => {}
        }

        let response = match call {
            SyncCall::Fetch(id) => match self.records.borrow().get(&id) {
                Some(value) => RawResponse::new(200, value.to_string()),
                None => not_found(),
            },
            SyncCall::FetchAll => {
                let all: Vec<Value> = self.records.borrow().values().cloned().collect();
                RawResponse::new(200, serde_json::to_string(&all)?)
            }
            SyncCall::Create(value) => {
                let id = self.store(None, value);
                created(self.records.borrow().get(&id))
            }
            SyncCall::Update(id, value) => {
                if !self.records.borrow().contains_key(&id) {
                    return Ok(not_found());
                }
                self.store(Some(id), value);
                match self.records.borrow().get(&id) {
                    Some(stored) => RawResponse::new(200, stored.to_string()),
                    None => not_found(),
                }
            }
        };
        Ok(response)
    }
}

fn not_found() -> RawResponse {
    RawResponse::new(404, r#"{"error":"Not Found"}"#)
}

fn created(value: Option<&Value>) -> RawResponse {
    match value {
        Some(value) => RawResponse::new(201, value.to_string()),
        None => not_found(),
    }
}

#[async_trait(?Send)]
impl<T: Record> SyncPort<T> for InMemorySync<T> {
    async fn fetch(&self, id: u64) -> Result<RawResponse> {
        self.serve(SyncCall::Fetch(id))
    }

    async fn fetch_all(&self) -> Result<RawResponse> {
        self.serve(SyncCall::FetchAll)
    }

    async fn save(&self, data: &T) -> Result<RawResponse> {
        let value = serde_json::to_value(data)?;
        let call = match data.id() {
            Some(id) => SyncCall::Update(id, value),
            None => SyncCall::Create(value),
        };
        self.serve(call)
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::rc::Rc;

    /// A small record type for exercising models, collections and views.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct User {
        pub id: Option<u64>,
        pub name: Option<String>,
        pub email: Option<String>,
    }

    impl User {
        pub fn named(name: &str) -> Self {
            Self {
                name: Some(name.to_string()),
                email: Some(format!("{}@example.com", name.to_lowercase())),
                ..Self::default()
            }
        }
    }

    impl Record for User {
        fn id(&self) -> Option<u64> {
            self.id
        }
    }

    pub struct SyncFixture {
        pub sync: Rc<InMemorySync<User>>,
    }

    impl Default for SyncFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl SyncFixture {
        pub fn new() -> Self {
            Self {
                sync: Rc::new(InMemorySync::new()),
            }
        }

        pub fn with_users(self, count: usize) -> Self {
            for i in 0..count {
                let user = User::named(&format!("User{}", i + 1));
                self.sync.insert(&user).unwrap();
            }
            self
        }

        pub fn with_user(self, name: &str) -> Self {
            self.sync.insert(&User::named(name)).unwrap();
            self
        }
    }
}
