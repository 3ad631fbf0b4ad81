use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::gateway::{DirectoryGateway, Request};
use crate::types::Result;

/// Scripted answer of the mock gateway
#[derive(Debug, Clone)]
pub enum MockReply {
    /// 2xx with a JSON body
    Json(Value),
    /// Non-success HTTP status
    Status(u16, String),
    /// Transport failure, no response at all
    Unreachable,
}

impl MockReply {
    fn into_result(self) -> Result<Value> {
        match self {
            MockReply::Json(value) => Ok(value),
            MockReply::Status(status, message) => Err(Error::Gateway { status, message }),
            MockReply::Unreachable => Err(Error::HttpClient("connection refused".to_string())),
        }
    }
}

/// In-process gateway for testing.
///
/// Records every envelope it receives. Replies are scripted per verb and
/// consumed in order; the last reply for a verb keeps being returned. Verbs
/// without a script answer with an empty object.
#[derive(Default)]
pub struct MockGateway {
    requests: Mutex<Vec<Request>>,
    replies: Mutex<HashMap<&'static str, VecDeque<MockReply>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `verb`
    pub fn reply(self, verb: &'static str, reply: MockReply) -> Self {
        self.push(verb, reply);
        self
    }

    /// Queue a JSON reply for `verb`
    pub fn reply_json(self, verb: &'static str, body: Value) -> Self {
        self.reply(verb, MockReply::Json(body))
    }

    /// Queue a reply on a shared mock
    pub fn push(&self, verb: &'static str, reply: MockReply) {
        let mut replies = self.replies.lock().unwrap_or_else(|e| e.into_inner());
        replies.entry(verb).or_default().push_back(reply);
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Requests received for one verb
    pub fn requests_for(&self, verb: &str) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.verb() == verb)
            .collect()
    }

    /// Number of requests received
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn next_reply(&self, verb: &'static str) -> MockReply {
        let mut replies = self.replies.lock().unwrap_or_else(|e| e.into_inner());
        match replies.get_mut(verb) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(MockReply::Unreachable),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| MockReply::Json(Value::Object(Default::default()))),
            None => MockReply::Json(Value::Object(Default::default())),
        }
    }
}

#[async_trait]
impl DirectoryGateway for MockGateway {
    async fn dispatch(&self, request: Request) -> Result<Value> {
        let verb = request.verb();
        debug!("Mock gateway: {}", verb);

        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        self.next_reply(verb).into_result()
    }
}
