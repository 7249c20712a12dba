//! Mock transport for testing

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use super::transport::{Method, Payload, Reply, Transport};
use crate::error::{PathikError, Result};

/// Request seen by [`MockTransport`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub endpoint: String,
    pub payload: Payload,
    pub timeout: Duration,
}

/// Scripted transport for unit testing.
///
/// Replies are queued per endpoint and consumed in order; once a queue is
/// empty the endpoint's default reply is used, or a connection error if none
/// is set. Clones share scripts and the request log.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Default)]
struct MockTransportInner {
    queued: HashMap<String, VecDeque<Option<Reply>>>,
    defaults: HashMap<String, Reply>,
    requests: Vec<RecordedRequest>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next request to `endpoint`
    pub fn push_reply(&self, endpoint: &str, status: u16, body: &str) {
        self.inner
            .lock()
            .queued
            .entry(endpoint.to_string())
            .or_default()
            .push_back(Some(Reply {
                status,
                body: body.to_string(),
            }));
    }

    /// Queue a transport failure for the next request to `endpoint`
    pub fn push_error(&self, endpoint: &str) {
        self.inner
            .lock()
            .queued
            .entry(endpoint.to_string())
            .or_default()
            .push_back(None);
    }

    /// Reply used once the queue for `endpoint` is drained
    pub fn set_default(&self, endpoint: &str, status: u16, body: &str) {
        self.inner.lock().defaults.insert(
            endpoint.to_string(),
            Reply {
                status,
                body: body.to_string(),
            },
        );
    }

    /// Drop the default so `endpoint` fails once its queue is drained
    pub fn clear_default(&self, endpoint: &str) {
        self.inner.lock().defaults.remove(endpoint);
    }

    /// All requests made so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.inner.lock().requests.len()
    }

    /// Requests made to `endpoint`
    pub fn count_for(&self, endpoint: &str) -> usize {
        self.inner
            .lock()
            .requests
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .count()
    }

    /// Most recent request to `endpoint`
    pub fn last_for(&self, endpoint: &str) -> Option<RecordedRequest> {
        self.inner
            .lock()
            .requests
            .iter()
            .rev()
            .find(|r| r.endpoint == endpoint)
            .cloned()
    }
}

impl Transport for MockTransport {
    fn send(
        &mut self,
        method: Method,
        endpoint: &str,
        payload: &Payload,
        timeout: Duration,
    ) -> Result<Reply> {
        let mut inner = self.inner.lock();
        inner.requests.push(RecordedRequest {
            method,
            endpoint: endpoint.to_string(),
            payload: payload.clone(),
            timeout,
        });

        let scripted = inner
            .queued
            .get_mut(endpoint)
            .and_then(|queue| queue.pop_front());
        let reply = match scripted {
            Some(reply) => reply,
            None => inner.defaults.get(endpoint).cloned(),
        };

        reply.ok_or_else(|| {
            PathikError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("no scripted reply for {} {}", method, endpoint),
            ))
        })
    }
}
