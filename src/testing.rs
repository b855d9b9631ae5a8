//! In-memory [`Transport`] for driving the resolver without a network.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::util::{HttpResponse, Transport, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
    pub follow_redirects: bool,
}

impl RecordedRequest {
    pub fn query_value(&self, key: &str) -> Option<&str> {
        lookup(&self.query, key)
    }

    pub fn form_value(&self, key: &str) -> Option<&str> {
        lookup(&self.form, key)
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

enum Scripted {
    Respond(HttpResponse),
    Timeout,
}

/// Responses are queued per method and URL (query excluded) and served in
/// order. Unscripted requests get a 404.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, method: Method, url: &str, status: u16, body: &str) -> Self {
        self.script(
            method,
            url,
            Scripted::Respond(HttpResponse {
                status,
                url: url.to_string(),
                body: body.to_string(),
            }),
        )
    }

    pub fn timeout(self, method: Method, url: &str) -> Self {
        self.script(method, url, Scripted::Timeout)
    }

    fn script(self, method: Method, url: &str, scripted: Scripted) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, url.to_string()))
            .or_default()
            .push_back(scripted);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, url: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url == url)
            .collect()
    }

    fn respond(&self, request: RecordedRequest) -> Result<HttpResponse, TransportError> {
        let key = (request.method, request.url.clone());
        self.requests.lock().unwrap().push(request);

        let scripted = self
            .routes
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(|queue| queue.pop_front());

        match scripted {
            Some(Scripted::Respond(resp)) => Ok(resp),
            Some(Scripted::Timeout) => Err(TransportError::Timeout { url: key.1 }),
            None => Ok(HttpResponse {
                status: 404,
                url: key.1,
                body: String::new(),
            }),
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        self.respond(RecordedRequest {
            method: Method::Get,
            url: url.to_string(),
            query: owned(query),
            form: Vec::new(),
            follow_redirects: true,
        })
    }

    async fn post_form(
        &self,
        url: &str,
        query: &[(&str, &str)],
        form: &[(&str, &str)],
        follow_redirects: bool,
    ) -> Result<HttpResponse, TransportError> {
        self.respond(RecordedRequest {
            method: Method::Post,
            url: url.to_string(),
            query: owned(query),
            form: owned(form),
            follow_redirects,
        })
    }
}
