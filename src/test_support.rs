//! Scripted HTTP session for unit tests

use crate::crawler::{HttpResponse, HttpSession};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

type Scripted = Result<HttpResponse, FetchError>;

/// Replays canned responses per URL
///
/// Each URL has a queue of outcomes. Outcomes are consumed in order and the
/// last one repeats forever. Unknown URLs answer 404.
#[derive(Default)]
pub(crate) struct ScriptedSession {
    pages: Mutex<HashMap<String, VecDeque<Scripted>>>,
    gets: Mutex<Vec<String>>,
    posts: Mutex<Vec<(String, Vec<(String, String)>)>>,
    login: Mutex<Option<(u16, Option<(String, String)>)>>,
    cookies: Mutex<Vec<(String, String)>>,
    get_delay: Option<Duration>,
    panic_urls: Vec<String>,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn response(url: &Url, status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            final_url: url.clone(),
            headers: HeaderMap::new(),
            body: body.to_string(),
        }
    }

    fn push(self, url: &str, outcome: Scripted) -> Self {
        self.pages
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(outcome);
        self
    }

    pub fn page(self, url: &str, status: u16, body: &str) -> Self {
        let response = Self::response(&Url::parse(url).unwrap(), status, body);
        self.push(url, Ok(response))
    }

    pub fn redirect(self, url: &str, final_url: &str, status: u16, body: &str) -> Self {
        let response = Self::response(&Url::parse(final_url).unwrap(), status, body);
        self.push(url, Ok(response))
    }

    pub fn fail(self, url: &str, error: FetchError) -> Self {
        self.push(url, Err(error))
    }

    /// What every POST answers, optionally setting a cookie on success
    pub fn login_response(self, status: u16, cookie: Option<(&str, &str)>) -> Self {
        *self.login.lock().unwrap() =
            Some((status, cookie.map(|(n, v)| (n.to_string(), v.to_string()))));
        self
    }

    /// Makes every GET take this long
    pub fn slow(mut self, delay: Duration) -> Self {
        self.get_delay = Some(delay);
        self
    }

    /// Makes every GET of this URL panic
    pub fn panic_on(mut self, url: &str) -> Self {
        self.panic_urls.push(url.to_string());
        self
    }

    pub fn get_count(&self, url: &str) -> usize {
        self.gets.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }

    pub fn posts(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpSession for ScriptedSession {
    async fn get(&self, url: &Url, _timeout: Duration) -> Result<HttpResponse, FetchError> {
        self.gets.lock().unwrap().push(url.to_string());
        if self.panic_urls.iter().any(|u| u == url.as_str()) {
            panic!("scripted panic for {}", url);
        }
        if let Some(delay) = self.get_delay {
            tokio::time::sleep(delay).await;
        }

        let mut pages = self.pages.lock().unwrap();
        match pages.get_mut(url.as_str()) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => Ok(Self::response(url, 404, "")),
        }
    }

    async fn post_form(
        &self,
        url: &Url,
        form: &[(String, String)],
        _headers: HeaderMap,
        _timeout: Duration,
    ) -> Result<HttpResponse, FetchError> {
        self.posts
            .lock()
            .unwrap()
            .push((url.to_string(), form.to_vec()));

        let (status, cookie) = self
            .login
            .lock()
            .unwrap()
            .clone()
            .unwrap_or((404, None));
        if let Some(cookie) = cookie {
            let mut cookies = self.cookies.lock().unwrap();
            cookies.retain(|(name, _)| *name != cookie.0);
            cookies.push(cookie);
        }

        Ok(Self::response(url, status, ""))
    }

    fn cookies(&self, _url: &Url) -> Vec<(String, String)> {
        self.cookies.lock().unwrap().clone()
    }
}
