use std::cell::Cell;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};

use crate::config::EngineConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// The retrieval collaborator: one synchronous, bounded-timeout GET, no retries.
pub trait Fetch {
    fn fetch(&self, url: &str) -> anyhow::Result<FetchResponse>;
}

impl<F: Fetch + ?Sized> Fetch for &F {
    fn fetch(&self, url: &str) -> anyhow::Result<FetchResponse> {
        (**self).fetch(url)
    }
}

/// Fetch `url` and return its body only on HTTP 200.
///
/// Transport errors and non-200 statuses are logged and collapse into `None`;
/// callers treat that as "does not exist or unreachable".
pub fn fetch_ok(fetcher: &dyn Fetch, url: &str) -> Option<String> {
    match fetcher.fetch(url) {
        Ok(response) if response.is_ok() => Some(response.body),
        Ok(response) => {
            tracing::debug!(%url, status = response.status, "fetch miss");
            None
        }
        Err(err) => {
            tracing::debug!(%url, err = %format!("{err:#}"), "fetch failed");
            None
        }
    }
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(config: &EngineConfig) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
        })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> anyhow::Result<FetchResponse> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8",
            )
            .header(ACCEPT_LANGUAGE, "zh-CN,zh;q=0.9,en;q=0.8")
            .send()
            .with_context(|| format!("GET {url}"))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .with_context(|| format!("read body: {url}"))?;
        Ok(FetchResponse { status, body })
    }
}

/// Spaces consecutive requests at least `delay` apart.
pub struct Paced<F> {
    inner: F,
    delay: Duration,
    last: Cell<Option<Instant>>,
}

impl<F> Paced<F> {
    pub fn new(inner: F, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            last: Cell::new(None),
        }
    }
}

impl<F: Fetch> Fetch for Paced<F> {
    fn fetch(&self, url: &str) -> anyhow::Result<FetchResponse> {
        if let Some(last) = self.last.get() {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                std::thread::sleep(self.delay - elapsed);
            }
        }
        let result = self.inner.fetch(url);
        self.last.set(Some(Instant::now()));
        result
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::{Fetch, FetchResponse};

    /// In-memory site: unknown URLs answer 404. Records every requested URL.
    #[derive(Default)]
    pub struct MapFetcher {
        pages: HashMap<String, String>,
        pub requests: RefCell<Vec<String>>,
    }

    impl MapFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_owned(), body.to_owned());
            self
        }

        pub fn requested(&self, url: &str) -> bool {
            self.requests.borrow().iter().any(|u| u == url)
        }
    }

    impl Fetch for MapFetcher {
        fn fetch(&self, url: &str) -> anyhow::Result<FetchResponse> {
            self.requests.borrow_mut().push(url.to_owned());
            Ok(match self.pages.get(url) {
                Some(body) => FetchResponse {
                    status: 200,
                    body: body.clone(),
                },
                None => FetchResponse {
                    status: 404,
                    body: "not found".to_owned(),
                },
            })
        }
    }
}
