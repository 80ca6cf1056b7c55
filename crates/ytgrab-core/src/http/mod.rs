//! Shared HTTP client.
//!
//! Wraps a pool of idle libcurl `Easy` handles. A handle that is returned to the
//! pool keeps its connection cache, so sequential or concurrent downloads from
//! the same host reuse connections. The host owns the client (usually in an
//! `Arc`) and drops it at shutdown; there is no global instance.

mod response;

pub use response::ResponseHead;

use std::ops::{Deref, DerefMut};
use std::sync::Mutex;
use std::time::Duration;

/// Idle handles kept when none is configured explicitly.
const DEFAULT_MAX_IDLE: usize = 8;

/// libcurl options applied to every handle checked out of the pool.
#[derive(Debug, Clone)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Abort if throughput drops below this many bytes/s for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    /// Hard timeout so a completely stuck transfer eventually fails.
    pub timeout: Duration,
    pub max_redirections: u32,
    pub user_agent: Option<String>,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            timeout: Duration::from_secs(3600),
            max_redirections: 10,
            user_agent: None,
        }
    }
}

/// Process-wide HTTP client: options plus a pool of reusable easy handles.
pub struct HttpClient {
    options: CurlOptions,
    idle: Mutex<Vec<curl::easy::Easy>>,
    max_idle: usize,
}

impl HttpClient {
    pub fn new(options: CurlOptions) -> Self {
        Self::with_max_idle(options, DEFAULT_MAX_IDLE)
    }

    /// Like `new` but caps how many idle handles are retained.
    pub fn with_max_idle(options: CurlOptions, max_idle: usize) -> Self {
        Self {
            options,
            idle: Mutex::new(Vec::new()),
            max_idle,
        }
    }

    pub fn options(&self) -> &CurlOptions {
        &self.options
    }

    /// Number of handles currently parked in the pool.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Take a handle configured for a GET of `url`. The handle goes back to the
    /// pool when the returned guard drops.
    pub fn checkout(&self, url: &str) -> Result<PooledEasy<'_>, curl::Error> {
        let reused = self.idle.lock().unwrap_or_else(|e| e.into_inner()).pop();
        let mut easy = match reused {
            Some(mut easy) => {
                easy.reset();
                easy
            }
            None => curl::easy::Easy::new(),
        };
        self.configure(&mut easy, url)?;
        Ok(PooledEasy {
            easy: Some(easy),
            client: self,
        })
    }

    fn configure(&self, easy: &mut curl::easy::Easy, url: &str) -> Result<(), curl::Error> {
        let opts = &self.options;
        easy.url(url)?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.max_redirections(opts.max_redirections)?;
        // Non-2xx responses fail the transfer before any body reaches the write callback.
        easy.fail_on_error(true)?;
        easy.connect_timeout(opts.connect_timeout)?;
        easy.low_speed_limit(opts.low_speed_limit)?;
        easy.low_speed_time(opts.low_speed_time)?;
        easy.timeout(opts.timeout)?;
        if let Some(ua) = &opts.user_agent {
            easy.useragent(ua)?;
        }
        Ok(())
    }

    fn give_back(&self, easy: curl::easy::Easy) {
        let mut idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
        if idle.len() < self.max_idle {
            idle.push(easy);
        }
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(CurlOptions::default())
    }
}

/// An easy handle borrowed from an `HttpClient`; returned to the pool on drop.
pub struct PooledEasy<'a> {
    easy: Option<curl::easy::Easy>,
    client: &'a HttpClient,
}

impl Deref for PooledEasy<'_> {
    type Target = curl::easy::Easy;

    fn deref(&self) -> &Self::Target {
        self.easy.as_ref().expect("handle present until drop")
    }
}

impl DerefMut for PooledEasy<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.easy.as_mut().expect("handle present until drop")
    }
}

impl Drop for PooledEasy<'_> {
    fn drop(&mut self) {
        if let Some(easy) = self.easy.take() {
            self.client.give_back(easy);
        }
    }
}
