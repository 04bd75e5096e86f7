use crate::cache::ResponseCache;
use crate::error::{Result, SessionError};
use crate::fetcher::{
    detect_block_markers, extract_origin, ChromeFetcher, HttpFetcher, PageFetcher, RenderMode,
};
use crate::identity::BrowserIdentity;
use jobhound_core::{CacheConfig, SessionConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

/// Lifecycle state of an origin session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Serving requests under its current identity
    Active,
    /// Budget exhausted; replaced by a fresh identity on next access
    Cooling,
    /// Origin refused us; replaced by a fresh identity on next access
    Blocked,
}

/// A heavyweight fetch context bound to one origin session.
///
/// Holding one consumes a global fetch slot; the slot is returned when
/// the context is dropped. `in_flight` is cloned for the duration of
/// each fetch so the sweep never tears down a context mid-request.
struct FetchContext {
    fetcher: Arc<dyn PageFetcher>,
    mode: RenderMode,
    in_flight: Arc<()>,
    gate: Arc<tokio::sync::Mutex<()>>,
    last_used: Instant,
    _permit: OwnedSemaphorePermit,
}

/// Live handle into an origin's fetch context.
///
/// `_in_flight` keeps the sweep from tearing the context down
/// mid-request. `gate` is held across browser-mode fetches: each one
/// runs its own headless process, so a context serves them one at a
/// time.
struct ContextHandle {
    fetcher: Arc<dyn PageFetcher>,
    gate: Arc<tokio::sync::Mutex<()>>,
    _in_flight: Arc<()>,
}

struct OriginSession {
    identity: BrowserIdentity,
    state: SessionState,
    request_count: u32,
    last_used: Instant,
    context: Option<FetchContext>,
}

impl OriginSession {
    fn new(identity: BrowserIdentity) -> Self {
        Self {
            identity,
            state: SessionState::Active,
            request_count: 0,
            last_used: Instant::now(),
            context: None,
        }
    }
}

/// Snapshot of one origin session for observability.
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub origin: String,
    pub state: SessionState,
    pub request_count: u32,
    pub user_agent: String,
    pub has_context: bool,
}

/// Totals from one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub cache_evicted: usize,
    pub contexts_released: usize,
    pub sessions_closed: usize,
}

/// Manages per-origin scraping identities, pacing, and fetch contexts.
///
/// Every outbound request flows through here. Each origin gets its own
/// rotating identity with a request budget and adaptive inter-request
/// delays; budget exhaustion, a block, or idling past the cooldown
/// window all swap in a fresh identity on the next access. A global
/// semaphore caps how many heavyweight fetch contexts exist at once,
/// independent of how much concurrency callers use.
pub struct SessionManager {
    config: SessionConfig,
    sessions: Mutex<HashMap<String, OriginSession>>,
    cache: Mutex<ResponseCache>,
    slots: Arc<Semaphore>,
    rng: Mutex<StdRng>,
    http: Arc<dyn PageFetcher>,
    browser: Arc<dyn PageFetcher>,
}

impl SessionManager {
    /// Create a manager with real HTTP and headless-browser fetchers.
    pub fn new(config: SessionConfig, cache: &CacheConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(timeout)?);
        let browser: Arc<dyn PageFetcher> =
            Arc::new(ChromeFetcher::new(timeout, config.headless));
        Ok(Self::with_fetchers(config, cache, http, browser))
    }

    /// Create a manager with caller-supplied fetchers.
    pub fn with_fetchers(
        config: SessionConfig,
        cache: &CacheConfig,
        http: Arc<dyn PageFetcher>,
        browser: Arc<dyn PageFetcher>,
    ) -> Self {
        let slots = Arc::new(Semaphore::new(config.max_fetch_contexts.max(1)));
        let ttl = Duration::from_secs(cache.ttl_secs);
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
            cache: Mutex::new(ResponseCache::new(ttl)),
            slots,
            rng: Mutex::new(StdRng::from_entropy()),
            http,
            browser,
        }
    }

    /// Replace the identity/jitter RNG with a seeded one.
    #[must_use]
    pub fn with_seeded_rng(self, seed: u64) -> Self {
        *self.rng.lock().expect("acquire rng lock") = StdRng::seed_from_u64(seed);
        self
    }

    /// Get the identity for an origin, creating or rotating the session
    /// as needed.
    ///
    /// A session that is cooling, blocked, or has sat idle longer than
    /// the cooldown window is replaced in place with a fresh identity.
    /// Rotation never waits; the cooldown only sets how long a spent
    /// identity lingers before an idle session is considered expired.
    pub fn session(&self, origin: &str) -> BrowserIdentity {
        let mut sessions = self.sessions.lock().expect("acquire sessions lock");
        let session = sessions
            .entry(origin.to_string())
            .or_insert_with(|| OriginSession::new(self.next_identity()));

        let idle_expired =
            session.request_count > 0 && session.last_used.elapsed() > self.cooldown();
        if session.state != SessionState::Active || idle_expired {
            let was_blocked = session.state == SessionState::Blocked;
            session.identity = self.next_identity();
            session.state = SessionState::Active;
            session.request_count = 0;
            session.last_used = Instant::now();
            if was_blocked {
                // Blocked contexts are tainted along with the identity
                session.context = None;
            }
            tracing::info!("Rotated session identity for {}", origin);
        }
        session.identity.clone()
    }

    /// Record the outcome of a request against an origin's budget.
    ///
    /// A blocking outcome marks the session for immediate rotation;
    /// otherwise the session is marked once its request budget is
    /// spent. The next `session` call performs the rotation.
    pub fn record_outcome(&self, origin: &str, blocked: bool) {
        let mut sessions = self.sessions.lock().expect("acquire sessions lock");
        let session = sessions
            .entry(origin.to_string())
            .or_insert_with(|| OriginSession::new(self.next_identity()));

        session.request_count += 1;
        session.last_used = Instant::now();

        if blocked {
            tracing::warn!(
                "Origin {} blocked us after {} requests, rotating identity",
                origin,
                session.request_count
            );
            session.state = SessionState::Blocked;
            session.context = None;
        } else if session.request_count >= self.config.request_budget
            && session.state == SessionState::Active
        {
            tracing::debug!(
                "Session budget spent for {} ({} requests), scheduling rotation",
                origin,
                session.request_count
            );
            session.state = SessionState::Cooling;
        }
    }

    /// Compute the adaptive inter-request delay for an origin.
    ///
    /// The delay grows with the session's request count, capped at four
    /// times the base, then jittered by a uniform factor in [0.5, 1.5).
    pub fn delay_for(&self, origin: &str) -> Duration {
        let count = {
            let sessions = self.sessions.lock().expect("acquire sessions lock");
            sessions.get(origin).map_or(0, |s| s.request_count)
        };
        let jitter = self
            .rng
            .lock()
            .expect("acquire rng lock")
            .gen_range(0.5..1.5);
        adaptive_delay(self.config.base_delay_ms, count, jitter)
    }

    /// Sleep for the adaptive delay of an origin.
    pub async fn pause(&self, origin: &str) {
        let delay = self.delay_for(origin);
        tracing::trace!("Pausing {:?} before request to {}", delay, origin);
        tokio::time::sleep(delay).await;
    }

    /// Look up a cached response body for a URL.
    pub fn cached_fetch(&self, url: &str) -> Option<String> {
        self.cache.lock().expect("acquire cache lock").get(url)
    }

    /// Cache a response body for a URL.
    pub fn cache_store(&self, url: &str, body: &str) {
        self.cache
            .lock()
            .expect("acquire cache lock")
            .store(url, body);
    }

    /// Fetch a URL through its origin's session.
    ///
    /// Serves from cache when possible; otherwise waits out the pacing
    /// delay, fetches through the session's context, classifies the
    /// outcome, and records it against the budget. Responses carrying
    /// anti-bot challenge markers and 403/429 statuses are reported as
    /// [`SessionError::Blocked`].
    pub async fn fetch(&self, url: &str, mode: RenderMode) -> Result<String> {
        if let Some(body) = self.cached_fetch(url) {
            tracing::trace!("Cache hit for {}", url);
            return Ok(body);
        }

        let origin = extract_origin(url)?;
        let identity = self.session(&origin);
        self.pause(&origin).await;

        let ctx = self.context_fetcher(&origin, mode).await?;
        let result = match mode {
            RenderMode::Browser => {
                // Each browser-mode fetch runs its own headless process;
                // the gate keeps a context to one at a time so the slot
                // cap bounds live processes, not just contexts.
                let _serial = ctx.gate.lock().await;
                ctx.fetcher.fetch(url, &identity).await
            }
            RenderMode::Http => ctx.fetcher.fetch(url, &identity).await,
        };
        match result {
            Ok(html) => {
                if let Some(marker) = detect_block_markers(&html) {
                    self.record_outcome(&origin, true);
                    return Err(SessionError::Blocked {
                        origin,
                        reason: format!("challenge marker '{marker}' in response"),
                    });
                }
                self.record_outcome(&origin, false);
                self.cache_store(url, &html);
                Ok(html)
            }
            Err(e) if e.is_blocking() => {
                self.record_outcome(&origin, true);
                match e {
                    SessionError::Status { status, .. } => Err(SessionError::Blocked {
                        origin,
                        reason: format!("HTTP {status}"),
                    }),
                    other => Err(other),
                }
            }
            Err(e) => {
                self.record_outcome(&origin, false);
                Err(e)
            }
        }
    }

    /// Run one sweep pass: evict expired cache entries, release idle
    /// fetch contexts, and close long-idle sessions.
    ///
    /// Contexts with an in-flight request are never released.
    pub fn sweep(&self) -> SweepReport {
        let mut report = SweepReport {
            cache_evicted: self
                .cache
                .lock()
                .expect("acquire cache lock")
                .sweep_expired(),
            ..SweepReport::default()
        };

        let idle_after = Duration::from_secs(self.config.context_idle_secs);
        let mut sessions = self.sessions.lock().expect("acquire sessions lock");

        for session in sessions.values_mut() {
            let release = session.context.as_ref().is_some_and(|ctx| {
                ctx.last_used.elapsed() > idle_after && Arc::strong_count(&ctx.in_flight) == 1
            });
            if release {
                session.context = None;
                report.contexts_released += 1;
            }
        }

        let before = sessions.len();
        sessions
            .retain(|_, s| s.context.is_some() || s.last_used.elapsed() <= idle_after);
        report.sessions_closed = before - sessions.len();

        if report != SweepReport::default() {
            tracing::debug!(
                "Sweep evicted {} cache entries, released {} contexts, closed {} sessions",
                report.cache_evicted,
                report.contexts_released,
                report.sessions_closed
            );
        }
        report
    }

    /// Snapshot all live sessions.
    pub fn session_stats(&self) -> Vec<SessionStats> {
        let sessions = self.sessions.lock().expect("acquire sessions lock");
        sessions
            .iter()
            .map(|(origin, s)| SessionStats {
                origin: origin.clone(),
                state: s.state,
                request_count: s.request_count,
                user_agent: s.identity.user_agent.clone(),
                has_context: s.context.is_some(),
            })
            .collect()
    }

    /// Shut the manager down: fail pending slot waits and drop all
    /// sessions and cached responses.
    pub fn shutdown(&self) {
        self.slots.close();
        self.sessions
            .lock()
            .expect("acquire sessions lock")
            .clear();
        self.cache.lock().expect("acquire cache lock").clear();
    }

    fn cooldown(&self) -> Duration {
        Duration::from_secs(self.config.cooldown_secs)
    }

    fn next_identity(&self) -> BrowserIdentity {
        BrowserIdentity::randomized_with(&mut *self.rng.lock().expect("acquire rng lock"))
    }

    /// Get a handle to an origin's fetch context, creating the context
    /// if needed. The handle must be held for the duration of the
    /// request.
    async fn context_fetcher(&self, origin: &str, mode: RenderMode) -> Result<ContextHandle> {
        {
            let mut sessions = self.sessions.lock().expect("acquire sessions lock");
            if let Some(session) = sessions.get_mut(origin) {
                match &mut session.context {
                    Some(ctx) if ctx.mode == mode => {
                        ctx.last_used = Instant::now();
                        return Ok(ContextHandle {
                            fetcher: ctx.fetcher.clone(),
                            gate: ctx.gate.clone(),
                            _in_flight: ctx.in_flight.clone(),
                        });
                    }
                    Some(_) => {
                        // Render mode changed, release the old slot first
                        session.context = None;
                    }
                    None => {}
                }
            }
        }

        let permit = match self.slots.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::Closed) => return Err(SessionError::Closed),
            Err(TryAcquireError::NoPermits) => {
                self.release_lru_idle_context();
                self.slots
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| SessionError::Closed)?
            }
        };

        let fetcher = match mode {
            RenderMode::Http => self.http.clone(),
            RenderMode::Browser => self.browser.clone(),
        };

        let mut sessions = self.sessions.lock().expect("acquire sessions lock");
        let session = sessions
            .entry(origin.to_string())
            .or_insert_with(|| OriginSession::new(self.next_identity()));

        // Another caller may have installed a context while we waited
        if let Some(ctx) = &mut session.context {
            if ctx.mode == mode {
                ctx.last_used = Instant::now();
                return Ok(ContextHandle {
                    fetcher: ctx.fetcher.clone(),
                    gate: ctx.gate.clone(),
                    _in_flight: ctx.in_flight.clone(),
                });
            }
        }

        let in_flight = Arc::new(());
        let gate = Arc::new(tokio::sync::Mutex::new(()));
        session.context = Some(FetchContext {
            fetcher: fetcher.clone(),
            mode,
            in_flight: in_flight.clone(),
            gate: gate.clone(),
            last_used: Instant::now(),
            _permit: permit,
        });
        tracing::debug!("Opened {:?} fetch context for {}", mode, origin);
        Ok(ContextHandle {
            fetcher,
            gate,
            _in_flight: in_flight,
        })
    }

    /// Release the least-recently-used idle context to free a slot.
    fn release_lru_idle_context(&self) {
        let mut sessions = self.sessions.lock().expect("acquire sessions lock");
        let lru = sessions
            .iter_mut()
            .filter(|(_, s)| {
                s.context
                    .as_ref()
                    .is_some_and(|ctx| Arc::strong_count(&ctx.in_flight) == 1)
            })
            .min_by_key(|(_, s)| s.context.as_ref().map(|ctx| ctx.last_used));
        if let Some((origin, session)) = lru {
            tracing::debug!("Releasing idle fetch context for {}", origin);
            session.context = None;
        }
    }
}

/// Adaptive delay: base scaled by request count (capped at 4x) and a
/// jitter factor drawn from [0.5, 1.5).
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn adaptive_delay(base_ms: u64, request_count: u32, jitter: f64) -> Duration {
    let scale = 1.0 + (f64::from(request_count) / 10.0).min(3.0);
    Duration::from_millis((base_ms as f64 * scale * jitter) as u64)
}
