//! Model client: one logical completion with retries, deadlines and
//! cancellation.
//!
//! `timeout` bounds a single attempt and is retried like any transient
//! failure. The optional `deadline` bounds the whole invocation, backoff
//! included, and is never retried.
//!
//! Every logical invocation that returns text is recorded once in the
//! shared [`CallLedger`]. Failed attempts and retried attempts are not.

use formagent_config::AppConfig;
use formagent_core::error::{Error, ProviderError, Result};
use formagent_core::ledger::CallLedger;
use formagent_core::prompt::PromptSpec;
use formagent_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Invocation settings for a [`ModelClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub model: String,
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Overall bound on one invocation; `None` leaves only the per-attempt
    /// timeout.
    pub deadline: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_settings(&AppConfig::default())
    }
}

impl ClientConfig {
    pub fn from_settings(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            timeout: config.client.timeout(),
            max_retries: config.client.max_retries,
            backoff_base: config.client.backoff_base(),
            backoff_max: config.client.backoff_max(),
            max_tokens: config.client.max_tokens,
            temperature: config.client.temperature,
            deadline: config.client.deadline(),
        }
    }

    /// Delay before retry number `retry` (zero-based): `base * 2^retry`,
    /// capped at `backoff_max`.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.backoff_base
            .checked_mul(factor)
            .unwrap_or(self.backoff_max)
            .min(self.backoff_max)
    }
}

/// Sends built prompts to a [`Provider`] and returns the raw reply text.
pub struct ModelClient {
    provider: Arc<dyn Provider>,
    config: ClientConfig,
    ledger: Arc<CallLedger>,
}

impl ModelClient {
    pub fn new(provider: Arc<dyn Provider>, config: ClientConfig, ledger: Arc<CallLedger>) -> Self {
        Self {
            provider,
            config,
            ledger,
        }
    }

    /// Bound every invocation of this client by `deadline`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.config.deadline = Some(deadline);
        self
    }

    pub fn ledger(&self) -> &Arc<CallLedger> {
        &self.ledger
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Run one logical completion.
    ///
    /// Transient failures (timeouts, rate limits, network errors, 5xx) are
    /// retried with exponential backoff up to `max_retries` times. Auth
    /// failures and other 4xx responses fail immediately. Cancellation is
    /// observed before each attempt, during the call and during backoff.
    /// When a deadline is configured, no attempt or backoff outlives it
    /// and running out of it fails with `DeadlineExceeded`.
    pub async fn invoke(&self, spec: &PromptSpec, cancel: &CancellationToken) -> Result<String> {
        let request = ProviderRequest {
            model: self.config.model.clone(),
            system: Some(spec.system.clone()),
            prompt: spec.instruction_text.clone(),
            temperature: self.config.temperature,
            max_tokens: Some(self.config.max_tokens),
        };

        let attempts = self.config.max_retries.saturating_add(1);
        let mut last_error: Option<ProviderError> = None;
        let deadline = self.config.deadline.map(|budget| (Instant::now() + budget, budget));
        let exceeded = |made: u32| {
            let budget = deadline.map(|(_, budget)| budget).unwrap_or_default();
            warn!(operation = %spec.operation, attempts = made, "Invocation deadline exceeded");
            Error::DeadlineExceeded {
                budget,
                attempts: made,
            }
        };

        for attempt in 0..attempts {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            if attempt > 0 {
                let delay = self.retry_delay(attempt - 1, last_error.as_ref());
                debug!(
                    operation = %spec.operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Backing off before retry"
                );
                if deadline.is_some_and(|(at, _)| Instant::now() + delay >= at) {
                    return Err(exceeded(attempt));
                }
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(Error::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            let attempt_timeout = match deadline {
                Some((at, _)) => {
                    let remaining = at.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(exceeded(attempt));
                    }
                    self.config.timeout.min(remaining)
                }
                None => self.config.timeout,
            };

            debug!(
                operation = %spec.operation,
                provider = self.provider.name(),
                model = %self.config.model,
                attempt = attempt + 1,
                prompt_chars = spec.instruction_text.len(),
                "Invoking model"
            );

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                r = tokio::time::timeout(attempt_timeout, self.provider.complete(request.clone())) => r,
            };

            let error = match outcome {
                Ok(Ok(response)) => {
                    self.ledger.record(response.usage.as_ref());
                    info!(
                        operation = %spec.operation,
                        model = %response.model,
                        attempts = attempt + 1,
                        "Model call succeeded"
                    );
                    return Ok(response.content);
                }
                Ok(Err(e)) => e,
                Err(_) if deadline.is_some_and(|(at, _)| Instant::now() >= at) => {
                    return Err(exceeded(attempt + 1));
                }
                Err(_) => ProviderError::Timeout(format!(
                    "no response within {}s",
                    attempt_timeout.as_secs_f64()
                )),
            };

            if !error.is_transient() {
                warn!(operation = %spec.operation, error = %error, "Model call failed");
                return Err(match error {
                    ProviderError::AuthenticationFailed(msg) => Error::Authentication(msg),
                    ProviderError::NotConfigured(msg) => Error::Config(msg),
                    other => Error::InvalidRequest(other.to_string()),
                });
            }

            warn!(
                operation = %spec.operation,
                attempt = attempt + 1,
                of = attempts,
                error = %error,
                "Transient model failure"
            );
            last_error = Some(error);
        }

        Err(Error::ModelUnavailable {
            attempts,
            last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }

    /// Exponential backoff, stretched to honor a provider's retry-after
    /// hint but never beyond `backoff_max`.
    fn retry_delay(&self, retry: u32, last: Option<&ProviderError>) -> Duration {
        let backoff = self.config.backoff_delay(retry);
        match last {
            Some(ProviderError::RateLimited { retry_after_secs }) => backoff
                .max(Duration::from_secs(*retry_after_secs))
                .min(self.config.backoff_max),
            _ => backoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use formagent_core::operation::OperationKind;
    use formagent_core::prompt::ResponseSchema;
    use formagent_core::provider::{ProviderResponse, Usage};
    use std::sync::Mutex;

    type Scripted = std::result::Result<String, ProviderError>;

    /// Returns scripted outcomes in order, then repeats the last one.
    struct ScriptedProvider {
        outcomes: Mutex<Vec<Scripted>>,
        call_count: Mutex<usize>,
        delay: Duration,
    }

    impl ScriptedProvider {
        fn new(outcomes: Vec<Scripted>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                call_count: Mutex::new(0),
                delay: Duration::ZERO,
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::new(vec![Ok("late".into())])
            }
        }

        fn calls(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            let outcome = {
                let mut count = self.call_count.lock().unwrap();
                *count += 1;
                let mut outcomes = self.outcomes.lock().unwrap();
                if outcomes.len() > 1 {
                    outcomes.remove(0)
                } else {
                    outcomes[0].clone()
                }
            };
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            outcome.map(|content| ProviderResponse {
                content,
                usage: Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }),
                model: "mock-model".into(),
            })
        }
    }

    fn spec() -> PromptSpec {
        PromptSpec {
            operation: OperationKind::Ask,
            system: "system".into(),
            instruction_text: "question".into(),
            expected_schema: ResponseSchema::Question,
        }
    }

    fn config() -> ClientConfig {
        ClientConfig {
            model: "mock-model".into(),
            timeout: Duration::from_secs(2),
            max_retries: 2,
            backoff_base: Duration::from_millis(100),
            backoff_max: Duration::from_secs(1),
            max_tokens: 256,
            temperature: 0.0,
            deadline: None,
        }
    }

    fn client(provider: Arc<ScriptedProvider>) -> ModelClient {
        ModelClient::new(provider, config(), Arc::new(CallLedger::new()))
    }

    fn server_error() -> Scripted {
        Err(ProviderError::ApiError {
            status_code: 503,
            message: "overloaded".into(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn success_records_one_call() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok("{}".into())]));
        let client = client(provider.clone());

        let text = client.invoke(&spec(), &CancellationToken::new()).await.unwrap();
        assert_eq!(text, "{}");
        assert_eq!(client.ledger().calls(), 1);
        assert_eq!(client.ledger().snapshot().input_tokens, 10);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_is_retried() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            server_error(),
            Err(ProviderError::Network("reset".into())),
            Ok("ok".into()),
        ]));
        let client = client(provider.clone());

        let text = client.invoke(&spec(), &CancellationToken::new()).await.unwrap();
        assert_eq!(text, "ok");
        assert_eq!(provider.calls(), 3);
        assert_eq!(client.ledger().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_report_model_unavailable() {
        let provider = Arc::new(ScriptedProvider::new(vec![server_error()]));
        let client = client(provider.clone());

        let err = client
            .invoke(&spec(), &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            Error::ModelUnavailable {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("overloaded"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(provider.calls(), 3);
        assert_eq!(client.ledger().calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn authentication_failure_is_not_retried() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(
            ProviderError::AuthenticationFailed("bad key".into()),
        )]));
        let client = client(provider.clone());

        let err = client
            .invoke(&spec(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "AuthenticationError");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn client_error_is_not_retried() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::ApiError {
            status_code: 400,
            message: "prompt is too long".into(),
        })]));
        let client = client(provider.clone());

        let err = client
            .invoke(&spec(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidRequestError");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out_each_attempt() {
        let provider = Arc::new(ScriptedProvider::slow(Duration::from_secs(60)));
        let client = client(provider.clone());

        let err = client
            .invoke(&spec(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ModelUnavailableError");
        assert!(err.to_string().contains("timed out"));
        assert_eq!(provider.calls(), 3);
        assert_eq!(client.ledger().calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_start_makes_no_call() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok("{}".into())]));
        let client = client(provider.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client.invoke(&spec(), &cancel).await.unwrap_err();
        assert_eq!(err.kind(), "CancelledError");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff() {
        let provider = Arc::new(ScriptedProvider::new(vec![server_error()]));
        let mut cfg = config();
        cfg.backoff_base = Duration::from_secs(30);
        cfg.backoff_max = Duration::from_secs(30);
        let client = ModelClient::new(provider.clone(), cfg, Arc::new(CallLedger::new()));

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = client.invoke(&spec(), &cancel).await.unwrap_err();
        assert_eq!(err.kind(), "CancelledError");
        assert_eq!(provider.calls(), 1);
        assert_eq!(client.ledger().calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_call_in_flight() {
        let provider = Arc::new(ScriptedProvider::slow(Duration::from_secs(60)));
        let mut cfg = config();
        cfg.timeout = Duration::from_secs(120);
        let client = ModelClient::new(provider.clone(), cfg, Arc::new(CallLedger::new()));

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let err = client.invoke(&spec(), &cancel).await.unwrap_err();
        assert_eq!(err.kind(), "CancelledError");
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(provider.calls(), 1);
        assert_eq!(client.ledger().calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_bounds_the_whole_invocation() {
        let provider = Arc::new(ScriptedProvider::slow(Duration::from_secs(60)));
        let mut cfg = config();
        cfg.timeout = Duration::from_secs(120);
        cfg.max_retries = 3;
        let client = ModelClient::new(provider.clone(), cfg, Arc::new(CallLedger::new()))
            .with_deadline(Duration::from_secs(5));

        let started = Instant::now();
        let err = client
            .invoke(&spec(), &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            Error::DeadlineExceeded { budget, attempts } => {
                assert_eq!(budget, Duration::from_secs(5));
                assert_eq!(attempts, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(started.elapsed() <= Duration::from_secs(5));
        assert_eq!(provider.calls(), 1);
        assert_eq!(client.ledger().calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_stops_retries_before_a_long_backoff() {
        let provider = Arc::new(ScriptedProvider::new(vec![server_error()]));
        let mut cfg = config();
        cfg.backoff_base = Duration::from_secs(10);
        cfg.backoff_max = Duration::from_secs(10);
        cfg.deadline = Some(Duration::from_secs(3));
        let client = ModelClient::new(provider.clone(), cfg, Arc::new(CallLedger::new()));

        let started = Instant::now();
        let err = client
            .invoke(&spec(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "DeadlineExceededError");
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_leaves_fast_retries_alone() {
        let provider = Arc::new(ScriptedProvider::new(vec![server_error(), Ok("ok".into())]));
        let client = client(provider.clone()).with_deadline(Duration::from_secs(10));

        let text = client.invoke(&spec(), &CancellationToken::new()).await.unwrap();
        assert_eq!(text, "ok");
        assert_eq!(provider.calls(), 2);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let cfg = config();
        assert_eq!(cfg.backoff_delay(0), Duration::from_millis(100));
        assert_eq!(cfg.backoff_delay(1), Duration::from_millis(200));
        assert_eq!(cfg.backoff_delay(2), Duration::from_millis(400));
        assert_eq!(cfg.backoff_delay(10), Duration::from_secs(1));
        assert_eq!(cfg.backoff_delay(64), Duration::from_secs(1));
    }

    #[test]
    fn rate_limit_hint_is_capped() {
        let client = client(Arc::new(ScriptedProvider::new(vec![Ok(String::new())])));
        let hint = ProviderError::RateLimited {
            retry_after_secs: 120,
        };
        assert_eq!(client.retry_delay(0, Some(&hint)), Duration::from_secs(1));
    }
}
