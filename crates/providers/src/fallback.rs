//! Model fallback chain: one provider, an ordered list of models.
//!
//! Transient failures (rate limits, quota, capacity, empty choices) advance to
//! the next model. Any success resets the chain to the primary model. Every
//! failure path ends in [`Completion::Unavailable`] so callers never see a
//! raw provider error.

use leadbot_core::error::ProviderError;
use leadbot_core::event::{DomainEvent, EventBus};
use leadbot_core::message::Message;
use leadbot_core::provider::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Shown to the user when no model could answer.
pub const UNAVAILABLE_NOTICE: &str =
    "I'm sorry, there was an error processing your request. Please try again later.";

/// Shown when the last model returned no choices at all.
pub const NO_CHOICES_NOTICE: &str =
    "I'm having trouble connecting to my services. Please try again in a moment.";

/// One model in the chain. Rank 0 is preferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub identifier: String,
    pub priority_rank: usize,
}

/// Outcome of a chain invocation.
#[derive(Debug, Clone)]
pub enum Completion {
    /// A model answered
    Reply(ProviderResponse),

    /// Every permitted attempt failed
    Unavailable {
        notice: String,
        cause: ProviderError,
    },
}

impl Completion {
    /// Text to show the user: the reply content or the notice.
    pub fn content(&self) -> &str {
        match self {
            Completion::Reply(response) => &response.message.content,
            Completion::Unavailable { notice, .. } => notice,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Completion::Unavailable { .. })
    }

    /// The assistant turn, if a model answered.
    pub fn message(&self) -> Option<&Message> {
        match self {
            Completion::Reply(response) => Some(&response.message),
            Completion::Unavailable { .. } => None,
        }
    }
}

/// A chat-completion client that walks an ordered model list on transient failure.
pub struct FallbackChain {
    provider: Arc<dyn leadbot_core::Provider>,
    models: Vec<ModelDescriptor>,
    current: AtomicUsize,
    temperature: f32,
    max_tokens: Option<u32>,
    notice: String,
    no_choices_notice: String,
    events: Option<Arc<EventBus>>,
}

impl FallbackChain {
    /// Build a chain over `models`, ranked in the order given.
    pub fn new<I, S>(provider: Arc<dyn leadbot_core::Provider>, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let models = models
            .into_iter()
            .enumerate()
            .map(|(rank, id)| ModelDescriptor {
                identifier: id.into(),
                priority_rank: rank,
            })
            .collect();

        Self {
            provider,
            models,
            current: AtomicUsize::new(0),
            temperature: 0.3,
            max_tokens: Some(1024),
            notice: UNAVAILABLE_NOTICE.into(),
            no_choices_notice: NO_CHOICES_NOTICE.into(),
            events: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Replace the user-facing notice returned on failure.
    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = notice.into();
        self
    }

    pub fn with_no_choices_notice(mut self, notice: impl Into<String>) -> Self {
        self.no_choices_notice = notice.into();
        self
    }

    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    /// Index of the model the next call starts from.
    pub fn current_index(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn current_model(&self) -> Option<&str> {
        self.models
            .get(self.current_index())
            .map(|m| m.identifier.as_str())
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Request one completion, falling back across models as needed.
    ///
    /// Makes at most `models.len() - current_index()` attempts.
    pub async fn invoke(&self, messages: &[Message], tools: &[ToolDefinition]) -> Completion {
        if self.models.is_empty() {
            return self.unavailable(ProviderError::NotConfigured(
                "No models in fallback chain".into(),
            ));
        }

        let last = self.models.len() - 1;
        let mut index = self.current_index().min(last);

        loop {
            let model = &self.models[index].identifier;
            let request = ProviderRequest {
                model: model.clone(),
                messages: messages.to_vec(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tools.to_vec(),
            };

            debug!(
                provider = %self.provider.name(),
                model = %model,
                attempt = index + 1,
                total = self.models.len(),
                "Requesting completion"
            );

            let error = match self.provider.complete(request).await {
                Ok(response) => {
                    if index > 0 {
                        info!(model = %model, "Completion succeeded on fallback, resetting to primary model");
                        self.current.store(0, Ordering::SeqCst);
                    }
                    return Completion::Reply(response);
                }
                Err(e) => e,
            };

            let transient = error.is_capacity() || matches!(error, ProviderError::EmptyResponse(_));
            if !transient {
                warn!(model = %model, error = %error, "Non-transient provider error, giving up");
                return self.unavailable(error);
            }

            if index == last {
                warn!(model = %model, error = %error, "All fallback models exhausted");
                return self.unavailable(error);
            }

            let next = &self.models[index + 1].identifier;
            warn!(from = %model, to = %next, error = %error, "Model unavailable, falling back");
            if let Some(events) = &self.events {
                events.publish(DomainEvent::ModelFallback {
                    from_model: model.clone(),
                    to_model: next.clone(),
                    reason: error.to_string(),
                    timestamp: chrono::Utc::now(),
                });
            }
            index += 1;
            self.current.store(index, Ordering::SeqCst);
        }
    }

    fn unavailable(&self, cause: ProviderError) -> Completion {
        let notice = match cause {
            ProviderError::EmptyResponse(_) => &self.no_choices_notice,
            _ => &self.notice,
        };
        Completion::Unavailable {
            notice: notice.clone(),
            cause,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed list of outcomes and records the model of every call.
    struct ScriptedProvider {
        outcomes: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
        models_seen: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(outcomes: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                models_seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.models_seen.lock().unwrap().len()
        }

        fn models_seen(&self) -> Vec<String> {
            self.models_seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl leadbot_core::Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            self.models_seen.lock().unwrap().push(request.model.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Network("script exhausted".into())))
        }
    }

    fn ok(text: &str) -> Result<ProviderResponse, ProviderError> {
        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: None,
            model: "any".into(),
        })
    }

    fn rate_limited() -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::RateLimited {
            retry_after_secs: 5,
        })
    }

    fn chain(provider: Arc<ScriptedProvider>) -> FallbackChain {
        FallbackChain::new(provider, ["m1", "m2", "m3"])
    }

    #[test]
    fn models_ranked_in_order() {
        let c = chain(Arc::new(ScriptedProvider::new(vec![])));
        let ranks: Vec<_> = c.models().iter().map(|m| m.priority_rank).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
        assert_eq!(c.current_model(), Some("m1"));
    }

    #[tokio::test]
    async fn primary_answers() {
        let provider = Arc::new(ScriptedProvider::new(vec![ok("hello")]));
        let c = chain(provider.clone());

        let completion = c.invoke(&[Message::user("hi")], &[]).await;
        assert_eq!(completion.content(), "hello");
        assert_eq!(provider.models_seen(), vec!["m1"]);
    }

    #[tokio::test]
    async fn falls_back_then_resets() {
        let provider = Arc::new(ScriptedProvider::new(vec![rate_limited(), ok("from m2"), ok("again")]));
        let c = chain(provider.clone());

        let first = c.invoke(&[Message::user("hi")], &[]).await;
        assert_eq!(first.content(), "from m2");
        assert_eq!(c.current_index(), 0);

        // Next call starts from the primary again
        let second = c.invoke(&[Message::user("hi")], &[]).await;
        assert_eq!(second.content(), "again");
        assert_eq!(provider.models_seen(), vec!["m1", "m2", "m1"]);
    }

    #[tokio::test]
    async fn capacity_text_triggers_fallback() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(ProviderError::ApiError {
                status_code: 503,
                message: "model over capacity".into(),
            }),
            Err(ProviderError::ApiError {
                status_code: 400,
                message: "You exceeded your current quota".into(),
            }),
            ok("m3 here"),
        ]));
        let c = chain(provider.clone());

        let completion = c.invoke(&[Message::user("hi")], &[]).await;
        assert_eq!(completion.content(), "m3 here");
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn empty_choices_advance() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(ProviderError::EmptyResponse("m1".into())),
            ok("m2 ok"),
        ]));
        let c = chain(provider.clone());

        let completion = c.invoke(&[Message::user("hi")], &[]).await;
        assert_eq!(completion.content(), "m2 ok");
        assert_eq!(provider.models_seen(), vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn exhausted_on_empty_choices_uses_connection_notice() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            rate_limited(),
            Err(ProviderError::EmptyResponse("m2".into())),
            Err(ProviderError::EmptyResponse("m3".into())),
        ]));
        let c = chain(provider.clone());

        let completion = c.invoke(&[Message::user("hi")], &[]).await;
        assert_eq!(completion.content(), NO_CHOICES_NOTICE);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn exhaustion_after_exactly_len_attempts() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            rate_limited(),
            rate_limited(),
            rate_limited(),
            ok("never reached"),
        ]));
        let c = chain(provider.clone());

        let completion = c.invoke(&[Message::user("hi")], &[]).await;
        assert!(completion.is_unavailable());
        assert_eq!(completion.content(), UNAVAILABLE_NOTICE);
        assert_eq!(provider.calls(), 3);
        match completion {
            Completion::Unavailable { cause, .. } => assert!(cause.is_capacity()),
            other => panic!("Expected Unavailable, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_transient_stops_after_one_attempt() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(ProviderError::AuthenticationFailed("bad key".into())),
            ok("never reached"),
        ]));
        let c = chain(provider.clone());

        let completion = c.invoke(&[Message::user("hi")], &[]).await;
        assert!(completion.is_unavailable());
        assert_eq!(provider.calls(), 1);
        assert_eq!(c.current_index(), 0);
    }

    #[tokio::test]
    async fn index_persists_until_success() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            rate_limited(),
            Err(ProviderError::Network("connection reset".into())),
            ok("m2 back"),
        ]));
        let c = chain(provider.clone());

        let first = c.invoke(&[Message::user("hi")], &[]).await;
        assert!(first.is_unavailable());
        assert_eq!(c.current_index(), 1);

        // Starts where the last call left off, then resets
        let second = c.invoke(&[Message::user("hi")], &[]).await;
        assert_eq!(second.content(), "m2 back");
        assert_eq!(provider.models_seen(), vec!["m1", "m2", "m2"]);
        assert_eq!(c.current_index(), 0);
    }

    #[tokio::test]
    async fn empty_chain_is_unavailable() {
        let provider = Arc::new(ScriptedProvider::new(vec![ok("unused")]));
        let c = FallbackChain::new(provider.clone(), Vec::<String>::new());

        let completion = c.invoke(&[Message::user("hi")], &[]).await;
        match completion {
            Completion::Unavailable { cause, .. } => {
                assert!(matches!(cause, ProviderError::NotConfigured(_)))
            }
            other => panic!("Expected Unavailable, got: {other:?}"),
        }
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn publishes_fallback_event() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let provider = Arc::new(ScriptedProvider::new(vec![rate_limited(), ok("ok")]));
        let c = chain(provider).with_event_bus(bus.clone());

        c.invoke(&[Message::user("hi")], &[]).await;

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::ModelFallback {
                from_model,
                to_model,
                ..
            } => {
                assert_eq!(from_model, "m1");
                assert_eq!(to_model, "m2");
            }
            other => panic!("Expected ModelFallback, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn custom_notice() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::Timeout(
            "slow".into(),
        ))]));
        let c = chain(provider).with_notice("Try later");
        assert_eq!(c.invoke(&[Message::user("hi")], &[]).await.content(), "Try later");
    }
}
