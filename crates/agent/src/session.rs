//! The chat session: everything between a raw visitor message and the executor.

use leadbot_config::{AgentSettings, CompanyProfile};
use leadbot_core::tool::ToolArgs;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::executor::AgentExecutor;
use crate::fast_path::{
    CONTACT_KEYWORDS, FastPathAction, FastPathRouter, JOB_KEYWORDS, SERVICE_KEYWORDS, Topic,
};

/// Used when the agent produced nothing and no keyword points anywhere.
pub const TROUBLE_MESSAGE: &str = "I'm having trouble processing your request. Can you try asking about our services, job openings, or contact information?";

/// A structured form posted by the chat widget.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "snake_case")]
pub enum FormSubmission {
    SubmitInquiry(ToolArgs),
    SubmitJobApplication(ToolArgs),
}

impl FormSubmission {
    /// Parse a message that is a form submission; anything else is `None`.
    pub fn parse(message: &str) -> Option<Self> {
        if !message.starts_with('{') {
            return None;
        }
        serde_json::from_str(message).ok()
    }

    pub fn tool_name(&self) -> &'static str {
        match self {
            FormSubmission::SubmitInquiry(_) => "submit_service_inquiry",
            FormSubmission::SubmitJobApplication(_) => "submit_job_application",
        }
    }

    fn into_args(self) -> ToolArgs {
        match self {
            FormSubmission::SubmitInquiry(args) | FormSubmission::SubmitJobApplication(args) => args,
        }
    }
}

/// One visitor conversation.
pub struct ChatSession {
    executor: AgentExecutor,
    company: Arc<CompanyProfile>,
    router: Option<FastPathRouter>,
    max_input_chars: usize,
    last_topic: Option<Topic>,
}

impl ChatSession {
    pub fn new(executor: AgentExecutor, company: Arc<CompanyProfile>) -> Self {
        Self {
            executor,
            company,
            router: Some(FastPathRouter::standard()),
            max_input_chars: 500,
            last_topic: None,
        }
    }

    /// Apply the `[agent]` settings that belong to the session.
    pub fn with_settings(mut self, settings: &AgentSettings) -> Self {
        self.max_input_chars = settings.max_input_chars;
        if !settings.fast_paths {
            self.router = None;
        }
        self
    }

    /// Replace (or with `None`, disable) the fast-path rules.
    pub fn with_router(mut self, router: Option<FastPathRouter>) -> Self {
        self.router = router;
        self
    }

    pub fn executor(&self) -> &AgentExecutor {
        &self.executor
    }

    pub fn last_topic(&self) -> Option<Topic> {
        self.last_topic
    }

    pub fn greeting(&self) -> String {
        format!(
            "Hi there! I'm {}'s virtual assistant. How can I help you today?",
            self.company.name
        )
    }

    /// Answer one raw visitor message.
    pub async fn handle(&mut self, raw: &str) -> String {
        let message = raw.trim();
        if message.is_empty() {
            return self.greeting();
        }

        if let Some(form) = FormSubmission::parse(message) {
            return self.submit_form(form).await;
        }

        let message = truncate_chars(message, self.max_input_chars);

        if let Some(router) = &self.router
            && let Some(action) = router.route(&message, self.last_topic)
        {
            debug!(action = ?action, "Answering from fast path");
            let answer = action.render(&self.company);
            if let Some(topic) = action.topic() {
                self.last_topic = Some(topic);
            }
            self.executor.memory_mut().record_exchange(&message, &answer);
            return answer;
        }

        let answer = self.executor.invoke(&message).await;
        if !answer.trim().is_empty() {
            return answer;
        }

        warn!("Agent returned an empty answer, falling back to catalog");
        let fallback = self.catalog_fallback(&message);
        self.executor.memory_mut().replace_last_answer(&fallback);
        fallback
    }

    /// Dispatch a form straight to its submission tool.
    pub async fn submit_form(&mut self, form: FormSubmission) -> String {
        let tool_name = form.tool_name();
        let is_inquiry = matches!(form, FormSubmission::SubmitInquiry(_));
        let args = form.into_args();
        let name = args
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("there")
            .to_string();

        info!(tool = tool_name, "Handling form submission");
        let outcome = self.executor.tools().dispatch(tool_name, args).await;

        let value = match outcome {
            Ok(output) => output.as_value().cloned().unwrap_or_default(),
            Err(e) => {
                warn!(tool = tool_name, error = %e, "Form submission failed");
                serde_json::Value::Null
            }
        };

        match value.get("status").and_then(|s| s.as_str()) {
            Some("success") if is_inquiry => format!(
                "Thank you for your inquiry, {name}! We've received your details and will get back to you soon."
            ),
            Some("success") => format!(
                "Thank you for applying, {name}! Your application has been successfully submitted."
            ),
            _ => match value.get("error").and_then(|e| e.as_str()) {
                Some(error) => error.to_string(),
                None if is_inquiry => {
                    "Error processing your inquiry. Please ensure all fields are filled correctly."
                        .to_string()
                }
                None => {
                    "Error processing your application. Please ensure all fields are filled correctly."
                        .to_string()
                }
            },
        }
    }

    /// A catalog listing chosen by keyword, or a nudge toward what we can answer.
    fn catalog_fallback(&mut self, message: &str) -> String {
        let lowered = message.to_lowercase();
        let has = |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));

        let action = if has(SERVICE_KEYWORDS) {
            FastPathAction::ListServices
        } else if has(JOB_KEYWORDS) {
            FastPathAction::ListJobs
        } else if has(CONTACT_KEYWORDS) {
            FastPathAction::ContactInfo
        } else {
            return TROUBLE_MESSAGE.to_string();
        };

        self.last_topic = action.topic();
        action.render(&self.company)
    }
}

/// Keep at most `max` characters, never splitting one.
fn truncate_chars(message: &str, max: usize) -> String {
    match message.char_indices().nth(max) {
        Some((cut, _)) => {
            debug!(limit = max, "Truncating long message");
            message[..cut].to_string()
        }
        None => message.to_string(),
    }
}
