//! Lead capture: service inquiries and job applications, appended to CSV.

use async_trait::async_trait;
use leadbot_core::error::ToolError;
use leadbot_core::tool::{Tool, ToolArgs, ToolOutput, ToolSchema};
use serde_json::json;
use std::path::Path;
use tracing::info;

use crate::csv_sink::{CsvSink, timestamp};
use crate::string_arg;

pub const INQUIRIES_FILE: &str = "service_inquiries.csv";
pub const APPLICATIONS_FILE: &str = "job_applications.csv";

pub const INQUIRY_HEADER: &[&str] = &["name", "email", "phone", "subject", "message", "timestamp"];
pub const APPLICATION_HEADER: &[&str] = &["name", "email", "phone", "resume_file", "timestamp"];

/// Returned instead of a submission when the model calls without every field.
pub const FORM_PROMPT: &str =
    "It looks like you're interested! Please say 'apply' or 'yes' to provide your details via a form.";

const RESUME_EXTENSIONS: &[&str] = &[".pdf", ".docx"];

pub struct SubmitServiceInquiry {
    sink: CsvSink,
}

impl SubmitServiceInquiry {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            sink: CsvSink::new(data_dir.join(INQUIRIES_FILE), INQUIRY_HEADER),
        }
    }
}

#[async_trait]
impl Tool for SubmitServiceInquiry {
    fn name(&self) -> &str {
        "submit_service_inquiry"
    }

    fn description(&self) -> &str {
        "Submit a general inquiry from a potential customer and save it. Only call this with all required fields from a form submission."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::empty()
            .required("name", "string", "Full name of the person inquiring")
            .required("email", "string", "Business email address")
            .required("phone", "string", "Phone number")
            .required("subject", "string", "Subject of the inquiry")
            .required("message", "string", "The inquiry message")
            .optional("service_id", "string", "ID of the service of interest")
    }

    async fn invoke(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let missing = self.input_schema().missing_required(&args);
        if !missing.is_empty() {
            info!(missing = ?missing, "Inquiry incomplete, redirecting to form");
            return Ok(json!({
                "status": "incomplete",
                "missing": missing,
                "message": FORM_PROMPT,
            })
            .into());
        }

        let field = |key: &str| string_arg(&args, key).unwrap_or_default();
        let (name, email, phone, subject, message) = (
            field("name"),
            field("email"),
            field("phone"),
            field("subject"),
            field("message"),
        );

        self.sink
            .append(vec![
                name.clone(),
                email.clone(),
                phone,
                subject.clone(),
                message,
                timestamp(),
            ])
            .await
            .map_err(|e| retag(e, self.name()))?;

        info!(name = %name, email = %email, subject = %subject, "Service inquiry saved");
        Ok(json!({
            "status": "success",
            "name": name,
            "email": email,
            "subject": subject,
        })
        .into())
    }
}

pub struct SubmitJobApplication {
    sink: CsvSink,
}

impl SubmitJobApplication {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            sink: CsvSink::new(data_dir.join(APPLICATIONS_FILE), APPLICATION_HEADER),
        }
    }
}

#[async_trait]
impl Tool for SubmitJobApplication {
    fn name(&self) -> &str {
        "submit_job_application"
    }

    fn description(&self) -> &str {
        "Submit a job application from a candidate and save their contact details and resume file name."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::empty()
            .required("name", "string", "Full name of the applicant")
            .required("email", "string", "Email address")
            .required("phone", "string", "Phone number")
            .required("resume_file", "string", "Resume file name (PDF or DOCX)")
    }

    async fn invoke(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let missing = self.input_schema().missing_required(&args);
        if !missing.is_empty() {
            return Err(ToolError::InvalidArguments(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        let field = |key: &str| string_arg(&args, key).unwrap_or_default();
        let resume_file = field("resume_file");
        let lowered = resume_file.to_lowercase();
        if !RESUME_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext)) {
            return Ok(json!({ "error": "Resume must be in PDF or DOCX format." }).into());
        }

        let (name, email, phone) = (field("name"), field("email"), field("phone"));
        self.sink
            .append(vec![
                name.clone(),
                email.clone(),
                phone.clone(),
                resume_file.clone(),
                timestamp(),
            ])
            .await
            .map_err(|e| retag(e, self.name()))?;

        info!(name = %name, email = %email, resume = %resume_file, "Job application saved");
        Ok(json!({
            "status": "success",
            "name": name,
            "email": email,
            "phone": phone,
            "message": "Your application has been successfully submitted.",
        })
        .into())
    }
}

/// Attribute sink failures to the submitting tool.
fn retag(error: ToolError, tool_name: &str) -> ToolError {
    match error {
        ToolError::ExecutionFailed { reason, .. } => ToolError::ExecutionFailed {
            tool_name: tool_name.into(),
            reason,
        },
        other => other,
    }
}
