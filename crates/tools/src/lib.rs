//! Tool implementations for Leadbot.
//!
//! Five read-only tools answer from the shared [`CompanyProfile`]; two
//! submission tools append leads to CSV files under the data directory.

pub mod catalog;
pub mod csv_sink;
pub mod leads;

pub use catalog::{GetContactInfo, GetJobDetails, GetJobsList, GetServiceDetails, GetServicesList};
pub use csv_sink::CsvSink;
pub use leads::{APPLICATIONS_FILE, FORM_PROMPT, INQUIRIES_FILE, SubmitJobApplication, SubmitServiceInquiry};

use leadbot_config::CompanyProfile;
use leadbot_core::error::ToolError;
use leadbot_core::tool::{ToolArgs, ToolOutput, ToolRegistry};
use std::path::Path;
use std::sync::Arc;

/// Create the registry with all seven company tools.
pub fn default_registry(
    company: Arc<CompanyProfile>,
    data_dir: &Path,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(GetServicesList::new(company.clone())))?;
    registry.register(Box::new(GetServiceDetails::new(company.clone())))?;
    registry.register(Box::new(GetJobsList::new(company.clone())))?;
    registry.register(Box::new(GetJobDetails::new(company.clone())))?;
    registry.register(Box::new(SubmitServiceInquiry::new(data_dir)))?;
    registry.register(Box::new(SubmitJobApplication::new(data_dir)))?;
    registry.register(Box::new(GetContactInfo::new(company)))?;
    Ok(registry)
}

/// A trimmed, non-empty string argument. Numbers and booleans are stringified.
pub(crate) fn string_arg(args: &ToolArgs, key: &str) -> Option<String> {
    let text = match args.get(key)? {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

pub(crate) fn structured<T: serde::Serialize + ?Sized>(
    tool_name: &str,
    value: &T,
) -> Result<ToolOutput, ToolError> {
    serde_json::to_value(value)
        .map(ToolOutput::Structured)
        .map_err(|e| ToolError::ExecutionFailed {
            tool_name: tool_name.into(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_has_seven_tools_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let registry = default_registry(Arc::new(CompanyProfile::default()), dir.path()).unwrap();
        assert_eq!(
            registry.names(),
            vec![
                "get_services_list",
                "get_service_details",
                "get_jobs_list",
                "get_job_details",
                "submit_service_inquiry",
                "submit_job_application",
                "get_contact_info",
            ]
        );
    }

    #[test]
    fn schemas_are_function_shaped() {
        let dir = tempfile::tempdir().unwrap();
        let registry = default_registry(Arc::new(CompanyProfile::default()), dir.path()).unwrap();
        for def in registry.schema_for_all() {
            assert_eq!(def.parameters["type"], "object", "{}", def.name);
            assert!(def.parameters["properties"].is_object());
            assert!(def.parameters["required"].is_array());
        }
        let inquiry = &registry.schema_for_all()[4];
        assert_eq!(
            inquiry.parameters["required"],
            json!(["name", "email", "phone", "subject", "message"])
        );
    }

    #[tokio::test]
    async fn dispatch_passes_results_through() {
        let dir = tempfile::tempdir().unwrap();
        let company = Arc::new(CompanyProfile::default());
        let registry = default_registry(company.clone(), dir.path()).unwrap();

        let out = registry.dispatch("get_jobs_list", ToolArgs::new()).await.unwrap();
        assert_eq!(out, structured("get_jobs_list", &company.jobs).unwrap());
    }

    #[test]
    fn string_arg_normalizes() {
        let args = json!({"a": "  x ", "b": 3, "c": "", "d": null, "e": [1]});
        let args = args.as_object().unwrap();
        assert_eq!(string_arg(args, "a").as_deref(), Some("x"));
        assert_eq!(string_arg(args, "b").as_deref(), Some("3"));
        assert_eq!(string_arg(args, "c"), None);
        assert_eq!(string_arg(args, "d"), None);
        assert_eq!(string_arg(args, "e"), None);
        assert_eq!(string_arg(args, "missing"), None);
    }
}
