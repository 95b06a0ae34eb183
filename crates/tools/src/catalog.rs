//! Read-only tools that answer from the company catalog.

use async_trait::async_trait;
use leadbot_config::CompanyProfile;
use leadbot_core::error::ToolError;
use leadbot_core::tool::{Tool, ToolArgs, ToolOutput, ToolSchema};
use serde_json::json;
use std::sync::Arc;

use crate::{string_arg, structured};

pub struct GetServicesList {
    company: Arc<CompanyProfile>,
}

impl GetServicesList {
    pub fn new(company: Arc<CompanyProfile>) -> Self {
        Self { company }
    }
}

#[async_trait]
impl Tool for GetServicesList {
    fn name(&self) -> &str {
        "get_services_list"
    }

    fn description(&self) -> &str {
        "Retrieve the list of services offered by the company as raw data."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::empty().optional("query", "string", "Optional query string")
    }

    async fn invoke(&self, _args: ToolArgs) -> Result<ToolOutput, ToolError> {
        structured(self.name(), &self.company.services)
    }
}

pub struct GetServiceDetails {
    company: Arc<CompanyProfile>,
}

impl GetServiceDetails {
    pub fn new(company: Arc<CompanyProfile>) -> Self {
        Self { company }
    }
}

#[async_trait]
impl Tool for GetServiceDetails {
    fn name(&self) -> &str {
        "get_service_details"
    }

    fn description(&self) -> &str {
        "Retrieve detailed information about a specific service by its ID."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::empty().required("query", "string", "The service ID, e.g. service1")
    }

    async fn invoke(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let id = string_arg(&args, "query").unwrap_or_default();
        match self.company.service(&id) {
            Some(service) => structured(self.name(), service),
            None => Ok(json!({ "error": format!("Service with ID {id} not found.") }).into()),
        }
    }
}

pub struct GetJobsList {
    company: Arc<CompanyProfile>,
}

impl GetJobsList {
    pub fn new(company: Arc<CompanyProfile>) -> Self {
        Self { company }
    }
}

#[async_trait]
impl Tool for GetJobsList {
    fn name(&self) -> &str {
        "get_jobs_list"
    }

    fn description(&self) -> &str {
        "Retrieve the list of current job openings at the company as raw data."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::empty().optional("query", "string", "Optional query string")
    }

    async fn invoke(&self, _args: ToolArgs) -> Result<ToolOutput, ToolError> {
        structured(self.name(), &self.company.jobs)
    }
}

pub struct GetJobDetails {
    company: Arc<CompanyProfile>,
}

impl GetJobDetails {
    pub fn new(company: Arc<CompanyProfile>) -> Self {
        Self { company }
    }
}

#[async_trait]
impl Tool for GetJobDetails {
    fn name(&self) -> &str {
        "get_job_details"
    }

    fn description(&self) -> &str {
        "Retrieve detailed information about a specific job opening by its ID or number."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::empty().required(
            "query",
            "string",
            "Listing number (1-based), job ID, or part of the job title",
        )
    }

    async fn invoke(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let query = string_arg(&args, "query").unwrap_or_default();
        match self.company.find_job(&query) {
            Some(job) => structured(self.name(), job),
            None => Ok(json!({ "error": format!("Job '{query}' not found.") }).into()),
        }
    }
}

pub struct GetContactInfo {
    company: Arc<CompanyProfile>,
}

impl GetContactInfo {
    pub fn new(company: Arc<CompanyProfile>) -> Self {
        Self { company }
    }
}

#[async_trait]
impl Tool for GetContactInfo {
    fn name(&self) -> &str {
        "get_contact_info"
    }

    fn description(&self) -> &str {
        "Retrieve the company's contact information, or only the entries matching a query such as 'email' or 'phone'."
    }

    fn input_schema(&self) -> ToolSchema {
        ToolSchema::empty().optional("query", "string", "Optional contact kind to look up")
    }

    async fn invoke(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let query = string_arg(&args, "query");
        structured(self.name(), &self.company.contact_matching(query.as_deref()))
    }
}
