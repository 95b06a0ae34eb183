//! The company catalog: services, job openings and contact details.
//!
//! Loaded once with the rest of the configuration, then shared read-only
//! (behind an `Arc`) with every tool that answers from it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything the assistant may say about the company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    #[serde(default = "default_company_name")]
    pub name: String,

    /// Canned answer for "tell me about the company"
    #[serde(default = "default_about")]
    pub about: String,

    #[serde(default = "default_services")]
    pub services: Vec<Service>,

    #[serde(default = "default_jobs")]
    pub jobs: Vec<JobOpening>,

    /// Contact entries keyed by kind ("email", "phone", "hours", "address_india", ...)
    #[serde(default = "default_contact")]
    pub contact: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub description: String,
    #[serde(default)]
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOpening {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub department: String,
    /// Full-time, part-time, contract ...
    #[serde(rename = "type", default)]
    pub employment_type: String,
    #[serde(default)]
    pub location: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
}

impl CompanyProfile {
    pub fn service(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    /// Find a job by 1-based listing number, then by id, then by title fragment.
    ///
    /// Id and title matching ignore case. The first match wins. An empty
    /// query matches nothing.
    pub fn find_job(&self, query: &str) -> Option<&JobOpening> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        if let Ok(number) = query.parse::<usize>()
            && (1..=self.jobs.len()).contains(&number)
        {
            return self.jobs.get(number - 1);
        }

        let lowered = query.to_lowercase();
        self.jobs
            .iter()
            .find(|j| j.id.to_lowercase() == lowered)
            .or_else(|| {
                self.jobs
                    .iter()
                    .find(|j| j.title.to_lowercase().contains(&lowered))
            })
    }

    /// Contact entries whose key contains `query` (case-insensitive).
    ///
    /// Falls back to every entry when nothing matches.
    pub fn contact_matching(&self, query: Option<&str>) -> BTreeMap<String, String> {
        let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) else {
            return self.contact.clone();
        };
        let lowered = query.to_lowercase();
        let filtered: BTreeMap<String, String> = self
            .contact
            .iter()
            .filter(|(k, _)| k.to_lowercase().contains(&lowered))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if filtered.is_empty() {
            self.contact.clone()
        } else {
            filtered
        }
    }
}

impl Default for CompanyProfile {
    fn default() -> Self {
        Self {
            name: default_company_name(),
            about: default_about(),
            services: default_services(),
            jobs: default_jobs(),
            contact: default_contact(),
        }
    }
}

fn default_company_name() -> String {
    "LogBinary".into()
}

fn default_about() -> String {
    concat!(
        "We are a comprehensive IT solutions provider dedicated to transforming business ideas ",
        "into reality through cutting-edge software technologies. With 15 years of proven industry ",
        "expertise, we have a deep understanding of what businesses need to thrive in a competitive ",
        "landscape. Our commitment lies in delivering high-quality websites and mobile applications ",
        "that empower our clients to achieve operational excellence and drive profitability."
    )
    .into()
}

fn default_services() -> Vec<Service> {
    vec![
        Service {
            id: "service1".into(),
            name: "Python Development".into(),
            category: Some("Software Development".into()),
            description: "Custom Python solutions for web applications, APIs, and automation.".into(),
            details: "With Python we are building highly scalable server side applications. Using Django we can build any web based applications, APIs etc.".into(),
        },
        Service {
            id: "service2".into(),
            name: "ML / AI".into(),
            category: Some("Artificial Intelligence".into()),
            description: "AI-driven solutions leveraging Machine Learning and Deep Learning.".into(),
            details: "Using Machine learning and Deep learning algorithms we build artificial intelligence products for various dynamic business needs.".into(),
        },
        Service {
            id: "service3".into(),
            name: "Application Development".into(),
            category: Some("Mobile & Web".into()),
            description: "End-to-end mobile and web application development for businesses.".into(),
            details: "We develop mobile applications in Android and Flutter for various businesses. Design, development, API integrations, etc.".into(),
        },
    ]
}

fn default_jobs() -> Vec<JobOpening> {
    vec![
        JobOpening {
            id: "job1".into(),
            title: "Frontend Developer".into(),
            department: "Engineering".into(),
            employment_type: "Full-time".into(),
            location: "On-site".into(),
            description: "We're looking for an experienced Frontend Developer to join our team. Proficiency in React, Vue, or Angular required.".into(),
            requirements: vec![
                "3+ years of experience with modern JavaScript frameworks".into(),
                "Strong HTML/CSS skills".into(),
                "Experience with responsive design".into(),
                "Knowledge of state management solutions".into(),
            ],
            benefits: vec![
                "Competitive salary".into(),
                "Health insurance".into(),
                "Flexible working hours".into(),
                "Professional development budget".into(),
            ],
        },
        JobOpening {
            id: "job2".into(),
            title: "Machine Learning Engineer".into(),
            department: "AI Research".into(),
            employment_type: "Full-time".into(),
            location: "Remote".into(),
            description: "Join our AI team to develop cutting-edge machine learning solutions for real-world problems.".into(),
            requirements: vec![
                "MS or PhD in Computer Science or related field".into(),
                "Experience with PyTorch or TensorFlow".into(),
                "Strong understanding of ML algorithms".into(),
                "Experience deploying ML models to production".into(),
            ],
            benefits: vec![
                "Top-tier compensation".into(),
                "Remote-first culture".into(),
                "Research publication opportunities".into(),
                "Access to high-performance computing resources".into(),
            ],
        },
    ]
}

fn default_contact() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("email".to_string(), "info@logbinary.com".to_string()),
        ("phone".to_string(), "+91-931 678 9418".to_string()),
        (
            "hours".to_string(),
            "Monday to Friday, 10:00 AM - 7:00 PM IST".to_string(),
        ),
    ])
}
