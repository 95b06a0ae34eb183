//! Keyword fast paths answered straight from the catalog.
//!
//! Rules are checked in order and the first match wins. Matching is a
//! case-insensitive substring test, so "jobs" matches the "job" keyword.

use leadbot_config::CompanyProfile;

/// What the previous fast-path answer showed the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    ServiceList,
    JobList,
    ContactInfo,
}

/// A canned answer the router can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastPathAction {
    ListServices,
    InquiryForm,
    ListJobs,
    ApplicationForm,
    ContactInfo,
}

impl FastPathAction {
    /// The topic this answer leaves the conversation on.
    pub fn topic(self) -> Option<Topic> {
        match self {
            FastPathAction::ListServices => Some(Topic::ServiceList),
            FastPathAction::ListJobs => Some(Topic::JobList),
            FastPathAction::ContactInfo => Some(Topic::ContactInfo),
            FastPathAction::InquiryForm | FastPathAction::ApplicationForm => None,
        }
    }

    /// Render the answer from the catalog.
    pub fn render(self, company: &CompanyProfile) -> String {
        match self {
            FastPathAction::ListServices => render_services(company),
            FastPathAction::ListJobs => render_jobs(company),
            FastPathAction::ContactInfo => render_contact(company),
            FastPathAction::InquiryForm => format!(
                "Please provide your details to inquire about {}'s services: your name, \
                 business email, phone number, a subject and your message.",
                company.name
            ),
            FastPathAction::ApplicationForm => format!(
                "We're excited you're interested in joining {}! Please send your full name, \
                 email address, phone number and your resume (PDF or DOCX only).",
                company.name
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FastPathRule {
    pub action: FastPathAction,
    pub keywords: &'static [&'static str],
    /// Only fires right after this topic was shown
    pub after: Option<Topic>,
}

impl FastPathRule {
    fn matches(&self, lowered: &str, last_topic: Option<Topic>) -> bool {
        if self.after.is_some() && self.after != last_topic {
            return false;
        }
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}

pub const SERVICE_KEYWORDS: &[&str] = &["service", "services", "offering", "interested"];
pub const JOB_KEYWORDS: &[&str] = &["job", "career", "position", "opening", "employment"];
pub const CONTACT_KEYWORDS: &[&str] = &["contact", "reach", "info", "phone", "email", "hours"];
pub const APPLY_KEYWORDS: &[&str] = &["apply", "yes"];

/// An ordered list of fast-path rules.
#[derive(Debug, Clone)]
pub struct FastPathRouter {
    rules: Vec<FastPathRule>,
}

impl FastPathRouter {
    pub fn new(rules: Vec<FastPathRule>) -> Self {
        Self { rules }
    }

    /// Services, inquiry form, jobs, application form, contact: in that order.
    pub fn standard() -> Self {
        Self::new(vec![
            FastPathRule {
                action: FastPathAction::ListServices,
                keywords: SERVICE_KEYWORDS,
                after: None,
            },
            FastPathRule {
                action: FastPathAction::InquiryForm,
                keywords: APPLY_KEYWORDS,
                after: Some(Topic::ServiceList),
            },
            FastPathRule {
                action: FastPathAction::ListJobs,
                keywords: JOB_KEYWORDS,
                after: None,
            },
            FastPathRule {
                action: FastPathAction::ApplicationForm,
                keywords: APPLY_KEYWORDS,
                after: Some(Topic::JobList),
            },
            FastPathRule {
                action: FastPathAction::ContactInfo,
                keywords: CONTACT_KEYWORDS,
                after: None,
            },
        ])
    }

    /// The first rule matching `message`, if any.
    pub fn route(&self, message: &str, last_topic: Option<Topic>) -> Option<FastPathAction> {
        let lowered = message.to_lowercase();
        self.rules
            .iter()
            .find(|r| r.matches(&lowered, last_topic))
            .map(|r| r.action)
    }

    pub fn rules(&self) -> &[FastPathRule] {
        &self.rules
    }
}

impl Default for FastPathRouter {
    fn default() -> Self {
        Self::standard()
    }
}

fn render_services(company: &CompanyProfile) -> String {
    let mut out = format!("Services offered by {}:\n", company.name);
    for (i, service) in company.services.iter().enumerate() {
        let category = service.category.as_deref().unwrap_or("Category not specified");
        out.push_str(&format!(
            "{}. {} - {}\n   {}\n",
            i + 1,
            service.name,
            category,
            service.description
        ));
    }
    out.push_str("\nInterested in one of these services? Say 'apply' or 'yes' to proceed!");
    out
}

fn render_jobs(company: &CompanyProfile) -> String {
    if company.jobs.is_empty() {
        return format!("{} has no open positions right now. Please check back soon!", company.name);
    }
    let mut out = format!("Current job openings at {}:\n", company.name);
    for (i, job) in company.jobs.iter().enumerate() {
        let location = if job.location.is_empty() {
            "Location not specified"
        } else {
            job.location.as_str()
        };
        out.push_str(&format!(
            "{}. {} - {}\n   {}\n",
            i + 1,
            job.title,
            location,
            job.description
        ));
    }
    out.push_str("\nWould you like to apply for one of these positions? Please say 'apply' or 'yes'!");
    out
}

fn render_contact(company: &CompanyProfile) -> String {
    let mut out = format!("You can reach {} here:\n", company.name);
    for (key, value) in &company.contact {
        out.push_str(&format!("- {}: {}\n", label(key), value));
    }
    out.trim_end().to_string()
}

/// "address_india" -> "Address India"
fn label(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
