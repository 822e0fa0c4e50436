//! Zoho Projects REST client: list active projects, create tasks.

use super::oauth::ZohoOAuth;
use super::{CreatedTask, ReferenceItem, TicketBackend, TicketDraft, ZohoError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

const ZOHO_API_BASE: &str = "https://projectsapi.zoho.com";
const ZOHO_WEB_BASE: &str = "https://projects.zoho.com";
const TASK_CREATE_FAILED: &str = "Failed to create task";

#[derive(Debug, Deserialize)]
struct ProjectsResponse {
    #[serde(default)]
    projects: Option<Vec<WireProject>>,
}

#[derive(Debug, Deserialize)]
struct WireProject {
    #[serde(default)]
    id_string: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Clone)]
pub struct ZohoClient {
    api_base: String,
    web_base: String,
    portal_id: String,
    oauth: ZohoOAuth,
    client: reqwest::Client,
}

impl ZohoClient {
    pub fn new(
        client: reqwest::Client,
        oauth: ZohoOAuth,
        portal_id: String,
        api_base: Option<String>,
        web_base: Option<String>,
    ) -> Self {
        let trim = |u: String| u.trim_end_matches('/').to_string();
        Self {
            api_base: api_base.map(trim).unwrap_or_else(|| ZOHO_API_BASE.to_string()),
            web_base: web_base.map(trim).unwrap_or_else(|| ZOHO_WEB_BASE.to_string()),
            portal_id,
            oauth,
            client,
        }
    }

    fn portal_url(&self) -> String {
        format!("{}/restapi/portal/{}", self.api_base, self.portal_id)
    }

    fn auth_header(token: &str) -> String {
        format!("Zoho-oauthtoken {}", token)
    }

    /// Link to a task in the web UI, for responses that omit `link.web.url`.
    fn task_web_url(&self, project_id: &str, task_id: &str) -> String {
        format!(
            "{}/portal/{}#taskdetail/{}/{}",
            self.web_base, self.portal_id, project_id, task_id
        )
    }
}

/// `id_string`, else `id` (number or string).
fn task_id(task: &Value) -> String {
    task.get("id_string")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| match task.get("id") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

#[async_trait]
impl TicketBackend for ZohoClient {
    /// GET /projects/?status=active, mapped to `{id, name}`.
    async fn list_active_projects(&self) -> Result<Vec<ReferenceItem>, ZohoError> {
        let token = self.oauth.access_token().await?;
        let url = format!("{}/projects/", self.portal_url());
        let res = self
            .client
            .get(&url)
            .query(&[("status", "active")])
            .header(reqwest::header::AUTHORIZATION, Self::auth_header(&token))
            .send()
            .await?;
        let data: ProjectsResponse = res.json().await.map_err(|e| {
            log::debug!("zoho projects response did not decode: {}", e);
            ZohoError::FetchFailed
        })?;
        let projects = data.projects.ok_or(ZohoError::FetchFailed)?;
        Ok(projects
            .into_iter()
            .filter_map(|p| match (p.id_string, p.name) {
                (Some(id), Some(name)) if !id.is_empty() => Some(ReferenceItem { id, name }),
                (id, _) => {
                    log::debug!("skipping zoho project without id or name: {:?}", id);
                    None
                }
            })
            .collect())
    }

    /// POST /projects/{id}/tasks/ (form-encoded name, description, priority).
    async fn create_task(&self, draft: &TicketDraft) -> Result<CreatedTask, ZohoError> {
        let token = self.oauth.access_token().await?;
        let url = format!("{}/projects/{}/tasks/", self.portal_url(), draft.destination_id);
        let form = [
            ("name", draft.title.as_str()),
            ("description", draft.description.as_str()),
            ("priority", draft.priority.as_str()),
        ];
        let res = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, Self::auth_header(&token))
            .form(&form)
            .send()
            .await?;
        let status = res.status();
        let body = res.text().await?;
        let data: Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("zoho task response ({}) is not JSON: {}", status, e);
                return Err(ZohoError::TaskCreate(TASK_CREATE_FAILED.to_string()));
            }
        };
        if !status.is_success() || data.get("error").is_some_and(|e| !e.is_null()) {
            let message = data
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .unwrap_or(TASK_CREATE_FAILED);
            return Err(ZohoError::TaskCreate(message.to_string()));
        }
        let task = data
            .get("tasks")
            .and_then(|t| t.get(0))
            .unwrap_or(&data);
        let id = task_id(task);
        if id.is_empty() {
            log::warn!("zoho task response has no task id: {}", body);
            return Err(ZohoError::TaskCreate(TASK_CREATE_FAILED.to_string()));
        }
        let url = task
            .get("link")
            .and_then(|l| l.get("web"))
            .and_then(|w| w.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.task_web_url(&draft.destination_id, &id));
        log::info!("zoho task {} created in project {}", id, draft.destination_id);
        Ok(CreatedTask { id, url })
    }
}
