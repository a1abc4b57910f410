//! `ureq`-backed implementation of the platform capability.
//!
//! All calls are blocking. List endpoints are paginated with
//! `per_page=100` and followed through the `X-Next-Page` header.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use abgabe_core::{
    types::{
        AccessLevel, DeployKey, DeployKeyId, GroupId, ProjectId, ProjectSettings, RemoteGroup,
        RemoteMember, RemoteProject, RemoteUser, Tag, UserId,
    },
    Config, ConfigError, NewCommit, NewGroup, NewProject, NewTag, NewUser, Platform,
    PlatformError,
};

use crate::error::from_ureq;

const PER_PAGE: &str = "100";

/// Authenticated client for one GitLab instance.
pub struct GitlabClient {
    agent: ureq::Agent,
    api: String,
    token: String,
}

impl GitlabClient {
    /// `url` is the instance root, e.g. `https://gitlab.example.org`.
    pub fn new(url: &str, token: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .build();
        Self {
            agent,
            api: api_base(url),
            token: token.into(),
        }
    }

    /// Build a client from `url`, `private_token` and `timeout_secs`.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let url = config.require_url()?;
        let token = config.require_token()?;
        Ok(Self::new(
            &url,
            token,
            Duration::from_secs(config.timeout_secs),
        ))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api, path)
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        tracing::debug!(method, path, "GitLab API call");
        self.agent
            .request(method, &self.url(path))
            .set("PRIVATE-TOKEN", &self.token)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, PlatformError> {
        let response = self.request("GET", path).call().map_err(from_ureq)?;
        decode(response)
    }

    /// Fetch every page of a list endpoint.
    fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, PlatformError> {
        let mut items = Vec::new();
        let mut page = String::from("1");
        loop {
            let mut request = self
                .request("GET", path)
                .query("per_page", PER_PAGE)
                .query("page", &page);
            for (key, value) in query {
                request = request.query(key, value);
            }
            let response = request.call().map_err(from_ureq)?;
            let next = response
                .header("X-Next-Page")
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_owned);
            let mut batch: Vec<T> = decode(response)?;
            items.append(&mut batch);
            match next {
                Some(n) => page = n,
                None => return Ok(items),
            }
        }
    }

    fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: impl Serialize,
    ) -> Result<T, PlatformError> {
        let response = self
            .request("POST", path)
            .send_json(body)
            .map_err(from_ureq)?;
        decode(response)
    }

    /// POST/PUT whose response body is irrelevant.
    fn send(&self, method: &str, path: &str, body: impl Serialize) -> Result<(), PlatformError> {
        self.request(method, path)
            .send_json(body)
            .map_err(from_ureq)?;
        Ok(())
    }
}

fn api_base(url: &str) -> String {
    format!("{}/api/v4", url.trim_end_matches('/'))
}

fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T, PlatformError> {
    response
        .into_json::<T>()
        .map_err(|e| PlatformError::Decode(e.to_string()))
}

fn encode_path(path: &str) -> String {
    urlencoding::encode(path).into_owned()
}

impl Platform for GitlabClient {
    fn search_groups(
        &self,
        parent: Option<GroupId>,
        search: &str,
    ) -> Result<Vec<RemoteGroup>, PlatformError> {
        match parent {
            Some(parent) => {
                self.get_all(&format!("/groups/{parent}/subgroups"), &[("search", search)])
            }
            None => self.get_all(
                "/groups",
                &[("search", search), ("top_level_only", "true")],
            ),
        }
    }

    fn create_group(&self, group: &NewGroup) -> Result<RemoteGroup, PlatformError> {
        self.post("/groups", group)
    }

    fn list_group_members(&self, group: GroupId) -> Result<Vec<RemoteMember>, PlatformError> {
        self.get_all(&format!("/groups/{group}/members"), &[])
    }

    fn add_group_member(
        &self,
        group: GroupId,
        user: UserId,
        access_level: AccessLevel,
    ) -> Result<RemoteMember, PlatformError> {
        self.post(
            &format!("/groups/{group}/members"),
            json!({ "user_id": user, "access_level": access_level }),
        )
    }

    fn search_group_projects(
        &self,
        group: GroupId,
        search: &str,
    ) -> Result<Vec<RemoteProject>, PlatformError> {
        self.get_all(&format!("/groups/{group}/projects"), &[("search", search)])
    }

    fn get_project(&self, id: ProjectId) -> Result<RemoteProject, PlatformError> {
        self.get(&format!("/projects/{id}"))
    }

    fn find_project_by_path(&self, path: &str) -> Result<Option<RemoteProject>, PlatformError> {
        match self.get(&format!("/projects/{}", encode_path(path))) {
            Ok(project) => Ok(Some(project)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn create_project(&self, project: &NewProject) -> Result<RemoteProject, PlatformError> {
        self.post("/projects", project)
    }

    fn create_commit(&self, project: ProjectId, commit: &NewCommit) -> Result<(), PlatformError> {
        self.send(
            "POST",
            &format!("/projects/{project}/repository/commits"),
            commit,
        )
    }

    fn branch_exists(&self, project: ProjectId, branch: &str) -> Result<bool, PlatformError> {
        let path = format!(
            "/projects/{project}/repository/branches/{}",
            encode_path(branch)
        );
        match self.get::<serde_json::Value>(&path) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn fork_project(
        &self,
        project: ProjectId,
        namespace: GroupId,
    ) -> Result<RemoteProject, PlatformError> {
        self.post(
            &format!("/projects/{project}/fork"),
            json!({ "namespace_id": namespace }),
        )
    }

    fn list_forks(&self, project: ProjectId) -> Result<Vec<RemoteProject>, PlatformError> {
        self.get_all(&format!("/projects/{project}/forks"), &[])
    }

    fn update_project(
        &self,
        project: ProjectId,
        settings: &ProjectSettings,
    ) -> Result<(), PlatformError> {
        self.send("PUT", &format!("/projects/{project}"), settings)
    }

    fn search_users(&self, search: &str) -> Result<Vec<RemoteUser>, PlatformError> {
        self.get_all("/users", &[("search", search)])
    }

    fn create_user(&self, user: &NewUser) -> Result<RemoteUser, PlatformError> {
        self.post("/users", user)
    }

    fn set_user_attribute(
        &self,
        user: UserId,
        key: &str,
        value: &str,
    ) -> Result<(), PlatformError> {
        self.send(
            "PUT",
            &format!("/users/{user}/custom_attributes/{}", encode_path(key)),
            json!({ "value": value }),
        )
    }

    fn list_deploy_keys(&self, project: ProjectId) -> Result<Vec<DeployKey>, PlatformError> {
        self.get_all(&format!("/projects/{project}/deploy_keys"), &[])
    }

    fn create_deploy_key(
        &self,
        project: ProjectId,
        title: &str,
        key: &str,
    ) -> Result<DeployKey, PlatformError> {
        self.post(
            &format!("/projects/{project}/deploy_keys"),
            json!({ "title": title, "key": key }),
        )
    }

    fn enable_deploy_key(
        &self,
        project: ProjectId,
        key: DeployKeyId,
    ) -> Result<(), PlatformError> {
        self.send(
            "POST",
            &format!("/projects/{project}/deploy_keys/{key}/enable"),
            json!({}),
        )
    }

    fn create_tag(&self, project: ProjectId, tag: &NewTag) -> Result<Tag, PlatformError> {
        self.post(&format!("/projects/{project}/repository/tags"), tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_base_strips_trailing_slash() {
        assert_eq!(
            api_base("https://gitlab.example.org/"),
            "https://gitlab.example.org/api/v4"
        );
    }

    #[test]
    fn project_paths_are_percent_encoded() {
        assert_eq!(
            encode_path("prog1/solutions/m.hans/solutions"),
            "prog1%2Fsolutions%2Fm.hans%2Fsolutions"
        );
    }

    #[test]
    fn from_config_requires_token() {
        let config = Config {
            url: Some("https://gitlab.example.org".into()),
            ..Default::default()
        };
        let err = GitlabClient::from_config(&config).err().expect("must fail");
        assert!(matches!(err, ConfigError::Missing { key: "private_token", .. }));
    }

    #[test]
    fn from_config_builds_api_url() {
        let config = Config {
            url: Some("https://gitlab.example.org/".into()),
            private_token: Some("t0k3n".into()),
            ..Default::default()
        };
        let client = GitlabClient::from_config(&config).expect("client");
        assert_eq!(
            client.url("/groups"),
            "https://gitlab.example.org/api/v4/groups"
        );
    }
}
