//! Provider v2 API payloads.

use serde::{Deserialize, Serialize};

use clc_entity::group::GroupNode;

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    pub account_alias: String,
    pub bearer_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Link {
    pub rel: String,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Datacenter {
    pub id: String,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Datacenter {
    /// Id of the datacenter's root hardware group.
    pub fn root_group_id(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel == "group")
            .and_then(|l| l.id.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiGroup {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub group_type: Option<String>,
    #[serde(default)]
    pub groups: Vec<ApiGroup>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl From<ApiGroup> for GroupNode {
    fn from(g: ApiGroup) -> Self {
        let server_ids = g
            .links
            .iter()
            .filter(|l| l.rel == "server")
            .filter_map(|l| l.id.clone())
            .collect();

        GroupNode {
            id: g.id,
            name: g.name,
            group_type: g.group_type.unwrap_or_default().into(),
            groups: g.groups.into_iter().map(GroupNode::from).collect(),
            server_ids,
        }
    }
}
