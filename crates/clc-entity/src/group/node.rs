//! Input hierarchy as delivered by the provider.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Tag distinguishing ordinary user folders from system folders.
///
/// Every tag other than `default` is a *special* type. Special groups are
/// listed ahead of ordinary ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GroupType {
    /// An ordinary user folder.
    #[default]
    Default,
    /// The system archive folder.
    Archive,
    /// The system template folder.
    Template,
    /// Any tag this crate has no name for.
    Other(String),
}

impl GroupType {
    /// Check if this is anything but an ordinary folder.
    pub fn is_special(&self) -> bool {
        !matches!(self, Self::Default)
    }

    /// Return the wire tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Default => "default",
            Self::Archive => "archive",
            Self::Template => "template",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GroupType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "default" | "" => Self::Default,
            "archive" => Self::Archive,
            "template" => Self::Template,
            _ => Self::Other(s.to_string()),
        })
    }
}

impl From<String> for GroupType {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }
}

impl From<GroupType> for String {
    fn from(t: GroupType) -> Self {
        t.as_str().to_string()
    }
}

/// A hardware group: a folder of servers and sub-groups.
///
/// Children are owned by their parent; the hierarchy is a single-rooted
/// tree and `id` is unique across all of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupNode {
    /// Opaque group identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Folder kind.
    #[serde(rename = "type", default)]
    pub group_type: GroupType,
    /// Child groups, in provider order.
    #[serde(default)]
    pub groups: Vec<GroupNode>,
    /// Servers directly inside this group.
    #[serde(default)]
    pub server_ids: Vec<String>,
}

impl GroupNode {
    /// Create a childless, serverless group.
    pub fn new(id: impl Into<String>, name: impl Into<String>, group_type: GroupType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            group_type,
            groups: Vec::new(),
            server_ids: Vec::new(),
        }
    }

    /// Append a child group.
    pub fn with_child(mut self, child: GroupNode) -> Self {
        self.groups.push(child);
        self
    }

    /// Set the directly contained servers.
    pub fn with_servers<I, S>(mut self, servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.server_ids = servers.into_iter().map(Into::into).collect();
        self
    }

    /// Number of groups in this subtree, including `self`.
    pub fn group_count(&self) -> usize {
        1 + self.groups.iter().map(GroupNode::group_count).sum::<usize>()
    }
}
