//! Route descriptors (static and permission-gated).

use serde::{Deserialize, Serialize};

use crate::Permission;

/// Per-route access metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMeta {
    /// Reachable without a token (login page, public landing pages...).
    #[serde(default)]
    pub public: bool,

    /// Permission the session must hold for this route to be generated.
    #[serde(default)]
    pub required_permission: Option<Permission>,

    #[serde(default)]
    pub title: Option<String>,
}

/// A node of the routing table.
///
/// Child paths are relative to their parent unless they start with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub path: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub meta: RouteMeta,

    #[serde(default)]
    pub children: Vec<RouteDescriptor>,
}

impl RouteDescriptor {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            meta: RouteMeta::default(),
            children: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn public(mut self) -> Self {
        self.meta.public = true;
        self
    }

    pub fn requires(mut self, permission: impl Into<Permission>) -> Self {
        self.meta.required_permission = Some(permission.into());
        self
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.meta.title = Some(title.into());
        self
    }

    pub fn with_children(mut self, children: Vec<RouteDescriptor>) -> Self {
        self.children = children;
        self
    }

    /// Every route of this subtree as `(absolute path, meta)`, parents first.
    pub fn flatten(&self) -> Vec<(String, RouteMeta)> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(&self, parent: &str, out: &mut Vec<(String, RouteMeta)>) {
        let full = join_path(parent, &self.path);
        out.push((full.clone(), self.meta.clone()));
        for child in &self.children {
            child.flatten_into(&full, out);
        }
    }
}

/// Join a child route path onto its parent's absolute path.
pub fn join_path(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        return child.to_string();
    }
    if child.is_empty() {
        return if parent.is_empty() { "/".to_string() } else { parent.to_string() };
    }
    format!("{}/{}", parent.trim_end_matches('/'), child)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_joins_relative_children() {
        let route = RouteDescriptor::new("/reports").with_children(vec![
            RouteDescriptor::new("daily"),
            RouteDescriptor::new("/audit"),
            RouteDescriptor::new(""),
        ]);

        let paths: Vec<String> = route.flatten().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["/reports", "/reports/daily", "/audit", "/reports"]);
    }

    #[test]
    fn join_path_handles_root_parent() {
        assert_eq!(join_path("/", "dashboard"), "/dashboard");
        assert_eq!(join_path("", ""), "/");
    }

    #[test]
    fn meta_defaults_when_missing_from_json() {
        let route: RouteDescriptor = serde_json::from_str(r#"{"path":"/x"}"#).unwrap();
        assert!(!route.meta.public);
        assert!(route.meta.required_permission.is_none());
        assert!(route.children.is_empty());
    }
}
