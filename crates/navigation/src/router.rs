//! Router contract and the in-memory routing table.

use std::collections::{BTreeMap, HashSet};
use std::sync::{PoisonError, RwLock};

use gatehouse_auth::{RouteDescriptor, RouteMeta};
use gatehouse_core::Reloader;

use crate::Location;

/// A route matched for a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Registered pattern (`/users/:id`).
    pub pattern: String,
    pub meta: RouteMeta,
    pub params: BTreeMap<String, String>,
}

/// What the guard and its driver need from a router.
pub trait Router: Send + Sync {
    /// Append routes to the navigable table.
    fn add_routes(&self, routes: Vec<RouteDescriptor>);

    fn match_route(&self, path: &str) -> Option<RouteMatch>;

    /// Record a settled navigation in history.
    fn commit(&self, location: &Location);

    fn current(&self) -> Option<Location>;
}

#[derive(Debug, Clone)]
struct Entry {
    pattern: String,
    segments: Vec<String>,
    meta: RouteMeta,
}

impl Entry {
    fn new(pattern: String, meta: RouteMeta) -> Self {
        let segments = split(&pattern).map(str::to_string).collect();
        Self {
            pattern,
            segments,
            meta,
        }
    }

    fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let mut params = BTreeMap::new();
        let mut parts = split(path);
        for segment in &self.segments {
            if segment == "*" {
                let rest: Vec<&str> = parts.by_ref().collect();
                params.insert("pathMatch".to_string(), rest.join("/"));
                return Some(params);
            }
            let part = parts.next()?;
            match segment.strip_prefix(':') {
                Some(name) => {
                    params.insert(name.to_string(), part.to_string());
                }
                None if segment == part => {}
                None => return None,
            }
        }
        match parts.next() {
            Some(_) => None,
            None => Some(params),
        }
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// In-memory routing table with static routes and a per-session dynamic set.
///
/// Dynamic routes whose path is already registered are ignored, so a late
/// (stale) permission resolution appending the same routes twice is harmless.
/// [`Reloader::reload`] drops the dynamic set, as a full page reload would.
#[derive(Debug)]
pub struct RouteTable {
    static_routes: Vec<Entry>,
    dynamic: RwLock<Vec<Entry>>,
    history: RwLock<Vec<Location>>,
}

impl RouteTable {
    pub fn new(static_routes: Vec<RouteDescriptor>) -> Self {
        let static_routes = static_routes
            .iter()
            .flat_map(RouteDescriptor::flatten)
            .map(|(pattern, meta)| Entry::new(pattern, meta))
            .collect();
        Self {
            static_routes,
            dynamic: RwLock::new(Vec::new()),
            history: RwLock::new(Vec::new()),
        }
    }

    /// Patterns of the dynamic routes, in registration order.
    pub fn dynamic_paths(&self) -> Vec<String> {
        self.dynamic
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| e.pattern.clone())
            .collect()
    }

    pub fn history(&self) -> Vec<Location> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Router for RouteTable {
    fn add_routes(&self, routes: Vec<RouteDescriptor>) {
        let mut dynamic = self.dynamic.write().unwrap_or_else(PoisonError::into_inner);
        let mut known: HashSet<String> = self
            .static_routes
            .iter()
            .chain(dynamic.iter())
            .map(|e| e.pattern.clone())
            .collect();

        let mut added = 0usize;
        for (pattern, meta) in routes.iter().flat_map(RouteDescriptor::flatten) {
            if known.insert(pattern.clone()) {
                dynamic.push(Entry::new(pattern, meta));
                added += 1;
            }
        }
        tracing::debug!(added, total = dynamic.len(), "dynamic routes registered");
    }

    fn match_route(&self, path: &str) -> Option<RouteMatch> {
        let dynamic = self.dynamic.read().unwrap_or_else(PoisonError::into_inner);
        self.static_routes
            .iter()
            .chain(dynamic.iter())
            .find_map(|entry| {
                entry.matches(path).map(|params| RouteMatch {
                    pattern: entry.pattern.clone(),
                    meta: entry.meta.clone(),
                    params,
                })
            })
    }

    fn commit(&self, location: &Location) {
        let mut history = self.history.write().unwrap_or_else(PoisonError::into_inner);
        if location.replace {
            history.pop();
        }
        history.push(location.clone());
    }

    fn current(&self) -> Option<Location> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Reloader for RouteTable {
    fn reload(&self) {
        self.dynamic
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        tracing::info!("route table reloaded; dynamic routes dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table() -> RouteTable {
        RouteTable::new(vec![
            RouteDescriptor::new("/login").public(),
            RouteDescriptor::new("/"),
            RouteDescriptor::new("/users/:id").with_children(vec![RouteDescriptor::new("posts")]),
        ])
    }

    #[test]
    fn matches_static_and_param_routes() {
        let table = table();
        assert!(table.match_route("/login").unwrap().meta.public);
        assert_eq!(table.match_route("/").unwrap().pattern, "/");

        let m = table.match_route("/users/42").unwrap();
        assert_eq!(m.pattern, "/users/:id");
        assert_eq!(m.params.get("id").map(String::as_str), Some("42"));

        let m = table.match_route("/users/42/posts").unwrap();
        assert_eq!(m.pattern, "/users/:id/posts");
        assert!(table.match_route("/users").is_none());
        assert!(table.match_route("/reports").is_none());
    }

    #[test]
    fn catch_all_captures_remaining_segments() {
        let table = RouteTable::new(vec![RouteDescriptor::new("/docs/*")]);
        let m = table.match_route("/docs/a/b").unwrap();
        assert_eq!(m.params.get("pathMatch").map(String::as_str), Some("a/b"));
    }

    #[test]
    fn add_routes_is_idempotent_per_path() {
        let table = table();
        let routes = vec![
            RouteDescriptor::new("/reports").requires("reports.read"),
            RouteDescriptor::new("/login"),
        ];
        table.add_routes(routes.clone());
        table.add_routes(routes);
        assert_eq!(table.dynamic_paths(), vec!["/reports"]);
        assert!(table.match_route("/reports").is_some());
    }

    #[test]
    fn reload_drops_dynamic_routes_only() {
        let table = table();
        table.add_routes(vec![RouteDescriptor::new("/reports")]);
        table.reload();
        assert!(table.dynamic_paths().is_empty());
        assert!(table.match_route("/reports").is_none());
        assert!(table.match_route("/login").is_some());
    }

    #[test]
    fn commit_replace_overwrites_current_entry() {
        let table = table();
        table.commit(&Location::new("/"));
        table.commit(&Location::new("/reports"));
        table.commit(&Location::parse("/reports?page=2").replacing());

        let history = table.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].path, "/");
        let current = table.current().unwrap();
        assert_eq!(current.href(), "/reports?page=2");
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

        #[test]
        fn repeated_additions_match_a_single_one(
            names in proptest::collection::vec("[a-c]{1,2}", 0..6),
            repeats in 1usize..4,
        ) {
            let routes: Vec<RouteDescriptor> = names
                .iter()
                .map(|n| RouteDescriptor::new(format!("/{n}")))
                .collect();

            let once = table();
            once.add_routes(routes.clone());

            let many = table();
            for _ in 0..repeats {
                many.add_routes(routes.clone());
            }

            prop_assert_eq!(once.dynamic_paths(), many.dynamic_paths());
        }
    }
}
