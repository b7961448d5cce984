//! Route Registry - Load the legal action table from JSON
//!
//! One JSON file per platform is embedded at compile time. Each entry names
//! the mode, the action, the handler that implements it and the parameters
//! that must be present before dispatch.

use super::{Action, Handler, Mode, Param, Platform};
use serde::Deserialize;
use std::sync::OnceLock;

/// Embedded route files (compiled into the binary)
const ROUTE_FILES: &[&str] = &[
    include_str!("../routes/aws.json"),
    include_str!("../routes/gcp.json"),
    include_str!("../routes/azure.json"),
];

/// Composite key a route is looked up by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub mode: Mode,
    pub platform: Platform,
    pub action: Action,
}

/// Route entry as written in JSON
#[derive(Debug, Clone, Deserialize)]
struct RouteEntry {
    modes: Vec<Mode>,
    action: Action,
    handler: Handler,
    #[serde(default)]
    required: Vec<Param>,
    description: String,
}

/// Root structure of routes/*.json
#[derive(Debug, Clone, Deserialize)]
struct RouteFile {
    platform: Platform,
    routes: Vec<RouteEntry>,
}

/// A resolved route
#[derive(Debug, Clone)]
pub struct RouteDef {
    pub key: RouteKey,
    pub handler: Handler,
    pub required: Vec<Param>,
    pub description: String,
}

/// All routes, in file order
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    pub routes: Vec<RouteDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<RouteTable> = OnceLock::new();

/// Get the route registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static RouteTable {
    REGISTRY.get_or_init(|| {
        let mut table = RouteTable::default();

        for content in ROUTE_FILES {
            let file: RouteFile = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded route JSON: {}", e));

            for entry in file.routes {
                for mode in &entry.modes {
                    table.routes.push(RouteDef {
                        key: RouteKey {
                            mode: *mode,
                            platform: file.platform,
                            action: entry.action,
                        },
                        handler: entry.handler,
                        required: entry.required.clone(),
                        description: entry.description.clone(),
                    });
                }
            }
        }

        table
    })
}

/// Get a route by key
pub fn lookup(key: &RouteKey) -> Option<&'static RouteDef> {
    get_registry().routes.iter().find(|r| r.key == *key)
}

/// Legal actions for a mode and platform, in table order
pub fn legal_actions(mode: Mode, platform: Platform) -> Vec<Action> {
    get_registry()
        .routes
        .iter()
        .filter(|r| r.key.mode == mode && r.key.platform == platform)
        .map(|r| r.key.action)
        .collect()
}
