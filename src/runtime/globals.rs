use serde::Deserialize;

const DEFAULT_ALLOWED: &[&str] = &[
    "game",
    "workspace",
    "Color3",
    "UDim2",
    "UDim",
    "Enum",
    "Instance",
    "Vector2",
    "Vector3",
    "TweenInfo",
];

/**
    Host globals that are copied directly into every module environment.

    Anything not listed here is still reachable from module code through
    the environment's fallback to the host global table, but only the
    listed names are captured up front when the module is loaded.
*/
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostGlobals {
    allow: Vec<String>,
}

impl HostGlobals {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allow: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.allow.iter().map(String::as_str)
    }
}

impl Default for HostGlobals {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED.iter().copied())
    }
}
