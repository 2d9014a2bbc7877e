use serde::Deserialize;

/// A build as returned by the Drone API.
///
/// List responses leave `stages` empty; the detail endpoint fills it in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Build {
    pub number: i64,
    pub status: String,
    pub event: String,
    pub message: String,
    pub author_name: String,
    pub stages: Vec<Stage>,
}

impl Build {
    /// First line of the commit message, trimmed.
    pub fn title(&self) -> &str {
        self.message.lines().next().unwrap_or_default().trim()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Stage {
    pub number: i64,
    pub name: String,
    pub status: String,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Step {
    pub number: i64,
    pub name: String,
    pub status: String,
}

/// Pagination for the build list call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub page: i64,
    pub size: i64,
}

impl ListOptions {
    // Zero fields are left out so the server applies its own default.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if self.page != 0 {
            params.push(("page", self.page.to_string()));
        }
        if self.size != 0 {
            params.push(("per_page", self.size.to_string()));
        }
        params
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub message: String,
}
