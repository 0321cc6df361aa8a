//! Shared types for the help subsystem.
//!
//! This crate provides the value types used across cwf-help-ipc,
//! cwf-help-core and the command line front end. Everything here is
//! serializable so it can travel inside cross-window invocation requests.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Prefix applied to class-path style help resources.
pub const WEB_ROOT: &str = "/web";

/// Prefix marking a resource relative to the web root (`~./foo` -> `/web/foo`).
const WEB_RELATIVE_PREFIX: &str = "~./";

/// Expand a help set path into a servable URL path.
///
/// - Paths starting with `/` or `.` are returned unchanged.
/// - Paths starting with `~./` have the `~.` replaced by `/web`.
/// - Anything else is prefixed with `/web/`.
#[must_use]
pub fn encode_url(path: &str) -> String {
    if path.starts_with('/') || path.starts_with('.') {
        path.to_string()
    } else if let Some(rest) = path.strip_prefix(WEB_RELATIVE_PREFIX) {
        format!("{WEB_ROOT}/{rest}")
    } else {
        format!("{WEB_ROOT}/{path}")
    }
}

/// A single addressable unit of help content.
///
/// Two topics are equal when both label and url match. Topics sort by label,
/// ignoring case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpTopic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub label: String,
    #[serde(default)]
    pub source: String,
}

impl HelpTopic {
    #[must_use]
    pub fn new(url: Option<String>, label: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            url,
            label: label.into(),
            source: source.into(),
        }
    }

    /// Topic with a url, the common case for navigable content.
    #[must_use]
    pub fn with_url(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(Some(url.into()), label, "")
    }

    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    #[must_use]
    pub fn has_url(&self) -> bool {
        self.url.is_some()
    }

    /// Copy of this topic attributed to another source (normally a help set name).
    #[must_use]
    pub fn with_source(&self, source: impl Into<String>) -> Self {
        Self {
            url: self.url.clone(),
            label: self.label.clone(),
            source: source.into(),
        }
    }

    /// True if both topics point at the same url under labels that differ at most in case.
    #[must_use]
    pub fn is_duplicate(&self, other: &HelpTopic) -> bool {
        self.url == other.url && compare_ignore_case(&self.label, &other.label) == Ordering::Equal
    }
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

impl PartialEq for HelpTopic {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label && self.url == other.url
    }
}

impl Eq for HelpTopic {}

impl Hash for HelpTopic {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label.hash(state);
        self.url.hash(state);
    }
}

impl Ord for HelpTopic {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_ignore_case(&self.label, &other.label)
            .then_with(|| self.label.cmp(&other.label))
            .then_with(|| self.url.cmp(&other.url))
    }
}

impl PartialOrd for HelpTopic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for HelpTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Navigator views a help set may provide. Declaration order is tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HelpViewType {
    Toc,
    Keyword,
    Index,
    Search,
    History,
    Glossary,
}

impl HelpViewType {
    pub const ALL: [HelpViewType; 6] = [
        HelpViewType::Toc,
        HelpViewType::Keyword,
        HelpViewType::Index,
        HelpViewType::Search,
        HelpViewType::History,
        HelpViewType::Glossary,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HelpViewType::Toc => "toc",
            HelpViewType::Keyword => "keyword",
            HelpViewType::Index => "index",
            HelpViewType::Search => "search",
            HelpViewType::History => "history",
            HelpViewType::Glossary => "glossary",
        }
    }

    /// Default tab label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            HelpViewType::Toc => "Contents",
            HelpViewType::Keyword => "Keywords",
            HelpViewType::Index => "Index",
            HelpViewType::Search => "Search",
            HelpViewType::History => "History",
            HelpViewType::Glossary => "Glossary",
        }
    }
}

impl fmt::Display for HelpViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownViewType(pub String);

impl fmt::Display for UnknownViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown help view type: {}", self.0)
    }
}

impl std::error::Error for UnknownViewType {}

impl FromStr for HelpViewType {
    type Err = UnknownViewType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HelpViewType::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownViewType(s.to_string()))
    }
}

fn default_format() -> String {
    "json".to_string()
}

/// Descriptor of an installed help module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpModule {
    pub id: String,
    pub title: String,
    /// Location of the help set definition, in help-set path notation (see [`encode_url`]).
    pub url: String,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl HelpModule {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            format: default_format(),
            version: String::new(),
            locale: None,
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Registry key: the id, suffixed with `_locale` when a locale is set.
    #[must_use]
    pub fn key(&self) -> String {
        match &self.locale {
            Some(locale) if !locale.is_empty() => format!("{}_{locale}", self.id),
            _ => self.id.clone(),
        }
    }

    /// Directory portion of the module url, including the trailing `/`.
    #[must_use]
    pub fn base_path(&self) -> &str {
        match self.url.rfind('/') {
            Some(i) => &self.url[..=i],
            None => "",
        }
    }
}

/// Target of a context-sensitive help request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpContext {
    pub module: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl HelpContext {
    #[must_use]
    pub fn new(module: impl Into<String>, topic: Option<String>, label: Option<String>) -> Self {
        Self {
            module: module.into(),
            topic,
            label,
        }
    }
}
