use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::scraper::SourceProfile;

/// Stable identifier of a target, e.g. `abc-bullion` or `iphone-12-pro/256gb`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier for a `name` + `variant` pair in a price matrix.
    pub fn for_variant(name: &str, variant: &str) -> Self {
        Self(format!("{}/{}", name, variant))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One priced item/variant combination to be scraped.
#[derive(Debug, Clone)]
pub struct Target {
    pub id: TargetId,
    pub label: String,
    pub name: String,
    pub variant: Option<String>,
    /// Prefix shown before the label in reports
    pub icon: Option<String>,
    url_template: String,
    profile: Arc<SourceProfile>,
}

impl Target {
    /// A single-page target with no variant.
    pub fn single(
        id: impl Into<String>,
        label: impl Into<String>,
        url: impl Into<String>,
        profile: Arc<SourceProfile>,
    ) -> Self {
        let id = id.into();
        Self {
            id: TargetId::new(id.clone()),
            label: label.into(),
            name: id,
            variant: None,
            icon: None,
            url_template: url.into(),
            profile,
        }
    }

    /// One cell of a name × variant matrix sharing a URL template.
    pub fn variant(
        name: impl Into<String>,
        variant: impl Into<String>,
        url_template: impl Into<String>,
        profile: Arc<SourceProfile>,
    ) -> Self {
        let name = name.into();
        let variant = variant.into();
        Self {
            id: TargetId::for_variant(&name, &variant),
            label: name.clone(),
            name,
            variant: Some(variant),
            icon: None,
            url_template: url_template.into(),
            profile,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Render the URL template, substituting `{name}` and `{variant}`.
    pub fn url(&self) -> String {
        self.url_template
            .replace("{name}", &self.name)
            .replace("{variant}", self.variant.as_deref().unwrap_or(""))
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    pub fn profile(&self) -> &SourceProfile {
        &self.profile
    }

    /// Label including the variant, used in reports and logs.
    pub fn display_name(&self) -> String {
        match &self.variant {
            Some(v) => format!("{} {}", self.label, v),
            None => self.label.clone(),
        }
    }

    /// Display name with the icon prefix, if any.
    pub fn heading(&self) -> String {
        match &self.icon {
            Some(icon) => format!("{} {}", icon, self.display_name()),
            None => self.display_name(),
        }
    }
}

/// Build the full matrix of targets, names outermost.
pub fn matrix_targets(
    names: &[String],
    variants: &[String],
    url_template: &str,
    profile: Arc<SourceProfile>,
) -> Vec<Target> {
    names
        .iter()
        .flat_map(|name| {
            let profile = profile.clone();
            variants
                .iter()
                .map(move |v| Target::variant(name.clone(), v.clone(), url_template, profile.clone()))
        })
        .collect()
}
