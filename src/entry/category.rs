//! Closed category set and install-location sources.

use serde::{Deserialize, Serialize};

/// Functional category assigned to an application.
///
/// The set is closed: anything the generator replies that does not map onto
/// one of these labels becomes [`Category::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Productivity,
    Development,
    Design,
    Media,
    Communication,
    Utilities,
    Games,
    Finance,
    Education,
    System,
    Other,
}

impl Category {
    /// Every category, in prompt order.
    pub const ALL: [Category; 11] = [
        Category::Productivity,
        Category::Development,
        Category::Design,
        Category::Media,
        Category::Communication,
        Category::Utilities,
        Category::Games,
        Category::Finance,
        Category::Education,
        Category::System,
        Category::Other,
    ];

    /// Human-readable label, also used on the wire.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Productivity => "Productivity",
            Self::Development => "Development",
            Self::Design => "Design",
            Self::Media => "Media",
            Self::Communication => "Communication",
            Self::Utilities => "Utilities",
            Self::Games => "Games",
            Self::Finance => "Finance",
            Self::Education => "Education",
            Self::System => "System",
            Self::Other => "Other",
        }
    }

    /// Short hint listed next to the label in the categorization prompt.
    #[must_use]
    pub fn hint(self) -> &'static str {
        match self {
            Self::Productivity => "office, notes, documents",
            Self::Development => "coding, IDEs, databases",
            Self::Design => "graphics, video, 3D, UI",
            Self::Media => "music, video, photos, streaming",
            Self::Communication => "email, chat, video calls",
            Self::Utilities => "system tools, file managers",
            Self::Games => "games, entertainment",
            Self::Finance => "accounting, trading, banking",
            Self::Education => "learning, courses, reference",
            Self::System => "OS components, settings",
            Self::Other => "if none fit",
        }
    }

    /// Exact, case-insensitive label lookup.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Install location an entry was discovered in.
///
/// Each source carries a distinct priority; when the same application shows
/// up under several roots the entry from the higher-priority source wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    /// `/Applications`
    #[serde(rename = "Applications")]
    Applications,
    /// `~/Applications`
    #[serde(rename = "User Apps")]
    UserApplications,
    /// `/System/Applications`
    #[serde(rename = "System")]
    System,
    /// `/opt/homebrew/Caskroom`, laid out as `{cask}/{version}/X.app`
    #[serde(rename = "Homebrew")]
    Homebrew,
    /// `~/Library/Application Support/Setapp/Setapp/Applications`
    #[serde(rename = "Setapp")]
    Setapp,
}

impl Source {
    pub const ALL: [Source; 5] = [
        Source::Applications,
        Source::UserApplications,
        Source::System,
        Source::Homebrew,
        Source::Setapp,
    ];

    /// Dedup priority. Higher wins; no two sources share a value.
    #[must_use]
    pub fn priority(self) -> u8 {
        match self {
            Self::Applications => 5,
            Self::UserApplications => 4,
            Self::Homebrew => 3,
            Self::System => 2,
            Self::Setapp => 1,
        }
    }

    /// Depth below the root at which bundles live.
    #[must_use]
    pub fn bundle_depth(self) -> usize {
        match self {
            Self::Homebrew => 3,
            _ => 1,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Applications => "Applications",
            Self::UserApplications => "User Apps",
            Self::System => "System",
            Self::Homebrew => "Homebrew",
            Self::Setapp => "Setapp",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
