//! Options for rewriting document packages.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// The primary document body part.
pub const MAIN_DOCUMENT_PART: &str = "word/document.xml";

/// Which parts of a package to process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PartSelection {
    /// Only `word/document.xml`
    #[default]
    MainDocument,
    /// Body, headers, footers, footnotes and endnotes found in the package
    Discover,
    /// Explicit part names
    Named(Vec<String>),
}

impl PartSelection {
    /// Select explicit part names.
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PartSelection::Named(names.into_iter().map(Into::into).collect())
    }

    /// Resolve the selection against the names present in a package.
    ///
    /// Named and main-document selections are returned as requested, even if
    /// absent, so the caller can apply its missing-part policy.
    pub fn resolve<'a, I>(&self, available: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        match self {
            PartSelection::MainDocument => vec![MAIN_DOCUMENT_PART.to_string()],
            PartSelection::Named(names) => {
                let mut seen = HashSet::new();
                names
                    .iter()
                    .filter(|name| seen.insert(name.as_str()))
                    .cloned()
                    .collect()
            }
            PartSelection::Discover => {
                let mut found: Vec<String> = available
                    .into_iter()
                    .filter(|name| is_content_part(name))
                    .map(str::to_string)
                    .collect();
                found.sort();
                found
            }
        }
    }
}

/// Whether a part name looks like WordprocessingML story content.
pub fn is_content_part(name: &str) -> bool {
    static CONTENT_PART: OnceLock<Regex> = OnceLock::new();
    CONTENT_PART
        .get_or_init(|| {
            Regex::new(r"^word/(document|header\d*|footer\d*|footnotes|endnotes)\.xml$")
                .expect("valid part regex")
        })
        .is_match(name)
}

/// What to do when a selected part is not in the package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingPartPolicy {
    /// Leave the package alone for that part
    #[default]
    Skip,
    /// Fail the whole operation
    Fail,
}

/// Options for accepting revisions across a package.
#[derive(Debug, Clone)]
pub struct PackageOptions {
    /// Parts to rewrite
    pub parts: PartSelection,

    /// Handling of selected parts that do not exist
    pub missing_parts: MissingPartPolicy,

    /// Transform parts in parallel
    pub parallel: bool,

    /// Collect revision warnings for each part
    pub collect_warnings: bool,
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self {
            parts: PartSelection::MainDocument,
            missing_parts: MissingPartPolicy::Skip,
            parallel: true,
            collect_warnings: false,
        }
    }
}

impl PackageOptions {
    /// Create new package options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the part selection.
    pub fn with_parts(mut self, parts: PartSelection) -> Self {
        self.parts = parts;
        self
    }

    /// Process every content part found in the package.
    pub fn discover_parts(mut self) -> Self {
        self.parts = PartSelection::Discover;
        self
    }

    /// Set the missing-part policy.
    pub fn with_missing_parts(mut self, policy: MissingPartPolicy) -> Self {
        self.missing_parts = policy;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Enable or disable warning collection.
    pub fn with_warnings(mut self, collect: bool) -> Self {
        self.collect_warnings = collect;
        self
    }
}
