//! Requirement declaration parsing
//!
//! Handles requirements.txt lines of the form `name[comparator version]`:
//! - Exact: `requests==2.31.0`
//! - Comparison: `>=`, `<=`, `~=`, `!=`, `<`, `>` (all treated uniformly
//!   as the start of the version constraint)
//! - Extras: `uvicorn[standard]>=0.23` (extras stripped from the name)
//! - Bare names: `numpy`
//!
//! Parsing is pure: it never touches the interpreter or the installer.
//! The original declared string is preserved so the install batch can
//! pass version constraints through verbatim.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Split point before the version constraint. Two-character comparators
/// must be listed before their one-character prefixes.
static COMPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"==|>=|<=|~=|!=|<|>").unwrap());

/// Distribution names whose importable module differs from the
/// normalized distribution name.
const IMPORT_OVERRIDES: &[(&str, &str)] = &[
    ("python-dotenv", "dotenv"),
    ("pyyaml", "yaml"),
    ("scikit-learn", "sklearn"),
    ("pillow", "PIL"),
    ("beautifulsoup4", "bs4"),
    ("opencv-python", "cv2"),
    ("pymongo", "pymongo"),
];

/// A single declared package requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// The original declared string, version constraint included
    pub raw: String,
    /// Normalized distribution name (comparator stripped, case-folded)
    pub name: String,
    /// Module identifier to probe for importability
    pub import_name: String,
}

impl Requirement {
    /// Parse a single non-blank, non-comment declaration line.
    ///
    /// Returns None for lines that carry no package name (e.g. a line
    /// that is only a comparator).
    pub fn parse(line: &str) -> Option<Self> {
        let raw = line.trim();
        if raw.is_empty() || raw.starts_with('#') {
            return None;
        }

        // Everything before the first comparator is the name part.
        let name_part = match COMPARATOR_RE.find(raw) {
            Some(m) => &raw[..m.start()],
            None => raw,
        };

        // Strip extras (`pkg[extra]`) and case-fold.
        let name = name_part
            .split('[')
            .next()
            .unwrap_or(name_part)
            .trim()
            .to_lowercase();
        if name.is_empty() {
            return None;
        }

        let import_name = import_name_for(&name);

        Some(Self {
            raw: raw.to_string(),
            name,
            import_name,
        })
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Map a normalized distribution name to its importable module name.
///
/// The override table wins; otherwise the distribution name is used with
/// `-` and `.` mapped to `_` (the usual wheel-to-module convention).
fn import_name_for(name: &str) -> String {
    for (dist, module) in IMPORT_OVERRIDES {
        if *dist == name {
            return module.to_string();
        }
    }
    name.replace(['-', '.'], "_")
}

/// Parse a whole requirements file into declarations.
///
/// Blank lines and `#`-comments are skipped; order is preserved.
pub fn parse_requirements(content: &str) -> Vec<Requirement> {
    content.lines().filter_map(Requirement::parse).collect()
}
