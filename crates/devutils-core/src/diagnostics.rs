//! Diagnostic extractor for compiler remark lines in build output.
//!
//! Scans text like:
//! ```text
//! 1>c:\src\engine\foo.cpp(42) : info C5002: loop not vectorized due to reason '1203'
//! ```
//!
//! and turns every remark into a `Diagnostic` with file, line and reason code.

use regex::Regex;
use std::sync::LazyLock;

use devutils_models::Diagnostic;
use tracing::debug;

/// Splits a location token of the form `<path>(<line>)`.
static LOCATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)\((\d+)\)$").expect("Invalid location regex"));

/// A family of compiler remarks sharing the
/// `<location> : info <id>: <text> due to reason '<code>'` shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemarkFamily {
    /// Remark id after the `info` keyword (e.g. `C5002`).
    pub id: &'static str,
    /// Fixed remark text preceding the reason.
    pub text: &'static str,
}

impl RemarkFamily {
    /// Auto-vectorizer failures.
    pub const LOOP_NOT_VECTORIZED: RemarkFamily = RemarkFamily {
        id: "C5002",
        text: "loop not vectorized",
    };

    /// Auto-parallelizer failures.
    pub const LOOP_NOT_PARALLELIZED: RemarkFamily = RemarkFamily {
        id: "C5012",
        text: "loop not parallelized",
    };

    /// Builds the remark regex for this family.
    ///
    /// The location group allows a drive prefix but no other colon, so it
    /// never runs into the preceding `N>` project prefix or a previous line.
    fn pattern(&self) -> String {
        let text = regex::escape(self.text).replace(' ', r"[ \t]+");
        format!(
            r#">?[ \t]*(?P<loc>(?:[A-Za-z]:[\\/])?[^:<>|"\r\n]+?)[ \t]*:[ \t]*info[ \t]+{id}:[ \t]*{text}[ \t]+due[ \t]+to[ \t]+reason[ \t]+'(?P<code>\d+)'"#,
            id = regex::escape(self.id),
            text = text,
        )
    }
}

/// Extracts structured diagnostics for one remark family.
#[derive(Debug, Clone)]
pub struct DiagnosticExtractor {
    family: RemarkFamily,
    regex: Regex,
}

impl Default for DiagnosticExtractor {
    fn default() -> Self {
        Self::new(RemarkFamily::LOOP_NOT_VECTORIZED)
    }
}

impl DiagnosticExtractor {
    /// Creates an extractor for the given remark family.
    pub fn new(family: RemarkFamily) -> Self {
        Self {
            family,
            regex: Regex::new(&family.pattern()).expect("Invalid remark regex"),
        }
    }

    /// Returns the remark family this extractor matches.
    pub fn family(&self) -> RemarkFamily {
        self.family
    }

    /// Scans `text` and returns one diagnostic per well-formed remark.
    ///
    /// Matches whose location is not `<path>(<line>)` are skipped.
    ///
    /// # Example
    /// ```
    /// use devutils_core::DiagnosticExtractor;
    ///
    /// let log = "foo.cpp(42): info C5002: loop not vectorized due to reason '1203'";
    /// let found = DiagnosticExtractor::default().extract(log);
    /// assert_eq!(found.len(), 1);
    /// assert_eq!(found[0].file_path, "foo.cpp");
    /// assert_eq!(found[0].line, 42);
    /// assert_eq!(found[0].code, "1203");
    /// ```
    pub fn extract(&self, text: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for caps in self.regex.captures_iter(text) {
            let (Some(whole), Some(loc), Some(code)) =
                (caps.get(0), caps.name("loc"), caps.name("code"))
            else {
                continue;
            };

            let location = loc.as_str().trim();
            let Some((path, line)) = split_location(location) else {
                debug!(location = %location, "skipping remark with malformed location");
                continue;
            };

            let raw = whole.as_str().trim_start_matches('>').trim();
            diagnostics.push(Diagnostic::new(raw, path, line, code.as_str()));
        }

        debug!(
            remark = self.family.id,
            count = diagnostics.len(),
            "extracted diagnostics"
        );
        diagnostics
    }
}

/// Splits `path(line)` into its parts. Line numbers are 1-based.
fn split_location(location: &str) -> Option<(&str, u32)> {
    let caps = LOCATION_REGEX.captures(location)?;
    let path = caps.get(1)?.as_str().trim();
    if path.is_empty() {
        return None;
    }
    let line = caps
        .get(2)?
        .as_str()
        .parse::<u32>()
        .ok()
        .filter(|&l| l > 0)?;
    Some((path, line))
}
