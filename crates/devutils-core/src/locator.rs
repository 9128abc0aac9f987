//! Output locator: anchors a source function/line inside generated output.
//!
//! Search is literal and case-sensitive. Source lines routinely contain
//! regex metacharacters (`*`, `(`, `[`), so no pattern matching is involved.

use devutils_models::{LocateResult, OutputMode};
use tracing::debug;

/// Marker preceding the procedure name in an assembly listing header,
/// e.g. `?bar@Foo@ns@@QEAAXXZ PROC ; ns::Foo::bar, COMDAT`.
pub const ASSEMBLY_PROC_MARKER: &str = "PROC ; ";

/// Marker following a function name in preprocessed source (its declarator).
pub const PREPROCESSED_CALL_MARKER: &str = "(";

/// Generic-parameter marker at which signatures are truncated.
const GENERIC_MARKER: char = '<';

/// Truncates a template signature right after its first `<`.
///
/// Generated output names instantiations (`bar<int>`), which the source
/// signature (`bar<T>`) cannot predict, so only the prefix is searched.
/// A leading `<` is not treated as a template marker.
pub fn normalize_signature(signature: &str) -> &str {
    match signature.find(GENERIC_MARKER) {
        Some(pos) if pos > 0 => &signature[..pos + GENERIC_MARKER.len_utf8()],
        _ => signature,
    }
}

/// Computes cursor anchors in a generated artifact.
#[derive(Debug, Clone, Copy)]
pub struct OutputLocator {
    mode: OutputMode,
}

impl OutputLocator {
    /// Creates a locator for the given artifact kind.
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    /// Returns the artifact kind.
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Builds the literal needle for the function anchor.
    pub fn function_needle(&self, signature: &str) -> Option<String> {
        let normalized = normalize_signature(signature.trim());
        if normalized.is_empty() {
            return None;
        }
        let needle = match self.mode {
            OutputMode::Assembly => format!("{}{}", ASSEMBLY_PROC_MARKER, normalized),
            OutputMode::Preprocessed if normalized.ends_with(GENERIC_MARKER) => {
                normalized.to_string()
            }
            OutputMode::Preprocessed => format!("{}{}", normalized, PREPROCESSED_CALL_MARKER),
        };
        Some(needle)
    }

    /// Locates the function and then the source line in `artifact`.
    ///
    /// The line search continues after the function anchor. The returned
    /// offset is the start of the last successful match, or 0.
    pub fn locate(&self, artifact: &str, signature: &str, line: Option<&str>) -> LocateResult {
        self.locate_bytes(artifact.as_bytes(), signature, line)
    }

    /// Same as [`OutputLocator::locate`] over the artifact's raw bytes.
    ///
    /// Listings may carry source lines in a legacy codepage; searching the
    /// bytes keeps `cursor_offset` valid for the file on disk.
    pub fn locate_bytes(&self, artifact: &[u8], signature: &str, line: Option<&str>) -> LocateResult {
        let mut result = LocateResult::document_start();
        let mut position = 0;

        if let Some(needle) = self.function_needle(signature) {
            if let Some(found) = find_bytes(artifact, needle.as_bytes()) {
                result.function_anchor_found = true;
                result.cursor_offset = found;
                position = found + needle.len();
            }
            debug!(
                needle = %needle,
                found = result.function_anchor_found,
                "function anchor search"
            );
        }

        if let Some(code) = line.map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(found) = find_bytes(&artifact[position..], code.as_bytes()) {
                result.line_anchor_found = true;
                result.cursor_offset = position + found;
            }
            debug!(code = %code, found = result.line_anchor_found, "line anchor search");
        }

        result.cursor_line = line_number_at(artifact, result.cursor_offset);
        result
    }
}

/// Literal substring search. `needle` must be non-empty.
fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Returns the 1-based line number containing byte `offset`.
fn line_number_at(text: &[u8], offset: usize) -> usize {
    let end = offset.min(text.len());
    text[..end].iter().filter(|&&b| b == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
; Listing generated by Microsoft (R) Optimizing Compiler
_TEXT\tSEGMENT
?helper@@YAHH@Z PROC ; helper, COMDAT
; 3    :     return x = compute(y);
\tret\t0
?helper@@YAHH@Z ENDP ; helper
?bar@Foo@ns@@QEAAXXZ PROC ; ns::Foo::bar, COMDAT
; 12   :     x = compute(y);
\tcall\t?compute@@YAHH@Z
?bar@Foo@ns@@QEAAXXZ ENDP ; ns::Foo::bar
";

    #[test]
    fn test_normalize_signature() {
        assert_eq!(normalize_signature("ns::Foo::bar<T>"), "ns::Foo::bar<");
        assert_eq!(normalize_signature("ns::Foo<A>::bar<B>"), "ns::Foo<");
        assert_eq!(normalize_signature("ns::Foo::bar"), "ns::Foo::bar");
        assert_eq!(normalize_signature("<lambda>"), "<lambda>");
        assert_eq!(normalize_signature(""), "");
    }

    #[test]
    fn test_function_then_line() {
        let locator = OutputLocator::new(OutputMode::Assembly);
        let result = locator.locate(LISTING, "ns::Foo::bar", Some("  x = compute(y);  "));

        assert!(result.function_anchor_found);
        assert!(result.line_anchor_found);

        let function_pos = LISTING.find("PROC ; ns::Foo::bar").unwrap();
        let expected = function_pos + LISTING[function_pos..].find("x = compute(y);").unwrap();
        assert_eq!(result.cursor_offset, expected);
        assert_eq!(result.cursor_line, 8);
    }

    #[test]
    fn test_line_search_continues_after_function() {
        // "x = compute(y);" also occurs inside helper, before ns::Foo::bar.
        let locator = OutputLocator::new(OutputMode::Assembly);
        let result = locator.locate(LISTING, "ns::Foo::bar", Some("x = compute(y);"));
        let first = LISTING.find("x = compute(y);").unwrap();
        assert!(result.cursor_offset > first);
    }

    #[test]
    fn test_template_signature_matches_instantiation() {
        let listing = "??$bar@H@Foo@ns@@QEAAXXZ PROC ; ns::Foo::bar<int>, COMDAT\n\tret\t0\n";
        let locator = OutputLocator::new(OutputMode::Assembly);

        assert_eq!(
            locator.function_needle("ns::Foo::bar<T>").as_deref(),
            Some("PROC ; ns::Foo::bar<")
        );
        let result = locator.locate(listing, "ns::Foo::bar<T>", None);
        assert!(result.function_anchor_found);
        assert_eq!(result.cursor_offset, listing.find("PROC ; ").unwrap());
    }

    #[test]
    fn test_nothing_found_defaults_to_start() {
        let locator = OutputLocator::new(OutputMode::Assembly);
        let result = locator.locate(LISTING, "other::fn", Some("y = 42;"));

        assert!(!result.function_anchor_found);
        assert!(!result.line_anchor_found);
        assert_eq!(result.cursor_offset, 0);
        assert_eq!(result.cursor_line, 1);
    }

    #[test]
    fn test_line_found_without_function() {
        let locator = OutputLocator::new(OutputMode::Assembly);
        let result = locator.locate(LISTING, "", Some("call"));

        assert!(!result.function_anchor_found);
        assert!(result.line_anchor_found);
        assert_eq!(result.cursor_offset, LISTING.find("call").unwrap());
    }

    #[test]
    fn test_function_kept_when_line_missing() {
        let locator = OutputLocator::new(OutputMode::Assembly);
        let result = locator.locate(LISTING, "ns::Foo::bar", Some("optimized_away();"));

        assert!(result.function_anchor_found);
        assert!(!result.line_anchor_found);
        assert_eq!(result.cursor_offset, LISTING.find("PROC ; ns::Foo::bar").unwrap());
    }

    #[test]
    fn test_blank_line_is_ignored() {
        let locator = OutputLocator::new(OutputMode::Assembly);
        let result = locator.locate(LISTING, "", Some("   "));
        assert!(!result.is_anchored());
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let text = "int a;\nv[i] = *(p + 1);\n";
        let locator = OutputLocator::new(OutputMode::Preprocessed);
        let result = locator.locate(text, "", Some("v[i] = *(p + 1);"));

        assert!(result.line_anchor_found);
        assert_eq!(result.cursor_line, 2);
    }

    #[test]
    fn test_case_sensitive() {
        let locator = OutputLocator::new(OutputMode::Assembly);
        let result = locator.locate(LISTING, "NS::FOO::BAR", None);
        assert!(!result.function_anchor_found);
    }

    #[test]
    fn test_preprocessed_marker() {
        let text = "namespace ns {\nvoid Foo::bar() {}\n}\nvoid ns::Foo::bar(int v)\n{\n  x = compute(v);\n}\n";
        let locator = OutputLocator::new(OutputMode::Preprocessed);
        let result = locator.locate(text, "ns::Foo::bar", Some("x = compute(v);"));

        assert!(result.function_anchor_found);
        assert!(result.line_anchor_found);
        assert_eq!(result.cursor_line, 6);
    }

    #[test]
    fn test_offset_counts_raw_bytes() {
        let listing: &[u8] = b"; 3 : // caf\xE9\n?f@@YAXXZ PROC ; f, COMDAT\n; 4 : x = compute(y);\n";
        let locator = OutputLocator::new(OutputMode::Assembly);
        let result = locator.locate_bytes(listing, "f", Some("x = compute(y);"));

        assert!(result.function_anchor_found);
        assert!(result.line_anchor_found);
        assert_eq!(result.cursor_offset, 47);
        assert_eq!(&listing[47..62], b"x = compute(y);");
        assert_eq!(result.cursor_line, 3);
    }

    #[test]
    fn test_preprocessed_template_drops_marker() {
        let locator = OutputLocator::new(OutputMode::Preprocessed);
        assert_eq!(locator.function_needle("ns::bar<T>").as_deref(), Some("ns::bar<"));
        assert_eq!(locator.function_needle("ns::bar").as_deref(), Some("ns::bar("));
        assert_eq!(locator.function_needle("  "), None);
    }
}
