//! Python import extractor using Tree-sitter.

use std::path::Path;
use tree_sitter::{Language, Node, Parser, TreeCursor};

use crate::extractor::LanguageExtractor;
use crate::types::{FileError, ImportDeclaration, ImportForm};

/// Longest snippet of offending source quoted in a parse error.
const SNIPPET_LEN: usize = 40;

/// Extracts `import` and `from … import` declarations from Python source.
#[derive(Clone)]
pub struct PythonExtractor {
    language: Language,
}

impl PythonExtractor {
    /// Creates a new Python extractor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }

    /// Checks that the grammar is compatible with the linked Tree-sitter
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns the runtime's error message on an ABI mismatch.
    pub fn verify(&self) -> Result<(), String> {
        Parser::new()
            .set_language(&self.language)
            .map_err(|e| e.to_string())
    }

    fn text<'a>(node: &Node<'_>, src: &'a [u8]) -> &'a str {
        node.utf8_text(src).unwrap_or("")
    }

    /// Join identifier children of a `dotted_name` node with dots.
    fn dotted_name(node: &Node<'_>, src: &[u8]) -> String {
        let mut parts = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "identifier" {
                parts.push(Self::text(&child, src));
            }
        }
        parts.join(".")
    }

    /// `..pkg.sub` → (`"..pkg.sub"`, 2); `.` → (`"."`, 1).
    fn relative_name(node: &Node<'_>, src: &[u8]) -> (String, usize) {
        let mut dots = String::new();
        let mut module = String::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "import_prefix" => {
                    dots = Self::text(&child, src)
                        .chars()
                        .filter(|&c| c == '.')
                        .collect();
                }
                "dotted_name" => module = Self::dotted_name(&child, src),
                _ => {}
            }
        }
        let level = dots.len();
        (format!("{dots}{module}"), level)
    }

    /// `import a.b, c as d` → one declaration per imported module.
    fn extract_import(node: &Node<'_>, src: &[u8], path: &Path, out: &mut Vec<ImportDeclaration>) {
        let line = node.start_position().row + 1;
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            let dotted = match name.kind() {
                "dotted_name" => Some(Self::dotted_name(&name, src)),
                "aliased_import" => name
                    .child_by_field_name("name")
                    .map(|n| Self::dotted_name(&n, src)),
                _ => None,
            };
            if let Some(dotted) = dotted.filter(|d| !d.is_empty()) {
                out.push(ImportDeclaration::new(path, line, dotted, ImportForm::Import));
            }
        }
    }

    /// `from a.b import c, d` → a single declaration for `a.b`.
    fn extract_from(node: &Node<'_>, src: &[u8], path: &Path) -> Option<ImportDeclaration> {
        let line = node.start_position().row + 1;
        let module = node.child_by_field_name("module_name")?;
        let (name, level) = match module.kind() {
            "relative_import" => Self::relative_name(&module, src),
            _ => (Self::dotted_name(&module, src), 0),
        };
        if name.is_empty() {
            return None;
        }
        Some(ImportDeclaration::new(path, line, name, ImportForm::From).with_level(level))
    }

    /// Depth-first search for the first `ERROR` or `MISSING` node.
    fn first_error<'t>(node: Node<'t>) -> Option<Node<'t>> {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
        children
            .into_iter()
            .filter(Node::has_error)
            .find_map(Self::first_error)
    }

    fn parse_error(node: &Node<'_>, src: &[u8], path: &Path) -> FileError {
        let message = if node.is_missing() {
            format!("missing `{}`", node.kind())
        } else {
            let snippet: String = Self::text(node, src)
                .lines()
                .next()
                .unwrap_or("")
                .chars()
                .take(SNIPPET_LEN)
                .collect();
            if snippet.trim().is_empty() {
                "invalid syntax".to_owned()
            } else {
                format!("invalid syntax near `{}`", snippet.trim())
            }
        };
        FileError::Parse {
            path: path.to_path_buf(),
            line: node.start_position().row + 1,
            message,
        }
    }

    /// Walks every node in document order, collecting import statements.
    fn walk(cursor: &mut TreeCursor<'_>, src: &[u8], path: &Path) -> Vec<ImportDeclaration> {
        let mut out = Vec::new();
        'walk: loop {
            let node = cursor.node();
            let descend = match node.kind() {
                "import_statement" => {
                    Self::extract_import(&node, src, path, &mut out);
                    false
                }
                "import_from_statement" => {
                    out.extend(Self::extract_from(&node, src, path));
                    false
                }
                "future_import_statement" => {
                    out.push(ImportDeclaration::new(
                        path,
                        node.start_position().row + 1,
                        "__future__",
                        ImportForm::From,
                    ));
                    false
                }
                _ => true,
            };

            if descend && cursor.goto_first_child() {
                continue;
            }
            while !cursor.goto_next_sibling() {
                if !cursor.goto_parent() {
                    break 'walk;
                }
            }
        }
        out
    }
}

impl Default for PythonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageExtractor for PythonExtractor {
    fn language_id(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn extract(&self, path: &Path, source: &str) -> Result<Vec<ImportDeclaration>, FileError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| FileError::Parse {
                path: path.to_path_buf(),
                line: 1,
                message: format!("python grammar unavailable: {e}"),
            })?;

        let src = source.as_bytes();
        let tree = parser.parse(src, None).ok_or_else(|| FileError::Parse {
            path: path.to_path_buf(),
            line: 1,
            message: "parser produced no tree".to_owned(),
        })?;
        let root = tree.root_node();

        if root.has_error() {
            let node = Self::first_error(root).unwrap_or(root);
            return Err(Self::parse_error(&node, src, path));
        }

        let mut cursor = root.walk();
        Ok(Self::walk(&mut cursor, src, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(src: &str) -> Vec<ImportDeclaration> {
        PythonExtractor::new()
            .extract(Path::new("mod.py"), src)
            .expect("source should parse")
    }

    fn names(decls: &[ImportDeclaration]) -> Vec<&str> {
        decls.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn grammar_loads() {
        assert!(PythonExtractor::new().verify().is_ok());
    }

    #[test]
    fn plain_import() {
        let d = extract("import os\n\n\nimport legacy.old\n");
        assert_eq!(names(&d), vec!["os", "legacy.old"]);
        assert_eq!(d[1].line, 4);
        assert_eq!(d[1].form, ImportForm::Import);
        assert_eq!(d[1].file, Path::new("mod.py"));
    }

    #[test]
    fn multi_name_import_shares_line() {
        let d = extract("import a.b, c as d, e\n");
        assert_eq!(names(&d), vec!["a.b", "c", "e"]);
        assert!(d.iter().all(|x| x.line == 1));
    }

    #[test]
    fn aliased_import_records_module() {
        let d = extract("import numpy.linalg as la\n");
        assert_eq!(names(&d), vec!["numpy.linalg"]);
    }

    #[test]
    fn from_import_records_module_once() {
        let d = extract("from legacy.compat import a, b as c, d\n");
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].name, "legacy.compat");
        assert_eq!(d[0].form, ImportForm::From);
        assert_eq!(d[0].level, 0);
    }

    #[test]
    fn parenthesized_and_wildcard_from_imports() {
        let d = extract("from pkg import (\n    a,\n    b,\n)\nfrom other import *\n");
        assert_eq!(names(&d), vec!["pkg", "other"]);
        assert_eq!(d[0].line, 1);
        assert_eq!(d[1].line, 5);
    }

    #[test]
    fn relative_imports_keep_dots() {
        let d = extract("from . import sibling\nfrom ..pkg.sub import thing\n");
        assert_eq!(names(&d), vec![".", "..pkg.sub"]);
        assert_eq!(d[0].level, 1);
        assert_eq!(d[1].level, 2);
    }

    #[test]
    fn future_import() {
        let d = extract("from __future__ import annotations\nimport os\n");
        assert_eq!(names(&d), vec!["__future__", "os"]);
        assert_eq!(d[0].form, ImportForm::From);
    }

    #[test]
    fn nested_imports_are_found_in_order() {
        let src = "\
import top

def handler():
    import inner.mod
    if True:
        from deep.pkg import x

class Service:
    try:
        import optional
    except ImportError:
        optional = None
";
        let d = extract(src);
        assert_eq!(names(&d), vec!["top", "inner.mod", "deep.pkg", "optional"]);
        let lines: Vec<usize> = d.iter().map(|x| x.line).collect();
        assert_eq!(lines, vec![1, 4, 6, 10]);
    }

    #[test]
    fn import_text_in_strings_is_ignored() {
        let d = extract("doc = \"import legacy\"\n# import legacy.old\n");
        assert!(d.is_empty());
    }

    #[test]
    fn empty_source() {
        assert!(extract("").is_empty());
    }

    #[test]
    fn syntax_error_reports_line() {
        let err = PythonExtractor::new()
            .extract(Path::new("bad.py"), "import os\n\ndef broken(:\n    return 1\n")
            .unwrap_err();
        match err {
            FileError::Parse { path, line, .. } => {
                assert_eq!(path, Path::new("bad.py"));
                assert!(line >= 3, "error should point at or after the bad def, got {line}");
            }
            FileError::Io { .. } => panic!("expected parse error"),
        }
    }

    #[test]
    fn handles_python_extensions() {
        let e = PythonExtractor::new();
        assert!(e.handles(Path::new("pkg/mod.py")));
        assert!(e.handles(Path::new("pkg/mod.pyi")));
        assert!(!e.handles(Path::new("pkg/mod.pyc")));
    }
}
