//! Parser for one-line apt sources (`.list` files).
//!
//! ```text
//! # comment
//! deb http://archive.ubuntu.com/ubuntu jammy main universe
//! deb [arch=amd64 signed-by=/usr/share/keyrings/pg.gpg] http://apt.postgresql.org/pub/repos/apt jammy-pgdg main
//! deb-src http://ppa.launchpad.net/nginx/stable/ubuntu jammy main
//! ```
//!
//! deb822 `.sources` files are only scanned as text (see [`find_ppa`]).

use crate::error::{Error, Result};
use crate::types::{EntryKind, Ppa, SourceEntry};
use std::fs;
use std::path::{Path, PathBuf};

/// A sources file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// File name without extension
    pub name: String,
    /// Full path to the file
    pub path: PathBuf,
    /// Raw file body
    pub content: String,
}

impl SourceFile {
    /// Parse the body as one-line entries.
    pub fn entries(&self) -> Result<Vec<SourceEntry>> {
        parse_string(&self.content)
    }

    /// Whether this is a one-line `.list` file.
    pub fn is_list(&self) -> bool {
        self.path.extension().is_some_and(|ext| ext == "list")
    }
}

/// Parse every entry in a `.list` body.
pub fn parse_string(content: &str) -> Result<Vec<SourceEntry>> {
    let mut entries = Vec::new();
    for (line_num, line) in content.lines().enumerate() {
        if let Some(entry) = parse_line(line, line_num + 1)? {
            entries.push(entry);
        }
    }
    Ok(entries)
}

/// Parse a single line; blank lines and comments yield `None`.
pub fn parse_line(line: &str, line_num: usize) -> Result<Option<SourceEntry>> {
    let line = line.split_once('#').map_or(line, |(before, _)| before).trim();
    if line.is_empty() {
        return Ok(None);
    }

    let err = |message: &str| Error::SourceParse {
        line: line_num,
        message: message.to_string(),
    };

    let (keyword, rest) = line
        .split_once(char::is_whitespace)
        .ok_or_else(|| err("expected a URI after the entry type"))?;
    let kind = match keyword {
        "deb" => EntryKind::Deb,
        "deb-src" => EntryKind::DebSrc,
        other => return Err(err(&format!("unknown entry type '{other}'"))),
    };

    let mut rest = rest.trim_start();
    let mut options = Vec::new();
    if let Some(after) = rest.strip_prefix('[') {
        let (inside, tail) = after
            .split_once(']')
            .ok_or_else(|| err("unterminated option list"))?;
        options = inside.split_whitespace().map(String::from).collect();
        rest = tail;
    }

    let mut words = rest.split_whitespace();
    let uri = words.next().ok_or_else(|| err("missing URI"))?;
    let suite = words.next().ok_or_else(|| err("missing suite"))?;
    let components: Vec<String> = words.map(String::from).collect();
    if components.is_empty() && !suite.ends_with('/') {
        return Err(err("missing components"));
    }

    Ok(Some(SourceEntry {
        kind,
        options,
        uri: uri.to_string(),
        suite: suite.to_string(),
        components,
    }))
}

/// Read every `.list` and `.sources` file in a directory, sorted by path.
///
/// A missing directory is treated as empty.
pub fn list_dir(dir: &Path) -> Result<Vec<SourceFile>> {
    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    for entry in read_dir {
        let path = entry?.path();
        let is_source = path
            .extension()
            .is_some_and(|ext| ext == "list" || ext == "sources");
        if !is_source || !path.is_file() {
            continue;
        }
        let Some(name) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };
        let content = fs::read_to_string(&path)?;
        files.push(SourceFile {
            name,
            path,
            content,
        });
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Find the first sources file that references a PPA.
pub fn find_ppa(dir: &Path, ppa: &Ppa) -> Result<Option<PathBuf>> {
    Ok(list_dir(dir)?
        .into_iter()
        .find(|file| {
            file.content
                .lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#'))
                .any(|line| ppa.matches_source(line))
        })
        .map(|file| file.path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_simple() {
        let content = r#"
# Ubuntu main
deb http://archive.ubuntu.com/ubuntu jammy main universe
deb-src http://archive.ubuntu.com/ubuntu jammy main
"#;
        let entries = parse_string(content).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, EntryKind::Deb);
        assert_eq!(entries[0].suite, "jammy");
        assert_eq!(entries[0].components, vec!["main", "universe"]);
        assert_eq!(entries[1].kind, EntryKind::DebSrc);
    }

    #[test]
    fn test_parse_options_and_trailing_comment() {
        let line = "deb [arch=amd64 signed-by=/usr/share/keyrings/pg.gpg] http://apt.postgresql.org/pub/repos/apt jammy-pgdg main # pg";
        let entry = parse_line(line, 1).unwrap().unwrap();
        assert_eq!(
            entry.options,
            vec!["arch=amd64", "signed-by=/usr/share/keyrings/pg.gpg"]
        );
        assert_eq!(entry.uri, "http://apt.postgresql.org/pub/repos/apt");
        assert_eq!(entry.components, vec!["main"]);
    }

    #[test]
    fn test_parse_exact_path_suite() {
        let entry = parse_line("deb https://download.example.com/repo stable/", 1)
            .unwrap()
            .unwrap();
        assert_eq!(entry.suite, "stable/");
        assert!(entry.components.is_empty());
    }

    #[test]
    fn test_parse_errors_carry_line_number() {
        let err = parse_string("deb http://a jammy main\nrpm http://b x y\n").unwrap_err();
        match err {
            Error::SourceParse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("rpm"));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(parse_line("deb [arch=amd64 http://a jammy main", 1).is_err());
        assert!(parse_line("deb http://a jammy", 1).is_err());
    }

    #[test]
    fn test_list_dir_missing_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(list_dir(&temp.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_list_dir_filters_and_sorts() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.list"), "deb http://b jammy main\n").unwrap();
        fs::write(temp.path().join("a.sources"), "Types: deb\n").unwrap();
        fs::write(temp.path().join("c.list.save"), "deb http://c jammy main\n").unwrap();

        let files = list_dir(temp.path()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(!files[0].is_list());
        assert!(files[1].is_list());
    }

    #[test]
    fn test_find_ppa() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("deadsnakes-ubuntu-ppa-jammy.sources"),
            "Types: deb\nURIs: https://ppa.launchpadcontent.net/deadsnakes/ppa/ubuntu/\nSuites: jammy\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("nginx.list"),
            "# deb http://ppa.launchpad.net/nginx/stable/ubuntu jammy main\n",
        )
        .unwrap();

        let found = find_ppa(temp.path(), &Ppa::new("deadsnakes", "ppa")).unwrap();
        assert_eq!(
            found,
            Some(temp.path().join("deadsnakes-ubuntu-ppa-jammy.sources"))
        );
        assert_eq!(
            find_ppa(temp.path(), &Ppa::new("nginx", "stable")).unwrap(),
            None
        );
    }
}
