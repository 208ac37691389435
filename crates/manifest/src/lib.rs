//! # Manifest
//!
//! Declarative description of desired host state.
//!
//! A manifest holds one ordered sequence per resource kind. Within a
//! sequence, declaration order is application order. Manifests can be
//! split across files and merged with [`Manifest::add`].
//!
//! ## Example
//!
//! ```no_run
//! use manifest::Manifest;
//! use std::path::Path;
//!
//! let mut manifest = Manifest::load(Path::new("base.json"))?;
//! manifest.add(Manifest::load(Path::new("web.toml"))?);
//! manifest.validate()?;
//!
//! for package in &manifest.packages {
//!     println!("package: {}", package.name);
//! }
//! # Ok::<(), manifest::Error>(())
//! ```

mod error;
mod types;

pub use error::{Error, Issue, Issues, Result};
pub use types::{
    Database, Package, PersonalPackageArchive, ResourceKind, Service, SourceList, Template, User,
};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Desired host state: one ordered sequence per resource kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ManifestFile")]
pub struct Manifest {
    pub source_lists: Vec<SourceList>,
    pub packages: Vec<Package>,
    pub templates: Vec<Template>,
    pub personal_package_archives: Vec<PersonalPackageArchive>,
    pub users: Vec<User>,
    pub services: Vec<Service>,
    pub databases: Vec<Database>,
}

/// On-disk shape of a manifest
///
/// `postgres_databases` is the older name of `databases`. A file may use
/// both; its `postgres_databases` entries follow its `databases` entries.
#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ManifestFile {
    source_lists: Vec<SourceList>,
    packages: Vec<Package>,
    templates: Vec<Template>,
    personal_package_archives: Vec<PersonalPackageArchive>,
    users: Vec<User>,
    services: Vec<Service>,
    databases: Vec<Database>,
    postgres_databases: Vec<Database>,
}

impl From<ManifestFile> for Manifest {
    fn from(file: ManifestFile) -> Self {
        let mut databases = file.databases;
        databases.extend(file.postgres_databases);
        Self {
            source_lists: file.source_lists,
            packages: file.packages,
            templates: file.templates,
            personal_package_archives: file.personal_package_archives,
            users: file.users,
            services: file.services,
            databases,
        }
    }
}

/// On-disk manifest encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Toml,
}

impl Format {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

impl Manifest {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a manifest file
    ///
    /// The format follows the extension. Relative template sources are
    /// resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let format =
            Format::from_path(path).ok_or_else(|| Error::UnsupportedFormat(path.to_path_buf()))?;
        let content = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut manifest = Self::parse(&content, format, path)?;
        if let Some(base) = path.parent() {
            manifest.resolve_relative(base);
        }
        Ok(manifest)
    }

    /// Load several manifest files and merge them in the given order
    pub fn load_all<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut merged = Self::new();
        for path in paths {
            merged.add(Self::load(path.as_ref())?);
        }
        Ok(merged)
    }

    /// Parse manifest text; `origin` is only used in error messages
    pub fn parse(content: &str, format: Format, origin: &Path) -> Result<Self> {
        match format {
            Format::Json => serde_json::from_str(content).map_err(|source| Error::Json {
                path: origin.to_path_buf(),
                source,
            }),
            Format::Toml => toml::from_str(content).map_err(|source| Error::Toml {
                path: origin.to_path_buf(),
                source,
            }),
        }
    }

    /// Append every sequence of `other` after the entries already here
    ///
    /// Entries are not deduplicated.
    pub fn add(&mut self, other: Manifest) {
        self.source_lists.extend(other.source_lists);
        self.packages.extend(other.packages);
        self.templates.extend(other.templates);
        self.personal_package_archives
            .extend(other.personal_package_archives);
        self.users.extend(other.users);
        self.services.extend(other.services);
        self.databases.extend(other.databases);
    }

    /// Number of entries of one kind
    pub fn count(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::SourceList => self.source_lists.len(),
            ResourceKind::Package => self.packages.len(),
            ResourceKind::Template => self.templates.len(),
            ResourceKind::PersonalPackageArchive => self.personal_package_archives.len(),
            ResourceKind::User => self.users.len(),
            ResourceKind::Service => self.services.len(),
            ResourceKind::Database => self.databases.len(),
        }
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        ResourceKind::ALL.iter().map(|k| self.count(*k)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve relative template sources against `base`
    pub fn resolve_relative(&mut self, base: &Path) {
        for template in &mut self.templates {
            if let Some(source) = &template.source
                && source.is_relative()
            {
                template.source = Some(base.join(source));
            }
        }
    }

    /// Check the structural rules every entry must satisfy
    ///
    /// Tool-specific rules (package name syntax, database identifiers, …)
    /// are checked by the resources themselves.
    pub fn validate(&self) -> Result<()> {
        let mut issues = Issues::default();

        for (i, entry) in self.source_lists.iter().enumerate() {
            let kind = ResourceKind::SourceList;
            if entry.name.trim().is_empty() {
                issues.push(kind, i, "name must not be empty");
            } else if !is_file_stem(&entry.name) {
                issues.push(
                    kind,
                    i,
                    format!(
                        "name '{}' may only contain letters, digits, '.', '_' and '-'",
                        entry.name
                    ),
                );
            }
            if entry.source.trim().is_empty() {
                issues.push(kind, i, "source must not be empty");
            }
        }

        for (i, entry) in self.packages.iter().enumerate() {
            if entry.name.trim().is_empty() {
                issues.push(ResourceKind::Package, i, "name must not be empty");
            }
        }

        for (i, entry) in self.templates.iter().enumerate() {
            let kind = ResourceKind::Template;
            if entry.path.as_os_str().is_empty() {
                issues.push(kind, i, "path must not be empty");
            } else if entry.path.is_relative() {
                issues.push(
                    kind,
                    i,
                    format!("path '{}' must be absolute", entry.path.display()),
                );
            }
            match (&entry.source, &entry.content) {
                (Some(_), Some(_)) => issues.push(kind, i, "set either source or content, not both"),
                (None, None) => issues.push(kind, i, "one of source or content is required"),
                _ => {}
            }
            if let Some(mode) = &entry.mode
                && u32::from_str_radix(mode, 8).is_err()
            {
                issues.push(kind, i, format!("mode '{mode}' is not an octal number"));
            }
        }

        for (i, entry) in self.personal_package_archives.iter().enumerate() {
            if entry.name.trim().is_empty() {
                issues.push(ResourceKind::PersonalPackageArchive, i, "name must not be empty");
            }
        }

        for (i, entry) in self.users.iter().enumerate() {
            if entry.name.trim().is_empty() {
                issues.push(ResourceKind::User, i, "name must not be empty");
            }
        }

        for (i, entry) in self.services.iter().enumerate() {
            let kind = ResourceKind::Service;
            if entry.name.trim().is_empty() {
                issues.push(kind, i, "name must not be empty");
            } else if !is_file_stem(&entry.name) {
                issues.push(
                    kind,
                    i,
                    format!("name '{}' is not a valid unit name", entry.name),
                );
            }
            if entry.command.trim().is_empty() {
                issues.push(kind, i, "command must not be empty");
            }
        }

        for (i, entry) in self.databases.iter().enumerate() {
            if entry.name.trim().is_empty() {
                issues.push(ResourceKind::Database, i, "name must not be empty");
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(Error::Invalid(issues))
        }
    }
}

/// Names that end up as a file name under a system directory
fn is_file_stem(name: &str) -> bool {
    !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '@'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn tagged(tag: &str) -> Manifest {
        Manifest {
            source_lists: vec![SourceList::new(
                format!("{tag}-list"),
                "deb http://example.com stable main",
            )],
            packages: vec![Package::new(format!("{tag}-pkg"))],
            templates: vec![Template::inline(format!("/etc/{tag}.conf"), tag)],
            personal_package_archives: vec![PersonalPackageArchive::new(format!("ppa:{tag}/ppa"))],
            users: vec![User::new(format!("{tag}-user"))],
            services: vec![Service::new(format!("{tag}-svc"), "/bin/true")],
            databases: vec![Database::new(format!("{tag}_db"))],
        }
    }

    #[test]
    fn test_add_appends_every_kind_in_order() {
        let mut a = tagged("a");
        a.packages.push(Package::new("a-pkg-2"));
        let b = tagged("b");

        a.add(b);

        assert_eq!(
            a.packages.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            vec!["a-pkg", "a-pkg-2", "b-pkg"]
        );
        assert_eq!(a.source_lists[0].name, "a-list");
        assert_eq!(a.source_lists[1].name, "b-list");
        assert_eq!(a.templates[0].path, PathBuf::from("/etc/a.conf"));
        assert_eq!(a.templates[1].path, PathBuf::from("/etc/b.conf"));
        assert_eq!(a.personal_package_archives[0].name, "ppa:a/ppa");
        assert_eq!(a.personal_package_archives[1].name, "ppa:b/ppa");
        assert_eq!(a.users[0].name, "a-user");
        assert_eq!(a.users[1].name, "b-user");
        assert_eq!(a.services[0].name, "a-svc");
        assert_eq!(a.services[1].name, "b-svc");
        assert_eq!(a.databases[0].name, "a_db");
        assert_eq!(a.databases[1].name, "b_db");
        for kind in ResourceKind::ALL {
            let expected = if kind == ResourceKind::Package { 3 } else { 2 };
            assert_eq!(a.count(kind), expected, "{kind}");
        }
    }

    #[test]
    fn test_add_keeps_duplicates() {
        let mut a = Manifest::new();
        a.packages.push(Package::new("curl"));
        let mut b = Manifest::new();
        b.packages.push(Package::new("curl"));

        a.add(b);

        assert_eq!(a.packages, vec![Package::new("curl"), Package::new("curl")]);
    }

    #[test]
    fn test_add_empty_is_identity() {
        let mut a = tagged("a");
        a.add(Manifest::new());
        assert_eq!(a, tagged("a"));
    }

    #[test]
    fn test_parse_json_with_legacy_database_field() {
        let json = r#"{
            "packages": [{"name": "nginx"}, {"name": "postgresql"}],
            "postgres_databases": [{"name": "app"}],
            "users": [{"name": "deploy", "groups": ["www-data"]}]
        }"#;
        let manifest = Manifest::parse(json, Format::Json, Path::new("m.json")).unwrap();

        assert_eq!(manifest.packages.len(), 2);
        assert_eq!(manifest.databases, vec![Database::new("app")]);
        assert_eq!(manifest.users[0].groups, vec!["www-data"]);
        assert!(manifest.templates.is_empty());
    }

    #[test]
    fn test_both_database_fields_are_combined() {
        let json = r#"{
            "databases": [{"name": "app"}],
            "postgres_databases": [{"name": "legacy"}, {"name": "reports"}]
        }"#;
        let manifest = Manifest::parse(json, Format::Json, Path::new("m.json")).unwrap();
        assert_eq!(
            manifest.databases,
            vec![
                Database::new("app"),
                Database::new("legacy"),
                Database::new("reports")
            ]
        );

        let toml = "[[postgres_databases]]\nname = \"legacy\"\n\n[[databases]]\nname = \"app\"\n";
        let manifest = Manifest::parse(toml, Format::Toml, Path::new("m.toml")).unwrap();
        assert_eq!(
            manifest.databases,
            vec![Database::new("app"), Database::new("legacy")]
        );
    }

    #[test]
    fn test_serialized_manifest_parses_back() {
        let mut manifest = Manifest::new();
        manifest.databases.push(Database::new("app"));
        manifest.packages.push(Package::new("nginx"));
        let json = serde_json::to_string(&manifest).unwrap();
        assert!(!json.contains("postgres_databases"));
        assert_eq!(
            Manifest::parse(&json, Format::Json, Path::new("m.json")).unwrap(),
            manifest
        );
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[[source_lists]]
name = "nodesource"
source = "deb https://deb.nodesource.com/node_20.x nodistro main"

[[services]]
name = "web"
command = "/usr/bin/node /srv/app/server.js"
user = "deploy"

[services.environment]
PORT = "8080"
"#;
        let manifest = Manifest::parse(toml, Format::Toml, Path::new("m.toml")).unwrap();

        assert_eq!(manifest.source_lists[0].name, "nodesource");
        let service = &manifest.services[0];
        assert_eq!(service.restart, "always");
        assert_eq!(service.environment.get("PORT").map(String::as_str), Some("8080"));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let json = r#"{"packages": [{"name": "nginx", "version": "1.2"}]}"#;
        let err = Manifest::parse(json, Format::Json, Path::new("bad.json")).unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
        assert!(err.to_string().contains("bad.json"));

        let top_level = r#"{"pakages": [{"name": "nginx"}]}"#;
        assert!(Manifest::parse(top_level, Format::Json, Path::new("bad.json")).is_err());
    }

    #[test]
    fn test_load_resolves_relative_template_sources() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("web.json");
        fs::write(
            &path,
            r#"{"templates": [
                {"path": "/etc/app.conf", "source": "templates/app.conf.tmpl"},
                {"path": "/etc/other.conf", "source": "/opt/other.tmpl"}
            ]}"#,
        )
        .unwrap();

        let manifest = Manifest::load(&path).unwrap();

        assert_eq!(
            manifest.templates[0].source,
            Some(dir.path().join("templates/app.conf.tmpl"))
        );
        assert_eq!(
            manifest.templates[1].source,
            Some(PathBuf::from("/opt/other.tmpl"))
        );
    }

    #[test]
    fn test_load_all_merges_in_argument_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("base.toml");
        let second = dir.path().join("app.json");
        fs::write(&first, "[[packages]]\nname = \"curl\"\n").unwrap();
        fs::write(&second, r#"{"packages": [{"name": "nginx"}]}"#).unwrap();

        let manifest = Manifest::load_all(&[&first, &second]).unwrap();

        assert_eq!(
            manifest.packages,
            vec![Package::new("curl"), Package::new("nginx")]
        );
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let err = Manifest::load(Path::new("/tmp/manifest.yaml")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_validate_accepts_well_formed_manifest() {
        assert!(tagged("a").validate().is_ok());
        assert!(Manifest::new().validate().is_ok());
    }

    #[test]
    fn test_validate_collects_every_issue() {
        let mut manifest = Manifest::new();
        manifest.packages.push(Package::new(""));
        manifest.source_lists.push(SourceList::new("../evil", "deb x y"));
        manifest
            .templates
            .push(Template::inline("etc/relative.conf", "x").with_mode("0999"));
        let mut both = Template::from_file("/etc/a", "a.tmpl");
        both.content = Some("inline".into());
        manifest.templates.push(both);
        manifest.services.push(Service::new("web", " "));

        let Err(Error::Invalid(issues)) = manifest.validate() else {
            panic!("expected validation failure");
        };

        let rendered: Vec<String> = issues.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "source_lists[0]: name '../evil' may only contain letters, digits, '.', '_' and '-'",
                "packages[0]: name must not be empty",
                "templates[0]: path 'etc/relative.conf' must be absolute",
                "templates[0]: mode '0999' is not an octal number",
                "templates[1]: set either source or content, not both",
                "services[0]: command must not be empty",
            ]
        );
    }
}
