//! Manifest → validated resources, grouped by converge step

use anyhow::{Context, Result};
use declarative::{BoxedResource, Resource};
use manifest::Manifest;

use super::Step;
use crate::resource::{
    DatabaseResource, HostLayout, PackageResource, PpaResource, ServiceResource,
    SourceListResource, TemplateResource, UserResource,
};

/// Every resource a run will visit, in declaration order per step
#[derive(Debug, Default)]
pub struct Plan {
    pub users: Vec<BoxedResource>,
    pub source_lists: Vec<BoxedResource>,
    /// Present only when at least one PPA is declared
    pub ppa_support: Option<BoxedResource>,
    pub ppas: Vec<BoxedResource>,
    pub packages: Vec<BoxedResource>,
    pub templates: Vec<BoxedResource>,
    pub services: Vec<BoxedResource>,
    pub databases: Vec<BoxedResource>,
}

fn boxed<R: Resource + 'static>(resource: R) -> BoxedResource {
    Box::new(resource)
}

fn build_all<T>(
    entries: &[T],
    label: &str,
    build: impl Fn(&T) -> Result<BoxedResource>,
) -> Result<Vec<BoxedResource>> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| build(entry).with_context(|| format!("invalid {label} entry #{i}")))
        .collect()
}

impl Plan {
    /// Validate the manifest and build its resources
    ///
    /// Nothing on the host is touched; any invalid entry fails the whole
    /// plan.
    pub fn build(manifest: &Manifest, layout: &HostLayout) -> Result<Self> {
        manifest.validate()?;

        let users = build_all(&manifest.users, "users", |u| {
            UserResource::from_entry(u).map(boxed)
        })?;
        let source_lists = build_all(&manifest.source_lists, "source_lists", |s| {
            SourceListResource::new(s, &layout.sources_dir).map(boxed)
        })?;
        let ppas = build_all(
            &manifest.personal_package_archives,
            "personal_package_archives",
            |p| PpaResource::new(p, &layout.sources_dir).map(boxed),
        )?;
        let ppa_support = if ppas.is_empty() {
            None
        } else {
            let support = PackageResource::new(&layout.ppa_support_package)
                .context("invalid ppa_support_package")?;
            Some(boxed(support))
        };
        let packages = build_all(&manifest.packages, "packages", |p| {
            PackageResource::new(&p.name).map(boxed)
        })?;
        let templates = build_all(&manifest.templates, "templates", |t| {
            TemplateResource::from_entry(t).map(boxed)
        })?;
        let services = build_all(&manifest.services, "services", |s| {
            ServiceResource::new(s, &layout.unit_dir).map(boxed)
        })?;
        let databases = build_all(&manifest.databases, "databases", |d| {
            DatabaseResource::new(d, &layout.postgres_user).map(boxed)
        })?;

        Ok(Self {
            users,
            source_lists,
            ppa_support,
            ppas,
            packages,
            templates,
            services,
            databases,
        })
    }

    /// Resources visited by a step; empty for the refresh steps
    pub fn resources(&self, step: Step) -> &[BoxedResource] {
        match step {
            Step::Users => &self.users,
            Step::SourceLists => &self.source_lists,
            Step::PpaSupport => self.ppa_support.as_slice(),
            Step::PersonalPackageArchives => &self.ppas,
            Step::Packages => &self.packages,
            Step::Templates => &self.templates,
            Step::Services => &self.services,
            Step::Databases => &self.databases,
            Step::RefreshIndex | Step::ForceRefresh => &[],
        }
    }

    /// Total number of resources
    pub fn len(&self) -> usize {
        super::CONVERGE_STEPS
            .iter()
            .map(|step| self.resources(*step).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn layout() -> HostLayout {
        HostLayout {
            sources_dir: PathBuf::from("/etc/apt/sources.list.d"),
            unit_dir: PathBuf::from("/etc/systemd/system"),
            ppa_support_package: "software-properties-common".to_string(),
            postgres_user: "postgres".to_string(),
        }
    }

    fn ids(resources: &[BoxedResource]) -> Vec<String> {
        resources.iter().map(|r| r.id()).collect()
    }

    #[test]
    fn test_build_keeps_declaration_order() {
        let mut manifest = Manifest::new();
        manifest.packages.push(manifest::Package::new("nginx"));
        manifest.packages.push(manifest::Package::new("curl"));
        manifest.packages.push(manifest::Package::new("nginx"));
        manifest.databases.push(manifest::Database::new("app"));

        let plan = Plan::build(&manifest, &layout()).unwrap();
        assert_eq!(ids(&plan.packages), vec!["nginx", "curl", "nginx"]);
        assert_eq!(ids(&plan.databases), vec!["app"]);
        assert_eq!(plan.len(), 4);
        assert!(plan.ppa_support.is_none());
    }

    #[test]
    fn test_ppa_support_only_with_ppas() {
        let mut manifest = Manifest::new();
        manifest
            .personal_package_archives
            .push(manifest::PersonalPackageArchive::new("ppa:deadsnakes/ppa"));

        let plan = Plan::build(&manifest, &layout()).unwrap();
        assert_eq!(
            ids(plan.resources(Step::PpaSupport)),
            vec!["software-properties-common"]
        );
        assert_eq!(ids(&plan.ppas), vec!["ppa:deadsnakes/ppa"]);
    }

    #[test]
    fn test_invalid_entry_names_kind_and_index() {
        let mut manifest = Manifest::new();
        manifest.databases.push(manifest::Database::new("app"));
        manifest.databases.push(manifest::Database::new("-app"));

        let err = Plan::build(&manifest, &layout()).unwrap_err();
        assert_eq!(err.to_string(), "invalid databases entry #1");
        assert!(format!("{err:#}").contains("not a valid PostgreSQL identifier"));
    }

    #[test]
    fn test_structural_errors_come_from_manifest() {
        let mut manifest = Manifest::new();
        manifest.packages.push(manifest::Package::new(""));
        let err = Plan::build(&manifest, &layout()).unwrap_err();
        assert!(err.downcast_ref::<manifest::Error>().is_some());
    }
}
