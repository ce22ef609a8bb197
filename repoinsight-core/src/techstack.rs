//! Technology stack detection from manifest and marker files.
//!
//! Detection has three independent groups that are probed concurrently:
//! the `package.json` manifest, the Python marker group and a list of single
//! marker files. Every probe failure counts as "not detected", so detection
//! itself never fails.

use std::collections::BTreeMap;

use futures::future::join_all;
use log::debug;
use serde::Deserialize;

use crate::domain::{Confidence, DetectedTechnology, RepoRef, TechCategory};
use crate::error::{InsightError, Result};
use crate::source::RepositorySource;

/// Maximum number of technologies reported for one repository.
pub const MAX_TECHNOLOGIES: usize = 20;

const PACKAGE_MANIFEST: &str = "package.json";
const REQUIREMENTS_MANIFEST: &str = "requirements.txt";

/// Python markers in priority order; the first one found wins.
const PYTHON_MARKERS: &[&str] = &[REQUIREMENTS_MANIFEST, "pyproject.toml", "setup.py", "Pipfile"];

#[derive(Debug, Clone, Copy)]
struct TechRule {
    key: &'static str,
    name: &'static str,
    category: TechCategory,
    icon: &'static str,
}

impl TechRule {
    const fn new(
        key: &'static str,
        name: &'static str,
        category: TechCategory,
        icon: &'static str,
    ) -> Self {
        Self {
            key,
            name,
            category,
            icon,
        }
    }

    fn detect(&self, confidence: Confidence, version: Option<String>) -> DetectedTechnology {
        DetectedTechnology {
            name: self.name.to_string(),
            category: self.category,
            confidence,
            version,
            icon: Some(self.icon.to_string()),
        }
    }
}

const NODE_RUNTIME: TechRule =
    TechRule::new(PACKAGE_MANIFEST, "Node.js", TechCategory::Runtime, "nodejs");
const PYTHON_LANGUAGE: TechRule =
    TechRule::new(REQUIREMENTS_MANIFEST, "Python", TechCategory::Language, "python");

const PACKAGE_RULES: &[TechRule] = &[
    TechRule::new("react", "React", TechCategory::Framework, "react"),
    TechRule::new("next", "Next.js", TechCategory::Framework, "nextjs"),
    TechRule::new("vue", "Vue.js", TechCategory::Framework, "vuejs"),
    TechRule::new("nuxt", "Nuxt", TechCategory::Framework, "nuxtjs"),
    TechRule::new("@angular/core", "Angular", TechCategory::Framework, "angularjs"),
    TechRule::new("svelte", "Svelte", TechCategory::Framework, "svelte"),
    TechRule::new("express", "Express", TechCategory::Framework, "express"),
    TechRule::new("@nestjs/core", "NestJS", TechCategory::Framework, "nestjs"),
    TechRule::new("fastify", "Fastify", TechCategory::Framework, "fastify"),
    TechRule::new("koa", "Koa", TechCategory::Framework, "koa"),
    TechRule::new("typescript", "TypeScript", TechCategory::Language, "typescript"),
    TechRule::new("tailwindcss", "Tailwind CSS", TechCategory::Styling, "tailwindcss"),
    TechRule::new("prisma", "Prisma", TechCategory::Database, "prisma"),
    TechRule::new("@prisma/client", "Prisma", TechCategory::Database, "prisma"),
    TechRule::new("mongoose", "Mongoose", TechCategory::Database, "mongodb"),
    TechRule::new("sequelize", "Sequelize", TechCategory::Database, "sequelize"),
    TechRule::new("typeorm", "TypeORM", TechCategory::Database, "typeorm"),
    TechRule::new("drizzle-orm", "Drizzle", TechCategory::Database, "drizzle"),
    TechRule::new("pg", "PostgreSQL", TechCategory::Database, "postgresql"),
    TechRule::new("redis", "Redis", TechCategory::Database, "redis"),
    TechRule::new("graphql", "GraphQL", TechCategory::Api, "graphql"),
    TechRule::new("@apollo/client", "Apollo", TechCategory::Api, "apollographql"),
    TechRule::new("jest", "Jest", TechCategory::Testing, "jest"),
    TechRule::new("vitest", "Vitest", TechCategory::Testing, "vitest"),
    TechRule::new("mocha", "Mocha", TechCategory::Testing, "mocha"),
    TechRule::new("cypress", "Cypress", TechCategory::Testing, "cypressio"),
    TechRule::new("@playwright/test", "Playwright", TechCategory::Testing, "playwright"),
    TechRule::new("webpack", "Webpack", TechCategory::BuildTool, "webpack"),
    TechRule::new("vite", "Vite", TechCategory::BuildTool, "vitejs"),
    TechRule::new("esbuild", "esbuild", TechCategory::BuildTool, "esbuild"),
    TechRule::new("eslint", "ESLint", TechCategory::Linting, "eslint"),
    TechRule::new("prettier", "Prettier", TechCategory::Linting, "prettier"),
    TechRule::new("redux", "Redux", TechCategory::StateManagement, "redux"),
];

const PYTHON_KEYWORDS: &[TechRule] = &[
    TechRule::new("django", "Django", TechCategory::Framework, "django"),
    TechRule::new("flask", "Flask", TechCategory::Framework, "flask"),
    TechRule::new("fastapi", "FastAPI", TechCategory::Framework, "fastapi"),
    TechRule::new("numpy", "NumPy", TechCategory::Library, "numpy"),
    TechRule::new("pandas", "Pandas", TechCategory::Library, "pandas"),
    TechRule::new("tensorflow", "TensorFlow", TechCategory::Library, "tensorflow"),
    TechRule::new("torch", "PyTorch", TechCategory::Library, "pytorch"),
    TechRule::new("scikit-learn", "scikit-learn", TechCategory::Library, "scikitlearn"),
    TechRule::new("sqlalchemy", "SQLAlchemy", TechCategory::Database, "sqlalchemy"),
];

const MARKER_RULES: &[TechRule] = &[
    TechRule::new("Dockerfile", "Docker", TechCategory::DevOps, "docker"),
    TechRule::new("docker-compose.yml", "Docker Compose", TechCategory::DevOps, "docker"),
    TechRule::new(".github/workflows", "GitHub Actions", TechCategory::CiCd, "githubactions"),
    TechRule::new(".gitlab-ci.yml", "GitLab CI", TechCategory::CiCd, "gitlab"),
    TechRule::new("terraform", "Terraform", TechCategory::Infrastructure, "terraform"),
    TechRule::new("go.mod", "Go", TechCategory::Language, "go"),
    TechRule::new("Cargo.toml", "Rust", TechCategory::Language, "rust"),
    TechRule::new("pom.xml", "Maven", TechCategory::BuildTool, "maven"),
    TechRule::new("build.gradle", "Gradle", TechCategory::BuildTool, "gradle"),
    TechRule::new("Gemfile", "Ruby", TechCategory::Language, "ruby"),
    TechRule::new("composer.json", "PHP", TechCategory::Language, "php"),
    TechRule::new("tsconfig.json", "TypeScript", TechCategory::Language, "typescript"),
];

#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, String>,
}

/// Detect the technology stack of a repository.
pub async fn detect_tech_stack(
    source: &dyn RepositorySource,
    repo: &RepoRef,
) -> Vec<DetectedTechnology> {
    let (manifest, python, markers) = futures::join!(
        detect_from_manifest(source, repo),
        detect_python(source, repo),
        detect_markers(source, repo),
    );
    merge_detections(manifest.into_iter().chain(python).chain(markers))
}

/// Technologies declared by a `package.json` manifest.
///
/// Direct dependencies take precedence over dev dependencies with the same
/// name. Exact package matches are emitted before substring matches, so a
/// substring match never shadows an exact one.
pub fn technologies_from_package_json(contents: &str) -> Result<Vec<DetectedTechnology>> {
    let manifest: PackageManifest = serde_json::from_str(contents)?;
    let mut dependencies = manifest.dev_dependencies;
    dependencies.extend(manifest.dependencies);

    let mut found = vec![NODE_RUNTIME.detect(Confidence::High, None)];
    for (package, version) in &dependencies {
        let Some(rule) = PACKAGE_RULES.iter().find(|rule| rule.key == package.as_str()) else {
            continue;
        };
        if !found.iter().any(|tech| tech.name == rule.name) {
            found.push(rule.detect(Confidence::High, Some(version.clone())));
        }
    }
    for package in dependencies.keys() {
        for rule in PACKAGE_RULES {
            if package.contains(rule.key) && !found.iter().any(|tech| tech.name == rule.name) {
                found.push(rule.detect(Confidence::Medium, None));
            }
        }
    }
    Ok(found)
}

/// Frameworks and libraries named in a `requirements.txt` file.
pub fn technologies_from_requirements(contents: &str) -> Vec<DetectedTechnology> {
    let contents = contents.to_lowercase();
    PYTHON_KEYWORDS
        .iter()
        .filter(|rule| contents.contains(rule.key))
        .map(|rule| rule.detect(Confidence::High, None))
        .collect()
}

/// Drop repeated display names, keeping the first, and cap the list.
pub fn merge_detections(
    detections: impl IntoIterator<Item = DetectedTechnology>,
) -> Vec<DetectedTechnology> {
    let mut merged: Vec<DetectedTechnology> = Vec::new();
    for tech in detections {
        if merged.iter().any(|existing| existing.name == tech.name) {
            continue;
        }
        merged.push(tech);
    }
    merged.truncate(MAX_TECHNOLOGIES);
    merged
}

async fn detect_from_manifest(
    source: &dyn RepositorySource,
    repo: &RepoRef,
) -> Vec<DetectedTechnology> {
    let contents = match source.read_file(repo, PACKAGE_MANIFEST).await {
        Ok(contents) => contents,
        Err(err) => {
            log_probe_miss(repo, PACKAGE_MANIFEST, &err);
            return Vec::new();
        }
    };
    match technologies_from_package_json(&contents) {
        Ok(found) => found,
        Err(err) => {
            log_probe_miss(repo, PACKAGE_MANIFEST, &err);
            Vec::new()
        }
    }
}

async fn detect_python(source: &dyn RepositorySource, repo: &RepoRef) -> Vec<DetectedTechnology> {
    for marker in PYTHON_MARKERS {
        if !probe(source, repo, marker).await {
            continue;
        }
        let mut found = vec![PYTHON_LANGUAGE.detect(Confidence::High, None)];
        if *marker == REQUIREMENTS_MANIFEST {
            match source.read_file(repo, marker).await {
                Ok(contents) => found.extend(technologies_from_requirements(&contents)),
                Err(err) => log_probe_miss(repo, marker, &err),
            }
        }
        return found;
    }
    Vec::new()
}

async fn detect_markers(source: &dyn RepositorySource, repo: &RepoRef) -> Vec<DetectedTechnology> {
    let probes = MARKER_RULES.iter().map(|rule| async move {
        probe(source, repo, rule.key)
            .await
            .then(|| rule.detect(Confidence::High, None))
    });
    join_all(probes).await.into_iter().flatten().collect()
}

async fn probe(source: &dyn RepositorySource, repo: &RepoRef, path: &str) -> bool {
    match source.path_exists(repo, path).await {
        Ok(exists) => exists,
        Err(err) => {
            log_probe_miss(repo, path, &err);
            false
        }
    }
}

fn log_probe_miss(repo: &RepoRef, path: &str, err: &InsightError) {
    debug!("tech-stack probe {path} for {repo} treated as absent: {err}");
}
