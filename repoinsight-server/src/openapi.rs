//! OpenAPI specification for the RepoInsight server.

use utoipa::OpenApi;

use repoinsight_core::{
    AnalysisResult, CodeMetrics, CommitDay, Confidence, Contributor, DetectedTechnology,
    FileTypeStat, ScoreTriple, Severity, TechCategory, VulnerabilityFinding,
};

use crate::routes::{ErrorResponse, HealthResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::analyze_repository,
        crate::routes::latest_analysis,
        crate::routes::health,
        crate::routes::openapi_json
    ),
    components(
        schemas(
            AnalysisResult,
            CodeMetrics,
            ScoreTriple,
            CommitDay,
            Contributor,
            FileTypeStat,
            VulnerabilityFinding,
            Severity,
            DetectedTechnology,
            TechCategory,
            Confidence,
            ErrorResponse,
            HealthResponse
        )
    ),
    tags(
        (name = "analysis", description = "Repository analysis"),
        (name = "system", description = "System endpoints")
    )
)]
/// OpenAPI specification for the RepoInsight server.
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::ApiDoc;
    use utoipa::OpenApi;

    #[test]
    fn openapi_includes_expected_paths() {
        let doc = ApiDoc::openapi();
        let paths = doc.paths.paths;

        assert!(paths.contains_key("/repos/{owner}/{repo}/analysis"));
        assert!(paths.contains_key("/health"));
        assert!(paths.contains_key("/openapi.json"));
    }

    #[test]
    fn openapi_registers_result_schema() {
        let doc = ApiDoc::openapi();
        let schemas = doc.components.expect("components").schemas;

        assert!(schemas.contains_key("AnalysisResult"));
        assert!(schemas.contains_key("ErrorResponse"));
    }
}
