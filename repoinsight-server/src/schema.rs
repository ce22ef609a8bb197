//! Diesel schema definitions for the RepoInsight server.

diesel::table! {
    repository_analyses (full_name) {
        full_name -> Text,
        id -> Text,
        result_json -> Text,
        analyzed_at -> Timestamp,
    }
}
