//! Search tool implementation
//!
//! Implements the `search(query, records)` MCP tool and the `search` CLI command

use crate::cli::{OutputFormat, SearchArgs};
use crate::config::{load_config, Config};
use crate::error::{validate_query, AppError};
use crate::mcp::{McpResponse, ToolResult};
use crate::search::options::parse_strategies;
use crate::search::{search, FilterValue, GeoPoint, Record, SearchOptions, SearchResponse};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::time::{timeout, Duration};
use tracing::debug;

/// Environment variable naming the configuration file
const CONFIG_ENV: &str = "POLYSEARCH_CONFIG";

/// Render a search response as markdown
pub fn format_search_results(response: &SearchResponse<'_>) -> String {
    let mut md = String::new();

    if !response.success {
        md.push_str("# Search Failed\n\n");
        md.push_str(response.error.as_deref().unwrap_or("Unknown error"));
        md.push('\n');
        return md;
    }

    md.push_str(&format!("# Search Results · {} records\n\n", response.total));

    let strategies: Vec<&str> = response.strategies_used.iter().map(|m| m.as_str()).collect();
    md.push_str(&format!(
        "Query `{}` · {} · {} ms\n\n",
        response.query,
        strategies.join(", "),
        response.diagnostics.took_ms
    ));

    for failure in &response.diagnostics.strategy_errors {
        md.push_str(&format!("> {} skipped: {}\n", failure.strategy, failure.message));
    }
    if !response.diagnostics.strategy_errors.is_empty() {
        md.push('\n');
    }

    for (rank, result) in response.results.iter().enumerate() {
        let title = match (&result.record.name, &result.record.id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => display_value(id),
            (None, None) => format!("Record #{}", result.record_index),
        };
        md.push_str(&format!("## {}. {} · {:.1}\n\n", rank + 1, title, result.score));

        let methods: Vec<&str> = result.methods.iter().map(|m| m.as_str()).collect();
        md.push_str(&format!("Matched by: {}\n\n", methods.join(", ")));

        if result.highlights.is_empty() {
            for field in &result.matched_fields {
                md.push_str(&format!("- {}: {}\n", field.field, field.value));
            }
        } else {
            for fragment in &result.highlights {
                md.push_str(&format!("- {}: {}\n", fragment.field, fragment.text));
            }
        }

        md.push_str("\n---\n\n");
    }

    md
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Handle search tool call (MCP)
pub async fn handle_search(id: Option<Value>, args: Value) -> McpResponse {
    match timeout(Duration::from_secs(120), handle_search_impl(args)).await {
        Ok(result) => match result.and_then(|content| {
            serde_json::to_value(content)
                .map_err(|e| AppError::Internal(format!("Failed to serialize result: {}", e)))
        }) {
            Ok(content) => McpResponse::success(id, content),
            Err(e) => McpResponse::error(id, e.error_code(), &e.message()),
        },
        Err(_) => McpResponse::error(id, "timeout", "Search request exceeded 120 second timeout"),
    }
}

async fn handle_search_impl(args: Value) -> Result<ToolResult, AppError> {
    let search_args: SearchArgs = serde_json::from_value(args)
        .map_err(|e| AppError::InvalidInput(format!("Invalid arguments: {}", e)))?;

    execute_search(search_args).await
}

/// Shared implementation for search (used by MCP and CLI)
pub async fn execute_search(search_args: SearchArgs) -> Result<ToolResult, AppError> {
    validate_query(&search_args.query)?;

    let config_file = search_args
        .config
        .clone()
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    let config = load_config(config_file.as_deref())
        .map_err(|e| AppError::ConfigError(format!("{:#}", e)))?;

    let options = build_options(&search_args, &config.search)?;
    let records = load_records(&search_args, &config).await?;
    let format = search_args.format.unwrap_or_default();
    let query = search_args.query;

    debug!(
        "Search request: '{}' over {} records, strategies {:?}",
        query,
        records.len(),
        options.resolved_strategies()
    );

    // Scoring is CPU-bound; keep it off the async workers
    let rendered = tokio::task::spawn_blocking(move || {
        let response = search(&query, &records, &options);
        render(&response, format)
    })
    .await??;

    Ok(ToolResult::text(rendered))
}

fn render(response: &SearchResponse<'_>, format: OutputFormat) -> Result<String, AppError> {
    match format {
        OutputFormat::Markdown => Ok(format_search_results(response)),
        OutputFormat::Json => serde_json::to_string_pretty(response)
            .map_err(|e| AppError::Internal(format!("Failed to serialize response: {}", e))),
    }
}

/// Merge call arguments over the configured defaults
pub(crate) fn build_options(
    args: &SearchArgs,
    defaults: &SearchOptions,
) -> Result<SearchOptions, AppError> {
    let mut options = defaults.clone();

    if let Some(selection) = &args.strategies {
        let strategies =
            parse_strategies(selection).map_err(|e| AppError::InvalidInput(e.to_string()))?;
        if strategies.is_empty() {
            return Err(AppError::InvalidInput("No strategies selected".to_string()));
        }
        options.strategies = strategies;
    }
    if let Some(limit) = args.limit {
        options.max_results = limit;
    }
    if let Some(threshold) = args.threshold {
        options.fuzzy_threshold = threshold;
    }
    match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => options.location = Some(GeoPoint::new(lat, lng)),
        (None, None) => {}
        _ => {
            return Err(AppError::InvalidInput(
                "lat and lng must be given together".to_string(),
            ))
        }
    }
    if let Some(filters) = &args.filters {
        let parsed: BTreeMap<String, FilterValue> = serde_json::from_str(filters)
            .map_err(|e| AppError::InvalidInput(format!("Invalid filters: {}", e)))?;
        options.filters.extend(parsed);
    }
    if args.no_highlights {
        options.include_highlights = false;
    }

    options
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    Ok(options)
}

/// Records from the inline argument, else from the named or configured file
pub(crate) async fn load_records(args: &SearchArgs, config: &Config) -> Result<Vec<Record>, AppError> {
    if let Some(inline) = &args.records {
        return inline
            .iter()
            .enumerate()
            .map(|(i, value)| {
                serde_json::from_value(value.clone()).map_err(|e| {
                    AppError::RecordsLoadFailed(format!("Record {} is malformed: {}", i, e))
                })
            })
            .collect();
    }

    let path = args
        .records_file
        .as_ref()
        .or(config.records.as_ref())
        .ok_or_else(|| {
            AppError::InvalidInput(
                "No records given: pass records_file or inline records, or set records in the config file"
                    .to_string(),
            )
        })?;

    read_records_file(path).await
}

async fn read_records_file(path: &Path) -> Result<Vec<Record>, AppError> {
    let data = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::RecordsLoadFailed(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let records = parse_records(&data).map_err(|e| match e {
        AppError::RecordsLoadFailed(msg) => {
            AppError::RecordsLoadFailed(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })?;

    debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Parse a records document: a JSON array, or an object with a `records` array
pub(crate) fn parse_records(data: &str) -> Result<Vec<Record>, AppError> {
    let value: Value = serde_json::from_str(data)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("records") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(AppError::RecordsLoadFailed(
                    "expected an array of records or an object with a \"records\" array"
                        .to_string(),
                ))
            }
        },
        _ => {
            return Err(AppError::RecordsLoadFailed(
                "expected an array of records".to_string(),
            ))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item)
                .map_err(|e| AppError::RecordsLoadFailed(format!("record {}: {}", i, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchMethod;
    use serde_json::json;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    /// Args that never pick up a user's real config file
    fn args_with(query: &str, dir: &TempDir) -> SearchArgs {
        SearchArgs {
            query: query.to_string(),
            config: Some(dir.path().join("config.json")),
            ..SearchArgs::default()
        }
    }

    fn colleges_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            json!([
                { "college_name": "Arjun Institute", "city": "Bangalore", "state": "Karnataka", "fees": 40000 },
                { "college_name": "Arjuna College", "city": "Mysore", "state": "Karnataka", "fees": 90000 },
                { "college_name": "Beta University", "city": "Chennai", "state": "Tamil Nadu", "fees": 30000 }
            ])
        )
        .unwrap();
        file
    }

    fn text_of(result: &ToolResult) -> &str {
        &result.content[0].text
    }

    #[tokio::test]
    async fn test_execute_search_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = colleges_file();
        let mut args = args_with("arjun", &dir);
        args.records_file = Some(file.path().to_path_buf());
        args.strategies = Some("fuzzy".to_string());

        let result = execute_search(args).await.unwrap();
        let md = text_of(&result);
        assert!(md.starts_with("# Search Results · 2 records"));
        assert!(md.contains("## 1. Arjun Institute · 100.0"));
        assert!(md.contains("- name: <mark>Arjun</mark> Institute"));
        assert!(md.find("Arjun Institute").unwrap() < md.find("Arjuna College").unwrap());
    }

    #[tokio::test]
    async fn test_execute_search_json_format() {
        let dir = tempfile::tempdir().unwrap();
        let file = colleges_file();
        let mut args = args_with("arjun", &dir);
        args.records_file = Some(file.path().to_path_buf());
        args.format = Some(OutputFormat::Json);
        args.filters = Some(r#"{"fees":{"max":50000}}"#.to_string());

        let result = execute_search(args).await.unwrap();
        let response: Value = serde_json::from_str(text_of(&result)).unwrap();
        assert_eq!(response["success"], json!(true));
        assert_eq!(response["total"], json!(1));
        assert_eq!(response["results"][0]["record"]["name"], json!("Arjun Institute"));
    }

    #[tokio::test]
    async fn test_execute_search_inline_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args_with("beta", &dir);
        args.records = Some(vec![json!({ "name": "Beta University" }), json!({ "name": "Gamma" })]);

        let result = execute_search(args).await.unwrap();
        assert!(text_of(&result).contains("Beta University"));
        assert!(!text_of(&result).contains("Gamma"));
    }

    #[tokio::test]
    async fn test_execute_search_uses_config_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = colleges_file();
        std::fs::write(
            dir.path().join("config.json"),
            json!({
                "records": file.path(),
                "search": { "maxResults": 1, "strategies": ["fuzzy"] }
            })
            .to_string(),
        )
        .unwrap();

        let mut args = args_with("arjun", &dir);
        args.format = Some(OutputFormat::Json);

        let result = execute_search(args).await.unwrap();
        let response: Value = serde_json::from_str(text_of(&result)).unwrap();
        assert_eq!(response["total"], json!(1));
        assert_eq!(response["strategiesUsed"], json!(["fuzzy"]));
    }

    #[tokio::test]
    async fn test_execute_search_query_too_long() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args_with(&"a".repeat(501), &dir);
        args.records = Some(vec![]);

        match execute_search(args).await {
            Err(AppError::InvalidInput(msg)) => assert!(msg.contains("too long")),
            other => panic!("Unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_execute_search_without_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let args = args_with("arjun", &dir);

        match execute_search(args).await {
            Err(AppError::InvalidInput(msg)) => assert!(msg.contains("No records given")),
            other => panic!("Unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_execute_search_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args_with("arjun", &dir);
        args.records_file = Some(dir.path().join("nope.json"));

        let err = execute_search(args).await.err().unwrap();
        assert_eq!(err.error_code(), "records_load_failed");
    }

    #[tokio::test]
    async fn test_execute_search_empty_query_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args_with("   ", &dir);
        args.records = Some(vec![json!({ "name": "Arjun" })]);

        let result = execute_search(args).await.unwrap();
        assert!(text_of(&result).starts_with("# Search Results · 0 records"));
    }

    #[test]
    fn test_build_options_overrides_defaults() {
        let args = SearchArgs {
            query: "x".to_string(),
            strategies: Some("regex, fuzzy".to_string()),
            limit: Some(3),
            threshold: Some(0.5),
            lat: Some(12.9),
            lng: Some(77.5),
            filters: Some(r#"{"state":"Karnataka"}"#.to_string()),
            no_highlights: true,
            ..SearchArgs::default()
        };

        let options = build_options(&args, &SearchOptions::default()).unwrap();
        assert_eq!(options.resolved_strategies(), vec![SearchMethod::Fuzzy, SearchMethod::Regex]);
        assert_eq!(options.max_results, 3);
        assert_eq!(options.fuzzy_threshold, 0.5);
        assert_eq!(options.location, Some(GeoPoint::new(12.9, 77.5)));
        assert_eq!(options.filters.len(), 1);
        assert!(!options.include_highlights);
    }

    #[test]
    fn test_build_options_rejects_bad_input() {
        let base = SearchArgs {
            query: "x".to_string(),
            ..SearchArgs::default()
        };
        let defaults = SearchOptions::default();

        let unknown = SearchArgs { strategies: Some("telepathy".to_string()), ..base.clone() };
        assert!(matches!(build_options(&unknown, &defaults), Err(AppError::InvalidInput(_))));

        let half_location = SearchArgs { lat: Some(1.0), ..base.clone() };
        assert!(matches!(build_options(&half_location, &defaults), Err(AppError::InvalidInput(_))));

        let bad_filters = SearchArgs { filters: Some("[1,2]".to_string()), ..base.clone() };
        assert!(matches!(build_options(&bad_filters, &defaults), Err(AppError::InvalidInput(_))));

        let zero_limit = SearchArgs { limit: Some(0), ..base };
        match build_options(&zero_limit, &defaults) {
            Err(AppError::InvalidInput(msg)) => assert!(msg.contains("maxResults")),
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_records_shapes() {
        let records = parse_records(r#"[{"name":"A"},{"college_name":"B","lat":1.0,"lng":2.0}]"#).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name.as_deref(), Some("B"));
        assert_eq!(records[1].coordinates(), Some((1.0, 2.0)));

        let wrapped = parse_records(r#"{"records":[{"name":"A"}]}"#).unwrap();
        assert_eq!(wrapped.len(), 1);

        assert!(parse_records(r#"{"rows":[]}"#).is_err());
        assert!(parse_records("42").is_err());
        assert!(parse_records("not json").is_err());
    }

    #[test]
    fn test_parse_records_reads_loose_attributes() {
        let records = parse_records(
            r#"[
                {"name":"Alpha","latitude":"12.97","longitude":"77.59"},
                {"name":"Beta","college_name":"Beta College"},
                {"college_name":"Gamma Medical","course":["MBBS","BDS"],"fees":"n/a"}
            ]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].coordinates(), Some((12.97, 77.59)));
        assert_eq!(records[1].name.as_deref(), Some("Beta"));
        assert_eq!(records[2].name.as_deref(), Some("Gamma Medical"));
        assert_eq!(records[2].course.as_deref(), Some("MBBS, BDS"));
        assert_eq!(records[2].attribute("fees"), Some(json!("n/a")));
    }

    #[tokio::test]
    async fn test_execute_search_loose_record_does_not_abort_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            json!([
                { "name": "Arjun Institute", "latitude": "12.97", "longitude": "77.59" },
                { "name": "Arjuna College", "college_name": "Arjuna College of Arts" },
                { "college_name": "Beta Dental", "course": ["BDS", "MDS"] }
            ])
        )
        .unwrap();

        let mut args = args_with("bds", &dir);
        args.records_file = Some(file.path().to_path_buf());
        args.format = Some(OutputFormat::Json);

        let result = execute_search(args).await.unwrap();
        let response: Value = serde_json::from_str(text_of(&result)).unwrap();
        assert_eq!(response["success"], json!(true));
        assert_eq!(response["results"][0]["record"]["name"], json!("Beta Dental"));
    }

    #[test]
    fn test_format_search_results_failure() {
        let records: Vec<Record> = Vec::new();
        let mut options = SearchOptions::default();
        options.max_results = 0;
        let response = search("x", &records, &options);

        let md = format_search_results(&response);
        assert!(md.starts_with("# Search Failed"));
        assert!(md.contains("maxResults"));
    }

    #[test]
    fn test_format_search_results_reports_skipped_strategies() {
        let records = vec![Record::named("Arjun (North)")];
        let response = search("(", &records, &SearchOptions::default());

        let md = format_search_results(&response);
        assert!(md.contains("> regex skipped:"));
    }

    #[test]
    fn test_format_search_results_title_fallbacks() {
        let records: Vec<Record> = vec![
            serde_json::from_value(json!({ "id": "c-17", "city": "Pune" })).unwrap(),
            serde_json::from_value(json!({ "city": "Pune" })).unwrap(),
        ];
        let response = search("pune", &records, &SearchOptions::with_strategies(&[SearchMethod::Location]));

        let md = format_search_results(&response);
        assert!(md.contains("## 1. c-17"));
        assert!(md.contains("## 2. Record #1"));
    }

    #[tokio::test]
    async fn test_handle_search_returns_content() {
        let resp = handle_search(
            Some(json!(7)),
            json!({ "query": "arjun", "records": [{ "name": "Arjun Institute" }], "config": "/nonexistent/polysearch/config.json" }),
        )
        .await;

        assert!(resp.error.is_none());
        let result = resp.result.expect("result present");
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Arjun Institute"));
    }

    #[tokio::test]
    async fn test_handle_search_invalid_arguments() {
        let resp = handle_search(Some(json!(8)), json!({ "limit": 3 })).await;
        let error = resp.error.expect("error present");
        assert_eq!(error.code, "invalid_input");
        assert!(error.message.contains("Invalid arguments"));
    }
}
