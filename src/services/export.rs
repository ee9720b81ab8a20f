use crate::error::ApiError;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        match raw {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ApiError::BadRequest(format!(
                "Unsupported export format '{other}', expected json or csv"
            ))),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }
}

/// Formats already-computed views for download. The caller supplies the
/// mapping from view name to computed view; nothing is fetched here.
pub struct ExportService;

impl ExportService {
    pub fn build(
        views: &BTreeMap<String, Value>,
        format: ExportFormat,
    ) -> Result<String, ApiError> {
        match format {
            ExportFormat::Json => serde_json::to_string_pretty(views).map_err(|e| {
                ApiError::InternalServerError(format!("Failed to serialize export: {e}"))
            }),
            ExportFormat::Csv => Ok(Self::build_csv(views)),
        }
    }

    /// Scalar metrics become `key,value` lines; a post list becomes a
    /// fixed-column table.
    fn build_csv(views: &BTreeMap<String, Value>) -> String {
        let mut out = String::new();

        for (name, view) in views {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("# {name}\n"));

            if let Some(fields) = view.as_object() {
                out.push_str("metric,value\n");
                for (key, value) in fields {
                    match value {
                        Value::String(s) => {
                            out.push_str(&format!("{key},{}\n", csv_escape(s)));
                        }
                        Value::Number(n) => {
                            out.push_str(&format!("{key},{n}\n"));
                        }
                        Value::Bool(b) => {
                            out.push_str(&format!("{key},{b}\n"));
                        }
                        _ => {}
                    }
                }

                if let Some(posts) = fields.get("recent_posts").and_then(|p| p.as_array()) {
                    out.push('\n');
                    out.push_str("id,media_type,timestamp,likes,comments,engagement\n");
                    for post in posts {
                        out.push_str(&format!(
                            "{},{},{},{},{},{}\n",
                            post["id"].as_str().unwrap_or_default(),
                            post["media_type"].as_str().unwrap_or_default(),
                            post["timestamp"].as_str().unwrap_or_default(),
                            post["like_count"].as_i64().unwrap_or(0),
                            post["comments_count"].as_i64().unwrap_or(0),
                            post["engagement"].as_i64().unwrap_or(0),
                        ));
                    }
                }
            }
        }

        out
    }
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_parsing() {
        assert_eq!(ExportFormat::parse("json").unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::parse("csv").unwrap(), ExportFormat::Csv);
        assert!(ExportFormat::parse("xml").is_err());
    }

    #[test]
    fn test_csv_flattens_scalars_and_post_list() {
        let mut views = BTreeMap::new();
        views.insert(
            "overview".to_string(),
            json!({
                "username": "demo",
                "followers_count": 1000,
                "engagement_rate": 0.5,
                "recent_posts": [
                    {
                        "id": "p1",
                        "media_type": "IMAGE",
                        "timestamp": "2024-06-01T12:00:00Z",
                        "like_count": 40,
                        "comments_count": 10,
                        "engagement": 50
                    }
                ]
            }),
        );

        let csv = ExportService::build(&views, ExportFormat::Csv).unwrap();
        assert!(csv.contains("# overview\n"));
        assert!(csv.contains("username,demo\n"));
        assert!(csv.contains("followers_count,1000\n"));
        assert!(csv.contains("engagement_rate,0.5\n"));
        assert!(csv.contains("id,media_type,timestamp,likes,comments,engagement\n"));
        assert!(csv.contains("p1,IMAGE,2024-06-01T12:00:00Z,40,10,50\n"));
    }

    #[test]
    fn test_csv_escapes_commas_and_quotes() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_json_passthrough() {
        let mut views = BTreeMap::new();
        views.insert("reels".to_string(), json!({"reel_multiplier": 2.0}));

        let out = ExportService::build(&views, ExportFormat::Json).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["reels"]["reel_multiplier"], 2.0);
    }
}
