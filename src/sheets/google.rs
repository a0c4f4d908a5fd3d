//! Google Sheets v4 REST backend.
//!
//! Authentication is a pre-issued OAuth bearer token; obtaining one is left
//! to the deployment.

use super::{DocumentInfo, SheetGateway, SheetInfo};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

pub struct GoogleSheets {
    client: Client,
    base: Url,
    spreadsheet_id: String,
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    properties: DocumentProperties,
    #[serde(default)]
    sheets: Vec<SheetEnvelope>,
}

#[derive(Deserialize, Default)]
struct DocumentProperties {
    #[serde(default)]
    title: String,
}

#[derive(Deserialize)]
struct SheetEnvelope {
    properties: SheetProperties,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    #[serde(default)]
    sheet_id: i64,
    title: String,
}

#[derive(Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<BatchReply>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchReply {
    add_sheet: Option<SheetEnvelope>,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl From<SheetProperties> for SheetInfo {
    fn from(p: SheetProperties) -> Self {
        SheetInfo {
            sheet_id: p.sheet_id,
            title: p.title,
        }
    }
}

impl GoogleSheets {
    pub fn new(
        base: &str,
        spreadsheet_id: impl Into<String>,
        access_token: Option<String>,
        timeout: std::time::Duration,
    ) -> AppResult<Self> {
        let spreadsheet_id = spreadsheet_id.into();
        if spreadsheet_id.trim().is_empty() {
            return Err(AppError::Config(
                "spreadsheet_id is not set (config file or GOOGLE_SHEET_ID)".to_string(),
            ));
        }

        let base = Url::parse(base)
            .map_err(|e| AppError::Config(format!("invalid sheets_api_base '{}': {}", base, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base,
            spreadsheet_id,
            access_token,
        })
    }

    pub fn from_config(cfg: &Config) -> AppResult<Self> {
        Self::new(
            &cfg.sheets_api_base,
            cfg.spreadsheet_id.clone(),
            cfg.access_token.clone(),
            cfg.request_timeout(),
        )
    }

    /// `{base}/spreadsheets/{id}{suffix}` followed by extra path segments.
    fn url(&self, suffix: &str, extra: &[&str]) -> AppResult<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AppError::Config("sheets_api_base cannot be a base URL".into()))?;
            segments.pop_if_empty();
            segments.push("spreadsheets");
            let last = extra.len();
            if last == 0 {
                segments.push(&format!("{}{}", self.spreadsheet_id, suffix));
            } else {
                segments.push(&self.spreadsheet_id);
                for (i, seg) in extra.iter().enumerate() {
                    if i + 1 == last {
                        segments.push(&format!("{}{}", seg, suffix));
                    } else {
                        segments.push(seg);
                    }
                }
            }
        }
        Ok(url)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn check(op: &str, resp: Response) -> AppResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(AppError::Sync(format!("{} failed ({}): {}", op, status, body.trim())))
    }
}

/// A1 range covering the given sheet, with the title quoted.
fn quoted_range(title: &str, cells: &str) -> String {
    format!("'{}'!{}", title.replace('\'', "''"), cells)
}

fn to_values(rows: &[Vec<String>]) -> serde_json::Value {
    json!(rows)
}

#[async_trait::async_trait]
impl SheetGateway for GoogleSheets {
    async fn load_info(&self) -> AppResult<DocumentInfo> {
        let mut url = self.url("", &[])?;
        url.query_pairs_mut()
            .append_pair("fields", "properties.title,sheets.properties(sheetId,title)");

        debug!(%url, "loading spreadsheet metadata");
        let resp = self.authorize(self.client.get(url)).send().await?;
        let body: SpreadsheetResponse = Self::check("load metadata", resp).await?.json().await?;

        Ok(DocumentInfo {
            title: body.properties.title,
            sheets: body.sheets.into_iter().map(|s| s.properties.into()).collect(),
        })
    }

    async fn add_sheet(&self, title: &str, header: &[String]) -> AppResult<SheetInfo> {
        let url = self.url(":batchUpdate", &[])?;
        let payload = json!({
            "requests": [{ "addSheet": { "properties": { "title": title } } }]
        });

        debug!(title, "creating sheet");
        let resp = self
            .authorize(self.client.post(url))
            .json(&payload)
            .send()
            .await?;
        let body: BatchUpdateResponse = Self::check("add sheet", resp).await?.json().await?;

        let info: SheetInfo = body
            .replies
            .into_iter()
            .find_map(|r| r.add_sheet)
            .map(|s| s.properties.into())
            .ok_or_else(|| AppError::Sync("add sheet: empty reply".to_string()))?;

        if !header.is_empty() {
            self.write_header(&info, header).await?;
        }

        Ok(info)
    }

    async fn header_row(&self, sheet: &SheetInfo) -> AppResult<Vec<String>> {
        let range = quoted_range(&sheet.title, "1:1");
        let url = self.url("", &["values", &range])?;

        let resp = self.authorize(self.client.get(url)).send().await?;
        let body: ValueRange = Self::check("read header row", resp).await?.json().await?;

        Ok(body
            .values
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|v| match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect())
    }

    async fn write_header(&self, sheet: &SheetInfo, header: &[String]) -> AppResult<()> {
        let range = quoted_range(&sheet.title, "1:1");
        let mut url = self.url("", &["values", &range])?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let payload = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [header],
        });

        debug!(title = %sheet.title, "writing header row");
        let resp = self
            .authorize(self.client.put(url))
            .json(&payload)
            .send()
            .await?;
        Self::check("write header row", resp).await?;
        Ok(())
    }

    async fn append_rows(&self, sheet: &SheetInfo, rows: &[Vec<String>]) -> AppResult<()> {
        let range = quoted_range(&sheet.title, "A1");
        let mut url = self.url(":append", &["values", &range])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        debug!(title = %sheet.title, rows = rows.len(), "appending rows");
        let payload = json!({
            "majorDimension": "ROWS",
            "values": to_values(rows),
        });
        let resp = self
            .authorize(self.client.post(url))
            .json(&payload)
            .send()
            .await?;
        Self::check("append rows", resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn gateway() -> GoogleSheets {
        GoogleSheets::new(
            "https://sheets.googleapis.com/v4",
            "doc123",
            None,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn builds_document_urls() {
        let g = gateway();
        assert_eq!(
            g.url("", &[]).unwrap().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/doc123"
        );
        assert_eq!(
            g.url(":batchUpdate", &[]).unwrap().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/doc123:batchUpdate"
        );
    }

    #[test]
    fn range_segments_are_escaped() {
        let g = gateway();
        let range = quoted_range("Front End", "A1");
        let url = g.url(":append", &["values", &range]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/doc123/values/'Front%20End'!A1:append"
        );
    }

    #[test]
    fn quotes_in_titles_are_doubled() {
        assert_eq!(quoted_range("Bob's", "1:1"), "'Bob''s'!1:1");
    }

    #[test]
    fn missing_spreadsheet_id_is_config_error() {
        let err = GoogleSheets::new("https://x.test", "  ", None, Duration::from_secs(1));
        assert!(matches!(err, Err(AppError::Config(_))));
    }

    #[test]
    fn parses_metadata_payload() {
        let body: SpreadsheetResponse = serde_json::from_str(
            r#"{"properties":{"title":"Tracker"},
                "sheets":[{"properties":{"sheetId":0,"title":"Sheet1"}},
                          {"properties":{"sheetId":42,"title":"Frontend"}}]}"#,
        )
        .unwrap();
        assert_eq!(body.properties.title, "Tracker");
        let info: SheetInfo = body.sheets.into_iter().nth(1).unwrap().properties.into();
        assert_eq!(info.sheet_id, 42);
        assert_eq!(info.title, "Frontend");
    }
}
