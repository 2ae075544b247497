use crate::config::SourceConfig;
use crate::fetcher::traits::MonthSource;
use crate::model::{FetchError, MonthFetch, ParserError, YearMonth};
use crate::parser::{CensusParser, Parser};

use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

/// Client for the Census international-trade time-series endpoint.
pub struct CensusFetcher {
    client: Client,
    endpoint: String,
    commodity_level: String,
    api_key: Option<String>,
    parser: CensusParser,
}

impl CensusFetcher {
    pub fn new(cfg: &SourceConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: cfg.endpoint.clone(),
            commodity_level: cfg.commodity_level.clone(),
            api_key: cfg.api_key.clone(),
            parser: CensusParser::new(),
        })
    }

    pub fn commodity_level(&self) -> &str {
        &self.commodity_level
    }

    fn build_query(&self, period: YearMonth) -> Vec<(&'static str, String)> {
        let columns = self.parser.columns();
        let mut query = vec![
            (
                "get",
                format!("{},{},{}", columns.code, columns.description, columns.value),
            ),
            ("time", period.time_param()),
            ("COMM_LVL", self.commodity_level.clone()),
            ("I_COMMODITY", "*".to_string()),
        ];
        if let Some(key) = &self.api_key {
            query.push(("key", key.clone()));
        }
        query
    }

    /// Turns a status and body into a month outcome.
    fn interpret(
        &self,
        period: YearMonth,
        status: StatusCode,
        body: &str,
    ) -> Result<MonthFetch, FetchError> {
        if status == StatusCode::NO_CONTENT {
            debug!("{}: no content published yet", period);
            return Ok(MonthFetch::NoContent);
        }
        if !status.is_success() {
            warn!("{}: API responded [{}]: {}", period, status, snippet(body));
            return Ok(MonthFetch::Unavailable {
                reason: format!("HTTP {}", status),
            });
        }
        if body.trim().is_empty() {
            return Ok(MonthFetch::NoContent);
        }

        match self.parser.parse(body) {
            Ok(records) if records.is_empty() => Ok(MonthFetch::NoContent),
            Ok(records) => {
                debug!("{}: parsed {} records", period, records.len());
                Ok(MonthFetch::Records(records))
            }
            Err(e @ ParserError::InvalidValue { .. }) => {
                Err(FetchError::InvalidValue { period, source: e })
            }
            Err(e) => {
                warn!("{}: unusable response: {}", period, e);
                Ok(MonthFetch::Unavailable {
                    reason: e.to_string(),
                })
            }
        }
    }
}

fn snippet(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[async_trait::async_trait]
impl MonthSource for CensusFetcher {
    async fn fetch_month(&self, period: YearMonth) -> Result<MonthFetch, FetchError> {
        let query = self.build_query(period);

        let response = match self.client.get(&self.endpoint).query(&query).send().await {
            Ok(resp) => resp,
            Err(e) => {
                let reason = if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                };
                warn!("{}: request failed: {}", period, reason);
                return Ok(MonthFetch::Unavailable { reason });
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("{}: failed to read body: {}", period, e);
                return Ok(MonthFetch::Unavailable {
                    reason: e.to_string(),
                });
            }
        };

        self.interpret(period, status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const PERIOD: YearMonth = YearMonth::new(2025, 2);

    fn fetcher(api_key: Option<&str>) -> CensusFetcher {
        let cfg = SourceConfig {
            api_key: api_key.map(str::to_string),
            ..SourceConfig::default()
        };
        CensusFetcher::new(&cfg).unwrap()
    }

    #[test]
    fn query_selects_fields_period_and_level() {
        let query = fetcher(None).build_query(PERIOD);
        assert!(query.contains(&("get", "I_COMMODITY,I_COMMODITY_SDESC,I_GEN_VAL_MO".to_string())));
        assert!(query.contains(&("time", "2025-02".to_string())));
        assert!(query.contains(&("COMM_LVL", "HS4".to_string())));
        assert!(query.contains(&("I_COMMODITY", "*".to_string())));
        assert!(!query.iter().any(|(k, _)| *k == "key"));
    }

    #[test]
    fn api_key_is_appended_when_configured() {
        let query = fetcher(Some("secret")).build_query(PERIOD);
        assert!(query.contains(&("key", "secret".to_string())));
    }

    #[test]
    fn no_content_status_is_empty_month() {
        let out = fetcher(None).interpret(PERIOD, StatusCode::NO_CONTENT, "").unwrap();
        assert_eq!(out, MonthFetch::NoContent);
    }

    #[test]
    fn error_status_is_soft_failure() {
        let out = fetcher(None)
            .interpret(PERIOD, StatusCode::INTERNAL_SERVER_ERROR, "boom")
            .unwrap();
        assert!(matches!(out, MonthFetch::Unavailable { .. }));
    }

    #[test]
    fn success_body_is_parsed() {
        let body = r#"[["I_COMMODITY","I_COMMODITY_SDESC","I_GEN_VAL_MO"],["0101","LIVE HORSES","5"]]"#;
        let out = fetcher(None).interpret(PERIOD, StatusCode::OK, body).unwrap();
        assert_eq!(out.records().len(), 1);
        assert_eq!(out.records()[0].value, 5.0);
    }

    #[test]
    fn empty_or_header_only_body_is_no_content() {
        let f = fetcher(None);
        assert_eq!(f.interpret(PERIOD, StatusCode::OK, "  ").unwrap(), MonthFetch::NoContent);
        let header_only = r#"[["I_COMMODITY","I_GEN_VAL_MO"]]"#;
        assert_eq!(
            f.interpret(PERIOD, StatusCode::OK, header_only).unwrap(),
            MonthFetch::NoContent
        );
    }

    #[test]
    fn missing_value_column_is_soft_failure() {
        let body = r#"[["I_COMMODITY"],["0101"]]"#;
        let out = fetcher(None).interpret(PERIOD, StatusCode::OK, body).unwrap();
        assert!(matches!(out, MonthFetch::Unavailable { .. }));
    }

    #[test]
    fn bad_number_is_a_hard_error_tied_to_the_period() {
        let body = r#"[["I_COMMODITY","I_GEN_VAL_MO"],["0101","n/a"]]"#;
        match fetcher(None).interpret(PERIOD, StatusCode::OK, body) {
            Err(FetchError::InvalidValue { period, .. }) => assert_eq!(period, PERIOD),
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    /// Local endpoint, bypassing any proxy set in the environment.
    fn fetcher_for(endpoint: String, timeout_seconds: u64) -> CensusFetcher {
        let cfg = SourceConfig {
            endpoint,
            timeout_seconds,
            ..SourceConfig::default()
        };
        let mut f = CensusFetcher::new(&cfg).unwrap();
        f.client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .build()
            .unwrap();
        f
    }

    #[tokio::test]
    async fn silent_server_times_out_as_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            // Hold the connection open without answering.
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let f = fetcher_for(format!("http://{}/data", addr), 1);
        let out = f.fetch_month(PERIOD).await.unwrap();
        server.abort();

        assert_eq!(
            out,
            MonthFetch::Unavailable {
                reason: "request timed out".into()
            }
        );
    }

    #[tokio::test]
    async fn refused_connection_is_unavailable() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let f = fetcher_for(format!("http://{}/data", addr), 5);
        let out = f.fetch_month(PERIOD).await.unwrap();
        assert!(matches!(out, MonthFetch::Unavailable { .. }));
    }

    #[tokio::test]
    async fn served_table_becomes_records() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).into_owned();

            let body = r#"[["I_COMMODITY","I_COMMODITY_SDESC","I_GEN_VAL_MO"],["0101","LIVE HORSES","1000"]]"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            request
        });

        let f = fetcher_for(format!("http://{}/data", addr), 5);
        let out = f.fetch_month(PERIOD).await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("GET /data?"));
        assert!(request.contains("time=2025-02"));
        assert_eq!(out.records().len(), 1);
        assert_eq!(out.records()[0].category_code, "0101");
        assert_eq!(out.records()[0].value, 1000.0);
    }
}
