use std::fmt;

use tracing::{info, warn};

use crate::{record::CorrectedRecord, transport::HttpTransport};

pub const CREATE_RECORD_PATH: &str = "/iaq/createrecord";

pub const CUSTOM_HEADER: (&str, &str) = ("X-Custom-Header", "creaXtive");

/// Cloud URIs no longer than a bare placeholder host are treated as unset.
const PLACEHOLDER_HOST: &str = "localhost";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Local,
    Cloud,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Local => "local",
            SinkKind::Cloud => "cloud",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sink {
    pub kind: SinkKind,
    pub base_uri: String,
}

impl Sink {
    pub fn new(kind: SinkKind, base_uri: &str) -> Self {
        Self {
            kind,
            base_uri: base_uri.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{CREATE_RECORD_PATH}", self.base_uri)
    }

    pub async fn deliver<T>(&self, transport: &T, body: &str) -> DeliveryOutcome
    where
        T: HttpTransport + ?Sized,
    {
        let endpoint = self.endpoint();
        match transport.post_json(&endpoint, &[CUSTOM_HEADER], body).await {
            Ok(response) => {
                let status = response.status;
                if response.is_success() {
                    info!(sink = %self.kind, status, body = %response.body, "record delivered");
                } else {
                    warn!(sink = %self.kind, status, body = %response.body, "record rejected");
                }
                DeliveryOutcome::Delivered {
                    sink: self.kind,
                    status: response.status,
                    body: response.body,
                }
            }
            Err(e) => {
                warn!(sink = %self.kind, %endpoint, "failed to deliver record: {e:#}");
                DeliveryOutcome::Failed {
                    sink: self.kind,
                    error: format!("{e:#}"),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered {
        sink: SinkKind,
        status: u16,
        body: String,
    },
    Failed {
        sink: SinkKind,
        error: String,
    },
}

impl DeliveryOutcome {
    pub fn sink(&self) -> SinkKind {
        match self {
            DeliveryOutcome::Delivered { sink, .. } | DeliveryOutcome::Failed { sink, .. } => {
                *sink
            }
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sinks {
    pub local: Sink,
    pub cloud: Option<Sink>,
}

impl Sinks {
    pub fn new(local_uri: &str, cloud_uri: &str) -> Self {
        let cloud = (cloud_uri.len() > PLACEHOLDER_HOST.len())
            .then(|| Sink::new(SinkKind::Cloud, cloud_uri));

        Self {
            local: Sink::new(SinkKind::Local, local_uri),
            cloud,
        }
    }

    /// Local first. A failing sink does not stop the others.
    pub async fn deliver_all<T>(
        &self,
        transport: &T,
        record: &CorrectedRecord,
    ) -> Vec<DeliveryOutcome>
    where
        T: HttpTransport + ?Sized,
    {
        let body = match serde_json::to_string(record) {
            Ok(body) => body,
            Err(e) => {
                warn!(device = %record.device, "failed to serialize record: {e}");
                return self
                    .iter()
                    .map(|sink| DeliveryOutcome::Failed {
                        sink: sink.kind,
                        error: e.to_string(),
                    })
                    .collect();
            }
        };

        let mut outcomes = Vec::with_capacity(2);
        for sink in self.iter() {
            outcomes.push(sink.deliver(transport, &body).await);
        }
        outcomes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sink> {
        std::iter::once(&self.local).chain(self.cloud.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::FakeTransport;

    fn record() -> CorrectedRecord {
        CorrectedRecord {
            device: "8caab58daaa1".to_string(),
            humidity: String::new(),
            temperature: "21.50".to_string(),
            co: "10.00".to_string(),
            tvoc: String::new(),
            pm2p5: String::new(),
            co2: "11.00".to_string(),
            c2h2: String::new(),
            pm10: String::new(),
            pm100: String::new(),
            o3: "4.00".to_string(),
            so2: "25.98".to_string(),
            no2: "51.07".to_string(),
            hcho: "1.07".to_string(),
            date_created: "2024-03-09 07:05:01".to_string(),
        }
    }

    #[test]
    fn cloud_sink_requires_more_than_a_placeholder_host() {
        assert_eq!(Sinks::new("http://localhost:4000", "").cloud, None);
        assert_eq!(Sinks::new("http://localhost:4000", "localhost").cloud, None);

        let sinks = Sinks::new("http://localhost:4000/", "https://iaq.example.com/api/");
        assert_eq!(sinks.local.endpoint(), "http://localhost:4000/iaq/createrecord");
        assert_eq!(
            sinks.cloud.unwrap().endpoint(),
            "https://iaq.example.com/api/iaq/createrecord"
        );
    }

    #[tokio::test]
    async fn posts_same_body_to_local_then_cloud() {
        let transport = FakeTransport::default()
            .reply(200, "ok")
            .reply(201, "created");
        let sinks = Sinks::new("http://localhost:4000", "https://iaq.example.com/api");

        let outcomes = sinks.deliver_all(&transport, &record()).await;

        assert_eq!(
            outcomes,
            vec![
                DeliveryOutcome::Delivered {
                    sink: SinkKind::Local,
                    status: 200,
                    body: "ok".to_string()
                },
                DeliveryOutcome::Delivered {
                    sink: SinkKind::Cloud,
                    status: 201,
                    body: "created".to_string()
                },
            ]
        );

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, "http://localhost:4000/iaq/createrecord");
        assert_eq!(requests[1].url, "https://iaq.example.com/api/iaq/createrecord");
        assert_eq!(requests[0].body, requests[1].body);
        assert_eq!(
            requests[0].headers,
            vec![("X-Custom-Header".to_string(), "creaXtive".to_string())]
        );
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body["device"], "8caab58daaa1");
        assert_eq!(body["temperature"], "21.50");
    }

    #[tokio::test]
    async fn local_failure_does_not_block_cloud() {
        let transport = FakeTransport::default()
            .fail("connection refused")
            .reply(200, "ok");
        let sinks = Sinks::new("http://localhost:4000", "https://iaq.example.com/api");

        let outcomes = sinks.deliver_all(&transport, &record()).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].sink(), SinkKind::Local);
        assert!(!outcomes[0].is_delivered());
        assert_eq!(outcomes[1].sink(), SinkKind::Cloud);
        assert!(outcomes[1].is_delivered());
    }

    #[tokio::test]
    async fn error_status_is_still_a_delivery() {
        let transport = FakeTransport::default().reply(500, "boom");
        let sinks = Sinks::new("http://localhost:4000", "");

        let outcomes = sinks.deliver_all(&transport, &record()).await;

        assert_eq!(
            outcomes,
            vec![DeliveryOutcome::Delivered {
                sink: SinkKind::Local,
                status: 500,
                body: "boom".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn redelivery_sends_identical_body() {
        let transport = FakeTransport::default();
        let sinks = Sinks::new("http://localhost:4000", "");
        let record = record();

        sinks.deliver_all(&transport, &record).await;
        sinks.deliver_all(&transport, &record).await;

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
    }
}
