use std::{sync::Arc, time::Duration};

use rumqttc::{AsyncClient, Event, EventLoop, Packet, SubscribeFilter};
use tracing::{debug, error, info, warn};

use crate::{
    adjustment::AdjustmentTable,
    delivery::{DeliveryOutcome, Sinks},
    record::{CorrectedRecord, RawTelemetry},
    transport::HttpTransport,
};

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Malformed,
    Skipped,
    Delivered(Vec<DeliveryOutcome>),
}

pub struct Dispatcher<T> {
    table: Arc<AdjustmentTable>,
    sinks: Sinks,
    transport: T,
}

impl<T: HttpTransport> Dispatcher<T> {
    pub fn new(table: Arc<AdjustmentTable>, sinks: Sinks, transport: T) -> Self {
        Self {
            table,
            sinks,
            transport,
        }
    }

    pub async fn handle(&self, topic: &str, payload: &[u8]) -> DispatchOutcome {
        let raw = match RawTelemetry::from_slice(payload) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    topic,
                    payload = %String::from_utf8_lossy(payload),
                    "failed to decode telemetry: {e}"
                );
                return DispatchOutcome::Malformed;
            }
        };

        let Some(record) = CorrectedRecord::build(&raw, &self.table) else {
            debug!(topic, device = %raw.mac, "ignoring message without a usable device identifier");
            return DispatchOutcome::Skipped;
        };

        DispatchOutcome::Delivered(self.sinks.deliver_all(&self.transport, &record).await)
    }

    /// Subscriptions are reissued on every CONNACK so an automatic reconnect
    /// with a clean session picks the filters up again.
    pub async fn run(
        &self,
        client: &AsyncClient,
        mut event_loop: EventLoop,
        filters: Vec<SubscribeFilter>,
    ) {
        subscribe(client, &filters);

        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    self.handle(&publish.topic, &publish.payload).await;
                }
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("reconnected to broker");
                    subscribe(client, &filters);
                }
                Ok(_) => {}
                Err(e) => {
                    error!("broker connection error: {e}");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }
}

fn subscribe(client: &AsyncClient, filters: &[SubscribeFilter]) {
    if filters.is_empty() {
        warn!("no topic filters configured");
        return;
    }

    match client.try_subscribe_many(filters.to_vec()) {
        Ok(()) => {
            let paths: Vec<&str> = filters.iter().map(|f| f.path.as_str()).collect();
            info!(?paths, "subscribed");
        }
        Err(e) => error!("failed to subscribe: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{adjustment::AdjustmentProfile, transport::testing::FakeTransport};

    fn dispatcher(transport: FakeTransport, cloud_uri: &str) -> Dispatcher<FakeTransport> {
        let table: AdjustmentTable = [AdjustmentProfile {
            device: "8caab58daaa1".to_string(),
            co_adjust: "-15".to_string(),
            ..Default::default()
        }]
        .into_iter()
        .collect();

        Dispatcher::new(
            Arc::new(table),
            Sinks::new("http://localhost:4000", cloud_uri),
            transport,
        )
    }

    #[tokio::test]
    async fn malformed_payload_makes_no_request() {
        let d = dispatcher(FakeTransport::default(), "");

        let outcome = d.handle("GASDATA/x", b"{\"mac\": ").await;

        assert_eq!(outcome, DispatchOutcome::Malformed);
        assert!(d.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn array_payload_is_malformed() {
        let d = dispatcher(FakeTransport::default(), "");

        let outcome = d.handle("GASDATA/x", br#"["8caab58daaa1", 10.0]"#).await;

        assert_eq!(outcome, DispatchOutcome::Malformed);
        assert!(d.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn missing_or_short_identifier_is_skipped() {
        let d = dispatcher(FakeTransport::default(), "");

        assert_eq!(d.handle("GASDATA/x", b"{\"co\": 1}").await, DispatchOutcome::Skipped);
        assert_eq!(
            d.handle("GASDATA/x", b"{\"mac\": \"8caab5\", \"co\": 1}").await,
            DispatchOutcome::Skipped
        );
        assert!(d.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn calibrated_record_goes_to_local_then_cloud() {
        let d = dispatcher(FakeTransport::default(), "https://iaq.example.com/api");

        let outcome = d
            .handle(
                "GASDATA/8caab58daaa1",
                br#"{"mac":"8caab58daaa1","co":10.0,"co2":11}"#,
            )
            .await;

        let DispatchOutcome::Delivered(outcomes) = outcome else {
            panic!("expected delivery, got {outcome:?}");
        };
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(DeliveryOutcome::is_delivered));

        let requests = d.transport.requests();
        assert_eq!(requests[0].url, "http://localhost:4000/iaq/createrecord");
        assert_eq!(requests[1].url, "https://iaq.example.com/api/iaq/createrecord");

        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body["co"], "0");
        assert_eq!(body["co2"], "11.00");
    }
}
