use std::time::Duration;

use rumqttc::{AsyncClient, QoS};
use tokio::time::{Instant, interval_at};
use tokio_stream::{StreamExt as _, wrappers::IntervalStream};
use tracing::{debug, warn};

pub const TEST_INTERVAL: Duration = Duration::from_secs(10);

pub const TEST_TOPIC: &str = "GASDATATEST/8caab58daaa1";

pub const TEST_PAYLOAD: &str = r#"{"mac": "8caab58daaa1", "co": 10.0, "co2": 11, "o3": 4, "so2": 25.98, "no2": 51.07, "hcho": 1.07}"#;

pub async fn run(client: &AsyncClient, period: Duration) {
    // First tick one period from now, not immediately.
    let mut ticks = IntervalStream::new(interval_at(Instant::now() + period, period));

    while ticks.next().await.is_some() {
        match client
            .publish(TEST_TOPIC, QoS::AtMostOnce, false, TEST_PAYLOAD)
            .await
        {
            Ok(()) => debug!(topic = TEST_TOPIC, "published test payload"),
            Err(e) => warn!(topic = TEST_TOPIC, "failed to publish test payload: {e}"),
        }
    }
}
