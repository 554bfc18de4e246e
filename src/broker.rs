use std::time::Duration;

use anyhow::{Context as _, Result, anyhow};
use indexmap::IndexSet;
use percent_encoding::percent_decode_str;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, SubscribeFilter};
use url::Url;

pub const DEFAULT_PORT: u16 = 1883;

const KEEP_ALIVE: Duration = Duration::from_secs(30);

const REQUEST_CHANNEL_CAPACITY: usize = 64;

// The URI scheme is ignored; the connection is always plain TCP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerTarget {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl BrokerTarget {
    pub fn parse(uri: &str) -> Result<Self> {
        let url = Url::parse(uri).with_context(|| format!("invalid broker URI: {uri}"))?;

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| anyhow!("broker URI has no host: {uri}"))?
            .to_string();
        let port = url.port().unwrap_or(DEFAULT_PORT);

        let username = match url.username() {
            "" => None,
            u => Some(decode(u)?),
        };
        let password = url.password().map(decode).transpose()?;

        Ok(Self {
            host,
            port,
            username,
            password,
        })
    }

    pub fn options(&self, client_id: &str) -> MqttOptions {
        let mut options = MqttOptions::new(client_id, &self.host, self.port);
        options.set_keep_alive(KEEP_ALIVE);
        options.set_clean_session(true);

        if let Some(username) = &self.username {
            options.set_credentials(username, self.password.as_deref().unwrap_or_default());
        }

        options
    }
}

fn decode(s: &str) -> Result<String> {
    Ok(percent_decode_str(s)
        .decode_utf8()
        .context("broker URI credentials are not valid UTF-8")?
        .into_owned())
}

pub fn topic_filters(prefixes: &str) -> Vec<SubscribeFilter> {
    prefixes
        .split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<IndexSet<_>>()
        .into_iter()
        .map(|p| SubscribeFilter::new(format!("{p}/#"), QoS::AtMostOnce))
        .collect()
}

pub async fn connect(
    target: &BrokerTarget,
    client_id: &str,
    timeout: Duration,
) -> Result<(AsyncClient, EventLoop)> {
    let (client, mut event_loop) =
        AsyncClient::new(target.options(client_id), REQUEST_CHANNEL_CAPACITY);

    tokio::time::timeout(timeout, wait_for_connack(&mut event_loop))
        .await
        .map_err(|_| {
            anyhow!(
                "timed out after {timeout:?} connecting to {}:{}",
                target.host,
                target.port
            )
        })?
        .with_context(|| format!("failed to connect to {}:{}", target.host, target.port))?;

    Ok((client, event_loop))
}

async fn wait_for_connack(event_loop: &mut EventLoop) -> Result<()> {
    loop {
        if let Event::Incoming(Packet::ConnAck(_)) = event_loop.poll().await? {
            return Ok(());
        }
    }
}
