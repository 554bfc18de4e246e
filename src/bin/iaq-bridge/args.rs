use clap::Parser;

#[derive(Debug, Parser)]
pub struct Args {
    /// Directory service and local ingestion endpoint.
    #[arg(long, env = "REST_URI", default_value = "http://localhost:4000")]
    pub rest_uri: String,

    /// Cloud mirror endpoint. Empty disables the mirror.
    #[arg(long, env = "CLOUD_URI", default_value = "")]
    pub cloud_uri: String,

    #[arg(long, env = "MQTT_URI", default_value = "mqtt://localhost:1883")]
    pub mqtt_uri: String,

    /// Topic prefixes separated by `;`. Each is subscribed with a `/#` suffix.
    #[arg(
        long,
        env = "MQTT_TOPICS",
        default_value = "GASDATA;UVSTATUS/CURRENTLIFETIME;UVSTATUS/SENDVALUE"
    )]
    pub mqtt_topics: String,

    #[arg(long, env = "MQTT_CLIENT_ID", default_value = "iaq-bridge")]
    pub mqtt_client_id: String,

    /// Seconds to wait for the broker to accept a connection.
    #[arg(long, env = "MQTT_CONNECT_TIMEOUT", default_value_t = 10)]
    pub mqtt_connect_timeout: u64,

    /// Seconds before an HTTP request is abandoned.
    #[arg(long, env = "HTTP_TIMEOUT", default_value_t = 30)]
    pub http_timeout: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_flags() {
        let args = Args::try_parse_from(["iaq-bridge"]).unwrap();

        assert_eq!(args.cloud_uri, "");
        assert_eq!(args.mqtt_connect_timeout, 10);
        assert_eq!(args.http_timeout, 30);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "iaq-bridge",
            "--cloud-uri",
            "https://iaq.example.com/api",
            "--mqtt-topics",
            "GASDATA;GASDATATEST",
        ])
        .unwrap();

        assert_eq!(args.cloud_uri, "https://iaq.example.com/api");
        assert_eq!(args.mqtt_topics, "GASDATA;GASDATATEST");
    }
}
