//! NetworkSink - UDP fire-and-forget alerts and notifications

use contracts::{AlertSink, ContractError, Notification, NotificationSink, Severity};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, instrument, warn};

/// Configuration for NetworkSink
#[derive(Debug, Clone)]
pub struct NetworkSinkConfig {
    /// Target address
    pub addr: SocketAddr,
    /// Max datagram size (UDP typically 65507 for IPv4)
    pub max_packet_size: usize,
}

impl NetworkSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let addr_str = params
            .get("addr")
            .ok_or_else(|| "missing 'addr' parameter".to_string())?;

        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|e| format!("invalid address '{}': {}", addr_str, e))?;

        let max_packet_size = params
            .get("max_packet_size")
            .and_then(|s| s.parse().ok())
            .unwrap_or(65000);

        Ok(Self {
            addr,
            max_packet_size,
        })
    }
}

/// Wire payload, one per datagram
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Datagram<'a> {
    Alert {
        message: &'a str,
        severity: Severity,
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<&'a Value>,
    },
    Notification(&'a Notification),
}

/// Sink that sends JSON datagrams over UDP
///
/// Sends use `try_send` and never wait on the socket.
pub struct NetworkSink {
    name: String,
    config: NetworkSinkConfig,
    socket: UdpSocket,
}

impl NetworkSink {
    /// Create a new NetworkSink
    #[instrument(name = "network_sink_new", skip(name, config))]
    pub async fn new(name: impl Into<String>, config: NetworkSinkConfig) -> std::io::Result<Self> {
        let name = name.into();
        // Bind to any available port
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(&config.addr).await?;

        debug!(
            sink = %name,
            target = %config.addr,
            "NetworkSink connected"
        );

        Ok(Self {
            name,
            config,
            socket,
        })
    }

    /// Create from params (for factory)
    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config = NetworkSinkConfig::from_params(params)
            .map_err(|e| ContractError::sink_connection(&name, e))?;

        Self::new(name.clone(), config)
            .await
            .map_err(|e| ContractError::sink_connection(&name, e.to_string()))
    }

    fn transmit(&self, datagram: &Datagram<'_>) -> Result<(), ContractError> {
        let data = serde_json::to_vec(datagram)
            .map_err(|e| ContractError::sink_write(&self.name, format!("json error: {e}")))?;

        if data.len() > self.config.max_packet_size {
            warn!(
                sink = %self.name,
                size = data.len(),
                max = self.config.max_packet_size,
                "Datagram too large, not sent"
            );
            return Err(ContractError::sink_write(
                &self.name,
                format!("datagram of {} bytes exceeds max_packet_size", data.len()),
            ));
        }

        let sent = self
            .socket
            .try_send(&data)
            .map_err(|e| ContractError::sink_write(&self.name, format!("udp send failed: {e}")))?;
        debug!(sink = %self.name, bytes = sent, "Sent");
        Ok(())
    }
}

impl AlertSink for NetworkSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn capture_message(
        &self,
        message: &str,
        severity: Severity,
        context: Option<&Value>,
    ) -> Result<(), ContractError> {
        self.transmit(&Datagram::Alert {
            message,
            severity,
            context,
        })
    }
}

impl NotificationSink for NetworkSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn notify(&self, notification: &Notification) -> Result<(), ContractError> {
        self.transmit(&Datagram::Notification(notification))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::DeliveryChannels;
    use serde_json::json;

    async fn receiver() -> (UdpSocket, HashMap<String, String>) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let params = HashMap::from([("addr".to_string(), addr.to_string())]);
        (socket, params)
    }

    #[test]
    fn test_network_sink_config_parsing() {
        let mut params = HashMap::new();
        params.insert("addr".to_string(), "127.0.0.1:9999".to_string());
        params.insert("max_packet_size".to_string(), "1200".to_string());

        let config = NetworkSinkConfig::from_params(&params).unwrap();
        assert_eq!(config.addr.port(), 9999);
        assert_eq!(config.max_packet_size, 1200);

        assert!(NetworkSinkConfig::from_params(&HashMap::new()).is_err());
    }

    #[tokio::test]
    async fn test_alert_datagram() {
        let (rx, params) = receiver().await;
        let sink = NetworkSink::from_params("tracker", &params).await.unwrap();

        let context = json!({"user": 7});
        sink.capture_message("db down", Severity::Critical, Some(&context))
            .unwrap();

        let mut buf = vec![0u8; 2048];
        let n = rx.recv(&mut buf).await.unwrap();
        let value: Value = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(value["kind"], "alert");
        assert_eq!(value["severity"], "critical");
        assert_eq!(value["context"]["user"], 7);
    }

    #[tokio::test]
    async fn test_notification_datagram() {
        let (rx, params) = receiver().await;
        let sink = NetworkSink::from_params("toast", &params).await.unwrap();

        let notification = Notification {
            severity: Severity::Warning,
            category: "UPLOAD".into(),
            message: "slow".into(),
            channels: DeliveryChannels::default(),
        };
        sink.notify(&notification).unwrap();

        let mut buf = vec![0u8; 2048];
        let n = rx.recv(&mut buf).await.unwrap();
        let value: Value = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(value["kind"], "notification");
        assert_eq!(value["category"], "UPLOAD");
    }

    #[tokio::test]
    async fn test_oversized_datagram_rejected() {
        let (_rx, mut params) = receiver().await;
        params.insert("max_packet_size".to_string(), "16".to_string());
        let sink = NetworkSink::from_params("tiny", &params).await.unwrap();

        let result = sink.capture_message("this will not fit", Severity::Error, None);
        assert!(matches!(result, Err(ContractError::SinkWrite { .. })));
    }
}
