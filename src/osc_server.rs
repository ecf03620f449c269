//! OSC server for inbound cues
//!
//! Listens on a UDP port (4560 by default), decodes OSC packets and publishes
//! every message they contain to the cue bus.

use crate::cue::{osc_path, Cue, CueBus};
use rosc::{OscMessage, OscPacket};
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, error, info};

/// UDP listener feeding the cue bus
pub struct OscServer {
    socket: UdpSocket,
    bus: CueBus,
}

impl OscServer {
    pub async fn bind(addr: SocketAddr, bus: CueBus) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        info!("🎛️  OSC server listening on {}", socket.local_addr()?);
        Ok(Self { socket, bus })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Receive until the task is dropped
    pub async fn run(self) {
        let mut buf = vec![0u8; 65536]; // Large buffer for long sequences

        loop {
            match self.socket.recv_from(&mut buf).await {
                Ok((size, source)) => {
                    debug!("Received {} bytes from {}", size, source);

                    match rosc::decoder::decode_udp(&buf[..size]) {
                        Ok((_remaining, packet)) => {
                            for msg in flatten_packet(packet) {
                                self.publish(source, msg);
                            }
                        }
                        Err(e) => {
                            error!("Failed to decode OSC packet: {}", e);
                        }
                    }
                }
                Err(e) => {
                    error!("Socket error: {}", e);
                }
            }
        }
    }

    fn publish(&self, source: SocketAddr, msg: OscMessage) {
        let path = osc_path(source, &msg.addr);
        debug!("Cue {} with {} args", path, msg.args.len());
        self.bus.publish(Cue::new(path, msg.args));
    }
}

/// Every message in a packet, bundles expanded depth first
pub fn flatten_packet(packet: OscPacket) -> Vec<OscMessage> {
    match packet {
        OscPacket::Message(msg) => vec![msg],
        OscPacket::Bundle(bundle) => bundle
            .content
            .into_iter()
            .flat_map(flatten_packet)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::AddressPattern;
    use rosc::{OscBundle, OscTime, OscType};

    fn message(addr: &str, value: i32) -> OscPacket {
        OscPacket::Message(OscMessage {
            addr: addr.to_string(),
            args: vec![OscType::Int(value)],
        })
    }

    #[test]
    fn test_flatten_nested_bundle() {
        let inner = OscPacket::Bundle(OscBundle {
            timetag: OscTime::from((0, 1)),
            content: vec![message("/b", 2), message("/c", 3)],
        });
        let outer = OscPacket::Bundle(OscBundle {
            timetag: OscTime::from((0, 1)),
            content: vec![message("/a", 1), inner],
        });

        let addrs: Vec<_> = flatten_packet(outer).into_iter().map(|m| m.addr).collect();
        assert_eq!(addrs, vec!["/a", "/b", "/c"]);
    }

    #[tokio::test]
    async fn test_udp_message_becomes_prefixed_cue() {
        let bus = CueBus::default();
        let mut rx = bus.subscribe();
        let server = OscServer::bind("127.0.0.1:0".parse().unwrap(), bus.clone())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let handle = tokio::spawn(server.run());

        let sender = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let buf = rosc::encoder::encode(&message("/synth", 7)).unwrap();
        sender.send_to(&buf, addr).unwrap();

        let pattern = AddressPattern::new("/osc*/synth").unwrap();
        let cue = rx.sync(&pattern).await.unwrap();
        assert_eq!(
            cue.path,
            format!("/osc:127.0.0.1:{}/synth", sender.local_addr().unwrap().port())
        );
        assert_eq!(cue.args, vec![OscType::Int(7)]);

        handle.abort();
    }
}
