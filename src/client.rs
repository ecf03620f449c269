//! OSC client for sending sequences
//!
//! The sending side of the protocol: descriptors are flattened with the
//! group sentinel and sent to `/synth`; a note for the drone goes to
//! `/ambient`.

use crate::descriptor::Descriptor;
use crate::reconstruct::flatten;
use rosc::{OscMessage, OscPacket, OscType};
use std::net::{SocketAddr, UdpSocket};
use tracing::debug;

/// Address for sequence messages
pub const SEQUENCE_ADDR: &str = "/synth";

/// Address for drone notes
pub const AMBIENT_ADDR: &str = "/ambient";

/// OSC client for sending messages
pub struct OscClient {
    socket: UdpSocket,
    target: SocketAddr,
}

impl OscClient {
    pub fn new(target: SocketAddr) -> Result<Self, Box<dyn std::error::Error>> {
        let bind = if target.is_ipv6() { "[::]:0" } else { "0.0.0.0:0" };
        let socket = UdpSocket::bind(bind)?;
        Ok(Self { socket, target })
    }

    /// Send an OSC message
    pub fn send(
        &self,
        address: &str,
        args: Vec<OscType>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let msg = OscMessage {
            addr: address.to_string(),
            args,
        };

        let buf = rosc::encoder::encode(&OscPacket::Message(msg))?;
        self.socket.send_to(&buf, self.target)?;
        debug!("Sent {} ({} bytes) to {}", address, buf.len(), self.target);
        Ok(())
    }

    /// Send a whole sequence as one flattened message
    pub fn send_sequence(&self, events: &[Descriptor]) -> Result<(), Box<dyn std::error::Error>> {
        self.send(SEQUENCE_ADDR, sequence_args(events))
    }

    /// Send a note to the ambient drone
    pub fn send_ambient(&self, note: &str) -> Result<(), Box<dyn std::error::Error>> {
        self.send(AMBIENT_ADDR, vec![OscType::String(note.to_string())])
    }
}

/// Flattened OSC arguments for a sequence
pub fn sequence_args(events: &[Descriptor]) -> Vec<OscType> {
    let groups: Vec<_> = events.iter().map(Descriptor::to_tokens).collect();
    flatten(&groups).iter().map(|t| t.to_osc()).collect()
}

/// Note the drone should follow: the first event's note, if it has one
pub fn ambient_note(events: &[Descriptor]) -> Option<&str> {
    match events.first()? {
        Descriptor::Synth { note, .. } => Some(note),
        Descriptor::Sleep { .. } => None,
    }
}
