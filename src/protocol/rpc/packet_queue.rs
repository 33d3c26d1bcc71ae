//! FIFO of received datagrams waiting to be matched against the outstanding call.
//!
//! The transport appends to the queue while polling, and the RPC engine drains
//! it from the front. Both only ever see the queue through a `&mut` borrow of
//! the owning [`RpcClient`](super::RpcClient), so the queue is never shared.

use std::collections::VecDeque;

/// One received datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Source port the datagram came from.
    pub port: u16,
    /// The UDP payload.
    pub data: Vec<u8>,
}

impl Packet {
    pub fn new(port: u16, data: Vec<u8>) -> Self {
        Self { port, data }
    }
}

#[derive(Debug, Default)]
pub struct PacketQueue {
    packets: VecDeque<Packet>,
}

impl PacketQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, packet: Packet) {
        self.packets.push_back(packet);
    }

    pub fn pop(&mut self) -> Option<Packet> {
        self.packets.pop_front()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn clear(&mut self) {
        self.packets.clear();
    }
}
