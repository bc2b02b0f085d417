//! Request and response packets exchanged with a coherence controller.
//!
//! A controller sits between three transports:
//! 1. **Processor:** [`CpuRequest`] in, [`CpuResponse`] out.
//! 2. **Memory:** [`MemRequest`] out (one per bus grant), [`MemResponse`] in.
//! 3. **Snoop:** [`SnoopRequest`] in, describing another controller's bus transaction.

use serde::{Deserialize, Serialize};

use super::addr::PhysAddr;
use super::data::AccessType;

/// Index of a coherence controller on the shared bus.
pub type CacheId = usize;

/// Operation carried by a processor request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuOp {
    /// Load the byte at the request address.
    Read,
    /// Store the given byte at the request address.
    Write(u8),
}

/// A load or store issued by the local processor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuRequest {
    /// Caller-chosen identifier echoed in the response.
    pub id: u64,
    /// Target address.
    pub addr: PhysAddr,
    /// Load or store.
    pub op: CpuOp,
}

impl CpuRequest {
    /// Builds a load request.
    pub const fn read(id: u64, addr: PhysAddr) -> Self {
        Self {
            id,
            addr,
            op: CpuOp::Read,
        }
    }

    /// Builds a store request.
    pub const fn write(id: u64, addr: PhysAddr, value: u8) -> Self {
        Self {
            id,
            addr,
            op: CpuOp::Write(value),
        }
    }

    /// Direction of the request.
    pub const fn access_type(&self) -> AccessType {
        match self.op {
            CpuOp::Read => AccessType::Read,
            CpuOp::Write(_) => AccessType::Write,
        }
    }

    /// Value to store, for writes.
    pub const fn write_value(&self) -> Option<u8> {
        match self.op {
            CpuOp::Read => None,
            CpuOp::Write(value) => Some(value),
        }
    }
}

/// Payload of a processor response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuResponseKind {
    /// The value resident in the cache after the load completed.
    ReadData(u8),
    /// The store has been committed to the cache.
    WriteAck,
}

/// Completion of a processor request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuResponse {
    /// Identifier of the request being answered.
    pub id: u64,
    /// Address of the request being answered.
    pub addr: PhysAddr,
    /// Loaded value or store acknowledgement.
    pub kind: CpuResponseKind,
}

impl CpuResponse {
    /// Builds a load response carrying `value`.
    pub const fn read_data(req: &CpuRequest, value: u8) -> Self {
        Self {
            id: req.id,
            addr: req.addr,
            kind: CpuResponseKind::ReadData(value),
        }
    }

    /// Builds a store acknowledgement.
    pub const fn write_ack(req: &CpuRequest) -> Self {
        Self {
            id: req.id,
            addr: req.addr,
            kind: CpuResponseKind::WriteAck,
        }
    }

    /// Loaded value, or `None` for a store acknowledgement.
    pub const fn value(&self) -> Option<u8> {
        match self.kind {
            CpuResponseKind::ReadData(value) => Some(value),
            CpuResponseKind::WriteAck => None,
        }
    }
}

/// Memory transaction issued by a controller while it owns the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemRequest {
    /// Issuing controller.
    pub cache: CacheId,
    /// Target address.
    pub addr: PhysAddr,
    /// Read or write transaction.
    pub access: AccessType,
    /// Store value for write transactions.
    pub value: Option<u8>,
}

impl MemRequest {
    /// Builds the memory transaction that services a pending processor request.
    pub const fn for_request(cache: CacheId, req: &CpuRequest) -> Self {
        Self {
            cache,
            addr: req.addr,
            access: req.access_type(),
            value: req.write_value(),
        }
    }

    /// The snoop other controllers observe for this transaction.
    pub const fn snoop(&self) -> SnoopRequest {
        SnoopRequest {
            origin: self.cache,
            addr: self.addr,
            access: self.access,
        }
    }
}

/// Payload of a memory response.
///
/// Write acknowledgements carry no data; the value committed by a
/// write fill comes from the controller's pending request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemResponseKind {
    /// Value fetched by a read transaction.
    ReadData(u8),
    /// Completion of a write transaction.
    WriteAck,
}

/// Completion of a memory transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemResponse {
    /// Address of the completed transaction.
    pub addr: PhysAddr,
    /// Fetched data or write acknowledgement.
    pub kind: MemResponseKind,
}

impl MemResponse {
    /// Builds a read completion.
    pub const fn read(addr: PhysAddr, value: u8) -> Self {
        Self {
            addr,
            kind: MemResponseKind::ReadData(value),
        }
    }

    /// Builds a write completion.
    pub const fn write_ack(addr: PhysAddr) -> Self {
        Self {
            addr,
            kind: MemResponseKind::WriteAck,
        }
    }

    /// Direction of the completed transaction.
    pub const fn access_type(&self) -> AccessType {
        match self.kind {
            MemResponseKind::ReadData(_) => AccessType::Read,
            MemResponseKind::WriteAck => AccessType::Write,
        }
    }
}

/// Another controller's bus transaction, as observed by a snooper.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnoopRequest {
    /// Controller that issued the transaction.
    pub origin: CacheId,
    /// Target address.
    pub addr: PhysAddr,
    /// Read or write transaction.
    pub access: AccessType,
}
