//! Cross-chain packets carried in the data of `Packet` event logs.
//!
//! Two layouts exist on chain:
//! - V1 logs are `abi.encode(uint16 dstChainId, bytes inner)` where `inner`
//!   is `nonce ++ srcAddress ++ dstAddress ++ payload`. The source chain id
//!   is not part of the log and comes from the caller.
//! - V2 packets are `nonce ++ srcChainId ++ srcAddress ++ dstChainId ++
//!   dstAddress ++ payload`, either raw or wrapped as `abi.encode(bytes)`.
//!
//! Address widths are not assumed: non EVM chains use other sizes.

use alloy_primitives::Bytes as AbiBytes;
use alloy_sol_types::{sol_data, SolType};
use bytes::{Buf, Bytes};
use ethereum_types::{Address, H256};

use crate::{error::DecodeError, receipt::LogRlp};

type V1Log = (sol_data::Uint<16>, sol_data::Bytes);
type V2Log = (sol_data::Bytes,);

const NONCE_LEN: usize = 8;
const CHAIN_ID_LEN: usize = 2;

/// A decoded cross-chain packet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Packet {
    /// Per path message nonce.
    pub nonce: u64,
    /// Chain the packet was sent from.
    pub src_chain_id: u16,
    /// Sending application.
    pub src_address: Bytes,
    /// Chain the packet is sent to.
    pub dst_chain_id: u16,
    /// Receiving application.
    pub dst_address: Bytes,
    /// The emitting library, left padded to 32 bytes.
    pub uln_address: H256,
    /// Application payload, empty when there is none.
    pub payload: Bytes,
}

/// Sizes of the source and destination addresses inside a packet.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AddressWidths {
    /// Bytes of the source address.
    pub src: usize,
    /// Bytes of the destination address.
    pub dst: usize,
}

impl AddressWidths {
    /// 20 byte addresses on both ends.
    pub const fn evm() -> Self {
        Self { src: 20, dst: 20 }
    }

    /// Custom widths.
    pub const fn new(src: usize, dst: usize) -> Self {
        Self { src, dst }
    }
}

impl Default for AddressWidths {
    fn default() -> Self {
        Self::evm()
    }
}

/// Which layout a log carries, and what V1 logs leave out.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PacketFormat {
    /// `abi.encode(uint16, bytes)` logs. They do not carry their source
    /// chain id.
    V1 {
        /// Id of the chain the log was emitted on.
        src_chain_id: u16,
    },
    /// Packed packets, raw or ABI wrapped.
    V2,
}

/// The ULN address as it appears in a packet: the emitter left padded to 32
/// bytes.
pub fn uln_address_of(emitter: Address) -> H256 {
    H256::from(emitter)
}

/// Decodes the packet of a `Packet` log emitted by a ULN.
pub fn decode_packet_from_log(
    log: &LogRlp,
    format: PacketFormat,
    widths: AddressWidths,
) -> Result<Packet, DecodeError> {
    let uln = uln_address_of(log.address);

    match format {
        PacketFormat::V1 { src_chain_id } => {
            decode_packet_v1(&log.data, widths, src_chain_id, uln)
        }
        PacketFormat::V2 => decode_packet_v2(&log.data, widths, uln),
    }
}

/// Decodes the data of a V1 `Packet` log.
pub fn decode_packet_v1(
    log_data: &[u8],
    widths: AddressWidths,
    src_chain_id: u16,
    uln_address: H256,
) -> Result<Packet, DecodeError> {
    let (dst_chain_id, inner) = V1Log::abi_decode_params(log_data, true)?;
    let mut buf: &[u8] = &inner;
    expect_len(buf, NONCE_LEN + widths.src + widths.dst)?;

    Ok(Packet {
        nonce: buf.get_u64(),
        src_chain_id,
        src_address: buf.copy_to_bytes(widths.src),
        dst_chain_id,
        dst_address: buf.copy_to_bytes(widths.dst),
        uln_address,
        payload: Bytes::copy_from_slice(buf),
    })
}

/// Decodes a V2 packet given either as log data (`abi.encode(bytes)`) or as
/// the raw packed bytes.
pub fn decode_packet_v2(
    data: &[u8],
    widths: AddressWidths,
    uln_address: H256,
) -> Result<Packet, DecodeError> {
    match wrapped_len(data) {
        Some(declared) => {
            let available = data.len() - 64;
            let fits = usize::try_from(declared)
                .ok()
                .and_then(|len| len.checked_next_multiple_of(32))
                .is_some_and(|padded| padded == available);
            if !fits {
                return Err(DecodeError::WrappedLengthMismatch {
                    declared,
                    available,
                });
            }

            let (packed,) = V2Log::abi_decode_params(data, true)?;
            decode_packed_packet(&packed, widths, uln_address)
        }
        None => decode_packed_packet(data, widths, uln_address),
    }
}

/// Decodes `nonce ++ srcChainId ++ srcAddress ++ dstChainId ++ dstAddress ++
/// payload`.
pub fn decode_packed_packet(
    packed: &[u8],
    widths: AddressWidths,
    uln_address: H256,
) -> Result<Packet, DecodeError> {
    let mut buf = packed;
    expect_len(buf, NONCE_LEN + 2 * CHAIN_ID_LEN + widths.src + widths.dst)?;

    Ok(Packet {
        nonce: buf.get_u64(),
        src_chain_id: buf.get_u16(),
        src_address: buf.copy_to_bytes(widths.src),
        dst_chain_id: buf.get_u16(),
        dst_address: buf.copy_to_bytes(widths.dst),
        uln_address,
        payload: Bytes::copy_from_slice(buf),
    })
}

/// `abi.encode(bytes)` starts with an offset word of `0x20` and a length
/// word. Returns the declared length when `data` starts that way.
fn wrapped_len(data: &[u8]) -> Option<u64> {
    if data.len() < 64 {
        return None;
    }

    let small_word = |word: &[u8]| {
        let mut word = word;
        match word[..24].iter().all(|b| *b == 0) {
            true => {
                word.advance(24);
                Some(word.get_u64())
            }
            false => None,
        }
    };

    match small_word(&data[..32]) {
        Some(32) => small_word(&data[32..64]),
        _ => None,
    }
}

fn expect_len(buf: &[u8], needed: usize) -> Result<(), DecodeError> {
    match buf.len() < needed {
        true => Err(DecodeError::PacketTooShort {
            needed,
            found: buf.len(),
        }),
        false => Ok(()),
    }
}

impl Packet {
    /// The log data a V1 ULN emits for this packet.
    pub fn encode_v1_log(&self) -> Vec<u8> {
        let mut inner = Vec::with_capacity(
            NONCE_LEN + self.src_address.len() + self.dst_address.len() + self.payload.len(),
        );
        inner.extend_from_slice(&self.nonce.to_be_bytes());
        inner.extend_from_slice(&self.src_address);
        inner.extend_from_slice(&self.dst_address);
        inner.extend_from_slice(&self.payload);

        V1Log::abi_encode_params(&(self.dst_chain_id, AbiBytes::from(inner)))
    }

    /// The packed V2 form.
    pub fn encode_packed(&self) -> Vec<u8> {
        let mut packed = Vec::with_capacity(
            NONCE_LEN
                + 2 * CHAIN_ID_LEN
                + self.src_address.len()
                + self.dst_address.len()
                + self.payload.len(),
        );
        packed.extend_from_slice(&self.nonce.to_be_bytes());
        packed.extend_from_slice(&self.src_chain_id.to_be_bytes());
        packed.extend_from_slice(&self.src_address);
        packed.extend_from_slice(&self.dst_chain_id.to_be_bytes());
        packed.extend_from_slice(&self.dst_address);
        packed.extend_from_slice(&self.payload);

        packed
    }

    /// The log data a V2 ULN emits for this packet.
    pub fn encode_v2_log(&self) -> Vec<u8> {
        V2Log::abi_encode_params(&(AbiBytes::from(self.encode_packed()),))
    }
}
