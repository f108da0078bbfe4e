//! Recognition of serialized BIP70 `PaymentRequest` messages.
//!
//! The body is walked as protobuf wire format and accepted when every known
//! field carries its declared wire type and `serialized_payment_details` is
//! present. Contents are not interpreted.

use thiserror::Error;

const WIRE_VARINT: u8 = 0;
const WIRE_FIXED64: u8 = 1;
const WIRE_LEN: u8 = 2;
const WIRE_FIXED32: u8 = 5;

/// `serialized_payment_details`, the only required field
const FIELD_DETAILS: u64 = 4;

/// Why a body is not a payment request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentRequestError {
    /// Empty body
    #[error("empty payment request")]
    Empty,

    /// Truncated or overlong field
    #[error("truncated protobuf field at offset {0}")]
    Truncated(usize),

    /// Unsupported wire type (groups or reserved values)
    #[error("unsupported wire type {wire_type} at offset {offset}")]
    WireType {
        /// Wire type found
        wire_type: u8,
        /// Byte offset of the tag
        offset: usize,
    },

    /// Known field encoded with the wrong wire type
    #[error("field {field} has wire type {wire_type}, expected {expected}")]
    FieldType {
        /// Field number
        field: u64,
        /// Wire type found
        wire_type: u8,
        /// Wire type declared by the schema
        expected: u8,
    },

    /// `serialized_payment_details` absent
    #[error("missing serialized payment details")]
    MissingDetails,
}

/// Raw bytes of a recognised payment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequestPayload {
    bytes: Vec<u8>,
}

impl PaymentRequestPayload {
    /// Accept `bytes` if they look like a serialized `PaymentRequest`.
    pub fn recognize(bytes: &[u8]) -> Result<Self, PaymentRequestError> {
        if bytes.is_empty() {
            return Err(PaymentRequestError::Empty);
        }

        let mut pos = 0;
        let mut has_details = false;

        while pos < bytes.len() {
            let tag_offset = pos;
            let tag = read_varint(bytes, &mut pos)?;
            let field = tag >> 3;
            #[allow(clippy::cast_possible_truncation)]
            let wire_type = (tag & 0x7) as u8;

            if field == 0 {
                return Err(PaymentRequestError::Truncated(tag_offset));
            }

            if let Some(expected) = expected_wire_type(field) {
                if expected != wire_type {
                    return Err(PaymentRequestError::FieldType {
                        field,
                        wire_type,
                        expected,
                    });
                }
            }

            match wire_type {
                WIRE_VARINT => {
                    read_varint(bytes, &mut pos)?;
                }
                WIRE_FIXED64 => skip(bytes, &mut pos, 8)?,
                WIRE_LEN => {
                    let len = read_varint(bytes, &mut pos)?;
                    let len = usize::try_from(len)
                        .map_err(|_| PaymentRequestError::Truncated(pos))?;
                    skip(bytes, &mut pos, len)?;
                }
                WIRE_FIXED32 => skip(bytes, &mut pos, 4)?,
                other => {
                    return Err(PaymentRequestError::WireType {
                        wire_type: other,
                        offset: tag_offset,
                    })
                }
            }

            if field == FIELD_DETAILS {
                has_details = true;
            }
        }

        if !has_details {
            return Err(PaymentRequestError::MissingDetails);
        }

        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// The serialized message as received
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume into the serialized message
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Declared wire type of the `PaymentRequest` fields.
const fn expected_wire_type(field: u64) -> Option<u8> {
    match field {
        1 => Some(WIRE_VARINT),
        2..=5 => Some(WIRE_LEN),
        _ => None,
    }
}

fn read_varint(bytes: &[u8], pos: &mut usize) -> Result<u64, PaymentRequestError> {
    let start = *pos;
    let mut value = 0u64;
    for shift in (0..64).step_by(7) {
        let byte = *bytes
            .get(*pos)
            .ok_or(PaymentRequestError::Truncated(start))?;
        *pos += 1;
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(PaymentRequestError::Truncated(start))
}

fn skip(bytes: &[u8], pos: &mut usize, len: usize) -> Result<(), PaymentRequestError> {
    let end = pos
        .checked_add(len)
        .filter(|end| *end <= bytes.len())
        .ok_or(PaymentRequestError::Truncated(*pos))?;
    *pos = end;
    Ok(())
}
