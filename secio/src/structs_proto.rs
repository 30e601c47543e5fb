//! Wire encoding for the `Propose` and `Exchange` handshake records (spec §6, "Propose and
//! Exchange records ... serialized as tagged records with field numbers").
//!
//! The teacher depends on `protobuf = "2.0.2"` with generated bindings for these same two
//! messages, but no `.proto` file or codegen output was available to regenerate from. Spec §6
//! only requires round-tripping tagged fields, not protobuf interop with an external peer, so
//! this hand-rolls the protobuf wire format (varint tag + length-delimited bytes, field numbers
//! matching the reference's `propose.proto`/`exchange.proto` layout) directly on top of
//! `unsigned-varint`, which `multistream-select` already depends on.

use unsigned_varint::{decode, encode};

use crate::error::SecioError;

const WIRE_TYPE_LEN: u64 = 2;

fn write_tag(out: &mut Vec<u8>, field_number: u64, wire_type: u64) {
    let mut buf = encode::u64_buffer();
    let tag = encode::u64((field_number << 3) | wire_type, &mut buf);
    out.extend_from_slice(tag);
}

fn write_bytes_field(out: &mut Vec<u8>, field_number: u64, value: &[u8]) {
    if value.is_empty() {
        return;
    }
    write_tag(out, field_number, WIRE_TYPE_LEN);
    let mut buf = encode::u64_buffer();
    let len = encode::u64(value.len() as u64, &mut buf);
    out.extend_from_slice(len);
    out.extend_from_slice(value);
}

struct RawField<'a> {
    field_number: u64,
    bytes: &'a [u8],
}

fn parse_fields(mut input: &[u8]) -> Result<Vec<RawField<'_>>, SecioError> {
    let mut fields = Vec::new();
    while !input.is_empty() {
        let (tag, rest) =
            decode::u64(input).map_err(|_| SecioError::Decode("malformed field tag".into()))?;
        let wire_type = tag & 0x7;
        let field_number = tag >> 3;
        if wire_type != WIRE_TYPE_LEN {
            return Err(SecioError::Decode(format!(
                "unsupported wire type {} on field {}",
                wire_type, field_number
            )));
        }
        let (len, rest) =
            decode::u64(rest).map_err(|_| SecioError::Decode("malformed field length".into()))?;
        let len = len as usize;
        if rest.len() < len {
            return Err(SecioError::Decode("field length exceeds remaining input".into()));
        }
        let (bytes, rest) = rest.split_at(len);
        fields.push(RawField { field_number, bytes });
        input = rest;
    }
    Ok(fields)
}

/// The first handshake payload (spec §3, "Propose message").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Propose {
    pub rand: Vec<u8>,
    pub public_key: Vec<u8>,
    pub exchanges: String,
    pub ciphers: String,
    pub hashes: String,
}

impl Propose {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_bytes_field(&mut out, 1, &self.rand);
        write_bytes_field(&mut out, 2, &self.public_key);
        write_bytes_field(&mut out, 3, self.exchanges.as_bytes());
        write_bytes_field(&mut out, 4, self.ciphers.as_bytes());
        write_bytes_field(&mut out, 5, self.hashes.as_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Propose, SecioError> {
        let mut rand = Vec::new();
        let mut public_key = Vec::new();
        let mut exchanges = String::new();
        let mut ciphers = String::new();
        let mut hashes = String::new();
        for field in parse_fields(bytes)? {
            match field.field_number {
                1 => rand = field.bytes.to_vec(),
                2 => public_key = field.bytes.to_vec(),
                3 => exchanges = decode_utf8(field.bytes)?,
                4 => ciphers = decode_utf8(field.bytes)?,
                5 => hashes = decode_utf8(field.bytes)?,
                _ => {}
            }
        }
        Ok(Propose {
            rand,
            public_key,
            exchanges,
            ciphers,
            hashes,
        })
    }
}

/// The second handshake payload (spec §3, "Exchange message").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exchange {
    pub epubkey: Vec<u8>,
    pub signature: Vec<u8>,
}

impl Exchange {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_bytes_field(&mut out, 1, &self.epubkey);
        write_bytes_field(&mut out, 2, &self.signature);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Exchange, SecioError> {
        let mut epubkey = Vec::new();
        let mut signature = Vec::new();
        for field in parse_fields(bytes)? {
            match field.field_number {
                1 => epubkey = field.bytes.to_vec(),
                2 => signature = field.bytes.to_vec(),
                _ => {}
            }
        }
        Ok(Exchange { epubkey, signature })
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String, SecioError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| SecioError::Decode("field was not valid utf-8".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn propose_round_trips() {
        let propose = Propose {
            rand: vec![1; 16],
            public_key: vec![0, 0, 0, 0, 9, 9, 9],
            exchanges: "P-256,P-384".into(),
            ciphers: "AES-256,AES-128".into(),
            hashes: "SHA256,SHA512".into(),
        };
        let encoded = propose.encode();
        let decoded = Propose::decode(&encoded).unwrap();
        assert_eq!(propose, decoded);
    }

    #[test]
    fn exchange_round_trips() {
        let exchange = Exchange {
            epubkey: vec![4; 64],
            signature: vec![7; 256],
        };
        let encoded = exchange.encode();
        let decoded = Exchange::decode(&encoded).unwrap();
        assert_eq!(exchange, decoded);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let mut bytes = Vec::new();
        write_bytes_field(&mut bytes, 99, b"unexpected-future-field");
        write_bytes_field(&mut bytes, 1, &[9, 9]);
        let decoded = Exchange::decode(&bytes).unwrap();
        assert_eq!(decoded.epubkey, vec![9, 9]);
    }

    #[test]
    fn truncated_length_is_rejected() {
        let mut bytes = Vec::new();
        write_tag(&mut bytes, 1, WIRE_TYPE_LEN);
        let mut buf = encode::u64_buffer();
        let len = encode::u64(50, &mut buf);
        bytes.extend_from_slice(len);
        bytes.extend_from_slice(b"short");
        match Propose::decode(&bytes) {
            Err(SecioError::Decode(_)) => {}
            other => panic!("expected Decode error, got {:?}", other),
        }
    }
}
