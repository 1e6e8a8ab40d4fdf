//! Manifest SBOR encoding.
//!
//! Transaction payloads are a single `0x4d` prefix byte followed by one
//! value. Every value starts with its value-kind byte; sizes are LEB128.
//! Only the kinds a transfer, mint or burn manifest needs are covered.

/// Payload prefix of manifest SBOR.
pub const MANIFEST_PREFIX: u8 = 0x4d;

pub const KIND_BOOL: u8 = 0x01;
pub const KIND_U8: u8 = 0x07;
pub const KIND_U16: u8 = 0x08;
pub const KIND_U32: u8 = 0x09;
pub const KIND_U64: u8 = 0x0a;
pub const KIND_STRING: u8 = 0x0c;
pub const KIND_ARRAY: u8 = 0x20;
pub const KIND_TUPLE: u8 = 0x21;
pub const KIND_ENUM: u8 = 0x22;

pub const KIND_ADDRESS: u8 = 0x80;
pub const KIND_BUCKET: u8 = 0x81;
pub const KIND_EXPRESSION: u8 = 0x83;
pub const KIND_DECIMAL: u8 = 0x85;
pub const KIND_NON_FUNGIBLE_LOCAL_ID: u8 = 0x87;

/// `ManifestAddress::Static`.
const ADDRESS_STATIC: u8 = 0x00;
/// `ManifestExpression::EntireWorktop`.
const EXPRESSION_ENTIRE_WORKTOP: u8 = 0x00;

#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// An encoder for a full payload, starting with [`MANIFEST_PREFIX`].
    pub fn payload() -> Self {
        Self {
            buf: vec![MANIFEST_PREFIX],
        }
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn size(&mut self, mut n: usize) -> &mut Self {
        loop {
            let byte = (n & 0x7f) as u8;
            n >>= 7;
            if n == 0 {
                self.buf.push(byte);
                return self;
            }
            self.buf.push(byte | 0x80);
        }
    }

    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.buf.extend_from_slice(&[KIND_BOOL, value as u8]);
        self
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.extend_from_slice(&[KIND_U8, value]);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.buf.push(KIND_U16);
        self.raw(&value.to_le_bytes())
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.buf.push(KIND_U32);
        self.raw(&value.to_le_bytes())
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.buf.push(KIND_U64);
        self.raw(&value.to_le_bytes())
    }

    pub fn string(&mut self, value: &str) -> &mut Self {
        self.buf.push(KIND_STRING);
        self.size(value.len()).raw(value.as_bytes())
    }

    /// `[u8; N]` / `Vec<u8>`.
    pub fn bytes(&mut self, value: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(&[KIND_ARRAY, KIND_U8]);
        self.size(value.len()).raw(value)
    }

    /// Array header; the caller writes `len` element bodies.
    pub fn array(&mut self, element_kind: u8, len: usize) -> &mut Self {
        self.buf.extend_from_slice(&[KIND_ARRAY, element_kind]);
        self.size(len)
    }

    pub fn tuple(&mut self, fields: usize) -> &mut Self {
        self.buf.push(KIND_TUPLE);
        self.size(fields)
    }

    pub fn enum_variant(&mut self, discriminator: u8, fields: usize) -> &mut Self {
        self.buf.push(KIND_ENUM);
        self.enum_body(discriminator, fields)
    }

    /// Enum body without its kind byte, for array elements.
    pub fn enum_body(&mut self, discriminator: u8, fields: usize) -> &mut Self {
        self.buf.push(discriminator);
        self.size(fields)
    }

    pub fn address(&mut self, node_id: &[u8; 30]) -> &mut Self {
        self.buf.extend_from_slice(&[KIND_ADDRESS, ADDRESS_STATIC]);
        self.raw(node_id)
    }

    pub fn bucket(&mut self, id: u32) -> &mut Self {
        self.buf.push(KIND_BUCKET);
        self.raw(&id.to_le_bytes())
    }

    pub fn entire_worktop(&mut self) -> &mut Self {
        self.buf
            .extend_from_slice(&[KIND_EXPRESSION, EXPRESSION_ENTIRE_WORKTOP]);
        self
    }

    /// `Decimal` as its 192-bit two's-complement attos.
    pub fn decimal(&mut self, attos: &[u8; 24]) -> &mut Self {
        self.buf.push(KIND_DECIMAL);
        self.raw(attos)
    }
}
