/// The +3DOS 128-byte file header: synthesis, detection and stripping.
///
/// See the CP/M `+3DOS` convention used by the ZX Spectrum +3 and compatible
/// Amstrad PCW BASICs: every file on the filesystem layer carries this
/// header immediately before its data, identifying the file's type and the
/// load/line parameters the host BASIC needs.
use serde::Serialize;

/// Size of the +3DOS header in bytes
pub const HEADER_SIZE: usize = 128;

const MAGIC: &[u8; 8] = b"PLUS3DOS";

/// The four file types a +3DOS header can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Tokenised BASIC program
    Program = 0,
    /// Numeric array (BASIC `DIM`)
    NumericArray = 1,
    /// Character array (BASIC `DIM ... $`)
    CharArray = 2,
    /// Machine code, or a SCREEN$ dump
    CodeOrScreen = 3,
}

impl FileType {
    fn from_byte(byte: u8) -> Self {
        match byte {
            0 => FileType::Program,
            1 => FileType::NumericArray,
            2 => FileType::CharArray,
            _ => FileType::CodeOrScreen,
        }
    }

    fn basic_type(&self) -> &'static str {
        match self {
            FileType::Program => "program",
            FileType::NumericArray => "numeric_array",
            FileType::CharArray => "char_array",
            FileType::CodeOrScreen => "code_or_screen",
        }
    }
}

/// The 128-byte +3DOS header record: signature, issue/version, length, type
/// and the two type-specific parameter words. The trailing checksum byte is
/// handled separately since it is derived from the other 127 bytes rather
/// than a field of its own.
struct Plus3DosHeader {
    issue: u8,
    version: u8,
    total_length: u32,
    file_type: FileType,
    data_length: u16,
    param1: u16,
    param2: u16,
}

impl Plus3DosHeader {
    fn new(body_len: usize, file_type: FileType, param1: u16, param2: u16) -> Self {
        Self {
            issue: 1,
            version: 0,
            total_length: (body_len + HEADER_SIZE) as u32,
            file_type,
            data_length: body_len.min(u16::MAX as usize) as u16,
            param1,
            param2,
        }
    }

    /// Serialize to the 128-byte on-disk layout, including the mod-256
    /// checksum over bytes 0..126 stored in byte 127.
    fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut header = [0u8; HEADER_SIZE];
        header[0..8].copy_from_slice(MAGIC);
        header[8] = 0x1A;
        header[9] = self.issue;
        header[10] = self.version;
        header[11..15].copy_from_slice(&self.total_length.to_le_bytes());
        header[15] = self.file_type as u8;
        header[16..18].copy_from_slice(&self.data_length.to_le_bytes());
        header[18..20].copy_from_slice(&self.param1.to_le_bytes());
        header[20..22].copy_from_slice(&self.param2.to_le_bytes());

        let checksum = header[0..127].iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
        header[127] = checksum;
        header
    }

    /// Parse a header from the front of `bytes`, if the magic and 0x1A
    /// separator are present. Does not check the checksum.
    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_SIZE || &bytes[0..8] != MAGIC || bytes[8] != 0x1A {
            return None;
        }
        Some(Self {
            issue: bytes[9],
            version: bytes[10],
            total_length: u32::from_le_bytes([bytes[11], bytes[12], bytes[13], bytes[14]]),
            file_type: FileType::from_byte(bytes[15]),
            data_length: u16::from_le_bytes([bytes[16], bytes[17]]),
            param1: u16::from_le_bytes([bytes[18], bytes[19]]),
            param2: u16::from_le_bytes([bytes[20], bytes[21]]),
        })
    }
}

/// Parsed +3DOS header metadata, as reported by the extractor's `-meta` sidecar
#[derive(Debug, Clone, Serialize)]
pub struct Plus3DosMeta {
    /// Always "PLUS3DOS"
    pub signature: String,
    /// Issue byte, always 1 for headers this toolkit writes
    pub issue: u8,
    /// Version byte, always 0 for headers this toolkit writes
    pub version: u8,
    /// header + body length
    pub total_length: u32,
    /// Raw type byte
    #[serde(rename = "type")]
    pub file_type_byte: u8,
    /// Human-readable type name
    pub basic_type: &'static str,
    /// Body length, clamped to what the container actually holds
    pub data_length: u16,
    /// First type parameter (e.g. BASIC autostart line, or load address for CODE/SCREEN)
    pub param1: u16,
    /// Second type parameter
    pub param2: u16,
    /// Stored checksum byte
    pub checksum: u8,
    /// Whether the stored checksum matches the computed one
    pub checksum_ok: bool,
    /// `param1` re-exposed as a load address, for CODE/SCREEN files only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_address: Option<u16>,
}

/// Build a 128-byte +3DOS header for `body`.
///
/// `total_length` is `body.len() + 128`; the checksum is the mod-256 sum of
/// bytes 0..126.
pub fn synthesize(body: &[u8], file_type: FileType, param1: u16, param2: u16) -> [u8; HEADER_SIZE] {
    Plus3DosHeader::new(body.len(), file_type, param1, param2).to_bytes()
}

/// Detect, validate and strip a +3DOS header from the front of `bytes`.
///
/// Returns `(body, meta, present)`. When no header is present, `body` is
/// `bytes` unchanged and `meta` is `None`. A checksum mismatch does not
/// invalidate the body: `meta.checksum_ok` carries the verdict instead.
pub fn peel(bytes: &[u8]) -> (Vec<u8>, Option<Plus3DosMeta>, bool) {
    let Some(header) = Plus3DosHeader::from_bytes(bytes) else {
        return (bytes.to_vec(), None, false);
    };

    let checksum = bytes[0..127].iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    let stored_checksum = bytes[127];
    let checksum_ok = checksum == stored_checksum;

    let max_body = bytes.len() - HEADER_SIZE;
    let data_length = (header.data_length as usize).min(max_body);
    let body = bytes[HEADER_SIZE..HEADER_SIZE + data_length].to_vec();

    let meta = Plus3DosMeta {
        signature: "PLUS3DOS".to_string(),
        issue: header.issue,
        version: header.version,
        total_length: header.total_length,
        file_type_byte: header.file_type as u8,
        basic_type: header.file_type.basic_type(),
        data_length: data_length as u16,
        param1: header.param1,
        param2: header.param2,
        checksum: stored_checksum,
        checksum_ok,
        load_address: matches!(header.file_type, FileType::CodeOrScreen).then_some(header.param1),
    };

    (body, Some(meta), true)
}

/// Derive the +3DOS type and parameters for a host filename, from its
/// extension and an optional `@N` param1 override in the base name.
pub fn derive_type_params(filename: &str) -> (FileType, u16, u16) {
    let (stem, ext) = split_extension(filename);
    let (file_type, mut param1, param2) = match ext.to_uppercase().as_str() {
        "SCR" => (FileType::CodeOrScreen, 16384u16, 0u16),
        "BAS" => (FileType::Program, 0x8000u16, 0u16),
        _ => (FileType::CodeOrScreen, 32768u16, 0u16),
    };
    if let Some(n) = parse_param1_override(stem) {
        param1 = n;
    }
    (file_type, param1, param2)
}

fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(pos) => (&filename[..pos], &filename[pos + 1..]),
        None => (filename, ""),
    }
}

fn parse_param1_override(stem: &str) -> Option<u16> {
    let at_pos = stem.rfind('@')?;
    let digits = &stem[at_pos + 1..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u64 = digits.parse().ok()?;
    if value > 0 && value < 65536 {
        Some(value as u16)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesize_checksum_invariant() {
        let header = synthesize(b"10 PRINT \"HI\"\n", FileType::Program, 0x8000, 0);
        let sum = header[0..127].iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
        assert_eq!(sum, header[127]);
    }

    #[test]
    fn test_synthesize_total_length() {
        let body = vec![0xAAu8; 1024];
        let header = synthesize(&body, FileType::CodeOrScreen, 49152, 0);
        let total = u32::from_le_bytes([header[11], header[12], header[13], header[14]]);
        assert_eq!(total, 1024 + 128);
    }

    #[test]
    fn test_peel_round_trip() {
        let body = b"10 PRINT \"HI\"\n".to_vec();
        let header = synthesize(&body, FileType::Program, 0x8000, 0);
        let mut full = header.to_vec();
        full.extend_from_slice(&body);

        let (peeled_body, meta, present) = peel(&full);
        assert!(present);
        assert_eq!(peeled_body, body);
        let meta = meta.unwrap();
        assert!(meta.checksum_ok);
        assert_eq!(meta.basic_type, "program");
        assert_eq!(meta.param1, 0x8000);
    }

    #[test]
    fn test_peel_absent_header() {
        let (body, meta, present) = peel(b"no header here");
        assert!(!present);
        assert!(meta.is_none());
        assert_eq!(body, b"no header here");
    }

    #[test]
    fn test_peel_bad_checksum_still_returns_body() {
        let body = vec![1, 2, 3, 4];
        let mut header = synthesize(&body, FileType::Program, 0, 0);
        header[127] ^= 0xFF;
        let mut full = header.to_vec();
        full.extend_from_slice(&body);

        let (peeled_body, meta, present) = peel(&full);
        assert!(present);
        assert_eq!(peeled_body, body);
        assert!(!meta.unwrap().checksum_ok);
    }

    #[test]
    fn test_derive_type_params_scr() {
        let (ft, p1, p2) = derive_type_params("SCREEN.SCR");
        assert_eq!(ft, FileType::CodeOrScreen);
        assert_eq!(p1, 16384);
        assert_eq!(p2, 0);
    }

    #[test]
    fn test_derive_type_params_bas() {
        let (ft, p1, _) = derive_type_params("HELLO.BAS");
        assert_eq!(ft, FileType::Program);
        assert_eq!(p1, 0x8000);
    }

    #[test]
    fn test_derive_type_params_bin_default() {
        let (ft, p1, _) = derive_type_params("game.bin");
        assert_eq!(ft, FileType::CodeOrScreen);
        assert_eq!(p1, 32768);
    }

    #[test]
    fn test_derive_type_params_at_override() {
        let (ft, p1, _) = derive_type_params("game@49152.bin");
        assert_eq!(ft, FileType::CodeOrScreen);
        assert_eq!(p1, 49152);
    }

    #[test]
    fn test_derive_type_params_bas_with_override() {
        let (ft, p1, _) = derive_type_params("LOADER@100.BAS");
        assert_eq!(ft, FileType::Program);
        assert_eq!(p1, 100);
    }
}
