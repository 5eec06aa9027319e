use crate::models::HexMetadata;
use hex::FromHexError;

const DATA_RECORD: u8 = 0x00;
const EOF_RECORD: u8 = 0x01;

/// Normalized data payload of one Intel HEX file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HexParse {
    /// Lowercase hex digits of every data record, in file order.
    pub payload: String,
    pub meta: HexMetadata,
}

struct Record {
    record_type: u8,
    data: Vec<u8>,
}

/// Parse Intel HEX text (`:LLAAAATT[DD..]CC` records).
///
/// Malformed records are reported in `meta.format_errors` as `line N: ...`
/// and skipped. Addresses are ignored, so the payload is the concatenation
/// of all data bytes.
pub fn parse_intel_hex(content: &str) -> HexParse {
    let mut parsed = HexParse::default();

    for (index, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_record(line) {
            Ok(record) => match record.record_type {
                DATA_RECORD => {
                    parsed.payload.push_str(&hex::encode(&record.data));
                    parsed.meta.data_records += 1;
                }
                EOF_RECORD => parsed.meta.has_eof = true,
                _ => {}
            },
            Err(message) => parsed
                .meta
                .format_errors
                .push(format!("line {}: {}", index + 1, message)),
        }
    }

    parsed
}

fn parse_record(line: &str) -> Result<Record, String> {
    let digits = line
        .strip_prefix(':')
        .ok_or_else(|| "missing ':' start code".to_string())?;

    let bytes = hex::decode(digits).map_err(describe_hex_error)?;
    if bytes.len() < 5 {
        return Err(format!("record too short ({} bytes)", bytes.len()));
    }

    let declared = bytes[0] as usize;
    if bytes.len() != declared + 5 {
        return Err(format!(
            "byte count mismatch: declared {}, found {}",
            declared,
            bytes.len() - 5
        ));
    }

    let sum = bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != 0 {
        return Err("checksum mismatch".to_string());
    }

    Ok(Record {
        record_type: bytes[3],
        data: bytes[4..4 + declared].to_vec(),
    })
}

fn describe_hex_error(error: FromHexError) -> String {
    match error {
        FromHexError::OddLength => "odd number of hex digits".to_string(),
        FromHexError::InvalidHexCharacter { c, index } => {
            format!("invalid hex digit {:?} at offset {}", c, index + 1)
        }
        other => other.to_string(),
    }
}
