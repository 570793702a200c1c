//! File system utility helpers (BOM-aware, encoding-aware readers)
use encoding_rs::{Encoding, UTF_16LE, UTF_8, WINDOWS_1251};
use std::fs;
use std::path::Path;

use super::errors::{ContractError, ContractResult};

/// Текст файла вместе с именем использованной кодировки
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static str,
}

/// Декодирует байты отчета: BOM -> UTF-16LE без BOM -> UTF-8 -> Windows-1251
pub fn decode_text(bytes: &[u8]) -> DecodedText {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (decoded, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return DecodedText {
            text: decoded.into_owned(),
            encoding: encoding.name(),
        };
    }

    if looks_like_utf16le(bytes) {
        let (decoded, had_errors) = UTF_16LE.decode_without_bom_handling(bytes);
        if !had_errors {
            return DecodedText {
                text: decoded.into_owned(),
                encoding: UTF_16LE.name(),
            };
        }
    }

    if let Some(decoded) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        return DecodedText {
            text: decoded.into_owned(),
            encoding: UTF_8.name(),
        };
    }

    tracing::debug!("Input is not valid UTF-8, falling back to Windows-1251");
    let (decoded, _) = WINDOWS_1251.decode_without_bom_handling(bytes);
    DecodedText {
        text: decoded.into_owned(),
        encoding: WINDOWS_1251.name(),
    }
}

/// Read a text file (report or XML), detecting its encoding.
pub fn read_text_file(path: &Path) -> ContractResult<DecodedText> {
    let bytes = fs::read(path).map_err(|e| ContractError::io(path, e))?;
    let decoded = decode_text(&bytes);
    tracing::debug!("Read {} as {}", path.display(), decoded.encoding);
    Ok(decoded)
}

// Выгрузки конфигуратора без BOM: каждый второй байт кириллицы/ASCII в UTF-16LE нулевой
// или 0x04.
fn looks_like_utf16le(bytes: &[u8]) -> bool {
    if bytes.len() < 4 || bytes.len() % 2 != 0 {
        return false;
    }
    let sample = &bytes[..bytes.len().min(512)];
    let high_bytes = sample.iter().skip(1).step_by(2);
    let plausible = high_bytes.filter(|b| **b == 0x00 || **b == 0x04).count();
    plausible * 10 >= (sample.len() / 2) * 9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("Справочники.Банки".as_bytes());
        let decoded = decode_text(&bytes);
        assert_eq!(decoded.text, "Справочники.Банки");
        assert_eq!(decoded.encoding, "UTF-8");
    }

    #[test]
    fn test_utf16le_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "Тип: Строка".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let decoded = decode_text(&bytes);
        assert_eq!(decoded.text, "Тип: Строка");
        assert_eq!(decoded.encoding, "UTF-16LE");
    }

    #[test]
    fn test_utf16le_without_bom() {
        let mut bytes = Vec::new();
        for unit in "- Документы.Заказ".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let decoded = decode_text(&bytes);
        assert_eq!(decoded.text, "- Документы.Заказ");
    }

    #[test]
    fn test_windows1251_fallback() {
        let (encoded, _, _) = WINDOWS_1251.encode("Контрагенты");
        let decoded = decode_text(&encoded);
        assert_eq!(decoded.text, "Контрагенты");
        assert_eq!(decoded.encoding, "windows-1251");
    }
}
