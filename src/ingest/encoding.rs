//! Text decoding for bank exports

use encoding_rs::GBK;
use std::borrow::Cow;

use crate::types::*;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode statement bytes as UTF-8, falling back to GBK.
///
/// GBK covers GB2312 exports. Returns the text and the name of the encoding
/// that succeeded.
pub fn decode_statement(bytes: &[u8]) -> VoucherResult<(Cow<'_, str>, &'static str)> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let utf8_error = match std::str::from_utf8(bytes) {
        Ok(text) => return Ok((Cow::Borrowed(text), "UTF-8")),
        Err(err) => err,
    };

    let (text, had_errors) = GBK.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(VoucherError::Encoding(format!(
            "not valid UTF-8 ({}) and not valid GBK",
            utf8_error
        )));
    }

    tracing::debug!("statement decoded as GBK");
    Ok((text, GBK.name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_with_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("日期,摘要".as_bytes());

        let (text, encoding) = decode_statement(&bytes).unwrap();
        assert_eq!(text, "日期,摘要");
        assert_eq!(encoding, "UTF-8");
    }

    #[test]
    fn test_gbk_fallback() {
        let (bytes, _, _) = GBK.encode("日期,摘要,贷方金额");
        assert!(std::str::from_utf8(&bytes).is_err());

        let (text, encoding) = decode_statement(&bytes).unwrap();
        assert_eq!(text, "日期,摘要,贷方金额");
        assert_eq!(encoding, "GBK");
    }

    #[test]
    fn test_undecodable_bytes() {
        // 0x81 0x20 is an invalid GBK lead/trail pair and invalid UTF-8.
        let bytes = [0x81, 0x20, 0xFF];
        assert!(matches!(
            decode_statement(&bytes),
            Err(VoucherError::Encoding(_))
        ));
    }
}
