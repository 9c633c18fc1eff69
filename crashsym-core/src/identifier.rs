//! イメージ UUID の正規化

use std::fmt::Write as _;
use thiserror::Error;

/// UUID のバイト数
pub const UUID_LEN: usize = 16;

/// UUID の正規化エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("image identifier must be 16 bytes, got {0}")]
    InvalidLength(usize),
}

/// 16バイトの UUID を `XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX` 形式（大文字）にする
///
/// 表示と dSYM の検索キーの両方に使います。
///
/// # Examples
/// ```
/// use crashsym_core::canonicalize;
///
/// let raw = [0xde, 0xad, 0xbe, 0xef, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];
/// assert_eq!(canonicalize(&raw).unwrap(), "DEADBEEF-0001-0203-0405-060708090A0B");
/// ```
pub fn canonicalize(raw: &[u8]) -> Result<String, IdentifierError> {
    if raw.len() != UUID_LEN {
        return Err(IdentifierError::InvalidLength(raw.len()));
    }

    let mut out = String::with_capacity(36);
    for (i, byte) in raw.iter().enumerate() {
        if matches!(i, 4 | 6 | 8 | 10) {
            out.push('-');
        }
        // Stringへの書き込みは失敗しない
        let _ = write!(out, "{:02X}", byte);
    }
    Ok(out)
}
