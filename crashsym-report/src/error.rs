//! デコードエラー

use crate::wire::WireType;
use thiserror::Error;

/// レポートが壊れている場合のエラー
///
/// どのエラーもデコード全体を中断します。部分的なレポートは生成されません。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// バッファが途中で終わっている
    #[error("report is truncated: needed {needed} more bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    /// varint が64ビットに収まらない
    #[error("varint at offset {offset} does not fit in 64 bits")]
    VarintOverflow { offset: usize },

    /// 未定義のワイヤタイプ、またはサポートしていないグループ
    #[error("unsupported wire type {raw} at offset {offset}")]
    InvalidWireType { raw: u8, offset: usize },

    /// フィールド番号0は不正
    #[error("invalid field tag 0 at offset {offset}")]
    InvalidTag { offset: usize },

    /// 既知のフィールドが期待と異なるワイヤタイプで現れた
    #[error("{message}.{field} expects {expected:?} encoding, found {found:?}")]
    UnexpectedWireType {
        message: &'static str,
        field: &'static str,
        expected: WireType,
        found: WireType,
    },

    /// 必須フィールドが存在しない
    #[error("required field {message}.{field} is missing")]
    MissingField {
        message: &'static str,
        field: &'static str,
    },

    /// 文字列フィールドが UTF-8 ではない
    #[error("{message}.{field} is not valid UTF-8")]
    InvalidUtf8 {
        message: &'static str,
        field: &'static str,
    },

    /// uint32 フィールドの値が32ビットに収まらない
    #[error("{message}.{field} value {value} does not fit in 32 bits")]
    ValueOutOfRange {
        message: &'static str,
        field: &'static str,
        value: u64,
    },
}
