//! ワイヤフォーマットの読み取り
//!
//! 各フィールドは「フィールド番号 + ワイヤタイプ」のキーで始まり、
//! 整数は varint、文字列・バイト列・ネストしたメッセージは長さプレフィックス付きで格納されます。

use crate::{DecodeError, Result};
use tracing::trace;

/// ワイヤタイプ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    /// 可変長整数
    Varint,
    /// 8バイト固定長
    Fixed64,
    /// 長さプレフィックス付き（文字列、バイト列、メッセージ）
    LengthDelimited,
    /// 4バイト固定長
    Fixed32,
}

impl WireType {
    /// キーの下位3ビットからワイヤタイプを得る
    ///
    /// グループ（3, 4）は使われていないスキーマなので不正として扱います。
    fn from_raw(raw: u8, offset: usize) -> Result<Self> {
        match raw {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            _ => Err(DecodeError::InvalidWireType { raw, offset }),
        }
    }
}

/// フィールドの定義（メッセージごとのフィールドテーブルの1行）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub tag: u32,
    pub wire_type: WireType,
}

impl Field {
    pub const fn new(name: &'static str, tag: u32, wire_type: WireType) -> Self {
        Self {
            name,
            tag,
            wire_type,
        }
    }
}

/// メッセージ1つ分のバイト列を前から順に読むリーダー
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// バイト列からリーダーを作成する
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// すべて読み終えたかどうか
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// 現在の読み取り位置
    pub fn position(&self) -> usize {
        self.pos
    }

    /// varint を読み取る
    pub fn read_varint(&mut self) -> Result<u64> {
        let start = self.pos;
        let mut value: u64 = 0;

        for shift in (0..64).step_by(7) {
            let byte = *self.data.get(self.pos).ok_or(DecodeError::Truncated {
                offset: self.pos,
                needed: 1,
            })?;
            self.pos += 1;

            // 10バイト目は最下位ビットしか使えない
            if shift == 63 && byte > 1 {
                return Err(DecodeError::VarintOverflow { offset: start });
            }

            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }

        Err(DecodeError::VarintOverflow { offset: start })
    }

    /// フィールドキーを読み取り、(フィールド番号, ワイヤタイプ) を返す
    pub fn read_key(&mut self) -> Result<(u32, WireType)> {
        let offset = self.pos;
        let key = self.read_varint()?;
        let wire_type = WireType::from_raw((key & 0x7) as u8, offset)?;
        let tag = u32::try_from(key >> 3).map_err(|_| DecodeError::InvalidTag { offset })?;
        if tag == 0 {
            return Err(DecodeError::InvalidTag { offset });
        }
        Ok((tag, wire_type))
    }

    /// 長さプレフィックス付きのバイト列を読み取る
    pub fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| DecodeError::Truncated {
            offset: self.pos,
            needed: usize::MAX,
        })?;
        self.take(len)
    }

    /// uint32 の varint を読み取る
    pub fn read_u32(&mut self, message: &'static str, field: &'static str) -> Result<u32> {
        let value = self.read_varint()?;
        u32::try_from(value).map_err(|_| DecodeError::ValueOutOfRange {
            message,
            field,
            value,
        })
    }

    /// 長さプレフィックス付きの UTF-8 文字列を読み取る
    pub fn read_string(&mut self, message: &'static str, field: &'static str) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8 { message, field })
    }

    /// 固定長のバイト列を切り出す
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let remaining = self.data.len() - self.pos;
        if len > remaining {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed: len - remaining,
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// 値を読み飛ばす
    pub fn skip(&mut self, wire_type: WireType) -> Result<()> {
        match wire_type {
            WireType::Varint => {
                self.read_varint()?;
            }
            WireType::Fixed64 => {
                self.take(8)?;
            }
            WireType::LengthDelimited => {
                self.read_bytes()?;
            }
            WireType::Fixed32 => {
                self.take(4)?;
            }
        }
        Ok(())
    }

    /// フィールドテーブルに載っている次のフィールドまで進む
    ///
    /// 未知のフィールドは読み飛ばします。既知のフィールドのワイヤタイプが
    /// テーブルと一致しない場合はエラーになります。
    /// メッセージの終端に達すると `None` を返します。
    pub fn next_field(
        &mut self,
        message: &'static str,
        fields: &'static [Field],
    ) -> Result<Option<&'static Field>> {
        while !self.is_empty() {
            let (tag, wire_type) = self.read_key()?;

            let Some(field) = fields.iter().find(|f| f.tag == tag) else {
                trace!("skipping unknown field {}.{} ({:?})", message, tag, wire_type);
                self.skip(wire_type)?;
                continue;
            };

            if field.wire_type != wire_type {
                return Err(DecodeError::UnexpectedWireType {
                    message,
                    field: field.name,
                    expected: field.wire_type,
                    found: wire_type,
                });
            }

            return Ok(Some(field));
        }

        Ok(None)
    }
}
