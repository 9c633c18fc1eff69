//! crashsym クラッシュレポートのデコード
//!
//! このクレートは、PLCrashReporter 形式のバイナリクラッシュレポートを読み込み、
//! 構造化されたメモリ上のレポートに変換します。
//! 固定長ヘッダの読み飛ばし、ワイヤフォーマットの読み取り、スキーマに沿った
//! メッセージ単位のデコードを行います。

pub mod decode;
pub mod error;
pub mod model;
pub mod wire;

pub use decode::{decode_report, decode_report_body, parse_header, ReportHeader, HEADER_LEN};
pub use error::DecodeError;
pub use model::{
    ApplicationInfo, Architecture, BinaryImage, CrashReport, Exception, OperatingSystem,
    RegisterValue, Signal, StackFrame, SystemInfo, Thread,
};
pub use wire::{WireReader, WireType};

/// デコード処理の結果型
pub type Result<T> = std::result::Result<T, DecodeError>;
