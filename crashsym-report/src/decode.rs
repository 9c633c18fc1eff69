//! クラッシュレポートのデコード
//!
//! メッセージ型ごとにフィールドテーブルとデコード関数を1つずつ持ち、
//! ネストしたメッセージは再帰的にデコードします。

use crate::model::{
    ApplicationInfo, Architecture, BinaryImage, CrashReport, Exception, OperatingSystem,
    RegisterValue, Signal, StackFrame, SystemInfo, Thread,
};
use crate::wire::WireType::{LengthDelimited as Len, Varint};
use crate::wire::{Field, WireReader};
use crate::{DecodeError, Result};
use tracing::{debug, warn};

/// 固定長ヘッダのバイト数
pub const HEADER_LEN: usize = 8;

/// ヘッダ先頭のマジック
const MAGIC: &[u8; 7] = b"plcrash";

static CRASH_REPORT_FIELDS: [Field; 6] = [
    Field::new("system_info", 1, Len),
    Field::new("application_info", 2, Len),
    Field::new("threads", 3, Len),
    Field::new("binary_images", 4, Len),
    Field::new("exception", 5, Len),
    Field::new("signal", 6, Len),
];

static SYSTEM_INFO_FIELDS: [Field; 4] = [
    Field::new("operating_system", 1, Varint),
    Field::new("os_version", 2, Len),
    Field::new("architecture", 3, Varint),
    Field::new("timestamp", 4, Varint),
];

static APPLICATION_INFO_FIELDS: [Field; 2] = [
    Field::new("identifier", 1, Len),
    Field::new("version", 2, Len),
];

static THREAD_FIELDS: [Field; 4] = [
    Field::new("thread_number", 1, Varint),
    Field::new("frames", 2, Len),
    Field::new("crashed", 3, Varint),
    Field::new("registers", 4, Len),
];

static STACK_FRAME_FIELDS: [Field; 1] = [Field::new("pc", 3, Varint)];

static REGISTER_VALUE_FIELDS: [Field; 2] = [
    Field::new("name", 1, Len),
    Field::new("value", 2, Varint),
];

static BINARY_IMAGE_FIELDS: [Field; 4] = [
    Field::new("base_address", 1, Varint),
    Field::new("size", 2, Varint),
    Field::new("name", 3, Len),
    Field::new("uuid", 4, Len),
];

static EXCEPTION_FIELDS: [Field; 2] = [
    Field::new("name", 1, Len),
    Field::new("reason", 2, Len),
];

static SIGNAL_FIELDS: [Field; 3] = [
    Field::new("name", 1, Len),
    Field::new("code", 2, Len),
    Field::new("address", 3, Varint),
];

/// ファイル先頭の固定長ヘッダ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportHeader {
    /// マジックが `plcrash` と一致したか
    pub magic_ok: bool,
    /// フォーマットバージョン
    pub version: u8,
}

/// ヘッダを読み取り、残りの本体を返す
pub fn parse_header(file: &[u8]) -> Result<(ReportHeader, &[u8])> {
    if file.len() < HEADER_LEN {
        return Err(DecodeError::Truncated {
            offset: file.len(),
            needed: HEADER_LEN - file.len(),
        });
    }

    let (header, body) = file.split_at(HEADER_LEN);
    let header = ReportHeader {
        magic_ok: &header[..MAGIC.len()] == MAGIC,
        version: header[MAGIC.len()],
    };
    Ok((header, body))
}

/// ファイル全体をデコードする
///
/// 先頭8バイトのヘッダを読み飛ばし、残りを1つの CrashReport メッセージとして扱います。
/// ヘッダのマジックが一致しない場合は警告のみで、デコードは続行します。
pub fn decode_report(file: &[u8]) -> Result<CrashReport> {
    let (header, body) = parse_header(file)?;
    if !header.magic_ok {
        warn!("report header does not start with 'plcrash', decoding anyway");
    }
    debug!("report format version {}, body {} bytes", header.version, body.len());
    decode_report_body(body)
}

/// ヘッダを除いた本体をデコードする
pub fn decode_report_body(body: &[u8]) -> Result<CrashReport> {
    const MSG: &str = "CrashReport";
    let mut reader = WireReader::new(body);

    let mut system_info = None;
    let mut application_info = None;
    let mut threads = Vec::new();
    let mut binary_images = Vec::new();
    let mut exception = None;
    let mut signal = None;

    while let Some(field) = reader.next_field(MSG, &CRASH_REPORT_FIELDS)? {
        let bytes = reader.read_bytes()?;
        match field.tag {
            1 => system_info = Some(decode_system_info(bytes)?),
            2 => application_info = Some(decode_application_info(bytes)?),
            3 => threads.push(decode_thread(bytes)?),
            4 => binary_images.push(decode_binary_image(bytes)?),
            5 => exception = Some(decode_exception(bytes)?),
            _ => signal = Some(decode_signal(bytes)?),
        }
    }

    Ok(CrashReport {
        system_info: required(system_info, MSG, "system_info")?,
        application_info: required(application_info, MSG, "application_info")?,
        threads,
        binary_images,
        exception,
        signal: required(signal, MSG, "signal")?,
    })
}

fn decode_system_info(bytes: &[u8]) -> Result<SystemInfo> {
    const MSG: &str = "SystemInfo";
    let mut reader = WireReader::new(bytes);

    let mut operating_system = None;
    let mut os_version = None;
    let mut architecture = None;
    let mut timestamp = None;

    while let Some(field) = reader.next_field(MSG, &SYSTEM_INFO_FIELDS)? {
        match field.tag {
            1 => operating_system = Some(OperatingSystem::from(reader.read_varint()?)),
            2 => os_version = Some(reader.read_string(MSG, field.name)?),
            3 => architecture = Some(Architecture::from(reader.read_varint()?)),
            _ => timestamp = Some(reader.read_u32(MSG, field.name)?),
        }
    }

    Ok(SystemInfo {
        operating_system: required(operating_system, MSG, "operating_system")?,
        os_version: required(os_version, MSG, "os_version")?,
        architecture: required(architecture, MSG, "architecture")?,
        timestamp: required(timestamp, MSG, "timestamp")?,
    })
}

fn decode_application_info(bytes: &[u8]) -> Result<ApplicationInfo> {
    const MSG: &str = "ApplicationInfo";
    let mut reader = WireReader::new(bytes);

    let mut identifier = None;
    let mut version = None;

    while let Some(field) = reader.next_field(MSG, &APPLICATION_INFO_FIELDS)? {
        let value = reader.read_string(MSG, field.name)?;
        match field.tag {
            1 => identifier = Some(value),
            _ => version = Some(value),
        }
    }

    Ok(ApplicationInfo {
        identifier: required(identifier, MSG, "identifier")?,
        version: required(version, MSG, "version")?,
    })
}

fn decode_thread(bytes: &[u8]) -> Result<Thread> {
    const MSG: &str = "Thread";
    let mut reader = WireReader::new(bytes);

    let mut thread_number = None;
    let mut frames = Vec::new();
    let mut crashed = None;
    let mut registers = Vec::new();

    while let Some(field) = reader.next_field(MSG, &THREAD_FIELDS)? {
        match field.tag {
            1 => thread_number = Some(reader.read_u32(MSG, field.name)?),
            2 => frames.push(decode_stack_frame(reader.read_bytes()?)?),
            3 => crashed = Some(reader.read_varint()? != 0),
            _ => registers.push(decode_register_value(reader.read_bytes()?)?),
        }
    }

    Ok(Thread {
        thread_number: required(thread_number, MSG, "thread_number")?,
        frames,
        crashed: required(crashed, MSG, "crashed")?,
        registers,
    })
}

fn decode_stack_frame(bytes: &[u8]) -> Result<StackFrame> {
    const MSG: &str = "StackFrame";
    let mut reader = WireReader::new(bytes);

    let mut pc = None;
    while reader.next_field(MSG, &STACK_FRAME_FIELDS)?.is_some() {
        pc = Some(reader.read_varint()?);
    }

    Ok(StackFrame {
        pc: required(pc, MSG, "pc")?,
    })
}

fn decode_register_value(bytes: &[u8]) -> Result<RegisterValue> {
    const MSG: &str = "RegisterValue";
    let mut reader = WireReader::new(bytes);

    let mut name = None;
    let mut value = None;

    while let Some(field) = reader.next_field(MSG, &REGISTER_VALUE_FIELDS)? {
        match field.tag {
            1 => name = Some(reader.read_string(MSG, field.name)?),
            _ => value = Some(reader.read_varint()?),
        }
    }

    Ok(RegisterValue {
        name: required(name, MSG, "name")?,
        value: required(value, MSG, "value")?,
    })
}

fn decode_binary_image(bytes: &[u8]) -> Result<BinaryImage> {
    const MSG: &str = "BinaryImage";
    let mut reader = WireReader::new(bytes);

    let mut base_address = None;
    let mut size = None;
    let mut name = None;
    let mut uuid = None;

    while let Some(field) = reader.next_field(MSG, &BINARY_IMAGE_FIELDS)? {
        match field.tag {
            1 => base_address = Some(reader.read_varint()?),
            2 => size = Some(reader.read_varint()?),
            3 => name = Some(reader.read_string(MSG, field.name)?),
            _ => uuid = Some(reader.read_bytes()?.to_vec()),
        }
    }

    Ok(BinaryImage {
        base_address: required(base_address, MSG, "base_address")?,
        size: required(size, MSG, "size")?,
        name: required(name, MSG, "name")?,
        uuid,
    })
}

fn decode_exception(bytes: &[u8]) -> Result<Exception> {
    const MSG: &str = "Exception";
    let mut reader = WireReader::new(bytes);

    let mut name = None;
    let mut reason = None;

    while let Some(field) = reader.next_field(MSG, &EXCEPTION_FIELDS)? {
        let value = reader.read_string(MSG, field.name)?;
        match field.tag {
            1 => name = Some(value),
            _ => reason = Some(value),
        }
    }

    Ok(Exception {
        name: required(name, MSG, "name")?,
        reason: required(reason, MSG, "reason")?,
    })
}

fn decode_signal(bytes: &[u8]) -> Result<Signal> {
    const MSG: &str = "Signal";
    let mut reader = WireReader::new(bytes);

    let mut name = None;
    let mut code = None;
    let mut address = None;

    while let Some(field) = reader.next_field(MSG, &SIGNAL_FIELDS)? {
        match field.tag {
            1 => name = Some(reader.read_string(MSG, field.name)?),
            2 => code = Some(reader.read_string(MSG, field.name)?),
            _ => address = Some(reader.read_varint()?),
        }
    }

    Ok(Signal {
        name: required(name, MSG, "name")?,
        code: required(code, MSG, "code")?,
        address: required(address, MSG, "address")?,
    })
}

/// 必須フィールドが存在するか確認する
fn required<T>(value: Option<T>, message: &'static str, field: &'static str) -> Result<T> {
    value.ok_or(DecodeError::MissingField { message, field })
}
