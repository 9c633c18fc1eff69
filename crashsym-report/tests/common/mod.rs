//! テスト用のレポートエンコーダ

#![allow(dead_code)]

/// メッセージ1つ分を組み立てるライター
#[derive(Default)]
pub struct MessageWriter {
    buf: Vec<u8>,
}

impl MessageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(&mut self, tag: u32, wire_type: u8) {
        encode_varint(&mut self.buf, (u64::from(tag) << 3) | u64::from(wire_type));
    }

    pub fn varint(mut self, tag: u32, value: u64) -> Self {
        self.key(tag, 0);
        encode_varint(&mut self.buf, value);
        self
    }

    pub fn fixed32(mut self, tag: u32, value: u32) -> Self {
        self.key(tag, 5);
        self.buf.extend(value.to_le_bytes());
        self
    }

    pub fn bytes(mut self, tag: u32, value: &[u8]) -> Self {
        self.key(tag, 2);
        encode_varint(&mut self.buf, value.len() as u64);
        self.buf.extend_from_slice(value);
        self
    }

    pub fn string(self, tag: u32, value: &str) -> Self {
        self.bytes(tag, value.as_bytes())
    }

    pub fn message(self, tag: u32, message: MessageWriter) -> Self {
        self.bytes(tag, &message.finish())
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

pub fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

pub fn system_info(os_version: &str) -> MessageWriter {
    MessageWriter::new()
        .varint(1, 1)
        .string(2, os_version)
        .varint(3, 2)
        .varint(4, 1_300_000_000)
}

pub fn application_info() -> MessageWriter {
    MessageWriter::new()
        .string(1, "com.example.MyApp")
        .string(2, "1.2")
}

pub fn frame(pc: u64) -> MessageWriter {
    MessageWriter::new().varint(3, pc)
}

pub fn register(name: &str, value: u64) -> MessageWriter {
    MessageWriter::new().string(1, name).varint(2, value)
}

pub fn thread(number: u32, crashed: bool, pcs: &[u64]) -> MessageWriter {
    let mut thread = MessageWriter::new().varint(1, u64::from(number));
    for &pc in pcs {
        thread = thread.message(2, frame(pc));
    }
    thread.varint(3, u64::from(crashed))
}

pub fn image(base: u64, size: u64, name: &str, uuid: Option<&[u8]>) -> MessageWriter {
    let image = MessageWriter::new()
        .varint(1, base)
        .varint(2, size)
        .string(3, name);
    match uuid {
        Some(uuid) => image.bytes(4, uuid),
        None => image,
    }
}

pub fn signal() -> MessageWriter {
    MessageWriter::new()
        .string(1, "SIGSEGV")
        .string(2, "SEGV_ACCERR")
        .varint(3, 0xdead_beef)
}

/// ヘッダを付けてファイルの内容にする
pub fn with_header(body: Vec<u8>) -> Vec<u8> {
    let mut file = b"plcrash\x01".to_vec();
    file.extend(body);
    file
}
