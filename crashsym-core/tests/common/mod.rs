//! テスト用の外部機能の差し替え

#![allow(dead_code)]

use anyhow::Result;
use crashsym_report::{
    ApplicationInfo, Architecture, BinaryImage, CrashReport, OperatingSystem, Signal, StackFrame,
    SystemInfo, Thread,
};
use crashsym_tools::{format_address, IndexQuery, IndexSearch, SliceProbe, Symbolizer};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const APP_UUID: [u8; 16] = [
    0xde, 0xad, 0xbe, 0xef, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb,
];
pub const APP_UUID_STR: &str = "DEADBEEF-0011-2233-4455-66778899AABB";
pub const LIB_UUID: [u8; 16] = [0x42; 16];

/// UUID -> dSYM パスの表を持つ検索
#[derive(Default)]
pub struct FakeSearch {
    pub dsyms: HashMap<String, PathBuf>,
    pub platform: Option<PathBuf>,
    pub queries: RefCell<Vec<IndexQuery>>,
}

impl FakeSearch {
    pub fn with_dsym(mut self, uuid: &str, path: &str) -> Self {
        self.dsyms.insert(uuid.to_string(), PathBuf::from(path));
        self
    }

    /// dSYM の UUID 検索が行われた回数
    pub fn dsym_queries(&self) -> usize {
        self.queries
            .borrow()
            .iter()
            .filter(|q| matches!(q, IndexQuery::DsymUuid(_)))
            .count()
    }
}

impl IndexSearch for FakeSearch {
    fn query(&self, query: &IndexQuery) -> Result<Vec<PathBuf>> {
        self.queries.borrow_mut().push(query.clone());
        Ok(match query {
            IndexQuery::DsymUuid(uuid) => self.dsyms.get(uuid).cloned().into_iter().collect(),
            IndexQuery::DisplayName(_) => self.platform.clone().into_iter().collect(),
        })
    }
}

/// アドレス -> シンボルの表を持つシンボル化。表にないアドレスはそのまま返す
#[derive(Default)]
pub struct FakeSymbolizer {
    pub symbols: HashMap<u64, String>,
    pub calls: RefCell<Vec<(String, PathBuf, u64, u64)>>,
}

impl FakeSymbolizer {
    pub fn with_symbol(mut self, address: u64, symbol: &str) -> Self {
        self.symbols.insert(address, symbol.to_string());
        self
    }
}

impl Symbolizer for FakeSymbolizer {
    fn symbolize(&self, arch: &str, path: &Path, load_address: u64, address: u64) -> Result<String> {
        self.calls
            .borrow_mut()
            .push((arch.to_string(), path.to_path_buf(), load_address, address));
        Ok(self
            .symbols
            .get(&address)
            .cloned()
            .unwrap_or_else(|| format_address(address)))
    }
}

/// 1つのアーキテクチャだけ UUID を返すプローブ
pub struct FakeProbe {
    pub arch: &'static str,
    pub uuid: [u8; 16],
}

impl SliceProbe for FakeProbe {
    fn slice_uuid(&self, _path: &Path, arch: &str) -> Result<Option<[u8; 16]>> {
        Ok((arch == self.arch).then_some(self.uuid))
    }
}

pub fn image(base: u64, size: u64, name: &str, uuid: Option<[u8; 16]>) -> BinaryImage {
    BinaryImage {
        base_address: base,
        size,
        name: name.to_string(),
        uuid: uuid.map(|u| u.to_vec()),
    }
}

pub fn thread(number: u32, crashed: bool, pcs: &[u64]) -> Thread {
    Thread {
        thread_number: number,
        frames: pcs.iter().map(|&pc| StackFrame { pc }).collect(),
        crashed,
        registers: Vec::new(),
    }
}

pub fn report(threads: Vec<Thread>, binary_images: Vec<BinaryImage>) -> CrashReport {
    CrashReport {
        system_info: SystemInfo {
            operating_system: OperatingSystem::IPhoneOs,
            os_version: "4.3.3".to_string(),
            architecture: Architecture::Arm,
            timestamp: 1_300_000_000,
        },
        application_info: ApplicationInfo {
            identifier: "com.example.MyApp".to_string(),
            version: "1.2".to_string(),
        },
        threads,
        binary_images,
        exception: None,
        signal: Signal {
            name: "SIGSEGV".to_string(),
            code: "SEGV_ACCERR".to_string(),
            address: 0,
        },
    }
}

/// アプリ（0x1000-0x1100）と libobjc（0x2000-0x2200）の2イメージ
pub fn two_images() -> Vec<BinaryImage> {
    vec![
        image(0x1000, 0x100, "/var/mobile/Applications/X/MyApp.app/MyApp", Some(APP_UUID)),
        image(0x2000, 0x200, "/usr/lib/libobjc.A.dylib", Some(LIB_UUID)),
    ]
}
