//! クラッシュレポートのデータモデル
//!
//! デコード後は変更されない読み取り専用の構造です。

use std::fmt;

/// クラッシュレポート全体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashReport {
    pub system_info: SystemInfo,
    pub application_info: ApplicationInfo,
    /// 保存順（スレッド番号順とは限らない）
    pub threads: Vec<Thread>,
    /// ロード順。先頭がアプリケーション本体のイメージ
    pub binary_images: Vec<BinaryImage>,
    pub exception: Option<Exception>,
    pub signal: Signal,
}

impl CrashReport {
    /// アプリケーション本体のイメージ（先頭のイメージ）
    pub fn primary_image(&self) -> Option<&BinaryImage> {
        self.binary_images.first()
    }

    /// クラッシュしたスレッドを保存順に返す
    pub fn crashed_threads(&self) -> impl Iterator<Item = &Thread> {
        self.threads.iter().filter(|t| t.crashed)
    }
}

/// オペレーティングシステム
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingSystem {
    MacOsX,
    IPhoneOs,
    IPhoneSimulator,
    /// 新しいレポート形式で追加された未知の値
    Unknown(u64),
}

impl From<u64> for OperatingSystem {
    fn from(value: u64) -> Self {
        match value {
            0 => OperatingSystem::MacOsX,
            1 => OperatingSystem::IPhoneOs,
            2 => OperatingSystem::IPhoneSimulator,
            other => OperatingSystem::Unknown(other),
        }
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OperatingSystem::MacOsX => write!(f, "Mac OS X"),
            OperatingSystem::IPhoneOs => write!(f, "iPhone OS"),
            OperatingSystem::IPhoneSimulator => write!(f, "iPhone Simulator"),
            OperatingSystem::Unknown(v) => write!(f, "unknown OS ({})", v),
        }
    }
}

/// レポートに記録された CPU アーキテクチャ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    X86_32,
    X86_64,
    Arm,
    Ppc,
    Ppc64,
    Unknown(u64),
}

impl From<u64> for Architecture {
    fn from(value: u64) -> Self {
        match value {
            0 => Architecture::X86_32,
            1 => Architecture::X86_64,
            2 => Architecture::Arm,
            3 => Architecture::Ppc,
            4 => Architecture::Ppc64,
            other => Architecture::Unknown(other),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Architecture::X86_32 => write!(f, "x86-32"),
            Architecture::X86_64 => write!(f, "x86-64"),
            Architecture::Arm => write!(f, "ARM"),
            Architecture::Ppc => write!(f, "PPC"),
            Architecture::Ppc64 => write!(f, "PPC64"),
            Architecture::Unknown(v) => write!(f, "unknown architecture ({})", v),
        }
    }
}

/// システム情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    pub operating_system: OperatingSystem,
    pub os_version: String,
    pub architecture: Architecture,
    /// クラッシュ時刻（UNIX時間、秒）
    pub timestamp: u32,
}

/// アプリケーション情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationInfo {
    pub identifier: String,
    pub version: String,
}

/// スレッド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub thread_number: u32,
    /// 呼び出し順。インデックス0が最も内側のフレーム
    pub frames: Vec<StackFrame>,
    pub crashed: bool,
    pub registers: Vec<RegisterValue>,
}

/// スタックフレーム
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackFrame {
    pub pc: u64,
}

/// レジスタ値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterValue {
    pub name: String,
    pub value: u64,
}

/// ロード済みバイナリイメージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryImage {
    pub base_address: u64,
    pub size: u64,
    /// 通常はデバイス上のフルパス
    pub name: String,
    /// 16バイトの UUID（生データ）
    pub uuid: Option<Vec<u8>>,
}

impl BinaryImage {
    /// イメージ名のファイル名部分
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// アドレスがこのイメージの範囲に含まれるか
    ///
    /// 上限を含みます（戻りアドレスがイメージ末尾を指すことがあるため）。
    pub fn contains(&self, address: u64) -> bool {
        address >= self.base_address && address <= self.base_address.saturating_add(self.size)
    }
}

/// Objective-C 例外
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exception {
    pub name: String,
    pub reason: String,
}

/// シグナル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub name: String,
    pub code: String,
    pub address: u64,
}
