//! OS のシンボルディレクトリの検出
//!
//! Xcode の `iPhoneOS.platform/DeviceSupport/<OSバージョン>/Symbols` に
//! デバイスから取り込んだシステムライブラリのシンボルが置かれています。

use crate::Result;
use crashsym_tools::{IndexQuery, IndexSearch};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// プラットフォームディレクトリの表示名
const PLATFORM_NAME: &str = "iPhoneOS.platform";

/// OS のシンボルディレクトリの検出結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OsSymbols {
    /// プラットフォームがインストールされていない、または対象外の OS
    NotInstalled,
    /// プラットフォームはあるが、該当バージョンのシンボルがない
    Missing { os_version: String },
    /// 見つかったシンボルディレクトリ
    Found(PathBuf),
}

impl OsSymbols {
    /// 見つかったディレクトリ
    pub fn dir(&self) -> Option<&Path> {
        match self {
            OsSymbols::Found(dir) => Some(dir),
            _ => None,
        }
    }
}

/// レポートの OS バージョンに対応するシンボルディレクトリを探す
pub fn find_os_symbols_dir<S: IndexSearch>(search: &S, os_version: &str) -> Result<OsSymbols> {
    let platforms = search.query(&IndexQuery::DisplayName(PLATFORM_NAME.to_string()))?;
    let Some(platform) = platforms.first() else {
        debug!("{} not found", PLATFORM_NAME);
        return Ok(OsSymbols::NotInstalled);
    };

    match version_dir(&platform.join("DeviceSupport"), os_version) {
        Some(dir) => Ok(OsSymbols::Found(dir.join("Symbols"))),
        None => Ok(OsSymbols::Missing {
            os_version: os_version.to_string(),
        }),
    }
}

/// バージョン名で始まる最初のディレクトリ（例: "4.3.3" -> "4.3.3 (8J2)"）
fn version_dir(device_support: &Path, os_version: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(device_support).ok()?;

    let mut names: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name())
        .filter(|name| name.to_string_lossy().starts_with(os_version))
        .collect();
    names.sort();

    names.into_iter().next().map(|name| device_support.join(name))
}
