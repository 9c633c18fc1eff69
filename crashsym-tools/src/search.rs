//! ファイルインデックスの検索
//!
//! macOS では Spotlight のインデックスを `mdfind` で問い合わせます。

use crate::runner::{CommandRunner, SystemRunner};
use crate::Result;
use std::path::PathBuf;
use tracing::debug;

/// インデックスへの問い合わせ
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexQuery {
    /// 表示名が一致するもの
    DisplayName(String),
    /// dSYM に埋め込まれた UUID が一致するもの（正規化済みの UUID 文字列）
    DsymUuid(String),
}

impl IndexQuery {
    /// Spotlight のクエリ文字列に変換する
    pub fn to_spotlight(&self) -> String {
        match self {
            IndexQuery::DisplayName(name) => format!("kMDItemDisplayName == '{}'", name),
            IndexQuery::DsymUuid(uuid) => format!("com_apple_xcode_dsym_uuids == '{}'", uuid),
        }
    }
}

/// ファイルインデックスの検索機能
pub trait IndexSearch {
    /// 一致したファイルのパスを返す（0件以上）
    fn query(&self, query: &IndexQuery) -> Result<Vec<PathBuf>>;
}

impl<T: IndexSearch + ?Sized> IndexSearch for &T {
    fn query(&self, query: &IndexQuery) -> Result<Vec<PathBuf>> {
        (**self).query(query)
    }
}

/// `mdfind` を使う検索
#[derive(Debug, Clone, Default)]
pub struct MdfindSearch<R = SystemRunner> {
    runner: R,
}

impl<R: CommandRunner> MdfindSearch<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> IndexSearch for MdfindSearch<R> {
    fn query(&self, query: &IndexQuery) -> Result<Vec<PathBuf>> {
        let spotlight = query.to_spotlight();
        let output = self.runner.run("mdfind", &[spotlight.clone()])?;

        let paths: Vec<PathBuf> = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect();

        debug!("mdfind \"{}\" -> {} result(s)", spotlight, paths.len());
        Ok(paths)
    }
}
