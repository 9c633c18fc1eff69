//! アドレスのシンボル化

use crate::runner::{CommandRunner, SystemRunner};
use crate::Result;
use std::path::Path;
use tracing::trace;

/// アドレスを `0x%08x` 形式にする
pub fn format_address(address: u64) -> String {
    format!("0x{:08x}", address)
}

/// (アーキテクチャ, シンボルファイル, ロードアドレス, アドレス) からシンボル文字列を得る機能
///
/// シンボルが見つからない場合、実装はアドレス文字列をそのまま返すことがあります。
pub trait Symbolizer {
    fn symbolize(&self, arch: &str, path: &Path, load_address: u64, address: u64)
        -> Result<String>;
}

impl<T: Symbolizer + ?Sized> Symbolizer for &T {
    fn symbolize(
        &self,
        arch: &str,
        path: &Path,
        load_address: u64,
        address: u64,
    ) -> Result<String> {
        (**self).symbolize(arch, path, load_address, address)
    }
}

/// `atos` を使うシンボル化
#[derive(Debug, Clone, Default)]
pub struct AtosSymbolizer<R = SystemRunner> {
    runner: R,
}

impl<R: CommandRunner> AtosSymbolizer<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn args(arch: &str, path: &Path, load_address: u64, address: u64) -> Vec<String> {
        vec![
            "-arch".to_string(),
            arch.to_string(),
            "-o".to_string(),
            path.display().to_string(),
            "-l".to_string(),
            format_address(load_address),
            format_address(address),
        ]
    }
}

impl<R: CommandRunner> Symbolizer for AtosSymbolizer<R> {
    fn symbolize(
        &self,
        arch: &str,
        path: &Path,
        load_address: u64,
        address: u64,
    ) -> Result<String> {
        let output = self
            .runner
            .run("atos", &Self::args(arch, path, load_address, address))?;
        let symbol = output.trim().to_string();
        trace!("atos {} -> {}", format_address(address), symbol);
        Ok(symbol)
    }
}
