//! crashsym 外部ツール連携
//!
//! このクレートは、シンボル化に必要な外部の機能をトレイトとして提供します。
//! コマンドの実行、Spotlight インデックスの検索、atos によるアドレスのシンボル化、
//! Mach-O スライスの UUID の読み取りを行います。
//! テストではこれらのトレイトを差し替えて、実際のツールを起動せずに動作を確認できます。

pub mod probe;
pub mod runner;
pub mod search;
pub mod symbolizer;

pub use probe::{MachOProbe, SliceProbe, CANDIDATE_ARCHS};
pub use runner::{CommandRunner, SystemRunner, ToolError};
pub use search::{IndexQuery, IndexSearch, MdfindSearch};
pub use symbolizer::{format_address, AtosSymbolizer, Symbolizer};

/// 外部ツール連携の結果型
pub type Result<T> = anyhow::Result<T>;
