//! エラー型

use std::path::PathBuf;
use thiserror::Error;

/// シンボルファイル探索の致命的なエラー
///
/// 見つからないこと自体はエラーではなく `None` で表します。
#[derive(Debug, Error)]
pub enum LocateError {
    /// バンドルの中にシンボルファイルが1つもない
    #[error("no entries found in bundle directory {0:?}")]
    EmptyBundle(PathBuf),

    /// バンドルのディレクトリを読めない
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// レポート解析を中断する致命的なエラー
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// レポートにバイナリイメージがない
    #[error("report contains no binary images")]
    NoImages,

    /// アプリケーション本体のイメージがローカルに見つからない
    #[error("Couldn't find image with UUID {uuid}")]
    ApplicationImageMissing { uuid: String },

    /// どの候補アーキテクチャの UUID も一致しない
    #[error("could not detect crash log architecture")]
    ArchitectureDetection,

    /// カレントディレクトリを取得できない
    #[error("failed to resolve relative image path: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error(transparent)]
    Locate(#[from] LocateError),
}
