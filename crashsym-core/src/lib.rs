//! crashsym のコア機能
//!
//! このクレートは、クラッシュレポートのシンボル化の中核となるロジックを提供します。
//! イメージ UUID の正規化、シンボルファイルの探索とキャッシュ、
//! アドレスからイメージへの対応付け、レポート全体の解析を統合します。

pub mod analyzer;
pub mod arch;
pub mod device_support;
pub mod errors;
pub mod identifier;
pub mod locator;
pub mod resolver;
pub mod tamper;

pub use analyzer::{Analysis, AnalyzeFailure, Analyzer, CrashedThread, Preamble};
pub use arch::detect_arch;
pub use device_support::{find_os_symbols_dir, OsSymbols};
pub use errors::{AnalyzeError, LocateError};
pub use identifier::{canonicalize, IdentifierError};
pub use locator::{expand_bundle_path, ImageLocator, LocatorConfig};
pub use resolver::{find_image, FrameResolver, ResolvedFrame};
pub use tamper::TamperDetector;

// 他のクレートから使用するために再エクスポート
pub use crashsym_report::{BinaryImage, CrashReport, StackFrame};
pub use crashsym_tools::{IndexSearch, SliceProbe, Symbolizer};

/// コア機能の結果型
pub type Result<T> = anyhow::Result<T>;
