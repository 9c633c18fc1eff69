//! レポート全体の解析
//!
//! アプリケーションイメージの特定、アーキテクチャの検出、脱獄の検出を行ったあと、
//! クラッシュしたスレッドのフレームを保存順にシンボル化します。

use crate::arch::detect_arch;
use crate::device_support::{find_os_symbols_dir, OsSymbols};
use crate::errors::AnalyzeError;
use crate::identifier::canonicalize;
use crate::locator::{expand_bundle_path, ImageLocator, LocatorConfig};
use crate::resolver::{FrameResolver, ResolvedFrame};
use crate::tamper::TamperDetector;
use crate::Result;
use crashsym_report::{CrashReport, Exception, OperatingSystem, Signal};
use crashsym_tools::{format_address, IndexSearch, SliceProbe, Symbolizer, CANDIDATE_ARCHS};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// UUID を持たないイメージの表示
const NO_UUID: &str = "<none>";

/// シンボル化されたクラッシュスレッド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashedThread {
    pub thread_number: u32,
    /// 保存順（0が最も内側）
    pub frames: Vec<ResolvedFrame>,
}

/// 解析結果
#[derive(Debug, Clone)]
pub struct Analysis {
    pub os_symbols: OsSymbols,
    pub app_image_path: PathBuf,
    pub identifier: String,
    pub version: String,
    pub arch: &'static str,
    pub tampered: bool,
    pub exception: Option<Exception>,
    pub signal: Signal,
    pub threads: Vec<CrashedThread>,
}

/// 解析が中断しても表示できる冒頭部分
///
/// アプリケーションイメージが見つかる前に中断した場合、`app_image_path` は `None` です。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preamble {
    pub os_symbols: OsSymbols,
    pub app_image_path: Option<PathBuf>,
    pub identifier: String,
    pub version: String,
}

impl fmt::Display for Preamble {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_preamble(
            f,
            &self.os_symbols,
            self.app_image_path.as_deref(),
            &self.identifier,
            &self.version,
        )
    }
}

fn write_preamble(
    f: &mut fmt::Formatter,
    os_symbols: &OsSymbols,
    app_image_path: Option<&Path>,
    identifier: &str,
    version: &str,
) -> fmt::Result {
    match os_symbols {
        OsSymbols::Found(dir) => writeln!(f, "OS Symbols:   {}", dir.display())?,
        OsSymbols::Missing { os_version } => writeln!(
            f,
            "Warning: Could not find iPhone symbols for iOS {}",
            os_version
        )?,
        OsSymbols::NotInstalled => {}
    }

    if let Some(path) = app_image_path {
        writeln!(f, "App Image:    {}", path.display())?;
        writeln!(f, "Identifier:   {}", identifier)?;
        writeln!(f, "Version:      {}", version)?;
    }
    Ok(())
}

/// 解析の中断と、それまでに確定した冒頭部分
#[derive(Debug, Error)]
#[error("{error}")]
pub struct AnalyzeFailure {
    pub preamble: Preamble,
    pub error: AnalyzeError,
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_preamble(
            f,
            &self.os_symbols,
            Some(self.app_image_path.as_path()),
            &self.identifier,
            &self.version,
        )?;

        if self.tampered {
            writeln!(f)?;
            writeln!(f, "WARNING: Jailbreak detected!")?;
        }

        if let Some(exception) = &self.exception {
            writeln!(f)?;
            writeln!(f, "Exception Name: {}", exception.name)?;
            writeln!(f, "Exception Reason: {}", exception.reason)?;
        }

        writeln!(f)?;
        writeln!(f, "Architecture: {}", self.arch)?;

        writeln!(f)?;
        writeln!(f, "Exception Type:  {}", self.signal.name)?;
        writeln!(
            f,
            "Exception Codes: {} at {}",
            self.signal.code,
            format_address(self.signal.address)
        )?;
        writeln!(f)?;

        for thread in &self.threads {
            writeln!(f, "Thread {} Crashed:", thread.thread_number)?;
            for frame in &thread.frames {
                writeln!(f, "{}", frame)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

/// レポート解析器
pub struct Analyzer<S, Y, P> {
    locator: ImageLocator<S>,
    symbolizer: Y,
    probe: P,
    tamper: TamperDetector,
    candidates: Vec<&'static str>,
}

impl<S: IndexSearch, Y: Symbolizer, P: SliceProbe> Analyzer<S, Y, P> {
    /// 外部機能を受け取って解析器を作成する
    pub fn new(search: S, symbolizer: Y, probe: P) -> Result<Self> {
        Ok(Self {
            locator: ImageLocator::new(search, LocatorConfig::default()),
            symbolizer,
            probe,
            tamper: TamperDetector::new()?,
            candidates: CANDIDATE_ARCHS.to_vec(),
        })
    }

    /// 試すアーキテクチャの候補を差し替える
    pub fn with_candidates(mut self, candidates: &[&'static str]) -> Self {
        self.candidates = candidates.to_vec();
        self
    }

    /// シンボルファイル探索器への参照を取得
    pub fn locator(&self) -> &ImageLocator<S> {
        &self.locator
    }

    /// レポートを解析する
    ///
    /// `app_image_override` はユーザーが指定したアプリケーションバイナリ（または dSYM、
    /// xcarchive）のパスです。指定がなければ UUID で検索します。
    /// アーキテクチャを検出できない場合、フレームのシンボル化は行いません。
    /// 中断した場合も、それまでに確定した冒頭部分をエラーと一緒に返します。
    pub fn analyze(
        &mut self,
        report: &CrashReport,
        app_image_override: Option<&Path>,
    ) -> std::result::Result<Analysis, AnalyzeFailure> {
        let mut preamble = Preamble {
            os_symbols: self.discover_os_symbols(report),
            app_image_path: None,
            identifier: report.application_info.identifier.clone(),
            version: report.application_info.version.clone(),
        };
        self.locator
            .set_os_symbols_dir(preamble.os_symbols.dir().map(Path::to_path_buf));

        match self.analyze_report(report, app_image_override, &mut preamble) {
            Ok(analysis) => Ok(analysis),
            Err(error) => Err(AnalyzeFailure { preamble, error }),
        }
    }

    fn analyze_report(
        &mut self,
        report: &CrashReport,
        app_image_override: Option<&Path>,
        preamble: &mut Preamble,
    ) -> std::result::Result<Analysis, AnalyzeError> {
        let app = report.primary_image().ok_or(AnalyzeError::NoImages)?;
        let app_uuid = app.uuid.as_deref().and_then(|raw| canonicalize(raw).ok());

        let app_image_path = match app_image_override {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    std::env::current_dir()
                        .map_err(AnalyzeError::CurrentDir)?
                        .join(path)
                };
                let path = expand_bundle_path(&path)?;
                self.locator.insert(app.name.clone(), Some(path.clone()));
                path
            }
            None => self.locator.locate(app)?.ok_or_else(|| {
                AnalyzeError::ApplicationImageMissing {
                    uuid: app_uuid.clone().unwrap_or_else(|| NO_UUID.to_string()),
                }
            })?,
        };
        debug!("application image: {:?}", app_image_path);
        preamble.app_image_path = Some(app_image_path.clone());

        let app_uuid = app_uuid.ok_or(AnalyzeError::ArchitectureDetection)?;
        let arch = detect_arch(&self.probe, &self.candidates, &app_image_path, &app_uuid)?;
        debug!("crash architecture: {}", arch);

        let tampered = self.tamper.is_tampered(&report.binary_images);

        let mut resolver = FrameResolver::new(&mut self.locator, &self.symbolizer, arch);
        let mut threads = Vec::new();
        for thread in report.crashed_threads() {
            let frames = thread
                .frames
                .iter()
                .enumerate()
                .map(|(index, frame)| resolver.resolve(index, frame, &report.binary_images))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            threads.push(CrashedThread {
                thread_number: thread.thread_number,
                frames,
            });
        }

        Ok(Analysis {
            os_symbols: preamble.os_symbols.clone(),
            app_image_path,
            identifier: preamble.identifier.clone(),
            version: preamble.version.clone(),
            arch,
            tampered,
            exception: report.exception.clone(),
            signal: report.signal.clone(),
            threads,
        })
    }

    /// iPhone OS のレポートなら、対応する OS のシンボルディレクトリを探す
    fn discover_os_symbols(&self, report: &CrashReport) -> OsSymbols {
        if report.system_info.operating_system != OperatingSystem::IPhoneOs {
            return OsSymbols::NotInstalled;
        }

        find_os_symbols_dir(self.locator.search(), &report.system_info.os_version)
            .unwrap_or_else(|e| {
                warn!("searching for iPhoneOS.platform failed: {:#}", e);
                OsSymbols::NotInstalled
            })
    }
}
