//! シンボルファイルの探索
//!
//! イメージ名ごとに探索結果（見つからなかったことも含む）をキャッシュし、
//! 同じイメージが多数のフレームに現れても外部検索は1回しか行いません。

use crate::errors::LocateError;
use crate::identifier::canonicalize;
use crashsym_report::BinaryImage;
use crashsym_tools::{IndexQuery, IndexSearch};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 探索の設定
#[derive(Debug, Clone, Default)]
pub struct LocatorConfig {
    /// OS のシンボルディレクトリ（DeviceSupport/<version>/Symbols）
    pub os_symbols_dir: Option<PathBuf>,
}

/// イメージのシンボルファイル探索
pub struct ImageLocator<S> {
    search: S,
    config: LocatorConfig,
    /// イメージ名 -> 探索結果（`None` は見つからなかったことを表す）
    cache: HashMap<String, Option<PathBuf>>,
}

impl<S: IndexSearch> ImageLocator<S> {
    /// 探索器を作成する
    pub fn new(search: S, config: LocatorConfig) -> Self {
        Self {
            search,
            config,
            cache: HashMap::new(),
        }
    }

    /// 外部検索機能への参照を取得
    pub fn search(&self) -> &S {
        &self.search
    }

    /// OS のシンボルディレクトリ
    pub fn os_symbols_dir(&self) -> Option<&Path> {
        self.config.os_symbols_dir.as_deref()
    }

    /// OS のシンボルディレクトリを設定する
    pub fn set_os_symbols_dir(&mut self, dir: Option<PathBuf>) {
        self.config.os_symbols_dir = dir;
    }

    /// 探索結果をあらかじめ登録する
    pub fn insert(&mut self, image_name: impl Into<String>, path: Option<PathBuf>) {
        self.cache.insert(image_name.into(), path);
    }

    /// キャッシュ済みの結果を取得する
    ///
    /// 未探索なら外側が `None`、見つからなかったことがキャッシュされていれば `Some(None)`。
    pub fn cached(&self, image_name: &str) -> Option<Option<&Path>> {
        self.cache.get(image_name).map(Option::as_deref)
    }

    /// イメージのシンボルファイルを探す
    ///
    /// 1. キャッシュ
    /// 2. OS のシンボルディレクトリ
    /// 3. UUID による dSYM の検索（バンドルの中まで辿る）
    ///
    /// 結果は見つからなかった場合も含めてキャッシュされます。
    pub fn locate(&mut self, image: &BinaryImage) -> Result<Option<PathBuf>, LocateError> {
        if let Some(cached) = self.cache.get(&image.name) {
            debug!("cache hit for {}", image.name);
            return Ok(cached.clone());
        }

        let found = self.lookup(image)?;
        match &found {
            Some(path) => debug!("{} -> {:?}", image.name, path),
            None => debug!("no symbols found for {}", image.name),
        }

        self.cache.insert(image.name.clone(), found.clone());
        Ok(found)
    }

    fn lookup(&self, image: &BinaryImage) -> Result<Option<PathBuf>, LocateError> {
        if let Some(path) = self.find_in_os_symbols(&image.name) {
            return Ok(Some(path));
        }

        let Some(raw) = image.uuid.as_deref() else {
            debug!("{} has no UUID, skipping dSYM search", image.name);
            return Ok(None);
        };

        let uuid = match canonicalize(raw) {
            Ok(uuid) => uuid,
            Err(e) => {
                warn!("{}: {}", image.name, e);
                return Ok(None);
            }
        };

        let matches = match self.search.query(&IndexQuery::DsymUuid(uuid.clone())) {
            Ok(matches) => matches,
            Err(e) => {
                warn!("dSYM search for {} failed: {:#}", uuid, e);
                return Ok(None);
            }
        };

        match matches.first() {
            Some(path) => expand_bundle_path(path).map(Some),
            None => Ok(None),
        }
    }

    /// OS のシンボルディレクトリからイメージを探す
    ///
    /// デバイス上のフルパスをディレクトリ内の相対パスとして試し、
    /// 次にファイル名だけで試します。
    fn find_in_os_symbols(&self, image_name: &str) -> Option<PathBuf> {
        let root = self.config.os_symbols_dir.as_deref()?;

        let relative = root.join(image_name.trim_start_matches('/'));
        if !image_name.is_empty() && relative.exists() {
            return Some(relative);
        }

        let file_name = Path::new(image_name).file_name()?;
        let flat = root.join(file_name);
        flat.exists().then_some(flat)
    }
}

/// アーカイブや dSYM バンドルのパスを、中にある実際のシンボルファイルのパスにする
///
/// - `*.xcarchive` -> `dSYMs/` の最初のエントリ
/// - `*.dSYM` -> `Contents/Resources/DWARF/` の最初のエントリ
///
/// それ以外のパスはそのまま返します。
pub fn expand_bundle_path(path: &Path) -> Result<PathBuf, LocateError> {
    let mut path = path.to_path_buf();

    if has_extension(&path, "xcarchive") {
        path = first_entry(&path.join("dSYMs"))?;
    }
    if has_extension(&path, "dSYM") {
        path = first_entry(&path.join("Contents").join("Resources").join("DWARF"))?;
    }

    Ok(path)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().map_or(false, |e| e == ext)
}

/// ディレクトリ内の最初のエントリ（隠しファイルを除き、名前順）
fn first_entry(dir: &Path) -> Result<PathBuf, LocateError> {
    let entries = fs::read_dir(dir).map_err(|source| LocateError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut names: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name())
        .filter(|name| !name.to_string_lossy().starts_with('.'))
        .collect();
    names.sort();

    let first = names
        .into_iter()
        .next()
        .ok_or_else(|| LocateError::EmptyBundle(dir.to_path_buf()))?;
    debug!("descending into {:?}", dir.join(&first));
    Ok(dir.join(first))
}
