//! クラッシュ時のアーキテクチャの検出

use crate::errors::AnalyzeError;
use crate::identifier::canonicalize;
use crashsym_tools::SliceProbe;
use std::path::Path;
use tracing::debug;

/// アプリケーションのバイナリから、レポートの UUID と一致するスライスのアーキテクチャを探す
///
/// 候補を順に試し、最初に一致したものを返します。
/// 読み取りに失敗した候補は一致しなかったものとして扱います。
pub fn detect_arch<P: SliceProbe>(
    probe: &P,
    candidates: &[&'static str],
    app_path: &Path,
    app_uuid: &str,
) -> Result<&'static str, AnalyzeError> {
    for &arch in candidates {
        let slice_uuid = match probe.slice_uuid(app_path, arch) {
            Ok(Some(raw)) => raw,
            Ok(None) => continue,
            Err(e) => {
                debug!("probing {} slice of {:?} failed: {:#}", arch, app_path, e);
                continue;
            }
        };

        // 16バイト固定なので正規化は失敗しない
        let Ok(slice_uuid) = canonicalize(&slice_uuid) else {
            continue;
        };

        debug!("{} slice UUID {}", arch, slice_uuid);
        if slice_uuid.eq_ignore_ascii_case(app_uuid) {
            return Ok(arch);
        }
    }

    Err(AnalyzeError::ArchitectureDetection)
}
