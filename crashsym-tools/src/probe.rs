//! Mach-O スライスの UUID の読み取り
//!
//! ユニバーサルバイナリ（fat）の場合は指定アーキテクチャのスライスを選び、
//! その LC_UUID を返します。

use crate::Result;
use object::macho;
use object::read::macho::{FatArch, MachHeader, MachOFatFile32, MachOFatFile64};
use object::{Endianness, FileKind, Object};
use std::fs;
use std::path::Path;
use tracing::debug;

/// クラッシュ時のアーキテクチャとして試す候補（この順で試す）
pub const CANDIDATE_ARCHS: &[&str] = &["armv6", "armv7", "armv7s", "arm64", "i386", "x86_64"];

/// 指定アーキテクチャのスライスの UUID を読み取る機能
pub trait SliceProbe {
    /// スライスが存在しない、または UUID を持たない場合は `None`
    fn slice_uuid(&self, path: &Path, arch: &str) -> Result<Option<[u8; 16]>>;
}

impl<T: SliceProbe + ?Sized> SliceProbe for &T {
    fn slice_uuid(&self, path: &Path, arch: &str) -> Result<Option<[u8; 16]>> {
        (**self).slice_uuid(path, arch)
    }
}

/// アーキテクチャ名を (cputype, cpusubtype) に変換する
///
/// cpusubtype が `None` の場合はサブタイプを問わない。
fn cpu_for_arch(arch: &str) -> Option<(u32, Option<u32>)> {
    match arch {
        "armv6" => Some((macho::CPU_TYPE_ARM, Some(macho::CPU_SUBTYPE_ARM_V6))),
        "armv7" => Some((macho::CPU_TYPE_ARM, Some(macho::CPU_SUBTYPE_ARM_V7))),
        "armv7s" => Some((macho::CPU_TYPE_ARM, Some(macho::CPU_SUBTYPE_ARM_V7S))),
        "arm64" => Some((macho::CPU_TYPE_ARM64, None)),
        "i386" => Some((macho::CPU_TYPE_X86, None)),
        "x86_64" => Some((macho::CPU_TYPE_X86_64, None)),
        _ => None,
    }
}

fn cpu_matches(wanted: (u32, Option<u32>), cputype: u32, cpusubtype: u32) -> bool {
    let (want_type, want_subtype) = wanted;
    cputype == want_type
        && want_subtype.map_or(true, |sub| cpusubtype & !macho::CPU_SUBTYPE_MASK == sub)
}

/// `object` クレートで Mach-O を直接読むプローブ
#[derive(Debug, Clone, Copy, Default)]
pub struct MachOProbe;

impl MachOProbe {
    fn fat_slice<'data, A: FatArch>(
        arches: &[A],
        data: &'data [u8],
        wanted: (u32, Option<u32>),
    ) -> Result<Option<&'data [u8]>> {
        for arch in arches {
            if cpu_matches(wanted, arch.cputype(), arch.cpusubtype()) {
                let slice = arch
                    .data(data)
                    .map_err(|e| anyhow::anyhow!("Failed to read fat slice: {}", e))?;
                return Ok(Some(slice));
            }
        }
        Ok(None)
    }

    fn thin_cpu(kind: FileKind, data: &[u8]) -> Result<(u32, u32)> {
        let parse_err = |e| anyhow::anyhow!("Failed to parse Mach-O header: {}", e);
        if kind == FileKind::MachO64 {
            let header = macho::MachHeader64::<Endianness>::parse(data, 0).map_err(parse_err)?;
            let endian = header.endian().map_err(parse_err)?;
            Ok((header.cputype(endian), header.cpusubtype(endian)))
        } else {
            let header = macho::MachHeader32::<Endianness>::parse(data, 0).map_err(parse_err)?;
            let endian = header.endian().map_err(parse_err)?;
            Ok((header.cputype(endian), header.cpusubtype(endian)))
        }
    }

    fn uuid_of(slice: &[u8]) -> Result<Option<[u8; 16]>> {
        let file = object::File::parse(slice)
            .map_err(|e| anyhow::anyhow!("Failed to parse Mach-O slice: {}", e))?;
        file.mach_uuid()
            .map_err(|e| anyhow::anyhow!("Failed to read LC_UUID: {}", e))
    }
}

impl SliceProbe for MachOProbe {
    fn slice_uuid(&self, path: &Path, arch: &str) -> Result<Option<[u8; 16]>> {
        let wanted = cpu_for_arch(arch)
            .ok_or_else(|| anyhow::anyhow!("Unknown architecture '{}'", arch))?;

        let data = fs::read(path)
            .map_err(|e| anyhow::anyhow!("Failed to read file {:?}: {}", path, e))?;
        let data = data.as_slice();

        let kind = FileKind::parse(data)
            .map_err(|e| anyhow::anyhow!("Failed to detect file format of {:?}: {}", path, e))?;

        let slice = match kind {
            FileKind::MachOFat32 => {
                let fat = MachOFatFile32::parse(data)
                    .map_err(|e| anyhow::anyhow!("Failed to parse fat header: {}", e))?;
                Self::fat_slice(fat.arches(), data, wanted)?
            }
            FileKind::MachOFat64 => {
                let fat = MachOFatFile64::parse(data)
                    .map_err(|e| anyhow::anyhow!("Failed to parse fat header: {}", e))?;
                Self::fat_slice(fat.arches(), data, wanted)?
            }
            FileKind::MachO32 | FileKind::MachO64 => {
                let (cputype, cpusubtype) = Self::thin_cpu(kind, data)?;
                cpu_matches(wanted, cputype, cpusubtype).then_some(data)
            }
            other => {
                return Err(anyhow::anyhow!(
                    "{:?} is not a Mach-O file ({:?})",
                    path,
                    other
                ))
            }
        };

        match slice {
            Some(slice) => {
                let uuid = Self::uuid_of(slice)?;
                debug!("{:?} [{}] has LC_UUID {:?}", path, arch, uuid);
                Ok(uuid)
            }
            None => {
                debug!("{:?} has no {} slice", path, arch);
                Ok(None)
            }
        }
    }
}
