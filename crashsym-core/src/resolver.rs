//! スタックフレームのシンボル化

use crate::errors::LocateError;
use crate::locator::ImageLocator;
use crashsym_report::{BinaryImage, StackFrame};
use crashsym_tools::{format_address, IndexSearch, Symbolizer};
use std::fmt;
use tracing::warn;

/// どのイメージにも属さないフレームに表示する名前
const UNKNOWN_IMAGE: &str = "???";

/// アドレスを含むイメージを探す
///
/// 宣言順に走査し、最初に `base <= pc <= base + size` を満たすものを返します。
/// 上限を含むため、隣接するイメージの境界では先に宣言された方が選ばれます。
pub fn find_image(pc: u64, images: &[BinaryImage]) -> Option<&BinaryImage> {
    images.iter().find(|image| image.contains(pc))
}

/// シンボル化されたフレーム（出力の1行）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFrame {
    /// スレッド内のフレーム番号（0が最も内側）
    pub index: usize,
    /// イメージのファイル名
    pub image_name: String,
    pub pc: u64,
    /// シンボル（見つからなければ空）
    pub symbol: String,
}

impl fmt::Display for ResolvedFrame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:<3} {:<32} {} {}",
            self.index,
            self.image_name,
            format_address(self.pc),
            self.symbol
        )
    }
}

/// フレームのシンボル化
///
/// 探索キャッシュは `ImageLocator` が持ち、ここでは借用するだけです。
pub struct FrameResolver<'a, S, Y> {
    locator: &'a mut ImageLocator<S>,
    symbolizer: &'a Y,
    arch: &'a str,
}

impl<'a, S: IndexSearch, Y: Symbolizer> FrameResolver<'a, S, Y> {
    pub fn new(locator: &'a mut ImageLocator<S>, symbolizer: &'a Y, arch: &'a str) -> Self {
        Self {
            locator,
            symbolizer,
            arch,
        }
    }

    /// フレームを1行にする
    ///
    /// イメージやシンボルが見つからない場合もフレームは落とさず、アドレスだけの行にします。
    pub fn resolve(
        &mut self,
        index: usize,
        frame: &StackFrame,
        images: &[BinaryImage],
    ) -> Result<ResolvedFrame, LocateError> {
        let Some(image) = find_image(frame.pc, images) else {
            warn!(
                "no binary image contains {}, cannot determine source image",
                format_address(frame.pc)
            );
            return Ok(ResolvedFrame {
                index,
                image_name: UNKNOWN_IMAGE.to_string(),
                pc: frame.pc,
                symbol: String::new(),
            });
        };

        let symbol = match self.locator.locate(image)? {
            Some(path) => self.symbolize(&path, image.base_address, frame.pc),
            None => String::new(),
        };

        Ok(ResolvedFrame {
            index,
            image_name: image.file_name().to_string(),
            pc: frame.pc,
            symbol,
        })
    }

    /// 外部のシンボル化を呼び出す
    ///
    /// アドレスがそのまま返ってきた場合はシンボルが見つからなかったものとして空にします。
    fn symbolize(&self, path: &std::path::Path, load_address: u64, pc: u64) -> String {
        match self.symbolizer.symbolize(self.arch, path, load_address, pc) {
            Ok(symbol) if symbol == format_address(pc) => String::new(),
            Ok(symbol) => symbol,
            Err(e) => {
                warn!("symbolication of {} failed: {:#}", format_address(pc), e);
                String::new()
            }
        }
    }
}
