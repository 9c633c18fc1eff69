//! 改ざん（脱獄）環境の検出

use crate::Result;
use crashsym_report::BinaryImage;
use regex::Regex;

/// ロード済みイメージ名から脱獄環境の痕跡を探す検出器
pub struct TamperDetector {
    patterns: Vec<Regex>,
}

impl TamperDetector {
    /// 既定のパターンで検出器を作成する
    pub fn new() -> Result<Self> {
        Self::with_patterns(&[
            // Cydia Substrate 本体
            r"CydiaSubstrate\.framework",
            // 旧名 MobileSubstrate とそのフック用 dylib
            r"MobileSubstrate\.dylib",
            r"^/Library/MobileSubstrate/DynamicLibraries/",
        ])
    }

    /// 任意のパターンで検出器を作成する
    pub fn with_patterns(patterns: &[&str]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// イメージ名がいずれかのパターンに一致するか
    pub fn is_indicator(&self, image_name: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(image_name))
    }

    /// いずれかのイメージが痕跡を含むか
    pub fn is_tampered(&self, images: &[BinaryImage]) -> bool {
        images.iter().any(|image| self.is_indicator(&image.name))
    }
}
