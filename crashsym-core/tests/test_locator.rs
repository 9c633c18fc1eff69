//! シンボルファイル探索とフレームのシンボル化のテスト

mod common;

use common::{image, FakeSearch, FakeSymbolizer, APP_UUID, APP_UUID_STR, LIB_UUID};
use crashsym_core::{canonicalize, FrameResolver, ImageLocator, LocateError, LocatorConfig};
use crashsym_report::StackFrame;
use std::fs::{self, File};
use std::path::PathBuf;

#[test]
fn test_search_runs_once_per_image() {
    let search = FakeSearch::default().with_dsym(APP_UUID_STR, "/dsyms/MyApp");
    let mut locator = ImageLocator::new(&search, LocatorConfig::default());
    let app = image(0x1000, 0x100, "/var/mobile/MyApp.app/MyApp", Some(APP_UUID));

    for _ in 0..10 {
        assert_eq!(
            locator.locate(&app).unwrap(),
            Some(PathBuf::from("/dsyms/MyApp"))
        );
    }
    assert_eq!(search.dsym_queries(), 1);
}

#[test]
fn test_not_found_is_cached() {
    let search = FakeSearch::default();
    let mut locator = ImageLocator::new(&search, LocatorConfig::default());
    let lib = image(0x2000, 0x200, "/usr/lib/libobjc.A.dylib", Some(LIB_UUID));

    assert_eq!(locator.cached(&lib.name), None);
    for _ in 0..5 {
        assert_eq!(locator.locate(&lib).unwrap(), None);
    }
    assert_eq!(search.dsym_queries(), 1);
    assert_eq!(locator.cached(&lib.name), Some(None));
}

#[test]
fn test_image_without_uuid_skips_search() {
    let search = FakeSearch::default();
    let mut locator = ImageLocator::new(&search, LocatorConfig::default());

    let anonymous = image(0x3000, 0x10, "/usr/lib/dyld", None);
    assert_eq!(locator.locate(&anonymous).unwrap(), None);
    assert_eq!(search.dsym_queries(), 0);

    // 長さの不正な UUID も見つからない扱い
    let mut odd = image(0x4000, 0x10, "/usr/lib/odd.dylib", None);
    odd.uuid = Some(vec![1, 2, 3]);
    assert_eq!(locator.locate(&odd).unwrap(), None);
    assert_eq!(search.dsym_queries(), 0);
}

#[test]
fn test_inserted_path_wins() {
    let search = FakeSearch::default().with_dsym(APP_UUID_STR, "/dsyms/MyApp");
    let mut locator = ImageLocator::new(&search, LocatorConfig::default());
    let app = image(0x1000, 0x100, "MyApp", Some(APP_UUID));

    locator.insert("MyApp", Some(PathBuf::from("/local/MyApp")));
    assert_eq!(
        locator.locate(&app).unwrap(),
        Some(PathBuf::from("/local/MyApp"))
    );
    assert_eq!(search.dsym_queries(), 0);
}

#[test]
fn test_os_symbols_dir_is_tried_first() {
    let tmp = tempfile::tempdir().unwrap();
    let symbols = tmp.path().join("Symbols");
    fs::create_dir_all(symbols.join("usr/lib")).unwrap();
    File::create(symbols.join("usr/lib/libobjc.A.dylib")).unwrap();
    File::create(symbols.join("UIKit")).unwrap();

    let search = FakeSearch::default();
    let config = LocatorConfig {
        os_symbols_dir: Some(symbols.clone()),
    };
    let mut locator = ImageLocator::new(&search, config);

    // デバイス上のパスをそのまま辿る
    let objc = image(0x2000, 0x200, "/usr/lib/libobjc.A.dylib", Some(LIB_UUID));
    assert_eq!(
        locator.locate(&objc).unwrap(),
        Some(symbols.join("usr/lib/libobjc.A.dylib"))
    );

    // ファイル名だけでも探す
    let uikit = image(
        0x3000,
        0x200,
        "/System/Library/Frameworks/UIKit.framework/UIKit",
        Some([0x33; 16]),
    );
    assert_eq!(locator.locate(&uikit).unwrap(), Some(symbols.join("UIKit")));

    assert_eq!(search.dsym_queries(), 0);
}

#[test]
fn test_dsym_search_result_is_expanded() {
    let tmp = tempfile::tempdir().unwrap();
    let dsym = tmp.path().join("MyApp.app.dSYM");
    let dwarf = dsym.join("Contents/Resources/DWARF");
    fs::create_dir_all(&dwarf).unwrap();
    File::create(dwarf.join("MyApp")).unwrap();

    let search = FakeSearch::default().with_dsym(APP_UUID_STR, dsym.to_str().unwrap());
    let mut locator = ImageLocator::new(&search, LocatorConfig::default());
    let app = image(0x1000, 0x100, "MyApp", Some(APP_UUID));

    assert_eq!(locator.locate(&app).unwrap(), Some(dwarf.join("MyApp")));
}

#[test]
fn test_empty_dsym_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let dsym = tmp.path().join("MyApp.app.dSYM");
    fs::create_dir_all(dsym.join("Contents/Resources/DWARF")).unwrap();

    let search = FakeSearch::default().with_dsym(APP_UUID_STR, dsym.to_str().unwrap());
    let mut locator = ImageLocator::new(&search, LocatorConfig::default());
    let app = image(0x1000, 0x100, "MyApp", Some(APP_UUID));

    assert!(matches!(
        locator.locate(&app),
        Err(LocateError::EmptyBundle(_))
    ));
}

#[test]
fn test_resolve_is_idempotent() {
    let search = FakeSearch::default().with_dsym(APP_UUID_STR, "/dsyms/MyApp");
    let symbolizer = FakeSymbolizer::default().with_symbol(0x1010, "main (in MyApp) (main.m:14)");
    let mut locator = ImageLocator::new(&search, LocatorConfig::default());
    let images = common::two_images();

    let mut resolver = FrameResolver::new(&mut locator, &symbolizer, "armv7");
    let frame = StackFrame { pc: 0x1010 };
    let first = resolver.resolve(0, &frame, &images).unwrap();
    let second = resolver.resolve(0, &frame, &images).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(first.symbol, "main (in MyApp) (main.m:14)");
    assert_eq!(search.dsym_queries(), 1);

    let calls = symbolizer.calls.borrow();
    assert_eq!(
        calls[0],
        ("armv7".to_string(), PathBuf::from("/dsyms/MyApp"), 0x1000, 0x1010)
    );
}

#[test]
fn test_echoed_address_is_suppressed() {
    let search = FakeSearch::default().with_dsym(APP_UUID_STR, "/dsyms/MyApp");
    // 表が空なのでアドレスがそのまま返る
    let symbolizer = FakeSymbolizer::default();
    let mut locator = ImageLocator::new(&search, LocatorConfig::default());
    let images = common::two_images();

    let mut resolver = FrameResolver::new(&mut locator, &symbolizer, "armv7");
    let line = resolver
        .resolve(0, &StackFrame { pc: 0x1020 }, &images)
        .unwrap();

    assert_eq!(symbolizer.calls.borrow().len(), 1);
    assert_eq!(line.symbol, "");
    assert!(!line.to_string().contains("0x00001020 0x00001020"));
    assert!(line.to_string().ends_with("0x00001020 "));
}

#[test]
fn test_address_outside_images() {
    let search = FakeSearch::default();
    let symbolizer = FakeSymbolizer::default();
    let mut locator = ImageLocator::new(&search, LocatorConfig::default());
    let images = common::two_images();

    let mut resolver = FrameResolver::new(&mut locator, &symbolizer, "armv7");
    let line = resolver
        .resolve(4, &StackFrame { pc: 0x9000 }, &images)
        .unwrap();

    assert_eq!(line.index, 4);
    assert_eq!(line.image_name, "???");
    assert_eq!(line.symbol, "");
    assert!(symbolizer.calls.borrow().is_empty());
    assert_eq!(search.dsym_queries(), 0);
}

#[test]
fn test_canonical_uuid_matches_fixture() {
    assert_eq!(canonicalize(&APP_UUID).unwrap(), APP_UUID_STR);
    assert_eq!(canonicalize(&LIB_UUID).unwrap(), "42424242-4242-4242-4242-424242424242");
}
