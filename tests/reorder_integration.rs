//! Integration tests for local reorder, extract and info, driven by a fake
//! GRIB tool instead of the real wgrib2 binary.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use aonui_core::grib::extract_temp_prefix;
use aonui_core::inventory::short_lines;
use aonui_core::{
    GribError, GribTool, InventoryItem, TemporaryFileSet, collate_info, extract_binary, reorder_composite,
};
use async_trait::async_trait;
use tempfile::TempDir;

/// Five 4-byte records. Record 3 is a surface field, so Tawhiri drops it.
const INVENTORY: &str = "\
1:0:d=2014110100:UGRD:850 mb:6 hour fcst:
2:4:d=2014110100:HGT:1000 mb:6 hour fcst:
3:8:d=2014110100:TMP:2 m above ground:6 hour fcst:
4:12:d=2014110100:HGT:850 mb:anl:
5:16:d=2014110100:VGRD:850 mb:6 hour fcst:
";

const COMPOSITE: &[u8] = b"AAAABBBBCCCCDDDDEEEE";

/// Serves [`INVENTORY`] for any file and records what it was asked to expand.
#[derive(Default)]
struct FakeTool {
    expanded: Mutex<Vec<(Vec<String>, PathBuf, Vec<u8>)>>,
}

#[async_trait]
impl GribTool for FakeTool {
    async fn short_inventory(&self, _path: &Path) -> Result<String, GribError> {
        Ok(INVENTORY.to_string())
    }

    async fn grid_listing(&self, items: &[&InventoryItem], _input: &Path) -> Result<String, GribError> {
        Ok(items
            .iter()
            .map(|item| format!("{}:{}:(720 x 361)\n", item.record_number, item.offset))
            .collect())
    }

    async fn expand(&self, items: &[&InventoryItem], input: &Path, output: &Path) -> Result<(), GribError> {
        let input_bytes = std::fs::read(input).map_err(|e| GribError::io(input, e))?;
        let lines = short_lines(items.iter().copied());
        std::fs::write(output, lines.join("\n")).map_err(|e| GribError::io(output, e))?;
        self.expanded
            .lock()
            .expect("lock")
            .push((lines, input.to_path_buf(), input_bytes));
        Ok(())
    }
}

fn write_composite(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("gfs.2014110100.grib2");
    std::fs::write(&path, COMPOSITE).expect("write composite");
    path
}

#[tokio::test]
async fn test_reorder_copies_valid_records_in_tawhiri_order() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_composite(&dir);
    let dest = dir.path().join("ordered.grib2");

    let rebased = reorder_composite(&FakeTool::default(), &source, &dest)
        .await
        .expect("reorder succeeds");

    // anl first, then 6 hour: 1000 mb before 850 mb, UGRD before VGRD.
    assert_eq!(std::fs::read(&dest).expect("dest exists"), b"DDDDBBBBAAAAEEEE");

    let numbers: Vec<u32> = rebased.iter().map(|i| i.record_number).collect();
    let offsets: Vec<u64> = rebased.iter().map(|i| i.offset).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
    assert_eq!(offsets, vec![0, 4, 8, 12]);
    assert!(rebased.iter().all(|i| i.extent == 4));
    assert_eq!(rebased[0].parameters, vec!["HGT".to_string()]);
    assert_eq!(rebased[0].type_name, "anl");
}

#[tokio::test]
async fn test_reorder_source_shorter_than_inventory_fails() {
    let dir = TempDir::new().expect("temp dir");
    let source = dir.path().join("short.grib2");
    std::fs::write(&source, b"AAAABBBB").expect("write");

    let err = reorder_composite(&FakeTool::default(), &source, &dir.path().join("out.grib2"))
        .await
        .expect_err("inventory claims more bytes than the file holds");

    // The file length feeds the last extent, so a short file leaves offsets
    // past its end.
    assert!(matches!(
        err,
        GribError::Inventory(_) | GribError::ShortRecord { .. }
    ));
}

#[tokio::test]
async fn test_extract_expands_reordered_composite_and_removes_temp_file() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_composite(&dir);
    let dest = dir.path().join("gfs.2014110100.bin");
    let temp_files = TemporaryFileSet::new(dir.path(), extract_temp_prefix(&dest));
    let tool = FakeTool::default();

    extract_binary(&tool, &source, &dest, &temp_files)
        .await
        .expect("extract succeeds");

    let expanded = tool.expanded.lock().expect("lock");
    assert_eq!(expanded.len(), 1);
    let (lines, input, input_bytes) = &expanded[0];
    assert_eq!(
        lines,
        &vec![
            "1:0:d=2014110100:HGT:850 mb:anl:".to_string(),
            "2:4:d=2014110100:HGT:1000 mb:6 hour fcst:".to_string(),
            "3:8:d=2014110100:UGRD:850 mb:6 hour fcst:".to_string(),
            "4:12:d=2014110100:VGRD:850 mb:6 hour fcst:".to_string(),
        ]
    );
    assert!(
        input
            .file_name()
            .expect("file name")
            .to_string_lossy()
            .starts_with("gfs.2014110100.bin.reordered.grib2.")
    );
    assert_eq!(input_bytes.as_slice(), b"DDDDBBBBAAAAEEEE");

    assert!(!input.exists(), "temporary composite should be removed");
    assert!(temp_files.is_empty());
    assert!(dest.exists());
}

#[tokio::test]
async fn test_extract_refuses_existing_output() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_composite(&dir);
    let dest = dir.path().join("out.bin");
    std::fs::write(&dest, b"keep me").expect("seed output");
    let temp_files = TemporaryFileSet::new(dir.path(), extract_temp_prefix(&dest));
    let tool = FakeTool::default();

    let err = extract_binary(&tool, &source, &dest, &temp_files)
        .await
        .expect_err("output exists");

    assert!(matches!(err, GribError::OutputExists { .. }));
    assert_eq!(std::fs::read(&dest).expect("still there"), b"keep me");
    assert!(tool.expanded.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn test_info_collates_tawhiri_dimensions() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_composite(&dir);

    let info = collate_info(&FakeTool::default(), &source)
        .await
        .expect("info succeeds");

    assert_eq!(info.width, 720);
    assert_eq!(info.height, 361);
    assert_eq!(info.forecast_hours, vec![0, 6]);
    assert_eq!(info.pressures, vec![1000, 850]);
    assert_eq!(
        info.parameters,
        vec!["HGT".to_string(), "UGRD".to_string(), "VGRD".to_string()]
    );
    assert_eq!(info.run_time.format("%Y%m%d%H").to_string(), "2014110100");
}
