//! Dated JSON snapshot of one run, picked up by the warehouse load.

use crate::error::Result;
use crate::pipeline::EnrichedRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// `YT_data_2025-01-31.json`
pub fn snapshot_file_name(date: NaiveDate) -> String {
    format!("YT_data_{}.json", date.format("%Y-%m-%d"))
}

/// Write `records` to `output_dir/YT_data_{date}.json`, replacing any file
/// from an earlier run on the same day.
///
/// One JSON array, UTF-8, 4-space indent, non-ASCII text kept as-is. The
/// array is written to a `.tmp` sibling and renamed into place, so a failed
/// write leaves the previous snapshot untouched.
pub fn save_to_json(
    records: &[EnrichedRecord],
    output_dir: &Path,
    date: NaiveDate,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(snapshot_file_name(date));
    let tmp = path.with_extension("json.tmp");

    if let Err(err) = write_records(records, &tmp) {
        if let Err(cleanup) = fs::remove_file(&tmp) {
            debug!(path = %tmp.display(), %cleanup, "could not remove partial snapshot");
        }
        return Err(err);
    }
    fs::rename(&tmp, &path)?;

    info!(path = %path.display(), records = records.len(), "saved snapshot");
    Ok(path)
}

fn write_records(records: &[EnrichedRecord], path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    records.serialize(&mut serializer)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

/// Same as [`save_to_json`] with today's local date.
pub fn save_to_json_today(records: &[EnrichedRecord], output_dir: &Path) -> Result<PathBuf> {
    save_to_json(records, output_dir, chrono::Local::now().date_naive())
}

/// Read a snapshot written by [`save_to_json`].
pub fn load_json(path: &Path) -> Result<Vec<EnrichedRecord>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ItemId;
    use tempfile::tempdir;

    fn record(id: &str, title: &str, comments: Option<&str>) -> EnrichedRecord {
        EnrichedRecord {
            id: ItemId::from(id),
            title: title.to_string(),
            published_at: "2024-05-01T12:00:00Z".to_string(),
            duration: "PT21M4S".to_string(),
            view_count: Some("1200".to_string()),
            like_count: Some("30".to_string()),
            comment_count: comments.map(str::to_string),
        }
    }

    #[test]
    fn test_file_name() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 9).unwrap();
        assert_eq!(snapshot_file_name(date), "YT_data_2025-01-09.json");
    }

    #[test]
    fn test_writes_pretty_unescaped_array() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("data");
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let records = vec![
            record("abc", "Ich habe 100 Tage überlebt 🚀", Some("12")),
            record("def", "plain", None),
        ];

        let path = save_to_json(&records, &out, date).unwrap();
        assert_eq!(path, out.join("YT_data_2025-03-14.json"));

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n    {\n        \"video_id\": \"abc\""));
        assert!(text.contains("überlebt 🚀"));
        assert!(text.contains("\"commentCount\": null"));

        assert_eq!(load_json(&path).unwrap(), records);
    }

    #[test]
    fn test_same_day_overwrites() {
        let dir = tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        save_to_json(&[record("a", "a", None), record("b", "b", None)], dir.path(), date).unwrap();
        let path = save_to_json(&[record("c", "c", None)], dir.path(), date).unwrap();
        assert_eq!(load_json(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        save_to_json(&[record("a", "a", None)], dir.path(), date).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["YT_data_2025-03-14.json"]);
    }

    #[test]
    fn test_failed_write_keeps_previous_snapshot() {
        let dir = tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let path = save_to_json(&[record("a", "a", None)], dir.path(), date).unwrap();

        // a directory squatting on the temp path makes the next write fail
        fs::create_dir(dir.path().join("YT_data_2025-03-14.json.tmp")).unwrap();
        assert!(save_to_json(&[record("b", "b", None)], dir.path(), date).is_err());

        let saved = load_json(&path).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id.as_str(), "a");
    }

    #[test]
    fn test_empty_run() {
        let dir = tempdir().unwrap();
        let path = save_to_json_today(&[], dir.path()).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "[]");
    }
}
