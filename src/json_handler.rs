use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::trace;
use serde::Deserialize;

use crate::errors::Error;
use crate::purchase_engine::AggregateRow;

/// One purchase event. Unknown fields in the batch data (purchase dates,
/// item prices) are ignored.
#[derive(Debug, Deserialize)]
pub struct Transaction {
    pub customer_id: String,
    pub basket: Vec<BasketItem>,
}

#[derive(Debug, Deserialize)]
pub struct BasketItem {
    pub product_id: String,
}

/// Collects batch files sitting exactly two levels below `root`
/// (root, then subdirectory, then files), keeping only names with the given
/// extension. Files directly under `root` and anything nested deeper are never
/// considered. Both levels are visited in lexicographic order so repeated runs
/// see the same sequence.
pub fn discover_batch_files(root: &Path, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut subdirs: Vec<PathBuf> = fs::read_dir(root)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    subdirs.sort();

    let mut files = Vec::new();
    for subdir in subdirs {
        let mut batch: Vec<PathBuf> = fs::read_dir(&subdir)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some(extension)
            })
            .collect();
        batch.sort();
        files.append(&mut batch);
    }
    Ok(files)
}

/// Parses one batch file as newline-delimited JSON, one transaction per line.
/// The first undecodable line aborts the load.
pub fn load_transaction_file(path: &Path) -> Result<Vec<Transaction>, Error> {
    let reader = BufReader::new(File::open(path)?);
    let mut transactions = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let transaction =
            serde_json::from_str(&line).map_err(|source| Error::MalformedRecord {
                path: path.to_path_buf(),
                line: index + 1,
                source,
            })?;
        transactions.push(transaction);
    }
    trace!("Loaded {} transactions from {}.", transactions.len(), path.display());
    Ok(transactions)
}

/// Writes the report as newline-delimited JSON, replacing any previous content
/// at the destination.
pub fn write_report(
    path: &Path,
    rows: impl IntoIterator<Item = AggregateRow>,
) -> Result<(), Error> {
    let mut writer = BufWriter::new(File::create(path)?);
    for row in rows {
        let json = serde_json::to_string(&row)?;
        writeln!(writer, "{}", json)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path, content: &str) {
        fs::write(path, content).expect("Failed to write fixture file");
    }

    #[test]
    fn test_discovery_two_levels_only() {
        let root = tempfile::tempdir().expect("Failed to create temporary directory");
        let sub = root.path().join("day1");
        let nested = sub.join("nested");
        fs::create_dir_all(&nested).unwrap();

        touch(&root.path().join("top.json"), "{}");
        touch(&sub.join("batch.json"), "{}");
        touch(&sub.join("notes.txt"), "not a batch");
        touch(&nested.join("deep.json"), "{}");

        let files = discover_batch_files(root.path(), "json").unwrap();
        assert_eq!(files, vec![sub.join("batch.json")]);
    }

    #[test]
    fn test_discovery_is_lexicographic() {
        let root = tempfile::tempdir().expect("Failed to create temporary directory");
        for dir in ["d2", "d1"] {
            fs::create_dir(root.path().join(dir)).unwrap();
        }
        touch(&root.path().join("d2").join("a.json"), "{}");
        touch(&root.path().join("d1").join("b.json"), "{}");
        touch(&root.path().join("d1").join("a.json"), "{}");

        let files = discover_batch_files(root.path(), "json").unwrap();
        assert_eq!(
            files,
            vec![
                root.path().join("d1").join("a.json"),
                root.path().join("d1").join("b.json"),
                root.path().join("d2").join("a.json"),
            ]
        );
    }

    #[test]
    fn test_load_transaction_file_ignores_extra_fields() {
        let root = tempfile::tempdir().expect("Failed to create temporary directory");
        let path = root.path().join("batch.json");
        touch(
            &path,
            concat!(
                r#"{"customer_id": "C1", "basket": [{"product_id": "P1", "price": 10}], "date_of_purchase": "2018-12-01"}"#,
                "\n",
                r#"{"customer_id": "C2", "basket": []}"#,
                "\n",
            ),
        );

        let transactions = load_transaction_file(&path).unwrap();
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].customer_id, "C1");
        assert_eq!(transactions[0].basket[0].product_id, "P1");
        assert!(transactions[1].basket.is_empty());
    }

    #[test]
    fn test_load_transaction_file_reports_malformed_line() {
        let root = tempfile::tempdir().expect("Failed to create temporary directory");
        let path = root.path().join("batch.json");
        touch(
            &path,
            concat!(
                r#"{"customer_id": "C1", "basket": [{"product_id": "P1"}]}"#,
                "\n",
                "not json\n",
            ),
        );

        let error = load_transaction_file(&path).unwrap_err();
        match error {
            Error::MalformedRecord { line, .. } => assert_eq!(line, 2),
            other => panic!("Expected a malformed record error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_transaction_file_requires_basket_field() {
        let root = tempfile::tempdir().expect("Failed to create temporary directory");
        let path = root.path().join("batch.json");
        touch(&path, "{\"customer_id\": \"C1\"}\n");

        assert!(load_transaction_file(&path).is_err());
    }

    #[test]
    fn test_write_report_truncates_previous_content() {
        let root = tempfile::tempdir().expect("Failed to create temporary directory");
        let path = root.path().join("output.json");

        let row = |customer_id: &str| AggregateRow {
            customer_id: customer_id.to_owned(),
            loyalty_score: "5".to_owned(),
            product_id: "P1".to_owned(),
            product_category: "house".to_owned(),
            purchase_count: 1,
        };

        write_report(&path, vec![row("C1"), row("C2")]).unwrap();
        write_report(&path, vec![row("C3")]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("\"customer_id\":\"C3\""));
        assert!(content.ends_with('\n'));
    }
}
