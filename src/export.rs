use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use tracing::info;

use crate::models::{MAX_IMAGES, ProductRecord};
use crate::utils::error::Result;

/// File name of the export inside the configured CSV directory.
pub const CSV_FILE_NAME: &str = "shoes.csv";

/// Fixed column order of the export.
pub const CSV_HEADER: [&str; 10] = [
    "shoe_name",
    "shoe_id",
    "price",
    "discount",
    "color_code",
    "image1",
    "image2",
    "image3",
    "image4",
    "image5",
];

/// Write the catalog as one fixed-header CSV, one row per record.
/// Missing fields and unfilled image slots render as empty strings.
pub fn write_catalog<W: Write>(writer: W, records: &[ProductRecord]) -> Result<()> {
    let mut csv = WriterBuilder::new().from_writer(writer);
    csv.write_record(CSV_HEADER)?;

    for record in records {
        let mut row = vec![
            record.shoe_name.as_str(),
            record.shoe_id.as_str(),
            record.price.as_str(),
            record.discount.as_str(),
            record.color_code.as_str(),
        ];
        for slot in 0..MAX_IMAGES {
            row.push(record.image(slot));
        }
        csv.write_record(&row)?;
    }

    csv.flush()?;
    Ok(())
}

/// Write the catalog into `dir/shoes.csv`, creating the directory on
/// demand, and return the file's path.
pub fn export_catalog(dir: &Path, records: &[ProductRecord]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(CSV_FILE_NAME);
    let file = File::create(&path)?;
    write_catalog(file, records)?;

    info!(path = %path.display(), rows = records.len(), "catalog exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn full_record() -> ProductRecord {
        ProductRecord {
            shoe_name: "Trail Runner II".to_string(),
            shoe_id: "GS-1021".to_string(),
            price: "2,500".to_string(),
            discount: "20%".to_string(),
            color_code: "BLK-04".to_string(),
            images: (1..=5)
                .map(|n| format!("images/GS-1021/image{n}.jpg"))
                .collect(),
        }
    }

    fn partial_record() -> ProductRecord {
        ProductRecord {
            shoe_name: "Court Classic".to_string(),
            shoe_id: "GS-88".to_string(),
            price: "1,800".to_string(),
            discount: String::new(),
            color_code: "WHT-01".to_string(),
            // Only 3 of 5 image slots populated.
            images: vec![
                "images/GS-88/image1.png".to_string(),
                "images/GS-88/image2.jpg".to_string(),
                "images/GS-88/image3.jpg".to_string(),
            ],
        }
    }

    fn parse_rows(buffer: &[u8]) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(buffer);
        let header = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect();
        let rows = reader
            .records()
            .map(|row| row.unwrap().iter().map(str::to_string).collect())
            .collect();
        (header, rows)
    }

    #[test]
    fn test_header_matches_fixed_column_order() {
        let mut buffer = Vec::new();
        write_catalog(&mut buffer, &[full_record(), partial_record()]).unwrap();

        let (header, rows) = parse_rows(&buffer);
        assert_eq!(header, CSV_HEADER);
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.len(), CSV_HEADER.len());
        }
        assert_eq!(rows[0][0], "Trail Runner II");
        assert_eq!(rows[0][2], "2,500");
    }

    #[test]
    fn test_partial_record_pads_image_columns() {
        let mut buffer = Vec::new();
        write_catalog(&mut buffer, &[partial_record()]).unwrap();

        let (_, rows) = parse_rows(&buffer);
        let row = &rows[0];

        assert_eq!(row.len(), CSV_HEADER.len());
        assert_eq!(row[3], ""); // discount never found
        assert_eq!(row[5], "images/GS-88/image1.png");
        assert_eq!(row[7], "images/GS-88/image3.jpg");
        assert_eq!(row[8], "");
        assert_eq!(row[9], "");
    }

    #[test]
    fn test_export_creates_directory_and_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested/exports");

        let path = export_catalog(&target, &[full_record()]).unwrap();
        assert_eq!(path, target.join(CSV_FILE_NAME));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("shoe_name,"));
        assert!(content.contains("Trail Runner II,GS-1021,\"2,500\""));
    }

    #[test]
    fn test_empty_catalog_writes_header_only() {
        let mut buffer = Vec::new();
        write_catalog(&mut buffer, &[]).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output.lines().count(), 1);
    }
}
