use crate::error::{PipelineError, Result};
use crate::residues::ResidueExt;
use flate2::read::GzDecoder;
use pdbtbx::{ErrorLevel, StrictnessLevel, PDB};
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Open a structure file with [`pdbtbx::ReadOptions`], keep the first model and remove
/// non-amino-acid residues.
///
/// Warnings of the reader are logged; breaking errors are returned.
pub fn load_model(input_file: &Path) -> Result<PDB> {
    if !input_file.exists() {
        return Err(PipelineError::MissingInput(input_file.to_path_buf()));
    }
    let (mut pdb, errors) = pdbtbx::ReadOptions::default()
        .set_only_atomic_coords(true)
        .set_only_first_model(true)
        .set_level(StrictnessLevel::Loose)
        .read(input_file.to_string_lossy())
        .map_err(|errors| PipelineError::Structure {
            path: input_file.to_path_buf(),
            message: errors
                .iter()
                .map(|e| e.short_description().to_string())
                .collect::<Vec<String>>()
                .join("; "),
        })?;
    errors.iter().for_each(|e| match e.level() {
        ErrorLevel::BreakingError | ErrorLevel::InvalidatingError => warn!("{e}"),
        _ => debug!("{e}"),
    });

    // Remove non-protein residues from model
    pdb.remove_residues_by(|res| res.resn().is_none());

    Ok(pdb)
}

/// Round to 4 decimal digits, ties away from zero.
pub fn round4(value: f64) -> f64 {
    (value * 1e4).round() / 1e4
}

/// Render a real the way every table column expects it (`1.0`, `0.0001`, `360.0`).
pub fn fmt_real(value: f64) -> String {
    format!("{value:?}")
}

/// Round to 4 decimals and render; non-finite values become an empty field.
pub fn fmt_round4(value: f64) -> String {
    if value.is_finite() {
        fmt_real(round4(value))
    } else {
        String::new()
    }
}

/// Open a text file for line-wise reading, decompressing when the name ends in `.gz`.
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let is_gz = path.extension().is_some_and(|ext| ext == "gz");
    if is_gz {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Sub-directories of `path` sorted by name. A missing folder yields an empty list.
pub fn sub_dirs(path: &Path) -> Result<Vec<PathBuf>> {
    list_dir(path, true)
}

/// Regular files inside `path` sorted by name. A missing folder yields an empty list.
pub fn dir_files(path: &Path) -> Result<Vec<PathBuf>> {
    list_dir(path, false)
}

fn list_dir(path: &Path, dirs: bool) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(Vec::new());
    }
    let mut entries = std::fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir() == dirs)
        .collect::<Vec<PathBuf>>();
    entries.sort();
    Ok(entries)
}

/// File or directory name as an owned string.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Build a DataFrame of string columns from a header and row-major values.
///
/// Empty strings are stored as nulls so that they are written as empty fields.
/// Rows shorter than the header are padded with empty fields.
pub fn rows_to_df(header: &[String], rows: &[Vec<String>]) -> Result<DataFrame> {
    let columns = header
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let values = rows
                .iter()
                .map(|row| row.get(i).map(String::as_str).filter(|v| !v.is_empty()))
                .collect::<Vec<Option<&str>>>();
            Column::from(Series::new(name.as_str().into(), values))
        })
        .collect::<Vec<Column>>();
    Ok(DataFrame::new(columns)?)
}

/// Header and row-major string values of a DataFrame. Nulls become empty strings.
pub fn df_to_rows(df: &DataFrame) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let header = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<String>>();
    let mut rows = vec![Vec::with_capacity(header.len()); df.height()];
    for column in df.get_columns() {
        let series = column.as_materialized_series().cast(&DataType::String)?;
        for (row, value) in rows.iter_mut().zip(series.str()?.into_iter()) {
            row.push(value.unwrap_or("").to_string());
        }
    }
    Ok((header, rows))
}

/// Write a DataFrame as tab-separated text with a header row.
pub fn write_tsv(df: &mut DataFrame, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(file_path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b'\t')
        .finish(df)?;
    Ok(())
}

/// Convenience wrapper around [`rows_to_df`] and [`write_tsv`].
pub fn write_rows(file_path: &Path, header: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut df = rows_to_df(header, rows)?;
    write_tsv(&mut df, file_path)
}

/// Read a tab-separated table with a header row; every column is read as text.
pub fn read_tsv(file_path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_separator(b'\t').with_missing_is_null(false))
        .try_into_reader_with_file_path(Some(file_path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Read a tab-separated table straight into rows.
pub fn read_rows(file_path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let df = read_tsv(file_path)?;
    df_to_rows(&df)
}

/// Build a header from string literals.
pub fn header_of(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn round4_ties_away_from_zero() {
        assert_eq!(round4(0.00005), 0.0001);
        assert_eq!(round4(-0.00005), -0.0001);
        assert_eq!(round4(1.23456), 1.2346);
        assert_eq!(round4(-1.23454), -1.2345);
    }

    #[test]
    fn round4_is_idempotent() {
        for x in [0.123456, -7.77775, 359.99999, 1e-7, 42.0, -0.00015] {
            assert_eq!(round4(round4(x)), round4(x));
        }
    }

    #[test]
    fn real_formatting() {
        assert_eq!(fmt_real(1.0), "1.0");
        assert_eq!(fmt_real(360.0), "360.0");
        assert_eq!(fmt_real(0.0001), "0.0001");
        assert_eq!(fmt_round4(f64::INFINITY), "");
        assert_eq!(fmt_round4(f64::NAN), "");
        assert_eq!(fmt_round4(2.0 / 3.0), "0.6667");
    }

    #[test]
    fn tsv_keeps_empty_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("table.tsv");
        let header = header_of(&["pdb", "score", "smiles"]);
        let rows = vec![
            vec!["1owh".to_string(), "0.87".to_string(), "CCO".to_string()],
            vec!["2hb1".to_string(), String::new(), "c1ccccc1".to_string()],
        ];
        write_rows(&path, &header, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().next().unwrap(), "pdb\tscore\tsmiles");
        assert_eq!(text.lines().nth(2).unwrap(), "2hb1\t\tc1ccccc1");

        let (read_header, read_back) = read_rows(&path).unwrap();
        assert_eq!(read_header, header);
        assert_eq!(read_back, rows);
    }

    #[test]
    fn numeric_looking_columns_stay_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.tsv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "pdb\tmin_res").unwrap();
        writeln!(f, "1owh\t1.50").unwrap();
        drop(f);

        let (_, rows) = read_rows(&path).unwrap();
        assert_eq!(rows[0][1], "1.50");
    }

    #[test]
    fn gz_and_plain_text_are_both_readable() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("a.txt");
        std::fs::write(&plain, "first\nsecond\n").unwrap();

        let gz = dir.path().join("a.txt.gz");
        let mut enc = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        enc.write_all(b"first\nsecond\n").unwrap();
        enc.finish().unwrap();

        for path in [plain, gz] {
            let lines: Vec<String> = open_text(&path).unwrap().lines().map_while(|l| l.ok()).collect();
            assert_eq!(lines, vec!["first", "second"]);
        }
    }

    #[test]
    fn load_model_keeps_amino_acids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1abc_protein.pdb");
        std::fs::write(&path, crate::structure::tests::TRIPEPTIDE_PDB).unwrap();

        let pdb = load_model(&path).unwrap();
        assert_eq!(pdb.residue_count(), 3);
        assert!(matches!(
            load_model(&dir.path().join("missing.pdb")),
            Err(PipelineError::MissingInput(_))
        ));
    }

    #[test]
    fn directory_listing_is_sorted_and_split() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        std::fs::write(dir.path().join("z.txt"), "").unwrap();

        let dirs: Vec<String> = sub_dirs(dir.path()).unwrap().iter().map(|p| file_name(p)).collect();
        assert_eq!(dirs, vec!["a", "b"]);
        assert_eq!(dir_files(dir.path()).unwrap().len(), 1);
        assert!(sub_dirs(&dir.path().join("missing")).unwrap().is_empty());
    }
}
