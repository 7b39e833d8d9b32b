//! Download lists for cross-reference, sequence and secondary-structure files, and a
//! best-effort `wget` call to fetch them.

use crate::catalog::StructureRecord;
use crate::error::Result;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info, warn};

/// Remote file kinds that can be listed for a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlTemplate {
    /// Residue-level cross-references, one file per structure
    Sifts,
    /// Canonical protein sequence, one file per accession
    Fasta,
    /// Precomputed secondary structure, one file per structure
    Dssp,
}

impl UrlTemplate {
    pub fn url(&self, record: &StructureRecord) -> String {
        match self {
            UrlTemplate::Sifts => format!(
                "http://ftp.ebi.ac.uk/pub/databases/msd/sifts/xml/{}.xml.gz",
                record.structure_id
            ),
            UrlTemplate::Fasta => {
                format!("http://www.uniprot.org/uniprot/{}.fasta", record.uniprot)
            }
            UrlTemplate::Dssp => {
                let id = record.structure_id.to_lowercase();
                let hash = id.get(1..3).unwrap_or_default();
                format!("http://files.rcsb.org/dssp/{hash}/{id}/{id}.dssp.gz")
            }
        }
    }
}

/// Write one URL per line.
pub fn write_url_list(path: &Path, urls: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut content = urls.join("\n");
    content.push('\n');
    std::fs::write(path, content)?;
    Ok(())
}

/// Arguments passed to `wget` for a URL list.
pub fn wget_args(url_list: &Path, output_dir: &Path) -> Vec<String> {
    [
        "--quiet",
        "--no-clobber",
        "--retry-connrefused",
        "--waitretry=1",
        "--read-timeout=60",
        "--timeout=60",
        "-t",
        "0",
        "-i",
    ]
    .iter()
    .map(|s| s.to_string())
    .chain([
        url_list.to_string_lossy().to_string(),
        "-P".to_string(),
        output_dir.to_string_lossy().to_string(),
    ])
    .collect()
}

/// Fetch every URL of `url_list` into `output_dir` and wait for `wget` to exit.
///
/// The returned status is a message for the log; a failing or missing `wget` is not
/// an error for the pipeline.
pub fn download_all(url_list: &Path, output_dir: &Path, label: &str) -> String {
    let args = wget_args(url_list, output_dir);
    debug!("wget {}", args.join(" "));

    let status = match Command::new("wget").args(&args).status() {
        Ok(status) if status.success() => format!("{label} download success"),
        Ok(status) => {
            warn!("wget exited with {status}");
            format!("{label} download failure")
        }
        Err(e) => {
            warn!("Could not run wget: {e}");
            format!("{label} download failure")
        }
    };
    info!("{status}");
    status
}
