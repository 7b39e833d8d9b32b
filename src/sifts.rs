//! Residue-level cross-references between structure numbering, canonical protein
//! numbering and the deposited sequence, read from compressed SIFTS XML.

use crate::error::Result;
use crate::utils::open_text;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;
use std::path::Path;

/// Mapping of one residue across the three numbering schemes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResidueCrossReference {
    pub structure_id: String,
    pub chain_id: String,
    /// Three-letter residue name in the structure
    pub structure_res_name: String,
    /// Author residue number in the structure, `null` when unobserved
    pub structure_res_num: String,
    /// One-letter residue name in the canonical sequence
    pub canonical_res_name: String,
    pub canonical_pos: String,
    pub canonical_accession: String,
    /// Residue name in the deposited sequence
    pub natural_res_name: String,
    pub natural_pos: String,
}

impl ResidueCrossReference {
    /// Whether the residue is mapped onto a canonical sequence.
    pub fn has_canonical(&self) -> bool {
        !self.canonical_accession.is_empty() && self.canonical_accession != "null"
    }
}

/// Cross-references of every protein entity in a (possibly gzipped) SIFTS file.
pub fn read_cross_references(path: &Path) -> Result<Vec<ResidueCrossReference>> {
    parse_cross_references(open_text(path)?)
}

/// Parse SIFTS XML. Residues of non-protein entities are ignored.
pub fn parse_cross_references(reader: impl BufRead) -> Result<Vec<ResidueCrossReference>> {
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.trim_text(true);

    let mut residues = Vec::new();
    let mut in_protein = false;
    let mut current: Option<ResidueCrossReference> = None;
    let mut buf = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"entity" => in_protein = attr(e, b"type").as_deref() == Some("protein"),
                b"residue" if in_protein => current = Some(start_residue(e)),
                b"crossRefDb" => {
                    if let Some(res) = current.as_mut() {
                        apply_cross_ref(res, e);
                    }
                }
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"residue" if in_protein => residues.push(start_residue(e)),
                b"crossRefDb" => {
                    if let Some(res) = current.as_mut() {
                        apply_cross_ref(res, e);
                    }
                }
                _ => {}
            },
            Event::End(ref e) => match e.local_name().as_ref() {
                b"entity" => in_protein = false,
                b"residue" => residues.extend(current.take()),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(residues)
}

fn start_residue(e: &BytesStart) -> ResidueCrossReference {
    ResidueCrossReference {
        natural_pos: attr(e, b"dbResNum").unwrap_or_default(),
        natural_res_name: attr(e, b"dbResName").unwrap_or_default(),
        ..Default::default()
    }
}

fn apply_cross_ref(res: &mut ResidueCrossReference, e: &BytesStart) {
    match attr(e, b"dbSource").as_deref() {
        Some("PDB") => {
            res.structure_id = attr(e, b"dbAccessionId").unwrap_or_default();
            res.structure_res_num = attr(e, b"dbResNum").unwrap_or_default();
            res.structure_res_name = attr(e, b"dbResName").unwrap_or_default();
            res.chain_id = attr(e, b"dbChainId").unwrap_or_default();
        }
        Some("UniProt") => {
            res.canonical_accession = attr(e, b"dbAccessionId").unwrap_or_default();
            res.canonical_pos = attr(e, b"dbResNum").unwrap_or_default();
            res.canonical_res_name = attr(e, b"dbResName").unwrap_or_default();
        }
        _ => {}
    }
}

fn attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SIFTS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<entry xmlns="http://www.ebi.ac.uk/pdbe/docs/sifts/eFamily.xsd" dbSource="PDBe" dbAccessionId="1abc">
  <entity type="protein" entityId="A">
    <segment segId="1abc_A_1_3" start="1" end="3">
      <listResidue>
        <residue dbSource="PDBe" dbCoordSys="PDBe" dbResNum="1" dbResName="GLY">
          <crossRefDb dbSource="PDB" dbCoordSys="PDBresnum" dbAccessionId="1abc" dbResNum="1" dbResName="GLY" dbChainId="A"/>
          <crossRefDb dbSource="UniProt" dbCoordSys="UniProt" dbAccessionId="P12345" dbResNum="91" dbResName="G"/>
          <residueDetail dbSource="PDBe" property="Annotation">Observed</residueDetail>
        </residue>
        <residue dbSource="PDBe" dbCoordSys="PDBe" dbResNum="2" dbResName="GLY">
          <crossRefDb dbSource="PDB" dbCoordSys="PDBresnum" dbAccessionId="1abc" dbResNum="2" dbResName="GLY" dbChainId="A"/>
          <crossRefDb dbSource="UniProt" dbCoordSys="UniProt" dbAccessionId="P12345" dbResNum="92" dbResName="G"/>
        </residue>
        <residue dbSource="PDBe" dbCoordSys="PDBe" dbResNum="3" dbResName="ALA">
          <crossRefDb dbSource="PDB" dbCoordSys="PDBresnum" dbAccessionId="1abc" dbResNum="3" dbResName="ALA" dbChainId="A"/>
          <crossRefDb dbSource="UniProt" dbCoordSys="UniProt" dbAccessionId="P12345" dbResNum="93" dbResName="A"/>
        </residue>
      </listResidue>
    </segment>
  </entity>
  <entity type="ligand" entityId="B">
    <segment segId="1abc_B_1_1" start="1" end="1">
      <listResidue>
        <residue dbSource="PDBe" dbCoordSys="PDBe" dbResNum="1" dbResName="HOH">
          <crossRefDb dbSource="PDB" dbCoordSys="PDBresnum" dbAccessionId="1abc" dbResNum="201" dbResName="HOH" dbChainId="B"/>
        </residue>
      </listResidue>
    </segment>
  </entity>
</entry>
"#;

    #[test]
    fn protein_residues_are_mapped() {
        let xrefs = parse_cross_references(SIFTS_XML.as_bytes()).unwrap();
        assert_eq!(xrefs.len(), 3);

        let second = &xrefs[1];
        assert_eq!(second.structure_id, "1abc");
        assert_eq!(second.chain_id, "A");
        assert_eq!(second.structure_res_name, "GLY");
        assert_eq!(second.structure_res_num, "2");
        assert_eq!(second.canonical_res_name, "G");
        assert_eq!(second.canonical_pos, "92");
        assert_eq!(second.canonical_accession, "P12345");
        assert_eq!(second.natural_res_name, "GLY");
        assert_eq!(second.natural_pos, "2");
        assert!(second.has_canonical());
    }

    #[test]
    fn unmapped_residues_have_no_canonical() {
        let xml = r#"<entry><entity type="protein"><residue dbResNum="5" dbResName="LYS">
            <crossRefDb dbSource="PDB" dbAccessionId="2xyz" dbResNum="null" dbResName="LYS" dbChainId="A"/>
            <crossRefDb dbSource="UniProt" dbAccessionId="null" dbResNum="5" dbResName="K"/>
            </residue><residue dbResNum="6" dbResName="GLY"/></entity></entry>"#;
        let xrefs = parse_cross_references(xml.as_bytes()).unwrap();
        assert_eq!(xrefs.len(), 2);
        assert_eq!(xrefs[0].structure_res_num, "null");
        assert!(!xrefs[0].has_canonical());
        assert!(!xrefs[1].has_canonical());
        assert_eq!(xrefs[1].natural_pos, "6");
    }

    #[test]
    fn gzipped_file_is_read() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1abc.xml.gz");
        let mut enc = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
        enc.write_all(SIFTS_XML.as_bytes()).unwrap();
        enc.finish().unwrap();

        let xrefs = read_cross_references(&path).unwrap();
        assert_eq!(xrefs.len(), 3);
        assert_eq!(xrefs[2].canonical_pos, "93");
    }
}
