//! Amino-acid property table and residue/neighbourhood property deltas.
//!
//! The table is a CSV with a header row followed by one row per property: the
//! property name, then one value per amino acid in the column order of
//! [`PROPERTY_COLUMNS`].

use crate::error::{PipelineError, Result};
use crate::residues::AminoAcid;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use std::path::Path;

/// One-letter codes of value columns 1 to 20
pub const PROPERTY_COLUMNS: &str = "ADCEFGHIKLMNPQRSTVWY";

/// Cα distance within which residues count as neighbours
pub const NEIGHBOUR_CUTOFF: f64 = 8.0;

/// One named property with a value per standard amino acid
#[derive(Debug, Clone, PartialEq)]
pub struct AaProperty {
    pub name: String,
    values: [f64; 20],
}

impl AaProperty {
    pub fn value(&self, residue: char) -> Option<f64> {
        let i = PROPERTY_COLUMNS.find(residue.to_ascii_uppercase())?;
        Some(self.values[i])
    }
}

/// Parsed property table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AaPropertyTable {
    pub properties: Vec<AaProperty>,
}

impl AaPropertyTable {
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::MissingInput(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, &path.to_string_lossy())
    }

    pub fn parse(content: &str, source_name: &str) -> Result<Self> {
        let properties = content
            .lines()
            .skip(1)
            .filter(|l| !l.trim().is_empty())
            .enumerate()
            .map(|(i, line)| {
                let fields = line.split(',').map(str::trim).collect::<Vec<&str>>();
                if fields.len() <= PROPERTY_COLUMNS.len() {
                    return Err(PipelineError::malformed(
                        source_name,
                        format!("row {} has {} fields", i + 2, fields.len()),
                    ));
                }
                let mut values = [0.0; 20];
                for (value, field) in values.iter_mut().zip(&fields[1..=PROPERTY_COLUMNS.len()]) {
                    *value = field.parse::<f64>().map_err(|_| {
                        PipelineError::malformed(source_name, format!("not a number: {field}"))
                    })?;
                }
                Ok(AaProperty {
                    name: fields[0].to_string(),
                    values,
                })
            })
            .collect::<Result<Vec<AaProperty>>>()?;
        Ok(Self { properties })
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Property names followed by the same names suffixed with `Surrounding`.
    pub fn header(&self) -> Vec<String> {
        let names = self.properties.iter().map(|p| p.name.clone());
        let surrounding = self.properties.iter().map(|p| format!("{}Surrounding", p.name));
        names.chain(surrounding).collect()
    }

    /// Property deltas of one residue of a reconstruction.
    ///
    /// For each property the residue value minus the wild-type value, then for each
    /// property the summed value of every residue with its Cα within
    /// [`NEIGHBOUR_CUTOFF`] (the residue itself included) minus the residue value.
    /// `None` when the residue is absent or has no usable one-letter code.
    pub fn residue_and_surrounding(
        &self,
        amino_acids: &[AminoAcid],
        residue_number: &str,
        wild_type: char,
    ) -> Option<Vec<f64>> {
        let residue = amino_acids
            .iter()
            .find(|aa| aa.residue_number() == residue_number)?;
        let code = residue.resn()?.chars().next()?;
        let neighbours = neighbours(amino_acids, residue);

        let mut deltas = Vec::with_capacity(self.len() * 2);
        let mut surrounding = Vec::with_capacity(self.len());
        for property in &self.properties {
            let value = property.value(code)?;
            deltas.push(value - property.value(wild_type)?);
            if neighbours.is_empty() {
                surrounding.push(0.0);
            } else {
                let sum: f64 = neighbours
                    .iter()
                    .filter_map(|aa| aa.resn()?.chars().next())
                    .filter_map(|c| property.value(c))
                    .sum();
                surrounding.push(sum - value);
            }
        }
        deltas.extend(surrounding);
        Some(deltas)
    }
}

/// Residues whose Cα lies within [`NEIGHBOUR_CUTOFF`] of the Cα of `residue`.
pub fn neighbours<'a>(amino_acids: &'a [AminoAcid], residue: &AminoAcid) -> Vec<&'a AminoAcid> {
    let Some(center) = residue.ca else {
        return Vec::new();
    };
    let tree = RTree::bulk_load(
        amino_acids
            .iter()
            .enumerate()
            .filter_map(|(i, aa)| aa.ca.map(|ca| GeomWithData::new([ca.x, ca.y, ca.z], i)))
            .collect(),
    );
    let mut found = tree
        .locate_within_distance(
            [center.x, center.y, center.z],
            NEIGHBOUR_CUTOFF * NEIGHBOUR_CUTOFF,
        )
        .map(|p| p.data)
        .collect::<Vec<usize>>();
    found.sort_unstable();
    found.into_iter().map(|i| &amino_acids[i]).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use nalgebra::Vector3;

    /// Two properties: column position (1..20) and a constant.
    pub(crate) fn props_csv() -> String {
        let mut text = format!("property,{}\n", PROPERTY_COLUMNS.chars().map(String::from).collect::<Vec<_>>().join(","));
        let index = (1..=20).map(|i| format!("{i}.0")).collect::<Vec<_>>().join(",");
        text.push_str(&format!("Index,{index}\n"));
        text.push_str(&format!("Unit,{}\n", vec!["1.0"; 20].join(",")));
        text
    }

    fn aa(seq_num: isize, name: &str, x: f64) -> AminoAcid {
        AminoAcid {
            chain: "A".to_string(),
            seq_num,
            insertion: String::new(),
            name: name.to_string(),
            ca: Some(Vector3::new(x, 0.0, 0.0)),
        }
    }

    #[test]
    fn table_is_parsed() {
        let table = AaPropertyTable::parse(&props_csv(), "AAprops.csv").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.properties[0].value('A'), Some(1.0));
        assert_eq!(table.properties[0].value('R'), Some(15.0));
        assert_eq!(table.properties[0].value('v'), Some(18.0));
        assert_eq!(table.properties[0].value('X'), None);
        assert_eq!(table.header(), vec!["Index", "Unit", "IndexSurrounding", "UnitSurrounding"]);
    }

    #[test]
    fn short_rows_are_rejected() {
        let err = AaPropertyTable::parse("h\nIndex,1,2\n", "AAprops.csv");
        assert!(matches!(err, Err(PipelineError::Malformed { .. })));
    }

    #[test]
    fn deltas_and_neighbourhood() {
        let table = AaPropertyTable::parse(&props_csv(), "AAprops.csv").unwrap();
        // 20 Å away from everything else
        let residues = [
            aa(1, "GLY", 0.0),
            aa(2, "ASP", 3.8),
            aa(3, "LYS", 7.6),
            aa(4, "TRP", 30.0),
        ];

        let values = table.residue_and_surrounding(&residues, "2", 'G').unwrap();
        // Index: D(2) - G(6); Unit: 0
        assert_eq!(&values[..2], &[-4.0, 0.0]);
        // neighbours of 2 are 1, 2 and 3: G(6) + D(2) + K(9) - D(2)
        assert_eq!(&values[2..], &[15.0, 2.0]);

        let isolated = table.residue_and_surrounding(&residues, "4", 'W').unwrap();
        assert_eq!(isolated, vec![0.0, 0.0, 0.0, 0.0]);

        assert!(table.residue_and_surrounding(&residues, "9", 'G').is_none());
    }
}
