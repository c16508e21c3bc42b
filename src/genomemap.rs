//! The genome map: a whole-genome overview series of one value track.
//!
//! Value tracks can have millions of rows, far more than an overview can draw.
//! Above [`MAP_RESOLUTION`] rows the track is downsampled by [`segmentation`]
//! into bins of equal width, each holding the mean of the rows whose midpoint
//! falls in it. This only ever applies to the overview series; stored segments
//! are never touched.

use indexmap::IndexMap;
use log::{debug, info};
use serde::Serialize;

use crate::assembly::Assembly;
use crate::io::parsers::bed::BedRecord;
use crate::Position;

/// Maximum number of rows drawn without downsampling, and the number of bins
/// the genome is split into when downsampling.
pub const MAP_RESOLUTION: usize = 100_000;

/// One point of the overview series.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MapRow {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub value: f64,
}

/// Average rows into bins of width `cell`.
///
/// A row goes to bin `ceil(midpoint / cell)` of its chromosome and every
/// non-empty bin becomes one row spanning `[(bin - 1) * cell, bin * cell)` with
/// the mean score. Rows without a numeric score are ignored. Bins come out in
/// the order they are first seen.
pub fn segmentation(records: &[BedRecord], cell: u64) -> Vec<MapRow> {
    let cell = cell.max(1);
    let mut bins: IndexMap<(&str, u64), (u64, f64)> = IndexMap::new();
    for record in records {
        let Some(value) = record.score_value() else {
            continue;
        };
        // ceil(((start + end) / 2) / cell) without going through floats
        let sum = record.start as u64 + record.end as u64;
        let bin = sum.div_ceil(2 * cell);
        let entry = bins.entry((record.seqname.as_str(), bin)).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += value;
    }
    bins.into_iter()
        .map(|((chrom, bin), (count, sum))| MapRow {
            chrom: chrom.to_string(),
            start: (bin - 1) * cell,
            end: bin * cell,
            value: sum / count as f64,
        })
        .collect()
}

/// The overview series the genome map is drawn from.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenomeMap {
    /// Chromosome names, in assembly order.
    pub chromosomes: Vec<String>,
    /// `[start, end, value]` rows per chromosome.
    pub data: IndexMap<String, Vec<(u64, u64, f64)>>,
    /// Length of the longest chromosome.
    pub max: Position,
    /// `[min, max]` of the values, when there are any.
    #[serde(rename = "dataDomain", skip_serializing_if = "Option::is_none")]
    pub data_domain: Option<[f64; 2]>,
}

impl GenomeMap {
    /// Build the overview of `assembly`, with the rows of an optional value track.
    pub fn build(assembly: &Assembly, values: Option<&[BedRecord]>) -> Self {
        let chromosomes: Vec<String> = assembly.iter().map(|c| c.name.clone()).collect();
        let mut map = GenomeMap {
            chromosomes,
            data: IndexMap::new(),
            max: assembly.max_length(),
            data_domain: None,
        };
        let Some(records) = values else {
            return map;
        };

        let rows: Vec<MapRow> = if records.len() > MAP_RESOLUTION {
            let cell = assembly.total_length().div_ceil(MAP_RESOLUTION as u64);
            if cell > 1 {
                info!(
                    "genome map: {} rows downsampled into bins of {}bp",
                    records.len(),
                    cell
                );
                segmentation(records, cell)
            } else {
                Self::unsegmented(records)
            }
        } else {
            Self::unsegmented(records)
        };

        let mut domain: Option<[f64; 2]> = None;
        let mut dropped = 0;
        for row in rows {
            if !map.chromosomes.contains(&row.chrom) {
                dropped += 1;
                continue;
            }
            domain = Some(match domain {
                Some([min, max]) => [min.min(row.value), max.max(row.value)],
                None => [row.value, row.value],
            });
            map.data
                .entry(row.chrom)
                .or_default()
                .push((row.start, row.end, row.value));
        }
        if dropped > 0 {
            debug!("genome map: {} rows outside the assembly", dropped);
        }
        map.data_domain = domain;
        map
    }

    fn unsegmented(records: &[BedRecord]) -> Vec<MapRow> {
        records
            .iter()
            .filter_map(|record| {
                Some(MapRow {
                    chrom: record.seqname.clone(),
                    start: record.start as u64,
                    end: record.end as u64,
                    value: record.score_value()?,
                })
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::Chromosome;
    use crate::test_utilities::random_value_records;

    fn record(chrom: &str, start: Position, end: Position, score: &str) -> BedRecord {
        BedRecord {
            seqname: chrom.to_string(),
            start,
            end,
            score: Some(score.to_string()),
            ..Default::default()
        }
    }

    fn assembly() -> Assembly {
        Assembly::new(vec![
            Chromosome::new("chr1", 0, 1000),
            Chromosome::new("chr2", 0, 600),
        ])
        .unwrap()
    }

    #[test]
    fn test_segmentation_bins() {
        let records = vec![
            record("chr1", 0, 10, "1.0"),   // midpoint 5 -> bin 1
            record("chr2", 0, 10, "7"),     // another chromosome
            record("chr1", 90, 100, "3.0"), // midpoint 95 -> bin 1
            record("chr1", 100, 110, "5"),  // midpoint 105 -> bin 2
            record("chr1", 0, 10, "NA"),    // ignored
        ];
        let rows = segmentation(&records, 100);
        assert_eq!(rows.len(), 3);
        assert_eq!((rows[0].chrom.as_str(), rows[0].start, rows[0].end), ("chr1", 0, 100));
        assert_eq!(rows[0].value, 2.0);
        assert_eq!(rows[1].chrom, "chr2");
        assert_eq!((rows[2].start, rows[2].end, rows[2].value), (100, 200, 5.0));
    }

    #[test]
    fn test_segmentation_random_means() {
        let records = random_value_records(5000, &[("chr1", 1_000_000)]);
        let cell = 10_000;
        let rows = segmentation(&records, cell);
        let total: usize = records.iter().filter(|r| r.score_value().is_some()).count();
        let mut seen = 0;
        for row in &rows {
            assert_eq!(row.end - row.start, cell);
            let members: Vec<f64> = records
                .iter()
                .filter(|r| (r.start as u64 + r.end as u64).div_ceil(2 * cell) * cell == row.end)
                .filter_map(BedRecord::score_value)
                .collect();
            seen += members.len();
            let mean = members.iter().sum::<f64>() / members.len() as f64;
            assert!((mean - row.value).abs() < 1e-9);
        }
        assert_eq!(seen, total);
    }

    #[test]
    fn test_build_without_values() {
        let map = GenomeMap::build(&assembly(), None);
        assert_eq!(
            map.to_json().unwrap(),
            r#"{"chromosomes":["chr1","chr2"],"data":{},"max":1000}"#
        );
    }

    #[test]
    fn test_build_small_track_is_not_segmented() {
        let records = vec![
            record("chr2", 10, 20, "0.5"),
            record("chr1", 0, 10, "-2"),
            record("chrUn", 0, 10, "100"),
            record("chr1", 20, 30, "x"),
        ];
        let map = GenomeMap::build(&assembly(), Some(&records));
        assert_eq!(map.data["chr1"], vec![(0, 10, -2.0)]);
        assert_eq!(map.data["chr2"], vec![(10, 20, 0.5)]);
        assert_eq!(map.data_domain, Some([-2.0, 0.5]));
        assert!(map.to_json().unwrap().contains(r#""dataDomain":[-2.0,0.5]"#));
    }

    #[test]
    fn test_build_at_resolution_is_not_segmented() {
        let chromosomes = [("chr1", 150_000_000), ("chr2", 100_000_000)];
        let assembly = Assembly::new(
            chromosomes
                .iter()
                .map(|(name, length)| Chromosome::new(*name, 0, *length))
                .collect(),
        )
        .unwrap();
        let records = random_value_records(MAP_RESOLUTION, &chromosomes);
        let map = GenomeMap::build(&assembly, Some(&records));

        let mut expected: IndexMap<String, Vec<(u64, u64, f64)>> = IndexMap::new();
        for record in &records {
            if let Some(value) = record.score_value() {
                expected
                    .entry(record.seqname.clone())
                    .or_default()
                    .push((record.start as u64, record.end as u64, value));
            }
        }
        // every numeric row comes through as-is
        for (chrom, rows) in &expected {
            assert_eq!(&map.data[chrom], rows);
        }
        let rows: usize = map.data.values().map(Vec::len).sum();
        assert_eq!(rows, expected.values().map(Vec::len).sum::<usize>());
    }

    #[test]
    fn test_build_large_track_is_segmented() {
        let chromosomes = [("chr1", 150_000_000), ("chr2", 100_000_000)];
        let assembly = Assembly::new(
            chromosomes
                .iter()
                .map(|(name, length)| Chromosome::new(*name, 0, *length))
                .collect(),
        )
        .unwrap();
        let records = random_value_records(MAP_RESOLUTION + 1, &chromosomes);
        let map = GenomeMap::build(&assembly, Some(&records));
        // 250Mb over 100,000 bins
        let cell = 2_500;
        let rows: usize = map.data.values().map(Vec::len).sum();
        assert!(rows <= records.len());
        for (start, end, _) in map.data.values().flatten() {
            assert_eq!(end - start, cell);
            assert_eq!(start % cell, 0);
        }
    }
}
