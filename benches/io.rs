use criterion::{criterion_group, criterion_main, Criterion};
use csv::ReaderBuilder;
use gbtracks::commands::{load_bed_track, BedTrackOptions};
use gbtracks::genomemap::GenomeMap;
use gbtracks::prelude::*;
use gbtracks::test_utilities::{random_assembly_records, temp_value_bedfile};
use gbtracks::Position;

#[derive(Debug, serde::Deserialize, PartialEq)]
struct Bed5Row {
    seqname: String,
    start: Position,
    end: Position,
    name: String,
    score: String,
}

const BED_LENGTH: usize = 1_000_000;

fn bench_io_shootout(c: &mut Criterion) {
    // create the benchmark group
    let mut group = c.benchmark_group("load");

    // create the test data
    let assembly = Assembly::from_registry("GRCh38").unwrap();
    let input_bedfile = temp_value_bedfile(BED_LENGTH, &assembly);

    // configure the sample size for the group
    group.sample_size(10);

    // BedIterator
    group.bench_function("bed_iterator", |b| {
        b.iter(|| {
            let iter = BedIterator::new(input_bedfile.path()).unwrap();
            iter.filter_map(Result::ok).count()
        });
    });

    // CSV
    group.bench_function("csv", |b| {
        b.iter(|| {
            let mut rdr = ReaderBuilder::new()
                .delimiter(b'\t')
                .has_headers(false)
                .from_path(input_bedfile.path())
                .unwrap();
            rdr.deserialize::<Bed5Row>().filter_map(Result::ok).count()
        });
    });

    // full value track load into the in-memory sink
    group.bench_function("load_value_track", |b| {
        let options = BedTrackOptions {
            kind: TrackKind::Value,
            ..Default::default()
        };
        b.iter(|| {
            let mut sink = MemorySink::new();
            load_bed_track(input_bedfile.path(), &options, &mut sink).unwrap();
            sink.segments().len()
        });
    });
    group.finish();
}

fn bench_genome_map(c: &mut Criterion) {
    let assembly = Assembly::from_registry("GRCh38").unwrap();
    let records = random_assembly_records(BED_LENGTH, &assembly);

    let mut group = c.benchmark_group("genomemap");
    group.sample_size(10);
    group.bench_function("segmented", |b| {
        b.iter(|| GenomeMap::build(&assembly, Some(&records)).data.len());
    });
    group.finish();
}

criterion_group!(benches, bench_io_shootout, bench_genome_map);
criterion_main!(benches);
