//! End to end loading of the example files in `tests_data/`.

use gbtracks::{
    commands::{genome_map, load_bed_track, load_file, load_genbank, load_gff, load_vcf},
    commands::BedTrackOptions,
    prelude::*,
    sink::FastaDirectory,
    test_utilities::temp_value_bedfile,
};

#[test]
fn test_bed_example() {
    let mut sink = MemorySink::new();
    let output = load_bed_track(
        "tests_data/example.bed",
        &BedTrackOptions::default(),
        &mut sink,
    )
    .unwrap();
    assert_eq!(output.report.records, 5);
    assert_eq!(output.report.malformed, 1);
    assert_eq!(sink.segments().len(), 4);

    let track = sink.track(output.value).unwrap();
    assert_eq!(track.name, "example.bed");
    assert_eq!(track.kind, TrackKind::Gene);

    let gene_a = &sink.segments()[0];
    assert_eq!(gene_a.block_sizes(), Some(vec![500, 800]));
    assert_eq!(gene_a.block_starts(), Some(vec![0, 3200]));
    assert_eq!(gene_a.item_rgb.as_deref(), Some("0,0,255"));
    assert_eq!(
        gene_a.to_tsv(),
        "chr1\t1000\t5000\tgeneA\t0\t+\t1200\t4800\t0,0,255\t2\t500,800\t0,3200"
    );
    assert_eq!(sink.gene_view().len(), 4);
}

#[test]
fn test_bed_records_roundtrip() {
    let original = std::fs::read_to_string("tests_data/example.bed").unwrap();
    let rows: Vec<String> = BedIterator::new("tests_data/example.bed")
        .unwrap()
        .filter_map(Result::ok)
        .map(|record| record.to_tsv())
        .collect();
    assert_eq!(rows.len(), 4);
    for row in rows {
        assert!(original.lines().any(|line| line == row));
    }
}

#[test]
fn test_gff_example() {
    let mut sink = MemorySink::new();
    let report = load_gff("tests_data/example.gff3", &mut sink).unwrap().report;
    assert_eq!(report.records, 9);
    assert_eq!(report.unresolved, 1);
    assert_eq!(report.malformed, 1);
    assert_eq!(report.tracks, 3);
    assert_eq!(report.segments, 4);

    let mrna_track = sink.tracks_named("mRNA").next().unwrap();
    assert_eq!(mrna_track.kind, TrackKind::Exons);
    assert_eq!(mrna_track.color.as_deref(), Some("goldenrod"));
    let transcript = sink.track_segments(mrna_track.id).next().unwrap();
    assert_eq!((transcript.start, transcript.end), (1000, 5000));
    assert_eq!(transcript.block_starts(), Some(vec![0, 2000, 3200]));
    assert_eq!(transcript.block_sizes(), Some(vec![500, 100, 800]));
    // the sum of block sizes is the sum of exon lengths
    assert_eq!(transcript.block_sizes().unwrap().iter().sum::<u32>(), 1400);
    assert_eq!(transcript.name.as_deref(), Some("tx1"));
    assert_eq!(transcript.score.as_deref(), Some("Parent=gene1"));

    let gene_track = sink.tracks_named("gene").next().unwrap();
    assert_eq!(gene_track.kind, TrackKind::Gene);
    assert_eq!(gene_track.color.as_deref(), Some("cadetblue"));
    let genes: Vec<_> = sink.track_segments(gene_track.id).collect();
    assert_eq!(genes[0].name.as_deref(), Some("ABC1"));
    assert_eq!(genes[0].score.as_deref(), Some("biotype=protein_coding"));
    assert_eq!(genes[1].strand, Some(Strand::Reverse));
    assert_eq!(genes[1].score.as_deref(), Some("note=two"));

    let cds_track = sink.tracks_named("CDS").next().unwrap();
    let cds = sink.track_segments(cds_track.id).next().unwrap();
    assert_eq!((cds.thick_start, cds.thick_end), (Some(1200), Some(4800)));

    assert_eq!(sink.gene_view().len(), 4);
}

#[test]
fn test_genbank_example() {
    let mut sink = MemorySink::new();
    let mut sequences = MemorySequences::new();
    let output = load_genbank("tests_data/example.gbk", &mut sink, &mut sequences).unwrap();
    let assembly = output.value;
    assert_eq!(assembly.names(), vec!["NC_9001.1", "pEX1"]);
    assert_eq!(assembly.find("nc_9001.1").unwrap().length, 180);

    let report = output.report;
    assert_eq!(report.records, 6);
    assert_eq!(report.segments, 5);
    assert_eq!(report.malformed, 1);
    assert_eq!(report.tracks, 4);

    let segments = sink.segments();
    assert_eq!(segments[0].name.as_deref(), Some("exaA"));
    assert_eq!(segments[0].score.as_deref(), Some("locus_tag=EX_0001"));
    assert_eq!(
        segments[1].score.as_deref(),
        Some("locus_tag=EX_0001|product=example protein A, with a comma")
    );
    assert_eq!(segments[2].name.as_deref(), Some("EX_0002"));
    assert_eq!(segments[2].strand, Some(Strand::Reverse));

    let mrna = &segments[3];
    assert_eq!((mrna.start, mrna.end), (99, 170));
    assert_eq!(mrna.block_sizes(), Some(vec![21, 31]));
    assert_eq!(mrna.block_starts(), Some(vec![0, 40]));
    assert_eq!(sink.track(mrna.track_id).unwrap().kind, TrackKind::Exons);

    assert_eq!(segments[4].chrom, "pEX1");
    assert_eq!((segments[4].start, segments[4].end), (0, 40));
    assert!(sink.tracks_named("source").next().is_none());

    // residues are copied as-is, whatever LOCUS says
    assert_eq!(sequences.get("NC_9001.1").unwrap().len(), 170);
    assert_eq!(sequences.get("pEX1").unwrap().len(), 40);
    assert_eq!(sink.gene_view().len(), 5);
}

#[test]
fn test_genbank_sequences_to_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = MemorySink::new();
    let mut fasta = FastaDirectory::new(dir.path()).unwrap();
    load_genbank("tests_data/example.gbk", &mut sink, &mut fasta).unwrap();
    drop(fasta);
    let plasmid = std::fs::read_to_string(dir.path().join("pEX1.fa")).unwrap();
    assert_eq!(
        plasmid,
        ">pEX1\natgcatgcatgcatgcatgcatgcatgcatgcatgcatgc\n"
    );
}

#[test]
fn test_vcf_example() {
    let mut sink = MemorySink::new();
    let report = load_vcf("tests_data/example.vcf", &VcfOptions::default(), &mut sink)
        .unwrap()
        .report;
    assert_eq!(report.records, 4);
    assert_eq!(report.malformed, 1);
    assert_eq!(report.format_mismatch, 1);
    assert_eq!(report.segments, 8);

    let names: Vec<_> = sink.tracks().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["example.vcf", "NA00001", "NA00002"]);
    let master = sink.tracks().next().unwrap();
    let info = &master.metadata.as_ref().unwrap()["info"];
    assert_eq!(info["AF"], "Allele frequency, for each ALT allele");
    assert!(info.get("CSQ").is_none());

    let segments = sink.segments();
    assert_eq!(
        segments[0].score.as_deref(),
        Some("REF=A|ALT=G|QUAL=60|DP=30|AF=0.5|Allele=G|Consequence=missense_variant|IMPACT=MODERATE|SYMBOL=ABC1|Gene=ENSG01")
    );
    assert_eq!(segments[1].score.as_deref(), Some("GT=0/1|AD=15,15"));
    assert_eq!(segments[2].score.as_deref(), Some("GT=1/1|AD=0,20"));
    let last_master = &segments[5];
    assert_eq!(last_master.name.as_deref(), Some("rs2002"));
    assert_eq!(last_master.score.as_deref(), Some("REF=G|QUAL=30"));
}

#[test]
fn test_load_by_detection() {
    let mut sink = MemorySink::new();
    let mut sequences = MemorySequences::new();
    let mut report = IngestReport::new();
    for file in [
        "tests_data/example.bed",
        "tests_data/example.gff3",
        "tests_data/example.gbk",
        "tests_data/example.vcf",
        "tests_data/example.fa",
    ] {
        report.merge(load_file(file, &mut sink, &mut sequences).unwrap());
    }
    assert_eq!(report.skipped(), 1 + 2 + 1 + 2);
    assert_eq!(sequences.get("chr1").map(str::len), Some(20));
    assert_eq!(sequences.get("chr2"), Some("TTTTGGGG"));

    // track ids are never reused
    let ids: Vec<_> = sink.tracks().map(|t| t.id).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));

    assert_eq!(sink.remove_track("gene").unwrap(), 2);
    assert!(sink.tracks_named("gene").next().is_none());
}

#[test]
fn test_assembly_sources() {
    let from_bed = AssemblySpec::Named("tests_data/assembly.bed".to_string())
        .resolve()
        .unwrap();
    assert_eq!(from_bed.names(), vec!["chr1", "chr2", "chrX"]);
    assert_eq!(from_bed.total_length(), 35000);

    let from_fasta = AssemblySpec::Paths(vec!["tests_data/example.fa".into()])
        .resolve()
        .unwrap();
    assert_eq!(from_fasta.to_tsv(), "chr1\t0\t20\nchr2\t0\t8\n");

    let grch37 = AssemblySpec::Named("GRCh37".to_string()).resolve().unwrap();
    assert_eq!(grch37.find("chrX").unwrap().length, 155270560);
}

#[test]
fn test_genome_map_over_registry_assembly() {
    let assembly = Assembly::from_registry("GRCh38").unwrap();
    let values = temp_value_bedfile(1000, &assembly);
    let output = genome_map(&assembly, Some(values.path())).unwrap();
    let map = output.value;
    assert_eq!(map.chromosomes.len(), 25);
    assert_eq!(map.max, 248956422);
    let [min, max] = map.data_domain.unwrap();
    assert!(min <= max);
    let json: serde_json::Value = serde_json::from_str(&map.to_json().unwrap()).unwrap();
    assert!(json.get("dataDomain").is_some());
}
