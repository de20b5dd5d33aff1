use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use dataset::{
    AssemblyConfig, AssemblyError, Assembler, CategorySource, ReshufflePolicy, Shuffled,
};
use renderer::render_drawing;
use structures::{Drawing, LabelError, LabelTable, RasterEncoding, Stroke, TrainingExample};
use strokes::{encode_drawing, DrawingWriter};

fn drawing(id: u64, recognized: bool) -> Drawing {
    // anchored to the full canvas; the second stroke sits at a different
    // spot for each of the first 64 ids, so every id renders differently
    let x = (id % 16) as u8 * 16;
    let y = ((id / 16) % 4) as u8 * 60 + 20;
    Drawing {
        id,
        country_code: *b"US",
        recognized,
        timestamp: 1_490_000_000,
        strokes: vec![
            Stroke::from_points(&[(0, 0), (255, 255)]),
            Stroke::from_points(&[(x, y), (x, y + 30)]),
        ],
    }
}

fn write_category(dir: &Path, name: &str, drawings: &[Drawing]) {
    let file = File::create(dir.join(format!("{name}.bin"))).unwrap();
    let mut writer = DrawingWriter::new(BufWriter::new(file));
    for d in drawings {
        writer.write(d).unwrap();
    }
    writer.finish().unwrap();
}

fn recognized(n: u64) -> Vec<Drawing> {
    (0..n).map(|id| drawing(id, true)).collect()
}

fn fingerprints<I: Iterator<Item = TrainingExample>>(examples: I) -> Vec<(u16, Vec<u8>)> {
    examples.map(|e| (e.label, e.image.into_pixels())).collect()
}

fn sorted(mut items: Vec<(u16, Vec<u8>)>) -> Vec<(u16, Vec<u8>)> {
    items.sort();
    items
}

fn label_counts<I: Iterator<Item = TrainingExample>>(examples: I) -> HashMap<u16, usize> {
    let mut counts = HashMap::new();
    for e in examples {
        *counts.entry(e.label).or_insert(0) += 1;
    }
    counts
}

fn three_categories(per_category: u64) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in ["cat", "apple", "bee"] {
        write_category(dir.path(), name, &recognized(per_category));
    }
    dir
}

#[test]
fn labels_follow_sorted_names() {
    let dir = three_categories(2);
    let assembler = Assembler::from_directory(dir.path(), AssemblyConfig::default()).unwrap();

    let names: Vec<&str> = assembler.labels().iter().map(|(_, name)| name).collect();
    assert_eq!(names, ["apple", "bee", "cat"]);
    assert_eq!(assembler.manifest().labels, *assembler.labels());
}

#[test]
fn interleaves_round_robin_up_to_cap() {
    let dir = three_categories(30);
    let config = AssemblyConfig::default().with_cap(10);
    let assembler = Assembler::from_directory(dir.path(), config).unwrap();

    let labels: Vec<u16> = assembler.examples().map(|e| e.label).collect();
    assert_eq!(labels.len(), 30);
    for (i, label) in labels.iter().enumerate() {
        assert_eq!(usize::from(*label), i % 3);
    }
}

#[test]
fn uneven_categories_keep_going_after_one_runs_out() {
    let dir = tempfile::tempdir().unwrap();
    write_category(dir.path(), "apple", &recognized(2));
    write_category(dir.path(), "bee", &recognized(5));

    let assembler = Assembler::from_directory(dir.path(), AssemblyConfig::default()).unwrap();
    let labels: Vec<u16> = assembler.examples().map(|e| e.label).collect();

    assert_eq!(labels, [0, 1, 0, 1, 1, 1, 1]);
}

#[test]
fn unrecognized_drawings_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let drawings: Vec<Drawing> = (0..10).map(|id| drawing(id, id % 2 == 0)).collect();
    write_category(dir.path(), "cat", &drawings);

    let config = AssemblyConfig::default().with_cap(100);
    let assembler = Assembler::from_directory(dir.path(), config).unwrap();

    let render = |d: &Drawing| render_drawing(d, &RasterEncoding::QUICKDRAW_28).unwrap();
    let kept: Vec<Vec<u8>> = drawings
        .iter()
        .filter(|d| d.recognized)
        .map(|d| render(d).into_pixels())
        .collect();
    let dropped: Vec<Vec<u8>> = drawings
        .iter()
        .filter(|d| !d.recognized)
        .map(|d| render(d).into_pixels())
        .collect();

    let mut examples = assembler.examples();
    let emitted: Vec<Vec<u8>> = examples.by_ref().map(|e| e.image.into_pixels()).collect();
    assert_eq!(emitted, kept);
    for image in &dropped {
        assert!(!emitted.contains(image), "an unrecognized drawing was emitted");
    }

    let report = examples.report();
    let cat = report.category("cat").unwrap();
    assert_eq!(cat.decoded, 10);
    assert_eq!(cat.unrecognized, 5);
    assert_eq!(cat.rendered, 5);
    assert!(!cat.failed);
}

#[test]
fn cap_skips_unrecognized_without_counting_them() {
    let dir = tempfile::tempdir().unwrap();
    let drawings: Vec<Drawing> = (0..20).map(|id| drawing(id, id % 4 != 0)).collect();
    write_category(dir.path(), "cat", &drawings);

    let config = AssemblyConfig::default().with_cap(6);
    let assembler = Assembler::from_directory(dir.path(), config).unwrap();
    assert_eq!(assembler.examples().count(), 6);
}

#[test]
fn broken_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_category(dir.path(), "apple", &recognized(4));

    // one good record followed by a record cut off inside its strokes
    let mut bytes = encode_drawing(&drawing(0, true)).unwrap();
    let second = encode_drawing(&drawing(1, true)).unwrap();
    bytes.extend_from_slice(&second[..second.len() - 3]);
    fs::write(dir.path().join("bee.bin"), bytes).unwrap();

    let mut sources = dataset::discover_categories(dir.path()).unwrap();
    sources.push(CategorySource::in_directory(dir.path(), "ghost"));

    let assembler = Assembler::new(sources, AssemblyConfig::default()).unwrap();
    assert_eq!(assembler.labels().len(), 3);

    let mut examples = assembler.examples();
    let counts = label_counts(examples.by_ref());
    assert_eq!(counts.get(&0), Some(&4));
    assert_eq!(counts.get(&1), Some(&1));
    assert_eq!(counts.get(&2), None);

    let report = examples.report();
    assert_eq!(
        report.failed_categories().collect::<Vec<_>>(),
        ["bee", "ghost"]
    );
}

#[test]
fn splits_partition_the_stream() {
    let dir = three_categories(20);
    let config = AssemblyConfig::default()
        .with_cap(20)
        .with_validation_fraction(0.25)
        .with_shuffle_buffer(16)
        .with_seed(11);
    let assembler = Assembler::from_directory(dir.path(), config).unwrap();

    assert_eq!(assembler.validation_len(), 15);

    let validation = fingerprints(assembler.validation());
    let training = fingerprints(assembler.training());
    assert_eq!(validation.len(), 15);
    assert_eq!(training.len(), 45);

    let mut both = validation.clone();
    both.extend(training);
    assert_eq!(sorted(both), sorted(fingerprints(assembler.examples())));

    // same inputs, same split
    assert_eq!(validation, fingerprints(assembler.validation()));
}

#[test]
fn stable_epochs_repeat() {
    let dir = three_categories(15);
    let config = AssemblyConfig::default()
        .with_cap(15)
        .with_shuffle_buffer(8)
        .with_reshuffle(ReshufflePolicy::Stable);
    let assembler = Assembler::from_directory(dir.path(), config).unwrap();

    let first = fingerprints(assembler.train_epoch(0));
    assert_eq!(first.len(), 36);
    assert_eq!(first, fingerprints(assembler.train_epoch(1)));
    assert_eq!(first, fingerprints(assembler.training()));
}

#[test]
fn per_epoch_reshuffles_training_only() {
    let dir = three_categories(20);
    let config = AssemblyConfig::default()
        .with_cap(20)
        .with_validation_fraction(0.2)
        .with_shuffle_buffer(32)
        .with_reshuffle(ReshufflePolicy::PerEpoch);
    let assembler = Assembler::from_directory(dir.path(), config).unwrap();

    let validation = fingerprints(assembler.validation());
    let epoch0 = fingerprints(assembler.train_epoch(0));
    let epoch1 = fingerprints(assembler.train_epoch(1));

    assert_eq!(validation.len(), 12);
    assert_eq!(epoch0.len(), 48);

    assert_ne!(epoch0, epoch1);
    assert_eq!(sorted(epoch0.clone()), sorted(epoch1));
    assert_eq!(epoch0, fingerprints(assembler.train_epoch(0)));
    assert_eq!(validation, fingerprints(assembler.validation()));
}

#[test]
fn per_epoch_order_is_seeded_by_base_seed_plus_epoch() {
    let dir = three_categories(20);
    let config = AssemblyConfig::default()
        .with_cap(20)
        .with_shuffle_buffer(32)
        .with_seed(100)
        .with_reshuffle(ReshufflePolicy::PerEpoch);
    let assembler = Assembler::from_directory(dir.path(), config).unwrap();

    for epoch in [0, 3] {
        let expected = fingerprints(Shuffled::new(assembler.training(), 32, 100 + epoch));
        assert_eq!(fingerprints(assembler.train_epoch(epoch)), expected);
    }
}

#[test]
fn validation_can_take_the_whole_stream() {
    // the default cap sizes the split for far more drawings than exist
    let dir = three_categories(5);
    let assembler = Assembler::from_directory(dir.path(), AssemblyConfig::default()).unwrap();

    assert_eq!(assembler.validation_len(), 6_000);
    assert_eq!(assembler.validation().count(), 15);
    assert_eq!(assembler.training().count(), 0);
    assert_eq!(assembler.train_epoch(0).count(), 0);
}

#[test]
fn class_count_must_match_the_categories() {
    let dir = three_categories(1);

    let config = AssemblyConfig::default().with_class_count(4);
    assert!(matches!(
        Assembler::from_directory(dir.path(), config),
        Err(AssemblyError::Labels(LabelError::ClassCountMismatch {
            expected: 4,
            actual: 3
        }))
    ));

    let config = AssemblyConfig::default().with_class_count(3);
    let assembler = Assembler::from_directory(dir.path(), config).unwrap();
    assert_eq!(assembler.labels().len(), 3);
}

#[test]
fn persisted_labels_keep_their_indices() {
    let dir = three_categories(4);
    let persisted = LabelTable::from_ordered(
        ["dog", "cat", "bee", "apple"].map(String::from).to_vec(),
    )
    .unwrap();

    let config = AssemblyConfig::default().with_cap(4).with_class_count(4);
    let assembler =
        Assembler::from_directory_with_labels(dir.path(), persisted.clone(), config).unwrap();

    assert_eq!(assembler.manifest().labels, persisted);
    let labels: Vec<u16> = assembler.examples().map(|e| e.label).collect();
    assert_eq!(labels.len(), 12);
    // sources stay in name order: apple, bee, cat
    assert_eq!(&labels[..3], [3, 2, 1]);
    assert!(!labels.contains(&0));

    let config = AssemblyConfig::default().with_class_count(5);
    assert!(matches!(
        Assembler::from_directory_with_labels(dir.path(), persisted, config),
        Err(AssemblyError::Labels(LabelError::ClassCountMismatch { .. }))
    ));
}

#[test]
fn category_missing_from_persisted_labels_is_an_error() {
    let dir = three_categories(1);
    let persisted = LabelTable::from_ordered(vec!["apple".to_string(), "cat".to_string()]).unwrap();

    match Assembler::from_directory_with_labels(dir.path(), persisted, AssemblyConfig::default()) {
        Err(AssemblyError::UnlabeledCategory(name)) => assert_eq!(name, "bee"),
        other => panic!("expected an unlabeled category, got {other:?}"),
    }
}

#[test]
fn epoch_size_limits_the_stream() {
    let dir = three_categories(20);
    let config = AssemblyConfig::default()
        .with_epoch_size(25)
        .with_validation_fraction(0.2);
    let assembler = Assembler::from_directory(dir.path(), config).unwrap();

    assert_eq!(assembler.examples().count(), 25);
    assert_eq!(assembler.validation().count(), 5);
    assert_eq!(assembler.training().count(), 20);
}

#[test]
fn batches_drop_the_short_tail() {
    let dir = three_categories(10);
    let config = AssemblyConfig::default()
        .with_validation_fraction(0.0)
        .with_batch_size(8);
    let assembler = Assembler::from_directory(dir.path(), config).unwrap();

    let batches: Vec<_> = assembler.batches(assembler.train_epoch(0)).collect();
    assert_eq!(batches.len(), 3);
    for batch in &batches {
        assert_eq!(batch.len(), 8);
        assert_eq!(batch.pixels().len(), 8 * 28 * 28);
    }
}

#[test]
fn empty_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("readme.txt"), "nothing here").unwrap();

    assert!(matches!(
        Assembler::from_directory(dir.path(), AssemblyConfig::default()),
        Err(AssemblyError::NoCategories(_))
    ));
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let dir = three_categories(1);
    assert!(matches!(
        Assembler::from_directory(dir.path(), AssemblyConfig::default().with_batch_size(0)),
        Err(AssemblyError::InvalidConfig(_))
    ));
}
