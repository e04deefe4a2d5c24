//! Integration tests for the pipeline module.
//!
//! These tests drive real image files end to end:
//! - Generating fingerprints
//! - Loading them and finding identical and similar photos
//! - Corrupt files and capture timestamps
//! - Four workers draining a live walk

use assert_fs::prelude::*;
use assert_fs::TempDir;
use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use image::{Rgb, RgbImage};
use photo_fingerprint::core::config::FingerprintConfig;
use photo_fingerprint::core::fingerprint::{FingerprintStore, MatchKind};
use photo_fingerprint::core::imaging::PixelEngine;
use photo_fingerprint::core::output::MemorySink;
use photo_fingerprint::core::pipeline::{Pipeline, WorkerTask};
use photo_fingerprint::events::null_sender;
use predicates::prelude::*;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

/// Red gradient, left to right
fn gradient() -> RgbImage {
    RgbImage::from_fn(100, 100, |x, _| Rgb([(x * 255 / 99) as u8, 0, 0]))
}

fn solid_blue() -> RgbImage {
    RgbImage::from_pixel(100, 100, Rgb([0, 0, 255]))
}

fn checkerboard() -> RgbImage {
    RgbImage::from_fn(100, 100, |x, y| {
        if (x / 10 + y / 10) % 2 == 0 {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    })
}

/// The gradient with a 20x25 block (5% of pixels) painted green
fn touched_up_gradient() -> RgbImage {
    let mut image = gradient();
    for x in 40..60 {
        for y in 10..35 {
            image.put_pixel(x, y, Rgb([0, 255, 0]));
        }
    }
    image
}

fn save(image: &RgbImage, path: &Path) {
    image.save(path).unwrap();
}

/// Generate fingerprints for `a` (gradient) and `b` (blue) into a new dir
fn generate_references(temp: &TempDir) -> std::path::PathBuf {
    let sources = temp.child("sources");
    sources.create_dir_all().unwrap();
    save(&gradient(), &sources.path().join("a.png"));
    save(&solid_blue(), &sources.path().join("b.png"));

    let fingerprints = temp.child("fingerprints");
    fingerprints.create_dir_all().unwrap();

    let sink = Arc::new(MemorySink::new());
    let pipeline = Pipeline::builder(sources.path())
        .concurrency(2)
        .sink(sink.clone())
        .build()
        .unwrap();
    let result = pipeline
        .run(&WorkerTask::Generate {
            destination: fingerprints.path().to_path_buf(),
        })
        .unwrap();

    assert_eq!(result.processed, 2);
    assert_eq!(sink.lines().len(), 2);
    fingerprints.path().to_path_buf()
}

#[test]
fn generate_writes_one_tiff_per_image() {
    let temp = TempDir::new().unwrap();
    generate_references(&temp);

    temp.child("fingerprints/a.tif").assert(predicate::path::is_file());
    temp.child("fingerprints/b.tif").assert(predicate::path::is_file());
    temp.child("fingerprints/a.png").assert(predicate::path::missing());

    let written = image::open(temp.path().join("fingerprints/a.tif")).unwrap();
    assert_eq!((written.width(), written.height()), (100, 100));
}

#[test]
fn load_keeps_every_fingerprint_with_its_label() {
    let temp = TempDir::new().unwrap();
    let fingerprints = generate_references(&temp);

    let store = FingerprintStore::load(
        &fingerprints,
        Arc::new(PixelEngine::new()),
        &FingerprintConfig::default(),
    )
    .unwrap();

    let mut labels: Vec<_> = store.iter().map(|f| f.label.clone()).collect();
    labels.sort();
    assert_eq!(labels, ["a", "b"]);
}

#[test]
fn finds_identical_and_similar_copies() {
    let temp = TempDir::new().unwrap();
    let fingerprints = generate_references(&temp);

    let search = temp.child("search");
    search.create_dir_all().unwrap();
    search.child("nested").create_dir_all().unwrap();
    save(&gradient(), &search.path().join("a_copy.png"));
    save(&touched_up_gradient(), &search.path().join("nested/a_edited.png"));
    save(&checkerboard(), &search.path().join("unrelated.png"));
    search.child("notes.txt").write_str("not a photo").unwrap();

    let loader = Pipeline::builder(&fingerprints).build().unwrap();
    let store = Arc::new(loader.load_fingerprints(&null_sender()).unwrap());

    let sink = Arc::new(MemorySink::new());
    let searcher = Pipeline::builder(search.path())
        .concurrency(4)
        .sink(sink.clone())
        .build()
        .unwrap();
    let result = searcher
        .run(&WorkerTask::FindDuplicates { store, fuzz: 0.15 })
        .unwrap();

    assert_eq!(result.files_queued, 4);
    assert_eq!(result.unsupported, 1);
    assert_eq!(result.processed, 3);
    assert_eq!(result.failed, 0);

    let mut lines = sink.lines();
    lines.sort();
    let copy = search.path().join("a_copy.png");
    let edited = search.path().join("nested/a_edited.png");
    assert_eq!(
        lines,
        vec![
            format!("{} is identical to a", copy.display()),
            format!("{} is similar to a", edited.display()),
        ]
    );

    assert_eq!(result.matches.len(), 2);
    let identical = result
        .matches
        .iter()
        .find(|m| m.kind == MatchKind::Identical)
        .unwrap();
    assert_eq!(identical.candidate, copy);
    assert_eq!(identical.reference, fingerprints.join("a.tif"));
}

#[test]
fn corrupt_file_is_skipped_and_the_rest_processed() {
    let temp = TempDir::new().unwrap();
    let fingerprints = generate_references(&temp);

    let search = temp.child("search");
    search.create_dir_all().unwrap();
    search.child("corrupt.jpg").write_str("this is not a valid image file").unwrap();
    save(&solid_blue(), &search.path().join("blue.png"));

    let store = Arc::new(
        FingerprintStore::load(
            &fingerprints,
            Arc::new(PixelEngine::new()),
            &FingerprintConfig::default(),
        )
        .unwrap(),
    );
    let sink = Arc::new(MemorySink::new());
    let result = Pipeline::builder(search.path())
        .sink(sink.clone())
        .build()
        .unwrap()
        .run(&WorkerTask::FindDuplicates { store, fuzz: 0.15 })
        .unwrap();

    assert_eq!(result.failed, 1);
    assert_eq!(result.processed, 1);
    assert_eq!(
        sink.lines(),
        vec![format!(
            "{} is identical to b",
            search.path().join("blue.png").display()
        )]
    );
}

/// Encode `image` as a JPEG whose APP1 segment carries `fields`
fn jpeg_with_exif(image: &RgbImage, fields: &[Field]) -> Vec<u8> {
    let mut writer = Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, true).unwrap();
    let tiff = tiff.into_inner();

    let mut jpeg = Cursor::new(Vec::new());
    image.write_to(&mut jpeg, image::ImageFormat::Jpeg).unwrap();
    let jpeg = jpeg.into_inner();

    // SOI, then APP1 "Exif\0\0" + TIFF, then the rest of the encoded file.
    let segment_len = (2 + 6 + tiff.len()) as u16;
    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

fn ascii_field(tag: Tag, value: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![value.as_bytes().to_vec()]),
    }
}

#[test]
fn extract_metadata_reports_capture_time() {
    let temp = TempDir::new().unwrap();

    let fields = [
        ascii_field(Tag::DateTimeOriginal, "2019:07:04 18:30:05"),
        ascii_field(Tag::DateTime, "2020:01:01 00:00:00"),
    ];
    temp.child("beach.jpg")
        .write_binary(&jpeg_with_exif(&gradient(), &fields))
        .unwrap();
    save(&gradient(), &temp.path().join("plain.png"));

    let sink = Arc::new(MemorySink::new());
    let result = Pipeline::builder(temp.path())
        .sink(sink.clone())
        .build()
        .unwrap()
        .run(&WorkerTask::ExtractMetadata)
        .unwrap();

    assert_eq!(
        sink.lines(),
        vec![format!(
            "{}\t2019-07-04 18:30:05",
            temp.path().join("beach.jpg").display()
        )]
    );
    assert_eq!(result.processed, 1);
    assert_eq!(result.no_data, 1);
    assert_eq!(result.failed, 0);
}

#[test]
fn extract_metadata_skips_bmp_and_gif_silently() {
    let temp = TempDir::new().unwrap();
    let pixels = RgbImage::from_pixel(8, 8, Rgb([200, 100, 50]));
    save(&pixels, &temp.path().join("a.bmp"));
    save(&pixels, &temp.path().join("b.gif"));

    let sink = Arc::new(MemorySink::new());
    let result = Pipeline::builder(temp.path())
        .sink(sink.clone())
        .build()
        .unwrap()
        .run(&WorkerTask::ExtractMetadata)
        .unwrap();

    assert_eq!(result.no_data, 2);
    assert_eq!(result.failed, 0);
    assert_eq!(result.processed, 0);
    assert!(sink.lines().is_empty());
}

#[test]
fn extract_metadata_rejects_truncated_jpeg_with_intact_exif() {
    let temp = TempDir::new().unwrap();

    let fields = [ascii_field(Tag::DateTimeOriginal, "2019:07:04 18:30:05")];
    let whole = jpeg_with_exif(&gradient(), &fields);
    // Keep the EXIF segment and a few bytes of scan data, drop the rest.
    let app1_end = 4 + u16::from_be_bytes([whole[4], whole[5]]) as usize;
    temp.child("broken.jpg")
        .write_binary(&whole[..app1_end + 16])
        .unwrap();

    let sink = Arc::new(MemorySink::new());
    let result = Pipeline::builder(temp.path())
        .sink(sink.clone())
        .build()
        .unwrap()
        .run(&WorkerTask::ExtractMetadata)
        .unwrap();

    assert_eq!(result.failed, 1);
    assert_eq!(result.processed, 0);
    assert!(sink.lines().is_empty());
}

#[test]
fn four_workers_account_for_every_file_of_a_live_walk() {
    let temp = TempDir::new().unwrap();
    let tiny = RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]));
    for index in 0..100 {
        let dir = temp.child(format!("roll_{}", index % 7));
        dir.create_dir_all().unwrap();
        match index % 5 {
            0 => dir
                .child(format!("scan_{}.txt", index))
                .write_str("not a photo")
                .unwrap(),
            1 => dir
                .child(format!("bad_{}.jpg", index))
                .write_str("truncated")
                .unwrap(),
            _ => save(&tiny, &dir.path().join(format!("img_{}.png", index))),
        }
    }

    let result = Pipeline::builder(temp.path())
        .concurrency(4)
        .sink(Arc::new(MemorySink::new()))
        .build()
        .unwrap()
        .run(&WorkerTask::ExtractMetadata)
        .unwrap();

    assert_eq!(result.files_queued, 100);
    assert_eq!(
        result.processed + result.failed + result.no_data + result.unsupported,
        100
    );
    assert_eq!(result.unsupported, 20);
    assert_eq!(result.failed, 20);
    assert_eq!(result.no_data, 60);
    assert!(!result.cancelled);
}

#[test]
fn empty_directory_completes_with_nothing_to_do() {
    let temp = TempDir::new().unwrap();
    let sink = Arc::new(MemorySink::new());

    let result = Pipeline::builder(temp.path())
        .sink(sink.clone())
        .build()
        .unwrap()
        .run(&WorkerTask::ExtractMetadata)
        .unwrap();

    assert_eq!(result.files_queued, 0);
    assert_eq!(result.directories_visited, 1);
    assert!(sink.lines().is_empty());
}
