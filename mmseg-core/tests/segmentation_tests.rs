//! End-to-end segmentation behavior on small dictionaries

use mmseg_core::dictionary::{
    ColumnType, FieldValue, MemoryDictionary, MemoryDictionaryManager, Schema,
    BASE_DICTIONARY_NAME, FREQ_COLUMN,
};
use mmseg_core::{SegmentOptions, SegmentStatus, Segmentor};
use std::sync::Arc;

fn base_dictionary(terms: &[(&str, u32)]) -> MemoryDictionary {
    let schema = Schema::new()
        .with_column(FREQ_COLUMN, ColumnType::U32)
        .with_column("pinyin", ColumnType::Str);
    let mut dict = MemoryDictionary::new(BASE_DICTIONARY_NAME, schema);
    for &(term, freq) in terms {
        dict.insert(term, [(FREQ_COLUMN, FieldValue::U32(freq))])
            .unwrap();
    }
    dict
}

fn segmentor_with(dicts: Vec<MemoryDictionary>) -> Segmentor {
    let mut mgr = MemoryDictionaryManager::new();
    for dict in dicts {
        mgr.add(dict).unwrap();
    }
    Segmentor::new(Arc::new(mgr)).unwrap()
}

/// Run a stream to completion and collect the tags of every call
fn segment(segmentor: &Segmentor, status: &mut SegmentStatus, text: &str) -> String {
    let mut tags = String::new();
    let mut next = Some(text);
    loop {
        segmentor.tokenize(0, next.take(), status).unwrap();
        tags.extend(status.emitted().map(|(_, tag)| tag.as_char()));
        if status.is_finished() {
            return tags;
        }
    }
}

fn segment_default(segmentor: &Segmentor, text: &str) -> String {
    let mut status = segmentor
        .create_status(SegmentOptions::default())
        .unwrap();
    segment(segmentor, &mut status, text)
}

#[test]
fn test_international_organization() {
    let seg = segmentor_with(vec![base_dictionary(&[
        ("国", 50),
        ("际", 30),
        ("国际", 0),
        ("组织", 0),
    ])]);
    assert_eq!(segment_default(&seg, "国际组织"), "BEBE");
}

#[test]
fn test_single_unmatched_character() {
    let seg = segmentor_with(vec![base_dictionary(&[("国际", 0)])]);
    assert_eq!(segment_default(&seg, "好"), "S");
}

#[test]
fn test_unknown_characters_are_singles() {
    let seg = segmentor_with(vec![base_dictionary(&[("中国", 0)])]);
    assert_eq!(segment_default(&seg, "我爱中国"), "SSBE");
}

#[test]
fn test_minimum_variance_beats_longer_first_term() {
    let seg = segmentor_with(vec![base_dictionary(&[
        ("研究", 0),
        ("研究生", 0),
        ("生命", 0),
        ("命", 0),
        ("起源", 0),
    ])]);
    // 研究生|命|起源 and 研究|生命|起源 cover six characters;
    // the even split has the smaller variance
    assert_eq!(segment_default(&seg, "研究生命起源"), "BEBEBE");
}

#[test]
fn test_freedom_decides_between_equal_chunks() {
    let high_first = segmentor_with(vec![base_dictionary(&[
        ("长", 100),
        ("墙", 1),
        ("长城", 0),
        ("城墙", 0),
    ])]);
    assert_eq!(segment_default(&high_first, "长城墙"), "SBE");

    let high_last = segmentor_with(vec![base_dictionary(&[
        ("长", 1),
        ("墙", 100),
        ("长城", 0),
        ("城墙", 0),
    ])]);
    assert_eq!(segment_default(&high_last, "长城墙"), "BES");
}

#[test]
fn test_user_dictionary_takes_priority() {
    let base = base_dictionary(&[("国际", 0), ("组织", 0)]);
    let mut user = MemoryDictionary::new("user", Schema::new());
    user.insert_term("国").unwrap();

    let seg = segmentor_with(vec![base.clone()]);
    assert_eq!(segment_default(&seg, "国际组织"), "BEBE");

    let seg = segmentor_with(vec![base, user]);
    assert_eq!(segment_default(&seg, "国际组织"), "SSBE");
}

#[test]
fn test_longest_user_term_wins() {
    let base = base_dictionary(&[("中国", 0)]);
    let mut user = MemoryDictionary::new("user", Schema::new());
    user.insert_term("中国人").unwrap();
    user.insert_term("中国人民银").unwrap();

    let seg = segmentor_with(vec![base, user]);
    assert_eq!(segment_default(&seg, "中国人民银行"), "BMMMES");
}

#[test]
fn test_whitespace_is_forced_single() {
    // the two-space term never starts a token: whitespace is seeded single
    let seg = segmentor_with(vec![base_dictionary(&[("中国", 0), ("  ", 0)])]);
    assert_eq!(segment_default(&seg, "中国  人"), "BESSS");
}

#[test]
fn test_case_folding_option() {
    let seg = segmentor_with(vec![base_dictionary(&[("dna", 0)])]);
    assert_eq!(segment_default(&seg, "DNA"), "BME");

    let mut status = seg
        .create_status(SegmentOptions {
            lowercase: false,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(segment(&seg, &mut status, "DNA"), "SSS");
    assert_eq!(segment(&seg, &mut status, "dna"), "BME");
}

#[test]
fn test_raw_characters_are_preserved() {
    let seg = segmentor_with(vec![base_dictionary(&[("dna", 0)])]);
    let mut status = seg.create_status(SegmentOptions::default()).unwrap();
    seg.tokenize(0, Some("DNA"), &mut status).unwrap();
    let raw: String = status.emitted().map(|(c, _)| c).collect();
    assert_eq!(raw, "DNA");
}

#[test]
fn test_annotations_from_bound_columns() {
    let mut base = base_dictionary(&[("组织", 0)]);
    base.insert(
        "国际",
        [
            (FREQ_COLUMN, FieldValue::U32(0)),
            ("pinyin", FieldValue::from("guo ji")),
        ],
    )
    .unwrap();
    let mut user = MemoryDictionary::new(
        "user",
        Schema::new().with_column("pinyin", ColumnType::Str),
    );
    user.insert("国际", [("pinyin", FieldValue::from("guoji"))])
        .unwrap();

    let mut seg = segmentor_with(vec![base, user]);
    let mut status = seg
        .create_status(SegmentOptions::default().with_annotation("pinyin", 3))
        .unwrap();
    seg.bind_annote(&status).unwrap();

    seg.tokenize(0, Some("国际组织"), &mut status).unwrap();
    let found: Vec<_> = status.annotations_for(0, 2).collect();
    // the user term wins the position; the first dictionary holding the term
    // supplies the value
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].0, 3);
    assert_eq!(found[0].1.dict_id, 0);
    assert_eq!(found[0].1.as_text(), "guo ji");

    // 组织 has no pinyin value
    assert_eq!(status.annotations_for(2, 2).count(), 0);
}

#[test]
fn test_status_reuse_resets_state() {
    let seg = segmentor_with(vec![base_dictionary(&[("国际", 0), ("组织", 0)])]);
    let mut status = seg.create_status(SegmentOptions::default()).unwrap();
    assert_eq!(segment(&seg, &mut status, "国际组织"), "BEBE");
    assert_eq!(segment(&seg, &mut status, "组织"), "BE");
    assert_eq!(status.stream_offset(), 0);
}

#[test]
fn test_missing_base_dictionary_is_config_error() {
    let mut mgr = MemoryDictionaryManager::new();
    mgr.add(MemoryDictionary::new("user", Schema::new()))
        .unwrap();
    let err = Segmentor::new(Arc::new(mgr)).unwrap_err();
    assert!(err.to_string().contains(BASE_DICTIONARY_NAME));
}

#[test]
fn test_base_dictionary_loaded_after_user_is_rejected() {
    let terms = [("研究", 40), ("研究生", 10), ("生命", 30), ("起源", 20)];
    let first = segmentor_with(vec![
        base_dictionary(&terms),
        MemoryDictionary::new("other", Schema::new()),
    ]);
    assert_eq!(segment_default(&first, "研究生命起源"), "BEBEBE");

    let mut mgr = MemoryDictionaryManager::new();
    mgr.add(MemoryDictionary::new("other", Schema::new())).unwrap();
    mgr.add(base_dictionary(&terms)).unwrap();
    let err = Segmentor::new(Arc::new(mgr)).unwrap_err();
    assert!(err.to_string().contains("must be loaded first"));
}
