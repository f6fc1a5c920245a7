//! End-to-end sweep tests over the builtin codecs
//!
//! Run with: cargo test --test sweep

use std::fs;

use jis_charsets::{
    kuten, CodecSet, Config, Coordinate, DoubleByteLayout, Encoding, Entry, ExceptionTables,
    Fidelity, Kubun, MenKuten, RecordKind, Section, Sweep,
};
use pretty_assertions::assert_eq;

fn run_sweep(codecs: &CodecSet) -> Vec<Entry> {
    let tables = ExceptionTables::default();
    Sweep::new(codecs, &tables, Default::default(), Default::default())
        .run()
        .unwrap()
}

fn find<'a>(entries: &'a [Entry], section: Section, coordinate: &str) -> Vec<&'a Entry> {
    entries
        .iter()
        .filter(|e| e.section == section && e.coordinate.to_string() == coordinate)
        .collect()
}

#[test]
fn test_sweep_is_deterministic() {
    let codecs = CodecSet::builtin();
    let first: Vec<String> = run_sweep(&codecs)
        .iter()
        .map(|e| serde_json::to_string(e).unwrap())
        .collect();
    let second: Vec<String> = run_sweep(&codecs)
        .iter()
        .map(|e| serde_json::to_string(e).unwrap())
        .collect();
    assert_eq!(first.len(), second.len());
    assert!(first == second, "two sweeps produced different output");
}

#[test]
fn test_sections_in_order() {
    let entries = run_sweep(&CodecSet::builtin());
    assert!(entries.windows(2).all(|w| w[0].section <= w[1].section));
    assert_eq!(entries.first().map(|e| e.section), Some(Section::Ascii));
    assert_eq!(entries.last().map(|e| e.section), Some(Section::Jis0212Kanji));
}

#[test]
fn test_undefined_and_user_defined_codes() {
    let entries = run_sweep(&CodecSet::builtin());
    let mut undefined = 0;
    for entry in &entries {
        if entry.section == Section::UserDefined {
            assert_eq!(entry.kubun, Kubun::UserDefined, "{}", entry.coordinate);
            assert_eq!(entry.kubun.to_string(), "888888");
        } else if entry.record.is_undefined() {
            assert_eq!(entry.kubun.to_string(), "999999", "{}", entry.coordinate);
            assert_eq!(entry.record.canonical, "\u{FFFD}");
            undefined += 1;
        } else {
            assert_eq!(entry.kubun.to_string().len(), 6);
        }
    }
    assert!(undefined > 0);
    assert_eq!(
        entries
            .iter()
            .filter(|e| e.section == Section::UserDefined)
            .count(),
        20 * 94
    );
}

#[test]
fn test_first_level1_kanji() {
    let entries = run_sweep(&CodecSet::builtin());
    let found = find(&entries, Section::Level1, "16-01");
    assert_eq!(found.len(), 1);
    let entry = found[0];
    assert_eq!(entry.record.canonical, "亜");
    assert_eq!(entry.record.defining, vec![0x88, 0x9F]);
    assert_eq!(&entry.kubun.to_string()[2..4], "31");
    for (encoding, verdict) in entry.fidelity.iter() {
        assert_eq!(verdict.outcome, Fidelity::RoundTrips, "{encoding}");
    }
}

#[test]
fn test_differing_mapping_pair() {
    let entries = run_sweep(&CodecSet::builtin());
    let found = find(&entries, Section::DifferingMappings, "02-44");
    assert_eq!(found.len(), 2);

    let (jis, windows) = (found[0], found[1]);
    assert!(matches!(
        jis.record.kind,
        RecordKind::DoubleByte {
            layout: DoubleByteLayout::JisX0208,
            ..
        }
    ));
    assert_eq!(jis.record.canonical, "\u{AC}");
    assert_eq!(jis.record.defining, vec![0x81, 0xCA]);
    assert_eq!(
        jis.fidelity.outcome(Encoding::SHIFT_JIS),
        Some(Fidelity::RoundTrips)
    );
    assert_eq!(jis.fidelity.outcome(Encoding::EUC_JP), Some(Fidelity::RoundTrips));

    assert_eq!(windows.record.canonical, "\u{FFE2}");
    assert_eq!(windows.record.defining, vec![0x81, 0xCA]);
    assert_eq!(
        windows.fidelity.outcome(Encoding::WINDOWS_31J),
        Some(Fidelity::RoundTrips)
    );

    // every differing position also shows up twice in its own row
    assert_eq!(find(&entries, Section::NonKanji, "02-44").len(), 2);
}

#[test]
fn test_backslash_byte_has_two_readings() {
    let entries = run_sweep(&CodecSet::builtin());
    let found = find(&entries, Section::Ascii, "0x5C");
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|e| e.record.defining == vec![0x5C]));
    assert_eq!(found[0].record.canonical, "\\");
    assert_eq!(found[1].record.canonical, "\u{A5}");
    assert_ne!(found[0].kubun, found[1].kubun);
}

#[test]
fn test_double_byte_defining_bytes_match_coordinates() {
    let entries = run_sweep(&CodecSet::builtin());
    for entry in &entries {
        if let RecordKind::DoubleByte { kuten: k, .. } = entry.record.kind {
            let sjis = kuten::kuten_to_shift_jis(k.row, k.col).unwrap();
            assert_eq!(entry.record.defining, kuten::to_bytes(sjis, 2), "{}", k);
        }
    }
}

#[test]
fn test_combining_marks() {
    let entries = run_sweep(&CodecSet::builtin());
    let marks: Vec<&Entry> = entries
        .iter()
        .filter(|e| e.section == Section::Combining)
        .collect();
    assert_eq!(marks.len(), 2);
    assert_eq!(marks[0].coordinate, Coordinate::CodePoint('\u{3099}'));
    assert!(marks.iter().all(|e| e.record.defining.is_empty()));
}

#[test]
fn test_configured_shift_jis_2004_table() {
    let path = std::env::temp_dir().join(format!(
        "jis-charsets-sweep-{}-sjis2004.txt",
        std::process::id()
    ));
    fs::write(&path, "## test table\n0xF040\tU+20089\t# first plane 2 cell\n").unwrap();

    let config = Config::from_toml(&format!(
        "[mappings]\nshift_jis_2004 = {:?}\n",
        path.display().to_string()
    ))
    .unwrap();
    let codecs = config.codecs().unwrap();
    let entries = run_sweep(&codecs);
    fs::remove_file(&path).unwrap();

    let jis0213: Vec<&Entry> = entries
        .iter()
        .filter(|e| matches!(e.record.kind, RecordKind::Jis0213 { .. }))
        .collect();
    assert_eq!(jis0213.len(), 1);
    let entry = jis0213[0];
    assert_eq!(entry.section, Section::Jis0213Level4);
    assert_eq!(entry.coordinate, Coordinate::MenKuten(MenKuten::new(2, 1, 1)));
    assert_eq!(entry.record.canonical, "\u{20089}");
    assert_eq!(
        entry.fidelity.outcome(Encoding::SHIFT_JIS_2004),
        Some(Fidelity::RoundTrips)
    );
}
