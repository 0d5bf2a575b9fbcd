use fusion_dict::makedict::{
    build_dictionary, from_bytes, is_binary_dictionary, read_dictionary, read_dictionary_file,
    read_header, to_bytes, write_dictionary, DictionaryHeader, FusionDictionary, MakedictError,
    WeightedString, Word,
};
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};

fn word(text: &str, frequency: u8, bigrams: &[(&str, u8)]) -> Word {
    Word {
        word: text.to_string(),
        frequency,
        bigrams: bigrams
            .iter()
            .map(|&(w, f)| WeightedString::new(w, f))
            .collect(),
    }
}

fn sample_dictionary() -> FusionDictionary {
    let mut dict = FusionDictionary::new();
    let entries: &[(&str, u32, &[(&str, u8)])] = &[
        ("the", 255, &[("end", 9), ("cat", 3)]),
        ("then", 180, &[]),
        ("there", 170, &[("is", 12)]),
        ("café", 40, &[("crème", 2)]),
        ("中文", 90, &[("the", 1)]),
        ("日本語", 80, &[]),
        ("cat", 120, &[("the", 15)]),
        ("category", 20, &[]),
        ("a", 200, &[("cat", 7)]),
    ];
    for &(text, frequency, bigrams) in entries {
        let bigrams = bigrams
            .iter()
            .map(|&(w, f)| WeightedString::new(w, f))
            .collect();
        dict.add(text, frequency, bigrams)
            .unwrap_or_else(|e| panic!("failed to add {}: {}", text, e));
    }
    dict
}

#[test]
fn round_trip_through_bytes() {
    let mut dict = sample_dictionary();
    let expected: Vec<Word> = dict.iter().collect();
    let bytes = to_bytes(&mut dict).expect("serialize");

    let header = read_header(&mut bytes.as_slice()).expect("header");
    assert_eq!(header, DictionaryHeader::default());

    let read = from_bytes(&bytes).expect("deserialize");
    let actual: Vec<Word> = read.iter().collect();
    assert_eq!(actual, expected);
    assert_eq!(read.count_nodes(), dict.count_nodes());
    assert_eq!(read.count_char_groups(), dict.count_char_groups());

    // placeholders survive as frequency 0 terminals
    assert_eq!(read.frequency("end"), Some(0));
    assert_eq!(read.frequency("crème"), Some(0));
    assert!(!read.contains("ther"));
}

#[test]
fn round_trip_is_byte_stable() {
    let mut dict = sample_dictionary();
    let bytes = to_bytes(&mut dict).expect("serialize");
    let mut read = from_bytes(&bytes).expect("deserialize");
    let again = to_bytes(&mut read).expect("serialize again");
    assert_eq!(bytes, again);
}

#[test]
fn round_trip_through_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("sample.dict");

    let mut dict = sample_dictionary();
    {
        let mut out = BufWriter::new(File::create(&path).expect("create"));
        write_dictionary(&mut out, &mut dict).expect("write");
        out.flush().expect("flush");
    }

    assert!(is_binary_dictionary(&path));
    let read = read_dictionary_file(&path).expect("read file");
    assert_eq!(read.iter().collect::<Vec<_>>(), dict.iter().collect::<Vec<_>>());

    let text_path = dir.path().join("words.xml");
    std::fs::write(&text_path, "<wordlist/>").expect("write text");
    assert!(!is_binary_dictionary(&text_path));
    assert!(!is_binary_dictionary(dir.path().join("missing")));
}

#[test]
fn an_ant_and_scenario() {
    let bytes = build_dictionary(vec![
        ("an", 200, vec![]),
        ("ant", 50, vec![]),
        ("and", 180, vec![WeightedString::new("an", 11)]),
    ])
    .expect("build");

    let dict = read_dictionary(&mut Cursor::new(&bytes)).expect("read");
    assert_eq!(
        dict.iter().collect::<Vec<_>>(),
        vec![
            word("an", 200, &[]),
            word("and", 180, &[("an", 11)]),
            word("ant", 50, &[]),
        ]
    );
}

#[test]
fn cat_car_share_a_prefix() {
    let mut dict = FusionDictionary::new();
    dict.add("cat", 10, vec![]).expect("add cat");
    dict.add("car", 20, vec![]).expect("add car");

    let root = dict.node(dict.root());
    assert_eq!(root.groups().len(), 1);
    let ca = &root.groups()[0];
    assert_eq!(ca.chars(), &['c', 'a']);
    assert!(!ca.is_terminal());

    let children = dict.node(ca.children().expect("ca has children"));
    let tails: Vec<(&[char], Option<u8>)> = children
        .groups()
        .iter()
        .map(|g| (g.chars(), g.frequency()))
        .collect();
    assert_eq!(tails, vec![(&['r'][..], Some(20)), (&['t'][..], Some(10))]);
}

#[test]
fn character_width_boundary() {
    let mut dict = FusionDictionary::new();
    dict.add("\u{1F}", 1, vec![]).expect("add control");
    dict.add(" ", 2, vec![]).expect("add space");
    dict.add("\u{FF}", 3, vec![]).expect("add y-diaeresis");
    dict.add("\u{100}", 4, vec![]).expect("add A-macron");
    let bytes = to_bytes(&mut dict).expect("serialize");

    // header, count, then groups in code point order
    let stream = &bytes[5..];
    assert_eq!(stream[0], 4);
    assert_eq!(&stream[1..6], &[0x10, 0x00, 0x00, 0x1F, 1]);
    assert_eq!(&stream[6..9], &[0x10, 0x20, 2]);
    assert_eq!(&stream[9..12], &[0x10, 0xFF, 3]);
    assert_eq!(&stream[12..17], &[0x10, 0x00, 0x01, 0x00, 4]);

    let read = from_bytes(&bytes).expect("deserialize");
    assert_eq!(read.frequency("\u{1F}"), Some(1));
    assert_eq!(read.frequency("\u{100}"), Some(4));
}

#[test]
fn group_count_limit_is_enforced() {
    let mut dict = FusionDictionary::new();
    for code in 0x4E00u32..0x4E00 + 127 {
        let text = char::from_u32(code).expect("valid char").to_string();
        dict.add(&text, 1, vec![]).expect("add");
    }
    to_bytes(&mut dict.clone()).expect("127 groups fit");

    dict.add("\u{4E00}\u{4E00}", 1, vec![]).expect("add nested");
    to_bytes(&mut dict.clone()).expect("nesting does not count against the root");

    dict.add("z", 1, vec![]).expect("add 128th first character");
    match to_bytes(&mut dict) {
        Err(MakedictError::TooManyGroups { count }) => assert_eq!(count, 128),
        other => panic!("expected TooManyGroups, got {:?}", other.map(|b| b.len())),
    }
}

#[test]
fn frequency_limit_is_enforced() {
    let mut dict = FusionDictionary::new();
    dict.add("max", 255, vec![]).expect("255 is allowed");
    let err = dict.add("over", 256, vec![]).expect_err("256 is rejected");
    assert!(matches!(err, MakedictError::FrequencyOutOfRange { frequency: 256, .. }));
    assert!(!err.is_format_error());
    assert!(!dict.contains("over"));
}

#[test]
fn duplicate_and_placeholder_words() {
    let mut dict = FusionDictionary::new();
    dict.add("hello", 100, vec![WeightedString::new("world", 5)]).expect("add hello");
    assert_eq!(dict.frequency("world"), Some(0));

    dict.add("world", 90, vec![]).expect("placeholder is promoted");
    assert_eq!(dict.frequency("world"), Some(90));

    let err = dict.add("hello", 1, vec![]).expect_err("duplicate");
    assert!(matches!(err, MakedictError::DuplicateWord(ref w) if w == "hello"));
}

#[test]
fn format_errors_are_detected() {
    let mut dict = sample_dictionary();
    let bytes = to_bytes(&mut dict).expect("serialize");

    let mut bad_magic = bytes.clone();
    bad_magic[0] = 0x00;
    let err = from_bytes(&bad_magic).expect_err("bad magic");
    assert!(matches!(err, MakedictError::BadMagic { found: 0x00B1, .. }));
    assert!(err.is_format_error());

    let mut newer = bytes.clone();
    newer[2] = 2;
    let err = from_bytes(&newer).expect_err("newer version");
    assert!(matches!(err, MakedictError::UnsupportedVersion { found: 2, supported: 1 }));

    let mut options = bytes.clone();
    options[4] = 1;
    assert!(from_bytes(&options).expect_err("options").is_format_error());

    let err = from_bytes(&bytes[..bytes.len() - 1]).expect_err("truncated");
    assert!(matches!(err, MakedictError::Io(_)));
}

#[test]
fn empty_dictionary_round_trips() {
    let bytes = build_dictionary(Vec::<(&str, u32, Vec<WeightedString>)>::new()).expect("build");
    assert_eq!(bytes.len(), 6);
    let dict = from_bytes(&bytes).expect("read");
    assert!(dict.is_empty());
    assert_eq!(dict.iter().count(), 0);
}

#[test]
fn version_zero_files_are_read() {
    let bytes = [0x78u8, 0xB1, 0x00, 0x00, 0x00, 0x00];
    let dict = from_bytes(&bytes).expect("version 0 dictionary");
    assert!(dict.is_empty());
}

#[test]
fn deep_chain_round_trips() {
    const DEPTH: usize = 5000;
    let mut dict = FusionDictionary::new();
    for length in 1..=DEPTH {
        dict.add(&"a".repeat(length), (length % 255 + 1) as u32, vec![])
            .unwrap_or_else(|e| panic!("failed to add word of length {}: {}", length, e));
    }
    let deepest = "a".repeat(DEPTH);
    dict.add("b", 7, vec![WeightedString::new(deepest.clone(), 4)])
        .expect("associated word at the bottom of the chain");

    let bytes = to_bytes(&mut dict).expect("serialize");
    let read = from_bytes(&bytes).expect("deserialize");

    assert_eq!(read.count_nodes(), dict.count_nodes());
    assert_eq!(read.frequency(&deepest), Some((DEPTH % 255 + 1) as u8));
    assert_eq!(read.bigrams("b").expect("b"), &[WeightedString::new(deepest, 4)]);
    assert_eq!(read.iter().collect::<Vec<_>>(), dict.iter().collect::<Vec<_>>());
}

#[test]
fn offsets_over_64k_take_three_bytes() {
    const PER_PREFIX: usize = 20000;
    let first = "a00000";
    let mut dict = FusionDictionary::new();
    for prefix in ['a', 'b'] {
        for i in 0..PER_PREFIX {
            let text = format!("{}{:05}", prefix, i);
            let bigrams = if text == first {
                vec![]
            } else {
                vec![WeightedString::new(first, 5)]
            };
            dict.add(&text, (i % 256) as u32, bigrams)
                .unwrap_or_else(|e| panic!("failed to add {}: {}", text, e));
        }
    }

    let bytes = to_bytes(&mut dict).expect("serialize");
    assert!(bytes.len() > 6 + 0x10000);

    // The "b" subtree starts after the whole "a" subtree.
    let b_group = &dict.node(dict.root()).groups()[1];
    assert_eq!(b_group.first_char(), 'b');
    let b_children = b_group.children().expect("b has children");
    let children_offset = dict.node(b_children).cached_address().expect("placed")
        - b_group.cached_address().expect("placed");
    assert!(children_offset > 0xFFFF, "children offset {}", children_offset);

    // The last word points all the way back to the first one.
    let last = dict.group(dict.find_group("b19999").expect("last word"));
    let target = dict.group(dict.find_group(first).expect("first word"));
    let bigram_distance =
        last.cached_address().expect("placed") - target.cached_address().expect("placed");
    assert!(bigram_distance > 0xFFFF, "bigram distance {}", bigram_distance);

    let read = from_bytes(&bytes).expect("deserialize");
    assert_eq!(read.count_char_groups(), dict.count_char_groups());
    assert_eq!(read.bigrams("b19999").expect("last word"), &[WeightedString::new(first, 5)]);
    assert_eq!(read.iter().collect::<Vec<_>>(), dict.iter().collect::<Vec<_>>());
}
