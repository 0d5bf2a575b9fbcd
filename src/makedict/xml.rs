//! Import and export of the human-editable markup word lists.
//!
//! Unigram lists:
//! ```xml
//! <wordlist>
//!   <w f="200">an</w>
//!   <w word="and" f="180">
//!     <bigram f="4">an</bigram>
//!   </w>
//! </wordlist>
//! ```
//!
//! Bigram lists, whose `p` is scaled down by 8 on import:
//! ```xml
//! <bigrams>
//!   <bi w1="and"><w w2="an" p="40"/></bi>
//! </bigrams>
//! ```

use std::collections::HashMap;
use std::io::{BufRead, Write};

use log::{debug, info};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::dictionary::FusionDictionary;
use super::format::MAX_BIGRAM_FREQUENCY;
use super::types::error::{MakedictError, Result};
use super::types::models::WeightedString;

const WORD_TAG: &[u8] = b"w";
const BIGRAM_TAG: &[u8] = b"bigram";
const WORD_ATTR: &[u8] = b"word";
const FREQUENCY_ATTR: &[u8] = b"f";
const BIGRAM_W1_TAG: &[u8] = b"bi";
const BIGRAM_W2_TAG: &[u8] = b"w";
const BIGRAM_W1_ATTR: &[u8] = b"w1";
const BIGRAM_W2_ATTR: &[u8] = b"w2";
const BIGRAM_FREQUENCY_ATTR: &[u8] = b"p";
/// Bigram list probabilities are divided by this to fit 4 bits.
const BIGRAM_FREQUENCY_DIVISOR: u32 = 8;

/// Associated words by first word, as read from a bigram list.
pub type BigramMap = HashMap<String, Vec<WeightedString>>;

fn xml_error(reader_position: usize, err: impl std::fmt::Display) -> MakedictError {
    MakedictError::MalformedXml(format!("at byte {}: {}", reader_position, err))
}

/// Collects the attributes of an element by name.
fn attributes(element: &BytesStart<'_>) -> Result<HashMap<Vec<u8>, String>> {
    element
        .attributes()
        .map(|attr| {
            let attr = attr.map_err(|e| {
                MakedictError::MalformedXml(format!("Failed to parse attribute: {}", e))
            })?;
            let value = attr
                .unescape_value()
                .map_err(|e| MakedictError::MalformedXml(format!("Bad attribute value: {}", e)))?;
            Ok((attr.key.local_name().as_ref().to_vec(), value.into_owned()))
        })
        .collect()
}

fn required<'a>(attrs: &'a HashMap<Vec<u8>, String>, name: &[u8], tag: &str) -> Result<&'a str> {
    attrs.get(name).map(String::as_str).ok_or_else(|| {
        MakedictError::MalformedXml(format!(
            "<{}> without {} attribute",
            tag,
            String::from_utf8_lossy(name)
        ))
    })
}

fn parse_number(value: &str, what: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| MakedictError::MalformedXml(format!("Invalid {}: {:?}", what, value)))
}

/// Reads a bigram list into a map from first word to its associated words.
pub fn read_bigram_map<R: BufRead>(source: R) -> Result<BigramMap> {
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();
    let mut map = BigramMap::new();
    let mut first: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = e.local_name();
                if name.as_ref() == BIGRAM_W1_TAG {
                    let attrs = attributes(&e)?;
                    first = Some(required(&attrs, BIGRAM_W1_ATTR, "bi")?.to_string());
                } else if name.as_ref() == BIGRAM_W2_TAG {
                    let attrs = attributes(&e)?;
                    let w1 = first.clone().ok_or_else(|| {
                        MakedictError::MalformedXml("<w> outside of <bi>".to_string())
                    })?;
                    let w2 = required(&attrs, BIGRAM_W2_ATTR, "w")?;
                    let p = parse_number(
                        required(&attrs, BIGRAM_FREQUENCY_ATTR, "w")?,
                        "probability",
                    )?;
                    let frequency = (p / BIGRAM_FREQUENCY_DIVISOR)
                        .min(u32::from(MAX_BIGRAM_FREQUENCY))
                        as u8;
                    map.entry(w1).or_default().push(WeightedString::new(w2, frequency));
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == BIGRAM_W1_TAG {
                    first = None;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(xml_error(reader.buffer_position(), e)),
        }
        buf.clear();
    }

    debug!("Read bigrams for {} words", map.len());
    Ok(map)
}

/// A `<w>` element being read.
#[derive(Default)]
struct PendingWord {
    word: Option<String>,
    text: String,
    frequency: u32,
    bigrams: Vec<WeightedString>,
}

/// A `<bigram>` element being read inside a `<w>`.
struct PendingBigram {
    frequency: u32,
    text: String,
}

/// Builds a dictionary from a unigram list and an optional bigram map.
///
/// Words are added in document order. Associated words come from nested
/// `<bigram>` elements followed by the map entry for the word, if any.
pub fn read_dictionary_xml<R: BufRead>(
    unigrams: R,
    bigrams: Option<&BigramMap>,
) -> Result<FusionDictionary> {
    info!("Reading markup word list");
    let mut reader = Reader::from_reader(unigrams);
    let mut buf = Vec::new();
    let mut dict = FusionDictionary::new();
    let mut word: Option<PendingWord> = None;
    let mut bigram: Option<PendingBigram> = None;
    let mut count = 0usize;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_error(reader.buffer_position(), e))?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == WORD_TAG => {
                let attrs = attributes(e)?;
                let frequency = parse_number(required(&attrs, FREQUENCY_ATTR, "w")?, "frequency")?;
                let pending = PendingWord {
                    word: attrs.get(WORD_ATTR).cloned(),
                    frequency,
                    ..PendingWord::default()
                };
                if matches!(event, Event::Empty(_)) {
                    add_word(&mut dict, pending, bigrams)?;
                    count += 1;
                } else {
                    word = Some(pending);
                }
            }
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == BIGRAM_TAG => {
                if word.is_none() {
                    return Err(MakedictError::MalformedXml("<bigram> outside of <w>".to_string()));
                }
                let attrs = attributes(e)?;
                let frequency =
                    parse_number(required(&attrs, FREQUENCY_ATTR, "bigram")?, "frequency")?;
                let pending = PendingBigram {
                    frequency,
                    text: String::new(),
                };
                if matches!(event, Event::Empty(_)) {
                    return Err(MakedictError::MalformedXml("Empty <bigram>".to_string()));
                }
                bigram = Some(pending);
            }
            Event::Text(ref e) => {
                let text = e
                    .unescape()
                    .map_err(|err| xml_error(reader.buffer_position(), err))?;
                if let Some(pending) = bigram.as_mut() {
                    pending.text.push_str(&text);
                } else if let Some(pending) = word.as_mut() {
                    pending.text.push_str(&text);
                }
            }
            Event::CData(ref e) => {
                let text = String::from_utf8_lossy(e);
                if let Some(pending) = bigram.as_mut() {
                    pending.text.push_str(&text);
                } else if let Some(pending) = word.as_mut() {
                    pending.text.push_str(&text);
                }
            }
            Event::End(ref e) if e.local_name().as_ref() == BIGRAM_TAG => {
                if let (Some(done), Some(owner)) = (bigram.take(), word.as_mut()) {
                    let frequency = u8::try_from(done.frequency).unwrap_or(u8::MAX);
                    owner
                        .bigrams
                        .push(WeightedString::new(done.text.trim(), frequency));
                }
            }
            Event::End(ref e) if e.local_name().as_ref() == WORD_TAG => {
                if let Some(done) = word.take() {
                    add_word(&mut dict, done, bigrams)?;
                    count += 1;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    info!("Read {} words", count);
    Ok(dict)
}

fn add_word(
    dict: &mut FusionDictionary,
    pending: PendingWord,
    map: Option<&BigramMap>,
) -> Result<()> {
    let word = match pending.word {
        Some(word) => word,
        None => pending.text.trim().to_string(),
    };
    let mut bigrams = pending.bigrams;
    if let Some(extra) = map.and_then(|m| m.get(&word)) {
        bigrams.extend(extra.iter().cloned());
    }
    dict.add(&word, pending.frequency, bigrams)
}

/// Writes every word of `dict`, in iteration order, as a format 2 word list.
pub fn write_dictionary_xml<W: Write>(dest: &mut W, dict: &FusionDictionary) -> Result<()> {
    writeln!(dest, "<wordlist format=\"2\">")?;
    for word in dict {
        write!(
            dest,
            "  <w word=\"{}\" f=\"{}\">",
            escape(word.word.as_str()),
            word.frequency
        )?;
        if !word.bigrams.is_empty() {
            writeln!(dest)?;
            for bigram in &word.bigrams {
                writeln!(
                    dest,
                    "    <bigram f=\"{}\">{}</bigram>",
                    bigram.frequency,
                    escape(bigram.word.as_str())
                )?;
            }
            write!(dest, "  ")?;
        }
        writeln!(dest, "</w>")?;
    }
    writeln!(dest, "</wordlist>")?;
    dest.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_text_and_attribute_words() {
        let xml = r#"<wordlist>
            <w f="200">an</w>
            <w word="and" f="180"><bigram f="4">an</bigram></w>
            <w word="ant" f="50"/>
        </wordlist>"#;
        let dict = read_dictionary_xml(xml.as_bytes(), None).unwrap();
        assert_eq!(dict.frequency("an"), Some(200));
        assert_eq!(dict.frequency("ant"), Some(50));
        assert_eq!(dict.bigrams("and").unwrap(), &[WeightedString::new("an", 4)]);
    }

    #[test]
    fn bigram_probabilities_are_scaled_and_clamped() {
        let xml = r#"<bigrams>
            <bi w1="hello"><w w2="world" p="100"/><w w2="there" p="255"/></bi>
        </bigrams>"#;
        let map = read_bigram_map(xml.as_bytes()).unwrap();
        assert_eq!(
            map["hello"],
            vec![WeightedString::new("world", 12), WeightedString::new("there", 15)]
        );

        let words = r#"<wordlist><w f="10">hello</w></wordlist>"#;
        let dict = read_dictionary_xml(words.as_bytes(), Some(&map)).unwrap();
        assert_eq!(dict.frequency("world"), Some(0));
        assert_eq!(dict.bigrams("hello").unwrap().len(), 2);
    }

    #[test]
    fn escapes_on_export_and_reads_back() {
        let mut dict = FusionDictionary::new();
        dict.add("R&D", 30, vec![WeightedString::new("<tag>", 2)]).unwrap();
        let mut out = Vec::new();
        write_dictionary_xml(&mut out, &dict).unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.starts_with("<wordlist format=\"2\">\n"));
        assert!(text.contains("word=\"R&amp;D\""));
        assert!(text.contains("&lt;tag&gt;"));

        let back = read_dictionary_xml(out.as_slice(), None).unwrap();
        assert_eq!(back.iter().collect::<Vec<_>>(), dict.iter().collect::<Vec<_>>());
    }

    #[test]
    fn missing_frequency_is_malformed() {
        let xml = r#"<wordlist><w>oops</w></wordlist>"#;
        assert!(matches!(
            read_dictionary_xml(xml.as_bytes(), None),
            Err(MakedictError::MalformedXml(_))
        ));
    }
}
