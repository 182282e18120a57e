
use proplist::{Error, Value};

/// Assembles a binary document with one-byte offsets and references from the
/// given object bodies, in reference order.
fn build_document(objects: &[&[u8]]) -> Vec<u8> {
    let mut data = Vec::from(&b"bplist00"[..]);
    let mut offsets = Vec::new();
    for object in objects {
        offsets.push(data.len() as u8);
        data.extend_from_slice(object);
    }
    let offset_table_position = data.len();
    data.extend_from_slice(&offsets);
    data.extend_from_slice(&[0; 6]);
    data.push(1);
    data.push(1);
    data.extend_from_slice(&(objects.len() as u64).to_be_bytes());
    data.extend_from_slice(&0u64.to_be_bytes());
    data.extend_from_slice(&(offset_table_position as u64).to_be_bytes());
    data
}

#[test]
fn test_empty_input() {
    assert!(matches!(proplist::from_slice(&[]), Err(Error::EmptyInput)));
    assert!(matches!(
        proplist::from_reader(std::io::empty()),
        Err(Error::EmptyInput)
    ));
}

#[test]
fn test_truncated_document() {
    // Too short to hold a header, one object, an offset entry and a trailer.
    assert!(matches!(
        proplist::from_slice(b"bplist00\xD0"),
        Err(Error::Eof)
    ));

    let document = build_document(&[&[0xD0]]);
    assert!(matches!(
        proplist::from_slice(&document[.. document.len() - 1]),
        Err(Error::MissingOrInvalidOffsetTable) | Err(Error::Eof)
    ));
}

#[test]
fn test_offset_table_position_out_of_range() {
    let mut document = build_document(&[&[0xD0]]);
    let length = document.len();
    document[length - 1] = 0xEE;
    assert!(matches!(
        proplist::from_slice(&document),
        Err(Error::MissingOrInvalidOffsetTable)
    ));
}

#[test]
fn test_object_reference_out_of_range() {
    // An array of one element whose reference points past the offset table.
    let document = build_document(&[&[0xA1, 0x05]]);
    assert!(matches!(
        proplist::from_slice(&document),
        Err(Error::InvalidObjectReference)
    ));
}

#[test]
fn test_offset_out_of_object_table() {
    // The offset table names a position inside the trailer.
    let mut document = build_document(&[&[0xD0]]);
    document[9] = 0x30;
    assert!(matches!(
        proplist::from_slice(&document),
        Err(Error::InvalidOffsetToObject)
    ));
}

#[test]
fn test_unknown_object_format() {
    // 0x80 begins the uid family, which this codec does not carry.
    let document = build_document(&[&[0x80, 0x00]]);
    assert!(matches!(
        proplist::from_slice(&document),
        Err(Error::InvalidOrUnsupportedObjectFormat)
    ));
}

#[test]
fn test_null_and_fill_singletons_rejected() {
    let null_document = build_document(&[&[0x00]]);
    assert!(matches!(
        proplist::from_slice(&null_document),
        Err(Error::UnsupportedSingleton)
    ));

    let fill_document = build_document(&[&[0x0F]]);
    assert!(matches!(
        proplist::from_slice(&fill_document),
        Err(Error::UnsupportedSingleton)
    ));
}

#[test]
fn test_dictionary_key_must_be_string() {
    // {42: true} — the key reference resolves to an integer.
    let document = build_document(&[
        &[0xD1, 0x01, 0x02],
        &[0x10, 0x2A],
        &[0x09],
    ]);
    assert!(matches!(
        proplist::from_slice(&document),
        Err(Error::DictionaryKeyNotString)
    ));
}

#[test]
fn test_self_referential_array_is_a_cycle() {
    let document = build_document(&[&[0xA1, 0x00]]);
    assert!(matches!(
        proplist::from_slice(&document),
        Err(Error::CycleDetected)
    ));
}

#[test]
fn test_mutually_referential_containers_are_a_cycle() {
    // Object 0 is an array holding object 1; object 1 holds object 0.
    let document = build_document(&[
        &[0xA1, 0x01],
        &[0xA1, 0x00],
    ]);
    assert!(matches!(
        proplist::from_slice(&document),
        Err(Error::CycleDetected)
    ));
}

#[test]
fn test_shared_subtrees_are_not_a_cycle() {
    // Both elements of the array reference the same integer. The document
    // is a directed acyclic graph and reads normally.
    let document = build_document(&[
        &[0xA2, 0x01, 0x01],
        &[0x10, 0x07],
    ]);
    assert_eq!(
        proplist::from_slice(&document).unwrap(),
        Value::Array(vec![Value::Integer(7), Value::Integer(7)]),
    );
}

#[test]
fn test_malformed_xml_surfaces_parse_error() {
    // Input ends in the middle of a tag.
    let document = b"<plist version=\"1.0\"><inte";
    assert!(matches!(
        proplist::from_slice(document),
        Err(Error::XmlParse(_))
    ));
}

#[test]
fn test_non_plist_text_is_not_binary() {
    // Anything without the magic number routes to the XML reader.
    assert!(proplist::from_slice(b"just some text").is_err());
}
