//! Container codec integration tests: round-trip, determinism, and
//! corruption handling.

use charx::compression::{Lz4Codec, Passthrough, ZstdCodec};
use charx::container::{ContainerCodec, IdSource};
use charx::CharxError;
use serde_json::json;

struct FixedIds;

impl IdSource for FixedIds {
    fn next_id(&self) -> String {
        "11111111-2222-4333-8444-555555555555".to_string()
    }
}

fn fixed_codec() -> ContainerCodec {
    ContainerCodec::new(Box::new(Passthrough)).with_id_source(Box::new(FixedIds))
}

#[test]
fn round_trip_with_lz4() {
    let codec = ContainerCodec::new(Box::new(Lz4Codec));
    let document = json!({
        "name": "Aria Module",
        "description": "Runtime scripts",
        "regex": [{"comment": "c", "in": "a", "out": "b", "type": "editoutput", "ableFlag": false}],
        "lorebook": [],
    });
    let blobs = vec![b"first asset".to_vec(), vec![0u8; 4096], Vec::new()];

    let buffer = codec.encode(&document, &blobs).unwrap();
    let (module, assets) = codec.decode(&buffer).unwrap();

    assert_eq!(module["name"], "Aria Module");
    assert_eq!(module["regex"], document["regex"]);
    assert!(module["id"].is_string());
    assert_eq!(assets, blobs);
}

#[test]
fn round_trip_with_zstd() {
    let codec = ContainerCodec::new(Box::new(ZstdCodec::default()));
    let blobs = vec![b"zstd asset payload".repeat(64)];

    let buffer = codec.encode(&json!({"name": "m"}), &blobs).unwrap();
    let (_, assets) = codec.decode(&buffer).unwrap();
    assert_eq!(assets, blobs);
}

#[test]
fn round_trip_without_assets() {
    let codec = ContainerCodec::new(Box::new(Lz4Codec));
    let buffer = codec.encode(&json!({"name": "empty"}), &[]).unwrap();
    let (module, assets) = codec.decode(&buffer).unwrap();

    assert_eq!(module["name"], "empty");
    assert!(assets.is_empty());
}

#[test]
fn document_survives_except_id_and_paths() {
    let codec = fixed_codec();
    let document = json!({
        "name": "m",
        "description": "d",
        "assets": [["bg", "embedded://assets/other/image/bg.png", "png"]],
        "lorebook": [{"keys": ["a"], "content": "c", "constant": false}],
    });

    let buffer = codec.encode(&document, &[]).unwrap();
    let (module, _) = codec.decode(&buffer).unwrap();

    let mut expected = document.clone();
    expected["id"] = json!("11111111-2222-4333-8444-555555555555");
    expected["assets"][0][1] = json!("");
    assert_eq!(module, expected);
}

#[test]
fn encoding_is_byte_deterministic_with_fixed_ids() {
    let document = json!({"name": "m", "description": "d"});
    let blobs = vec![vec![1, 2, 3]];

    let first = fixed_codec().encode(&document, &blobs).unwrap();
    let second = fixed_codec().encode(&document, &blobs).unwrap();
    assert_eq!(first, second);
}

#[test]
fn random_ids_differ_between_documents() {
    let codec = ContainerCodec::new(Box::new(Passthrough));
    let buffer_a = codec.encode(&json!({"name": "m"}), &[]).unwrap();
    let buffer_b = codec.encode(&json!({"name": "m"}), &[]).unwrap();

    let (module_a, _) = codec.decode(&buffer_a).unwrap();
    let (module_b, _) = codec.decode(&buffer_b).unwrap();
    assert_ne!(module_a["id"], module_b["id"]);
}

#[test]
fn truncation_at_any_boundary_is_a_format_error() {
    let codec = ContainerCodec::new(Box::new(Lz4Codec));
    let buffer = codec
        .encode(&json!({"name": "m"}), &[vec![9u8; 100], vec![7u8; 10]])
        .unwrap();

    for cut in 0..buffer.len() {
        let err = codec.decode(&buffer[..cut]).unwrap_err();
        assert!(
            err.is_format(),
            "cut at byte {} produced a non-format error: {}",
            cut,
            err
        );
    }
}

#[test]
fn flipped_magic_byte_is_rejected() {
    let codec = fixed_codec();
    let mut buffer = codec.encode(&json!({}), &[]).unwrap();
    buffer[0] ^= 0xFF;

    let err = codec.decode(&buffer).unwrap_err();
    assert!(matches!(err, CharxError::BadMagic(_)));
    assert!(err.is_format());
}

#[test]
fn flipped_version_byte_is_rejected() {
    let codec = fixed_codec();
    let mut buffer = codec.encode(&json!({}), &[]).unwrap();
    buffer[1] = 0x01;

    let err = codec.decode(&buffer).unwrap_err();
    assert!(matches!(err, CharxError::UnsupportedVersion(1)));
    assert!(err.is_format());
}

#[test]
fn empty_buffer_is_truncated() {
    let codec = fixed_codec();
    assert!(matches!(
        codec.decode(&[]),
        Err(CharxError::Truncated(0))
    ));
}
