//! Property-based tests for the container codec
//!
//! Uses proptest to verify the round-trip and truncation-robustness
//! contracts across many random documents and asset blobs.

use charx::compression::Lz4Codec;
use charx::container::ContainerCodec;
use proptest::prelude::*;
use serde_json::json;

fn codec() -> ContainerCodec {
    ContainerCodec::new(Box::new(Lz4Codec))
}

proptest! {
    #[test]
    fn prop_assets_round_trip_byte_exact(
        blobs in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..512), 0..6)
    ) {
        let c = codec();
        let buffer = c.encode(&json!({"name": "m"}), &blobs).unwrap();
        let (_, decoded) = c.decode(&buffer).unwrap();
        prop_assert_eq!(decoded, blobs);
    }

    #[test]
    fn prop_document_strings_round_trip(
        name in ".*",
        description in ".*",
        keys in prop::collection::vec("[a-zA-Z0-9 ]{0,16}", 0..8)
    ) {
        let c = codec();
        let document = json!({
            "name": name,
            "description": description,
            "lorebook": [{"keys": keys, "content": "c"}],
        });

        let buffer = c.encode(&document, &[]).unwrap();
        let (module, _) = c.decode(&buffer).unwrap();

        prop_assert_eq!(&module["name"], &document["name"]);
        prop_assert_eq!(&module["description"], &document["description"]);
        prop_assert_eq!(&module["lorebook"], &document["lorebook"]);
    }

    #[test]
    fn prop_truncation_is_always_a_format_error(
        blobs in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..128), 0..4),
        cut_seed in any::<usize>()
    ) {
        let c = codec();
        let buffer = c.encode(&json!({"name": "m"}), &blobs).unwrap();

        // Any proper prefix must be rejected, never misread
        let cut = cut_seed % buffer.len();
        let err = c.decode(&buffer[..cut]).unwrap_err();
        prop_assert!(err.is_format(), "cut at {} gave: {}", cut, err);
    }

    #[test]
    fn prop_corrupted_marker_is_rejected(marker in 2u8..) {
        let c = codec();
        let mut buffer = c.encode(&json!({"name": "m"}), &[]).unwrap();
        let end = buffer.len() - 1;
        buffer[end] = marker;

        let err = c.decode(&buffer).unwrap_err();
        prop_assert!(err.is_format());
    }
}
