#![allow(missing_docs)]

use cas_codec::{CborCodec, Codec, JsonCodec};
use cas_core::model::{Chunk, ManifestFields};
use cas_core::Manifest;
use proptest::prelude::*;

fn arbitrary_manifest(slug: String, filename: String, chunk_sizes: Vec<u32>) -> Manifest {
    let mut offset = 0u64;
    let chunks: Vec<Chunk> = chunk_sizes
        .into_iter()
        .filter(|s| *s > 0)
        .enumerate()
        .map(|(i, size)| {
            let digest = format!("{:02x}", (i % 256) as u8).repeat(32);
            let chunk = Chunk::new(i as u64, u64::from(size), digest, format!("blob-{i}")).unwrap();
            offset += u64::from(size);
            chunk
        })
        .collect();
    let size = offset;
    Manifest::new(ManifestFields {
        slug: if slug.is_empty() { "s".into() } else { slug },
        filename: if filename.is_empty() { "f".into() } else { filename },
        size,
        chunks,
        ..Default::default()
    })
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 100, .. ProptestConfig::default() })]

    // decode(encode(m)) == m for any valid manifest, across both codecs.
    #[test]
    fn json_round_trip_law(
        slug in "[a-z]{1,12}",
        filename in "[a-z]{1,12}",
        chunk_sizes in proptest::collection::vec(1u32..4096, 0..8),
    ) {
        let manifest = arbitrary_manifest(slug, filename, chunk_sizes);
        let bytes = JsonCodec.encode(&manifest).unwrap();
        let back = JsonCodec.decode(&bytes).unwrap();
        prop_assert_eq!(back, manifest);
    }

    #[test]
    fn cbor_round_trip_law(
        slug in "[a-z]{1,12}",
        filename in "[a-z]{1,12}",
        chunk_sizes in proptest::collection::vec(1u32..4096, 0..8),
    ) {
        let manifest = arbitrary_manifest(slug, filename, chunk_sizes);
        let bytes = CborCodec.encode(&manifest).unwrap();
        let back = CborCodec.decode(&bytes).unwrap();
        prop_assert_eq!(back, manifest);
    }
}
