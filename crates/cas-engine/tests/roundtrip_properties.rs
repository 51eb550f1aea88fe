#![allow(missing_docs)]

use std::io::Cursor;
use std::sync::Arc;

use cas_codec::JsonCodec;
use cas_crypto::DefaultCrypto;
use cas_engine::{Engine, EngineConfig, KeyMaterial, RestoreInput, StoreInput};
use cas_persistence::InMemoryPersistence;
use proptest::prelude::*;

fn engine(chunk_size: usize) -> Engine {
    Engine::new(
        Arc::new(InMemoryPersistence::new()),
        Arc::new(DefaultCrypto),
        Arc::new(JsonCodec),
        EngineConfig::builder().chunk_size(chunk_size).build().unwrap(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    // restore(store(B)) == B for arbitrary plaintext, regardless of how the
    // chunk boundary falls relative to the input length.
    #[test]
    fn plaintext_round_trip_holds_for_arbitrary_input(
        bytes in proptest::collection::vec(any::<u8>(), 0..8192),
        chunk_size in 1024usize..4096,
    ) {
        let engine = engine(chunk_size);
        let manifest = engine
            .store(StoreInput {
                source: Box::new(Cursor::new(bytes.clone())),
                slug: "asset".into(),
                filename: "asset.bin".into(),
                key_material: KeyMaterial::default(),
                kdf_algorithm: None,
                compress: false,
            })
            .unwrap();
        prop_assert_eq!(manifest.size(), bytes.len() as u64);
        let out = engine.restore(RestoreInput { manifest, key_material: KeyMaterial::default() }).unwrap();
        prop_assert_eq!(out.bytes, bytes);
    }

    // Encrypted round trip holds for arbitrary plaintext and a fixed raw key.
    #[test]
    fn encrypted_round_trip_holds_for_arbitrary_input(
        bytes in proptest::collection::vec(any::<u8>(), 0..4096),
    ) {
        let engine = engine(2048);
        let key: Vec<u8> = (1u8..=32).collect();
        let manifest = engine
            .store(StoreInput {
                source: Box::new(Cursor::new(bytes.clone())),
                slug: "asset".into(),
                filename: "asset.bin".into(),
                key_material: KeyMaterial { key: Some(key.clone()), passphrase: None },
                kdf_algorithm: None,
                compress: false,
            })
            .unwrap();
        let out = engine
            .restore(RestoreInput { manifest, key_material: KeyMaterial { key: Some(key), passphrase: None } })
            .unwrap();
        prop_assert_eq!(out.bytes, bytes);
    }
}
