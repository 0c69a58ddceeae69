//! Property-based tests for sealed records.
//!
//! Any account or detail sealed with its seed must open to an equal record, and opening with
//! another record's seed must fail authentication.

use std::sync::Arc;

use credvault::services::key_provider::MemoryKeyProvider;
use credvault::services::record_cipher::RecordCipher;
use credvault::services::record_serializer::{seed_for, Record, RecordSerializer};
use credvault::types::errors::{CryptoError, RecordError};
use credvault::types::record::{Account, Detail, DetailType};
use proptest::prelude::*;
use uuid::Uuid;

fn serializer() -> RecordSerializer {
    RecordSerializer::new(Arc::new(RecordCipher::new(MemoryKeyProvider::new(b"prop"))))
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof!["\\PC{0,24}", "[a-z,\"\\\\\n ]{0,24}"]
}

fn arb_detail_type() -> impl Strategy<Value = DetailType> {
    prop_oneof![
        Just(DetailType::Text),
        Just(DetailType::Number),
        Just(DetailType::SecurityQuestion),
        Just(DetailType::Address),
        Just(DetailType::Date),
        Just(DetailType::Email),
        Just(DetailType::Password),
        Just(DetailType::Url),
        Just(DetailType::Pin),
        Just(DetailType::Undefined),
    ]
}

fn arb_account() -> impl Strategy<Value = Account> {
    (arb_text(), arb_text(), any::<i64>(), any::<i64>()).prop_map(
        |(name, description, created, changed)| Account {
            id: Uuid::new_v4(),
            name,
            description,
            created,
            changed,
        },
    )
}

fn arb_detail() -> impl Strategy<Value = Detail> {
    (
        arb_text(),
        arb_text(),
        any::<i64>(),
        any::<i64>(),
        arb_detail_type(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(name, content, created, changed, detail_type, obfuscated, visible)| Detail {
                id: Uuid::new_v4(),
                account: Uuid::new_v4(),
                name,
                content,
                created,
                changed,
                detail_type,
                obfuscated,
                visible,
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn sealed_account_opens_unchanged(account in arb_account()) {
        let serializer = serializer();
        let blob = serializer.seal(&account).expect("sealing should succeed");
        let decoded = serializer
            .open::<Account>(&blob, account.header())
            .expect("opening with the same seed should succeed");
        prop_assert!(decoded.is_clean());
        prop_assert_eq!(decoded.record, account);
    }

    #[test]
    fn sealed_detail_opens_unchanged(detail in arb_detail()) {
        let serializer = serializer();
        let blob = serializer.seal(&detail).expect("sealing should succeed");
        let decoded = serializer
            .open::<Detail>(&blob, detail.header())
            .expect("opening with the same seed should succeed");
        prop_assert!(decoded.is_clean());
        prop_assert_eq!(decoded.record, detail);
    }

    #[test]
    fn foreign_seed_is_rejected(account in arb_account()) {
        let serializer = serializer();
        let blob = serializer.seal(&account).expect("sealing should succeed");
        let result = serializer.from_blob::<Account>(
            &blob,
            &seed_for(Uuid::new_v4()),
            account.header(),
        );
        prop_assert_eq!(result, Err(RecordError::Crypto(CryptoError::Authentication)));
    }
}
