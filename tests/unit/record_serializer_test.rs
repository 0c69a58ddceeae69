//! Unit tests for record serialization: column order, seeds and fallback decoding.

use std::sync::Arc;

use credvault::services::delimited_codec::encode_row;
use credvault::services::key_provider::MemoryKeyProvider;
use credvault::services::record_cipher::RecordCipher;
use credvault::services::record_serializer::{
    seed_for, Decoded, Record, RecordHeader, RecordSerializer,
};
use credvault::types::errors::{CodecError, CryptoError, RecordError};
use credvault::types::record::{Account, Detail, DetailType};
use rstest::rstest;
use uuid::Uuid;

fn serializer() -> RecordSerializer {
    let cipher = RecordCipher::new(MemoryKeyProvider::new(b"serializer"));
    RecordSerializer::new(Arc::new(cipher))
}

#[test]
fn test_account_columns_in_order() {
    let account = Account {
        id: Uuid::new_v4(),
        name: "Bank".to_string(),
        description: "checking, savings".to_string(),
        created: 1_700_000_000,
        changed: 1_700_000_100,
    };
    let row = encode_row(account.to_fields());
    assert_eq!(row, "Bank,\"checking, savings\",1700000000,1700000100\n");
}

#[test]
fn test_detail_columns_in_order() {
    let mut detail = Detail::new(Uuid::new_v4(), "PIN", "0042", DetailType::Pin);
    detail.created = 10;
    detail.changed = 20;
    let row = encode_row(detail.to_fields());
    assert_eq!(row, "PIN,0042,10,20,8,false,true\n");
}

#[test]
fn test_detail_roundtrip_uses_account_seed() {
    let serializer = serializer();
    let account = Uuid::new_v4();
    let detail = Detail::new(account, "Password", "p@ss,\"word\"\n", DetailType::Password);

    let blob = serializer.to_blob(&detail, &seed_for(account)).unwrap();
    let decoded: Decoded<Detail> = serializer
        .from_blob(&blob, &seed_for(account), RecordHeader::detail(detail.id, account))
        .unwrap();
    assert!(decoded.is_clean());
    assert_eq!(decoded.record, detail);
    assert!(decoded.record.obfuscated);
}

#[test]
fn test_wrong_seed_is_authentication_error() {
    let serializer = serializer();
    let account = Account::new("Mail", "");
    let blob = serializer.seal(&account).unwrap();

    let result = serializer.from_blob::<Account>(
        &blob,
        &seed_for(Uuid::new_v4()),
        RecordHeader::account(account.id),
    );
    assert_eq!(result, Err(RecordError::Crypto(CryptoError::Authentication)));
}

#[test]
fn test_non_utf8_plaintext_is_decode_error() {
    let serializer = serializer();
    let seed = seed_for(Uuid::new_v4());
    let blob = serializer.cipher().encrypt(&[0xff, 0xfe, 0x00], &seed).unwrap();

    let result =
        serializer.from_blob::<Account>(&blob, &seed, RecordHeader::account(Uuid::new_v4()));
    assert!(matches!(
        result,
        Err(RecordError::Decode(CodecError::InvalidUtf8(_)))
    ));
}

#[test]
fn test_short_row_falls_back_to_defaults() {
    let serializer = serializer();
    let id = Uuid::new_v4();
    let seed = seed_for(id);
    let blob = serializer.cipher().encrypt(b"Only a name\n", &seed).unwrap();

    let decoded: Decoded<Account> = serializer
        .from_blob(&blob, &seed, RecordHeader::account(id))
        .unwrap();
    assert_eq!(decoded.record.id, id);
    assert_eq!(decoded.record.name, "Only a name");
    assert_eq!(decoded.record.description, "");
    assert_eq!(decoded.fallbacks.len(), 3);
}

#[test]
fn test_extra_columns_are_ignored() {
    let serializer = serializer();
    let id = Uuid::new_v4();
    let seed = seed_for(id);
    let blob = serializer
        .cipher()
        .encrypt(b"Name,Desc,1,2,surplus\n", &seed)
        .unwrap();

    let decoded: Decoded<Account> = serializer
        .from_blob(&blob, &seed, RecordHeader::account(id))
        .unwrap();
    assert_eq!(decoded.record.created, 1);
    assert_eq!(decoded.record.changed, 2);
    assert_eq!(decoded.fallbacks.len(), 1);
}

#[rstest]
#[case(DetailType::Text, 0)]
#[case(DetailType::Number, 1)]
#[case(DetailType::SecurityQuestion, 2)]
#[case(DetailType::Address, 3)]
#[case(DetailType::Date, 4)]
#[case(DetailType::Email, 5)]
#[case(DetailType::Password, 6)]
#[case(DetailType::Url, 7)]
#[case(DetailType::Pin, 8)]
#[case(DetailType::Undefined, -1)]
fn test_detail_type_codes(#[case] detail_type: DetailType, #[case] code: i8) {
    assert_eq!(detail_type.persistent_id(), code);
    assert_eq!(DetailType::from_persistent_id(code), detail_type);
}

#[test]
fn test_unknown_detail_type_code_is_undefined() {
    assert_eq!(DetailType::from_persistent_id(42), DetailType::Undefined);
}
