// Credvault services
// Codec, key management, record encryption and serialization, quality gates, analysis, settings.

pub mod delimited_codec;
pub mod key_provider;
pub mod password_analysis;
pub mod quality_gates;
pub mod record_cipher;
pub mod record_serializer;
pub mod settings_engine;
