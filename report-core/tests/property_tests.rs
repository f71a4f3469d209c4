//! Property-based tests for report encoding invariants
//!
//! These tests use proptest to verify:
//! - Round-trip: decoding an encoded report recovers it within fixed-point rounding
//! - Sentinel safety: a determinate report never encodes to the indeterminate sentinel
//! - Cipher round-trip for arbitrary payloads, keys and salts

use proptest::prelude::*;
use report_core::{
    crypto::IV_BYTES, CryptoInput, MarketType, ReportCodec, ReportCrypto, ReportInput,
};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Strategy for scalar markets: (min, span, per-mille position in range)
fn scalar_strategy() -> impl Strategy<Value = (Decimal, Decimal, i64)> {
    (-100_000i64..100_000i64, 1i64..1_000_000i64, 0i64..=1000i64).prop_map(
        |(min_cents, span_cents, per_mille)| {
            (Decimal::new(min_cents, 2), Decimal::new(span_cents, 2), per_mille)
        },
    )
}

fn decoded_value(report: &str) -> Decimal {
    Decimal::from_str(report).expect("decoder emits plain decimals")
}

proptest! {
    #[test]
    fn prop_scalar_round_trip((min, span, per_mille) in scalar_strategy()) {
        // the minimum and the midpoint decode to the special values "0" and "0.5"
        prop_assume!(per_mille != 0 && per_mille != 500);

        let codec = ReportCodec::default();
        let max = min + span;
        let report = min + span * Decimal::new(per_mille, 3);
        let input = ReportInput::new(report, min, max, MarketType::Scalar);

        let fixed = codec.fix_report(&input).unwrap();
        let decoded = codec
            .unfix_raw_report(&fixed.to_hex(), min, max, MarketType::Scalar)
            .unwrap();

        prop_assert!(!decoded.is_indeterminate);
        let error = (decoded_value(&decoded.report) - report).abs();
        prop_assert!(error <= span * Decimal::new(1, 15), "error {} for {}", error, report);
    }

    #[test]
    fn prop_categorical_round_trip_is_exact(outcomes in 1i64..16, pick in 0i64..16) {
        let pick = pick % (outcomes + 1);
        let codec = ReportCodec::default();
        let min = Decimal::ZERO;
        let max = Decimal::from(outcomes);
        let input = ReportInput::new(Decimal::from(pick), min, max, MarketType::Categorical);

        let fixed = codec.fix_report(&input).unwrap();
        let decoded = codec
            .unfix_raw_report(&fixed.to_hex(), min, max, MarketType::Categorical)
            .unwrap();

        prop_assert_eq!(decoded.report, pick.to_string());
        prop_assert!(!decoded.is_indeterminate);
    }

    #[test]
    fn prop_binary_round_trip(hundredths in 0i64..=300) {
        // 1.5 is the binary indeterminate sentinel
        prop_assume!(hundredths != 150);

        let codec = ReportCodec::default();
        let report = Decimal::new(hundredths, 2);
        let input = ReportInput::new(report, Decimal::ONE, Decimal::TWO, MarketType::Binary);

        let fixed = codec.fix_report(&input).unwrap();
        let decoded = codec
            .unfix_raw_report(&fixed.to_hex(), Decimal::ONE, Decimal::TWO, MarketType::Binary)
            .unwrap();

        let error = (decoded_value(&decoded.report) - report).abs();
        prop_assert!(error <= Decimal::new(1, 15));
    }

    #[test]
    fn prop_determinate_never_hits_sentinel((min, span, per_mille) in scalar_strategy()) {
        let codec = ReportCodec::default();
        let max = min + span;
        let report = min + span * Decimal::new(per_mille, 3);

        for market_type in [MarketType::Scalar, MarketType::Categorical] {
            let input = ReportInput::new(report, min, max, market_type);
            let fixed = codec.fix_report(&input).unwrap();
            prop_assert_ne!(fixed, codec.params().categorical_scalar_indeterminate());
            prop_assert!(codec.is_indeterminate_report(fixed, market_type).is_none());
        }
    }

    #[test]
    fn prop_cipher_round_trip(
        payload in proptest::collection::vec(any::<u8>(), 0..96),
        key in any::<[u8; 32]>(),
        salt in proptest::option::of(proptest::collection::vec(any::<u8>(), IV_BYTES..=32)),
    ) {
        let crypto = ReportCrypto::default();
        let salt_input = salt.as_ref().map(CryptoInput::from);

        let encrypted = crypto
            .encrypt_report(CryptoInput::Bytes(&payload), CryptoInput::Bytes(&key), salt_input)
            .unwrap();
        let decrypted = crypto
            .decrypt_report(CryptoInput::Hex(&encrypted), CryptoInput::Bytes(&key), salt_input)
            .unwrap();

        prop_assert_eq!(decrypted, format!("0x{}", hex::encode(&payload)));
    }
}
