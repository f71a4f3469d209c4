//! Fixed-point report codec
//!
//! Reports are committed on-chain as integers in a fixed-point base
//! (`2^64` by default). Scalar and categorical reports are first rescaled
//! into `[0, 1]` using the market bounds:
//!
//! ```text
//! y = (x - min) / (max - min)        encode
//! x = (max - min) * y + min          decode
//! ```
//!
//! Three values are reserved:
//!
//! | Constant                           | Value       | Meaning                     |
//! |------------------------------------|-------------|-----------------------------|
//! | `BINARY_INDETERMINATE`             | `1.5 * one` | binary market, indeterminate |
//! | `CATEGORICAL_SCALAR_INDETERMINATE` | `0.5 * one` | other markets, indeterminate |
//! | `INDETERMINATE_PLUS_ONE`           | `0.5 * one + 1` | genuine midpoint report  |
//!
//! A rescaled value of exactly zero is encoded as `0x1` so it cannot be
//! confused with an empty submission.

use crate::{
    types::{DecodedReport, FixedPointReport, MarketType, ReportInput},
    Error, Result,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Decoded form of the binary indeterminate sentinel
pub const BINARY_INDETERMINATE_REPORT: &str = "1.5";

/// Decoded form of the categorical/scalar indeterminate sentinel
pub const CATEGORICAL_SCALAR_INDETERMINATE_REPORT: &str = "0.5";

/// Decoded form of the minimal unit in a scalar market
pub const SCALAR_ZERO_REPORT: &str = "0";

/// Decoded form of `INDETERMINATE_PLUS_ONE` in a scalar market
pub const SCALAR_MIDPOINT_REPORT: &str = "0.5";

/// Protocol fixed-point constants, built once and passed to the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct FixedPointParams {
    fractional_bits: u32,
    one: i128,
    binary_indeterminate: i128,
    categorical_scalar_indeterminate: i128,
    indeterminate_plus_one: i128,
}

impl FixedPointParams {
    /// Fractional bits used by the protocol contracts
    pub const DEFAULT_FRACTIONAL_BITS: u32 = 64;

    /// Widest base whose sentinels still fit a 96-bit decimal mantissa
    pub const MAX_FRACTIONAL_BITS: u32 = 94;

    /// Build constants for a base of `2^fractional_bits`
    pub fn new(fractional_bits: u32) -> Result<Self> {
        if !(2..=Self::MAX_FRACTIONAL_BITS).contains(&fractional_bits) {
            return Err(Error::Config(format!(
                "fractional bits must be in 2..={}, got {}",
                Self::MAX_FRACTIONAL_BITS,
                fractional_bits
            )));
        }

        let one = 1i128 << fractional_bits;
        let half = one / 2;

        Ok(Self {
            fractional_bits,
            one,
            binary_indeterminate: one + half,
            categorical_scalar_indeterminate: half,
            indeterminate_plus_one: half + 1,
        })
    }

    /// Number of fractional bits
    pub fn fractional_bits(&self) -> u32 {
        self.fractional_bits
    }

    /// Fixed-point representation of 1
    pub fn one(&self) -> FixedPointReport {
        FixedPointReport::new(self.one)
    }

    /// Sentinel for an indeterminate binary report (`1.5`)
    pub fn binary_indeterminate(&self) -> FixedPointReport {
        FixedPointReport::new(self.binary_indeterminate)
    }

    /// Sentinel for an indeterminate categorical or scalar report (`0.5`)
    pub fn categorical_scalar_indeterminate(&self) -> FixedPointReport {
        FixedPointReport::new(self.categorical_scalar_indeterminate)
    }

    /// Encoding of a genuine midpoint report
    pub fn indeterminate_plus_one(&self) -> FixedPointReport {
        FixedPointReport::new(self.indeterminate_plus_one)
    }
}

impl Default for FixedPointParams {
    fn default() -> Self {
        let one = 1i128 << Self::DEFAULT_FRACTIONAL_BITS;
        Self {
            fractional_bits: Self::DEFAULT_FRACTIONAL_BITS,
            one,
            binary_indeterminate: one + one / 2,
            categorical_scalar_indeterminate: one / 2,
            indeterminate_plus_one: one / 2 + 1,
        }
    }
}

impl TryFrom<u32> for FixedPointParams {
    type Error = Error;

    fn try_from(fractional_bits: u32) -> Result<Self> {
        Self::new(fractional_bits)
    }
}

impl From<FixedPointParams> for u32 {
    fn from(params: FixedPointParams) -> Self {
        params.fractional_bits
    }
}

/// Encoder/decoder between report values and fixed-point words
#[derive(Debug, Clone)]
pub struct ReportCodec {
    params: FixedPointParams,
    one: Decimal,
}

impl ReportCodec {
    /// Create a codec over the given constants
    pub fn new(params: FixedPointParams) -> Self {
        // fractional bits are capped below the 96-bit mantissa limit
        let one = Decimal::from_i128_with_scale(params.one, 0);
        Self { params, one }
    }

    /// Constants in use
    pub fn params(&self) -> &FixedPointParams {
        &self.params
    }

    /// Scale a decimal into fixed point, rounding half away from zero
    pub fn fix(&self, value: Decimal) -> Result<FixedPointReport> {
        let scaled = value
            .checked_mul(self.one)
            .ok_or_else(|| Error::Range(format!("{} overflows fixed point", value)))?;

        scaled
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i128()
            .map(FixedPointReport::new)
            .ok_or_else(|| Error::Range(format!("{} overflows fixed point", value)))
    }

    /// Scale a fixed-point value back to a decimal
    pub fn unfix(&self, report: FixedPointReport) -> Result<Decimal> {
        let raw = Decimal::try_from_i128_with_scale(report.value(), 0).map_err(|_| {
            Error::Range(format!("{} exceeds decimal precision", report.to_hex()))
        })?;

        raw.checked_div(self.one)
            .map(|d| d.normalize())
            .ok_or_else(|| Error::Range(format!("cannot unfix {}", report.to_hex())))
    }

    /// Encode a report for submission
    pub fn fix_report(&self, input: &ReportInput) -> Result<FixedPointReport> {
        if input.is_indeterminate {
            return Ok(match input.market_type {
                MarketType::Binary => self.params.binary_indeterminate(),
                _ => self.params.categorical_scalar_indeterminate(),
            });
        }

        let fixed = match input.market_type {
            MarketType::Binary => self.fix(input.report)?,
            MarketType::Categorical | MarketType::Scalar => {
                let rescaled = rescale(input)?;
                if rescaled.is_zero() {
                    FixedPointReport::new(1)
                } else {
                    self.fix(rescaled)?
                }
            }
        };

        // A genuine 0.5 must not read back as indeterminate
        if fixed == self.params.categorical_scalar_indeterminate() {
            return Ok(self.params.indeterminate_plus_one());
        }

        Ok(fixed)
    }

    /// Decoded indeterminate outcome, if the value is a sentinel
    pub fn is_indeterminate_report(
        &self,
        report: FixedPointReport,
        market_type: MarketType,
    ) -> Option<&'static str> {
        if market_type == MarketType::Binary && report == self.params.binary_indeterminate() {
            Some(BINARY_INDETERMINATE_REPORT)
        } else if report == self.params.categorical_scalar_indeterminate() {
            Some(CATEGORICAL_SCALAR_INDETERMINATE_REPORT)
        } else {
            None
        }
    }

    /// Decoded scalar value for the two special encodings
    pub fn is_scalar_special_value_report(&self, report: FixedPointReport) -> Option<&'static str> {
        if report.value() == 1 {
            Some(SCALAR_ZERO_REPORT)
        } else if report == self.params.indeterminate_plus_one() {
            Some(SCALAR_MIDPOINT_REPORT)
        } else {
            None
        }
    }

    /// Decode an unsigned raw on-chain report back into market units
    pub fn unfix_raw_report(
        &self,
        raw_report: &str,
        min_value: Decimal,
        max_value: Decimal,
        market_type: MarketType,
    ) -> Result<DecodedReport> {
        let report = FixedPointReport::from_hex(raw_report)?;

        if let Some(decoded) = self.special_value(report, market_type) {
            return Ok(decoded);
        }

        if market_type == MarketType::Binary {
            return Ok(determinate(self.unfix(report)?));
        }

        let span = max_value
            .checked_sub(min_value)
            .ok_or_else(|| Error::Range("market range overflows".to_string()))?;
        let mut value = span
            .checked_mul(self.unfix(report)?)
            .and_then(|v| v.checked_add(min_value))
            .ok_or_else(|| Error::Range(format!("cannot rescale {}", raw_report)))?;

        if market_type == MarketType::Categorical {
            value = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        }

        Ok(determinate(value))
    }

    /// Decode a signed fixed-point report
    pub fn unfix_report(&self, report: &str, market_type: MarketType) -> Result<DecodedReport> {
        let report = FixedPointReport::from_hex_signed(report)?;

        if let Some(decoded) = self.special_value(report, market_type) {
            return Ok(decoded);
        }

        Ok(determinate(self.unfix(report)?))
    }

    /// Sentinels first, then scalar special values
    fn special_value(&self, report: FixedPointReport, market_type: MarketType) -> Option<DecodedReport> {
        if let Some(outcome) = self.is_indeterminate_report(report, market_type) {
            return Some(DecodedReport {
                report: outcome.to_string(),
                is_indeterminate: true,
            });
        }

        if market_type == MarketType::Scalar {
            if let Some(value) = self.is_scalar_special_value_report(report) {
                return Some(DecodedReport {
                    report: value.to_string(),
                    is_indeterminate: false,
                });
            }
        }

        None
    }
}

impl Default for ReportCodec {
    fn default() -> Self {
        Self::new(FixedPointParams::default())
    }
}

/// `(report - min) / (max - min)`
fn rescale(input: &ReportInput) -> Result<Decimal> {
    let span = input
        .max_value
        .checked_sub(input.min_value)
        .ok_or_else(|| Error::Range("market range overflows".to_string()))?;

    if span.is_zero() {
        return Err(Error::Range(format!(
            "empty market range: min and max are both {}",
            input.min_value
        )));
    }

    input
        .report
        .checked_sub(input.min_value)
        .and_then(|offset| offset.checked_div(span))
        .ok_or_else(|| Error::Range(format!("cannot rescale {}", input.report)))
}

fn determinate(value: Decimal) -> DecodedReport {
    DecodedReport {
        report: value.normalize().to_string(),
        is_indeterminate: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn codec() -> ReportCodec {
        ReportCodec::default()
    }

    #[test]
    fn test_default_constants() {
        let params = FixedPointParams::default();
        assert_eq!(params.one().to_hex(), "0x10000000000000000");
        assert_eq!(params.binary_indeterminate().to_hex(), "0x18000000000000000");
        assert_eq!(params.categorical_scalar_indeterminate().to_hex(), "0x8000000000000000");
        assert_eq!(params.indeterminate_plus_one().to_hex(), "0x8000000000000001");
        assert_eq!(FixedPointParams::new(64).unwrap(), params);
    }

    #[test]
    fn test_params_bounds() {
        assert!(FixedPointParams::new(1).is_err());
        assert!(FixedPointParams::new(95).is_err());
        assert!(FixedPointParams::new(94).is_ok());
    }

    #[test]
    fn test_fix_and_unfix() {
        let codec = codec();
        assert_eq!(codec.fix(dec!(1)).unwrap().to_hex(), "0x10000000000000000");
        assert_eq!(codec.fix(dec!(0.25)).unwrap().to_hex(), "0x4000000000000000");
        assert_eq!(codec.unfix(FixedPointReport::new(1i128 << 62)).unwrap(), dec!(0.25));
        assert_eq!(codec.fix(dec!(-1)).unwrap().value(), -(1i128 << 64));
    }

    #[test]
    fn test_indeterminate_reports() {
        let codec = codec();
        let binary = ReportInput::new(dec!(1), dec!(1), dec!(2), MarketType::Binary).indeterminate();
        assert_eq!(codec.fix_report(&binary).unwrap().to_hex(), "0x18000000000000000");

        let scalar = ReportInput::new(dec!(5), dec!(0), dec!(10), MarketType::Scalar).indeterminate();
        assert_eq!(codec.fix_report(&scalar).unwrap().to_hex(), "0x8000000000000000");
    }

    #[test]
    fn test_binary_report_scales_directly() {
        let codec = codec();
        let input = ReportInput::new(dec!(2), dec!(1), dec!(2), MarketType::Binary);
        assert_eq!(codec.fix_report(&input).unwrap().to_hex(), "0x20000000000000000");

        // no minimal-unit substitution for binary
        let zero = ReportInput::new(dec!(0), dec!(1), dec!(2), MarketType::Binary);
        assert_eq!(codec.fix_report(&zero).unwrap().to_hex(), "0x0");
    }

    #[test]
    fn test_zero_rescaled_report_is_one_unit() {
        let codec = codec();
        let input = ReportInput::new(dec!(-5), dec!(-5), dec!(5), MarketType::Scalar);
        assert_eq!(codec.fix_report(&input).unwrap().to_hex(), "0x1");

        let decoded = codec
            .unfix_raw_report("0x1", dec!(-5), dec!(5), MarketType::Scalar)
            .unwrap();
        assert_eq!(decoded.report, "0");
        assert!(!decoded.is_indeterminate);
    }

    #[test]
    fn test_midpoint_is_bumped_past_sentinel() {
        let codec = codec();
        let input = ReportInput::new(dec!(50), dec!(0), dec!(100), MarketType::Scalar);
        let fixed = codec.fix_report(&input).unwrap();
        assert_ne!(fixed, codec.params().categorical_scalar_indeterminate());
        assert_eq!(fixed, codec.params().indeterminate_plus_one());

        // binary markets get the same treatment
        let binary = ReportInput::new(dec!(0.5), dec!(1), dec!(2), MarketType::Binary);
        assert_eq!(codec.fix_report(&binary).unwrap(), codec.params().indeterminate_plus_one());
    }

    #[test]
    fn test_empty_range_is_rejected() {
        let codec = codec();
        let input = ReportInput::new(dec!(3), dec!(3), dec!(3), MarketType::Scalar);
        assert!(matches!(codec.fix_report(&input), Err(Error::Range(_))));
    }

    #[test]
    fn test_is_indeterminate_report() {
        let codec = codec();
        let params = *codec.params();
        assert_eq!(
            codec.is_indeterminate_report(params.binary_indeterminate(), MarketType::Binary),
            Some("1.5")
        );
        assert_eq!(
            codec.is_indeterminate_report(params.categorical_scalar_indeterminate(), MarketType::Scalar),
            Some("0.5")
        );
        assert_eq!(
            codec.is_indeterminate_report(params.categorical_scalar_indeterminate(), MarketType::Binary),
            Some("0.5")
        );
        assert_eq!(
            codec.is_indeterminate_report(params.binary_indeterminate(), MarketType::Scalar),
            None
        );
        assert_eq!(codec.is_indeterminate_report(params.one(), MarketType::Binary), None);
    }

    #[test]
    fn test_is_scalar_special_value_report() {
        let codec = codec();
        assert_eq!(codec.is_scalar_special_value_report(FixedPointReport::new(1)), Some("0"));
        assert_eq!(
            codec.is_scalar_special_value_report(codec.params().indeterminate_plus_one()),
            Some("0.5")
        );
        assert_eq!(codec.is_scalar_special_value_report(FixedPointReport::new(2)), None);
    }

    #[test]
    fn test_unfix_raw_report_precedence() {
        let codec = codec();

        let indeterminate = codec
            .unfix_raw_report("0x8000000000000000", dec!(0), dec!(100), MarketType::Scalar)
            .unwrap();
        assert_eq!(indeterminate.report, "0.5");
        assert!(indeterminate.is_indeterminate);

        let binary = codec
            .unfix_raw_report("0x18000000000000000", dec!(1), dec!(2), MarketType::Binary)
            .unwrap();
        assert_eq!(binary.report, "1.5");
        assert!(binary.is_indeterminate);

        let two = codec
            .unfix_raw_report("0x20000000000000000", dec!(1), dec!(2), MarketType::Binary)
            .unwrap();
        assert_eq!(two.report, "2");
        assert!(!two.is_indeterminate);

        let midpoint = codec
            .unfix_raw_report("0x8000000000000001", dec!(0), dec!(100), MarketType::Scalar)
            .unwrap();
        assert_eq!(midpoint.report, "0.5");
        assert!(!midpoint.is_indeterminate);
    }

    #[test]
    fn test_unfix_raw_report_rescales() {
        let codec = codec();
        // 0.25 of the range [100, 300]
        let decoded = codec
            .unfix_raw_report("0x4000000000000000", dec!(100), dec!(300), MarketType::Scalar)
            .unwrap();
        assert_eq!(decoded.report, "150");
    }

    #[test]
    fn test_categorical_rounds_half_up() {
        let codec = codec();
        // 0.75 of [0, 2] is 1.5, rounds to 2
        let decoded = codec
            .unfix_raw_report("0xc000000000000000", dec!(0), dec!(2), MarketType::Categorical)
            .unwrap();
        assert_eq!(decoded.report, "2");
    }

    #[test]
    fn test_unfix_report_signed() {
        let codec = codec();
        let negative = codec.fix(dec!(-2.5)).unwrap();
        let decoded = codec.unfix_report(&negative.to_hex(), MarketType::Scalar).unwrap();
        assert_eq!(decoded.report, "-2.5");

        let special = codec.unfix_report("0x1", MarketType::Scalar).unwrap();
        assert_eq!(special.report, "0");

        let plain = codec.unfix_report("0x1", MarketType::Categorical).unwrap();
        assert!(plain.report.starts_with("0.0000000000000000000542"));
    }

    #[test]
    fn test_unfix_raw_rejects_negative_words() {
        let codec = codec();
        let negative = codec.fix(dec!(-1)).unwrap().to_hex();
        assert!(codec
            .unfix_raw_report(&negative, dec!(0), dec!(1), MarketType::Scalar)
            .is_err());
    }
}
