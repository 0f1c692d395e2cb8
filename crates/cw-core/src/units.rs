//! Length units, typed dimension parsing and display formatting
//!
//! All scene lengths are meters. Typed input may use any supported unit,
//! feet-inch compounds and fractions.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, tag_no_case},
    character::complete::{char, multispace0, multispace1, one_of},
    combinator::{all_consuming, map, map_res, not, opt, value, verify},
    number::complete::recognize_float,
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
};
use serde::{Deserialize, Serialize};

/// Unit system of the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitSystem {
    #[default]
    Imperial,
    Metric,
}

/// Display / plain-number unit of the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    Meters,
    Centimeters,
    Millimeters,
    Feet,
    #[default]
    Inches,
}

/// Document unit settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnitSettings {
    pub system: UnitSystem,
    pub length_unit: LengthUnit,
}

impl UnitSettings {
    pub fn imperial() -> Self {
        Self {
            system: UnitSystem::Imperial,
            length_unit: LengthUnit::Inches,
        }
    }

    pub fn metric(length_unit: LengthUnit) -> Self {
        Self {
            system: UnitSystem::Metric,
            length_unit,
        }
    }

    /// Convert a plain typed number into meters
    fn plain_to_meters(&self, value: f32) -> f32 {
        match self.system {
            UnitSystem::Imperial => inch(value),
            UnitSystem::Metric => match self.length_unit {
                LengthUnit::Millimeters => millimeter(value),
                LengthUnit::Centimeters => centimeter(value),
                _ => value,
            },
        }
    }
}

pub fn inch(value: f32) -> f32 {
    value * 0.0254
}

pub fn feet(value: f32) -> f32 {
    value * 0.3048
}

pub fn millimeter(value: f32) -> f32 {
    value * 0.001
}

pub fn centimeter(value: f32) -> f32 {
    value * 0.01
}

pub fn meter_to_inch(meters: f32) -> f32 {
    meters * 39.3701
}

/// Round a value in inches to the nearest 1/16
pub fn round_to_sixteenth(inches: f32) -> f32 {
    (inches * 16.0).round() / 16.0
}

/// Round a length to the nearest multiple of `spacing` (no-op for spacing <= 0)
pub fn snap_to_grid(value: f32, spacing: f32) -> f32 {
    if spacing <= 0.0 {
        return value;
    }
    (value / spacing).round() * spacing
}

// ============== Typed dimension grammar ==============

/// Unsigned decimal, `5`, `5.25`, `.5`
fn decimal(input: &str) -> IResult<&str, f32> {
    verify(
        map_res(preceded(not(one_of("+-")), recognize_float), str::parse::<f32>),
        |value: &f32| value.is_finite(),
    )(input)
}

/// `3/4`, zero denominators rejected
fn fraction(input: &str) -> IResult<&str, f32> {
    map(
        verify(
            separated_pair(decimal, delimited(multispace0, char('/'), multispace0), decimal),
            |&(_, den): &(f32, f32)| den != 0.0,
        ),
        |(num, den)| num / den,
    )(input)
}

/// `5`, `5.25`, `3/4` or a mixed number `5 3/4`
fn magnitude(input: &str) -> IResult<&str, f32> {
    alt((
        map(
            separated_pair(decimal, multispace1, fraction),
            |(whole, frac)| whole + frac,
        ),
        fraction,
        decimal,
    ))(input)
}

fn inch_mark(input: &str) -> IResult<&str, &str> {
    alt((tag("\""), tag_no_case("in")))(input)
}

/// `5'`, `5'6"`, `5'-6 1/2"`, `5' 6 1/2"`, in meters
fn feet_inches(input: &str) -> IResult<&str, f32> {
    map(
        pair(
            terminated(magnitude, preceded(multispace0, char('\''))),
            opt(preceded(
                // The dash in 5'-6" separates feet from inches
                tuple((multispace0, opt(char('-')), multispace0)),
                terminated(magnitude, opt(preceded(multispace0, inch_mark))),
            )),
        ),
        |(whole_feet, inches)| feet(whole_feet) + inch(inches.unwrap_or(0.0)),
    )(input)
}

fn meter(value: f32) -> f32 {
    value
}

/// Unit suffix as a conversion into meters
fn unit_suffix(input: &str) -> IResult<&str, fn(f32) -> f32> {
    alt((
        value(millimeter as fn(f32) -> f32, tag_no_case("mm")),
        value(centimeter as fn(f32) -> f32, tag_no_case("cm")),
        value(inch as fn(f32) -> f32, inch_mark),
        value(feet as fn(f32) -> f32, tag_no_case("ft")),
        value(meter as fn(f32) -> f32, tag_no_case("m")),
    ))(input)
}

/// A magnitude with an explicit unit, in meters
fn with_unit(input: &str) -> IResult<&str, f32> {
    map(
        separated_pair(magnitude, multispace0, unit_suffix),
        |(value, to_meters)| to_meters(value),
    )(input)
}

fn sign(input: &str) -> IResult<&str, f32> {
    map(opt(terminated(one_of("+-"), multispace0)), |sign| {
        if sign == Some('-') { -1.0 } else { 1.0 }
    })(input)
}

/// Parse a typed dimension into meters.
///
/// Accepts plain numbers in the document unit, unit suffixes (`"`, `in`,
/// `mm`, `cm`, `m`, `'`, `ft`), feet-inch compounds (`5'6"`, `5'-6 1/2"`,
/// `5' 6 1/2"`) and fractions. A leading sign applies to the whole value,
/// so `-5'-6"` is minus five and a half feet. Returns None for empty or
/// malformed input; callers keep their current value in that case.
pub fn parse_distance(text: &str, units: &UnitSettings) -> Option<f32> {
    let body = alt((
        feet_inches,
        with_unit,
        map(magnitude, |value| units.plain_to_meters(value)),
    ));
    let (_, (sign, meters)) =
        all_consuming(delimited(multispace0, pair(sign, body), multispace0))(text).ok()?;
    Some(sign * meters)
}

/// Format a number with up to `decimals` places, trailing zeros stripped
pub fn format_number(value: f32, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value);
    let text = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    };
    if text == "-0" { "0".to_string() } else { text }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Whole inches plus a reduced sixteenth fraction, e.g. `6 1/2`
fn format_inches(inches: f32) -> String {
    let sixteenths = (inches.abs() * 16.0).round() as u32;
    let whole = sixteenths / 16;
    let rem = sixteenths % 16;
    let sign = if inches < 0.0 && sixteenths > 0 { "-" } else { "" };
    if rem == 0 {
        return format!("{}{}", sign, whole);
    }
    let div = gcd(rem, 16);
    let fraction = format!("{}/{}", rem / div, 16 / div);
    if whole == 0 {
        format!("{}{}", sign, fraction)
    } else {
        format!("{}{} {}", sign, whole, fraction)
    }
}

/// Format a length in meters for display in the document unit
pub fn format_distance(meters: f32, units: &UnitSettings) -> String {
    match units.system {
        UnitSystem::Metric => match units.length_unit {
            LengthUnit::Millimeters => format!("{}mm", format_number(meters * 1000.0, 1)),
            LengthUnit::Centimeters => format!("{}cm", format_number(meters * 100.0, 2)),
            _ => format!("{}m", format_number(meters, 4)),
        },
        UnitSystem::Imperial => {
            let inches = round_to_sixteenth(meter_to_inch(meters));
            if units.length_unit == LengthUnit::Feet && inches.abs() >= 12.0 {
                let sign = if inches < 0.0 { "-" } else { "" };
                let inches = inches.abs();
                let whole_feet = (inches / 12.0).floor();
                let rest = inches - whole_feet * 12.0;
                if rest < 1.0 / 32.0 {
                    format!("{}{}'", sign, whole_feet)
                } else {
                    format!("{}{}' {}\"", sign, whole_feet, format_inches(rest))
                }
            } else {
                format!("{}\"", format_inches(inches))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn imperial() -> UnitSettings {
        UnitSettings::imperial()
    }

    #[test]
    fn test_feet_inch_compound_matches_inches() {
        let compound = parse_distance("5'-6 1/2\"", &imperial()).unwrap();
        assert_relative_eq!(compound, inch(66.5), epsilon = 1e-5);

        let spaced = parse_distance("5' 6 1/2\"", &imperial()).unwrap();
        assert_relative_eq!(spaced, inch(66.5), epsilon = 1e-5);

        let plain = parse_distance("5'6\"", &imperial()).unwrap();
        assert_relative_eq!(plain, inch(66.0), epsilon = 1e-5);
    }

    #[test]
    fn test_negative_compound_is_signed_as_a_whole() {
        let units = imperial();
        assert_relative_eq!(
            parse_distance("-5'-6\"", &units).unwrap(),
            inch(-66.0),
            epsilon = 1e-5
        );
        assert_relative_eq!(
            parse_distance("-5' 6 1/2\"", &units).unwrap(),
            inch(-66.5),
            epsilon = 1e-5
        );
        assert_relative_eq!(parse_distance("- 24in", &units).unwrap(), inch(-24.0));
    }

    #[test]
    fn test_feet_only() {
        assert_relative_eq!(parse_distance("8'", &imperial()).unwrap(), feet(8.0));
        assert_relative_eq!(parse_distance("8ft", &imperial()).unwrap(), feet(8.0));
    }

    #[test]
    fn test_suffixes() {
        let units = imperial();
        assert_relative_eq!(parse_distance("24\"", &units).unwrap(), inch(24.0));
        assert_relative_eq!(parse_distance("24 in", &units).unwrap(), inch(24.0));
        assert_relative_eq!(parse_distance("600mm", &units).unwrap(), 0.6);
        assert_relative_eq!(parse_distance("60cm", &units).unwrap(), 0.6);
        assert_relative_eq!(parse_distance("0.6m", &units).unwrap(), 0.6);
        assert_relative_eq!(parse_distance("1.5M", &units).unwrap(), 1.5);
    }

    #[test]
    fn test_fractions() {
        let units = imperial();
        assert_relative_eq!(parse_distance("3/4", &units).unwrap(), inch(0.75));
        assert_relative_eq!(parse_distance("5 3/4", &units).unwrap(), inch(5.75));
        assert_relative_eq!(parse_distance("-5 3/4", &units).unwrap(), inch(-5.75));
        assert_relative_eq!(parse_distance("23 1/2\"", &units).unwrap(), inch(23.5));
    }

    #[test]
    fn test_plain_number_follows_document_units() {
        assert_relative_eq!(parse_distance("36", &imperial()).unwrap(), inch(36.0));
        let mm = UnitSettings::metric(LengthUnit::Millimeters);
        assert_relative_eq!(parse_distance("600", &mm).unwrap(), 0.6);
        let cm = UnitSettings::metric(LengthUnit::Centimeters);
        assert_relative_eq!(parse_distance("60", &cm).unwrap(), 0.6);
        let m = UnitSettings::metric(LengthUnit::Meters);
        assert_relative_eq!(parse_distance("2.5", &m).unwrap(), 2.5);
    }

    #[test]
    fn test_malformed_input_yields_none() {
        let units = imperial();
        for text in ["", "   ", "abc", "1/0", "5 1/0", "5'x", "1 2 3", "inf", "NaN", "--5", "5'-", "3/4/2", "1e"] {
            assert_eq!(parse_distance(text, &units), None, "input {:?}", text);
        }
    }

    #[test]
    fn test_format_number_strips_zeros() {
        assert_eq!(format_number(1.5, 3), "1.5");
        assert_eq!(format_number(2.0, 3), "2");
        assert_eq!(format_number(-0.0001, 2), "0");
    }

    #[test]
    fn test_format_distance() {
        let units = imperial();
        assert_eq!(format_distance(inch(24.0), &units), "24\"");
        assert_eq!(format_distance(inch(66.5), &units), "66 1/2\"");
        assert_eq!(format_distance(inch(0.25), &units), "1/4\"");

        let feet_units = UnitSettings {
            system: UnitSystem::Imperial,
            length_unit: LengthUnit::Feet,
        };
        assert_eq!(format_distance(inch(66.5), &feet_units), "5' 6 1/2\"");
        assert_eq!(format_distance(feet(8.0), &feet_units), "8'");

        let mm = UnitSettings::metric(LengthUnit::Millimeters);
        assert_eq!(format_distance(0.6, &mm), "600mm");
        let m = UnitSettings::metric(LengthUnit::Meters);
        assert_eq!(format_distance(1.25, &m), "1.25m");
    }

    #[test]
    fn test_snap_to_grid() {
        assert_relative_eq!(snap_to_grid(0.26, 0.1), 0.3, epsilon = 1e-6);
        assert_eq!(snap_to_grid(0.26, 0.0), 0.26);
    }
}
