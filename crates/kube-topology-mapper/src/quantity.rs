//! Canonical text form of resource quantities.
//!
//! Quantities such as `1.5Gi` or `0.5` are rewritten to the form the API
//! server itself reports (`1536Mi`, `500m`), so the same amount always renders
//! the same way no matter how the manifest spelled it. Input that does not
//! parse, or whose value overflows, is returned verbatim.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

/// Largest decimal exponent with an SI suffix (`E`).
const MAX_SI_EXPONENT: i32 = 18;
/// Smallest decimal exponent kept; anything finer rounds up to nano.
const MIN_EXPONENT: i32 = -9;

const BINARY_SUFFIXES: [&str; 7] = ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    DecimalSi,
    BinarySi,
    DecimalExponent,
}

/// `mantissa × 10^exponent`, with the sign kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Parsed {
    negative: bool,
    mantissa: u128,
    exponent: i32,
    format: Format,
}

/// Render an optional quantity. Absent renders as an empty string.
#[must_use]
pub fn render(quantity: Option<&Quantity>) -> String {
    quantity.map(|q| canonical(&q.0)).unwrap_or_default()
}

/// Render every quantity of a resource list, keyed by resource name.
#[must_use]
pub fn render_map(list: Option<&BTreeMap<String, Quantity>>) -> BTreeMap<String, String> {
    list.map(|list| {
        list.iter()
            .map(|(name, q)| (name.clone(), canonical(&q.0)))
            .collect()
    })
    .unwrap_or_default()
}

/// Canonical form of `raw`, or `raw` itself if it cannot be canonicalized.
#[must_use]
pub fn canonical(raw: &str) -> String {
    parse(raw.trim())
        .and_then(|parsed| parsed.normalized())
        .and_then(Parsed::format)
        .unwrap_or_else(|| raw.to_string())
}

fn pow10(n: u32) -> Option<u128> {
    10u128.checked_pow(n)
}

fn parse(s: &str) -> Option<Parsed> {
    let (negative, rest) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let number_len = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    let (number, suffix) = rest.split_at(number_len);

    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if fraction.contains('.') {
        return None;
    }

    let mut mantissa: u128 = 0;
    for digit in whole.bytes().chain(fraction.bytes()) {
        mantissa = mantissa
            .checked_mul(10)?
            .checked_add(u128::from(digit - b'0'))?;
    }
    let mut exponent = -i32::try_from(fraction.len()).ok()?;

    let format = match suffix {
        "" => Format::DecimalSi,
        "n" | "u" | "m" | "k" | "M" | "G" | "T" | "P" | "E" => {
            exponent += match suffix {
                "n" => -9,
                "u" => -6,
                "m" => -3,
                "k" => 3,
                "M" => 6,
                "G" => 9,
                "T" => 12,
                "P" => 15,
                _ => 18,
            };
            Format::DecimalSi
        }
        _ => {
            let binary = BINARY_SUFFIXES
                .iter()
                .position(|b| !b.is_empty() && *b == suffix);
            if let Some(power) = binary {
                let factor = 1024u128.checked_pow(u32::try_from(power).ok()?)?;
                mantissa = mantissa.checked_mul(factor)?;
                Format::BinarySi
            } else if let Some(exp) = suffix.strip_prefix(['e', 'E']) {
                exponent = exponent.checked_add(exp.parse::<i32>().ok()?)?;
                Format::DecimalExponent
            } else {
                return None;
            }
        }
    };

    Some(Parsed {
        negative,
        mantissa,
        exponent,
        format,
    })
}

impl Parsed {
    /// Round up to nano precision and strip trailing zeros.
    fn normalized(mut self) -> Option<Self> {
        if self.mantissa == 0 {
            return Some(Self {
                negative: false,
                exponent: 0,
                ..self
            });
        }

        if self.exponent < MIN_EXPONENT {
            let shift = u32::try_from(MIN_EXPONENT - self.exponent).ok()?;
            self.mantissa = match pow10(shift) {
                Some(divisor) => {
                    let rounded = self.mantissa / divisor;
                    if self.mantissa % divisor == 0 {
                        rounded
                    } else {
                        rounded + 1
                    }
                }
                // Finer than u128 can express: rounds up to a single nano.
                None => 1,
            };
            self.exponent = MIN_EXPONENT;
        }

        while self.mantissa % 10 == 0 {
            self.mantissa /= 10;
            self.exponent = self.exponent.checked_add(1)?;
        }
        Some(self)
    }

    fn format(self) -> Option<String> {
        if self.mantissa == 0 {
            return Some("0".to_string());
        }
        let sign = if self.negative { "-" } else { "" };

        if self.format == Format::BinarySi && self.exponent >= 0 {
            let mut value = self
                .mantissa
                .checked_mul(pow10(u32::try_from(self.exponent).ok()?)?)?;
            if value >= 1024 {
                let mut power = 0;
                while power < BINARY_SUFFIXES.len() - 1 && value % 1024 == 0 {
                    value /= 1024;
                    power += 1;
                }
                return Some(format!("{sign}{value}{}", BINARY_SUFFIXES[power]));
            }
        }

        let mut group = self.exponent.div_euclid(3) * 3;
        if self.format != Format::DecimalExponent {
            group = group.min(MAX_SI_EXPONENT);
        }
        let mantissa = self
            .mantissa
            .checked_mul(pow10(u32::try_from(self.exponent - group).ok()?)?)?;

        let suffix = if self.format == Format::DecimalExponent {
            if group == 0 {
                String::new()
            } else {
                format!("e{group}")
            }
        } else {
            match group {
                -9 => "n",
                -6 => "u",
                -3 => "m",
                0 => "",
                3 => "k",
                6 => "M",
                9 => "G",
                12 => "T",
                15 => "P",
                _ => "E",
            }
            .to_string()
        };
        Some(format!("{sign}{mantissa}{suffix}"))
    }
}
