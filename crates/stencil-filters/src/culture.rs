// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Culture table backing culture-aware number and currency formatting.
//!
//! Month and day names are not localized; cultures control separators,
//! currency symbol, and symbol placement only.

use once_cell::sync::Lazy;

/// Formatting rules for one BCP-47-style culture identifier.
#[derive(Debug, Clone, Copy)]
pub struct Culture {
    pub id: &'static str,
    pub decimal_separator: char,
    pub group_separator: char,
    pub currency_symbol: &'static str,
    /// Symbol precedes the amount (`$1.50`) rather than trailing it
    /// (`1,50 €`).
    pub symbol_prefix: bool,
    pub currency_decimals: usize,
}

static CULTURES: Lazy<Vec<Culture>> = Lazy::new(|| {
    vec![
        Culture {
            id: "en-US",
            decimal_separator: '.',
            group_separator: ',',
            currency_symbol: "$",
            symbol_prefix: true,
            currency_decimals: 2,
        },
        Culture {
            id: "en-GB",
            decimal_separator: '.',
            group_separator: ',',
            currency_symbol: "£",
            symbol_prefix: true,
            currency_decimals: 2,
        },
        Culture {
            id: "fr-FR",
            decimal_separator: ',',
            group_separator: '\u{202f}',
            currency_symbol: "€",
            symbol_prefix: false,
            currency_decimals: 2,
        },
        Culture {
            id: "de-DE",
            decimal_separator: ',',
            group_separator: '.',
            currency_symbol: "€",
            symbol_prefix: false,
            currency_decimals: 2,
        },
        Culture {
            id: "ja-JP",
            decimal_separator: '.',
            group_separator: ',',
            currency_symbol: "¥",
            symbol_prefix: true,
            currency_decimals: 0,
        },
    ]
});

impl Culture {
    /// Looks a culture up by identifier, falling back to `en-US`.
    pub fn lookup(id: &str) -> Culture {
        CULTURES
            .iter()
            .find(|culture| culture.id.eq_ignore_ascii_case(id))
            .copied()
            .unwrap_or(CULTURES[0])
    }

    /// Formats an amount with this culture's grouping and decimal
    /// separators.
    pub fn format_number(&self, value: f64, decimals: usize) -> String {
        let negative = value < 0.0;
        let rounded = format!("{:.decimals$}", value.abs());
        let (int_part, frac_part) = match rounded.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (rounded.as_str(), None),
        };

        let mut grouped = String::new();
        let digits: Vec<char> = int_part.chars().collect();
        for (idx, digit) in digits.iter().enumerate() {
            if idx > 0 && (digits.len() - idx) % 3 == 0 {
                grouped.push(self.group_separator);
            }
            grouped.push(*digit);
        }

        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push_str(&grouped);
        if let Some(frac) = frac_part {
            out.push(self.decimal_separator);
            out.push_str(frac);
        }
        out
    }

    /// Formats an amount as currency: grouped number plus the culture's
    /// symbol on its side.
    pub fn format_currency(&self, value: f64) -> String {
        let number = self.format_number(value, self.currency_decimals);
        if self.symbol_prefix {
            format!("{}{}", self.currency_symbol, number)
        } else {
            format!("{}\u{a0}{}", number, self.currency_symbol)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_falls_back_to_en_us() {
        assert_eq!(Culture::lookup("xx-XX").id, "en-US");
        assert_eq!(Culture::lookup("fr-fr").id, "fr-FR");
    }

    #[test]
    fn groups_digits_in_threes() {
        let us = Culture::lookup("en-US");
        assert_eq!(us.format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(us.format_number(-1000.0, 0), "-1,000");
        assert_eq!(us.format_number(999.0, 0), "999");
    }

    #[test]
    fn currency_respects_symbol_placement() {
        assert_eq!(Culture::lookup("en-US").format_currency(1234.5), "$1,234.50");
        assert_eq!(
            Culture::lookup("de-DE").format_currency(1234.5),
            "1.234,50\u{a0}€"
        );
        assert_eq!(Culture::lookup("ja-JP").format_currency(1234.5), "¥1,235");
    }
}
