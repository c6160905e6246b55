//! Formats amounts and dates the way they are displayed to users.
//!
//! The query engine searches these display strings, so searching "50" finds
//! a transaction shown as "$50.00".

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};
use time::Date;

/// numfmt switches to scientific notation at and above this magnitude.
const LARGEST_NUMFMT_AMOUNT: f64 = 1e12;

/// Format `number` as a dollar amount rounded to the nearest cent with
/// thousands separators, e.g. "$1,234.50".
pub fn format_currency(number: f64) -> String {
    static FMT: OnceLock<Formatter> = OnceLock::new();

    let fmt = FMT.get_or_init(|| {
        Formatter::currency("$")
            .expect("\"$\" is a valid currency prefix")
            .precision(Precision::Decimals(2))
    });

    let cents = (number.abs() * 100.0).round();

    // Zero is hardcoded as "0", and amounts under half a cent round to zero.
    if cents == 0.0 {
        return "$0.00".to_owned();
    }

    let amount = cents / 100.0;

    let mut formatted_string = if amount < LARGEST_NUMFMT_AMOUNT {
        fmt.fmt_string(amount)
    } else {
        format!("${}", group_thousands(&format!("{amount:.2}")))
    };

    // numfmt omits the last trailing zero, so we must add it ourselves
    // For example, "12.30" is rendered as "12.3" so we append "0".
    if formatted_string.as_bytes()[formatted_string.len() - 3] != b'.' {
        formatted_string = format!("{formatted_string}0");
    }

    if number < 0.0 {
        formatted_string.insert(0, '-');
    }

    formatted_string
}

/// Insert a comma between every three digits of the whole part of `fixed`, a
/// number written with a decimal point.
fn group_thousands(fixed: &str) -> String {
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed, "00"));
    let mut grouped = String::with_capacity(fixed.len() + whole.len() / 3);

    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{grouped}.{fraction}")
}

/// Format `date` as month/day/year without zero padding, e.g. "3/15/2024".
pub fn format_date(date: Date) -> String {
    format!("{}/{}/{}", u8::from(date.month()), date.day(), date.year())
}
